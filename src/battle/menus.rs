//! # Battle Menus
//!
//! Submission and replacement menus for player-controlled combatants.

use super::{BattleState, Combatant, CombatantId, Submission};
use crate::content::{Content, TargetType};
use crate::rendering::{Menu, MenuOption, Presenter};
use crate::CrustResult;

/// One line of the items page: every instance of an action, grouped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemGroup {
    pub action_id: String,
    pub quantity: usize,
    /// Instance consumed when this group is picked.
    pub instance_id: String,
}

/// Groups the caster team's session items by action, in first-seen order.
pub fn item_groups(state: &BattleState, caster: &Combatant) -> Vec<ItemGroup> {
    let mut groups: Vec<ItemGroup> = Vec::new();
    for item in state.items.iter().filter(|item| item.team == caster.team) {
        match groups.iter_mut().find(|g| g.action_id == item.action_id) {
            Some(group) => group.quantity += 1,
            None => groups.push(ItemGroup {
                action_id: item.action_id.clone(),
                quantity: 1,
                instance_id: item.instance_id.clone(),
            }),
        }
    }
    groups
}

/// Live teammates the caster could swap with.
pub fn swap_candidates<'s>(state: &'s BattleState, caster: &Combatant) -> Vec<&'s Combatant> {
    state
        .alive_on_team(caster.team)
        .filter(|c| c.id != caster.id)
        .collect()
}

enum Page {
    Root,
    Attacks,
    Items,
    Swap,
}

fn back_option() -> MenuOption {
    MenuOption::new("Go Back", "Return to previous page").with_right("🔙")
}

/// Walks the player through the submission pages until a choice is made.
///
/// Returns `None` if the presenter gives no selection.
pub async fn choose_submission(
    presenter: &dyn Presenter,
    content: &Content,
    state: &BattleState,
    caster: &Combatant,
    enemy: &Combatant,
) -> CrustResult<Option<Submission>> {
    let items = item_groups(state, caster);
    let swaps = swap_candidates(state, caster);
    let target_for = |target_type: TargetType| match target_type {
        TargetType::Friendly => caster.id.clone(),
        TargetType::Enemy => enemy.id.clone(),
    };
    let mut page = Page::Root;

    loop {
        match page {
            Page::Root => {
                let menu = Menu::new(format!("{}'s turn", caster.name), false)
                    .option(MenuOption::new("Attack", "Choose an attack").with_right("💥"))
                    .option(
                        MenuOption::new("Items", "Use an item")
                            .with_right("🎒")
                            .disabled(items.is_empty()),
                    )
                    .option(
                        MenuOption::new("Swap", "Change to another pizza")
                            .with_right("🔄")
                            .disabled(swaps.is_empty()),
                    );
                page = match presenter.choose(&menu).await {
                    Some(0) => Page::Attacks,
                    Some(1) => Page::Items,
                    Some(2) => Page::Swap,
                    _ => return Ok(None),
                };
            }
            Page::Attacks => {
                let mut menu = Menu::new("Attacks", false);
                for action_id in &caster.actions {
                    let action = content.action(action_id)?;
                    menu = menu.option(
                        MenuOption::new(&action.name, &action.description).with_right(&action.icon),
                    );
                }
                menu = menu.option(back_option());
                match presenter.choose(&menu).await {
                    Some(i) if i < caster.actions.len() => {
                        let action_id = &caster.actions[i];
                        let action = content.action(action_id)?;
                        return Ok(Some(Submission::Attack {
                            action: action_id.clone(),
                            target: target_for(action.target_type),
                            instance_id: None,
                        }));
                    }
                    Some(_) => page = Page::Root,
                    None => return Ok(None),
                }
            }
            Page::Items => {
                let mut menu = Menu::new("Items", false);
                for group in &items {
                    let action = content.action(&group.action_id)?;
                    menu = menu.option(
                        MenuOption::new(&action.name, &action.description)
                            .with_right(&format!("x{}", group.quantity)),
                    );
                }
                menu = menu.option(back_option());
                match presenter.choose(&menu).await {
                    Some(i) if i < items.len() => {
                        let group = &items[i];
                        let action = content.action(&group.action_id)?;
                        return Ok(Some(Submission::Attack {
                            action: group.action_id.clone(),
                            target: target_for(action.target_type),
                            instance_id: Some(group.instance_id.clone()),
                        }));
                    }
                    Some(_) => page = Page::Root,
                    None => return Ok(None),
                }
            }
            Page::Swap => {
                let mut menu = Menu::new("Swap", false);
                for candidate in &swaps {
                    menu = menu.option(MenuOption::new(&candidate.name, &format!("Level {}", candidate.level)));
                }
                menu = menu.option(back_option());
                match presenter.choose(&menu).await {
                    Some(i) if i < swaps.len() => {
                        return Ok(Some(Submission::Swap {
                            replacement: swaps[i].id.clone(),
                        }));
                    }
                    Some(_) => page = Page::Root,
                    None => return Ok(None),
                }
            }
        }
    }
}

/// Asks the player which live pizza comes in next.
pub async fn choose_replacement(
    presenter: &dyn Presenter,
    candidates: &[&Combatant],
) -> Option<CombatantId> {
    let mut menu = Menu::new("Choose a replacement", false);
    for candidate in candidates {
        menu = menu.option(MenuOption::new(&candidate.name, &format!("Level {}", candidate.level)));
    }
    let choice = presenter.choose(&menu).await?;
    candidates.get(choice).map(|c| c.id.clone())
}
