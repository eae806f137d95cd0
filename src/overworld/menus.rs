//! Overworld menus: pause (lineup management and saving) and crafting.

use super::Overworld;
use crate::content::Content;
use crate::game::{PlayerStore, Progress};
use crate::rendering::{Menu, MenuOption, Presenter};
use crate::CrustResult;
use log::{info, warn};

enum Page {
    Root,
    Lineup,
    Pizza(String),
}

/// Name, description and level of a roster pizza.
fn describe(content: &Content, player: &PlayerStore, id: &str) -> CrustResult<(String, String, u32)> {
    let record = player.read(|state| state.pizzas.get(id).cloned());
    let Some(record) = record else {
        return Ok((id.to_string(), String::new(), 0));
    };
    let def = content.pizza(&record.pizza_id)?;
    Ok((def.name.clone(), def.description.clone(), record.level))
}

/// Pause menu over the player's lineup.
///
/// `save` is invoked when the player picks "Save"; the menu closes after it.
/// Cancelling on any page closes the menu.
pub async fn pause_menu(
    presenter: &dyn Presenter,
    content: &Content,
    player: &PlayerStore,
    save: &(dyn Fn() -> CrustResult<()> + Send + Sync),
) -> CrustResult<()> {
    let mut page = Page::Root;
    loop {
        page = match page {
            Page::Root => {
                let menu = Menu::new("Paused", true)
                    .option(MenuOption::new("Pizzas", "Change lineup"))
                    .option(MenuOption::new("Save", "Save your progress"))
                    .option(MenuOption::new("Close", "Close the pause menu"));
                match presenter.choose(&menu).await {
                    Some(0) => Page::Lineup,
                    Some(1) => {
                        save()?;
                        return Ok(());
                    }
                    _ => return Ok(()),
                }
            }
            Page::Lineup => {
                let lineup = player.read(|state| state.lineup.clone());
                let mut menu = Menu::new("Lineup", true);
                for id in &lineup {
                    let (name, description, level) = describe(content, player, id)?;
                    menu = menu.option(
                        MenuOption::new(&name, &description).with_right(&format!("Lv {}", level)),
                    );
                }
                menu = menu.option(MenuOption::new("Back", "Back to root menu"));
                match presenter.choose(&menu).await {
                    Some(index) => match lineup.get(index) {
                        Some(id) => Page::Pizza(id.clone()),
                        None => Page::Root,
                    },
                    None => return Ok(()),
                }
            }
            Page::Pizza(id) => {
                let benched = player.read(|state| state.benched());
                let mut menu = Menu::new("Pizza", true);
                for other in &benched {
                    let (name, description, _) = describe(content, player, other)?;
                    menu = menu.option(MenuOption::new(&format!("Swap for {}", name), &description));
                }
                menu = menu
                    .option(MenuOption::new("Move to front", "Move this pizza to the front of the list"))
                    .option(MenuOption::new("Back", "Back to lineup"));
                match presenter.choose(&menu).await {
                    Some(index) if index < benched.len() => {
                        player.swap_lineup(&id, &benched[index])?;
                        Page::Lineup
                    }
                    Some(index) if index == benched.len() => {
                        player.move_to_front(&id)?;
                        Page::Lineup
                    }
                    Some(_) => Page::Lineup,
                    None => return Ok(()),
                }
            }
        };
    }
}

/// Offers `pizzas` and adds the chosen one to the roster.
///
/// Returns the new roster id, or `None` if nothing was chosen.
pub async fn run_crafting_menu(
    presenter: &dyn Presenter,
    content: &Content,
    player: &PlayerStore,
    pizzas: &[String],
) -> CrustResult<Option<String>> {
    let mut menu = Menu::new("Create a pizza", false);
    for pizza_id in pizzas {
        let def = content.pizza(pizza_id)?;
        menu = menu.option(MenuOption::new(&def.name, &def.description));
    }

    let Some(pizza_id) = presenter.choose(&menu).await.and_then(|index| pizzas.get(index)) else {
        return Ok(None);
    };
    let id = player.add_pizza(pizza_id);
    info!("Crafted {} as {}", pizza_id, id);
    Ok(Some(id))
}

/// Opens the pause menu for a running overworld, saving to its save file.
pub(crate) async fn run_pause_menu(world: &Overworld) -> CrustResult<()> {
    let inner = &world.inner;
    let save = || -> CrustResult<()> {
        let Some(path) = inner.save_file.as_deref() else {
            warn!("No save file configured; progress not saved");
            return Ok(());
        };
        let player_state = inner.player.snapshot();
        let progress = world.with_map(|map| {
            map.hero()
                .map(|hero| Progress::new(map.id.clone(), hero.position, hero.direction, player_state))
        })??;
        progress.save(path)?;
        info!("Saved progress to {}", path.display());
        Ok(())
    };
    pause_menu(inner.presenter.as_ref(), &inner.content, &inner.player, &save).await
}
