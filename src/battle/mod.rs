//! # Battle Module
//!
//! Turn-based battles between the player's lineup and an enemy trainer.
//!
//! A [`Battle`] owns its [`BattleState`] outright. The turn cycle and the
//! battle event interpreter are the only code that mutates it, and they run
//! one step at a time inside the single battle future, so no locking is needed.

pub mod animations;
pub mod combatant;
pub mod event;
pub mod menus;
pub mod team;
pub mod turn_cycle;

pub use animations::*;
pub use combatant::*;
pub use event::*;
pub use menus::*;
pub use team::*;
pub use turn_cycle::*;

use crate::content::{Content, EnemyDef};
use crate::game::{Notice, PlayerStore};
use crate::rendering::Presenter;
use crate::{CrustError, CrustResult};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The single active combatant of each team.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveCombatants {
    pub player: Option<CombatantId>,
    pub enemy: Option<CombatantId>,
}

impl ActiveCombatants {
    pub fn get(&self, team: Team) -> Option<&str> {
        match team {
            Team::Player => self.player.as_deref(),
            Team::Enemy => self.enemy.as_deref(),
        }
    }

    pub fn set(&mut self, team: Team, id: Option<CombatantId>) {
        match team {
            Team::Player => self.player = id,
            Team::Enemy => self.enemy = id,
        }
    }
}

/// A consumable available during this battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleItem {
    pub action_id: String,
    pub instance_id: String,
    pub team: Team,
}

/// Display snapshot of one combatant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombatantView {
    pub id: CombatantId,
    pub name: String,
    pub team: Team,
    pub hp_percentage: f64,
    pub xp_percentage: f64,
    pub level: u32,
    pub status: Option<StatusKind>,
    pub is_active: bool,
}

/// Display snapshot of the whole battle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BattleView {
    pub combatants: Vec<CombatantView>,
    pub player_team: TeamStrip,
    pub enemy_team: TeamStrip,
}

/// Session state of one battle.
#[derive(Debug, Clone, Default)]
pub struct BattleState {
    /// Combatants in the order they joined.
    pub combatants: Vec<Combatant>,
    pub active: ActiveCombatants,
    pub items: Vec<BattleItem>,
    pub used_instance_ids: BTreeSet<String>,
}

impl BattleState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a combatant; the first one of each team becomes active.
    pub fn add_combatant(&mut self, combatant: Combatant) {
        if self.active.get(combatant.team).is_none() {
            self.active.set(combatant.team, Some(combatant.id.clone()));
        }
        self.combatants.push(combatant);
    }

    pub fn get(&self, id: &str) -> Option<&Combatant> {
        self.combatants.iter().find(|c| c.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Combatant> {
        self.combatants.iter_mut().find(|c| c.id == id)
    }

    pub fn combatant(&self, id: &str) -> CrustResult<&Combatant> {
        self.get(id)
            .ok_or_else(|| CrustError::InvalidState(format!("No combatant {} in battle", id)))
    }

    pub fn combatant_mut(&mut self, id: &str) -> CrustResult<&mut Combatant> {
        self.get_mut(id)
            .ok_or_else(|| CrustError::InvalidState(format!("No combatant {} in battle", id)))
    }

    /// The active combatant of `team`.
    pub fn active_combatant(&self, team: Team) -> CrustResult<&Combatant> {
        let id = self.active.get(team).ok_or_else(|| {
            CrustError::InvalidState(format!("No active combatant for {:?}", team))
        })?;
        self.combatant(id)
    }

    pub fn alive_on_team(&self, team: Team) -> impl Iterator<Item = &Combatant> {
        self.combatants
            .iter()
            .filter(move |c| c.team == team && c.is_alive())
    }

    /// The team that has won, if the other has nobody left standing.
    ///
    /// A double knockout is an enemy win.
    pub fn winning_team(&self) -> Option<Team> {
        if self.alive_on_team(Team::Player).next().is_none() {
            return Some(Team::Enemy);
        }
        if self.alive_on_team(Team::Enemy).next().is_none() {
            return Some(Team::Player);
        }
        None
    }

    /// Removes an item from the pool and records it as used.
    ///
    /// Returns false if no item with that instance id was available.
    pub fn consume_item(&mut self, instance_id: &str) -> bool {
        let Some(index) = self.items.iter().position(|i| i.instance_id == instance_id) else {
            return false;
        };
        self.items.remove(index);
        self.used_instance_ids.insert(instance_id.to_string());
        true
    }

    pub fn view(&self) -> BattleView {
        BattleView {
            combatants: self
                .combatants
                .iter()
                .map(|c| CombatantView {
                    id: c.id.clone(),
                    name: c.name.clone(),
                    team: c.team,
                    hp_percentage: c.hp_percentage(),
                    xp_percentage: c.xp_percentage(),
                    level: c.level,
                    status: c.status.map(|s| s.kind),
                    is_active: c.is_active(&self.active),
                })
                .collect(),
            player_team: TeamStrip::build(self, Team::Player),
            enemy_team: TeamStrip::build(self, Team::Enemy),
        }
    }
}

/// A battle against one enemy trainer.
pub struct Battle<'a> {
    content: &'a Content,
    presenter: &'a dyn Presenter,
    animations: &'a AnimationRegistry,
    player: &'a PlayerStore,
    enemy: &'a EnemyDef,
    pub arena: Option<String>,
    pub state: BattleState,
    rng: StdRng,
}

impl<'a> Battle<'a> {
    /// Builds the session from the player's lineup and the enemy roster.
    pub fn new(
        content: &'a Content,
        presenter: &'a dyn Presenter,
        animations: &'a AnimationRegistry,
        player: &'a PlayerStore,
        enemy_id: &str,
        arena: Option<String>,
        seed: u64,
    ) -> CrustResult<Self> {
        let enemy = content.enemy(enemy_id)?;
        let snapshot = player.snapshot();
        let mut state = BattleState::new();

        for id in &snapshot.lineup {
            let record = snapshot.pizzas.get(id).ok_or_else(|| {
                CrustError::InvalidState(format!("Lineup pizza {} is not in the roster", id))
            })?;
            let def = content.pizza(&record.pizza_id)?;
            state.add_combatant(Combatant::from_player(id, record, def));
        }
        for (key, pizza) in &enemy.pizzas {
            let def = content.pizza(&pizza.pizza_id)?;
            state.add_combatant(Combatant::from_enemy(key, pizza, def));
        }
        if state.active.player.is_none() || state.active.enemy.is_none() {
            return Err(CrustError::InvalidState(
                "Both teams need at least one combatant".to_string(),
            ));
        }
        state.items = snapshot
            .items
            .iter()
            .map(|item| BattleItem {
                action_id: item.action_id.clone(),
                instance_id: item.instance_id.clone(),
                team: Team::Player,
            })
            .collect();

        Ok(Self {
            content,
            presenter,
            animations,
            player,
            enemy,
            arena,
            state,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    pub fn enemy_name(&self) -> &str {
        &self.enemy.name
    }

    /// Runs the battle to completion and returns whether the player won.
    pub async fn run(mut self) -> CrustResult<bool> {
        info!("Battle started against {}", self.enemy.name);
        self.presenter
            .battle_started(&self.state.view(), &self.enemy.name, self.arena.as_deref());

        let runner = BattleEventRunner::new(self.content, self.presenter, self.animations);
        let mut cycle = TurnCycle::new(&self.enemy.name);
        let winner = cycle.run(&runner, &mut self.state, &mut self.rng).await?;
        let did_win = winner == Team::Player;

        if did_win {
            self.write_back();
        }
        info!(
            "Battle against {} ended: {}",
            self.enemy.name,
            if did_win { "won" } else { "lost" }
        );
        self.presenter.battle_ended(did_win);
        Ok(did_win)
    }

    /// Copies surviving stats into the player's roster and strips used items.
    fn write_back(&self) {
        let state = &self.state;
        self.player.update(Some(Notice::PlayerStateUpdated), |player| {
            for (id, record) in player.pizzas.iter_mut() {
                if let Some(combatant) = state.get(id) {
                    record.hp = combatant.hp.max(0);
                    record.max_hp = combatant.max_hp;
                    record.xp = combatant.xp;
                    record.max_xp = combatant.max_xp;
                    record.level = combatant.level;
                }
            }
            player
                .items
                .retain(|item| !state.used_instance_ids.contains(&item.instance_id));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::PizzaType;

    fn combatant(id: &str, team: Team, hp: i32) -> Combatant {
        Combatant {
            id: id.to_string(),
            name: id.to_string(),
            pizza_type: PizzaType::Normal,
            src: String::new(),
            icon: String::new(),
            actions: vec!["damage1".to_string()],
            team,
            hp,
            max_hp: 50,
            xp: 0,
            max_xp: 100,
            level: 1,
            status: None,
            is_player_controlled: team == Team::Player,
        }
    }

    #[test]
    fn test_first_combatant_per_team_is_active() {
        let mut state = BattleState::new();
        state.add_combatant(combatant("p1", Team::Player, 10));
        state.add_combatant(combatant("p2", Team::Player, 10));
        state.add_combatant(combatant("e_a", Team::Enemy, 10));
        assert_eq!(state.active.get(Team::Player), Some("p1"));
        assert_eq!(state.active.get(Team::Enemy), Some("e_a"));
        assert!(state.combatant("p1").unwrap().is_active(&state.active));
        assert!(!state.combatant("p2").unwrap().is_active(&state.active));
    }

    #[test]
    fn test_winning_team() {
        let mut state = BattleState::new();
        state.add_combatant(combatant("p1", Team::Player, 0));
        state.add_combatant(combatant("e_a", Team::Enemy, 5));
        assert_eq!(state.winning_team(), Some(Team::Enemy));

        state.combatant_mut("p1").unwrap().hp = 3;
        assert_eq!(state.winning_team(), None);

        state.combatant_mut("e_a").unwrap().hp = -2;
        assert_eq!(state.winning_team(), Some(Team::Player));
    }

    #[test]
    fn test_double_knockout_reports_enemy() {
        let mut state = BattleState::new();
        state.add_combatant(combatant("p1", Team::Player, 0));
        state.add_combatant(combatant("e_a", Team::Enemy, 0));
        assert_eq!(state.winning_team(), Some(Team::Enemy));
    }

    #[test]
    fn test_consume_item() {
        let mut state = BattleState::new();
        for n in 1..=2 {
            state.items.push(BattleItem {
                action_id: "item_recoverHp".to_string(),
                instance_id: format!("item{}", n),
                team: Team::Player,
            });
        }
        assert!(state.consume_item("item1"));
        assert!(!state.consume_item("item1"));
        assert_eq!(state.items.len(), 1);
        assert!(state.used_instance_ids.contains("item1"));
    }

    #[test]
    fn test_view_reflects_active_flags() {
        let mut state = BattleState::new();
        state.add_combatant(combatant("p1", Team::Player, 25));
        state.add_combatant(combatant("e_a", Team::Enemy, 50));
        let view = state.view();
        assert_eq!(view.combatants.len(), 2);
        assert!(view.combatants[0].is_active);
        assert_eq!(view.combatants[0].hp_percentage, 50.0);
        assert_eq!(view.player_team.icons.len(), 1);
    }
}
