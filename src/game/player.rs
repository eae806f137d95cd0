//! # Player State
//!
//! The player's persistent roster, lineup, inventory and story flags, plus a
//! shared handle that publishes change notices.

use crate::battle::Status;
use crate::config::{DEFAULT_MAX_XP, MAX_LINEUP};
use crate::{CrustError, CrustResult};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Set of story flags the player has earned.
pub type StoryFlags = BTreeSet<String>;

/// A pizza owned by the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PizzaRecord {
    pub pizza_id: String,
    pub hp: i32,
    pub max_hp: i32,
    pub xp: u32,
    pub max_xp: u32,
    pub level: u32,
    #[serde(default)]
    pub status: Option<Status>,
}

impl PizzaRecord {
    /// A fresh level 1 pizza at full health.
    pub fn fresh(pizza_id: impl Into<String>) -> Self {
        Self {
            pizza_id: pizza_id.into(),
            hp: 50,
            max_hp: 50,
            xp: 0,
            max_xp: DEFAULT_MAX_XP,
            level: 1,
            status: None,
        }
    }
}

/// A consumable item in the player's inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRecord {
    pub action_id: String,
    pub instance_id: String,
}

impl ItemRecord {
    pub fn new(action_id: impl Into<String>, instance_id: impl Into<String>) -> Self {
        Self {
            action_id: action_id.into(),
            instance_id: instance_id.into(),
        }
    }
}

/// Everything about the player that survives between battles and maps.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    pub pizzas: BTreeMap<String, PizzaRecord>,
    pub lineup: Vec<String>,
    pub items: Vec<ItemRecord>,
    #[serde(default)]
    pub story_flags: StoryFlags,
}

impl PlayerState {
    /// The starting roster of a new game.
    pub fn starter() -> Self {
        let mut pizzas = BTreeMap::new();
        pizzas.insert(
            "p1".to_string(),
            PizzaRecord {
                hp: 30,
                xp: 90,
                status: Some(Status::new(crate::battle::StatusKind::Saucy, 1)),
                ..PizzaRecord::fresh("s001")
            },
        );
        pizzas.insert(
            "p2".to_string(),
            PizzaRecord {
                xp: 75,
                ..PizzaRecord::fresh("v001")
            },
        );

        Self {
            pizzas,
            lineup: vec!["p1".to_string(), "p2".to_string()],
            items: (1..=3)
                .map(|n| ItemRecord::new("item_recoverHp", format!("item{}", n)))
                .collect(),
            story_flags: StoryFlags::new(),
        }
    }

    /// Adds a freshly crafted pizza and returns its new id.
    ///
    /// The pizza joins the lineup while the lineup has room.
    pub fn add_pizza(&mut self, pizza_id: &str) -> String {
        let id = format!("p{}", Uuid::new_v4().simple());
        self.pizzas.insert(id.clone(), PizzaRecord::fresh(pizza_id));
        if self.lineup.len() < MAX_LINEUP {
            self.lineup.push(id.clone());
        }
        debug!("Added pizza {} as {}", pizza_id, id);
        id
    }

    /// Replaces `old_id` in the lineup with `incoming_id`.
    pub fn swap_lineup(&mut self, old_id: &str, incoming_id: &str) -> CrustResult<()> {
        if !self.pizzas.contains_key(incoming_id) {
            return Err(CrustError::InvalidState(format!(
                "Pizza {} is not in the roster",
                incoming_id
            )));
        }
        if self.lineup.iter().any(|id| id == incoming_id) {
            return Err(CrustError::InvalidState(format!(
                "Pizza {} is already in the lineup",
                incoming_id
            )));
        }
        let slot = self
            .lineup
            .iter()
            .position(|id| id == old_id)
            .ok_or_else(|| {
                CrustError::InvalidState(format!("Pizza {} is not in the lineup", old_id))
            })?;
        self.lineup[slot] = incoming_id.to_string();
        Ok(())
    }

    /// Moves `id` to the front of the lineup.
    pub fn move_to_front(&mut self, id: &str) -> CrustResult<()> {
        let slot = self
            .lineup
            .iter()
            .position(|entry| entry == id)
            .ok_or_else(|| CrustError::InvalidState(format!("Pizza {} is not in the lineup", id)))?;
        let entry = self.lineup.remove(slot);
        self.lineup.insert(0, entry);
        Ok(())
    }

    /// Roster pizzas that are not in the lineup.
    pub fn benched(&self) -> Vec<String> {
        self.pizzas
            .keys()
            .filter(|id| !self.lineup.contains(id))
            .cloned()
            .collect()
    }
}

/// Change notices published by the player store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// Roster stats or inventory changed (battle write-back).
    PlayerStateUpdated,
    /// Lineup membership or order changed.
    LineupChanged,
}

/// Shared handle to the player state.
///
/// Cloning the handle shares the same state and notice channel.
#[derive(Debug, Clone)]
pub struct PlayerStore {
    state: Arc<Mutex<PlayerState>>,
    notices: broadcast::Sender<Notice>,
}

impl PlayerStore {
    pub fn new(state: PlayerState) -> Self {
        let (notices, _) = broadcast::channel(64);
        Self {
            state: Arc::new(Mutex::new(state)),
            notices,
        }
    }

    fn lock(&self) -> MutexGuard<'_, PlayerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> PlayerState {
        self.lock().clone()
    }

    /// Runs `f` against the state. Publishes nothing.
    pub fn read<R>(&self, f: impl FnOnce(&PlayerState) -> R) -> R {
        f(&self.lock())
    }

    /// Mutates the state, then publishes `notice` if one is given.
    pub fn update<R>(&self, notice: Option<Notice>, f: impl FnOnce(&mut PlayerState) -> R) -> R {
        let result = f(&mut self.lock());
        if let Some(notice) = notice {
            self.publish(notice);
        }
        result
    }

    pub fn publish(&self, notice: Notice) {
        // No subscribers is fine.
        let _ = self.notices.send(notice);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    pub fn story_flags(&self) -> StoryFlags {
        self.lock().story_flags.clone()
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.lock().story_flags.contains(flag)
    }

    pub fn add_story_flag(&self, flag: &str) {
        self.lock().story_flags.insert(flag.to_string());
    }

    pub fn add_pizza(&self, pizza_id: &str) -> String {
        self.update(Some(Notice::LineupChanged), |state| state.add_pizza(pizza_id))
    }

    pub fn swap_lineup(&self, old_id: &str, incoming_id: &str) -> CrustResult<()> {
        self.update(None, |state| state.swap_lineup(old_id, incoming_id))?;
        self.publish(Notice::LineupChanged);
        Ok(())
    }

    pub fn move_to_front(&self, id: &str) -> CrustResult<()> {
        self.update(None, |state| state.move_to_front(id))?;
        self.publish(Notice::LineupChanged);
        Ok(())
    }
}

impl Default for PlayerStore {
    fn default() -> Self {
        Self::new(PlayerState::starter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starter_state() {
        let state = PlayerState::starter();
        assert_eq!(state.lineup, vec!["p1", "p2"]);
        assert_eq!(state.items.len(), 3);
        assert_eq!(state.pizzas["p1"].hp, 30);
        assert_eq!(state.pizzas["p2"].xp, 75);
    }

    #[test]
    fn test_add_pizza_respects_lineup_cap() {
        let mut state = PlayerState::starter();
        let third = state.add_pizza("f001");
        assert_eq!(state.lineup.len(), 3);
        assert_eq!(state.lineup[2], third);

        let fourth = state.add_pizza("s002");
        assert_eq!(state.lineup.len(), 3);
        assert!(state.pizzas.contains_key(&fourth));
        assert_eq!(state.benched(), vec![fourth]);
    }

    #[test]
    fn test_swap_and_move_to_front() -> CrustResult<()> {
        let mut state = PlayerState::starter();
        state.lineup.pop();
        state.swap_lineup("p1", "p2")?;
        assert_eq!(state.lineup, vec!["p2"]);
        assert!(state.swap_lineup("p1", "p2").is_err());

        let mut state = PlayerState::starter();
        state.move_to_front("p2")?;
        assert_eq!(state.lineup, vec!["p2", "p1"]);
        Ok(())
    }

    #[test]
    fn test_store_publishes_lineup_changed() -> CrustResult<()> {
        let store = PlayerStore::default();
        let mut rx = store.subscribe();
        store.move_to_front("p2")?;
        assert_eq!(rx.try_recv().ok(), Some(Notice::LineupChanged));
        assert_eq!(store.snapshot().lineup[0], "p2");
        Ok(())
    }

    #[test]
    fn test_story_flags() {
        let store = PlayerStore::default();
        assert!(!store.has_flag("DEFEATED_BETH"));
        store.add_story_flag("DEFEATED_BETH");
        assert!(store.has_flag("DEFEATED_BETH"));
    }
}
