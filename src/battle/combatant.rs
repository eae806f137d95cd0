//! # Combatants
//!
//! Battle participants, their status effects and the hooks those statuses
//! contribute to a turn.

use super::{ActiveCombatants, BattleEventKind};
use crate::config::{DEFAULT_MAX_XP, LEVEL_UP_HP_BONUS, XP_PER_LEVEL};
use crate::content::{EnemyPizza, PizzaDef, PizzaType};
use crate::game::{PizzaRecord, Speed, TextLine};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a combatant within one battle.
pub type CombatantId = String;

/// Side of a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    Player,
    Enemy,
}

impl Team {
    pub fn opposite(self) -> Team {
        match self {
            Team::Player => Team::Enemy,
            Team::Enemy => Team::Player,
        }
    }
}

/// Kinds of timed status effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    /// Heals the bearer a little after each of its turns.
    Saucy,
    /// One-in-three chance that the bearer's action flops.
    Clumsy,
    /// Incoming damage is ignored.
    Protected,
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatusKind::Saucy => "saucy",
            StatusKind::Clumsy => "clumsy",
            StatusKind::Protected => "protected",
        };
        f.write_str(name)
    }
}

/// A status effect with the number of the bearer's turns it has left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    #[serde(alias = "type")]
    pub kind: StatusKind,
    pub expires_in: u32,
}

impl Status {
    pub fn new(kind: StatusKind, expires_in: u32) -> Self {
        Self { kind, expires_in }
    }
}

/// A pizza taking part in a battle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Combatant {
    pub id: CombatantId,
    pub name: String,
    pub pizza_type: PizzaType,
    pub src: String,
    pub icon: String,
    pub actions: Vec<String>,
    pub team: Team,
    /// May dip below zero until the death check runs.
    pub hp: i32,
    pub max_hp: i32,
    pub xp: u32,
    pub max_xp: u32,
    pub level: u32,
    pub status: Option<Status>,
    pub is_player_controlled: bool,
}

impl Combatant {
    /// Builds a player-team combatant from a roster entry.
    pub fn from_player(id: &str, record: &PizzaRecord, def: &PizzaDef) -> Self {
        Self {
            id: id.to_string(),
            name: def.name.clone(),
            pizza_type: def.pizza_type,
            src: def.src.clone(),
            icon: def.icon.clone(),
            actions: def.actions.clone(),
            team: Team::Player,
            hp: record.hp,
            max_hp: record.max_hp,
            xp: record.xp,
            max_xp: record.max_xp,
            level: record.level,
            status: record.status,
            is_player_controlled: true,
        }
    }

    /// Builds an enemy combatant; its id is `e_<key>`.
    pub fn from_enemy(key: &str, pizza: &EnemyPizza, def: &PizzaDef) -> Self {
        Self {
            id: format!("e_{}", key),
            name: def.name.clone(),
            pizza_type: def.pizza_type,
            src: def.src.clone(),
            icon: def.icon.clone(),
            actions: def.actions.clone(),
            team: Team::Enemy,
            hp: pizza.hp.unwrap_or(pizza.max_hp),
            max_hp: pizza.max_hp,
            xp: 0,
            max_xp: DEFAULT_MAX_XP,
            level: pizza.level,
            status: None,
            is_player_controlled: false,
        }
    }

    /// HP as a percentage, clamped to `0..=100` for display.
    pub fn hp_percentage(&self) -> f64 {
        if self.max_hp <= 0 {
            return 0.0;
        }
        (self.hp as f64 / self.max_hp as f64 * 100.0).clamp(0.0, 100.0)
    }

    pub fn xp_percentage(&self) -> f64 {
        if self.max_xp == 0 {
            return 0.0;
        }
        self.xp as f64 / self.max_xp as f64 * 100.0
    }

    pub fn is_active(&self, active: &ActiveCombatants) -> bool {
        active.get(self.team) == Some(self.id.as_str())
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    pub fn has_status(&self, kind: StatusKind) -> bool {
        self.status.map(|status| status.kind) == Some(kind)
    }

    /// XP granted to the victor when this combatant is ruined.
    pub fn gives_xp(&self) -> u32 {
        self.level * XP_PER_LEVEL
    }

    /// Adds a single point of XP, levelling up when the bar fills.
    ///
    /// Returns true if this point caused a level-up.
    pub fn add_xp_unit(&mut self) -> bool {
        self.xp += 1;
        if self.xp < self.max_xp {
            return false;
        }
        self.xp = 0;
        self.max_xp = DEFAULT_MAX_XP;
        self.level += 1;
        self.max_hp += LEVEL_UP_HP_BONUS;
        true
    }

    /// Rolls whether a clumsy combatant flops this turn.
    pub fn flops<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        self.has_status(StatusKind::Clumsy)
            && [true, false, false].choose(rng).copied().unwrap_or(false)
    }

    /// Events that replace the chosen action's events this turn.
    pub fn replaced_events<R: Rng + ?Sized>(
        &self,
        original: Vec<BattleEventKind>,
        rng: &mut R,
    ) -> Vec<BattleEventKind> {
        if self.flops(rng) {
            return vec![BattleEventKind::text(&format!("{} flops over!", self.name))];
        }
        original
    }

    /// Events to run before the combatant picks its submission.
    pub fn pre_events(&self) -> Vec<BattleEventKind> {
        match self.status {
            Some(Status {
                kind: StatusKind::Protected,
                expires_in: 1,
            }) => vec![BattleEventKind::text(&format!(
                "{}'s shield is about to fade!",
                self.name
            ))],
            _ => Vec::new(),
        }
    }

    /// Events to run after the combatant's action resolves.
    pub fn post_events(&self) -> Vec<BattleEventKind> {
        if self.has_status(StatusKind::Saucy) {
            return vec![
                BattleEventKind::Message {
                    text_lines: vec![
                        TextLine::new("Feelin'", Speed::Fast),
                        TextLine::new("saucy!", Speed::Fast)
                            .with_class("orange")
                            .with_class("dance"),
                    ],
                },
                BattleEventKind::StateChange {
                    damage: 0,
                    recover: 5,
                    status: None,
                    on_caster: true,
                },
            ];
        }
        Vec::new()
    }

    /// Ticks the status down by one turn.
    ///
    /// Returns the expiry message when the status runs out.
    pub fn decrement_status(&mut self) -> Option<BattleEventKind> {
        let status = self.status.as_mut()?;
        if status.expires_in == 0 {
            return None;
        }
        status.expires_in -= 1;
        if status.expires_in != 0 {
            return None;
        }
        let kind = status.kind;
        self.status = None;
        Some(BattleEventKind::text(&format!(
            "{} is no longer {}!",
            self.name, kind
        )))
    }
}
