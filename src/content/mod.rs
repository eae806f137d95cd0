//! # Content Module
//!
//! Read-only registry of pizza, action, enemy and map definitions.
//!
//! Content is plain serde data. It is loaded once (from JSON or the built-in
//! demo set) and passed by reference to everything that needs a lookup; an id
//! that is not in the registry is a configuration error.

pub mod demo;

use crate::battle::BattleEventKind;
use crate::game::{Direction, TalkScript};
use crate::overworld::OverworldEvent;
use crate::{CrustError, CrustResult, HERO_ID};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Flavor type of a pizza, shown as an icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PizzaType {
    #[default]
    Normal,
    Spicy,
    Veggie,
    Fungi,
    Chill,
}

/// A kind of pizza that can fight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PizzaDef {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub pizza_type: PizzaType,
    #[serde(default)]
    pub src: String,
    #[serde(default)]
    pub icon: String,
    pub actions: Vec<String>,
}

/// Who an action is aimed at by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    Friendly,
    #[default]
    Enemy,
}

/// An attack or item effect: a template of battle events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDef {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub target_type: TargetType,
    pub success: Vec<BattleEventKind>,
}

/// One pizza on an enemy trainer's roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnemyPizza {
    pub pizza_id: String,
    /// Starting HP; full health when absent.
    #[serde(default)]
    pub hp: Option<i32>,
    pub max_hp: i32,
    pub level: u32,
}

/// An opposing trainer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnemyDef {
    pub name: String,
    #[serde(default)]
    pub src: String,
    pub pizzas: BTreeMap<String, EnemyPizza>,
}

/// Variant-specific actor configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ActorKindConfig {
    #[default]
    Person,
    #[serde(rename_all = "camelCase")]
    PizzaStone {
        story_flag: String,
        pizzas: Vec<String>,
    },
}

/// An actor as placed on a map, in tile coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorConfig {
    pub id: String,
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default)]
    pub kind: ActorKindConfig,
    #[serde(default)]
    pub is_player_controlled: bool,
    #[serde(default)]
    pub behavior_loop: Vec<OverworldEvent>,
    #[serde(default)]
    pub talking: Vec<TalkScript>,
}

impl ActorConfig {
    pub fn person(id: impl Into<String>, x: i32, y: i32) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            direction: Direction::Down,
            kind: ActorKindConfig::Person,
            is_player_controlled: false,
            behavior_loop: Vec::new(),
            talking: Vec::new(),
        }
    }

    /// The player-controlled hero.
    pub fn hero(x: i32, y: i32) -> Self {
        Self {
            is_player_controlled: true,
            ..Self::person(HERO_ID, x, y)
        }
    }

    pub fn pizza_stone(id: impl Into<String>, x: i32, y: i32, story_flag: &str, pizzas: &[&str]) -> Self {
        Self {
            kind: ActorKindConfig::PizzaStone {
                story_flag: story_flag.to_string(),
                pizzas: pizzas.iter().map(|p| p.to_string()).collect(),
            },
            ..Self::person(id, x, y)
        }
    }

    pub fn with_behavior(mut self, behavior_loop: Vec<OverworldEvent>) -> Self {
        self.behavior_loop = behavior_loop;
        self
    }

    pub fn with_talking(mut self, talking: Vec<TalkScript>) -> Self {
        self.talking = talking;
        self
    }
}

/// Scripts triggered by the hero stepping onto a tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CutsceneSpace {
    pub x: i32,
    pub y: i32,
    pub scripts: Vec<TalkScript>,
}

/// A map definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapConfig {
    pub id: String,
    #[serde(default)]
    pub actors: Vec<ActorConfig>,
    /// Static walls in tile coordinates.
    #[serde(default)]
    pub walls: Vec<[i32; 2]>,
    #[serde(default)]
    pub cutscene_spaces: Vec<CutsceneSpace>,
}

impl MapConfig {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            actors: Vec::new(),
            walls: Vec::new(),
            cutscene_spaces: Vec::new(),
        }
    }
}

/// The full static content registry.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    #[serde(default)]
    pub pizzas: BTreeMap<String, PizzaDef>,
    #[serde(default)]
    pub actions: BTreeMap<String, ActionDef>,
    #[serde(default)]
    pub enemies: BTreeMap<String, EnemyDef>,
    #[serde(default)]
    pub maps: BTreeMap<String, MapConfig>,
}

impl Content {
    /// Parses and validates a JSON content registry.
    pub fn from_json(json: &str) -> CrustResult<Self> {
        let content: Content = serde_json::from_str(json)?;
        content.validate()?;
        Ok(content)
    }

    pub fn load(path: &Path) -> CrustResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn pizza(&self, id: &str) -> CrustResult<&PizzaDef> {
        self.pizzas
            .get(id)
            .ok_or_else(|| CrustError::UnknownPizza(id.to_string()))
    }

    pub fn action(&self, id: &str) -> CrustResult<&ActionDef> {
        self.actions
            .get(id)
            .ok_or_else(|| CrustError::UnknownAction(id.to_string()))
    }

    pub fn enemy(&self, id: &str) -> CrustResult<&EnemyDef> {
        self.enemies
            .get(id)
            .ok_or_else(|| CrustError::UnknownEnemy(id.to_string()))
    }

    pub fn map(&self, id: &str) -> CrustResult<&MapConfig> {
        self.maps
            .get(id)
            .ok_or_else(|| CrustError::UnknownMap(id.to_string()))
    }

    /// Checks every cross-reference so authoring mistakes fail at startup.
    pub fn validate(&self) -> CrustResult<()> {
        for pizza in self.pizzas.values() {
            for action in &pizza.actions {
                self.action(action)?;
            }
        }
        for enemy in self.enemies.values() {
            for pizza in enemy.pizzas.values() {
                self.pizza(&pizza.pizza_id)?;
            }
        }
        for map in self.maps.values() {
            let actor_ids: Vec<&str> = map.actors.iter().map(|a| a.id.as_str()).collect();
            for actor in &map.actors {
                if let ActorKindConfig::PizzaStone { pizzas, .. } = &actor.kind {
                    for pizza in pizzas {
                        self.pizza(pizza)?;
                    }
                }
                for event in &actor.behavior_loop {
                    self.validate_event(event, &actor_ids)?;
                }
                for script in &actor.talking {
                    for event in &script.events {
                        self.validate_event(event, &actor_ids)?;
                    }
                }
            }
            for space in &map.cutscene_spaces {
                for script in &space.scripts {
                    for event in &script.events {
                        self.validate_event(event, &actor_ids)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn validate_event(&self, event: &OverworldEvent, actor_ids: &[&str]) -> CrustResult<()> {
        let known_actor = |who: &Option<String>| match who {
            Some(who) if !actor_ids.contains(&who.as_str()) => {
                Err(CrustError::UnknownActor(who.clone()))
            }
            _ => Ok(()),
        };
        match event {
            OverworldEvent::Stand { who, .. }
            | OverworldEvent::Walk { who, .. }
            | OverworldEvent::Jump { who, .. } => known_actor(who),
            OverworldEvent::Message { face_hero, .. } => known_actor(face_hero),
            OverworldEvent::ChangeMap { map, .. } => self.map(map).map(|_| ()),
            OverworldEvent::Battle { enemy_id, .. } => self.enemy(enemy_id).map(|_| ()),
            OverworldEvent::CraftingMenu { pizzas } => {
                for pizza in pizzas {
                    self.pizza(pizza)?;
                }
                Ok(())
            }
            OverworldEvent::Pause | OverworldEvent::AddStoryFlag { .. } => Ok(()),
        }
    }
}
