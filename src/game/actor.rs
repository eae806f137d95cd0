//! # Actors
//!
//! People and stationary props placed on the overworld grid.

use super::{ActorId, Direction, Position, StoryFlags};
use crate::config::MOVE_STEPS;
use crate::content::{ActorConfig, ActorKindConfig};
use crate::game::{Speed, TextLine};
use crate::overworld::OverworldEvent;
use serde::{Deserialize, Serialize};

/// A dialogue or footstep script, played when all of its required flags are set.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TalkScript {
    #[serde(default)]
    pub required: Vec<String>,
    pub events: Vec<OverworldEvent>,
}

impl TalkScript {
    pub fn new(events: Vec<OverworldEvent>) -> Self {
        Self {
            required: Vec::new(),
            events,
        }
    }

    pub fn requiring(mut self, flag: impl Into<String>) -> Self {
        self.required.push(flag.into());
        self
    }

    pub fn is_eligible(&self, flags: &StoryFlags) -> bool {
        self.required.iter().all(|flag| flags.contains(flag))
    }
}

/// Returns the events of the first eligible script, if any.
pub fn first_eligible(scripts: &[TalkScript], flags: &StoryFlags) -> Option<Vec<OverworldEvent>> {
    scripts
        .iter()
        .find(|script| script.is_eligible(flags))
        .map(|script| script.events.clone())
}

/// What kind of actor this is.
#[derive(Debug, Clone, PartialEq)]
pub enum ActorKind {
    /// Walks, stands and runs idle behavior.
    Person,
    /// A stationary prop that grants pizzas once.
    PizzaStone {
        story_flag: String,
        pizzas: Vec<String>,
    },
}

/// An entity on the overworld grid.
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: ActorId,
    pub position: Position,
    pub direction: Direction,
    pub kind: ActorKind,
    pub is_mounted: bool,
    pub behavior_loop: Vec<OverworldEvent>,
    pub behavior_loop_index: usize,
    pub talking: Vec<TalkScript>,
    pub is_player_controlled: bool,
    /// Pixels left in the current step, `0..=MOVE_STEPS`.
    pub moving_progress_remaining: u32,
    pub is_standing: bool,
    pub jump_height: i32,
    /// Bumped whenever behavior loops are restarted so stale loops exit.
    pub behavior_generation: u64,
}

impl Actor {
    /// Creates an unmounted person at the given tile.
    pub fn person(id: impl Into<ActorId>, position: Position) -> Self {
        Self {
            id: id.into(),
            position,
            direction: Direction::Down,
            kind: ActorKind::Person,
            is_mounted: false,
            behavior_loop: Vec::new(),
            behavior_loop_index: 0,
            talking: Vec::new(),
            is_player_controlled: false,
            moving_progress_remaining: 0,
            is_standing: false,
            jump_height: 0,
            behavior_generation: 0,
        }
    }

    /// Creates an unmounted pizza stone; its dialogue is derived from the flag.
    pub fn pizza_stone(
        id: impl Into<ActorId>,
        position: Position,
        story_flag: impl Into<String>,
        pizzas: Vec<String>,
    ) -> Self {
        let story_flag = story_flag.into();
        let talking = vec![
            TalkScript::new(vec![OverworldEvent::message(vec![TextLine::new(
                "You have already used this.",
                Speed::Fast,
            )])])
            .requiring(story_flag.clone()),
            TalkScript::new(vec![
                OverworldEvent::message(vec![TextLine::new(
                    "Approaching the legendary pizza stone...",
                    Speed::Normal,
                )]),
                OverworldEvent::CraftingMenu {
                    pizzas: pizzas.clone(),
                },
                OverworldEvent::AddStoryFlag {
                    flag: story_flag.clone(),
                },
            ]),
        ];
        Self {
            kind: ActorKind::PizzaStone { story_flag, pizzas },
            talking,
            ..Self::person(id, position)
        }
    }

    /// Builds an actor from its map configuration.
    pub fn from_config(config: &ActorConfig) -> Self {
        let position = Position::from_grid(config.x, config.y);
        let mut actor = match &config.kind {
            ActorKindConfig::Person => Self::person(config.id.clone(), position),
            ActorKindConfig::PizzaStone { story_flag, pizzas } => {
                Self::pizza_stone(config.id.clone(), position, story_flag.clone(), pizzas.clone())
            }
        };
        actor.direction = config.direction;
        actor.is_player_controlled = config.is_player_controlled;
        actor.behavior_loop = config.behavior_loop.clone();
        if !config.talking.is_empty() {
            actor.talking = config.talking.clone();
        }
        actor
    }

    pub fn is_moving(&self) -> bool {
        self.moving_progress_remaining > 0
    }

    pub fn has_behavior(&self) -> bool {
        matches!(self.kind, ActorKind::Person) && !self.behavior_loop.is_empty()
    }

    /// Begins a step animation after the occupancy model has accepted it.
    pub fn begin_step(&mut self, direction: Direction) {
        self.direction = direction;
        self.moving_progress_remaining = MOVE_STEPS;
    }

    /// Advances one pixel along the current direction.
    ///
    /// Returns true on the tick the step completes.
    pub fn update_position(&mut self) -> bool {
        if self.moving_progress_remaining == 0 {
            return false;
        }
        let delta = self.direction.to_delta();
        self.position = self.position + delta;
        self.moving_progress_remaining -= 1;
        self.moving_progress_remaining == 0
    }

    /// Named animation state for the rendering collaborator.
    pub fn animation_key(&self, flags: &StoryFlags) -> String {
        match &self.kind {
            ActorKind::PizzaStone { story_flag, .. } => {
                if flags.contains(story_flag) {
                    "used-down".to_string()
                } else {
                    "unused-down".to_string()
                }
            }
            ActorKind::Person if self.is_moving() => format!("walk-{}", self.direction.as_str()),
            ActorKind::Person => format!("idle-{}", self.direction.as_str()),
        }
    }

    /// Events of the first talk script whose flags are satisfied.
    pub fn talk_events(&self, flags: &StoryFlags) -> Option<Vec<OverworldEvent>> {
        first_eligible(&self.talking, flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_takes_sixteen_ticks() {
        let mut actor = Actor::person("npc", Position::from_grid(1, 1));
        actor.begin_step(Direction::Right);
        let mut completions = 0;
        for _ in 0..MOVE_STEPS {
            if actor.update_position() {
                completions += 1;
            }
        }
        assert_eq!(completions, 1);
        assert_eq!(actor.position, Position::from_grid(2, 1));
        assert!(!actor.update_position());
    }

    #[test]
    fn test_animation_keys() {
        let flags = StoryFlags::new();
        let mut actor = Actor::person("npc", Position::origin());
        actor.direction = Direction::Left;
        assert_eq!(actor.animation_key(&flags), "idle-left");
        actor.begin_step(Direction::Up);
        assert_eq!(actor.animation_key(&flags), "walk-up");
    }

    #[test]
    fn test_pizza_stone_dialogue_depends_on_flag() {
        let stone = Actor::pizza_stone(
            "stone",
            Position::origin(),
            "USED_STONE",
            vec!["v001".to_string()],
        );
        let mut flags = StoryFlags::new();
        assert_eq!(stone.animation_key(&flags), "unused-down");
        let events = stone.talk_events(&flags).unwrap();
        assert_eq!(events.len(), 3);

        flags.insert("USED_STONE".to_string());
        assert_eq!(stone.animation_key(&flags), "used-down");
        let events = stone.talk_events(&flags).unwrap();
        assert_eq!(events.len(), 1);
        assert!(!stone.has_behavior());
    }

    #[test]
    fn test_talk_script_requirements() {
        let script = TalkScript::new(vec![]).requiring("A").requiring("B");
        let mut flags = StoryFlags::new();
        flags.insert("A".to_string());
        assert!(!script.is_eligible(&flags));
        flags.insert("B".to_string());
        assert!(script.is_eligible(&flags));
    }
}
