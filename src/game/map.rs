//! # Overworld Map
//!
//! A single loaded map: its actors, occupancy and cutscene triggers, plus the
//! per-tick simulation step.

use super::{
    first_eligible, Actor, ActorId, Direction, Occupancy, Position, StoryFlags, TalkScript,
    HERO_ID,
};
use crate::content::MapConfig;
use crate::overworld::{ActorSignal, OverworldEvent, SignalKind};
use crate::{CrustError, CrustResult};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Outcome of asking an actor to start a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkStart {
    /// The step was accepted; the actor will arrive at this tile.
    Started(Position),
    /// The destination is a wall or another actor's intent.
    Blocked,
    /// The actor is still finishing a previous step.
    Busy,
}

/// What the rendering collaborator needs to draw one actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorView {
    pub id: ActorId,
    pub x: i32,
    pub y: i32,
    pub direction: Direction,
    pub animation: String,
    pub jump_height: i32,
}

/// A loaded overworld map.
#[derive(Debug, Clone)]
pub struct OverworldMap {
    pub id: String,
    pub actors: Vec<Actor>,
    pub occupancy: Occupancy,
    pub cutscene_spaces: HashMap<Position, Vec<TalkScript>>,
    pub is_cutscene_playing: bool,
    pub is_paused: bool,
}

impl OverworldMap {
    /// Builds a map from configuration. Actors start unmounted.
    pub fn from_config(config: &MapConfig) -> Self {
        let walls = config
            .walls
            .iter()
            .map(|[x, y]| Position::from_grid(*x, *y));
        let cutscene_spaces = config
            .cutscene_spaces
            .iter()
            .map(|space| (Position::from_grid(space.x, space.y), space.scripts.clone()))
            .collect();

        Self {
            id: config.id.clone(),
            actors: config.actors.iter().map(Actor::from_config).collect(),
            occupancy: Occupancy::new(walls),
            cutscene_spaces,
            is_cutscene_playing: false,
            is_paused: false,
        }
    }

    pub fn actor(&self, id: &str) -> CrustResult<&Actor> {
        self.actors
            .iter()
            .find(|actor| actor.id == id)
            .ok_or_else(|| CrustError::UnknownActor(id.to_string()))
    }

    pub fn actor_mut(&mut self, id: &str) -> CrustResult<&mut Actor> {
        self.actors
            .iter_mut()
            .find(|actor| actor.id == id)
            .ok_or_else(|| CrustError::UnknownActor(id.to_string()))
    }

    pub fn hero(&self) -> CrustResult<&Actor> {
        self.actor(HERO_ID)
    }

    /// Mounts every actor, registering its tile as a wall.
    ///
    /// Returns the ids of actors that have an idle behavior loop to start.
    pub fn mount_objects(&mut self) -> Vec<ActorId> {
        let mut with_behavior = Vec::new();
        for actor in &mut self.actors {
            actor.is_mounted = true;
            self.occupancy.add_wall(actor.position);
            if actor.has_behavior() {
                with_behavior.push(actor.id.clone());
            }
        }
        with_behavior
    }

    pub fn unmount_all(&mut self) {
        for actor in &mut self.actors {
            actor.is_mounted = false;
        }
    }

    /// Moves the hero to `position`, re-registering its wall there.
    pub fn place_hero(&mut self, position: Position, direction: Direction) -> CrustResult<()> {
        let old = self.hero()?.position;
        self.occupancy.remove_wall(old);
        let hero = self.actor_mut(HERO_ID)?;
        hero.position = position;
        hero.direction = direction;
        self.occupancy.add_wall(position);
        Ok(())
    }

    pub fn is_space_taken(&self, from: Position, direction: Direction) -> bool {
        self.occupancy.is_space_taken(from, direction)
    }

    /// Turns `who` toward `direction` and starts a step if the tile is free.
    pub fn start_walk(&mut self, who: &str, direction: Direction) -> CrustResult<WalkStart> {
        let actor = self.actor_mut(who)?;
        if actor.is_moving() {
            return Ok(WalkStart::Busy);
        }
        actor.direction = direction;
        let from = actor.position;

        match self.occupancy.begin_move(who, from, direction) {
            Some(destination) => {
                self.actor_mut(who)?.begin_step(direction);
                debug!("{} walking {:?} to {}", who, direction, destination);
                Ok(WalkStart::Started(destination))
            }
            None => Ok(WalkStart::Blocked),
        }
    }

    pub fn start_stand(&mut self, who: &str, direction: Option<Direction>) -> CrustResult<()> {
        let actor = self.actor_mut(who)?;
        if let Some(direction) = direction {
            actor.direction = direction;
        }
        actor.is_standing = true;
        Ok(())
    }

    pub fn finish_stand(&mut self, who: &str) -> CrustResult<()> {
        self.actor_mut(who)?.is_standing = false;
        Ok(())
    }

    /// Advances the simulation one tick.
    ///
    /// Moving actors advance one pixel. When no cutscene is playing the
    /// player-controlled actor starts a step toward the held direction.
    /// Returns the completion signals raised this tick.
    pub fn update(&mut self, arrow: Option<Direction>) -> Vec<ActorSignal> {
        let mut signals = Vec::new();
        let mut to_start = Vec::new();

        for actor in &mut self.actors {
            if actor.is_moving() {
                if actor.update_position() {
                    self.occupancy.finish_move(&actor.id);
                    signals.push(ActorSignal::new(actor.id.clone(), SignalKind::Walking));
                }
                continue;
            }
            if !self.is_cutscene_playing && actor.is_player_controlled {
                if let Some(direction) = arrow {
                    to_start.push((actor.id.clone(), direction));
                }
            }
        }

        for (who, direction) in to_start {
            match self.start_walk(&who, direction) {
                Ok(WalkStart::Blocked) => debug!("{} bumped {:?}", who, direction),
                Ok(_) => {}
                Err(err) => warn!("walk input dropped: {}", err),
            }
        }

        signals
    }

    /// Talk script of the actor the hero is facing, if a cutscene may start.
    pub fn talk_scenario(&self, flags: &StoryFlags) -> Option<Vec<OverworldEvent>> {
        if self.is_cutscene_playing {
            return None;
        }
        let hero = self.hero().ok()?;
        let facing = hero.position.next(hero.direction);
        self.actors
            .iter()
            .find(|actor| actor.position == facing && actor.is_mounted)
            .and_then(|actor| actor.talk_events(flags))
    }

    /// Footstep script for the tile the hero is standing on, if any.
    pub fn footstep_scenario(&self, flags: &StoryFlags) -> Option<Vec<OverworldEvent>> {
        if self.is_cutscene_playing {
            return None;
        }
        let hero = self.hero().ok()?;
        self.cutscene_spaces
            .get(&hero.position)
            .and_then(|scripts| first_eligible(scripts, flags))
    }

    /// Drawable view of every actor, sorted by y for painter's order.
    pub fn actor_views(&self, flags: &StoryFlags) -> Vec<ActorView> {
        let mut views: Vec<ActorView> = self
            .actors
            .iter()
            .filter(|actor| actor.is_mounted)
            .map(|actor| ActorView {
                id: actor.id.clone(),
                x: actor.position.x,
                y: actor.position.y,
                direction: actor.direction,
                animation: actor.animation_key(flags),
                jump_height: actor.jump_height,
            })
            .collect();
        views.sort_by_key(|view| view.y);
        views
    }
}
