//! # Occupancy
//!
//! Tracks blocked tiles and the tiles actors have committed to move into.
//!
//! A tile is taken when it is a wall (static walls and resting actors both
//! register as walls) or when any actor has declared it as its intent
//! position. Collisions are prevented by checking before a move starts.

use super::{ActorId, Direction, Position};
use std::collections::{HashMap, HashSet};

/// Walls and movement intents for a single map.
#[derive(Debug, Clone, Default)]
pub struct Occupancy {
    walls: HashSet<Position>,
    intents: HashMap<ActorId, Position>,
}

impl Occupancy {
    /// Creates an occupancy model with the given static walls.
    pub fn new(walls: impl IntoIterator<Item = Position>) -> Self {
        Self {
            walls: walls.into_iter().collect(),
            intents: HashMap::new(),
        }
    }

    /// Returns true if the tile one step from `from` in `direction` is blocked.
    ///
    /// The caller's own tile is never the destination, so an actor never
    /// blocks itself.
    pub fn is_space_taken(&self, from: Position, direction: Direction) -> bool {
        self.is_taken(from.next(direction))
    }

    /// Returns true if `tile` is a wall or some actor's intent position.
    pub fn is_taken(&self, tile: Position) -> bool {
        self.walls.contains(&tile) || self.intents.values().any(|intent| *intent == tile)
    }

    pub fn add_wall(&mut self, tile: Position) {
        self.walls.insert(tile);
    }

    pub fn remove_wall(&mut self, tile: Position) {
        self.walls.remove(&tile);
    }

    /// Atomically moves a wall one step, as an actor does when it starts walking.
    pub fn move_wall(&mut self, was: Position, direction: Direction) {
        self.remove_wall(was);
        self.add_wall(was.next(direction));
    }

    /// Commits `who` to stepping from `from` toward `direction`.
    ///
    /// Returns the destination, or `None` if it is already taken.
    pub fn begin_move(
        &mut self,
        who: &str,
        from: Position,
        direction: Direction,
    ) -> Option<Position> {
        if self.is_space_taken(from, direction) {
            return None;
        }
        let destination = from.next(direction);
        self.move_wall(from, direction);
        self.intents.insert(who.to_string(), destination);
        Some(destination)
    }

    /// Clears the intent of `who` once it has arrived.
    pub fn finish_move(&mut self, who: &str) {
        self.intents.remove(who);
    }

    /// Intent position of `who`, if it is mid-step.
    pub fn intent_of(&self, who: &str) -> Option<Position> {
        self.intents.get(who).copied()
    }

    pub fn is_wall(&self, tile: Position) -> bool {
        self.walls.contains(&tile)
    }

    pub fn wall_count(&self) -> usize {
        self.walls.len()
    }
}
