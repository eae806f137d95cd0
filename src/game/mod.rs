//! # Game Module
//!
//! Core overworld state: grid coordinates, occupancy, actors and maps.
//!
//! This module contains the fundamental building blocks of the overworld:
//! - Pixel positions snapped to a fixed tile grid
//! - The occupancy model (walls plus in-flight movement intents)
//! - Actors, their idle behavior loops and dialogue scripts
//! - Maps, player state and save files

pub mod actor;
pub mod map;
pub mod occupancy;
pub mod player;
pub mod progress;
pub mod text;

pub use actor::*;
pub use map::*;
pub use occupancy::*;
pub use player::*;
pub use progress::*;
pub use text::*;

use crate::config::GRID_SIZE;
use serde::{Deserialize, Serialize};

/// A position on the overworld, in pixels.
///
/// Resting actors always sit on a multiple of [`GRID_SIZE`]; actors in the
/// middle of a step sit between two tiles.
///
/// # Examples
///
/// ```
/// use crust::{Direction, Position};
///
/// let pos = Position::from_grid(5, 6);
/// assert_eq!(pos, Position::new(80, 96));
/// assert_eq!(pos.next(Direction::Up), Position::from_grid(5, 5));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    /// Creates a new position with the given pixel coordinates.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Creates a position from tile coordinates.
    pub fn from_grid(x: i32, y: i32) -> Self {
        Self::new(with_grid(x), with_grid(y))
    }

    /// Returns the origin position (0, 0).
    pub fn origin() -> Self {
        Self::new(0, 0)
    }

    /// Returns the tile one grid step away in `direction`.
    pub fn next(self, direction: Direction) -> Self {
        let delta = direction.to_delta();
        Self::new(self.x + delta.x * GRID_SIZE, self.y + delta.y * GRID_SIZE)
    }

    /// Tile coordinates of this position, rounded down.
    pub fn to_grid(self) -> (i32, i32) {
        (self.x.div_euclid(GRID_SIZE), self.y.div_euclid(GRID_SIZE))
    }

    /// Calculates the Manhattan distance to another position.
    pub fn manhattan_distance(self, other: Position) -> u32 {
        ((self.x - other.x).abs() + (self.y - other.y).abs()) as u32
    }
}

impl std::ops::Add for Position {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// Converts a tile coordinate to pixels.
pub fn with_grid(n: i32) -> i32 {
    n * GRID_SIZE
}

/// Computes the destination tile of a single step.
pub fn next_position(x: i32, y: i32, direction: Direction) -> Position {
    Position::new(x, y).next(direction)
}

/// Facing and movement directions on the overworld grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    #[default]
    Down,
    Left,
    Right,
}

impl Direction {
    /// Converts a direction to a unit delta.
    ///
    /// # Examples
    ///
    /// ```
    /// use crust::{Direction, Position};
    ///
    /// assert_eq!(Direction::Up.to_delta(), Position::new(0, -1));
    /// ```
    pub fn to_delta(self) -> Position {
        match self {
            Direction::Up => Position::new(0, -1),
            Direction::Down => Position::new(0, 1),
            Direction::Left => Position::new(-1, 0),
            Direction::Right => Position::new(1, 0),
        }
    }

    /// The direction facing the other way.
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Lowercase name used in animation keys.
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }

    /// Returns all 4 directions.
    pub fn all() -> [Direction; 4] {
        [Direction::Up, Direction::Down, Direction::Left, Direction::Right]
    }
}

/// Identifier of an actor on a map (`"hero"`, `"npcA"`, ...).
pub type ActorId = String;

/// Identifier of the player-controlled actor on every map.
pub const HERO_ID: &str = "hero";
