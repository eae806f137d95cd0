//! # Crust
//!
//! Event and turn orchestration engine for a tile-based overworld and battle game.
//!
//! ## Architecture Overview
//!
//! The engine serializes many cooperating actors (player input, idle behavior
//! loops, animations, menus) into one deterministic stream of script steps:
//!
//! - **Game**: grid positions, occupancy, actors, maps, player state and save files
//! - **Content**: read-only registry of pizzas, actions, enemies and maps
//! - **Overworld**: the tick loop, the overworld event interpreter, cutscenes and
//!   behavior loops
//! - **Battle**: combatants, the battle event interpreter and the turn cycle
//! - **Input**: held-direction and key-press edge tracking
//! - **Rendering**: the presenter seam through which every visible effect passes
//!
//! Every script step is a single future that completes exactly once when its
//! visible effect is over; nothing advances to the next step before that.

pub mod battle;
pub mod content;
pub mod game;
pub mod input;
pub mod overworld;
pub mod rendering;

// Core module re-exports
pub use battle::*;
pub use content::*;
pub use game::*;
pub use input::*;
pub use overworld::*;
pub use rendering::*;

use std::future::Future;
use std::pin::Pin;

/// Core error type for the Crust engine.
#[derive(thiserror::Error, Debug)]
pub enum CrustError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// A script referenced an actor that is not on the current map
    #[error("Unknown actor: {0}")]
    UnknownActor(String),

    /// A script referenced a map that is not in the content registry
    #[error("Unknown map: {0}")]
    UnknownMap(String),

    /// A roster entry referenced a pizza that is not in the content registry
    #[error("Unknown pizza: {0}")]
    UnknownPizza(String),

    /// A combatant or item referenced an action that is not in the content registry
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    /// A battle event referenced an enemy that is not in the content registry
    #[error("Unknown enemy: {0}")]
    UnknownEnemy(String),

    /// An animation event named an effect that is not registered
    #[error("Unknown animation: {0}")]
    UnknownAnimation(String),

    /// Game state is invalid
    #[error("Invalid game state: {0}")]
    InvalidState(String),

    /// An event is missing a field its kind requires
    #[error("Invalid event: {0}")]
    InvalidEvent(String),
}

/// Result type used throughout the Crust codebase.
pub type CrustResult<T> = Result<T, CrustError>;

/// Boxed, sendable future used where script steps recurse through spawned tasks.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Version information for the engine.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine configuration constants.
pub mod config {
    use std::time::Duration;

    /// Size of one grid tile in pixels
    pub const GRID_SIZE: i32 = 16;

    /// Number of ticks (one pixel each) a single step takes
    pub const MOVE_STEPS: u32 = 16;

    /// Frames per second target for the simulation tick
    pub const TARGET_FPS: u64 = 60;

    /// Duration of one simulation tick / render frame
    pub const FRAME: Duration = Duration::from_micros(1_000_000 / TARGET_FPS);

    /// How long a combatant blinks after a state change
    pub const BLINK: Duration = Duration::from_millis(600);

    /// Pause between clearing and filling an active slot during a swap
    pub const SWAP_PACING: Duration = Duration::from_millis(400);

    /// Poll interval for a scripted walk waiting on an occupied tile
    pub const WALK_RETRY: Duration = Duration::from_millis(10);

    /// Back-off for an idle behavior loop while a cutscene owns the map
    pub const CUTSCENE_BACKOFF: Duration = Duration::from_millis(1000);

    /// Grace delay between mounting an actor and starting its behavior loop
    pub const MOUNT_GRACE: Duration = Duration::from_millis(10);

    /// Default airborne window of a jump
    pub const JUMP_TIME: Duration = Duration::from_millis(500);

    /// Delay before a jump leaves the ground
    pub const JUMP_LEAD_IN: Duration = Duration::from_millis(200);

    /// Pixels a jumping actor is lifted by
    pub const JUMP_HEIGHT: i32 = 10;

    /// Maximum number of pizzas in the player's lineup
    pub const MAX_LINEUP: usize = 3;

    /// XP needed for a level after a level-up
    pub const DEFAULT_MAX_XP: u32 = 100;

    /// Max HP gained per level-up
    pub const LEVEL_UP_HP_BONUS: i32 = 10;

    /// XP granted per level of a defeated enemy combatant
    pub const XP_PER_LEVEL: u32 = 20;
}
