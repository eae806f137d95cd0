//! # Progress
//!
//! Save files: the current map, where the hero stands and the player state.

use super::{Direction, PlayerState, Position};
use crate::CrustResult;
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A saved game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub map_id: String,
    pub start_x: i32,
    pub start_y: i32,
    pub start_direction: Direction,
    pub player_state: PlayerState,
}

impl Progress {
    pub fn new(map_id: impl Into<String>, hero: Position, direction: Direction, player_state: PlayerState) -> Self {
        Self {
            map_id: map_id.into(),
            start_x: hero.x,
            start_y: hero.y,
            start_direction: direction,
            player_state,
        }
    }

    pub fn hero_position(&self) -> Position {
        Position::new(self.start_x, self.start_y)
    }

    /// Writes the save file as pretty JSON.
    pub fn save(&self, path: &Path) -> CrustResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        info!("Saved progress on {} to {}", self.map_id, path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> CrustResult<Self> {
        let json = fs::read_to_string(path)?;
        let progress = serde_json::from_str(&json)?;
        info!("Loaded progress from {}", path.display());
        Ok(progress)
    }

    /// Loads the save file if one exists.
    pub fn load_optional(path: &Path) -> CrustResult<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        Self::load(path).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CrustError;

    #[test]
    fn test_save_and_load() -> CrustResult<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("save.json");
        let mut state = PlayerState::starter();
        state.story_flags.insert("TALKED_TO_ERIO".to_string());
        let progress = Progress::new("Kitchen", Position::from_grid(5, 5), Direction::Up, state);

        progress.save(&path)?;
        let loaded = Progress::load(&path)?;
        assert_eq!(loaded, progress);
        assert_eq!(loaded.hero_position(), Position::from_grid(5, 5));
        Ok(())
    }

    #[test]
    fn test_missing_save_file() -> CrustResult<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("absent.json");
        assert!(Progress::load_optional(&path)?.is_none());
        assert!(matches!(Progress::load(&path), Err(CrustError::Io(_))));
        Ok(())
    }
}
