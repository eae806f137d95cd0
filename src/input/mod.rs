//! # Input Module
//!
//! Held-direction tracking and edge-triggered key presses.
//!
//! Raw keyboard capture belongs to the host; it feeds [`Key`] press and
//! release events in, and the engine reads the current held direction once
//! per tick.

use crate::game::Direction;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Keys the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    KeyW,
    KeyA,
    KeyS,
    KeyD,
    Enter,
    Escape,
}

impl Key {
    /// The movement direction bound to this key, if any.
    ///
    /// # Examples
    ///
    /// ```
    /// use crust::{Direction, Key};
    ///
    /// assert_eq!(Key::KeyW.direction(), Some(Direction::Up));
    /// assert_eq!(Key::Enter.direction(), None);
    /// ```
    pub fn direction(self) -> Option<Direction> {
        match self {
            Key::ArrowUp | Key::KeyW => Some(Direction::Up),
            Key::ArrowDown | Key::KeyS => Some(Direction::Down),
            Key::ArrowLeft | Key::KeyA => Some(Direction::Left),
            Key::ArrowRight | Key::KeyD => Some(Direction::Right),
            Key::Enter | Key::Escape => None,
        }
    }

    /// Parses a DOM-style key code such as `"ArrowUp"` or `"KeyW"`.
    pub fn from_code(code: &str) -> Option<Key> {
        let key = match code {
            "ArrowUp" => Key::ArrowUp,
            "ArrowDown" => Key::ArrowDown,
            "ArrowLeft" => Key::ArrowLeft,
            "ArrowRight" => Key::ArrowRight,
            "KeyW" => Key::KeyW,
            "KeyA" => Key::KeyA,
            "KeyS" => Key::KeyS,
            "KeyD" => Key::KeyD,
            "Enter" => Key::Enter,
            "Escape" => Key::Escape,
            _ => return None,
        };
        Some(key)
    }
}

/// Discrete actions raised by key presses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Confirm,
    Cancel,
}

/// Stack of held directions; the most recently pressed one wins.
#[derive(Debug, Clone, Default)]
pub struct DirectionInput {
    held: Vec<Direction>,
}

impl DirectionInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// The direction to walk this tick, if any.
    pub fn direction(&self) -> Option<Direction> {
        self.held.first().copied()
    }

    pub fn press(&mut self, key: Key) {
        if let Some(direction) = key.direction() {
            if !self.held.contains(&direction) {
                self.held.insert(0, direction);
            }
        }
    }

    pub fn release(&mut self, key: Key) {
        if let Some(direction) = key.direction() {
            self.held.retain(|held| *held != direction);
        }
    }

    pub fn clear(&mut self) {
        self.held.clear();
    }
}

/// Turns key-down events into single presses, ignoring auto-repeat.
#[derive(Debug, Clone, Default)]
pub struct KeyPressListener {
    down: HashSet<Key>,
}

impl KeyPressListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the bound action if this is a fresh press.
    pub fn press(&mut self, key: Key) -> Option<KeyAction> {
        if !self.down.insert(key) {
            return None;
        }
        match key {
            Key::Enter => Some(KeyAction::Confirm),
            Key::Escape => Some(KeyAction::Cancel),
            _ => None,
        }
    }

    pub fn release(&mut self, key: Key) {
        self.down.remove(&key);
    }
}
