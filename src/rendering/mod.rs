//! # Rendering Module
//!
//! The presenter seam. The engine never draws anything itself: it tells a
//! [`Presenter`] what changed and awaits the presenter for anything that
//! depends on the player (dismissing a message, picking a menu option) or on
//! a visual transition (scene fades).

pub mod headless;
pub mod hud;
pub mod message;

pub use headless::*;
pub use hud::*;
pub use message::*;

use crate::battle::{BattleEvent, BattleView};
use crate::game::ActorView;
use async_trait::async_trait;
use serde::Serialize;

/// One selectable menu entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuOption {
    pub label: String,
    pub description: String,
    /// Short text shown at the right edge (icon, quantity).
    pub right: Option<String>,
    pub disabled: bool,
}

impl MenuOption {
    pub fn new(label: &str, description: &str) -> Self {
        Self {
            label: label.to_string(),
            description: description.to_string(),
            right: None,
            disabled: false,
        }
    }

    pub fn with_right(mut self, right: &str) -> Self {
        self.right = Some(right.to_string());
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }
}

/// A page of options to choose from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Menu {
    pub title: String,
    pub options: Vec<MenuOption>,
    /// Whether the player may back out without choosing.
    pub cancellable: bool,
}

impl Menu {
    pub fn new(title: impl Into<String>, cancellable: bool) -> Self {
        Self {
            title: title.into(),
            options: Vec::new(),
            cancellable,
        }
    }

    pub fn option(mut self, option: MenuOption) -> Self {
        self.options.push(option);
        self
    }

    /// Index of the first option that can be picked.
    pub fn first_enabled(&self) -> Option<usize> {
        self.options.iter().position(|option| !option.disabled)
    }

    /// Whether `index` names an option that can be picked.
    pub fn is_selectable(&self, index: usize) -> bool {
        self.options.get(index).is_some_and(|option| !option.disabled)
    }
}

/// Everything visible the engine produces, and the player's answers to it.
///
/// Notification methods default to doing nothing so presenters implement
/// only what they show.
#[async_trait]
pub trait Presenter: Send + Sync {
    /// Called once per simulation tick with every mounted actor, sorted by y.
    fn frame(&self, _actors: &[ActorView]) {}

    fn message_opened(&self, _text: &str) {}

    /// The message text has been fully revealed.
    fn message_revealed(&self, _text: &str) {}

    fn message_closed(&self) {}

    /// Completes when the player dismisses the open message.
    async fn wait_for_dismiss(&self);

    /// Returns the chosen option index, or `None` if the menu was cancelled.
    async fn choose(&self, menu: &Menu) -> Option<usize>;

    /// Completes once the screen is fully covered.
    async fn fade_out(&self) {}

    /// Completes once the cover has faded away.
    async fn fade_in(&self) {}

    fn battle_started(&self, _view: &BattleView, _enemy_name: &str, _arena: Option<&str>) {}

    fn battle_refreshed(&self, _view: &BattleView) {}

    fn battle_ended(&self, _did_win: bool) {}

    fn set_blinking(&self, _combatant: &str, _blinking: bool) {}

    fn animation_played(&self, _name: &str, _event: &BattleEvent) {}

    fn hud_updated(&self, _hud: &Hud) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_enabled_skips_disabled() {
        let menu = Menu::new("Root", false)
            .option(MenuOption::new("Items", "").disabled(true))
            .option(MenuOption::new("Attack", ""));
        assert_eq!(menu.first_enabled(), Some(1));
        assert!(!menu.is_selectable(0));
        assert!(menu.is_selectable(1));
        assert!(!menu.is_selectable(2));
    }
}
