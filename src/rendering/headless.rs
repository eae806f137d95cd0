//! # Headless Presenter
//!
//! A presenter with no screen. It records a transcript of everything shown,
//! dismisses messages after a fixed delay and answers menus from a script.
//! Used by the demo binary and by tests.

use super::{Hud, Menu, Presenter};
use crate::battle::{BattleEvent, BattleView};
use crate::game::ActorView;
use async_trait::async_trait;
use log::{debug, info};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Default)]
pub struct HeadlessPresenter {
    transcript: Mutex<Vec<String>>,
    messages: Mutex<Vec<String>>,
    choices: Mutex<VecDeque<usize>>,
    dismiss_delay: Duration,
    frames: AtomicU64,
    last_frame: Mutex<Vec<ActorView>>,
    last_battle: Mutex<Option<BattleView>>,
    hud: Mutex<Option<Hud>>,
}

impl HeadlessPresenter {
    /// Dismisses messages immediately and has no scripted choices.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dismiss_delay(mut self, delay: Duration) -> Self {
        self.dismiss_delay = delay;
        self
    }

    /// Queues menu answers, consumed in order.
    ///
    /// Once the script runs out, cancellable menus are cancelled and other
    /// menus take their first enabled option.
    pub fn with_choices(self, choices: impl IntoIterator<Item = usize>) -> Self {
        lock(&self.choices).extend(choices);
        self
    }

    pub fn push_choice(&self, choice: usize) {
        lock(&self.choices).push_back(choice);
    }

    fn record(&self, entry: String) {
        debug!("{}", entry);
        lock(&self.transcript).push(entry);
    }

    pub fn transcript(&self) -> Vec<String> {
        lock(&self.transcript).clone()
    }

    /// Text of every message shown so far.
    pub fn messages(&self) -> Vec<String> {
        lock(&self.messages).clone()
    }

    pub fn frame_count(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    pub fn last_frame(&self) -> Vec<ActorView> {
        lock(&self.last_frame).clone()
    }

    pub fn last_battle(&self) -> Option<BattleView> {
        lock(&self.last_battle).clone()
    }

    pub fn hud(&self) -> Option<Hud> {
        lock(&self.hud).clone()
    }
}

#[async_trait]
impl Presenter for HeadlessPresenter {
    fn frame(&self, actors: &[ActorView]) {
        self.frames.fetch_add(1, Ordering::Relaxed);
        *lock(&self.last_frame) = actors.to_vec();
    }

    fn message_opened(&self, text: &str) {
        info!("💬 {}", text);
        lock(&self.messages).push(text.to_string());
        self.record(format!("message: {}", text));
    }

    fn message_closed(&self) {}

    async fn wait_for_dismiss(&self) {
        if !self.dismiss_delay.is_zero() {
            tokio::time::sleep(self.dismiss_delay).await;
        }
    }

    async fn choose(&self, menu: &Menu) -> Option<usize> {
        let scripted = lock(&self.choices).pop_front();
        let choice = match scripted {
            Some(index) if menu.is_selectable(index) => Some(index),
            Some(_) => None,
            None if menu.cancellable => None,
            None => menu.first_enabled(),
        };
        let label = choice
            .and_then(|i| menu.options.get(i))
            .map(|option| option.label.as_str())
            .unwrap_or("<cancel>");
        self.record(format!("menu: {} -> {}", menu.title, label));
        choice
    }

    async fn fade_out(&self) {
        self.record("fade out".to_string());
    }

    async fn fade_in(&self) {
        self.record("fade in".to_string());
    }

    fn battle_started(&self, view: &BattleView, enemy_name: &str, arena: Option<&str>) {
        *lock(&self.last_battle) = Some(view.clone());
        match arena {
            Some(arena) => self.record(format!("battle: vs {} in {}", enemy_name, arena)),
            None => self.record(format!("battle: vs {}", enemy_name)),
        }
    }

    fn battle_refreshed(&self, view: &BattleView) {
        *lock(&self.last_battle) = Some(view.clone());
    }

    fn battle_ended(&self, did_win: bool) {
        self.record(format!("battle: {}", if did_win { "won" } else { "lost" }));
    }

    fn animation_played(&self, name: &str, _event: &BattleEvent) {
        self.record(format!("animation: {}", name));
    }

    fn hud_updated(&self, hud: &Hud) {
        *lock(&self.hud) = Some(hud.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::MenuOption;

    #[tokio::test]
    async fn test_scripted_then_default_choices() {
        let presenter = HeadlessPresenter::new().with_choices([1]);
        let menu = Menu::new("Pick", false)
            .option(MenuOption::new("A", ""))
            .option(MenuOption::new("B", ""));
        assert_eq!(presenter.choose(&menu).await, Some(1));
        assert_eq!(presenter.choose(&menu).await, Some(0));

        let pause = Menu::new("Pause", true).option(MenuOption::new("Close", ""));
        assert_eq!(presenter.choose(&pause).await, None);
        assert_eq!(presenter.transcript().len(), 3);
    }
}
