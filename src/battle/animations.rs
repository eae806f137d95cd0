//! # Battle Animations
//!
//! Registry of named animation effects. An effect is awaited exactly once; the
//! battle continues when it returns.

use super::BattleEvent;
use crate::rendering::Presenter;
use crate::{CrustError, CrustResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// A named visual effect played during a battle.
#[async_trait]
pub trait BattleAnimation: Send + Sync {
    async fn play(&self, event: &BattleEvent, presenter: &dyn Presenter) -> CrustResult<()>;
}

/// An effect that shows itself and then holds the battle for a fixed time.
#[derive(Debug, Clone)]
pub struct TimedAnimation {
    pub name: String,
    pub hold: Duration,
}

impl TimedAnimation {
    pub fn new(name: &str, hold_ms: u64) -> Self {
        Self {
            name: name.to_string(),
            hold: Duration::from_millis(hold_ms),
        }
    }
}

#[async_trait]
impl BattleAnimation for TimedAnimation {
    async fn play(&self, event: &BattleEvent, presenter: &dyn Presenter) -> CrustResult<()> {
        presenter.animation_played(&self.name, event);
        if !self.hold.is_zero() {
            tokio::time::sleep(self.hold).await;
        }
        Ok(())
    }
}

/// Animation effects by name.
#[derive(Clone, Default)]
pub struct AnimationRegistry {
    effects: HashMap<String, Arc<dyn BattleAnimation>>,
}

impl AnimationRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in effects: `spin`, `glob`, `slip` and `shield`.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        // spin resumes as the pizzas collide, before the full motion ends
        registry.register("spin", TimedAnimation::new("spin", 100));
        registry.register("glob", TimedAnimation::new("glob", 820));
        registry.register("slip", TimedAnimation::new("slip", 0));
        registry.register("shield", TimedAnimation::new("shield", 600));
        registry
    }

    pub fn register(&mut self, name: &str, effect: impl BattleAnimation + 'static) {
        self.effects.insert(name.to_string(), Arc::new(effect));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.effects.contains_key(name)
    }

    /// Plays `name`; an unregistered name is a configuration error.
    pub async fn play(
        &self,
        name: &str,
        event: &BattleEvent,
        presenter: &dyn Presenter,
    ) -> CrustResult<()> {
        let effect = self
            .effects
            .get(name)
            .ok_or_else(|| CrustError::UnknownAnimation(name.to_string()))?;
        effect.play(event, presenter).await
    }
}

impl std::fmt::Debug for AnimationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.effects.keys().collect();
        names.sort();
        f.debug_struct("AnimationRegistry").field("effects", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::BattleEventKind;
    use crate::rendering::HeadlessPresenter;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_builtin_hold_times() -> CrustResult<()> {
        let registry = AnimationRegistry::builtin();
        for name in ["spin", "glob", "slip", "shield"] {
            assert!(registry.contains(name));
        }
        assert!(!registry.contains("explode"));
        let presenter = HeadlessPresenter::new();
        let event = BattleEvent::new(BattleEventKind::animation("glob"));

        let start = Instant::now();
        registry.play("glob", &event, &presenter).await?;
        assert_eq!(start.elapsed(), Duration::from_millis(820));

        let start = Instant::now();
        registry.play("slip", &event, &presenter).await?;
        assert_eq!(start.elapsed(), Duration::ZERO);
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_animation_is_error() {
        let registry = AnimationRegistry::builtin();
        let presenter = HeadlessPresenter::new();
        let event = BattleEvent::new(BattleEventKind::animation("explode"));
        let result = registry.play("explode", &event, &presenter).await;
        assert!(matches!(result, Err(CrustError::UnknownAnimation(_))));
    }
}
