//! # Overworld Events
//!
//! One scripted overworld instruction and its interpreter. Every event
//! resolves exactly once, when its visible effect is over.

use super::menus::{run_crafting_menu, run_pause_menu};
use super::signals::{wait_for, ActorSignal, SignalKind};
use super::Overworld;
use crate::battle::Battle;
use crate::config::{JUMP_HEIGHT, JUMP_LEAD_IN, JUMP_TIME, WALK_RETRY};
use crate::game::{Direction, Position, TextLine, WalkStart};
use crate::rendering::show_message;
use crate::{BoxFuture, CrustError, CrustResult};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::sleep;

fn default_retry() -> bool {
    true
}

/// A single cutscene or behavior-loop step.
///
/// `who` is optional on actor events because behavior loops fill it in with
/// the owning actor's id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OverworldEvent {
    #[serde(rename_all = "camelCase")]
    Stand {
        #[serde(default)]
        who: Option<String>,
        #[serde(default)]
        direction: Option<Direction>,
        time: u64,
    },
    #[serde(rename_all = "camelCase")]
    Walk {
        #[serde(default)]
        who: Option<String>,
        direction: Direction,
        #[serde(default = "default_retry")]
        retry: bool,
    },
    #[serde(rename_all = "camelCase")]
    Jump {
        #[serde(default)]
        who: Option<String>,
        /// Airborne window in milliseconds.
        #[serde(default)]
        time: Option<u64>,
    },
    #[serde(rename_all = "camelCase")]
    Message {
        text_lines: Vec<TextLine>,
        /// Actor to turn toward the hero before speaking.
        #[serde(default)]
        face_hero: Option<String>,
    },
    /// Loads another map. Coordinates are in grid units.
    #[serde(rename_all = "camelCase")]
    ChangeMap {
        map: String,
        #[serde(default)]
        x: Option<i32>,
        #[serde(default)]
        y: Option<i32>,
        #[serde(default)]
        direction: Option<Direction>,
    },
    #[serde(rename_all = "camelCase")]
    Battle {
        enemy_id: String,
        #[serde(default)]
        arena: Option<String>,
    },
    Pause,
    AddStoryFlag { flag: String },
    CraftingMenu { pizzas: Vec<String> },
}

impl OverworldEvent {
    pub fn message(text_lines: Vec<TextLine>) -> Self {
        OverworldEvent::Message {
            text_lines,
            face_hero: None,
        }
    }

    /// A stand step; `who: None` is filled in by a behavior loop.
    pub fn stand(who: Option<&str>, direction: Direction, time: u64) -> Self {
        OverworldEvent::Stand {
            who: who.map(str::to_string),
            direction: Some(direction),
            time,
        }
    }

    pub fn walk(who: &str, direction: Direction) -> Self {
        OverworldEvent::Walk {
            who: Some(who.to_string()),
            direction,
            retry: true,
        }
    }

    /// The actor this event acts on, if it is an actor event.
    pub fn who(&self) -> Option<&str> {
        match self {
            OverworldEvent::Stand { who, .. }
            | OverworldEvent::Walk { who, .. }
            | OverworldEvent::Jump { who, .. } => who.as_deref(),
            _ => None,
        }
    }

    /// Sets `who` on actor events that leave it empty.
    pub fn fill_who(&mut self, id: &str) {
        match self {
            OverworldEvent::Stand { who, .. }
            | OverworldEvent::Walk { who, .. }
            | OverworldEvent::Jump { who, .. } => {
                if who.is_none() {
                    *who = Some(id.to_string());
                }
            }
            _ => {}
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            OverworldEvent::Stand { .. } => "stand",
            OverworldEvent::Walk { .. } => "walk",
            OverworldEvent::Jump { .. } => "jump",
            OverworldEvent::Message { .. } => "message",
            OverworldEvent::ChangeMap { .. } => "changeMap",
            OverworldEvent::Battle { .. } => "battle",
            OverworldEvent::Pause => "pause",
            OverworldEvent::AddStoryFlag { .. } => "addStoryFlag",
            OverworldEvent::CraftingMenu { .. } => "craftingMenu",
        }
    }
}

/// How an event finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResolution {
    Done,
    WonBattle,
    LostBattle,
}

enum WalkAttempt {
    Bumped,
    Started(broadcast::Receiver<ActorSignal>),
    Waiting,
}

fn required_who(who: Option<String>, kind: &str) -> CrustResult<String> {
    who.ok_or_else(|| CrustError::InvalidEvent(format!("{} event has no actor", kind)))
}

impl Overworld {
    /// Runs one event to completion.
    pub fn interpret(&self, event: OverworldEvent) -> BoxFuture<'static, CrustResult<EventResolution>> {
        let world = self.clone();
        Box::pin(async move {
            debug!("Interpreting {} event", event.kind());
            match event {
                OverworldEvent::Stand {
                    who,
                    direction,
                    time,
                } => {
                    let who = required_who(who, "stand")?;
                    world.stand(who, direction, Duration::from_millis(time)).await?;
                    Ok(EventResolution::Done)
                }
                OverworldEvent::Walk {
                    who,
                    direction,
                    retry,
                } => {
                    let who = required_who(who, "walk")?;
                    world.walk(&who, direction, retry).await?;
                    Ok(EventResolution::Done)
                }
                OverworldEvent::Jump { who, time } => {
                    let who = required_who(who, "jump")?;
                    let airborne = time.map(Duration::from_millis).unwrap_or(JUMP_TIME);
                    world.jump(&who, airborne).await?;
                    Ok(EventResolution::Done)
                }
                OverworldEvent::Message {
                    text_lines,
                    face_hero,
                } => {
                    if let Some(who) = face_hero {
                        world.with_map(|map| -> CrustResult<()> {
                            let hero_direction = map.hero()?.direction;
                            map.actor_mut(&who)?.direction = hero_direction.opposite();
                            Ok(())
                        })??;
                    }
                    show_message(world.inner.presenter.as_ref(), &text_lines).await?;
                    Ok(EventResolution::Done)
                }
                OverworldEvent::ChangeMap {
                    map,
                    x,
                    y,
                    direction,
                } => {
                    world.inner.content.map(&map)?;
                    world.with_map(|current| current.unmount_all())?;
                    world.inner.presenter.fade_out().await;
                    let hero = match (x, y) {
                        (Some(x), Some(y)) => {
                            Some((Position::from_grid(x, y), direction.unwrap_or_default()))
                        }
                        _ => None,
                    };
                    world.start_map(&map, hero)?;
                    world.spawn_fade_in();
                    Ok(EventResolution::Done)
                }
                OverworldEvent::Battle { enemy_id, arena } => {
                    world.inner.presenter.fade_out().await;
                    let inner = &world.inner;
                    let battle = Battle::new(
                        &inner.content,
                        inner.presenter.as_ref(),
                        &inner.animations,
                        &inner.player,
                        &enemy_id,
                        arena,
                        world.next_seed(),
                    )?;
                    let did_win = battle.run().await?;
                    world.spawn_fade_in();
                    Ok(if did_win {
                        EventResolution::WonBattle
                    } else {
                        EventResolution::LostBattle
                    })
                }
                OverworldEvent::Pause => {
                    world.with_map(|map| map.is_paused = true)?;
                    let result = run_pause_menu(&world).await;
                    world.with_map(|map| map.is_paused = false)?;
                    result?;
                    Ok(EventResolution::Done)
                }
                OverworldEvent::AddStoryFlag { flag } => {
                    info!("Story flag set: {}", flag);
                    world.inner.player.add_story_flag(&flag);
                    Ok(EventResolution::Done)
                }
                OverworldEvent::CraftingMenu { pizzas } => {
                    let inner = &world.inner;
                    run_crafting_menu(inner.presenter.as_ref(), &inner.content, &inner.player, &pizzas)
                        .await?;
                    Ok(EventResolution::Done)
                }
            }
        })
    }

    async fn stand(&self, who: String, direction: Option<Direction>, time: Duration) -> CrustResult<()> {
        let mut rx = self.inner.signals.subscribe();
        self.with_map(|map| map.start_stand(&who, direction))??;

        let world = self.clone();
        let id = who.clone();
        tokio::spawn(async move {
            sleep(time).await;
            match world.with_map(|map| map.finish_stand(&id)) {
                Ok(Ok(())) => {}
                Ok(Err(err)) | Err(err) => debug!("Stand finished off-map: {}", err),
            }
            world.inner.signals.emit(ActorSignal::new(id, SignalKind::Standing));
        });

        wait_for(&mut rx, &who, SignalKind::Standing).await;
        Ok(())
    }

    async fn walk(&self, who: &str, direction: Direction, retry: bool) -> CrustResult<()> {
        loop {
            let attempt = self.with_map(|map| -> CrustResult<WalkAttempt> {
                let actor = map.actor(who)?;
                if actor.is_player_controlled
                    && !actor.is_moving()
                    && map.is_space_taken(actor.position, direction)
                {
                    map.actor_mut(who)?.direction = direction;
                    return Ok(WalkAttempt::Bumped);
                }
                match map.start_walk(who, direction)? {
                    // Subscribed under the lock so the completion cannot be missed.
                    WalkStart::Started(_) => Ok(WalkAttempt::Started(self.inner.signals.subscribe())),
                    WalkStart::Blocked | WalkStart::Busy => Ok(WalkAttempt::Waiting),
                }
            })??;

            match attempt {
                WalkAttempt::Bumped => return Ok(()),
                WalkAttempt::Started(mut rx) => {
                    wait_for(&mut rx, who, SignalKind::Walking).await;
                    return Ok(());
                }
                WalkAttempt::Waiting if retry => sleep(WALK_RETRY).await,
                WalkAttempt::Waiting => {
                    warn!("{} could not walk {}; skipping", who, direction.as_str());
                    return Ok(());
                }
            }
        }
    }

    async fn jump(&self, who: &str, airborne: Duration) -> CrustResult<()> {
        self.with_map(|map| -> CrustResult<()> {
            let hero_direction = map.hero()?.direction;
            map.actor_mut(who)?.direction = hero_direction.opposite();
            Ok(())
        })??;

        sleep(JUMP_LEAD_IN).await;
        self.with_map(|map| map.actor_mut(who).map(|actor| actor.jump_height += JUMP_HEIGHT))??;
        sleep(airborne).await;
        self.with_map(|map| map.actor_mut(who).map(|actor| actor.jump_height -= JUMP_HEIGHT))??;
        Ok(())
    }
}
