//! # Overworld Controller
//!
//! Owns the loaded map, the fixed-rate tick loop and input, and hands control
//! to cutscenes and battles when they are triggered.
//!
//! [`Overworld`] is a cheap, cloneable handle. Every task it spawns (the tick
//! loop, listeners, behavior loops and cutscenes) holds a clone. Map state
//! sits behind a mutex that is only ever locked between awaits.

mod cutscene;
mod event;
mod menus;
mod signals;

pub use event::{EventResolution, OverworldEvent};
pub use menus::{pause_menu, run_crafting_menu};
pub use signals::{wait_for, ActorSignal, SignalBus, SignalKind};

use crate::battle::AnimationRegistry;
use crate::config::{FRAME, MOUNT_GRACE};
use crate::content::Content;
use crate::game::{
    Actor, Direction, Notice, OverworldMap, PlayerState, PlayerStore, Position, Progress, HERO_ID,
};
use crate::input::{DirectionInput, Key, KeyAction, KeyPressListener};
use crate::rendering::{Hud, Presenter};
use crate::{CrustError, CrustResult};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, MissedTickBehavior};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// How an overworld session starts.
#[derive(Debug, Clone)]
pub struct OverworldOptions {
    pub start_map: String,
    /// Hero placement overriding the map's own, in pixels.
    pub hero: Option<(Position, Direction)>,
    pub seed: u64,
    pub save_file: Option<PathBuf>,
    /// Load the save file, if it exists, instead of starting fresh.
    pub resume: bool,
    pub player: PlayerState,
    /// Cutscene played right after the first map loads.
    pub intro: Vec<OverworldEvent>,
}

impl OverworldOptions {
    pub fn new(start_map: impl Into<String>) -> Self {
        Self {
            start_map: start_map.into(),
            hero: None,
            seed: 0,
            save_file: None,
            resume: false,
            player: PlayerState::starter(),
            intro: Vec::new(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_hero(mut self, position: Position, direction: Direction) -> Self {
        self.hero = Some((position, direction));
        self
    }

    pub fn with_save_file(mut self, path: impl Into<PathBuf>, resume: bool) -> Self {
        self.save_file = Some(path.into());
        self.resume = resume;
        self
    }

    pub fn with_player(mut self, player: PlayerState) -> Self {
        self.player = player;
        self
    }

    pub fn with_intro(mut self, intro: Vec<OverworldEvent>) -> Self {
        self.intro = intro;
        self
    }
}

/// Mutable world state shared by the tick loop and script steps.
#[derive(Debug, Default)]
pub(crate) struct WorldState {
    pub(crate) map: Option<OverworldMap>,
    /// Bumped on every map load; loops from older maps exit.
    pub(crate) epoch: u64,
    input: DirectionInput,
    keys: KeyPressListener,
}

pub(crate) struct Inner {
    world: Mutex<WorldState>,
    pub(crate) signals: SignalBus,
    pub(crate) presenter: Arc<dyn Presenter>,
    pub(crate) content: Arc<Content>,
    pub(crate) player: PlayerStore,
    pub(crate) animations: AnimationRegistry,
    rng: Mutex<StdRng>,
    pub(crate) save_file: Option<PathBuf>,
    hud: Mutex<Hud>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    start: (String, Option<(Position, Direction)>),
    intro: Vec<OverworldEvent>,
}

/// Handle to a running overworld.
#[derive(Clone)]
pub struct Overworld {
    pub(crate) inner: Arc<Inner>,
}

impl std::fmt::Debug for Overworld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Overworld")
            .field("map", &self.map_id())
            .field("save_file", &self.inner.save_file)
            .finish()
    }
}

impl Overworld {
    /// Validates content and prepares the session. Nothing runs until
    /// [`Overworld::init`].
    pub fn new(
        content: Arc<Content>,
        presenter: Arc<dyn Presenter>,
        options: OverworldOptions,
    ) -> CrustResult<Self> {
        content.validate()?;

        let mut start = (options.start_map, options.hero);
        let mut player_state = options.player;
        if let (true, Some(path)) = (options.resume, options.save_file.as_deref()) {
            match Progress::load_optional(path)? {
                Some(progress) => {
                    info!("Resuming from {}", path.display());
                    start = (
                        progress.map_id.clone(),
                        Some((progress.hero_position(), progress.start_direction)),
                    );
                    player_state = progress.player_state;
                }
                None => info!("No save at {}; starting fresh", path.display()),
            }
        }
        content.map(&start.0)?;

        let hud = Hud::build(&player_state, &content)?;
        Ok(Self {
            inner: Arc::new(Inner {
                world: Mutex::new(WorldState::default()),
                signals: SignalBus::new(),
                presenter,
                content,
                player: PlayerStore::new(player_state),
                animations: AnimationRegistry::builtin(),
                rng: Mutex::new(StdRng::seed_from_u64(options.seed)),
                save_file: options.save_file,
                hud: Mutex::new(hud),
                tasks: Mutex::new(Vec::new()),
                start,
                intro: options.intro,
            }),
        })
    }

    /// Loads the starting map and spawns the tick loop and listeners.
    pub fn init(&self) -> CrustResult<()> {
        let (map_id, hero) = self.inner.start.clone();
        self.start_map(&map_id, hero)?;
        self.inner.presenter.hud_updated(&self.hud());

        let world = self.clone();
        self.track(tokio::spawn(async move {
            let mut ticks = interval(FRAME);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticks.tick().await;
                world.step();
            }
        }));

        let mut signals = self.inner.signals.subscribe();
        let world = self.clone();
        self.track(tokio::spawn(async move {
            loop {
                match signals.recv().await {
                    Ok(signal) if signal.who == HERO_ID && signal.kind == SignalKind::Walking => {
                        world.check_for_footstep_cutscene();
                    }
                    Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                    Err(broadcast::error::RecvError::Closed) => return,
                }
            }
        }));

        let mut notices = self.inner.player.subscribe();
        let world = self.clone();
        self.track(tokio::spawn(async move {
            loop {
                match notices.recv().await {
                    Ok(notice) => world.update_hud(notice),
                    Err(broadcast::error::RecvError::Lagged(_)) => world.update_hud(Notice::LineupChanged),
                    Err(broadcast::error::RecvError::Closed) => return,
                }
            }
        }));

        if !self.inner.intro.is_empty() {
            self.with_map(|map| map.is_cutscene_playing = true)?;
            self.spawn_cutscene(self.inner.intro.clone());
        }
        info!("Overworld started on {}", map_id);
        Ok(())
    }

    /// Replaces the loaded map, mounting its actors and optionally placing
    /// the hero. Behavior loops start after a short grace delay. The
    /// cutscene flag carries over from the map being replaced.
    pub fn start_map(&self, map_id: &str, hero: Option<(Position, Direction)>) -> CrustResult<()> {
        let config = self.inner.content.map(map_id)?;
        let mut map = OverworldMap::from_config(config);
        let with_behavior = map.mount_objects();
        if let Some((position, direction)) = hero {
            map.place_hero(position, direction)?;
        }

        let epoch = {
            let mut world = self.lock_world();
            // A cutscene that changes maps keeps ownership of the new one.
            map.is_cutscene_playing = world.map.as_ref().is_some_and(|old| old.is_cutscene_playing);
            world.epoch += 1;
            world.map = Some(map);
            world.epoch
        };
        info!("Map {} loaded", map_id);

        for who in with_behavior {
            let world = self.clone();
            self.track(tokio::spawn(async move {
                sleep(MOUNT_GRACE).await;
                world.behavior_loop(who, epoch, 0).await;
            }));
        }
        Ok(())
    }

    /// Advances the simulation one tick and hands the frame to the presenter.
    pub fn step(&self) {
        let flags = self.inner.player.story_flags();
        let (signals, views) = {
            let mut guard = self.lock_world();
            let state = &mut *guard;
            let arrow = state.input.direction();
            let Some(map) = state.map.as_mut() else {
                return;
            };
            if map.is_paused {
                return;
            }
            let signals = map.update(arrow);
            (signals, map.actor_views(&flags))
        };

        for signal in signals {
            self.inner.signals.emit(signal);
        }
        self.inner.presenter.frame(&views);
    }

    pub fn press_key(&self, key: Key) {
        let action = {
            let mut world = self.lock_world();
            world.input.press(key);
            world.keys.press(key)
        };
        match action {
            Some(KeyAction::Confirm) => self.check_for_action_cutscene(),
            Some(KeyAction::Cancel) => self.open_pause_menu(),
            None => {}
        }
    }

    pub fn release_key(&self, key: Key) {
        let mut world = self.lock_world();
        world.input.release(key);
        world.keys.release(key);
    }

    /// Starts the talk script of the actor the hero faces, if any.
    pub fn check_for_action_cutscene(&self) {
        let flags = self.inner.player.story_flags();
        let events = self.with_map(|map| {
            let events = map.talk_scenario(&flags)?;
            map.is_cutscene_playing = true;
            Some(events)
        });
        if let Ok(Some(events)) = events {
            self.spawn_cutscene(events);
        }
    }

    /// Starts the cutscene bound to the hero's tile, if any.
    pub fn check_for_footstep_cutscene(&self) {
        let flags = self.inner.player.story_flags();
        let events = self.with_map(|map| {
            let events = map.footstep_scenario(&flags)?;
            map.is_cutscene_playing = true;
            Some(events)
        });
        if let Ok(Some(events)) = events {
            debug!("Footstep cutscene triggered");
            self.spawn_cutscene(events);
        }
    }

    fn open_pause_menu(&self) {
        let started = self.with_map(|map| {
            if map.is_cutscene_playing {
                return false;
            }
            map.is_cutscene_playing = true;
            true
        });
        if let Ok(true) = started {
            self.spawn_cutscene(vec![OverworldEvent::Pause]);
        }
    }

    fn update_hud(&self, notice: Notice) {
        let player = self.inner.player.snapshot();
        let hud = {
            let mut hud = lock(&self.inner.hud);
            match notice {
                Notice::LineupChanged => {
                    if let Err(err) = hud.rebuild(&player, &self.inner.content) {
                        warn!("HUD rebuild failed: {}", err);
                    }
                }
                Notice::PlayerStateUpdated => hud.refresh(&player),
            }
            hud.clone()
        };
        self.inner.presenter.hud_updated(&hud);
    }

    /// Stops every task this overworld spawned.
    pub fn shutdown(&self) {
        let tasks: Vec<JoinHandle<()>> = lock(&self.inner.tasks).drain(..).collect();
        for task in &tasks {
            task.abort();
        }
        info!("Overworld stopped ({} tasks)", tasks.len());
    }

    /// Runs `f` against the loaded map.
    pub fn with_map<R>(&self, f: impl FnOnce(&mut OverworldMap) -> R) -> CrustResult<R> {
        let mut world = self.lock_world();
        let map = world
            .map
            .as_mut()
            .ok_or_else(|| CrustError::InvalidState("No map is loaded".to_string()))?;
        Ok(f(map))
    }

    pub fn map_id(&self) -> Option<String> {
        self.lock_world().map.as_ref().map(|map| map.id.clone())
    }

    /// Snapshot of one actor on the loaded map.
    pub fn actor(&self, id: &str) -> CrustResult<Actor> {
        self.with_map(|map| map.actor(id).cloned())?
    }

    pub fn is_cutscene_playing(&self) -> bool {
        self.with_map(|map| map.is_cutscene_playing).unwrap_or(false)
    }

    pub fn player(&self) -> &PlayerStore {
        &self.inner.player
    }

    pub fn content(&self) -> &Content {
        &self.inner.content
    }

    pub fn signals(&self) -> &SignalBus {
        &self.inner.signals
    }

    pub fn hud(&self) -> Hud {
        lock(&self.inner.hud).clone()
    }

    pub(crate) fn lock_world(&self) -> MutexGuard<'_, WorldState> {
        lock(&self.inner.world)
    }

    pub(crate) fn track(&self, task: JoinHandle<()>) {
        let mut tasks = lock(&self.inner.tasks);
        tasks.retain(|task| !task.is_finished());
        tasks.push(task);
    }

    pub(crate) fn next_seed(&self) -> u64 {
        lock(&self.inner.rng).gen()
    }

    pub(crate) fn spawn_fade_in(&self) {
        let presenter = Arc::clone(&self.inner.presenter);
        tokio::spawn(async move { presenter.fade_in().await });
    }
}
