//! Cutscene runner and idle behavior loops.

use super::event::{EventResolution, OverworldEvent};
use super::Overworld;
use crate::config::CUTSCENE_BACKOFF;
use crate::game::ActorId;
use crate::{BoxFuture, CrustResult};
use log::{debug, error, info, warn};
use tokio::time::sleep;

enum LoopStep {
    Exit,
    Wait,
    Run(OverworldEvent, usize),
}

impl Overworld {
    /// Runs `events` strictly in order while the map-wide cutscene flag is
    /// set, then restarts every idle behavior loop from its first step.
    ///
    /// A lost battle skips the remaining events. Callers must check that no
    /// cutscene is playing before starting one.
    pub async fn start_cutscene(&self, events: Vec<OverworldEvent>) -> CrustResult<()> {
        self.with_map(|map| map.is_cutscene_playing = true)?;
        debug!("Cutscene started with {} events", events.len());

        let result = self.run_events(events).await;

        if let Err(err) = self.with_map(|map| map.is_cutscene_playing = false) {
            warn!("Could not clear cutscene flag: {}", err);
        }
        self.restart_behavior_loops();
        result
    }

    async fn run_events(&self, events: Vec<OverworldEvent>) -> CrustResult<()> {
        for event in events {
            if self.interpret(event).await? == EventResolution::LostBattle {
                info!("Battle lost; skipping the rest of the cutscene");
                break;
            }
        }
        Ok(())
    }

    /// Runs a cutscene on its own task, logging any failure.
    pub fn spawn_cutscene(&self, events: Vec<OverworldEvent>) {
        let world = self.clone();
        self.track(tokio::spawn(async move {
            if let Err(err) = world.start_cutscene(events).await {
                error!("Cutscene failed: {}", err);
            }
        }));
    }

    /// Resets every mounted actor's loop to its first step and spawns a
    /// fresh loop task; older loops see the new generation and exit.
    pub(crate) fn restart_behavior_loops(&self) {
        let (epoch, loops) = {
            let mut world = self.lock_world();
            let epoch = world.epoch;
            let Some(map) = world.map.as_mut() else {
                return;
            };
            let loops: Vec<(ActorId, u64)> = map
                .actors
                .iter_mut()
                .filter(|actor| actor.is_mounted && actor.has_behavior())
                .map(|actor| {
                    actor.behavior_loop_index = 0;
                    actor.behavior_generation += 1;
                    (actor.id.clone(), actor.behavior_generation)
                })
                .collect();
            (epoch, loops)
        };

        for (who, generation) in loops {
            self.track(tokio::spawn(self.behavior_loop(who, epoch, generation)));
        }
    }

    fn next_behavior_step(&self, who: &str, epoch: u64, generation: u64) -> LoopStep {
        let mut guard = self.lock_world();
        let state = &mut *guard;
        if state.epoch != epoch {
            return LoopStep::Exit;
        }
        let Some(map) = state.map.as_mut() else {
            return LoopStep::Exit;
        };
        let cutscene = map.is_cutscene_playing;
        let Ok(actor) = map.actor_mut(who) else {
            return LoopStep::Exit;
        };
        if !actor.is_mounted || actor.behavior_generation != generation || actor.behavior_loop.is_empty() {
            return LoopStep::Exit;
        }
        if cutscene {
            return LoopStep::Wait;
        }
        let index = actor.behavior_loop_index % actor.behavior_loop.len();
        let mut event = actor.behavior_loop[index].clone();
        event.fill_who(who);
        LoopStep::Run(event, index)
    }

    fn advance_behavior_loop(&self, who: &str, epoch: u64, generation: u64, index: usize) {
        let mut guard = self.lock_world();
        let state = &mut *guard;
        if state.epoch != epoch {
            return;
        }
        if let Some(actor) = state.map.as_mut().and_then(|map| map.actor_mut(who).ok()) {
            if actor.behavior_generation == generation && !actor.behavior_loop.is_empty() {
                actor.behavior_loop_index = (index + 1) % actor.behavior_loop.len();
            }
        }
    }

    /// Plays an actor's idle behavior forever, one step at a time.
    ///
    /// Exits once the map changes, the actor unmounts or a newer loop for
    /// the same actor starts. Backs off while a cutscene owns the map.
    pub(crate) fn behavior_loop(&self, who: ActorId, epoch: u64, generation: u64) -> BoxFuture<'static, ()> {
        let world = self.clone();
        Box::pin(async move {
            loop {
                let step = world.next_behavior_step(&who, epoch, generation);
                match step {
                    LoopStep::Exit => {
                        debug!("Behavior loop for {} exited", who);
                        return;
                    }
                    LoopStep::Wait => sleep(CUTSCENE_BACKOFF).await,
                    LoopStep::Run(event, index) => {
                        if let Err(err) = world.interpret(event).await {
                            error!("Behavior loop for {} stopped: {}", who, err);
                            return;
                        }
                        world.advance_behavior_loop(&who, epoch, generation, index);
                    }
                }
            }
        })
    }
}
