//! # Turn Cycle
//!
//! Alternates turns between the two active combatants until one team has
//! nobody left standing.
//!
//! Each turn runs, in order: the caster's pre-events, the submission, the
//! action's events (possibly replaced by the caster's status), the death
//! check, the win check, a replacement prompt, the caster's post-events and
//! the status countdown. A swap submission ends the turn right after the swap.

use super::{
    BattleEvent, BattleEventKind, BattleEventRunner, BattleResolution, BattleState, Submission,
    Team,
};
use crate::{CrustError, CrustResult};
use log::{debug, info};
use rand::Rng;

/// How a single turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Play passes to the other team.
    Continue,
    /// The battle is over.
    Winner(Team),
}

/// Turn state machine for one battle.
#[derive(Debug, Clone)]
pub struct TurnCycle {
    pub current_team: Team,
    enemy_name: String,
}

impl TurnCycle {
    /// The player always moves first.
    pub fn new(enemy_name: &str) -> Self {
        Self {
            current_team: Team::Player,
            enemy_name: enemy_name.to_string(),
        }
    }

    /// Plays the intro and then turns until a winner is found.
    pub async fn run<R: Rng + Send + ?Sized>(
        &mut self,
        runner: &BattleEventRunner<'_>,
        state: &mut BattleState,
        rng: &mut R,
    ) -> CrustResult<Team> {
        let intro = format!("{} wants to throw down!", self.enemy_name);
        runner.interpret(&BattleEvent::text(&intro), state).await?;

        loop {
            if let TurnOutcome::Winner(team) = self.turn(runner, state, rng).await? {
                info!("{:?} team wins", team);
                return Ok(team);
            }
            self.next_team();
        }
    }

    pub fn next_team(&mut self) {
        self.current_team = self.current_team.opposite();
    }

    /// Resolves one full turn for the current team.
    pub async fn turn<R: Rng + Send + ?Sized>(
        &mut self,
        runner: &BattleEventRunner<'_>,
        state: &mut BattleState,
        rng: &mut R,
    ) -> CrustResult<TurnOutcome> {
        let caster = state.active_combatant(self.current_team)?.clone();
        let enemy_id = state
            .active_combatant(self.current_team.opposite())?
            .id
            .clone();
        debug!("{:?} turn: {}", self.current_team, caster.name);

        for kind in caster.pre_events() {
            let event = BattleEvent::new(kind).with_caster(&caster.id);
            runner.interpret(&event, state).await?;
        }

        let mut menu = BattleEvent::new(BattleEventKind::SubmissionMenu).with_caster(&caster.id);
        menu.enemy = Some(enemy_id);
        let submission = match runner.interpret(&menu, state).await? {
            BattleResolution::Submission(Some(submission)) => submission,
            _ => {
                debug!("{} made no submission", caster.name);
                return Ok(TurnOutcome::Continue);
            }
        };

        let (action_id, target_id, instance_id) = match &submission {
            Submission::Swap { replacement } => {
                let name = self.replace(runner, state, replacement).await?;
                self.say(runner, state, &format!("Go get 'em, {}!", name))
                    .await?;
                return Ok(TurnOutcome::Continue);
            }
            Submission::Attack {
                action,
                target,
                instance_id,
            } => (action.clone(), target.clone(), instance_id.clone()),
        };

        if let Some(instance_id) = &instance_id {
            state.consume_item(instance_id);
        }

        let template = runner.content.action(&action_id)?.success.clone();
        for kind in caster.replaced_events(template, rng) {
            let event = BattleEvent::from_template(kind, &caster.id, &submission);
            runner.interpret(&event, state).await?;
        }

        let target = state.combatant(&target_id)?.clone();
        let target_dead = !target.is_alive();
        if target_dead {
            self.say(runner, state, &format!("{} is ruined!", target.name))
                .await?;
            if target.team == Team::Enemy {
                let xp = target.gives_xp();
                let player_active = state.active_combatant(Team::Player)?.id.clone();
                self.say(runner, state, &format!("Gained {} XP!", xp)).await?;
                let give = BattleEvent::new(BattleEventKind::GiveXp {
                    xp,
                    combatant: player_active,
                });
                runner.interpret(&give, state).await?;
            }
        }

        if let Some(winner) = state.winning_team() {
            self.say(runner, state, "Winner!").await?;
            return Ok(TurnOutcome::Winner(winner));
        }

        if target_dead {
            let prompt = BattleEvent::new(BattleEventKind::ReplacementMenu { team: target.team });
            match runner.interpret(&prompt, state).await? {
                BattleResolution::Replacement(Some(replacement)) => {
                    let name = self.replace(runner, state, &replacement).await?;
                    self.say(runner, state, &format!("{} appears!", name)).await?;
                }
                _ => {
                    return Err(CrustError::InvalidState(format!(
                        "{:?} team has live combatants but chose no replacement",
                        target.team
                    )))
                }
            }
        }

        let caster_now = state.combatant(&caster.id)?.clone();
        for kind in caster_now.post_events() {
            let event = BattleEvent::from_template(kind, &caster.id, &submission);
            runner.interpret(&event, state).await?;
        }

        if let Some(expired) = state.combatant_mut(&caster.id)?.decrement_status() {
            let event = BattleEvent::new(expired).with_caster(&caster.id);
            runner.interpret(&event, state).await?;
        }

        Ok(TurnOutcome::Continue)
    }

    /// Puts `replacement` into its team's active slot and returns its name.
    async fn replace(
        &self,
        runner: &BattleEventRunner<'_>,
        state: &mut BattleState,
        replacement: &str,
    ) -> CrustResult<String> {
        let replace = BattleEvent::new(BattleEventKind::Replace {
            replacement: replacement.to_string(),
        });
        runner.interpret(&replace, state).await?;
        Ok(state.combatant(replacement)?.name.clone())
    }

    async fn say(
        &self,
        runner: &BattleEventRunner<'_>,
        state: &mut BattleState,
        text: &str,
    ) -> CrustResult<()> {
        runner.interpret(&BattleEvent::text(text), state).await?;
        Ok(())
    }
}
