//! # Battle Events
//!
//! The closed set of battle instructions and the interpreter that runs one of
//! them to completion.
//!
//! Every call to [`BattleEventRunner::interpret`] finishes exactly once, with a
//! [`BattleResolution`], on every branch. Branches that have nothing to do
//! (a menu with no caster, an animation with no name) finish immediately.

use super::menus::{choose_replacement, choose_submission};
use super::{AnimationRegistry, BattleState, CombatantId, Status, StatusKind, Team};
use crate::config::{BLINK, FRAME, SWAP_PACING};
use crate::content::{Content, TargetType};
use crate::game::{Speed, TextLine};
use crate::rendering::{show_message, Presenter};
use crate::CrustResult;
use log::{debug, warn};
use serde::{Deserialize, Deserializer, Serialize};
use tokio::time::sleep;

/// Distinguishes an absent field from an explicit `null`.
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// One battle instruction, as authored in action templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BattleEventKind {
    /// Show text; `{CASTER}`, `{TARGET}` and `{ACTION}` are substituted.
    #[serde(rename_all = "camelCase")]
    Message { text_lines: Vec<TextLine> },
    /// Apply damage, healing or a status change.
    #[serde(rename_all = "camelCase")]
    StateChange {
        #[serde(default)]
        damage: i32,
        #[serde(default)]
        recover: i32,
        /// `None` leaves the status alone, `Some(None)` clears it.
        #[serde(
            default,
            deserialize_with = "deserialize_some",
            skip_serializing_if = "Option::is_none"
        )]
        status: Option<Option<Status>>,
        #[serde(default)]
        on_caster: bool,
    },
    /// Ask the caster's controller for a submission.
    SubmissionMenu,
    /// Ask a team to pick a live replacement.
    ReplacementMenu { team: Team },
    /// Put `replacement` into its team's active slot.
    Replace { replacement: CombatantId },
    /// Fill a combatant's XP bar one point per frame.
    GiveXp { xp: u32, combatant: CombatantId },
    /// Run a named animation effect.
    Animation {
        #[serde(default)]
        animation: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        color: Option<String>,
    },
}

impl BattleEventKind {
    /// A single fast line of text.
    pub fn text(text: &str) -> Self {
        BattleEventKind::Message {
            text_lines: vec![TextLine::new(text, Speed::Fast)],
        }
    }

    pub fn damage(damage: i32) -> Self {
        BattleEventKind::StateChange {
            damage,
            recover: 0,
            status: None,
            on_caster: false,
        }
    }

    pub fn recover(recover: i32) -> Self {
        BattleEventKind::StateChange {
            damage: 0,
            recover,
            status: None,
            on_caster: false,
        }
    }

    pub fn set_status(kind: StatusKind, expires_in: u32) -> Self {
        BattleEventKind::StateChange {
            damage: 0,
            recover: 0,
            status: Some(Some(Status::new(kind, expires_in))),
            on_caster: false,
        }
    }

    pub fn clear_status() -> Self {
        BattleEventKind::StateChange {
            damage: 0,
            recover: 0,
            status: Some(None),
            on_caster: false,
        }
    }

    pub fn animation(name: &str) -> Self {
        BattleEventKind::Animation {
            animation: Some(name.to_string()),
            color: None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BattleEventKind::Message { .. } => "message",
            BattleEventKind::StateChange { .. } => "stateChange",
            BattleEventKind::SubmissionMenu => "submissionMenu",
            BattleEventKind::ReplacementMenu { .. } => "replacementMenu",
            BattleEventKind::Replace { .. } => "replace",
            BattleEventKind::GiveXp { .. } => "giveXp",
            BattleEventKind::Animation { .. } => "animation",
        }
    }
}

/// A turn's choice: an action on a target, or a swap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Submission {
    #[serde(rename_all = "camelCase")]
    Swap { replacement: CombatantId },
    #[serde(rename_all = "camelCase")]
    Attack {
        action: String,
        target: CombatantId,
        #[serde(default)]
        instance_id: Option<String>,
    },
}

/// An event bound to the combatants it concerns.
#[derive(Debug, Clone, PartialEq)]
pub struct BattleEvent {
    pub kind: BattleEventKind,
    pub caster: Option<CombatantId>,
    pub target: Option<CombatantId>,
    /// Opposing active combatant, for submission menus.
    pub enemy: Option<CombatantId>,
    /// Action id the event was templated from.
    pub action: Option<String>,
    pub submission: Option<Submission>,
}

impl BattleEvent {
    /// An event with no combatant context.
    pub fn new(kind: BattleEventKind) -> Self {
        Self {
            kind,
            caster: None,
            target: None,
            enemy: None,
            action: None,
            submission: None,
        }
    }

    pub fn text(text: &str) -> Self {
        Self::new(BattleEventKind::text(text))
    }

    pub fn with_caster(mut self, caster: &str) -> Self {
        self.caster = Some(caster.to_string());
        self
    }

    pub fn with_target(mut self, target: &str) -> Self {
        self.target = Some(target.to_string());
        self
    }

    /// Clones a template event and binds it to a submission.
    pub fn from_template(kind: BattleEventKind, caster: &str, submission: &Submission) -> Self {
        let mut event = Self::new(kind).with_caster(caster);
        if let Submission::Attack { action, target, .. } = submission {
            event.action = Some(action.clone());
            event.target = Some(target.clone());
        }
        event.submission = Some(submission.clone());
        event
    }
}

/// What an interpreted battle event produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BattleResolution {
    Done,
    Submission(Option<Submission>),
    Replacement(Option<CombatantId>),
}

/// Level-scaled damage: base plus a tenth of base per caster level, floored.
pub fn scaled_damage(damage: i32, caster_level: u32) -> i32 {
    damage + (damage * caster_level as i32).div_euclid(10)
}

/// Runs battle events against a battle's state.
pub struct BattleEventRunner<'a> {
    pub content: &'a Content,
    pub presenter: &'a dyn Presenter,
    pub animations: &'a AnimationRegistry,
}

impl<'a> BattleEventRunner<'a> {
    pub fn new(
        content: &'a Content,
        presenter: &'a dyn Presenter,
        animations: &'a AnimationRegistry,
    ) -> Self {
        Self {
            content,
            presenter,
            animations,
        }
    }

    /// Executes one event and returns once its visible effect is over.
    pub async fn interpret(
        &self,
        event: &BattleEvent,
        state: &mut BattleState,
    ) -> CrustResult<BattleResolution> {
        debug!("Battle event: {}", event.kind.name());
        match &event.kind {
            BattleEventKind::Message { text_lines } => {
                self.message(event, text_lines, state).await?;
                Ok(BattleResolution::Done)
            }
            BattleEventKind::StateChange {
                damage,
                recover,
                status,
                on_caster,
            } => {
                self.state_change(event, *damage, *recover, *status, *on_caster, state)
                    .await?;
                Ok(BattleResolution::Done)
            }
            BattleEventKind::SubmissionMenu => self.submission_menu(event, state).await,
            BattleEventKind::ReplacementMenu { team } => self.replacement_menu(*team, state).await,
            BattleEventKind::Replace { replacement } => {
                self.replace(replacement, state).await?;
                Ok(BattleResolution::Done)
            }
            BattleEventKind::GiveXp { xp, combatant } => {
                self.give_xp(*xp, combatant, state).await;
                Ok(BattleResolution::Done)
            }
            BattleEventKind::Animation { animation, .. } => {
                if let Some(name) = animation {
                    self.animations.play(name, event, self.presenter).await?;
                }
                Ok(BattleResolution::Done)
            }
        }
    }

    async fn message(
        &self,
        event: &BattleEvent,
        text_lines: &[TextLine],
        state: &BattleState,
    ) -> CrustResult<()> {
        let name_of = |id: &Option<CombatantId>| {
            id.as_deref()
                .and_then(|id| state.get(id))
                .map(|c| c.name.clone())
                .unwrap_or_default()
        };
        let caster = name_of(&event.caster);
        let target = name_of(&event.target);
        let action = event
            .action
            .as_deref()
            .and_then(|id| self.content.actions.get(id))
            .map(|action| action.name.clone())
            .unwrap_or_default();

        let lines: Vec<TextLine> = text_lines
            .iter()
            .map(|line| line.substitute(&caster, &target, &action))
            .collect();
        show_message(self.presenter, &lines).await
    }

    async fn state_change(
        &self,
        event: &BattleEvent,
        damage: i32,
        recover: i32,
        status: Option<Option<Status>>,
        on_caster: bool,
        state: &mut BattleState,
    ) -> CrustResult<()> {
        let who_id = if on_caster {
            event.caster.clone()
        } else {
            event.target.clone()
        };
        let Some(who_id) = who_id else {
            warn!("stateChange with no combatant to apply to");
            return Ok(());
        };
        let caster_level = event
            .caster
            .as_deref()
            .and_then(|id| state.get(id))
            .map(|c| c.level)
            .unwrap_or(0);

        let who = state.combatant_mut(&who_id)?;
        if damage != 0 && !who.has_status(StatusKind::Protected) {
            let applied = scaled_damage(damage, caster_level);
            who.hp -= applied;
            debug!("{} takes {} damage", who.name, applied);
        }
        if recover != 0 {
            who.hp = (who.hp + recover).min(who.max_hp);
        }
        if let Some(status) = status {
            who.status = status;
        }

        self.presenter.set_blinking(&who_id, true);
        sleep(BLINK).await;
        self.presenter.set_blinking(&who_id, false);
        self.presenter.battle_refreshed(&state.view());
        Ok(())
    }

    async fn submission_menu(
        &self,
        event: &BattleEvent,
        state: &BattleState,
    ) -> CrustResult<BattleResolution> {
        let (Some(caster_id), Some(enemy_id)) = (&event.caster, &event.enemy) else {
            return Ok(BattleResolution::Submission(None));
        };
        let caster = state.combatant(caster_id)?;
        let enemy = state.combatant(enemy_id)?;

        if !caster.is_player_controlled {
            return Ok(BattleResolution::Submission(self.decide(caster, enemy)?));
        }
        let submission = choose_submission(self.presenter, self.content, state, caster, enemy).await?;
        Ok(BattleResolution::Submission(submission))
    }

    /// AI choice: the first learned action against its default target.
    fn decide(
        &self,
        caster: &super::Combatant,
        enemy: &super::Combatant,
    ) -> CrustResult<Option<Submission>> {
        let Some(action_id) = caster.actions.first() else {
            return Ok(None);
        };
        let action = self.content.action(action_id)?;
        let target = match action.target_type {
            TargetType::Friendly => caster.id.clone(),
            TargetType::Enemy => enemy.id.clone(),
        };
        Ok(Some(Submission::Attack {
            action: action_id.clone(),
            target,
            instance_id: None,
        }))
    }

    async fn replacement_menu(
        &self,
        team: Team,
        state: &BattleState,
    ) -> CrustResult<BattleResolution> {
        let candidates: Vec<&super::Combatant> = state.alive_on_team(team).collect();
        let Some(first) = candidates.first() else {
            return Ok(BattleResolution::Replacement(None));
        };
        if !first.is_player_controlled {
            return Ok(BattleResolution::Replacement(Some(first.id.clone())));
        }
        let choice = choose_replacement(self.presenter, &candidates).await;
        Ok(BattleResolution::Replacement(choice))
    }

    async fn replace(&self, replacement: &str, state: &mut BattleState) -> CrustResult<()> {
        let team = state.combatant(replacement)?.team;
        state.active.set(team, None);
        self.presenter.battle_refreshed(&state.view());
        sleep(SWAP_PACING).await;

        state.active.set(team, Some(replacement.to_string()));
        sleep(SWAP_PACING).await;
        self.presenter.battle_refreshed(&state.view());
        Ok(())
    }

    async fn give_xp(&self, xp: u32, combatant: &str, state: &mut BattleState) {
        for _ in 0..xp {
            let Some(who) = state.get_mut(combatant) else {
                break;
            };
            if who.add_xp_unit() {
                debug!("{} reached level {}", who.name, who.level);
            }
            self.presenter.battle_refreshed(&state.view());
            sleep(FRAME).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaled_damage() {
        assert_eq!(scaled_damage(10, 1), 11);
        assert_eq!(scaled_damage(10, 3), 13);
        assert_eq!(scaled_damage(5, 1), 5);
        assert_eq!(scaled_damage(10, 0), 10);
    }

    #[test]
    fn test_status_null_vs_absent() {
        let cleared: BattleEventKind =
            serde_json::from_str(r#"{"type":"stateChange","status":null}"#).unwrap();
        assert_eq!(cleared, BattleEventKind::clear_status());

        let untouched: BattleEventKind =
            serde_json::from_str(r#"{"type":"stateChange","recover":10}"#).unwrap();
        assert_eq!(untouched, BattleEventKind::recover(10));

        let set: BattleEventKind = serde_json::from_str(
            r#"{"type":"stateChange","status":{"type":"clumsy","expiresIn":3}}"#,
        )
        .unwrap();
        assert_eq!(set, BattleEventKind::set_status(StatusKind::Clumsy, 3));
    }

    #[test]
    fn test_submission_shapes() {
        let swap: Submission = serde_json::from_str(r#"{"replacement":"p2"}"#).unwrap();
        assert_eq!(
            swap,
            Submission::Swap {
                replacement: "p2".to_string()
            }
        );
        let attack: Submission =
            serde_json::from_str(r#"{"action":"item_recoverHp","target":"p1","instanceId":"item1"}"#)
                .unwrap();
        assert!(matches!(attack, Submission::Attack { instance_id: Some(_), .. }));
    }

    #[test]
    fn test_template_binding() {
        let submission = Submission::Attack {
            action: "damage1".to_string(),
            target: "e_a".to_string(),
            instance_id: None,
        };
        let event = BattleEvent::from_template(BattleEventKind::damage(10), "p1", &submission);
        assert_eq!(event.caster.as_deref(), Some("p1"));
        assert_eq!(event.target.as_deref(), Some("e_a"));
        assert_eq!(event.action.as_deref(), Some("damage1"));
    }
}
