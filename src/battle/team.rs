//! Per-team icon strips shown along the top of the battle screen.

use super::{BattleState, CombatantId, Team};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamIcon {
    pub id: CombatantId,
    pub icon: String,
    pub alive: bool,
    pub active: bool,
}

/// One icon per combatant of a team, in roster order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamStrip {
    pub team: Team,
    pub icons: Vec<TeamIcon>,
}

impl TeamStrip {
    pub fn build(state: &BattleState, team: Team) -> Self {
        let icons = state
            .combatants
            .iter()
            .filter(|c| c.team == team)
            .map(|c| TeamIcon {
                id: c.id.clone(),
                icon: c.icon.clone(),
                alive: c.is_alive(),
                active: c.is_active(&state.active),
            })
            .collect();
        Self { team, icons }
    }

    pub fn alive_count(&self) -> usize {
        self.icons.iter().filter(|icon| icon.alive).count()
    }
}
