//! Overworld HUD: a scoreboard per lineup pizza.

use crate::battle::StatusKind;
use crate::content::Content;
use crate::game::PlayerState;
use crate::CrustResult;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scoreboard {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub level: u32,
    pub hp_percentage: f64,
    pub xp_percentage: f64,
    pub status: Option<StatusKind>,
}

/// Scoreboards for the player's lineup, in lineup order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Hud {
    pub scoreboards: Vec<Scoreboard>,
}

fn percentage(value: f64, max: f64) -> f64 {
    if max <= 0.0 {
        return 0.0;
    }
    (value / max * 100.0).clamp(0.0, 100.0)
}

impl Hud {
    /// Builds one scoreboard per lineup pizza.
    pub fn build(player: &PlayerState, content: &Content) -> CrustResult<Self> {
        let mut hud = Self::default();
        hud.rebuild(player, content)?;
        Ok(hud)
    }

    /// Recreates every scoreboard; used when the lineup changes.
    pub fn rebuild(&mut self, player: &PlayerState, content: &Content) -> CrustResult<()> {
        let mut scoreboards = Vec::with_capacity(player.lineup.len());
        for id in &player.lineup {
            let Some(record) = player.pizzas.get(id) else {
                continue;
            };
            let def = content.pizza(&record.pizza_id)?;
            scoreboards.push(Scoreboard {
                id: id.clone(),
                name: def.name.clone(),
                icon: def.icon.clone(),
                level: 0,
                hp_percentage: 0.0,
                xp_percentage: 0.0,
                status: None,
            });
        }
        self.scoreboards = scoreboards;
        self.refresh(player);
        Ok(())
    }

    /// Updates the numbers on existing scoreboards.
    pub fn refresh(&mut self, player: &PlayerState) {
        for board in &mut self.scoreboards {
            if let Some(record) = player.pizzas.get(&board.id) {
                board.level = record.level;
                board.hp_percentage = percentage(record.hp as f64, record.max_hp as f64);
                board.xp_percentage = percentage(record.xp as f64, record.max_xp as f64);
                board.status = record.status.map(|s| s.kind);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hud_tracks_lineup() -> CrustResult<()> {
        let content = Content::demo();
        let mut player = PlayerState::starter();
        let mut hud = Hud::build(&player, &content)?;
        assert_eq!(hud.scoreboards.len(), 2);
        assert_eq!(hud.scoreboards[0].name, "Slice Samurai");
        assert_eq!(hud.scoreboards[0].hp_percentage, 60.0);
        assert_eq!(hud.scoreboards[0].status, Some(StatusKind::Saucy));

        if let Some(p1) = player.pizzas.get_mut("p1") {
            p1.hp = 50;
        }
        hud.refresh(&player);
        assert_eq!(hud.scoreboards[0].hp_percentage, 100.0);

        player.move_to_front("p2")?;
        hud.rebuild(&player, &content)?;
        assert_eq!(hud.scoreboards[0].id, "p2");
        Ok(())
    }
}
