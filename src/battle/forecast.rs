//! Turn order projection for the HUD and for AI lookahead

use serde::{Deserialize, Serialize};

use crate::battle::Battle;
use crate::core::types::UnitRef;

/// One projected turn slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnForecast {
    pub unit: UnitRef,
    pub turn_index: usize,
    pub remaining_time: u64,
    /// Enumeration order within the turn index; breaks time ties
    pub bias: usize,
}

impl Battle {
    /// Project the next turn slots without touching battle state
    ///
    /// `acting` is the unit whose move is being decided; its in-progress
    /// turn is left out and `next_ranks` are the ranks of actions it is
    /// about to queue.
    pub fn predict_turns(&self, acting: Option<UnitRef>, next_ranks: &[u32]) -> Vec<TurnForecast> {
        let config = self.content.config;
        let order = self.turn_order();

        let mut forecast = Vec::new();
        for turn_index in 0..config.forecast_turns {
            let mut bias = 0;
            for &unit in &order {
                if acting == Some(unit) && turn_index == 0 {
                    continue;
                }
                bias += 1;
                let pending = if acting == Some(unit) { next_ranks } else { &[] };
                let time = self.units[unit.0].time_until_turn(
                    &self.content,
                    turn_index,
                    config.default_move_rank,
                    pending,
                );
                if let Some(remaining_time) = time {
                    forecast.push(TurnForecast {
                        unit,
                        turn_index,
                        remaining_time,
                        bias,
                    });
                }
            }
        }
        forecast.sort_by_key(|f| (f.remaining_time, f.bias));
        forecast.truncate(config.forecast_slots);
        forecast
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::testing::battle_with;

    fn slot(forecast: &[TurnForecast], unit: UnitRef, turn_index: usize) -> &TurnForecast {
        forecast
            .iter()
            .find(|f| f.unit == unit && f.turn_index == turn_index)
            .expect("slot should be in the forecast")
    }

    #[test]
    fn test_forecast_leaves_battle_untouched() {
        let battle = battle_with("dummyFight");
        let scott = battle.player_units()[0];
        let before: Vec<_> = battle
            .turn_order()
            .into_iter()
            .map(|u| (battle.unit(u).cv, battle.unit(u).hp(), battle.unit_info(u)))
            .collect();

        let first = battle.predict_turns(Some(scott), &[1, 3]);
        let second = battle.predict_turns(Some(scott), &[1, 3]);
        assert_eq!(first, second);

        let after: Vec<_> = battle
            .turn_order()
            .into_iter()
            .map(|u| (battle.unit(u).cv, battle.unit(u).hp(), battle.unit_info(u)))
            .collect();
        assert_eq!(before, after);
        assert!(battle.unit(scott).action_queue.is_empty());
    }

    #[test]
    fn test_forecast_is_sorted_and_capped() {
        let battle = battle_with("dummyFight");
        let forecast = battle.predict_turns(None, &[]);
        assert_eq!(forecast.len(), battle.config().forecast_slots);
        assert!(forecast
            .windows(2)
            .all(|w| (w[0].remaining_time, w[0].bias) <= (w[1].remaining_time, w[1].bias)));
    }

    #[test]
    fn test_time_ties_go_to_roster_order() {
        let mut battle = battle_with("dummyFight");
        let scott = battle.player_units()[0];
        let dummy = battle.enemy_units()[0];
        battle.units[scott.0].cv = 50;
        battle.units[dummy.0].cv = 50;
        let forecast = battle.predict_turns(None, &[]);
        assert_eq!(forecast[0].unit, dummy);
        assert_eq!(forecast[1].unit, scott);
        assert_eq!(forecast[0].remaining_time, forecast[1].remaining_time);
    }

    #[test]
    fn test_acting_unit_skips_current_turn() {
        let battle = battle_with("dummyFight");
        let scott = battle.player_units()[0];
        let forecast = battle.predict_turns(Some(scott), &[]);
        assert!(!forecast.iter().any(|f| f.unit == scott && f.turn_index == 0));
        assert!(forecast.iter().any(|f| f.unit == scott && f.turn_index == 1));
    }

    #[test]
    fn test_pending_ranks_push_later_turns() {
        let battle = battle_with("dummyFight");
        let scott = battle.player_units()[0];
        let quick = battle.predict_turns(Some(scott), &[1]);
        let slow = battle.predict_turns(Some(scott), &[5]);
        assert!(slot(&quick, scott, 1).remaining_time < slot(&slow, scott, 1).remaining_time);

        let dummy = battle.enemy_units()[0];
        assert_eq!(
            slot(&quick, dummy, 0).remaining_time,
            slot(&slow, dummy, 0).remaining_time
        );
    }
}
