//! Battle tuning constants
//!
//! Every data-tuning number the engine uses lives here. A config travels
//! inside the content registry, so two battles built from different
//! content files never share tuning.

use serde::{Deserialize, Serialize};

use crate::combat::stat::GrowthCurve;

/// Configuration for the battle systems
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    // === MULTIPLIERS ===
    /// Generic "strong effect" multiplier
    ///
    /// Used for elemental weaknesses, Counter stance damage, Guard stance
    /// reduction and most status multipliers.
    pub bonus_multiplier: f64,

    /// Accuracy rate forced onto actions taken in Counter stance
    pub counter_accuracy_rate: f64,

    // === RANKS ===
    /// Rank assumed for a move whose rank is not yet known
    pub default_move_rank: u32,
    /// Rank of an item action that doesn't specify one
    pub default_item_rank: u32,
    /// Rank charged for switching into Guard stance
    pub stance_change_rank: u32,
    /// Rank charged to a guarding unit whose guard is broken
    pub guard_break_rank: u32,
    /// Rank charged to a unit brought back from death
    pub revive_rank: u32,
    /// Rank charged for swapping weapons mid-battle
    pub equip_weapon_rank: u32,

    // === TIMING ===
    /// Ticks per rank for a unit with an agility value of 1
    ///
    /// At the default (1000) a unit with 80 agility waits 12.5 ticks
    /// per rank.
    pub turn_time_scale: f64,

    // === DAMAGE & HEALING ===
    pub damage_scale: f64,
    pub heal_scale: f64,
    /// Width of the random variance band as a fraction of the rolled value
    pub damage_tolerance: f64,

    // === VITALS ===
    pub hp_per_vit: f64,
    pub hp_base: f64,
    pub mp_per_stat: f64,
    pub party_hp_cap: u32,
    pub party_mp_cap: u32,
    /// MP restored per cycle is the unit's stat average divided by this
    pub mp_regen_divisor: f64,

    // === GROWTH ===
    pub exp_scale: f64,
    pub growth: GrowthCurve,

    // === FORECAST ===
    /// Turns projected per unit
    pub forecast_turns: usize,
    /// Slots kept after sorting
    pub forecast_slots: usize,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            bonus_multiplier: 1.5,
            counter_accuracy_rate: 2.0,

            default_move_rank: 2,
            default_item_rank: 2,
            stance_change_rank: 2,
            guard_break_rank: 1,
            revive_rank: 3,
            equip_weapon_rank: 2,

            turn_time_scale: 1000.0,

            damage_scale: 20.0,
            heal_scale: 20.0,
            damage_tolerance: 0.1,

            hp_per_vit: 10.0,
            hp_base: 50.0,
            mp_per_stat: 10.0,
            party_hp_cap: 999,
            party_mp_cap: 9999,
            mp_regen_divisor: 10.0,

            exp_scale: 1.0,
            growth: GrowthCurve::default(),

            forecast_turns: 8,
            forecast_slots: 10,
        }
    }
}

impl BattleConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.bonus_multiplier <= 1.0 {
            return Err(format!(
                "bonus_multiplier ({}) must be greater than 1",
                self.bonus_multiplier
            ));
        }

        if !(0.0..1.0).contains(&self.damage_tolerance) {
            return Err(format!(
                "damage_tolerance ({}) must be in [0, 1)",
                self.damage_tolerance
            ));
        }

        // A zero rank here would let a unit act every tick forever
        let ranks = [
            ("default_move_rank", self.default_move_rank),
            ("default_item_rank", self.default_item_rank),
            ("stance_change_rank", self.stance_change_rank),
            ("guard_break_rank", self.guard_break_rank),
            ("revive_rank", self.revive_rank),
            ("equip_weapon_rank", self.equip_weapon_rank),
        ];
        for (name, rank) in ranks {
            if rank == 0 {
                return Err(format!("{} must be at least 1", name));
            }
        }

        if self.turn_time_scale <= 0.0 || self.damage_scale <= 0.0 || self.heal_scale <= 0.0 {
            return Err("Timing, damage and healing scales must be positive".into());
        }

        if self.mp_regen_divisor <= 0.0 {
            return Err("mp_regen_divisor must be positive".into());
        }

        if self.growth.exp_per_level <= 0.0 {
            return Err("growth.exp_per_level must be positive".into());
        }

        if self.forecast_slots == 0 {
            return Err("forecast_slots must be at least 1".into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(BattleConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_rank_rejected() {
        let config = BattleConfig {
            guard_break_rank: 0,
            ..BattleConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.contains("guard_break_rank"));
    }

    #[test]
    fn test_weak_bonus_multiplier_rejected() {
        let config = BattleConfig {
            bonus_multiplier: 1.0,
            ..BattleConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: BattleConfig = toml::from_str("bonus_multiplier = 2.0").unwrap();
        assert_eq!(config.bonus_multiplier, 2.0);
        assert_eq!(config.default_move_rank, 2);
    }
}
