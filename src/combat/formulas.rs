//! Battle math
//!
//! The shapes are fixed here; every constant comes from `BattleConfig`.

use crate::combat::info::BattlerInfo;
use crate::combat::stat::stat_value;
use crate::content::action::{AccuracyType, DamageType};
use crate::core::config::BattleConfig;
use crate::core::types::StatId;

pub fn max_hp(config: &BattleConfig, vit_value: u32, tier: u32) -> u32 {
    let hp = (vit_value as f64 * config.hp_per_vit + config.hp_base) * tier.max(1) as f64;
    hp.round().max(1.0) as u32
}

pub fn mp_capacity(config: &BattleConfig, mag_value: u32, foc_value: u32) -> u32 {
    ((mag_value + foc_value) as f64 / 2.0 * config.mp_per_stat).round() as u32
}

/// Ticks until the next turn for an action of the given rank
///
/// Higher agility means fewer ticks per rank.
pub fn time_until_next_turn(config: &BattleConfig, agility: u32, rank: u32) -> f64 {
    rank as f64 * config.turn_time_scale / agility.max(1) as f64
}

fn attack_stat(damage_type: DamageType) -> StatId {
    match damage_type {
        DamageType::Physical | DamageType::Sword => StatId::Str,
        DamageType::Bow => StatId::Foc,
        DamageType::Magic => StatId::Mag,
    }
}

fn defense_stat(damage_type: DamageType) -> StatId {
    match damage_type {
        DamageType::Magic => StatId::Foc,
        _ => StatId::Def,
    }
}

/// Damage before variance
pub fn raw_damage(config: &BattleConfig, power: f64, tier: u32, attack: u32, defense: u32) -> f64 {
    power * config.damage_scale * tier.max(1) as f64 * attack as f64 / defense.max(1) as f64
}

pub fn damage(
    config: &BattleConfig,
    damage_type: DamageType,
    user: &BattlerInfo,
    target: &BattlerInfo,
    power: f64,
) -> f64 {
    let weapon_factor = match damage_type {
        DamageType::Sword | DamageType::Bow => 1.0 + user.weapon_level as f64 / 100.0,
        _ => 1.0,
    };
    raw_damage(
        config,
        power,
        user.tier,
        user.stat(attack_stat(damage_type)),
        target.stat(defense_stat(damage_type)),
    ) * weapon_factor
}

/// Damage dealt by a field-wide hazard at the given battle level
pub fn hazard_damage(config: &BattleConfig, power: f64, level: u32) -> f64 {
    raw_damage(config, power, 1, stat_value(100, level), stat_value(50, level))
}

pub fn healing(config: &BattleConfig, user: &BattlerInfo, power: f64) -> f64 {
    power * config.heal_scale * user.stat(StatId::Mag) as f64 / 50.0
}

/// Base hit chance before action and aiming modifiers
pub fn accuracy(accuracy_type: AccuracyType, user: &BattlerInfo, target: &BattlerInfo) -> f64 {
    let evasion = target.stat(StatId::Agi).max(1) as f64;
    match accuracy_type {
        AccuracyType::Physical | AccuracyType::Sword => {
            (user.stat(StatId::Agi) as f64 / evasion).sqrt()
        }
        AccuracyType::Bow => (user.stat(StatId::Foc) as f64 / evasion).sqrt(),
        AccuracyType::Magic => 1.0,
    }
}

pub fn guard_damage_taken(config: &BattleConfig, amount: f64) -> f64 {
    amount / config.bonus_multiplier
}

/// Experience toward one stat from a defeated enemy
pub fn stat_experience(config: &BattleConfig, stat: StatId, victim: &BattlerInfo) -> u64 {
    (victim.base_stat(stat) as f64 * victim.level as f64 * config.exp_scale / 100.0).round() as u64
}

/// Experience a defender earns toward vit/def from surviving a hit
pub fn defender_experience(config: &BattleConfig, attacker: &BattlerInfo, rank: u32) -> u64 {
    (attacker.level as f64 * rank.max(1) as f64 * config.exp_scale / 10.0).round() as u64
}

pub fn skill_experience(config: &BattleConfig, user: &BattlerInfo) -> u64 {
    (user.level as f64 * config.exp_scale).round() as u64
}

/// MP cost of a skill; practice halves it at the level cap
pub fn mp_cost(base_cost: u32, skill_level: u32) -> u32 {
    let discount = skill_level.min(100) as f64 / 200.0;
    (base_cost as f64 * (1.0 - discount)).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::stance::Stance;

    fn info(level: u32, stats: [u32; 6]) -> BattlerInfo {
        BattlerInfo {
            name: "Test".into(),
            level,
            tier: 1,
            health: 100,
            max_hp: 500,
            stance: Stance::Attack,
            stats,
            base_stats: [50; 6],
            statuses: Vec::new(),
            weapon_level: 0,
            is_party_member: true,
        }
    }

    #[test]
    fn test_faster_units_wait_less() {
        let config = BattleConfig::default();
        let slow = time_until_next_turn(&config, 40, 2);
        let fast = time_until_next_turn(&config, 80, 2);
        assert!(fast < slow);
    }

    #[test]
    fn test_higher_rank_waits_longer() {
        let config = BattleConfig::default();
        assert!(time_until_next_turn(&config, 80, 3) > time_until_next_turn(&config, 80, 2));
        assert_eq!(time_until_next_turn(&config, 80, 0), 0.0);
    }

    #[test]
    fn test_damage_favors_attack_over_defense() {
        let config = BattleConfig::default();
        let strong = info(50, [80, 120, 80, 80, 80, 80]);
        let weak = info(50, [80, 60, 80, 80, 80, 80]);
        let target = info(50, [80; 6]);
        let a = damage(&config, DamageType::Sword, &strong, &target, 5.0);
        let b = damage(&config, DamageType::Sword, &weak, &target, 5.0);
        assert!(a > b);
        assert_eq!(b, 5.0 * 20.0 * 60.0 / 80.0);
    }

    #[test]
    fn test_magic_always_lands() {
        let user = info(50, [80; 6]);
        let target = info(50, [80, 80, 80, 80, 80, 500]);
        assert_eq!(accuracy(AccuracyType::Magic, &user, &target), 1.0);
        assert!(accuracy(AccuracyType::Sword, &user, &target) < 1.0);
    }

    #[test]
    fn test_guard_divides_by_bonus() {
        let config = BattleConfig::default();
        assert_eq!(guard_damage_taken(&config, 150.0), 100.0);
    }

    #[test]
    fn test_mp_cost_discount() {
        assert_eq!(mp_cost(20, 0), 20);
        assert_eq!(mp_cost(20, 100), 10);
        assert_eq!(mp_cost(20, 250), 10);
    }

    #[test]
    fn test_hp_scales_with_tier() {
        let config = BattleConfig::default();
        assert_eq!(max_hp(&config, 80, 1), 850);
        assert_eq!(max_hp(&config, 80, 2), 1700);
    }
}
