//! Combatant state
//!
//! A `BattleUnit` only holds data and answers pure questions about it.
//! Anything that raises hooks or touches other units lives on `Battle`.

use std::collections::{BTreeMap, VecDeque};

use crate::battle::ai::BattleAi;
use crate::battle::usable::{ChosenMove, ItemUsable, SkillUsable};
use crate::combat::formulas;
use crate::combat::info::BattlerInfo;
use crate::combat::stance::Stance;
use crate::combat::stat::Stat;
use crate::content::action::Action;
use crate::content::{BaseStats, ContentRegistry};
use crate::core::config::BattleConfig;
use crate::core::types::{PoolRef, Side, StatId, UnitRef};
use crate::effects::status::StatusInstance;

/// Countdown value for an action of the given rank
///
/// Rank 0 means "act again on the next tick". The first turn of a battle
/// ignores the turn ratio so opening order depends on speed alone.
pub fn counter_for_rank(
    config: &BattleConfig,
    agility: u32,
    turn_ratio: f64,
    rank: u32,
    is_first_turn: bool,
) -> u32 {
    if rank == 0 {
        return 1;
    }
    let divisor = if is_first_turn { 1.0 } else { turn_ratio };
    let ticks = formulas::time_until_next_turn(config, agility, rank) / divisor;
    ticks.round().clamp(1.0, u32::MAX as f64) as u32
}

pub struct BattleUnit {
    pub(crate) template_id: String,
    pub(crate) name: String,
    pub(crate) full_name: String,
    pub(crate) side: Side,
    pub(crate) tier: u32,
    pub(crate) turn_ratio: f64,
    pub(crate) has_life_bar: bool,
    pub(crate) hp: u32,
    pub(crate) max_hp: u32,
    /// Set while a dying hook decides whether the unit really dies
    pub(crate) lazarus: bool,
    pub(crate) level: u32,
    pub(crate) base_stats: BaseStats,
    pub(crate) stats: [Stat; 6],
    pub(crate) stance: Stance,
    pub(crate) new_stance: Stance,
    pub(crate) statuses: Vec<StatusInstance>,
    pub(crate) action_queue: VecDeque<Action>,
    pub(crate) cv: u32,
    pub(crate) affinities: BTreeMap<String, f64>,
    pub(crate) immunities: Vec<String>,
    pub(crate) pool: PoolRef,
    pub(crate) skills: Vec<SkillUsable>,
    pub(crate) items: Vec<ItemUsable>,
    pub(crate) weapon: Option<String>,
    pub(crate) weapon_level: u32,
    pub(crate) munch_skill: Option<String>,
    pub(crate) ai: Option<Box<BattleAi>>,
    pub(crate) move_used: Option<ChosenMove>,
    pub(crate) counter_target: Option<UnitRef>,
    pub(crate) last_attacker: Option<UnitRef>,
    pub(crate) disposed: bool,
}

impl BattleUnit {
    /// Content id of the template this unit was built from
    pub fn id(&self) -> &str {
        &self.template_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn is_party_member(&self) -> bool {
        self.side == Side::Party
    }

    pub fn tier(&self) -> u32 {
        self.tier
    }

    pub fn turn_ratio(&self) -> f64 {
        self.turn_ratio
    }

    pub fn has_life_bar(&self) -> bool {
        self.has_life_bar
    }

    pub fn hp(&self) -> u32 {
        self.hp
    }

    pub fn max_hp(&self) -> u32 {
        self.max_hp
    }

    /// Remaining HP as a whole percentage
    pub fn health(&self) -> u32 {
        (100.0 * self.hp as f64 / self.max_hp.max(1) as f64).ceil() as u32
    }

    pub fn cv(&self) -> u32 {
        self.cv
    }

    pub fn stance(&self) -> Stance {
        self.stance
    }

    pub fn pending_stance(&self) -> Stance {
        self.new_stance
    }

    /// Alive, or held in suspended death by a status
    pub fn is_alive(&self) -> bool {
        self.hp > 0 || self.lazarus
    }

    pub fn is_lazarus(&self) -> bool {
        self.lazarus
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn has_status(&self, id: &str) -> bool {
        self.statuses.iter().any(|s| s.id == id)
    }

    pub(crate) fn has_status_serial(&self, serial: u64) -> bool {
        self.statuses.iter().any(|s| s.serial == serial)
    }

    /// Active status ids in insertion order
    pub fn status_ids(&self) -> Vec<&str> {
        self.statuses.iter().map(|s| s.id.as_str()).collect()
    }

    pub fn queued_actions(&self) -> usize {
        self.action_queue.len()
    }

    pub fn base_stat(&self, id: StatId) -> u32 {
        self.base_stats.get(id)
    }

    pub fn stat(&self, id: StatId) -> &Stat {
        &self.stats[id.index()]
    }

    /// Party members level with their stats; enemies use the battle level
    pub fn level(&self) -> u32 {
        if self.is_party_member() {
            let total: u32 = self.stats.iter().map(|s| s.level()).sum();
            (total as f64 / self.stats.len() as f64).round() as u32
        } else {
            self.level
        }
    }

    pub fn skills(&self) -> &[SkillUsable] {
        &self.skills
    }

    pub fn items(&self) -> &[ItemUsable] {
        &self.items
    }

    pub fn weapon(&self) -> Option<&str> {
        self.weapon.as_deref()
    }

    pub fn counter_target(&self) -> Option<UnitRef> {
        self.counter_target
    }

    pub fn pool(&self) -> PoolRef {
        self.pool
    }

    pub fn has_ai(&self) -> bool {
        self.ai.is_some()
    }

    pub fn affinity(&self, tag: &str) -> Option<f64> {
        self.affinities.get(tag).copied()
    }

    pub fn is_immune(&self, status_id: &str) -> bool {
        self.immunities.iter().any(|s| s == status_id)
    }

    /// Snapshot with status stat modifiers applied
    pub fn info(&self, content: &ContentRegistry) -> BattlerInfo {
        let mut stats = [0u32; 6];
        for id in StatId::ALL {
            stats[id.index()] = self.stats[id.index()].value();
        }
        for status in &self.statuses {
            if let Some(def) = content.statuses.get(&status.id) {
                for id in def.weakened_stats {
                    let value = stats[id.index()] as f64 / content.config.bonus_multiplier;
                    stats[id.index()] = value.round() as u32;
                }
            }
        }
        let mut base_stats = [0u32; 6];
        for id in StatId::ALL {
            base_stats[id.index()] = self.base_stats.get(id);
        }
        BattlerInfo {
            name: self.name.clone(),
            level: self.level(),
            tier: self.tier,
            health: self.health(),
            max_hp: self.max_hp,
            stance: self.stance,
            stats,
            base_stats,
            statuses: self.statuses.iter().map(|s| s.id.clone()).collect(),
            weapon_level: self.weapon_level,
            is_party_member: self.is_party_member(),
        }
    }

    /// Projected ticks until this unit's `turn_index`-th turn from now
    ///
    /// Ranks come from the queued actions, then `pending` (actions about to
    /// be queued), then `assumed_rank`. Dead units never get a turn.
    pub fn time_until_turn(
        &self,
        content: &ContentRegistry,
        turn_index: usize,
        assumed_rank: u32,
        pending: &[u32],
    ) -> Option<u64> {
        if !self.is_alive() {
            return None;
        }
        let agility = self.info(content).stat(StatId::Agi);
        let ranks: Vec<u32> = self
            .action_queue
            .iter()
            .map(|a| a.rank)
            .chain(pending.iter().copied())
            .collect();
        let mut time_left = self.cv as u64;
        for i in 1..=turn_index {
            let rank = ranks.get(i - 1).copied().unwrap_or(assumed_rank);
            time_left += counter_for_rank(&content.config, agility, self.turn_ratio, rank, false) as u64;
        }
        Some(time_left)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_floor_is_one() {
        let config = BattleConfig::default();
        assert_eq!(counter_for_rank(&config, 80, 1.0, 0, false), 1);
        assert_eq!(counter_for_rank(&config, 1_000_000, 1.0, 1, false), 1);
    }

    #[test]
    fn test_turn_ratio_speeds_up_unit() {
        let config = BattleConfig::default();
        let normal = counter_for_rank(&config, 80, 1.0, 2, false);
        let fast = counter_for_rank(&config, 80, 2.0, 2, false);
        assert_eq!(normal, 25);
        assert_eq!(fast, 13);
    }

    #[test]
    fn test_first_turn_ignores_ratio() {
        let config = BattleConfig::default();
        let first = counter_for_rank(&config, 80, 2.0, 2, true);
        assert_eq!(first, 25);
    }
}
