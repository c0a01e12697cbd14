//! Read-only combatant snapshot handed to formulas, hooks and AIs

use serde::{Deserialize, Serialize};

use crate::combat::stance::Stance;
use crate::core::types::StatId;

/// Snapshot of a combatant at one point in time
///
/// Stat values already include modifiers from active statuses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattlerInfo {
    pub name: String,
    pub level: u32,
    pub tier: u32,
    /// Remaining HP as a whole percentage of max HP
    pub health: u32,
    pub max_hp: u32,
    pub stance: Stance,
    pub stats: [u32; 6],
    pub base_stats: [u32; 6],
    pub statuses: Vec<String>,
    pub weapon_level: u32,
    pub is_party_member: bool,
}

impl BattlerInfo {
    pub fn stat(&self, id: StatId) -> u32 {
        self.stats[id.index()]
    }

    pub fn base_stat(&self, id: StatId) -> u32 {
        self.base_stats[id.index()]
    }

    pub fn stat_average(&self) -> f64 {
        self.stats.iter().map(|&v| v as f64).sum::<f64>() / self.stats.len() as f64
    }

    pub fn has_status(&self, id: &str) -> bool {
        self.statuses.iter().any(|s| s == id)
    }
}
