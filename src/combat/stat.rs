//! Growable combatant attributes

use serde::{Deserialize, Serialize};

/// Experience curve shared by stats and skills
///
/// Earning `n` levels costs `n^2 * exp_per_level` experience, so each
/// level is harder to reach than the last.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrowthCurve {
    pub exp_per_level: f64,
    pub max_level: u32,
}

impl Default for GrowthCurve {
    fn default() -> Self {
        Self {
            exp_per_level: 50.0,
            max_level: 100,
        }
    }
}

impl GrowthCurve {
    /// Levels earned on top of a starting level
    pub fn levels_earned(&self, experience: u64) -> u32 {
        (experience as f64 / self.exp_per_level).sqrt().floor() as u32
    }

    pub fn level(&self, start_level: u32, experience: u64) -> u32 {
        let cap = self.max_level.max(start_level);
        start_level
            .saturating_add(self.levels_earned(experience))
            .min(cap)
    }
}

/// Effective value of a stat with the given base at the given level
pub fn stat_value(base: u32, level: u32) -> u32 {
    ((2.0 * base as f64 + 50.0) * level as f64 / 100.0 + 5.0).round() as u32
}

/// A single growable stat
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stat {
    base: u32,
    start_level: u32,
    experience: u64,
    can_grow: bool,
    curve: GrowthCurve,
}

impl Stat {
    pub fn new(base: u32, level: u32, can_grow: bool) -> Self {
        Self::with_curve(base, level, can_grow, GrowthCurve::default())
    }

    pub fn with_curve(base: u32, level: u32, can_grow: bool, curve: GrowthCurve) -> Self {
        Self {
            base,
            start_level: level.max(1),
            experience: 0,
            can_grow,
            curve,
        }
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    pub fn experience(&self) -> u64 {
        self.experience
    }

    pub fn can_grow(&self) -> bool {
        self.can_grow
    }

    pub fn level(&self) -> u32 {
        self.curve.level(self.start_level, self.experience)
    }

    pub fn value(&self) -> u32 {
        stat_value(self.base, self.level())
    }

    /// Add experience; returns true if the stat gained a level
    pub fn grow(&mut self, experience: u64) -> bool {
        if !self.can_grow || experience == 0 {
            return false;
        }
        let before = self.level();
        self.experience = self.experience.saturating_add(experience);
        self.level() > before
    }
}
