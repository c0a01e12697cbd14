//! Read-only content tables
//!
//! Skills, items, weapons, characters, enemies and encounters are data;
//! statuses and field conditions are code registered by string id. All
//! of it is looked up through one `ContentRegistry` handed to the battle.

pub mod action;
pub mod loader;

use std::collections::BTreeMap;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::config::BattleConfig;
use crate::core::error::{BattleError, Result};
use crate::core::types::StatId;
use crate::effects::condition::{ConditionDef, ConditionRegistry};
use crate::effects::status::{StatusDef, StatusRegistry};

pub use action::{AccuracyType, Action, DamageType, Effect, EffectKind, TargetHint};

fn yes() -> bool {
    true
}

fn one() -> u32 {
    1
}

fn unit_ratio() -> f64 {
    1.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseStats {
    pub vit: u32,
    #[serde(rename = "str")]
    pub strength: u32,
    pub def: u32,
    pub foc: u32,
    pub mag: u32,
    pub agi: u32,
}

impl BaseStats {
    pub fn uniform(value: u32) -> Self {
        Self {
            vit: value,
            strength: value,
            def: value,
            foc: value,
            mag: value,
            agi: value,
        }
    }

    pub fn get(&self, id: StatId) -> u32 {
        match id {
            StatId::Vit => self.vit,
            StatId::Str => self.strength,
            StatId::Def => self.def,
            StatId::Foc => self.foc,
            StatId::Mag => self.mag,
            StatId::Agi => self.agi,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    /// One opponent
    #[default]
    Single,
    /// One member of the user's own side
    Ally,
    AllEnemies,
    AllAllies,
    User,
}

impl TargetType {
    pub fn is_group_cast(&self) -> bool {
        matches!(self, TargetType::AllEnemies | TargetType::AllAllies)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillDef {
    pub name: String,
    /// Skills of one category count as "the same attack" for crackdown
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub mp_cost: u32,
    #[serde(default)]
    pub target_type: TargetType,
    #[serde(default)]
    pub allow_dead_target: bool,
    #[serde(default = "yes")]
    pub use_aiming: bool,
    #[serde(default = "yes")]
    pub gives_experience: bool,
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDef {
    pub name: String,
    #[serde(default)]
    pub target_type: TargetType,
    #[serde(default)]
    pub allow_dead_target: bool,
    #[serde(default = "one")]
    pub uses: u32,
    #[serde(default)]
    pub rank: Option<u32>,
    pub action: Action,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaponDef {
    pub name: String,
    pub level: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterDef {
    pub name: String,
    #[serde(default)]
    pub full_name: Option<String>,
    pub base_stats: BaseStats,
    #[serde(default)]
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyDef {
    pub name: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default = "one")]
    pub tier: u32,
    #[serde(default = "unit_ratio")]
    pub turn_ratio: f64,
    pub base_stats: BaseStats,
    /// Overrides the HP formula
    #[serde(default)]
    pub max_hp: Option<u32>,
    #[serde(default = "yes")]
    pub has_life_bar: bool,
    #[serde(default)]
    pub immunities: Vec<String>,
    /// Damage multiplier per damage tag
    #[serde(default)]
    pub damage_modifiers: BTreeMap<String, f64>,
    #[serde(default)]
    pub weapon: Option<String>,
    #[serde(default)]
    pub items: Vec<String>,
    /// Skill learned by whoever devours this enemy
    #[serde(default)]
    pub munch_skill: Option<String>,
    #[serde(default)]
    pub ai: Option<String>,
    #[serde(default)]
    pub default_skill: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    /// Descending HP thresholds for AI phases
    #[serde(default)]
    pub phases: Vec<u32>,
    #[serde(default)]
    pub phase_sigma: f64,
}

impl EnemyDef {
    /// Tier 1 enemy with flat stats and no moves
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            full_name: None,
            tier: 1,
            turn_ratio: 1.0,
            base_stats: BaseStats::uniform(50),
            max_hp: None,
            has_life_bar: true,
            immunities: Vec::new(),
            damage_modifiers: BTreeMap::new(),
            weapon: None,
            items: Vec::new(),
            munch_skill: None,
            ai: None,
            default_skill: None,
            skills: Vec::new(),
            phases: Vec::new(),
            phase_sigma: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncounterDef {
    #[serde(default)]
    pub title: Option<String>,
    pub enemies: Vec<String>,
    /// Falls back to the average party level
    #[serde(default)]
    pub battle_level: Option<u32>,
    #[serde(default)]
    pub is_final_battle: bool,
}

pub struct ContentRegistry {
    pub config: BattleConfig,
    /// Skill whose first action is prepended to moves made in Charge stance
    pub charge_skill: String,
    pub skills: AHashMap<String, SkillDef>,
    pub items: AHashMap<String, ItemDef>,
    pub weapons: AHashMap<String, WeaponDef>,
    pub characters: AHashMap<String, CharacterDef>,
    pub enemies: AHashMap<String, EnemyDef>,
    pub encounters: AHashMap<String, EncounterDef>,
    pub statuses: StatusRegistry,
    pub conditions: ConditionRegistry,
}

impl Default for ContentRegistry {
    fn default() -> Self {
        Self {
            config: BattleConfig::default(),
            charge_skill: "chargeSlash".into(),
            skills: AHashMap::new(),
            items: AHashMap::new(),
            weapons: AHashMap::new(),
            characters: AHashMap::new(),
            enemies: AHashMap::new(),
            encounters: AHashMap::new(),
            statuses: StatusRegistry::builtin(),
            conditions: ConditionRegistry::builtin(),
        }
    }
}

impl ContentRegistry {
    pub fn skill(&self, id: &str) -> Result<&SkillDef> {
        self.skills
            .get(id)
            .ok_or_else(|| BattleError::UnknownSkill(id.to_string()))
    }

    pub fn item(&self, id: &str) -> Result<&ItemDef> {
        self.items
            .get(id)
            .ok_or_else(|| BattleError::UnknownItem(id.to_string()))
    }

    pub fn weapon(&self, id: &str) -> Result<&WeaponDef> {
        self.weapons
            .get(id)
            .ok_or_else(|| BattleError::UnknownWeapon(id.to_string()))
    }

    pub fn character(&self, id: &str) -> Result<&CharacterDef> {
        self.characters
            .get(id)
            .ok_or_else(|| BattleError::UnknownCharacter(id.to_string()))
    }

    pub fn enemy(&self, id: &str) -> Result<&EnemyDef> {
        self.enemies
            .get(id)
            .ok_or_else(|| BattleError::UnknownEnemy(id.to_string()))
    }

    pub fn encounter(&self, id: &str) -> Result<&EncounterDef> {
        self.encounters
            .get(id)
            .ok_or_else(|| BattleError::UnknownEncounter(id.to_string()))
    }

    pub fn status(&self, id: &str) -> Result<&StatusDef> {
        self.statuses
            .get(id)
            .ok_or_else(|| BattleError::UnknownStatus(id.to_string()))
    }

    pub fn condition(&self, id: &str) -> Result<&ConditionDef> {
        self.conditions
            .get(id)
            .ok_or_else(|| BattleError::UnknownCondition(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_registry_has_builtins() {
        let content = ContentRegistry::default();
        assert!(content.status("zombie").is_ok());
        assert!(content.condition("inferno").is_ok());
    }

    #[test]
    fn test_lookup_miss_is_config_error() {
        let content = ContentRegistry::default();
        assert!(matches!(
            content.skill("nope"),
            Err(BattleError::UnknownSkill(id)) if id == "nope"
        ));
        assert!(matches!(
            content.status("nope"),
            Err(BattleError::UnknownStatus(_))
        ));
    }

    #[test]
    fn test_group_cast_targets() {
        assert!(TargetType::AllEnemies.is_group_cast());
        assert!(TargetType::AllAllies.is_group_cast());
        assert!(!TargetType::Single.is_group_cast());
    }
}
