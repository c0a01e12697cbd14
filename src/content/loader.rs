//! Load content tables from TOML
//!
//! One file holds everything: the tuning config, the charge skill and a
//! table per content kind keyed by id. After parsing, every id referenced
//! from one table into another is checked so a typo fails at load time
//! instead of halfway through a fight.

use std::fs;
use std::path::Path;

use ahash::AHashMap;
use serde::Deserialize;

use crate::battle::ai::strategies::create_strategy;
use crate::content::action::{Action, EffectKind};
use crate::content::{
    CharacterDef, ContentRegistry, EncounterDef, EnemyDef, ItemDef, SkillDef, WeaponDef,
};
use crate::core::config::BattleConfig;
use crate::core::error::{BattleError, Result};

/// On-disk layout of a content file
#[derive(Debug, Deserialize)]
#[serde(default)]
struct ContentFile {
    config: BattleConfig,
    charge_skill: String,
    skills: AHashMap<String, SkillDef>,
    items: AHashMap<String, ItemDef>,
    weapons: AHashMap<String, WeaponDef>,
    characters: AHashMap<String, CharacterDef>,
    enemies: AHashMap<String, EnemyDef>,
    encounters: AHashMap<String, EncounterDef>,
}

impl Default for ContentFile {
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
        }
    }
}

impl ContentRegistry {
    /// Parse and validate a content file's text
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let file: ContentFile = toml::from_str(source)?;
        let registry = Self {
            config: file.config,
            charge_skill: file.charge_skill,
            skills: file.skills,
            items: file.items,
            weapons: file.weapons,
            characters: file.characters,
            enemies: file.enemies,
            encounters: file.encounters,
            ..Self::default()
        };
        registry.validate()?;
        tracing::info!(
            skills = registry.skills.len(),
            items = registry.items.len(),
            enemies = registry.enemies.len(),
            encounters = registry.encounters.len(),
            "content loaded"
        );
        Ok(registry)
    }

    /// Read and validate a content file from disk
    pub fn load(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "reading content file");
        Self::from_toml_str(&source)
    }

    /// Check every cross-table reference
    pub fn validate(&self) -> Result<()> {
        self.config.validate().map_err(BattleError::InvalidConfig)?;
        self.skill(&self.charge_skill)?;
        if self.skills[&self.charge_skill].actions.is_empty() {
            return Err(BattleError::InvalidConfig(format!(
                "charge skill '{}' has no actions",
                self.charge_skill
            )));
        }

        for skill in self.skills.values() {
            for action in &skill.actions {
                self.validate_action(action)?;
            }
        }
        for item in self.items.values() {
            self.validate_action(&item.action)?;
        }
        for character in self.characters.values() {
            for skill_id in &character.skills {
                self.skill(skill_id)?;
            }
        }
        for (id, enemy) in &self.enemies {
            self.validate_enemy(id, enemy)?;
        }
        for (id, encounter) in &self.encounters {
            if encounter.enemies.is_empty() {
                return Err(BattleError::InvalidConfig(format!(
                    "encounter '{}' has no enemies",
                    id
                )));
            }
            for enemy_id in &encounter.enemies {
                self.enemy(enemy_id)?;
            }
        }
        Ok(())
    }

    fn validate_enemy(&self, id: &str, enemy: &EnemyDef) -> Result<()> {
        if enemy.turn_ratio.is_nan() || enemy.turn_ratio <= 0.0 {
            return Err(BattleError::InvalidConfig(format!(
                "enemy '{}' has turn_ratio {}; it must be positive",
                id, enemy.turn_ratio
            )));
        }
        if enemy.phases.windows(2).any(|w| w[0] < w[1]) {
            return Err(BattleError::InvalidConfig(format!(
                "enemy '{}' phase thresholds must descend",
                id
            )));
        }
        for status_id in &enemy.immunities {
            self.status(status_id)?;
        }
        if let Some(weapon) = &enemy.weapon {
            self.weapon(weapon)?;
        }
        for item in &enemy.items {
            self.item(item)?;
        }
        let skills = enemy
            .skills
            .iter()
            .chain(enemy.munch_skill.iter())
            .chain(enemy.default_skill.iter());
        for skill_id in skills {
            self.skill(skill_id)?;
        }
        if let Some(strategy) = &enemy.ai {
            create_strategy(strategy)?;
        }
        Ok(())
    }

    fn validate_action(&self, action: &Action) -> Result<()> {
        for effect in &action.effects {
            match &effect.kind {
                EffectKind::AddCondition { condition } => {
                    self.condition(condition)?;
                }
                EffectKind::AddStatus { status } => {
                    self.status(status)?;
                }
                EffectKind::Damage { add_status, .. } | EffectKind::Heal { add_status, .. } => {
                    if let Some(status) = add_status {
                        self.status(status)?;
                    }
                }
                EffectKind::LiftStatus { statuses } => {
                    for status in statuses {
                        self.status(status)?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }
}
