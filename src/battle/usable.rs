//! Things a combatant can use on its turn

use serde::{Deserialize, Serialize};

use crate::battle::Battle;
use crate::combat::formulas;
use crate::combat::stance::Stance;
use crate::combat::stat::GrowthCurve;
use crate::content::action::Action;
use crate::content::TargetType;
use crate::core::error::{BattleError, Result};
use crate::core::types::UnitRef;

/// A skill known by a combatant, with its practice level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillUsable {
    pub skill_id: String,
    base_level: u32,
    level: u32,
    experience: u64,
}

impl SkillUsable {
    pub fn new(skill_id: impl Into<String>, level: u32) -> Self {
        let level = level.max(1);
        Self {
            skill_id: skill_id.into(),
            base_level: level,
            level,
            experience: 0,
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    /// Returns true if the skill gained a level
    pub fn grow(&mut self, curve: &GrowthCurve, experience: u64) -> bool {
        if experience == 0 {
            return false;
        }
        self.experience = self.experience.saturating_add(experience);
        let level = curve.level(self.base_level, self.experience);
        let grew = level > self.level;
        self.level = level;
        grew
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemUsable {
    pub item_id: String,
    pub uses_left: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Usable {
    Skill { skill_id: String, level: u32 },
    Item { item_id: String },
    Weapon { weapon_id: String },
}

/// A move as returned by an AI or the move menu
///
/// `usable` is `None` for a plain Guard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChosenMove {
    pub usable: Option<Usable>,
    pub stance: Stance,
    pub targets: Vec<UnitRef>,
}

impl ChosenMove {
    pub fn skill(skill_id: impl Into<String>, level: u32, targets: Vec<UnitRef>) -> Self {
        Self {
            usable: Some(Usable::Skill {
                skill_id: skill_id.into(),
                level,
            }),
            stance: Stance::Attack,
            targets,
        }
    }

    pub fn item(item_id: impl Into<String>, targets: Vec<UnitRef>) -> Self {
        Self {
            usable: Some(Usable::Item {
                item_id: item_id.into(),
            }),
            stance: Stance::Attack,
            targets,
        }
    }

    pub fn guard() -> Self {
        Self {
            usable: None,
            stance: Stance::Guard,
            targets: Vec::new(),
        }
    }

    pub fn in_stance(mut self, stance: Stance) -> Self {
        self.stance = stance;
        self
    }
}

/// Targeting and bookkeeping flags of a usable
#[derive(Debug, Clone, PartialEq)]
pub struct MoveTraits {
    pub target_type: TargetType,
    pub allow_dead_target: bool,
    pub use_aiming: bool,
    pub gives_experience: bool,
    pub category: Option<String>,
}

impl Battle {
    pub fn usable_name(&self, usable: &Usable) -> Result<String> {
        Ok(match usable {
            Usable::Skill { skill_id, .. } => self.content.skill(skill_id)?.name.clone(),
            Usable::Item { item_id } => self.content.item(item_id)?.name.clone(),
            Usable::Weapon { weapon_id } => self.content.weapon(weapon_id)?.name.clone(),
        })
    }

    pub fn move_traits(&self, usable: &Usable) -> Result<MoveTraits> {
        Ok(match usable {
            Usable::Skill { skill_id, .. } => {
                let skill = self.content.skill(skill_id)?;
                MoveTraits {
                    target_type: skill.target_type,
                    allow_dead_target: skill.allow_dead_target,
                    use_aiming: skill.use_aiming,
                    gives_experience: skill.gives_experience,
                    category: skill.category.clone(),
                }
            }
            Usable::Item { item_id } => {
                let item = self.content.item(item_id)?;
                MoveTraits {
                    target_type: item.target_type,
                    allow_dead_target: item.allow_dead_target,
                    use_aiming: false,
                    gives_experience: false,
                    category: None,
                }
            }
            Usable::Weapon { weapon_id } => {
                self.content.weapon(weapon_id)?;
                MoveTraits {
                    target_type: TargetType::User,
                    allow_dead_target: false,
                    use_aiming: false,
                    gives_experience: false,
                    category: None,
                }
            }
        })
    }

    /// Can `unit` use this right now in the given stance?
    pub fn is_usable(&self, unit: UnitRef, usable: &Usable, stance: Stance) -> Result<bool> {
        let user = self.unit(unit);
        Ok(match usable {
            Usable::Skill { skill_id, level } => {
                let skill = self.content.skill(skill_id)?;
                let cost = formulas::mp_cost(skill.mp_cost, *level);
                cost <= self.pools[user.pool.0].available()
            }
            Usable::Item { item_id } => {
                self.content.item(item_id)?;
                matches!(stance, Stance::Attack | Stance::Guard)
                    && user
                        .items
                        .iter()
                        .any(|i| &i.item_id == item_id && i.uses_left > 0)
            }
            Usable::Weapon { weapon_id } => {
                self.content.weapon(weapon_id)?;
                stance == Stance::Attack && user.weapon.as_deref() != Some(weapon_id.as_str())
            }
        })
    }

    /// Targets picked when nobody chose any
    pub fn default_targets(&mut self, unit: UnitRef, usable: &Usable) -> Result<Vec<UnitRef>> {
        let traits = self.move_traits(usable)?;
        let alive = |battle: &Battle, list: &[UnitRef]| -> Vec<UnitRef> {
            list.iter()
                .copied()
                .filter(|&u| battle.unit(u).is_alive())
                .collect()
        };
        Ok(match traits.target_type {
            TargetType::Single => {
                let foes = alive(self, self.enemies_of(unit));
                if foes.is_empty() {
                    Vec::new()
                } else {
                    let i = self.rng.index(foes.len());
                    vec![foes[i]]
                }
            }
            TargetType::AllEnemies => alive(self, self.enemies_of(unit)),
            TargetType::AllAllies => alive(self, self.allies_of(unit)),
            TargetType::Ally | TargetType::User => vec![unit],
        })
    }

    /// Pay for a usable and expand it into actions
    pub(crate) fn use_usable(
        &mut self,
        unit: UnitRef,
        usable: &Usable,
        stance: Stance,
        targets: &[UnitRef],
    ) -> Result<Vec<Action>> {
        let content = std::sync::Arc::clone(&self.content);
        match usable {
            Usable::Skill { skill_id, level } => {
                let skill = content.skill(skill_id)?;
                let cost = formulas::mp_cost(skill.mp_cost, *level);
                let pool = self.units[unit.0].pool;
                self.spend_mp(pool, cost);
                tracing::debug!(
                    unit = %self.units[unit.0].name,
                    skill = %skill.name,
                    cost,
                    "skill used"
                );
                if self.units[unit.0].is_party_member() {
                    let info = self.unit_info(unit);
                    let experience = formulas::skill_experience(&content.config, &info);
                    let curve = content.config.growth;
                    if let Some(known) = self.units[unit.0]
                        .skills
                        .iter_mut()
                        .find(|s| &s.skill_id == skill_id)
                    {
                        known.grow(&curve, experience);
                    }
                }
                self.notify_ais(&crate::battle::ai::AiEvent::SkillUsed {
                    user: unit,
                    skill_id: skill_id.clone(),
                    stance,
                    targets: targets.to_vec(),
                })?;
                Ok(skill.actions.clone())
            }
            Usable::Item { item_id } => {
                let item = content.item(item_id)?;
                let owned = self.units[unit.0]
                    .items
                    .iter_mut()
                    .find(|i| &i.item_id == item_id && i.uses_left > 0);
                match owned {
                    Some(owned) => owned.uses_left -= 1,
                    None => {
                        return Err(BattleError::ItemNotOwned {
                            unit: self.units[unit.0].name.clone(),
                            item: item_id.clone(),
                        })
                    }
                }
                self.notify_ais(&crate::battle::ai::AiEvent::ItemUsed {
                    user: unit,
                    item_id: item_id.clone(),
                    targets: targets.to_vec(),
                })?;
                let mut action = item.action.clone();
                action.rank = item.rank.unwrap_or(content.config.default_item_rank);
                Ok(vec![action])
            }
            Usable::Weapon { weapon_id } => {
                let weapon = content.weapon(weapon_id)?;
                let user = &mut self.units[unit.0];
                user.weapon = Some(weapon_id.clone());
                user.weapon_level = weapon.level;
                tracing::debug!(unit = %user.name, weapon = %weapon.name, "weapon equipped");
                let rank = content.config.equip_weapon_rank;
                self.reset_counter(unit, rank, false);
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skill_growth_levels_up() {
        let curve = GrowthCurve::default();
        let mut skill = SkillUsable::new("swordSlash", 1);
        assert!(!skill.grow(&curve, 49));
        assert!(skill.grow(&curve, 1));
        assert_eq!(skill.level(), 2);
    }

    #[test]
    fn test_guard_move_has_no_usable() {
        let guard = ChosenMove::guard();
        assert!(guard.usable.is_none());
        assert_eq!(guard.stance, Stance::Guard);
    }

    #[test]
    fn test_in_stance() {
        let charge = ChosenMove::skill("swordSlash", 1, Vec::new()).in_stance(Stance::Charge);
        assert_eq!(charge.stance, Stance::Charge);
    }
}
