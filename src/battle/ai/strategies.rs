//! Concrete AI strategies, looked up by the id stored in content data

use crate::battle::ai::{AiCore, AiStrategy};
use crate::battle::Battle;
use crate::combat::stance::Stance;
use crate::core::error::{BattleError, Result};
use crate::core::types::UnitRef;

/// Build the strategy registered under `id`
pub fn create_strategy(id: &str) -> Result<Box<dyn AiStrategy>> {
    match id {
        "basic" => Ok(Box::new(BasicStrategy)),
        "scottTemple" => Ok(Box::new(ScottTempleStrategy::default())),
        other => Err(BattleError::UnknownStrategy(other.to_string())),
    }
}

/// Picks a random affordable skill each turn
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicStrategy;

impl AiStrategy for BasicStrategy {
    fn strategize(&mut self, core: &mut AiCore, battle: &mut Battle) -> Result<()> {
        let known: Vec<String> = battle
            .unit(core.unit())
            .skills()
            .iter()
            .map(|s| s.skill_id.clone())
            .collect();
        let mut usable = Vec::with_capacity(known.len());
        for skill_id in known {
            if core.is_skill_usable(battle, &skill_id)? {
                usable.push(skill_id);
            }
        }
        if usable.is_empty() {
            return Ok(());
        }
        let pick = battle.rng_mut().index(usable.len());
        core.queue_skill(battle, &usable[pick], Stance::Attack, None, None)
    }
}

const HEALING_ITEMS: [&str; 2] = ["tonic", "powerTonic"];
const ELEMENTAL_SKILLS: [&str; 4] = ["hellfire", "upheaval", "windchill", "electrocute"];

/// Boss fight against Scott Temple
///
/// Punishes healing: whoever gets healed is jolted on Scott's next turn.
#[derive(Debug, Clone, Default)]
pub struct ScottTempleStrategy {
    jolt_target: Option<UnitRef>,
}

impl ScottTempleStrategy {
    pub fn jolt_target(&self) -> Option<UnitRef> {
        self.jolt_target
    }
}

impl AiStrategy for ScottTempleStrategy {
    fn setup(&mut self, core: &mut AiCore, battle: &mut Battle) -> Result<()> {
        core.define_phases(battle, &[9000, 3000], 100.0);
        core.set_default_skill(battle, "swordSlash")?;
        self.jolt_target = None;
        Ok(())
    }

    fn strategize(&mut self, core: &mut AiCore, battle: &mut Battle) -> Result<()> {
        let pick = battle.rng_mut().index(ELEMENTAL_SKILLS.len());
        core.queue_skill(battle, ELEMENTAL_SKILLS[pick], Stance::Attack, None, None)
    }

    fn on_phase_changed(
        &mut self,
        core: &mut AiCore,
        battle: &mut Battle,
        phase: u32,
        _last_phase: u32,
    ) -> Result<()> {
        match phase {
            1 => {
                let elysia = battle.find_unit("elysia");
                core.queue_skill(battle, "omni", Stance::Attack, elysia, None)
            }
            2 => core.queue_skill(battle, "rejuvenate", Stance::Attack, None, None),
            _ => Ok(()),
        }
    }

    fn on_unit_ready(&mut self, core: &mut AiCore, battle: &mut Battle, unit: UnitRef) -> Result<()> {
        if unit != core.unit() || core.has_moves_queued() {
            return Ok(());
        }
        if let Some(target) = self.jolt_target {
            tracing::debug!(target = %battle.unit(target).name(), "jolting healed unit");
            core.queue_skill(battle, "jolt", Stance::Attack, Some(target), None)?;
        }
        Ok(())
    }

    fn on_item_used(
        &mut self,
        _core: &mut AiCore,
        _battle: &mut Battle,
        _user: UnitRef,
        item_id: &str,
        targets: &[UnitRef],
    ) -> Result<()> {
        if HEALING_ITEMS.contains(&item_id) {
            self.jolt_target = targets.first().copied();
        }
        Ok(())
    }

    fn on_skill_used(
        &mut self,
        core: &mut AiCore,
        battle: &mut Battle,
        user: UnitRef,
        skill_id: &str,
        _stance: Stance,
        targets: &[UnitRef],
    ) -> Result<()> {
        if user == core.unit() {
            if skill_id == "jolt" {
                self.jolt_target = None;
            }
            return Ok(());
        }
        match skill_id {
            "heal" | "rejuvenate" => self.jolt_target = targets.first().copied(),
            "renewal" => core.queue_skill(battle, "omni", Stance::Attack, Some(user), None)?,
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_known_strategies() {
        assert!(create_strategy("basic").is_ok());
        assert!(create_strategy("scottTemple").is_ok());
    }

    #[test]
    fn test_unknown_strategy_is_an_error() {
        assert!(matches!(
            create_strategy("doctorEvil"),
            Err(BattleError::UnknownStrategy(id)) if id == "doctorEvil"
        ));
    }

    #[test]
    fn test_healing_item_marks_jolt_target() {
        let mut strategy = ScottTempleStrategy::default();
        let mut core = AiCore::new(UnitRef(0));
        let mut battle = crate::battle::testing::battle_with("scottFight");
        strategy
            .on_item_used(&mut core, &mut battle, UnitRef(1), "tonic", &[UnitRef(2)])
            .unwrap();
        assert_eq!(strategy.jolt_target(), Some(UnitRef(2)));
        strategy
            .on_item_used(&mut core, &mut battle, UnitRef(1), "ether", &[UnitRef(1)])
            .unwrap();
        assert_eq!(strategy.jolt_target(), Some(UnitRef(2)));
    }
}
