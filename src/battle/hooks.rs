//! Status and field condition dispatch
//!
//! Dispatch works from a snapshot of `(serial, id)` pairs taken before the
//! first handler runs. A handler may lift its own instance or add new ones;
//! instances gone by the time their turn comes are skipped and instances
//! added mid-dispatch wait for the next event.

use std::sync::Arc;

use crate::battle::log::BattleEventType;
use crate::battle::Battle;
use crate::core::error::Result;
use crate::core::types::UnitRef;
use crate::effects::condition::{ConditionCx, ConditionHook, ConditionHooks, ConditionInstance, ConditionState};
use crate::effects::events::ConditionInstalledEvent;
use crate::effects::status::{StatusCx, StatusHook, StatusHooks};

impl Battle {
    /// Raise an event on every status of one unit, in insertion order
    pub(crate) fn raise_unit_event<E>(
        &mut self,
        unit: UnitRef,
        pick: fn(&StatusHooks) -> Option<StatusHook<E>>,
        event: &mut E,
    ) -> Result<()> {
        let content = Arc::clone(&self.content);
        let snapshot: Vec<(u64, String)> = self.units[unit.0]
            .statuses
            .iter()
            .map(|s| (s.serial, s.id.clone()))
            .collect();
        for (serial, id) in snapshot {
            if !self.units[unit.0].has_status_serial(serial) {
                continue;
            }
            let def = content.status(&id)?;
            if let Some(hook) = pick(&def.hooks) {
                let mut cx = StatusCx {
                    battle: self,
                    unit,
                    serial,
                    status_id: def.id,
                };
                hook(&mut cx, event)?;
            }
        }
        Ok(())
    }

    /// Raise an event on every active field condition, in install order
    pub(crate) fn raise_battle_event<E>(
        &mut self,
        pick: fn(&ConditionHooks) -> Option<ConditionHook<E>>,
        event: &mut E,
    ) -> Result<()> {
        let content = Arc::clone(&self.content);
        let snapshot: Vec<(u64, String)> = self
            .conditions
            .iter()
            .map(|c| (c.serial, c.id.clone()))
            .collect();
        for (serial, id) in snapshot {
            if !self.conditions.iter().any(|c| c.serial == serial) {
                continue;
            }
            let def = content.condition(&id)?;
            if let Some(hook) = pick(&def.hooks) {
                let mut cx = ConditionCx {
                    battle: self,
                    serial,
                    condition_id: def.id,
                };
                hook(&mut cx, event)?;
            }
        }
        Ok(())
    }

    /// Install a field condition
    ///
    /// Returns false if it was already active or an active condition
    /// cancelled the install.
    pub fn add_condition(&mut self, condition_id: &str) -> Result<bool> {
        let content = Arc::clone(&self.content);
        let def = content.condition(condition_id)?;
        if self.has_condition(condition_id) {
            return Ok(false);
        }

        let mut event = ConditionInstalledEvent {
            condition_id: condition_id.to_string(),
            cancel: false,
        };
        self.raise_battle_event(|h| h.condition_installed, &mut event)?;
        if event.cancel {
            tracing::info!(condition = condition_id, "field condition install cancelled");
            self.log_event(
                BattleEventType::ConditionCancelled {
                    condition: condition_id.to_string(),
                },
                format!("{} cancelled by an active field condition", def.name),
            );
            return Ok(false);
        }

        let serial = self.next_serial();
        self.conditions.push(ConditionInstance {
            serial,
            id: def.id.to_string(),
            state: ConditionState::Stateless,
        });
        tracing::info!(condition = def.name, "install field condition");
        self.log_event(
            BattleEventType::ConditionInstalled {
                condition: def.id.to_string(),
            },
            format!("{} is now in effect", def.name),
        );
        if let Some(init) = def.hooks.initialize {
            let mut cx = ConditionCx {
                battle: self,
                serial,
                condition_id: def.id,
            };
            init(&mut cx, &mut ())?;
        }
        Ok(true)
    }

    /// Remove a field condition; false if it was not active
    pub fn lift_condition(&mut self, condition_id: &str) -> bool {
        let before = self.conditions.len();
        self.conditions.retain(|c| c.id != condition_id);
        if self.conditions.len() == before {
            return false;
        }
        tracing::info!(condition = condition_id, "lift field condition");
        self.log_event(
            BattleEventType::ConditionLifted {
                condition: condition_id.to_string(),
            },
            format!("{} has ended", condition_id),
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::engine::PartySetup;
    use crate::content::{ContentRegistry, EncounterDef, EnemyDef};
    use crate::core::rng::FixedRng;

    fn dummy_battle() -> Battle {
        let mut content = ContentRegistry::default();
        content
            .enemies
            .insert("dummy".into(), EnemyDef::named("Dummy"));
        content.encounters.insert(
            "test".into(),
            EncounterDef {
                title: None,
                enemies: vec!["dummy".into(), "dummy".into()],
                battle_level: Some(10),
                is_final_battle: false,
            },
        );
        Battle::new(
            Arc::new(content),
            "test",
            &PartySetup::default(),
            Box::new(FixedRng::new(0.5)),
        )
        .unwrap()
    }

    #[test]
    fn test_add_condition_is_idempotent() {
        let mut battle = dummy_battle();
        assert!(battle.add_condition("thunderstorm").unwrap());
        assert!(!battle.add_condition("thunderstorm").unwrap());
        assert_eq!(battle.condition_ids(), vec!["thunderstorm"]);
    }

    #[test]
    fn test_unknown_condition_is_an_error() {
        let mut battle = dummy_battle();
        assert!(battle.add_condition("sandstorm").is_err());
    }

    #[test]
    fn test_opposing_conditions_annihilate() {
        let mut battle = dummy_battle();
        battle.add_condition("subzero").unwrap();
        assert!(!battle.add_condition("inferno").unwrap());
        assert!(battle.condition_ids().is_empty());
        for unit in battle.living_units() {
            assert!(battle.unit(unit).has_status("zombie"));
        }
    }

    #[test]
    fn test_lift_condition() {
        let mut battle = dummy_battle();
        battle.add_condition("healingAura").unwrap();
        assert!(battle.lift_condition("healingAura"));
        assert!(!battle.lift_condition("healingAura"));
    }
}
