//! Field condition records and hook dispatch
//!
//! Field conditions mirror statuses but belong to the battle. They see
//! every battle-wide event before the unit-local one is raised.

use std::fmt;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::battle::Battle;
use crate::core::error::Result;
use crate::effects::events::{
    ActionTakenEvent, AfflictEvent, ConditionInstalledEvent, CureEvent, DamageEvent, DyingEvent,
    EndTurnEvent, HealEvent,
};

pub type ConditionHook<E> = fn(&mut ConditionCx<'_>, &mut E) -> Result<()>;

#[derive(Clone, Copy, Default)]
pub struct ConditionHooks {
    pub initialize: Option<ConditionHook<()>>,
    pub begin_cycle: Option<ConditionHook<()>>,
    pub end_turn: Option<ConditionHook<EndTurnEvent>>,
    pub action_taken: Option<ConditionHook<ActionTakenEvent>>,
    pub condition_installed: Option<ConditionHook<ConditionInstalledEvent>>,
    pub unit_afflicted: Option<ConditionHook<AfflictEvent>>,
    pub unit_cured: Option<ConditionHook<CureEvent>>,
    pub unit_damaged: Option<ConditionHook<DamageEvent>>,
    pub unit_dying: Option<ConditionHook<DyingEvent>>,
    pub unit_healed: Option<ConditionHook<HealEvent>>,
}

pub struct ConditionDef {
    pub id: &'static str,
    pub name: &'static str,
    pub hooks: ConditionHooks,
}

impl fmt::Debug for ConditionDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConditionDef").field("id", &self.id).finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum ConditionState {
    #[default]
    Stateless,
    /// Remaining actions, cycles or strikes before the condition lifts
    Countdown { remaining: i32 },
    Subzero { multiplier: f64, rank: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionInstance {
    pub serial: u64,
    pub id: String,
    pub state: ConditionState,
}

/// Handle passed to every field condition hook
pub struct ConditionCx<'a> {
    pub battle: &'a mut Battle,
    pub serial: u64,
    pub condition_id: &'static str,
}

impl<'a> ConditionCx<'a> {
    pub fn state(&mut self) -> Option<&mut ConditionState> {
        self.battle.condition_state_mut(self.serial)
    }

    pub fn set_state(&mut self, state: ConditionState) {
        if let Some(slot) = self.state() {
            *slot = state;
        }
    }

    pub fn bonus(&self) -> f64 {
        self.battle.config().bonus_multiplier
    }

    pub fn lift_self(&mut self) {
        self.battle.lift_condition(self.condition_id);
    }

    /// Decrement a countdown and lift the condition when it runs out
    pub fn count_down(&mut self) {
        let expired = match self.state() {
            Some(ConditionState::Countdown { remaining }) => {
                *remaining -= 1;
                *remaining <= 0
            }
            _ => false,
        };
        if expired {
            self.lift_self();
        }
    }
}

pub struct ConditionRegistry {
    defs: AHashMap<String, ConditionDef>,
}

impl ConditionRegistry {
    pub fn empty() -> Self {
        Self {
            defs: AHashMap::new(),
        }
    }

    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        for def in crate::effects::conditions::builtin_conditions() {
            registry.register(def);
        }
        registry
    }

    pub fn register(&mut self, def: ConditionDef) {
        self.defs.insert(def.id.to_string(), def);
    }

    pub fn get(&self, id: &str) -> Option<&ConditionDef> {
        self.defs.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.defs.contains_key(id)
    }
}
