//! Status effect records and hook dispatch
//!
//! A status is a registered definition (tags, overrules list, hook table)
//! plus per-instance state stored on the afflicted unit. Hooks are plain
//! functions that get the battle, the owner and the instance serial, so
//! they can call back into the battle while an event is being raised.

use std::fmt;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::battle::Battle;
use crate::combat::stat::stat_value;
use crate::core::config::BattleConfig;
use crate::core::error::Result;
use crate::core::types::{StatId, UnitRef};
use crate::effects::events::{
    ActingEvent, AfflictEvent, AimingEvent, AttackedEvent, CureEvent, DamageEvent, DyingEvent,
    HealEvent, TurnEvent,
};

pub type StatusHook<E> = fn(&mut StatusCx<'_>, &mut E) -> Result<()>;

/// Hook table; a missing entry means the status ignores that event
#[derive(Clone, Copy, Default)]
pub struct StatusHooks {
    pub initialize: Option<StatusHook<()>>,
    pub begin_cycle: Option<StatusHook<()>>,
    pub begin_turn: Option<StatusHook<TurnEvent>>,
    pub end_turn: Option<StatusHook<()>>,
    pub acting: Option<StatusHook<ActingEvent>>,
    pub attacked: Option<StatusHook<AttackedEvent>>,
    pub damaged: Option<StatusHook<DamageEvent>>,
    pub healed: Option<StatusHook<HealEvent>>,
    pub afflicted: Option<StatusHook<AfflictEvent>>,
    pub cured: Option<StatusHook<CureEvent>>,
    pub dying: Option<StatusHook<DyingEvent>>,
    pub aiming: Option<StatusHook<AimingEvent>>,
}

pub struct StatusDef {
    pub id: &'static str,
    pub name: &'static str,
    pub tags: &'static [&'static str],
    /// Statuses this one blocks on entry and removes when it lands
    pub overrules: &'static [&'static str],
    /// Stats divided by the bonus multiplier while active
    pub weakened_stats: &'static [StatId],
    pub hooks: StatusHooks,
}

impl StatusDef {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(&tag)
    }

    pub fn has_any_tag(&self, tags: &[&str]) -> bool {
        tags.iter().any(|t| self.has_tag(t))
    }

    pub fn overrules(&self, status_id: &str) -> bool {
        self.overrules.contains(&status_id)
    }
}

impl fmt::Debug for StatusDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusDef")
            .field("id", &self.id)
            .field("tags", &self.tags)
            .field("overrules", &self.overrules)
            .finish()
    }
}

/// Private state of one status instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum StatusState {
    #[default]
    Stateless,
    Turns {
        turns_left: i32,
    },
    Actions {
        actions_taken: u32,
    },
    Multiplier {
        multiplier: f64,
    },
    Crackdown {
        last_category: Option<String>,
        multiplier: f64,
    },
    FinalStand {
        fatigue: f64,
        knockback: u32,
    },
    Protect {
        multiplier: f64,
        loss_per_hit: f64,
    },
    Undead {
        allow_death: bool,
    },
    Sleep {
        wake_chance: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusInstance {
    pub serial: u64,
    pub id: String,
    pub state: StatusState,
}

/// Handle passed to every status hook
pub struct StatusCx<'a> {
    pub battle: &'a mut Battle,
    pub unit: UnitRef,
    pub serial: u64,
    pub status_id: &'static str,
}

impl<'a> StatusCx<'a> {
    /// This instance's state, or `None` once it has been lifted
    pub fn state(&mut self) -> Option<&mut StatusState> {
        self.battle.status_state_mut(self.unit, self.serial)
    }

    pub fn set_state(&mut self, state: StatusState) {
        if let Some(slot) = self.state() {
            *slot = state;
        }
    }

    pub fn config(&self) -> BattleConfig {
        self.battle.config()
    }

    pub fn bonus(&self) -> f64 {
        self.battle.config().bonus_multiplier
    }

    /// The owner's vitality at its current level
    pub fn vitality(&self) -> f64 {
        let unit = self.battle.unit(self.unit);
        stat_value(unit.base_stat(StatId::Vit), unit.level()) as f64
    }

    pub fn lift_self(&mut self) -> Result<bool> {
        self.battle.lift_status(self.unit, self.status_id)
    }

    /// Decrement a `Turns` counter; true once it has run out
    pub fn count_down(&mut self) -> bool {
        match self.state() {
            Some(StatusState::Turns { turns_left }) => {
                *turns_left -= 1;
                *turns_left <= 0
            }
            _ => false,
        }
    }
}

/// Status definitions by id
pub struct StatusRegistry {
    defs: AHashMap<String, StatusDef>,
}

impl StatusRegistry {
    pub fn empty() -> Self {
        Self {
            defs: AHashMap::new(),
        }
    }

    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        for def in crate::effects::statuses::builtin_statuses() {
            registry.register(def);
        }
        registry
    }

    pub fn register(&mut self, def: StatusDef) {
        self.defs.insert(def.id.to_string(), def);
    }

    pub fn get(&self, id: &str) -> Option<&StatusDef> {
        self.defs.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.defs.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}
