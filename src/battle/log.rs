//! Structured record of what happened during a battle

use serde::{Deserialize, Serialize};

use crate::combat::stance::Stance;
use crate::core::error::Result;
use crate::core::types::{Tick, UnitRef};

/// Battle result; set once, never reverts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleResult {
    Win,
    Flee,
    Lose,
}

/// Log entry for battle events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleEvent {
    pub cycle: Tick,
    pub event_type: BattleEventType,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BattleEventType {
    BattleStarted { encounter: String },
    CycleStarted,
    EnemySpawned { unit: UnitRef },
    TurnStarted { unit: UnitRef },
    TurnSkipped { unit: UnitRef },
    AwaitingInput { unit: UnitRef, stance: Stance },
    StanceChanged { unit: UnitRef, stance: Stance },
    ActionAnnounced { unit: UnitRef, text: String },
    Evaded { unit: UnitRef, attacker: UnitRef },
    Damaged { unit: UnitRef, amount: u32, tags: Vec<String> },
    Healed { unit: UnitRef, amount: u32 },
    DeathSuspended { unit: UnitRef },
    UnitKilled { unit: UnitRef },
    Revived { unit: UnitRef },
    StatusAdded { unit: UnitRef, status: String },
    StatusBlocked { unit: UnitRef, status: String },
    StatusLifted { unit: UnitRef, status: String },
    ConditionInstalled { condition: String },
    ConditionCancelled { condition: String },
    ConditionLifted { condition: String },
    PhaseChanged { unit: UnitRef, phase: u32, last_phase: u32 },
    MoveDiscarded { unit: UnitRef, usable: String },
    BattleEnded { result: BattleResult },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BattleEventLog {
    pub events: Vec<BattleEvent>,
}

impl BattleEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event_type: BattleEventType, description: String, cycle: Tick) {
        self.events.push(BattleEvent {
            cycle,
            event_type,
            description,
        });
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BattleEvent> {
        self.events.iter()
    }

    /// Number of events matching a predicate
    pub fn count(&self, pred: impl Fn(&BattleEventType) -> bool) -> usize {
        self.events.iter().filter(|e| pred(&e.event_type)).count()
    }

    /// One JSON object per line, for replay tooling
    pub fn to_json_lines(&self) -> Result<String> {
        let mut out = String::new();
        for event in &self.events {
            out.push_str(&serde_json::to_string(event)?);
            out.push('\n');
        }
        Ok(out)
    }
}
