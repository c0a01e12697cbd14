//! Battle system - conditional turn-based combat
//!
//! Units wait out a countdown scaled by their agility and the rank of
//! their last move. Whoever reaches zero first acts; ties go to roster
//! order with enemies ahead of the party.
//!
//! Key pieces:
//! - `engine` owns the roster, the shared MP pool and the event log
//! - `turn` drives frames and cycles and parks player turns
//! - `resolution` and `move_effects` resolve actions against targets
//! - `hooks` dispatches status and field condition handlers
//! - `ai` plans enemy (and autopilot) moves in phases

pub mod ai;
pub mod engine;
pub mod forecast;
pub mod hooks;
pub mod interface;
pub mod log;
pub mod move_effects;
pub mod resolution;
pub mod turn;
pub mod unit;
pub mod usable;
pub mod vitals;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports for convenient access
pub use ai::strategies::create_strategy;
pub use ai::{AiCore, AiEvent, AiStrategy};
pub use engine::{Battle, BattleMode, PartyMemberSetup, PartySetup, PendingInput};
pub use forecast::TurnForecast;
pub use interface::{MoveSelector, NullPresenter, Presenter, ScriptedSelector};
pub use log::{BattleEvent, BattleEventLog, BattleEventType, BattleResult};
pub use unit::BattleUnit;
pub use usable::{ChosenMove, Usable};
