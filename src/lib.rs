//! Saga Battle - conditional turn-based battle engine

pub mod battle;
pub mod combat;
pub mod content;
pub mod core;
pub mod effects;

pub use battle::{Battle, BattleMode, BattleResult, PartyMemberSetup, PartySetup};
pub use content::ContentRegistry;
pub use core::config::BattleConfig;
pub use core::error::{BattleError, Result};
pub use core::rng::{BattleRng, FixedRng, SeededRng};
pub use core::types::{Side, StatId, UnitRef};
