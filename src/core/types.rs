//! Core identifier types shared across the engine

use serde::{Deserialize, Serialize};

/// Index of a combatant in the battle roster
///
/// Units are never removed from the roster during a battle, so a
/// `UnitRef` stays valid until the battle is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitRef(pub usize);

/// Index of a resource pool owned by the battle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoolRef(pub usize);

/// Battle cycle counter
pub type Tick = u64;

/// Which roster a combatant belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Party,
    Enemy,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Party => Side::Enemy,
            Side::Enemy => Side::Party,
        }
    }
}

/// Growable combatant attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StatId {
    #[serde(rename = "vit")]
    Vit,
    #[serde(rename = "str")]
    Str,
    #[serde(rename = "def")]
    Def,
    #[serde(rename = "foc")]
    Foc,
    #[serde(rename = "mag")]
    Mag,
    #[serde(rename = "agi")]
    Agi,
}

impl StatId {
    pub const ALL: [StatId; 6] = [
        StatId::Vit,
        StatId::Str,
        StatId::Def,
        StatId::Foc,
        StatId::Mag,
        StatId::Agi,
    ];

    pub fn index(self) -> usize {
        match self {
            StatId::Vit => 0,
            StatId::Str => 1,
            StatId::Def => 2,
            StatId::Foc => 3,
            StatId::Mag => 4,
            StatId::Agi => 5,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            StatId::Vit => "vitality",
            StatId::Str => "strength",
            StatId::Def => "defense",
            StatId::Foc => "focus",
            StatId::Mag => "magic",
            StatId::Agi => "agility",
        }
    }
}
