//! Event payloads passed to status and field condition hooks
//!
//! Hooks receive the payload by `&mut` and may rewrite it. Setting
//! `cancel` is the only way to stop the triggering state change.

use crate::combat::info::BattlerInfo;
use crate::combat::stance::Stance;
use crate::content::action::Action;
use crate::core::types::UnitRef;

pub fn has_tag(tags: &[String], tag: &str) -> bool {
    tags.iter().any(|t| t == tag)
}

pub fn has_any_tag(tags: &[String], wanted: &[&str]) -> bool {
    wanted.iter().any(|w| has_tag(tags, w))
}

/// Build an owned tag list from literals
pub fn tags(list: &[&str]) -> Vec<String> {
    list.iter().map(|t| t.to_string()).collect()
}

#[derive(Debug, Clone, Default)]
pub struct TurnEvent {
    pub skip_turn: bool,
}

#[derive(Debug, Clone)]
pub struct EndTurnEvent {
    pub acting_unit: UnitRef,
}

#[derive(Debug, Clone)]
pub struct ActingEvent {
    pub action: Action,
    pub targets_info: Vec<BattlerInfo>,
    pub skill_category: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AttackedEvent {
    pub acting_unit: UnitRef,
    pub acting_unit_info: BattlerInfo,
    pub stance: Stance,
    pub action: Action,
}

#[derive(Debug, Clone)]
pub struct AimingEvent {
    pub action: Action,
    pub aim_rate: f64,
    pub target_info: BattlerInfo,
}

#[derive(Debug, Clone)]
pub struct DamageEvent {
    pub unit: UnitRef,
    pub amount: f64,
    pub tags: Vec<String>,
    pub acting_unit: Option<UnitRef>,
    pub cancel: bool,
}

#[derive(Debug, Clone)]
pub struct HealEvent {
    pub unit: UnitRef,
    pub amount: f64,
    pub tags: Vec<String>,
    pub cancel: bool,
}

#[derive(Debug, Clone)]
pub struct AfflictEvent {
    pub unit: UnitRef,
    pub status_id: String,
    pub cancel: bool,
}

#[derive(Debug, Clone)]
pub struct CureEvent {
    pub unit: UnitRef,
    pub status_id: String,
    pub cancel: bool,
}

#[derive(Debug, Clone)]
pub struct DyingEvent {
    pub unit: UnitRef,
    pub cancel: bool,
}

#[derive(Debug, Clone)]
pub struct ActionTakenEvent {
    pub acting_unit: UnitRef,
    pub action: Action,
    pub targets: Vec<UnitRef>,
}

#[derive(Debug, Clone)]
pub struct ConditionInstalledEvent {
    pub condition_id: String,
    pub cancel: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_queries() {
        let list = tags(&["fire", "special"]);
        assert!(has_tag(&list, "fire"));
        assert!(!has_tag(&list, "ice"));
        assert!(has_any_tag(&list, &["ice", "special"]));
        assert!(!has_any_tag(&list, &["ice", "zombie"]));
    }
}
