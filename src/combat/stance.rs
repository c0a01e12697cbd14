//! Combat stance system
//!
//! Stances change how incoming and outgoing actions resolve. A unit's
//! stance only changes at well-defined points: its own turn start, the
//! end of a cycle, or a guard being broken.

use serde::{Deserialize, Serialize};

/// Combat stance - every combatant is always in exactly one stance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Stance {
    /// Normal fighting stance
    #[default]
    Attack,
    /// Reduced damage taken, guardable statuses blocked
    Guard,
    /// Free retaliation at the end of the cycle
    Counter,
    /// Next move gets a charge-up action and doubled power
    Charge,
}

impl Stance {
    /// Does this stance reduce damage from attackers?
    pub fn reduces_damage(&self) -> bool {
        !matches!(self, Stance::Attack)
    }

    pub fn blocks_guardable(&self) -> bool {
        matches!(self, Stance::Guard)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Stance::Attack => "Attack",
            Stance::Guard => "Guard",
            Stance::Counter => "Counter",
            Stance::Charge => "Charge",
        }
    }
}

/// Events that trigger stance transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StanceTrigger {
    /// The unit's countdown reached zero
    TurnStarted,
    /// The unit chose to guard
    GuardRaised,
    /// A hit landed through the guard
    GuardBroken,
    /// A melee attack missed a guarding unit
    MeleeEvaded,
    /// The free counterattack was performed
    CounterSpent,
}

/// Stance transition rules (state machine)
pub struct StanceTransitions;

impl StanceTransitions {
    pub fn new() -> Self {
        Self
    }

    /// Apply a transition trigger to get the next stance
    pub fn apply(&self, current: Stance, trigger: StanceTrigger) -> Stance {
        use Stance::*;
        use StanceTrigger::*;

        match (current, trigger) {
            // Guard lasts until the unit's own next turn
            (Guard, TurnStarted) => Attack,
            (Counter, TurnStarted) => Attack,

            (_, GuardRaised) => Guard,
            (Guard, GuardBroken) => Attack,
            (Guard, MeleeEvaded) => Counter,
            (Counter, CounterSpent) => Attack,

            // No change for invalid transitions
            _ => current,
        }
    }
}

impl Default for StanceTransitions {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_attack_takes_full_damage() {
        assert!(!Stance::Attack.reduces_damage());
        assert!(Stance::Guard.reduces_damage());
        assert!(Stance::Counter.reduces_damage());
        assert!(Stance::Charge.reduces_damage());
    }

    #[test]
    fn test_guard_lapses_at_turn_start() {
        let transitions = StanceTransitions::new();
        let next = transitions.apply(Stance::Guard, StanceTrigger::TurnStarted);
        assert_eq!(next, Stance::Attack);
    }

    #[test]
    fn test_counter_cycle() {
        let transitions = StanceTransitions::new();

        let stance = transitions.apply(Stance::Attack, StanceTrigger::GuardRaised);
        assert_eq!(stance, Stance::Guard);

        let stance = transitions.apply(stance, StanceTrigger::MeleeEvaded);
        assert_eq!(stance, Stance::Counter);

        let stance = transitions.apply(stance, StanceTrigger::CounterSpent);
        assert_eq!(stance, Stance::Attack);
    }

    #[test]
    fn test_invalid_transitions_are_ignored() {
        let transitions = StanceTransitions::new();
        assert_eq!(
            transitions.apply(Stance::Attack, StanceTrigger::MeleeEvaded),
            Stance::Attack
        );
        assert_eq!(
            transitions.apply(Stance::Charge, StanceTrigger::GuardBroken),
            Stance::Charge
        );
    }
}
