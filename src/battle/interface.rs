//! Collaborators the battle talks to but does not own
//!
//! The presenter receives fire-and-forget notifications. The move selector
//! stands in for the player's move menu: it is polled once per frame and
//! returns `None` until the player has made up their mind.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::battle::forecast::TurnForecast;
use crate::battle::log::BattleResult;
use crate::battle::usable::ChosenMove;
use crate::battle::Battle;
use crate::combat::stance::Stance;
use crate::core::types::{PoolRef, Side, UnitRef};

/// HUD, sprites and announcements
///
/// Every method defaults to a no-op so a headless battle needs nothing.
pub trait Presenter {
    fn battle_started(&mut self, _title: Option<&str>) {}
    fn set_hp(&mut self, _unit: UnitRef, _hp: u32, _max_hp: u32) {}
    fn set_mp(&mut self, _pool: PoolRef, _available: u32) {}
    fn show_damage(&mut self, _unit: UnitRef, _amount: u32, _tags: &[String]) {}
    fn show_healing(&mut self, _unit: UnitRef, _amount: u32) {}
    /// Floating text such as "miss", "immune" or "ward"
    fn show_text(&mut self, _unit: UnitRef, _text: &str) {}
    fn animate(&mut self, _unit: UnitRef, _state: &str) {}
    fn announce_action(&mut self, _unit: UnitRef, _side: Side, _text: &str) {}
    fn turn_preview(&mut self, _forecast: &[TurnForecast]) {}
    fn battle_ended(&mut self, _result: BattleResult) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullPresenter;

impl Presenter for NullPresenter {}

/// Source of moves for units without an AI
pub trait MoveSelector {
    fn poll_move(&mut self, battle: &Battle, unit: UnitRef, stance: Stance) -> Option<ChosenMove>;
}

/// Hands out pre-recorded moves in order
///
/// Clones share one script, so a test can keep a handle and push moves
/// while the battle is waiting.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSelector {
    moves: Rc<RefCell<VecDeque<ChosenMove>>>,
}

impl ScriptedSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_moves(moves: impl IntoIterator<Item = ChosenMove>) -> Self {
        let selector = Self::new();
        selector.moves.borrow_mut().extend(moves);
        selector
    }

    pub fn push(&self, chosen: ChosenMove) {
        self.moves.borrow_mut().push_back(chosen);
    }

    pub fn remaining(&self) -> usize {
        self.moves.borrow().len()
    }
}

impl MoveSelector for ScriptedSelector {
    fn poll_move(&mut self, _battle: &Battle, _unit: UnitRef, _stance: Stance) -> Option<ChosenMove> {
        self.moves.borrow_mut().pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_clones_share_queue() {
        let script = ScriptedSelector::new();
        let handle = script.clone();
        handle.push(ChosenMove::guard());
        assert_eq!(script.remaining(), 1);
    }
}
