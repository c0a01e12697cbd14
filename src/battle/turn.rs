//! Frame driver and the CTB cycle
//!
//! One call to `update` advances the battle by at most one cycle. A
//! cycle ticks every unit in roster order until somebody acts, then gives
//! Counter-stance units their free move and applies pending stances.
//!
//! A player turn that has no move yet parks itself in `pending_input` and
//! keeps the battle suspended; the cycle cursor stays where it was so the
//! next frame picks up exactly where this one stopped.

use std::sync::Arc;

use crate::battle::ai::AiEvent;
use crate::battle::engine::{BattleMode, CycleStage, PendingInput};
use crate::battle::log::{BattleEventType, BattleResult};
use crate::battle::usable::ChosenMove;
use crate::battle::Battle;
use crate::combat::formulas;
use crate::combat::stance::{Stance, StanceTransitions, StanceTrigger};
use crate::content::action::{Action, EffectKind};
use crate::core::error::{BattleError, Result};
use crate::core::types::{StatId, UnitRef};
use crate::effects::events::{ActingEvent, EndTurnEvent, TurnEvent};

/// Outcome of ticking one unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnitTick {
    Idle,
    Acted,
    AwaitingInput,
}

impl Battle {
    /// Advance one frame; false once the battle is over and torn down
    pub fn update(&mut self) -> Result<bool> {
        match self.mode {
            BattleMode::Setup => self.start()?,
            BattleMode::Battle => self.tick()?,
            BattleMode::Finished => return Ok(false),
        }
        if self.result.is_some() {
            self.dispose();
            return Ok(false);
        }
        Ok(true)
    }

    /// Drive frames until the battle ends or `max_frames` run out
    pub fn run(&mut self, max_frames: usize) -> Result<Option<BattleResult>> {
        for _ in 0..max_frames {
            if !self.update()? {
                break;
            }
        }
        Ok(self.result)
    }

    fn start(&mut self) -> Result<()> {
        let content = Arc::clone(&self.content);
        let encounter = content.encounter(self.encounter_id())?;
        let heading = if encounter.is_final_battle {
            "Final Battle: "
        } else {
            "Boss Battle: "
        };
        let title = encounter.title.as_ref().map(|t| format!("{}{}", heading, t));
        tracing::info!(encounter = %self.encounter_id(), title = ?title, "start battle engine");
        self.presenter.battle_started(title.as_deref());
        for unit in self.turn_order() {
            self.animate(unit, "enter");
        }
        let forecast = self.predict_turns(None, &[]);
        self.presenter.turn_preview(&forecast);
        self.log_event(
            BattleEventType::BattleStarted {
                encounter: self.encounter_id().to_string(),
            },
            title.unwrap_or_else(|| format!("battle '{}' started", self.encounter_id())),
        );
        self.mode = BattleMode::Battle;
        Ok(())
    }

    /// One CTB cycle step
    ///
    /// No-op while suspended or after the result is in. A parked player
    /// turn is polled first and the cycle only continues once it resolves.
    pub fn tick(&mut self) -> Result<()> {
        if self.result.is_some() {
            return Ok(());
        }
        if let Some(pending) = self.pending_input {
            if !self.resume_input(pending)? || self.result.is_some() {
                return Ok(());
            }
        } else if self.is_suspended() {
            return Ok(());
        }
        if self.cycle.is_none() {
            self.begin_cycle()?;
        }
        self.run_cycle()
    }

    fn begin_cycle(&mut self) -> Result<()> {
        self.timer += 1;
        tracing::debug!(cycle = self.timer, "begin CTB turn cycle");
        self.log_event(BattleEventType::CycleStarted, format!("cycle {}", self.timer));
        for unit in self.turn_order() {
            self.begin_unit_cycle(unit)?;
        }
        self.raise_battle_event(|h| h.begin_cycle, &mut ())?;
        self.cycle = Some(CycleStage::Units {
            next: 0,
            acted: false,
        });
        Ok(())
    }

    /// Per-cycle upkeep of one unit: status hooks, then MP regeneration
    fn begin_unit_cycle(&mut self, unit: UnitRef) -> Result<()> {
        if !self.units[unit.0].is_alive() {
            return Ok(());
        }
        self.raise_unit_event(unit, |h| h.begin_cycle, &mut ())?;
        let divisor = self.config().mp_regen_divisor.max(1.0);
        let regen = (self.unit_info(unit).stat_average().round() / divisor).round() as u32;
        self.restore_mp(unit, regen);
        Ok(())
    }

    fn run_cycle(&mut self) -> Result<()> {
        loop {
            match self.cycle {
                Some(CycleStage::Units { next, acted }) => {
                    let order = self.turn_order();
                    if next >= order.len() {
                        if self.check_result() {
                            self.cycle = None;
                            return Ok(());
                        }
                        self.cycle = Some(if acted {
                            CycleStage::EndCycle { next: 0 }
                        } else {
                            CycleStage::Units {
                                next: 0,
                                acted: false,
                            }
                        });
                        continue;
                    }
                    self.cycle = Some(CycleStage::Units {
                        next: next + 1,
                        acted,
                    });
                    match self.tick_unit(order[next])? {
                        UnitTick::Idle => {}
                        UnitTick::Acted => {
                            self.mark_cycle_acted();
                            if self.check_result() {
                                self.cycle = None;
                                return Ok(());
                            }
                        }
                        UnitTick::AwaitingInput => {
                            self.mark_cycle_acted();
                            return Ok(());
                        }
                    }
                }
                Some(CycleStage::EndCycle { next }) => {
                    let order = self.turn_order();
                    if next >= order.len() {
                        self.cycle = None;
                        return Ok(());
                    }
                    self.cycle = Some(CycleStage::EndCycle { next: next + 1 });
                    if self.end_cycle_for(order[next])? {
                        return Ok(());
                    }
                    if self.check_result() {
                        self.cycle = None;
                        return Ok(());
                    }
                }
                None => return Ok(()),
            }
        }
    }

    /// Flag the current pass as acted without moving the cursor, which a
    /// mid-turn spawn may already have shifted
    fn mark_cycle_acted(&mut self) {
        if let Some(CycleStage::Units { acted, .. }) = &mut self.cycle {
            *acted = true;
        }
    }

    /// Count a unit down and run its turn when it reaches zero
    fn tick_unit(&mut self, unit: UnitRef) -> Result<UnitTick> {
        if !self.units[unit.0].is_alive() {
            return Ok(UnitTick::Idle);
        }
        let target = &mut self.units[unit.0];
        target.cv = target.cv.saturating_sub(1);
        if target.cv > 0 {
            return Ok(UnitTick::Idle);
        }

        self.suspend();
        self.expire_stance(unit)?;
        tracing::debug!(unit = %self.units[unit.0].name, "turn is up");
        self.log_event(
            BattleEventType::TurnStarted { unit },
            format!("{}'s turn is up", self.units[unit.0].name),
        );
        self.animate(unit, "active");
        self.notify_ais(&AiEvent::UnitReady { unit })?;

        let mut event = TurnEvent::default();
        self.raise_unit_event(unit, |h| h.begin_turn, &mut event)?;
        if !self.units[unit.0].is_alive() {
            self.resume();
            return Ok(UnitTick::Acted);
        }
        if event.skip_turn {
            self.clear_queue(unit);
            tracing::debug!(unit = %self.units[unit.0].name, "turn skipped");
            self.log_event(
                BattleEventType::TurnSkipped { unit },
                format!("{}'s turn was skipped", self.units[unit.0].name),
            );
            let rank = self.config().default_move_rank;
            self.reset_counter(unit, rank, false);
            self.resume();
            return Ok(UnitTick::Acted);
        }

        if let Some(action) = self.units[unit.0].action_queue.pop_front() {
            self.finish_turn(unit, Some(action))?;
            return Ok(UnitTick::Acted);
        }

        if !self.units[unit.0].has_ai() {
            let forecast = self.predict_turns(Some(unit), &[]);
            self.presenter.turn_preview(&forecast);
            tracing::debug!(unit = %self.units[unit.0].name, "asking player for next move");
        }
        match self.next_move(unit, Stance::Attack)? {
            Some(chosen) => {
                self.commit_move(unit, chosen)?;
                Ok(UnitTick::Acted)
            }
            None => {
                self.park_input(PendingInput::Turn(unit));
                Ok(UnitTick::AwaitingInput)
            }
        }
    }

    /// Guard lapses when the unit's turn comes back around
    fn expire_stance(&mut self, unit: UnitRef) -> Result<()> {
        let transitions = StanceTransitions::new();
        let stance = self.units[unit.0].stance;
        let next = transitions.apply(stance, StanceTrigger::TurnStarted);
        match stance {
            Stance::Guard => {
                let target = &mut self.units[unit.0];
                target.stance = next;
                target.new_stance = next;
                tracing::debug!(unit = %target.name, "guard stance expired");
                self.announce_stance(unit)?;
            }
            Stance::Counter => self.units[unit.0].new_stance = next,
            _ => {}
        }
        Ok(())
    }

    pub(crate) fn announce_stance(&mut self, unit: UnitRef) -> Result<()> {
        let stance = self.units[unit.0].stance;
        tracing::info!(unit = %self.units[unit.0].name, stance = stance.name(), "stance changed");
        self.log_event(
            BattleEventType::StanceChanged { unit, stance },
            format!("{} is now in {} Stance", self.units[unit.0].name, stance.name()),
        );
        self.notify_ais(&AiEvent::StanceChanged { unit, stance })
    }

    /// Ask the AI or the move selector for a move
    fn next_move(&mut self, unit: UnitRef, stance: Stance) -> Result<Option<ChosenMove>> {
        if self.units[unit.0].has_ai() {
            return self.ai_next_move(unit);
        }
        let Some(mut selector) = self.selector.take() else {
            return Err(BattleError::NoMoveSelector(self.units[unit.0].name.clone()));
        };
        let chosen = selector.poll_move(self, unit, stance);
        self.selector = Some(selector);
        Ok(chosen)
    }

    fn park_input(&mut self, pending: PendingInput) {
        tracing::debug!(unit = %self.units[pending.unit().0].name, stance = pending.stance().name(), "awaiting player input");
        self.log_event(
            BattleEventType::AwaitingInput {
                unit: pending.unit(),
                stance: pending.stance(),
            },
            format!("waiting on {}'s move", self.units[pending.unit().0].name),
        );
        self.pending_input = Some(pending);
    }

    /// Poll the selector for a parked turn; true once it resolved
    fn resume_input(&mut self, pending: PendingInput) -> Result<bool> {
        let unit = pending.unit();
        let Some(chosen) = self.next_move(unit, pending.stance())? else {
            return Ok(false);
        };
        self.pending_input = None;
        match pending {
            PendingInput::Turn(_) => self.commit_move(unit, chosen)?,
            PendingInput::Counter(_) => self.finish_counter(unit, chosen)?,
        }
        if self.check_result() {
            self.cycle = None;
        }
        Ok(true)
    }

    /// Carry out a freshly chosen move and close the turn
    fn commit_move(&mut self, unit: UnitRef, chosen: ChosenMove) -> Result<()> {
        if chosen.stance == Stance::Guard {
            self.set_guard(unit)?;
            return self.finish_turn(unit, None);
        }
        let has_usable = chosen.usable.is_some();
        self.queue_move(unit, chosen)?;
        let action = self.units[unit.0].action_queue.pop_front();
        if action.is_none() && !has_usable {
            let rank = self.config().default_move_rank;
            self.reset_counter(unit, rank, false);
        }
        self.finish_turn(unit, action)
    }

    fn set_guard(&mut self, unit: UnitRef) -> Result<()> {
        let transitions = StanceTransitions::new();
        tracing::debug!(unit = %self.units[unit.0].name, "will switch to Guard Stance");
        self.announce(unit, "Guard");
        let target = &mut self.units[unit.0];
        target.new_stance = transitions.apply(target.stance, StanceTrigger::GuardRaised);
        let rank = self.config().stance_change_rank;
        self.reset_counter(unit, rank, false);
        Ok(())
    }

    fn finish_turn(&mut self, unit: UnitRef, action: Option<Action>) -> Result<()> {
        if self.units[unit.0].is_alive() {
            if let Some(action) = action {
                self.perform_action(unit, action)?;
            }
            self.raise_unit_event(unit, |h| h.end_turn, &mut ())?;
        }
        let mut event = EndTurnEvent { acting_unit: unit };
        self.raise_battle_event(|h| h.end_turn, &mut event)?;
        self.animate(unit, "dormant");
        tracing::debug!(unit = %self.units[unit.0].name, "end of turn");
        self.resume();
        Ok(())
    }

    /// End-of-cycle processing for one unit; true if it is waiting on input
    fn end_cycle_for(&mut self, unit: UnitRef) -> Result<bool> {
        if !self.units[unit.0].is_alive() {
            return Ok(false);
        }
        if self.units[unit.0].stance != Stance::Counter {
            return self.apply_pending_stance(unit).map(|_| false);
        }

        self.units[unit.0].cv = 0;
        self.suspend();
        if self.units[unit.0].has_ai() {
            let Some(mut chosen) = self.ai_next_move(unit)? else {
                self.resume();
                return Ok(false);
            };
            chosen.targets = self.units[unit.0].counter_target.into_iter().collect();
            self.finish_counter(unit, chosen)?;
            return Ok(false);
        }

        self.animate(unit, "active");
        let forecast = self.predict_turns(Some(unit), &[]);
        self.presenter.turn_preview(&forecast);
        tracing::debug!(unit = %self.units[unit.0].name, "asking player for counterattack");
        match self.next_move(unit, Stance::Counter)? {
            Some(chosen) => {
                self.finish_counter(unit, chosen)?;
                Ok(false)
            }
            None => {
                self.park_input(PendingInput::Counter(unit));
                Ok(true)
            }
        }
    }

    fn finish_counter(&mut self, unit: UnitRef, chosen: ChosenMove) -> Result<()> {
        self.queue_move(unit, chosen)?;
        if let Some(action) = self.units[unit.0].action_queue.pop_front() {
            self.perform_action(unit, action)?;
        }
        self.animate(unit, "dormant");
        let transitions = StanceTransitions::new();
        let target = &mut self.units[unit.0];
        target.new_stance = transitions.apply(Stance::Counter, StanceTrigger::CounterSpent);
        target.counter_target = None;
        self.resume();
        self.apply_pending_stance(unit)
    }

    fn apply_pending_stance(&mut self, unit: UnitRef) -> Result<()> {
        let target = &mut self.units[unit.0];
        if target.new_stance == target.stance {
            return Ok(());
        }
        target.stance = target.new_stance;
        self.announce_stance(unit)
    }

    /// Expand a move into queued actions
    ///
    /// Group casts are retargeted at every ally of the first target and a
    /// dead single target is swapped for a living ally of it.
    pub(crate) fn queue_move(&mut self, unit: UnitRef, mut chosen: ChosenMove) -> Result<()> {
        let Some(usable) = chosen.usable.clone() else {
            self.units[unit.0].move_used = Some(chosen);
            return Ok(());
        };
        let traits = self.move_traits(&usable)?;
        if let Some(&first) = chosen.targets.first() {
            let allies = self.allies_of(first).to_vec();
            let alive: Vec<UnitRef> = allies
                .iter()
                .copied()
                .filter(|&u| self.units[u.0].is_alive())
                .collect();
            if traits.target_type.is_group_cast() {
                chosen.targets = if traits.allow_dead_target { allies } else { alive };
            } else if !self.units[first.0].is_alive()
                && !traits.allow_dead_target
                && !alive.is_empty()
            {
                chosen.targets[0] = alive[self.rng.index(alive.len())];
            }
        }

        let mut actions = self.use_usable(unit, &usable, chosen.stance, &chosen.targets)?;
        if chosen.stance == Stance::Charge {
            let content = Arc::clone(&self.content);
            let charge = content.skill(&content.charge_skill)?;
            if let Some(first) = charge.actions.first() {
                actions.insert(0, first.clone());
            }
            for effect in actions.iter_mut().flat_map(|a| a.effects.iter_mut()) {
                if effect.power().is_none() {
                    continue;
                }
                effect.scale_power(2.0);
                if let EffectKind::Damage { status_chance, .. } | EffectKind::Heal { status_chance, .. } =
                    &mut effect.kind
                {
                    *status_chance = Some(100.0);
                }
            }
        }

        let ranks: Vec<u32> = actions.iter().map(|a| a.rank).collect();
        let forecast = self.predict_turns(Some(unit), &ranks);
        self.presenter.turn_preview(&forecast);
        if !actions.is_empty() {
            tracing::debug!(
                unit = %self.units[unit.0].name,
                count = actions.len(),
                usable = %self.usable_name(&usable)?,
                "queued actions"
            );
        }
        let target = &mut self.units[unit.0];
        target.action_queue.extend(actions);
        target.move_used = Some(chosen);
        Ok(())
    }

    /// Run one queued action against the targets of the move it came from
    pub(crate) fn perform_action(&mut self, unit: UnitRef, action: Action) -> Result<()> {
        let chosen = self.units[unit.0].move_used.clone();
        let targets = chosen.as_ref().map(|c| c.targets.clone()).unwrap_or_default();
        let traits = match chosen.as_ref().and_then(|c| c.usable.as_ref()) {
            Some(usable) => Some(self.move_traits(usable)?),
            None => None,
        };
        let use_aiming = traits.as_ref().map_or(true, |t| t.use_aiming);
        let gives_experience = traits.as_ref().is_some_and(|t| t.gives_experience);

        let mut event = ActingEvent {
            action,
            targets_info: targets.iter().map(|&t| self.unit_info(t)).collect(),
            skill_category: traits.and_then(|t| t.category),
        };
        self.raise_unit_event(unit, |h| h.acting, &mut event)?;
        let mut action = event.action;
        if !self.units[unit.0].is_alive() {
            return Ok(());
        }
        if self.units[unit.0].stance == Stance::Counter {
            action.accuracy_rate = self.config().counter_accuracy_rate;
        }

        let hit = self.run_action(&action, unit, &targets, use_aiming)?;
        if gives_experience && !hit.is_empty() {
            let config = self.config();
            let mut experience = [0u64; 6];
            for &victim in &hit {
                if self.units[victim.0].is_alive() || !self.are_enemies(unit, victim) {
                    continue;
                }
                let info = self.unit_info(victim);
                for id in StatId::ALL {
                    experience[id.index()] += formulas::stat_experience(&config, id, &info);
                }
            }
            for id in StatId::ALL {
                let gained = experience[id.index()];
                if gained == 0 {
                    continue;
                }
                let target = &mut self.units[unit.0];
                if target.stats[id.index()].grow(gained) {
                    tracing::debug!(unit = %target.name, stat = id.name(), value = target.stats[id.index()].value(), "stat grew");
                }
            }
        }
        self.reset_counter(unit, action.rank, false);
        Ok(())
    }

    /// Decide the battle if either side is wiped; party wipe wins ties
    pub(crate) fn check_result(&mut self) -> bool {
        if self.result.is_some() {
            return true;
        }
        let wiped = |units: &[UnitRef]| units.iter().all(|u| !self.units[u.0].is_alive());
        let party_wiped = wiped(&self.player_units);
        let enemies_wiped = wiped(&self.enemy_units);
        if party_wiped {
            tracing::info!("all player characters have been KO'd");
            self.finish(BattleResult::Lose);
        } else if enemies_wiped {
            tracing::info!("all enemies have been KO'd");
            self.finish(BattleResult::Win);
        }
        self.result.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::engine::{PartyMemberSetup, PartySetup};
    use crate::battle::interface::ScriptedSelector;
    use crate::battle::testing::{sample_content, FrameDriverExt};
    use crate::content::action::{AccuracyType, DamageType, Effect};
    use crate::core::rng::FixedRng;

    fn duel(selector: Option<ScriptedSelector>) -> Battle {
        let party = PartySetup::new(vec![PartyMemberSetup::new("scott", 10)]);
        let battle = Battle::new(
            sample_content(),
            "dummyFight",
            &party,
            Box::new(FixedRng::new(0.0)),
        )
        .unwrap();
        match selector {
            Some(selector) => battle.with_move_selector(Box::new(selector)),
            None => battle,
        }
    }

    fn autopilot(encounter: &str, characters: &[&str]) -> Battle {
        let members = characters
            .iter()
            .map(|&id| PartyMemberSetup::new(id, 10).with_autopilot("basic"))
            .collect();
        Battle::new(
            sample_content(),
            encounter,
            &PartySetup::new(members),
            Box::new(FixedRng::new(0.0)),
        )
        .unwrap()
    }

    #[test]
    fn test_first_update_starts_battle() {
        let mut battle = duel(Some(ScriptedSelector::new()));
        assert_eq!(battle.mode(), BattleMode::Setup);
        assert!(battle.update().unwrap());
        assert_eq!(battle.mode(), BattleMode::Battle);
        assert_eq!(battle.timer(), 0);
    }

    #[test]
    fn test_player_turn_waits_for_input() {
        let selector = ScriptedSelector::new();
        let mut battle = duel(Some(selector.clone()));
        for _ in 0..50 {
            battle.update().unwrap();
            if battle.pending_input().is_some() {
                break;
            }
        }
        let pending = battle.pending_input().expect("player turn never came up");
        assert!(battle.is_suspended());
        let cycle = battle.timer();

        battle.update().unwrap();
        assert_eq!(battle.timer(), cycle);
        assert_eq!(battle.pending_input(), Some(pending));

        let dummy = battle.enemy_units()[0];
        selector.push(ChosenMove::skill("swordSlash", 10, vec![dummy]));
        battle.update().unwrap();
        assert!(battle.pending_input().is_none());
        assert!(battle.unit(dummy).hp() < battle.unit(dummy).max_hp());
    }

    #[test]
    fn test_missing_selector_is_an_error() {
        let mut battle = duel(None);
        let mut outcome = Ok(true);
        for _ in 0..50 {
            outcome = battle.update();
            if outcome.is_err() {
                break;
            }
        }
        assert!(matches!(outcome, Err(BattleError::NoMoveSelector(_))));
    }

    #[test]
    fn test_guard_lapses_on_next_turn() {
        let selector = ScriptedSelector::with_moves([ChosenMove::guard()]);
        let mut battle = duel(Some(selector));
        let scott = battle.player_units()[0];
        assert!(battle.wait_for_input(200));

        let raised = battle.log().count(|e| {
            matches!(e, BattleEventType::StanceChanged { unit, stance: Stance::Guard } if *unit == scott)
        });
        assert_eq!(raised, 1);
        assert_eq!(battle.unit(scott).stance(), Stance::Attack);
    }

    #[test]
    fn test_party_wipe_is_a_loss() {
        let mut battle = duel(Some(ScriptedSelector::new()));
        let scott = battle.player_units()[0];
        battle.die(scott).unwrap();
        battle.update().unwrap();
        battle.update().unwrap();
        assert_eq!(battle.result(), Some(BattleResult::Lose));
        assert_eq!(battle.mode(), BattleMode::Finished);
    }

    #[test]
    fn test_lose_is_checked_before_win() {
        let mut battle = duel(Some(ScriptedSelector::new()));
        for unit in battle.turn_order() {
            battle.die(unit).unwrap();
        }
        assert!(battle.check_result());
        assert_eq!(battle.result(), Some(BattleResult::Lose));
    }

    #[test]
    fn test_charge_doubles_power() {
        let mut battle = duel(Some(ScriptedSelector::new()));
        let scott = battle.player_units()[0];
        let dummy = battle.enemy_units()[0];
        battle
            .queue_move(
                scott,
                ChosenMove::skill("swordSlash", 10, vec![dummy]).in_stance(Stance::Charge),
            )
            .unwrap();
        let queue = &battle.unit(scott).action_queue;
        assert_eq!(queue.len(), 2);
        let slash = battle.content().skill("swordSlash").unwrap().actions[0].effects[0]
            .power()
            .unwrap();
        assert_eq!(queue[1].effects[0].power(), Some((slash * 2.0).round()));
    }

    #[test]
    fn test_turn_starts_when_counter_hits_zero() {
        let mut battle = duel(Some(ScriptedSelector::new()));
        let scott = battle.player_units()[0];
        battle.units[scott.0].cv = 3;

        assert_eq!(battle.tick_unit(scott).unwrap(), UnitTick::Idle);
        assert_eq!(battle.unit(scott).cv, 2);
        assert_eq!(battle.tick_unit(scott).unwrap(), UnitTick::Idle);
        assert_eq!(battle.unit(scott).cv, 1);
        assert!(battle.pending_input().is_none());

        assert_eq!(battle.tick_unit(scott).unwrap(), UnitTick::AwaitingInput);
        assert_eq!(battle.unit(scott).cv, 0);
        assert_eq!(battle.pending_input(), Some(PendingInput::Turn(scott)));
    }

    #[test]
    fn test_counter_stance_strikes_back_at_cycle_end() {
        let mut battle = autopilot("dummyFight", &["scott"]);
        let scott = battle.player_units()[0];
        let dummy = battle.enemy_units()[0];
        battle.units[scott.0].stance = Stance::Guard;
        battle.units[scott.0].new_stance = Stance::Guard;

        let mut slash = Action::new(2).with_effect(Effect::new(EffectKind::Damage {
            damage_type: DamageType::Sword,
            power: 10.0,
            element: None,
            add_status: None,
            status_chance: None,
            recoil: None,
        }));
        slash.accuracy_type = Some(AccuracyType::Sword);
        slash.is_melee = true;
        battle.run_action(&slash, dummy, &[scott], true).unwrap();
        assert_eq!(battle.unit(scott).stance(), Stance::Counter);
        assert_eq!(battle.unit(scott).counter_target(), Some(dummy));

        assert!(!battle.end_cycle_for(scott).unwrap());
        assert!(battle.unit(dummy).hp() < battle.unit(dummy).max_hp());
        assert_eq!(battle.unit(scott).stance(), Stance::Attack);
        assert_eq!(battle.unit(scott).counter_target(), None);
    }

    #[test]
    fn test_kill_mid_pass_ends_battle_before_later_units() {
        let mut battle = autopilot("munchFight", &["scott", "elysia"]);
        let snack = battle.enemy_units()[0];
        let scott = battle.player_units()[0];
        let elysia = battle.player_units()[1];
        assert!(battle.update().unwrap());

        battle.units[snack.0].cv = 500;
        battle.units[snack.0].hp = 1;
        battle.units[scott.0].cv = 1;
        battle.units[elysia.0].cv = 1;
        assert!(!battle.update().unwrap());

        assert_eq!(battle.result(), Some(BattleResult::Win));
        let turns = |who: UnitRef| {
            battle
                .log()
                .count(|e| matches!(e, BattleEventType::TurnStarted { unit } if *unit == who))
        };
        assert_eq!(turns(scott), 1);
        assert_eq!(turns(elysia), 0);
    }

    #[test]
    fn test_acting_keeps_a_shifted_cursor() {
        let mut battle = duel(Some(ScriptedSelector::new()));
        battle.cycle = Some(CycleStage::Units {
            next: 2,
            acted: false,
        });
        battle.mark_cycle_acted();
        assert_eq!(
            battle.cycle,
            Some(CycleStage::Units {
                next: 2,
                acted: true
            })
        );
    }

    #[test]
    fn test_spawn_mid_cycle_keeps_cursor_on_same_unit() {
        let mut battle = duel(Some(ScriptedSelector::new()));
        let scott = battle.player_units()[0];
        battle.cycle = Some(CycleStage::Units {
            next: 1,
            acted: true,
        });
        battle.spawn_enemy("snack").unwrap();
        assert_eq!(
            battle.cycle,
            Some(CycleStage::Units {
                next: 2,
                acted: true
            })
        );
        assert_eq!(battle.turn_order()[2], scott);

        battle.cycle = Some(CycleStage::EndCycle { next: 0 });
        battle.spawn_enemy("snack").unwrap();
        assert_eq!(battle.cycle, Some(CycleStage::EndCycle { next: 0 }));
    }
}
