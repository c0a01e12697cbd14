//! Action resolution
//!
//! An action is resolved against all of its targets at once: every target
//! is told it is being attacked, each one rolls to hit separately and only
//! the targets that were hit receive the action's effects.

use crate::battle::ai::AiEvent;
use crate::battle::log::BattleEventType;
use crate::battle::Battle;
use crate::combat::formulas;
use crate::combat::stance::{Stance, StanceTransitions, StanceTrigger};
use crate::content::action::{Action, TargetHint};
use crate::core::error::Result;
use crate::core::types::{StatId, UnitRef};
use crate::effects::events::{ActionTakenEvent, AimingEvent, AttackedEvent};

impl Battle {
    /// Resolve one action; returns the targets that were hit
    pub fn run_action(
        &mut self,
        action: &Action,
        actor: UnitRef,
        targets: &[UnitRef],
        use_aiming: bool,
    ) -> Result<Vec<UnitRef>> {
        let mut event = ActionTakenEvent {
            acting_unit: actor,
            action: action.clone(),
            targets: targets.to_vec(),
        };
        self.raise_battle_event(|h| h.action_taken, &mut event)?;
        let ActionTakenEvent {
            mut action,
            targets,
            ..
        } = event;

        if let Some(text) = action.announce_as.clone() {
            self.announce(actor, &text);
        }
        for effect in action
            .effects
            .iter()
            .filter(|e| e.target_hint == TargetHint::User && !e.suppressed)
        {
            self.apply_effect(actor, &[actor], effect)?;
        }
        for &target in &targets {
            self.take_hit(target, actor, &mut action)?;
        }
        if action.effects.is_empty() {
            return Ok(Vec::new());
        }

        let mut hit = Vec::new();
        for &target in &targets {
            let base_odds = match action.accuracy_type {
                Some(kind) => formulas::accuracy(kind, &self.unit_info(actor), &self.unit_info(target)),
                None => 1.0,
            };
            let aim_rate = if use_aiming {
                let mut aiming = AimingEvent {
                    action: action.clone(),
                    aim_rate: 1.0,
                    target_info: self.unit_info(target),
                };
                self.raise_unit_event(actor, |h| h.aiming, &mut aiming)?;
                aiming.aim_rate
            } else {
                1.0
            };
            let odds = (base_odds * action.accuracy_rate * aim_rate).clamp(0.0, 1.0);
            let is_hit = self.rng.chance(odds);
            tracing::debug!(
                target = %self.units[target.0].name,
                odds = (odds * 100.0).round(),
                result = if is_hit { "hit" } else { "miss" },
                "hit roll"
            );
            if is_hit {
                self.notify_ais(&AiEvent::UnitTargeted {
                    target,
                    action: action.clone(),
                    attacker: actor,
                })?;
                hit.push(target);
            } else {
                self.evade(target, actor, &action)?;
            }
        }
        if hit.is_empty() {
            return Ok(hit);
        }

        for &target in &hit {
            self.units[target.0].last_attacker = Some(actor);
        }
        for effect in action
            .effects
            .iter()
            .filter(|e| e.target_hint != TargetHint::User && !e.suppressed)
        {
            let chosen = match effect.target_hint {
                TargetHint::Random => vec![hit[self.rng.index(hit.len())]],
                _ => hit.clone(),
            };
            self.apply_effect(actor, &chosen, effect)?;
        }
        for &target in &hit {
            self.units[target.0].last_attacker = None;
        }
        self.grow_defenders(actor, &hit, action.rank);
        Ok(hit)
    }

    /// Party members toughen up from hits they live through
    fn grow_defenders(&mut self, actor: UnitRef, hit: &[UnitRef], rank: u32) {
        let config = self.config();
        let attacker = self.unit_info(actor);
        let experience = formulas::defender_experience(&config, &attacker, rank);
        for &target in hit {
            if !self.are_enemies(actor, target) {
                continue;
            }
            let defender = &mut self.units[target.0];
            if !defender.is_party_member() || !defender.is_alive() {
                continue;
            }
            for id in [StatId::Vit, StatId::Def] {
                defender.stats[id.index()].grow(experience);
            }
        }
    }

    /// Tell a target it is under attack; may break its guard
    pub(crate) fn take_hit(&mut self, target: UnitRef, actor: UnitRef, action: &mut Action) -> Result<()> {
        let mut event = AttackedEvent {
            acting_unit: actor,
            acting_unit_info: self.unit_info(actor),
            stance: self.units[actor.0].stance,
            action: action.clone(),
        };
        self.raise_unit_event(target, |h| h.attacked, &mut event)?;
        *action = event.action;

        if self.units[target.0].stance == Stance::Guard && !action.preserve_guard {
            if action.is_melee {
                action.accuracy_rate = 0.0;
            }
            let transitions = StanceTransitions::new();
            self.units[target.0].new_stance =
                transitions.apply(Stance::Guard, StanceTrigger::GuardBroken);
            tracing::debug!(
                unit = %self.units[target.0].name,
                by = %self.units[actor.0].name,
                "guard stance broken"
            );
            let rank = self.config().guard_break_rank;
            self.reset_counter(target, rank, false);
        }
        Ok(())
    }

    /// A missed attack; a dodged melee blow sets up a counterattack
    pub(crate) fn evade(&mut self, target: UnitRef, actor: UnitRef, action: &Action) -> Result<()> {
        self.presenter.show_text(target, "miss");
        self.log_event(
            BattleEventType::Evaded {
                unit: target,
                attacker: actor,
            },
            format!(
                "{} evaded {}'s attack",
                self.units[target.0].name, self.units[actor.0].name
            ),
        );
        let defender = &mut self.units[target.0];
        if action.is_melee && defender.stance == Stance::Guard && !action.preserve_guard {
            defender.stance = StanceTransitions::new().apply(Stance::Guard, StanceTrigger::MeleeEvaded);
            defender.counter_target = Some(actor);
            self.announce_stance(target)?;
        }
        Ok(())
    }

    pub fn announce(&mut self, unit: UnitRef, text: &str) {
        let side = self.units[unit.0].side;
        self.presenter.announce_action(unit, side, text);
        self.log_event(
            BattleEventType::ActionAnnounced {
                unit,
                text: text.to_string(),
            },
            format!("{}: {}", self.units[unit.0].name, text),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::testing::battle_with;
    use crate::content::action::{AccuracyType, DamageType, Effect, EffectKind};

    fn slash(power: f64) -> Action {
        let mut action = Action::new(2).with_effect(Effect::new(EffectKind::Damage {
            damage_type: DamageType::Sword,
            power,
            element: None,
            add_status: None,
            status_chance: None,
            recoil: None,
        }));
        action.accuracy_type = Some(AccuracyType::Sword);
        action.is_melee = true;
        action
    }

    #[test]
    fn test_hit_applies_damage() {
        let mut battle = battle_with("dummyFight");
        let scott = battle.player_units()[0];
        let dummy = battle.enemy_units()[0];
        let hit = battle.run_action(&slash(10.0), scott, &[dummy], true).unwrap();
        assert_eq!(hit, vec![dummy]);
        assert!(battle.unit(dummy).hp() < battle.unit(dummy).max_hp());
        assert_eq!(battle.unit(dummy).last_attacker, None);
    }

    #[test]
    fn test_melee_into_guard_misses_and_counters() {
        let mut battle = battle_with("dummyFight");
        let scott = battle.player_units()[0];
        let dummy = battle.enemy_units()[0];
        battle.units[scott.0].stance = Stance::Guard;
        battle.units[scott.0].new_stance = Stance::Guard;

        let hit = battle.run_action(&slash(10.0), dummy, &[scott], true).unwrap();
        assert!(hit.is_empty());
        assert_eq!(battle.unit(scott).hp(), battle.unit(scott).max_hp());
        assert_eq!(battle.unit(scott).stance(), Stance::Counter);
        assert_eq!(battle.unit(scott).counter_target(), Some(dummy));
        assert_eq!(battle.unit(scott).pending_stance(), Stance::Attack);
    }

    #[test]
    fn test_preserve_guard_keeps_stance() {
        let mut battle = battle_with("dummyFight");
        let scott = battle.player_units()[0];
        let dummy = battle.enemy_units()[0];
        battle.units[scott.0].stance = Stance::Guard;
        battle.units[scott.0].new_stance = Stance::Guard;
        let mut action = slash(10.0);
        action.preserve_guard = true;

        let hit = battle.run_action(&action, dummy, &[scott], true).unwrap();
        assert_eq!(hit, vec![scott]);
        assert_eq!(battle.unit(scott).pending_stance(), Stance::Guard);
    }

    #[test]
    fn test_action_without_effects_hits_nothing() {
        let mut battle = battle_with("dummyFight");
        let scott = battle.player_units()[0];
        let dummy = battle.enemy_units()[0];
        let hit = battle.run_action(&Action::new(1), scott, &[dummy], true).unwrap();
        assert!(hit.is_empty());
    }

    #[test]
    fn test_announce_is_logged() {
        let mut battle = battle_with("dummyFight");
        let scott = battle.player_units()[0];
        let mut action = slash(1.0);
        action.announce_as = Some("Sword Slash".into());
        let dummy = battle.enemy_units()[0];
        battle.run_action(&action, scott, &[dummy], true).unwrap();
        assert_eq!(
            battle
                .log()
                .count(|e| matches!(e, BattleEventType::ActionAnnounced { text, .. } if text == "Sword Slash")),
            1
        );
    }
}
