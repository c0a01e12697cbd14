//! Enemy AI system for battle decision-making
//!
//! Architecture: core + strategy
//! - `AiCore` owns the move queue, phase tracking and the queueing helpers
//! - `AiStrategy` is the swappable part: it fills the queue and reacts to
//!   battle-wide events
//! - `BattleAi` pairs the two and is stored on the unit it controls

pub mod strategies;

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use crate::battle::forecast::TurnForecast;
use crate::battle::log::BattleEventType;
use crate::battle::usable::{ChosenMove, Usable};
use crate::battle::Battle;
use crate::combat::stance::Stance;
use crate::content::action::Action;
use crate::core::error::{BattleError, Result};
use crate::core::types::UnitRef;

/// Skill level assumed for moves an AI queues on its own behalf
pub const AI_SKILL_LEVEL: u32 = 100;

/// Checked when a queued move comes up; false discards the move
pub type MovePredicate = Box<dyn Fn(&Battle, UnitRef) -> bool>;

pub struct QueuedMove {
    pub chosen: ChosenMove,
    predicate: Option<MovePredicate>,
}

impl fmt::Debug for QueuedMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueuedMove")
            .field("chosen", &self.chosen)
            .field("has_predicate", &self.predicate.is_some())
            .finish()
    }
}

/// Battle-wide notifications delivered to every AI
#[derive(Debug, Clone, PartialEq)]
pub enum AiEvent {
    ItemUsed {
        user: UnitRef,
        item_id: String,
        targets: Vec<UnitRef>,
    },
    SkillUsed {
        user: UnitRef,
        skill_id: String,
        stance: Stance,
        targets: Vec<UnitRef>,
    },
    StanceChanged {
        unit: UnitRef,
        stance: Stance,
    },
    UnitDamaged {
        unit: UnitRef,
        amount: u32,
        tags: Vec<String>,
        attacker: Option<UnitRef>,
    },
    UnitHealed {
        unit: UnitRef,
        amount: u32,
        tags: Vec<String>,
    },
    UnitKilled {
        unit: UnitRef,
    },
    UnitReady {
        unit: UnitRef,
    },
    UnitTargeted {
        target: UnitRef,
        action: Action,
        attacker: UnitRef,
    },
}

/// Queue, phase and bookkeeping shared by every strategy
#[derive(Debug)]
pub struct AiCore {
    unit: UnitRef,
    move_queue: VecDeque<QueuedMove>,
    default_skill: Option<String>,
    phase: u32,
    phase_points: Option<Vec<u32>>,
    targets: Option<Vec<UnitRef>>,
    turns_taken: u32,
    allies: Vec<UnitRef>,
    enemies: Vec<UnitRef>,
}

impl AiCore {
    pub fn new(unit: UnitRef) -> Self {
        Self {
            unit,
            move_queue: VecDeque::new(),
            default_skill: None,
            phase: 0,
            phase_points: None,
            targets: None,
            turns_taken: 0,
            allies: Vec::new(),
            enemies: Vec::new(),
        }
    }

    pub fn unit(&self) -> UnitRef {
        self.unit
    }

    /// Current phase; 0 until the first move is requested
    pub fn phase(&self) -> u32 {
        self.phase
    }

    pub fn phase_points(&self) -> Option<&[u32]> {
        self.phase_points.as_deref()
    }

    pub fn turns_taken(&self) -> u32 {
        self.turns_taken
    }

    /// Allies as of the last time the queue ran dry
    pub fn allies(&self) -> &[UnitRef] {
        &self.allies
    }

    pub fn enemies(&self) -> &[UnitRef] {
        &self.enemies
    }

    pub fn default_skill(&self) -> Option<&str> {
        self.default_skill.as_deref()
    }

    pub fn set_default_skill(&mut self, battle: &Battle, skill_id: &str) -> Result<()> {
        let skill = battle.content().skill(skill_id)?;
        tracing::debug!(unit = %battle.unit(self.unit).name(), skill = %skill.name, "default skill set");
        self.default_skill = Some(skill_id.to_string());
        Ok(())
    }

    /// Set HP thresholds for phases 2, 3 and so on, jittered by `sigma`
    pub fn define_phases(&mut self, battle: &mut Battle, thresholds: &[u32], sigma: f64) {
        let points: Vec<u32> = thresholds
            .iter()
            .map(|&v| battle.rng_mut().normal(v as f64, sigma).round().max(0.0) as u32)
            .collect();
        tracing::debug!(
            unit = %battle.unit(self.unit).name(),
            phases = points.len() + 1,
            ?points,
            "phases defined"
        );
        self.phase_points = Some(points);
        self.phase = 0;
    }

    /// Focus every move queued this turn on one unit; `None` clears it
    pub fn set_target(&mut self, target: Option<UnitRef>) {
        self.targets = target.map(|t| vec![t]);
    }

    fn skill_level(&self, battle: &Battle, skill_id: &str) -> u32 {
        let unit = battle.unit(self.unit);
        if unit.is_party_member() {
            if let Some(known) = unit.skills().iter().find(|s| s.skill_id == skill_id) {
                return known.level();
            }
        }
        AI_SKILL_LEVEL
    }

    fn pick_targets(
        &self,
        battle: &mut Battle,
        usable: &Usable,
        target: Option<UnitRef>,
    ) -> Result<Vec<UnitRef>> {
        if let Some(targets) = &self.targets {
            return Ok(targets.clone());
        }
        match target {
            Some(unit) => Ok(vec![unit]),
            None => battle.default_targets(self.unit, usable),
        }
    }

    pub fn queue_skill(
        &mut self,
        battle: &mut Battle,
        skill_id: &str,
        stance: Stance,
        target: Option<UnitRef>,
        predicate: Option<MovePredicate>,
    ) -> Result<()> {
        let name = battle.content().skill(skill_id)?.name.clone();
        let usable = Usable::Skill {
            skill_id: skill_id.to_string(),
            level: self.skill_level(battle, skill_id),
        };
        let targets = self.pick_targets(battle, &usable, target)?;
        self.move_queue.push_back(QueuedMove {
            chosen: ChosenMove {
                usable: Some(usable),
                stance,
                targets,
            },
            predicate,
        });
        tracing::debug!(unit = %battle.unit(self.unit).name(), skill = %name, "queued skill");
        Ok(())
    }

    /// Queue an item the unit owns; using one it does not own is a data bug
    pub fn queue_item(&mut self, battle: &mut Battle, item_id: &str, target: Option<UnitRef>) -> Result<()> {
        let name = battle.content().item(item_id)?.name.clone();
        let usable = Usable::Item {
            item_id: item_id.to_string(),
        };
        let stance = battle.unit(self.unit).stance();
        if !battle.is_usable(self.unit, &usable, stance)? {
            return Err(BattleError::ItemNotOwned {
                unit: battle.unit(self.unit).name().to_string(),
                item: item_id.to_string(),
            });
        }
        let targets = self.pick_targets(battle, &usable, target)?;
        self.move_queue.push_back(QueuedMove {
            chosen: ChosenMove {
                usable: Some(usable),
                stance: Stance::Attack,
                targets,
            },
            predicate: None,
        });
        tracing::debug!(unit = %battle.unit(self.unit).name(), item = %name, "queued item");
        Ok(())
    }

    pub fn queue_guard(&mut self) {
        self.move_queue.push_back(QueuedMove {
            chosen: ChosenMove::guard(),
            predicate: None,
        });
    }

    pub fn queue_weapon(&mut self, battle: &mut Battle, weapon_id: &str) -> Result<()> {
        let name = battle.content().weapon(weapon_id)?.name.clone();
        let usable = Usable::Weapon {
            weapon_id: weapon_id.to_string(),
        };
        let targets = battle.default_targets(self.unit, &usable)?;
        self.move_queue.push_back(QueuedMove {
            chosen: ChosenMove {
                usable: Some(usable),
                stance: Stance::Attack,
                targets,
            },
            predicate: None,
        });
        tracing::debug!(unit = %battle.unit(self.unit).name(), weapon = %name, "queued weapon change");
        Ok(())
    }

    pub fn has_moves_queued(&self) -> bool {
        !self.move_queue.is_empty()
    }

    pub fn is_skill_queued(&self, skill_id: &str) -> bool {
        self.move_queue.iter().any(|m| {
            matches!(&m.chosen.usable, Some(Usable::Skill { skill_id: id, .. }) if id == skill_id)
        })
    }

    pub fn is_item_queued(&self, item_id: &str) -> bool {
        self.move_queue.iter().any(|m| {
            matches!(&m.chosen.usable, Some(Usable::Item { item_id: id }) if id == item_id)
        })
    }

    pub fn is_skill_usable(&self, battle: &Battle, skill_id: &str) -> Result<bool> {
        let usable = Usable::Skill {
            skill_id: skill_id.to_string(),
            level: self.skill_level(battle, skill_id),
        };
        battle.is_usable(self.unit, &usable, battle.unit(self.unit).stance())
    }

    pub fn is_item_usable(&self, battle: &Battle, item_id: &str) -> Result<bool> {
        let usable = Usable::Item {
            item_id: item_id.to_string(),
        };
        battle.is_usable(self.unit, &usable, battle.unit(self.unit).stance())
    }

    pub fn items_left(&self, battle: &Battle, item_id: &str) -> u32 {
        battle
            .unit(self.unit)
            .items()
            .iter()
            .filter(|i| i.item_id == item_id)
            .map(|i| i.uses_left)
            .sum()
    }

    /// Turn order if this unit used the skill next
    pub fn predict_skill_turns(&self, battle: &Battle, skill_id: &str) -> Result<Vec<TurnForecast>> {
        let ranks: Vec<u32> = battle
            .content()
            .skill(skill_id)?
            .actions
            .iter()
            .map(|a| a.rank)
            .collect();
        Ok(battle.predict_turns(Some(self.unit), &ranks))
    }

    pub fn predict_item_turns(&self, battle: &Battle, item_id: &str) -> Result<Vec<TurnForecast>> {
        let item = battle.content().item(item_id)?;
        let rank = item.rank.unwrap_or(battle.config().default_item_rank);
        Ok(battle.predict_turns(Some(self.unit), &[rank]))
    }

    pub fn has_status(&self, battle: &Battle, status_id: &str) -> bool {
        battle.unit(self.unit).has_status(status_id)
    }
}

/// Fight-specific decision making
///
/// `strategize` runs whenever the queue is empty. The observers default to
/// doing nothing.
#[allow(unused_variables)]
pub trait AiStrategy {
    fn setup(&mut self, core: &mut AiCore, battle: &mut Battle) -> Result<()> {
        Ok(())
    }

    fn strategize(&mut self, core: &mut AiCore, battle: &mut Battle) -> Result<()>;

    fn on_phase_changed(
        &mut self,
        core: &mut AiCore,
        battle: &mut Battle,
        phase: u32,
        last_phase: u32,
    ) -> Result<()> {
        Ok(())
    }

    fn on_item_used(
        &mut self,
        core: &mut AiCore,
        battle: &mut Battle,
        user: UnitRef,
        item_id: &str,
        targets: &[UnitRef],
    ) -> Result<()> {
        Ok(())
    }

    fn on_skill_used(
        &mut self,
        core: &mut AiCore,
        battle: &mut Battle,
        user: UnitRef,
        skill_id: &str,
        stance: Stance,
        targets: &[UnitRef],
    ) -> Result<()> {
        Ok(())
    }

    fn on_stance_changed(
        &mut self,
        core: &mut AiCore,
        battle: &mut Battle,
        unit: UnitRef,
        stance: Stance,
    ) -> Result<()> {
        Ok(())
    }

    fn on_unit_damaged(
        &mut self,
        core: &mut AiCore,
        battle: &mut Battle,
        unit: UnitRef,
        amount: u32,
        tags: &[String],
        attacker: Option<UnitRef>,
    ) -> Result<()> {
        Ok(())
    }

    fn on_unit_healed(
        &mut self,
        core: &mut AiCore,
        battle: &mut Battle,
        unit: UnitRef,
        amount: u32,
        tags: &[String],
    ) -> Result<()> {
        Ok(())
    }

    fn on_unit_killed(&mut self, core: &mut AiCore, battle: &mut Battle, unit: UnitRef) -> Result<()> {
        Ok(())
    }

    fn on_unit_ready(&mut self, core: &mut AiCore, battle: &mut Battle, unit: UnitRef) -> Result<()> {
        Ok(())
    }

    fn on_unit_targeted(
        &mut self,
        core: &mut AiCore,
        battle: &mut Battle,
        target: UnitRef,
        action: &Action,
        attacker: UnitRef,
    ) -> Result<()> {
        Ok(())
    }
}

/// An AI attached to one unit
pub struct BattleAi {
    pub core: AiCore,
    strategy: Box<dyn AiStrategy>,
}

impl BattleAi {
    pub fn new(unit: UnitRef, strategy: Box<dyn AiStrategy>) -> Self {
        Self {
            core: AiCore::new(unit),
            strategy,
        }
    }

    /// Load template defaults, then let the strategy override them
    pub fn setup(&mut self, battle: &mut Battle) -> Result<()> {
        let content = Arc::clone(&battle.content);
        let unit = battle.unit(self.core.unit);
        tracing::debug!(unit = %unit.full_name(), "initialize AI");
        if unit.is_party_member() {
            if let Some(first) = unit.skills().first().map(|s| s.skill_id.clone()) {
                self.core.set_default_skill(battle, &first)?;
            }
        } else {
            let def = content.enemy(unit.id())?;
            match (&def.default_skill, def.skills.first()) {
                (Some(skill), _) | (None, Some(skill)) => {
                    self.core.set_default_skill(battle, skill)?;
                }
                (None, None) => {}
            }
            if !def.phases.is_empty() {
                self.core.define_phases(battle, &def.phases, def.phase_sigma);
            }
        }
        self.strategy.setup(&mut self.core, battle)
    }

    /// Next legal move for the unit
    ///
    /// Queued moves that are no longer legal or whose predicate fails are
    /// dropped. When everything is dropped the default skill is used.
    pub fn get_next_move(&mut self, battle: &mut Battle) -> Result<ChosenMove> {
        let unit = self.core.unit;
        if self.core.move_queue.is_empty() {
            tracing::debug!(unit = %battle.unit(unit).name(), "defer to AI for next move");
            self.core.allies = battle.allies_of(unit).to_vec();
            self.core.enemies = battle.enemies_of(unit).to_vec();
            self.core.targets = None;
            self.update_phase(battle)?;
            if self.core.move_queue.is_empty() {
                self.strategy.strategize(&mut self.core, battle)?;
            }
            if self.core.move_queue.is_empty() {
                let default = self.default_skill_or_err(battle)?;
                tracing::debug!(unit = %battle.unit(unit).name(), "no moves queued, using default");
                self.core
                    .queue_skill(battle, &default, Stance::Attack, None, None)?;
            }
        }

        let stance = battle.unit(unit).stance();
        while let Some(candidate) = self.core.move_queue.pop_front() {
            let legal = match (&candidate.chosen.usable, candidate.chosen.stance) {
                (Some(usable), Stance::Attack) => battle.is_usable(unit, usable, stance)?,
                _ => true,
            };
            let accepted = legal
                && candidate
                    .predicate
                    .as_ref()
                    .map_or(true, |check| check(&*battle, unit));
            if accepted {
                self.core.turns_taken += 1;
                return Ok(candidate.chosen);
            }
            let name = match &candidate.chosen.usable {
                Some(usable) => battle.usable_name(usable)?,
                None => "Guard".to_string(),
            };
            tracing::debug!(unit = %battle.unit(unit).name(), usable = %name, "discard queued move, not usable");
            battle.log_event(
                BattleEventType::MoveDiscarded {
                    unit,
                    usable: name.clone(),
                },
                format!("{} discarded {}", battle.unit(unit).name(), name),
            );
        }

        let default = self.default_skill_or_err(battle)?;
        let usable = Usable::Skill {
            level: self.core.skill_level(battle, &default),
            skill_id: default,
        };
        let targets = battle.default_targets(unit, &usable)?;
        self.core.turns_taken += 1;
        Ok(ChosenMove {
            usable: Some(usable),
            stance: Stance::Attack,
            targets,
        })
    }

    fn default_skill_or_err(&self, battle: &Battle) -> Result<String> {
        self.core
            .default_skill
            .clone()
            .ok_or_else(|| BattleError::NoDefaultSkill(battle.unit(self.core.unit).name().to_string()))
    }

    /// Ratchet the phase forward from the unit's current HP
    pub fn update_phase(&mut self, battle: &mut Battle) -> Result<()> {
        let hp = battle.unit(self.core.unit).hp();
        let candidate = match &self.core.phase_points {
            Some(points) => points
                .iter()
                .rposition(|&threshold| threshold >= hp)
                .map_or(1, |i| i as u32 + 2),
            None => 1,
        };
        let last_phase = self.core.phase;
        self.core.phase = candidate.max(last_phase);
        if self.core.phase > last_phase {
            let phase = self.core.phase;
            let unit = self.core.unit;
            tracing::info!(unit = %battle.unit(unit).name(), phase, last_phase, "entering phase");
            battle.log_event(
                BattleEventType::PhaseChanged {
                    unit,
                    phase,
                    last_phase,
                },
                format!("{} is entering phase {}", battle.unit(unit).name(), phase),
            );
            self.strategy
                .on_phase_changed(&mut self.core, battle, phase, last_phase)?;
        }
        Ok(())
    }

    pub fn notify(&mut self, battle: &mut Battle, event: &AiEvent) -> Result<()> {
        let core = &mut self.core;
        match event {
            AiEvent::ItemUsed {
                user,
                item_id,
                targets,
            } => self
                .strategy
                .on_item_used(core, battle, *user, item_id, targets),
            AiEvent::SkillUsed {
                user,
                skill_id,
                stance,
                targets,
            } => self
                .strategy
                .on_skill_used(core, battle, *user, skill_id, *stance, targets),
            AiEvent::StanceChanged { unit, stance } => {
                self.strategy.on_stance_changed(core, battle, *unit, *stance)
            }
            AiEvent::UnitDamaged {
                unit,
                amount,
                tags,
                attacker,
            } => self
                .strategy
                .on_unit_damaged(core, battle, *unit, *amount, tags, *attacker),
            AiEvent::UnitHealed { unit, amount, tags } => {
                self.strategy.on_unit_healed(core, battle, *unit, *amount, tags)
            }
            AiEvent::UnitKilled { unit } => self.strategy.on_unit_killed(core, battle, *unit),
            AiEvent::UnitReady { unit } => self.strategy.on_unit_ready(core, battle, *unit),
            AiEvent::UnitTargeted {
                target,
                action,
                attacker,
            } => self
                .strategy
                .on_unit_targeted(core, battle, *target, action, *attacker),
        }
    }
}

impl Battle {
    /// Deliver an event to every AI in roster order
    pub(crate) fn notify_ais(&mut self, event: &AiEvent) -> Result<()> {
        for i in 0..self.units.len() {
            let unit = UnitRef(i);
            if self.busy_ais.contains(&unit) {
                self.held_ai_events.push((unit, event.clone()));
                continue;
            }
            self.with_ai(unit, |ai, battle| ai.notify(battle, event))?;
        }
        Ok(())
    }

    /// Ask a unit's AI for its move; `None` if the unit is player-controlled
    pub(crate) fn ai_next_move(&mut self, unit: UnitRef) -> Result<Option<ChosenMove>> {
        self.with_ai(unit, |ai, battle| ai.get_next_move(battle))
    }

    /// Run `f` with a unit's AI checked out of the roster.
    ///
    /// Events raised for that unit while it is out are held and delivered
    /// in order once it is back in place.
    pub(crate) fn with_ai<T>(
        &mut self,
        unit: UnitRef,
        f: impl FnOnce(&mut BattleAi, &mut Battle) -> Result<T>,
    ) -> Result<Option<T>> {
        let Some(mut ai) = self.units[unit.0].ai.take() else {
            return Ok(None);
        };
        self.busy_ais.push(unit);
        let result = f(&mut *ai, self);
        self.busy_ais.retain(|&busy| busy != unit);
        self.units[unit.0].ai = Some(ai);
        let value = result?;
        self.deliver_held_events(unit)?;
        Ok(Some(value))
    }

    fn deliver_held_events(&mut self, unit: UnitRef) -> Result<()> {
        while let Some(at) = self.held_ai_events.iter().position(|(u, _)| *u == unit) {
            let (_, event) = self.held_ai_events.remove(at);
            self.with_ai(unit, |ai, battle| ai.notify(battle, &event))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::battle::testing::battle_with;
    use crate::battle::usable::ItemUsable;

    /// Never queues anything, so the default skill is all that is left
    struct Idle;

    impl AiStrategy for Idle {
        fn strategize(&mut self, _core: &mut AiCore, _battle: &mut Battle) -> Result<()> {
            Ok(())
        }
    }

    /// Hurts its own unit while deciding and counts the damage it hears of
    struct SelfHarm {
        heard: Rc<Cell<u32>>,
    }

    impl AiStrategy for SelfHarm {
        fn strategize(&mut self, core: &mut AiCore, battle: &mut Battle) -> Result<()> {
            battle.take_damage(core.unit(), 10.0, &[], true)
        }

        fn on_unit_damaged(
            &mut self,
            core: &mut AiCore,
            _battle: &mut Battle,
            unit: UnitRef,
            _amount: u32,
            _tags: &[String],
            _attacker: Option<UnitRef>,
        ) -> Result<()> {
            if unit == core.unit() {
                self.heard.set(self.heard.get() + 1);
            }
            Ok(())
        }
    }

    fn skill_of(chosen: &ChosenMove) -> Option<&str> {
        match &chosen.usable {
            Some(Usable::Skill { skill_id, .. }) => Some(skill_id),
            _ => None,
        }
    }

    fn discarded(battle: &Battle, who: UnitRef) -> usize {
        battle
            .log()
            .count(|e| matches!(e, BattleEventType::MoveDiscarded { unit, .. } if *unit == who))
    }

    #[test]
    fn test_failed_predicate_discards_move() {
        let mut battle = battle_with("dummyFight");
        let dummy = battle.enemy_units()[0];
        let mut ai = BattleAi::new(dummy, Box::new(Idle));
        ai.setup(&mut battle).unwrap();
        ai.core
            .queue_skill(
                &mut battle,
                "swordSlash",
                Stance::Attack,
                None,
                Some(Box::new(|_, _| false)),
            )
            .unwrap();

        let chosen = ai.get_next_move(&mut battle).unwrap();
        assert_eq!(skill_of(&chosen), Some("tap"));
        assert_eq!(discarded(&battle, dummy), 1);
        assert!(!ai.core.has_moves_queued());
    }

    #[test]
    fn test_passing_predicate_keeps_move() {
        let mut battle = battle_with("dummyFight");
        let dummy = battle.enemy_units()[0];
        let mut ai = BattleAi::new(dummy, Box::new(Idle));
        ai.setup(&mut battle).unwrap();
        ai.core
            .queue_skill(
                &mut battle,
                "swordSlash",
                Stance::Attack,
                None,
                Some(Box::new(|battle, unit| battle.unit(unit).is_alive())),
            )
            .unwrap();

        let chosen = ai.get_next_move(&mut battle).unwrap();
        assert_eq!(skill_of(&chosen), Some("swordSlash"));
        assert_eq!(discarded(&battle, dummy), 0);
        assert_eq!(ai.core.turns_taken(), 1);
    }

    #[test]
    fn test_item_in_counter_stance_is_discarded() {
        let mut battle = battle_with("dummyFight");
        let dummy = battle.enemy_units()[0];
        battle.units[dummy.0].items.push(ItemUsable {
            item_id: "tonic".into(),
            uses_left: 1,
        });
        let mut ai = BattleAi::new(dummy, Box::new(Idle));
        ai.setup(&mut battle).unwrap();
        ai.core.queue_item(&mut battle, "tonic", None).unwrap();
        battle.units[dummy.0].stance = Stance::Counter;

        let chosen = ai.get_next_move(&mut battle).unwrap();
        assert_eq!(skill_of(&chosen), Some("tap"));
        assert_eq!(
            battle.log().count(|e| matches!(
                e,
                BattleEventType::MoveDiscarded { usable, .. } if usable == "Tonic"
            )),
            1
        );
    }

    #[test]
    fn test_empty_queue_falls_back_to_default_skill() {
        let mut battle = battle_with("dummyFight");
        let dummy = battle.enemy_units()[0];
        let scott = battle.player_units()[0];
        let mut ai = BattleAi::new(dummy, Box::new(Idle));
        ai.setup(&mut battle).unwrap();

        let chosen = ai.get_next_move(&mut battle).unwrap();
        assert_eq!(skill_of(&chosen), Some("tap"));
        assert_eq!(chosen.stance, Stance::Attack);
        assert_eq!(chosen.targets, vec![scott]);
        assert_eq!(ai.core.phase(), 1);
    }

    #[test]
    fn test_missing_default_skill_is_an_error() {
        let mut battle = battle_with("dummyFight");
        let dummy = battle.enemy_units()[0];
        let mut ai = BattleAi::new(dummy, Box::new(Idle));
        assert!(matches!(
            ai.get_next_move(&mut battle),
            Err(BattleError::NoDefaultSkill(_))
        ));
    }

    #[test]
    fn test_events_raised_while_deciding_reach_the_ai() {
        let mut battle = battle_with("dummyFight");
        let dummy = battle.enemy_units()[0];
        let heard = Rc::new(Cell::new(0));
        let mut ai = BattleAi::new(
            dummy,
            Box::new(SelfHarm {
                heard: Rc::clone(&heard),
            }),
        );
        ai.setup(&mut battle).unwrap();
        battle.units[dummy.0].ai = Some(Box::new(ai));

        let chosen = battle.ai_next_move(dummy).unwrap().unwrap();
        assert_eq!(skill_of(&chosen), Some("tap"));
        assert_eq!(heard.get(), 1);
        assert!(battle.held_ai_events.is_empty());
        assert!(battle.busy_ais.is_empty());
    }
}
