//! HP, MP, statuses and the countdown of a single combatant
//!
//! These live on `Battle` rather than `BattleUnit` because every one of
//! them can raise hooks that reach back into the rest of the battle.

use std::sync::Arc;

use crate::battle::ai::AiEvent;
use crate::battle::log::BattleEventType;
use crate::battle::unit::counter_for_rank;
use crate::battle::usable::SkillUsable;
use crate::battle::Battle;
use crate::combat::formulas;
use crate::combat::stance::Stance;
use crate::core::error::Result;
use crate::core::types::{PoolRef, StatId, UnitRef};
use crate::effects::events::{AfflictEvent, CureEvent, DamageEvent, DyingEvent, HealEvent};
use crate::effects::status::{StatusInstance, StatusState};

impl Battle {
    /// Inflict damage on a unit
    ///
    /// Priority damage bypasses the damage hooks, so nothing may rewrite or
    /// cancel it. A negative amount after hooks heals instead.
    pub fn take_damage(
        &mut self,
        unit: UnitRef,
        amount: f64,
        tags: &[String],
        priority: bool,
    ) -> Result<()> {
        if !self.units[unit.0].is_alive() {
            return Ok(());
        }
        let mut amount = amount.round();
        let multiplier: f64 = tags
            .iter()
            .filter_map(|t| self.units[unit.0].affinity(t))
            .product();
        amount = (amount * multiplier).round();

        let attacker = self.units[unit.0].last_attacker;
        if amount > 0.0 && !priority {
            let mut event = DamageEvent {
                unit,
                amount,
                tags: tags.to_vec(),
                acting_unit: attacker,
                cancel: false,
            };
            self.raise_battle_event(|h| h.unit_damaged, &mut event)?;
            if !event.cancel {
                self.raise_unit_event(unit, |h| h.damaged, &mut event)?;
            }
            if event.cancel {
                tracing::debug!(unit = %self.units[unit.0].name, "damage cancelled by status/FC");
                return Ok(());
            }
            amount = event.amount.round();
        }
        if amount < 0.0 {
            return self.heal(unit, -amount, tags, false);
        }
        if !self.units[unit.0].is_alive() {
            return Ok(());
        }

        let config = self.config();
        if let Some(attacker) = attacker {
            if self.units[attacker.0].stance == Stance::Counter {
                amount = (amount * config.bonus_multiplier).round();
            }
            if self.units[unit.0].stance.reduces_damage() {
                amount = formulas::guard_damage_taken(&config, amount).round();
            }
        }

        let dealt = amount.clamp(0.0, u32::MAX as f64) as u32;
        let target = &mut self.units[unit.0];
        let old_hp = target.hp;
        target.hp = target.hp.saturating_sub(dealt);
        let (hp, max_hp, lazarus) = (target.hp, target.max_hp, target.lazarus);
        tracing::debug!(unit = %target.name, dealt, hp, "took damage");

        self.notify_ais(&AiEvent::UnitDamaged {
            unit,
            amount: dealt,
            tags: tags.to_vec(),
            attacker,
        })?;
        if old_hp > 0 || lazarus {
            self.presenter.show_damage(unit, dealt, tags);
        }
        self.presenter.set_hp(unit, hp, max_hp);
        self.log_event(
            BattleEventType::Damaged {
                unit,
                amount: dealt,
                tags: tags.to_vec(),
            },
            format!("{} took {} HP damage", self.units[unit.0].name, dealt),
        );

        if hp == 0 && (old_hp > 0 || lazarus) {
            self.units[unit.0].lazarus = true;
            let mut event = DyingEvent {
                unit,
                cancel: false,
            };
            self.raise_battle_event(|h| h.unit_dying, &mut event)?;
            if !event.cancel {
                self.raise_unit_event(unit, |h| h.dying, &mut event)?;
            }
            if event.cancel {
                tracing::info!(unit = %self.units[unit.0].name, "death suspended by status/FC");
                self.log_event(
                    BattleEventType::DeathSuspended { unit },
                    format!("{} clings to life", self.units[unit.0].name),
                );
            } else {
                self.die(unit)?;
            }
        }
        Ok(())
    }

    /// Restore HP; a negative amount after hooks becomes priority damage
    pub fn heal(&mut self, unit: UnitRef, amount: f64, tags: &[String], priority: bool) -> Result<()> {
        if !self.units[unit.0].is_alive() {
            return Ok(());
        }
        let mut amount = amount.round();
        if !priority {
            let mut event = HealEvent {
                unit,
                amount,
                tags: tags.to_vec(),
                cancel: false,
            };
            self.raise_battle_event(|h| h.unit_healed, &mut event)?;
            if !event.cancel {
                self.raise_unit_event(unit, |h| h.healed, &mut event)?;
            }
            if event.cancel {
                return Ok(());
            }
            amount = event.amount.round();
        }
        if amount < 0.0 {
            return self.take_damage(unit, -amount, &[], true);
        }
        if amount == 0.0 || !self.units[unit.0].is_alive() {
            return Ok(());
        }

        let gained = amount.min(u32::MAX as f64) as u32;
        let target = &mut self.units[unit.0];
        target.hp = target.hp.saturating_add(gained).min(target.max_hp);
        if target.hp > 0 {
            target.lazarus = false;
        }
        let (hp, max_hp) = (target.hp, target.max_hp);
        tracing::debug!(unit = %target.name, gained, hp, "healed");

        self.presenter.show_healing(unit, gained);
        self.presenter.set_hp(unit, hp, max_hp);
        self.notify_ais(&AiEvent::UnitHealed {
            unit,
            amount: gained,
            tags: tags.to_vec(),
        })?;
        self.log_event(
            BattleEventType::Healed {
                unit,
                amount: gained,
            },
            format!("{} healed for {} HP", self.units[unit.0].name, gained),
        );
        Ok(())
    }

    /// Unconditional death
    pub fn die(&mut self, unit: UnitRef) -> Result<()> {
        self.notify_ais(&AiEvent::UnitKilled { unit })?;
        let target = &mut self.units[unit.0];
        target.lazarus = false;
        target.hp = 0;
        target.statuses.clear();
        target.action_queue.clear();
        let max_hp = target.max_hp;
        tracing::info!(unit = %target.full_name, "afflicted with death");

        self.presenter.set_hp(unit, 0, max_hp);
        self.presenter.animate(unit, "die");
        self.log_event(
            BattleEventType::UnitKilled { unit },
            format!("{} was KO'd", self.units[unit.0].full_name),
        );
        Ok(())
    }

    /// Bring a dead unit back with 1 HP, or full HP
    pub fn resurrect(&mut self, unit: UnitRef, full: bool) -> Result<()> {
        if self.units[unit.0].is_alive() {
            self.presenter.show_text(unit, "ward");
            return Ok(());
        }
        let target = &mut self.units[unit.0];
        target.lazarus = true;
        let amount = if full { target.max_hp } else { 1 };
        self.heal(unit, amount as f64, &[], false)?;
        if self.units[unit.0].hp == 0 {
            self.units[unit.0].lazarus = false;
            return Ok(());
        }
        self.presenter.animate(unit, "revive");
        let rank = self.config().revive_rank;
        self.reset_counter(unit, rank, false);
        tracing::info!(unit = %self.units[unit.0].name, "brought back from the dead");
        self.log_event(
            BattleEventType::Revived { unit },
            format!("{} was revived", self.units[unit.0].name),
        );
        Ok(())
    }

    fn block_status(&mut self, unit: UnitRef, status_id: &str, guardable: bool, text: &str, why: &str) {
        if !guardable {
            self.presenter.show_text(unit, text);
        }
        tracing::debug!(unit = %self.units[unit.0].name, status = status_id, why, "status blocked");
        self.log_event(
            BattleEventType::StatusBlocked {
                unit,
                status: status_id.to_string(),
            },
            format!("{} infliction on {} blocked: {}", status_id, self.units[unit.0].name, why),
        );
    }

    /// Afflict a unit with a status
    ///
    /// Returns true if the status landed. Immunity, overrules, a raised
    /// guard and cancelling hooks all reject it without an error.
    pub fn add_status(&mut self, unit: UnitRef, status_id: &str, guardable: bool) -> Result<bool> {
        let content = Arc::clone(&self.content);
        let def = content.status(status_id)?;
        let target = &self.units[unit.0];
        if !target.is_alive() || target.has_status(status_id) {
            return Ok(false);
        }

        if target.is_immune(status_id) {
            self.block_status(unit, status_id, guardable, "immune", "immune");
            return Ok(false);
        }
        let mut overruled = false;
        for active in &target.statuses {
            if content.status(&active.id)?.overrules(status_id) {
                overruled = true;
                break;
            }
        }
        if overruled {
            self.block_status(unit, status_id, guardable, "ward", "overruled");
            return Ok(false);
        }
        if guardable && target.stance.blocks_guardable() {
            self.block_status(unit, status_id, guardable, "ward", "guard stance");
            return Ok(false);
        }

        let mut event = AfflictEvent {
            unit,
            status_id: status_id.to_string(),
            cancel: false,
        };
        self.raise_battle_event(|h| h.unit_afflicted, &mut event)?;
        if !event.cancel {
            self.raise_unit_event(unit, |h| h.afflicted, &mut event)?;
        }
        if event.cancel {
            self.block_status(unit, status_id, guardable, "ward", "cancelled by status/FC");
            return Ok(false);
        }
        // a hook may have killed the unit or applied the status itself
        let target = &self.units[unit.0];
        if !target.is_alive() || target.has_status(status_id) {
            return Ok(false);
        }

        let mut kept = Vec::with_capacity(target.statuses.len());
        for active in &target.statuses {
            if !def.overrules(&active.id) {
                kept.push(active.clone());
            } else {
                tracing::debug!(status = %active.id, by = def.id, "status overruled");
            }
        }
        let serial = self.next_serial();
        kept.push(StatusInstance {
            serial,
            id: def.id.to_string(),
            state: StatusState::Stateless,
        });
        self.units[unit.0].statuses = kept;

        tracing::info!(unit = %self.units[unit.0].name, status = def.name, "took on status");
        self.log_event(
            BattleEventType::StatusAdded {
                unit,
                status: def.id.to_string(),
            },
            format!("{} took on status {}", self.units[unit.0].name, def.name),
        );
        if let Some(init) = def.hooks.initialize {
            let mut cx = crate::effects::status::StatusCx {
                battle: self,
                unit,
                serial,
                status_id: def.id,
            };
            init(&mut cx, &mut ())?;
        }
        Ok(true)
    }

    /// Remove a status; false if absent or a hook refused the cure
    pub fn lift_status(&mut self, unit: UnitRef, status_id: &str) -> Result<bool> {
        let content = Arc::clone(&self.content);
        let def = content.status(status_id)?;
        if !self.units[unit.0].has_status(status_id) {
            return Ok(false);
        }
        let mut event = CureEvent {
            unit,
            status_id: status_id.to_string(),
            cancel: false,
        };
        self.raise_battle_event(|h| h.unit_cured, &mut event)?;
        if !event.cancel {
            self.raise_unit_event(unit, |h| h.cured, &mut event)?;
        }
        if event.cancel {
            return Ok(false);
        }
        let target = &mut self.units[unit.0];
        let before = target.statuses.len();
        target.statuses.retain(|s| s.id != status_id);
        if target.statuses.len() == before {
            return Ok(false);
        }
        tracing::info!(unit = %target.name, status = def.name, "lost status");
        self.log_event(
            BattleEventType::StatusLifted {
                unit,
                status: status_id.to_string(),
            },
            format!("{} lost status {}", self.units[unit.0].name, def.name),
        );
        Ok(true)
    }

    /// Lift every active status carrying any of the tags
    pub fn lift_status_tags(&mut self, unit: UnitRef, tags: &[&str]) -> Result<()> {
        let content = Arc::clone(&self.content);
        let active: Vec<String> = self.units[unit.0]
            .statuses
            .iter()
            .map(|s| s.id.clone())
            .collect();
        for id in active {
            if content.status(&id)?.has_any_tag(tags) {
                self.lift_status(unit, &id)?;
            }
        }
        Ok(())
    }

    /// Regenerate the countdown from an action rank
    pub fn reset_counter(&mut self, unit: UnitRef, rank: u32, is_first_turn: bool) {
        let config = self.config();
        let agility = self.unit_info(unit).stat(StatId::Agi);
        let target = &mut self.units[unit.0];
        target.cv = counter_for_rank(&config, agility, target.turn_ratio, rank, is_first_turn);
        tracing::trace!(unit = %target.name, cv = target.cv, rank, is_first_turn, "CV reset");
    }

    pub fn clear_queue(&mut self, unit: UnitRef) {
        let target = &mut self.units[unit.0];
        if !target.action_queue.is_empty() {
            target.action_queue.clear();
            tracing::debug!(unit = %target.name, "cleared action queue");
        }
    }

    pub fn restore_mp(&mut self, unit: UnitRef, amount: u32) {
        let pool = self.units[unit.0].pool;
        if let Some(change) = self.pools[pool.0].restore(amount) {
            tracing::trace!(pool = self.pools[pool.0].id(), ?change, "MP restored");
            self.presenter.set_mp(pool, self.pools[pool.0].available());
        }
    }

    pub(crate) fn spend_mp(&mut self, pool: PoolRef, amount: u32) {
        if let Some(change) = self.pools[pool.0].spend(amount) {
            tracing::trace!(pool = self.pools[pool.0].id(), ?change, "MP spent");
            self.presenter.set_mp(pool, self.pools[pool.0].available());
        }
    }

    pub fn animate(&mut self, unit: UnitRef, state: &str) {
        self.presenter.animate(unit, state);
    }

    /// Grow a known skill of a party member, or teach it if unknown
    pub fn grow_skill(&mut self, unit: UnitRef, skill_id: &str, experience: u64) -> Result<()> {
        let content = Arc::clone(&self.content);
        let skill = content.skill(skill_id)?;
        let curve = content.config.growth;
        let target = &mut self.units[unit.0];
        if !target.is_party_member() {
            return Ok(());
        }
        match target.skills.iter_mut().find(|s| s.skill_id == skill_id) {
            Some(known) => {
                known.grow(&curve, experience);
            }
            None => {
                let level = target.level();
                target.skills.push(SkillUsable::new(skill_id, level));
                tracing::info!(unit = %target.name, skill = %skill.name, "learned skill");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::engine::PartySetup;
    use crate::content::{ContentRegistry, EncounterDef, EnemyDef};
    use crate::core::rng::FixedRng;
    use crate::effects::events::tags;

    fn battle_with(enemy: EnemyDef) -> Battle {
        let mut content = ContentRegistry::default();
        content.enemies.insert("dummy".into(), enemy);
        content.encounters.insert(
            "test".into(),
            EncounterDef {
                title: None,
                enemies: vec!["dummy".into()],
                battle_level: Some(10),
                is_final_battle: false,
            },
        );
        Battle::new(
            Arc::new(content),
            "test",
            &PartySetup::default(),
            Box::new(FixedRng::new(0.5)),
        )
        .unwrap()
    }

    fn dummy(max_hp: u32) -> Battle {
        let mut enemy = EnemyDef::named("Dummy");
        enemy.max_hp = Some(max_hp);
        battle_with(enemy)
    }

    #[test]
    fn test_damage_clamps_at_zero_and_kills() {
        let mut battle = dummy(999);
        let unit = UnitRef(0);
        battle.take_damage(unit, 1200.0, &[], false).unwrap();
        assert_eq!(battle.unit(unit).hp(), 0);
        assert!(!battle.unit(unit).is_alive());
    }

    #[test]
    fn test_zombie_death_becomes_skeleton() {
        let mut battle = dummy(999);
        let unit = UnitRef(0);
        assert!(battle.add_status(unit, "zombie", false).unwrap());
        battle.take_damage(unit, 1200.0, &[], false).unwrap();
        let target = battle.unit(unit);
        assert_eq!(target.hp(), 0);
        assert!(target.is_lazarus());
        assert!(target.is_alive());
        assert!(target.has_status("skeleton"));
        assert!(!target.has_status("zombie"));
    }

    #[test]
    fn test_lifting_skeleton_leaves_one_hp() {
        let mut battle = dummy(999);
        let unit = UnitRef(0);
        battle.add_status(unit, "zombie", false).unwrap();
        battle.take_damage(unit, 1200.0, &[], false).unwrap();
        assert!(battle.lift_status(unit, "skeleton").unwrap());
        assert_eq!(battle.unit(unit).hp(), 1);
        assert!(!battle.unit(unit).is_lazarus());
    }

    #[test]
    fn test_affinity_scales_damage() {
        let mut enemy = EnemyDef::named("Slime");
        enemy.max_hp = Some(500);
        enemy.damage_modifiers.insert("fire".into(), 2.0);
        let mut battle = battle_with(enemy);
        battle
            .take_damage(UnitRef(0), 100.0, &tags(&["fire"]), false)
            .unwrap();
        assert_eq!(battle.unit(UnitRef(0)).hp(), 300);
    }

    #[test]
    fn test_negative_damage_heals() {
        let mut battle = dummy(500);
        let unit = UnitRef(0);
        battle.take_damage(unit, 200.0, &[], false).unwrap();
        battle.take_damage(unit, -50.0, &[], false).unwrap();
        assert_eq!(battle.unit(unit).hp(), 350);
    }

    #[test]
    fn test_negative_heal_ignores_affinity() {
        let mut enemy = EnemyDef::named("Slime");
        enemy.max_hp = Some(500);
        enemy.damage_modifiers.insert("fire".into(), 2.0);
        let mut battle = battle_with(enemy);
        battle
            .heal(UnitRef(0), -100.0, &tags(&["fire"]), false)
            .unwrap();
        assert_eq!(battle.unit(UnitRef(0)).hp(), 400);
    }

    #[test]
    fn test_heal_caps_at_max() {
        let mut battle = dummy(500);
        let unit = UnitRef(0);
        battle.take_damage(unit, 10.0, &[], false).unwrap();
        battle.heal(unit, 1000.0, &[], false).unwrap();
        assert_eq!(battle.unit(unit).hp(), 500);
    }

    #[test]
    fn test_immunity_blocks_status() {
        let mut enemy = EnemyDef::named("Golem");
        enemy.immunities.push("sleep".into());
        let mut battle = battle_with(enemy);
        assert!(!battle.add_status(UnitRef(0), "sleep", false).unwrap());
        assert!(!battle.unit(UnitRef(0)).has_status("sleep"));
    }

    #[test]
    fn test_overruled_status_is_rejected() {
        let mut battle = dummy(500);
        let unit = UnitRef(0);
        battle.add_status(unit, "ghost", false).unwrap();
        assert!(!battle.add_status(unit, "zombie", false).unwrap());
        assert!(battle.unit(unit).has_status("ghost"));
    }

    #[test]
    fn test_overruling_status_replaces_old_one() {
        let mut battle = dummy(500);
        let unit = UnitRef(0);
        battle.add_status(unit, "drunk", false).unwrap();
        assert!(battle.add_status(unit, "sleep", false).unwrap());
        assert_eq!(battle.unit(unit).status_ids(), vec!["sleep"]);
    }

    #[test]
    fn test_unknown_status_is_an_error() {
        let mut battle = dummy(500);
        assert!(battle.add_status(UnitRef(0), "petrify", false).is_err());
    }

    #[test]
    fn test_resurrect_revives_with_one_hp() {
        let mut battle = dummy(500);
        let unit = UnitRef(0);
        battle.die(unit).unwrap();
        battle.resurrect(unit, false).unwrap();
        assert_eq!(battle.unit(unit).hp(), 1);
        assert!(battle.unit(unit).is_alive());
    }
}
