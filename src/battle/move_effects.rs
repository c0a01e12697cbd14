//! Handlers for the effect kinds a move can carry

use crate::battle::Battle;
use crate::combat::formulas;
use crate::content::action::{Effect, EffectKind};
use crate::core::error::Result;
use crate::core::types::{StatId, UnitRef};
use crate::effects::events::tags;

impl Battle {
    /// Apply one effect from `actor` to `targets`
    pub fn apply_effect(&mut self, actor: UnitRef, targets: &[UnitRef], effect: &Effect) -> Result<()> {
        let config = self.config();
        tracing::trace!(effect = ?effect.kind, hint = ?effect.target_hint, "apply effect");
        match &effect.kind {
            EffectKind::AddCondition { condition } => {
                self.add_condition(condition)?;
            }
            EffectKind::AddStatus { status } => {
                for &target in targets {
                    self.add_status(target, status, false)?;
                }
            }
            EffectKind::Damage {
                damage_type,
                power,
                element,
                add_status,
                status_chance,
                recoil,
            } => {
                let mut damage_tags = vec![damage_type.tag().to_string()];
                damage_tags.extend(element.iter().cloned());
                for &target in targets {
                    let user = self.unit_info(actor);
                    let victim = self.unit_info(target);
                    let base = formulas::damage(&config, *damage_type, &user, &victim, *power)
                        .round()
                        .max(1.0);
                    let tolerance = (base * config.damage_tolerance).round();
                    let amount = self.rng.uniform(base, tolerance).max(1.0);
                    self.take_damage(target, amount, &damage_tags, false)?;
                    if let Some(fraction) = recoil {
                        let kickback = (base * fraction).round();
                        if kickback > 0.0 {
                            let tolerance = (kickback * config.damage_tolerance).round();
                            let amount = self.rng.uniform(kickback, tolerance).max(1.0);
                            self.take_damage(actor, amount, &tags(&["recoil"]), true)?;
                        }
                    }
                    if let Some(status) = add_status {
                        let odds = status_chance.map_or(1.0, |c| c / 100.0);
                        if self.rng.chance(odds) {
                            self.add_status(target, status, true)?;
                        }
                    }
                }
            }
            EffectKind::Devour => {
                for &target in targets {
                    if let Some(skill) = self.units[target.0].munch_skill.clone() {
                        let experience = formulas::skill_experience(&config, &self.unit_info(actor));
                        self.grow_skill(actor, &skill, experience)?;
                    }
                    tracing::info!(
                        victim = %self.units[target.0].full_name,
                        by = %self.units[actor.0].name,
                        "devoured"
                    );
                    self.die(target)?;
                }
                let missing = self.units[actor.0].max_hp - self.units[actor.0].hp;
                self.heal(actor, missing as f64, &[], true)?;
            }
            EffectKind::FullRecover => {
                for &target in targets {
                    if self.units[target.0].has_status("zombie") {
                        continue;
                    }
                    let missing = self.units[target.0].max_hp - self.units[target.0].hp;
                    self.heal(target, missing as f64, &tags(&["cure"]), false)?;
                    let pool = self.units[target.0].pool;
                    let capacity = self.pools[pool.0].capacity();
                    self.restore_mp(target, capacity);
                }
            }
            EffectKind::Heal {
                power,
                add_status,
                status_chance,
            } => {
                for &target in targets {
                    let user = self.unit_info(actor);
                    let base = formulas::healing(&config, &user, *power).round().max(1.0);
                    let tolerance = (base * config.damage_tolerance).round();
                    let amount = self.rng.uniform(base, tolerance).max(1.0);
                    self.heal(target, amount, &tags(&["cure"]), false)?;
                    if let Some(status) = add_status {
                        let odds = status_chance.map_or(1.0, |c| c / 100.0);
                        if self.rng.chance(odds) {
                            self.add_status(target, status, false)?;
                        }
                    }
                }
            }
            EffectKind::InstaKill { damage_type } => {
                let kill_tags = tags(&[damage_type.tag(), "deathblow"]);
                for &target in targets {
                    let amount = self.units[target.0].hp.max(1) as f64;
                    self.take_damage(target, amount, &kill_tags, false)?;
                }
            }
            EffectKind::LiftStatus { statuses } => {
                for &target in targets {
                    for status in statuses {
                        self.lift_status(target, status)?;
                    }
                }
            }
            EffectKind::LiftStatusTags { tags: lifted } => {
                let lifted: Vec<&str> = lifted.iter().map(String::as_str).collect();
                for &target in targets {
                    self.lift_status_tags(target, &lifted)?;
                }
            }
            EffectKind::RecoverHp { strength } => {
                for &target in targets {
                    let amount = self.units[target.0].max_hp as f64 * strength / 100.0;
                    self.heal(target, amount, &tags(&["cure"]), false)?;
                }
            }
            EffectKind::RecoverMp => {
                for &target in targets {
                    let info = self.unit_info(target);
                    let amount = formulas::mp_capacity(
                        &config,
                        info.stat(StatId::Mag),
                        info.stat(StatId::Foc),
                    );
                    self.restore_mp(target, amount);
                }
            }
            EffectKind::Revive { heal_to_full } => {
                for &target in targets {
                    self.resurrect(target, *heal_to_full)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::testing::battle_with;
    use crate::content::action::DamageType;

    #[test]
    fn test_insta_kill() {
        let mut battle = battle_with("dummyFight");
        let scott = battle.player_units()[0];
        let dummy = battle.enemy_units()[0];
        let effect = Effect::new(EffectKind::InstaKill {
            damage_type: DamageType::Physical,
        });
        battle.apply_effect(scott, &[dummy], &effect).unwrap();
        assert!(!battle.unit(dummy).is_alive());
    }

    #[test]
    fn test_revive_to_full() {
        let mut battle = battle_with("dummyFight");
        let scott = battle.player_units()[0];
        let dummy = battle.enemy_units()[0];
        battle.die(scott).unwrap();
        let effect = Effect::new(EffectKind::Revive { heal_to_full: true });
        battle.apply_effect(dummy, &[scott], &effect).unwrap();
        assert_eq!(battle.unit(scott).hp(), battle.unit(scott).max_hp());
    }

    #[test]
    fn test_devour_teaches_munch_skill() {
        let mut battle = battle_with("munchFight");
        let scott = battle.player_units()[0];
        let snack = battle.enemy_units()[0];
        let effect = Effect::new(EffectKind::Devour);
        battle.apply_effect(scott, &[snack], &effect).unwrap();
        assert!(!battle.unit(snack).is_alive());
        assert!(battle
            .unit(scott)
            .skills()
            .iter()
            .any(|s| s.skill_id == "omni"));
    }

    #[test]
    fn test_status_chance_zero_never_lands() {
        let mut battle = battle_with("dummyFight");
        let scott = battle.player_units()[0];
        let dummy = battle.enemy_units()[0];
        let effect = Effect::new(EffectKind::Damage {
            damage_type: DamageType::Magic,
            power: 1.0,
            element: None,
            add_status: Some("sleep".into()),
            status_chance: Some(0.0),
            recoil: None,
        });
        battle.apply_effect(scott, &[dummy], &effect).unwrap();
        assert!(!battle.unit(dummy).has_status("sleep"));
    }

    #[test]
    fn test_recover_hp_is_a_percentage() {
        let mut battle = battle_with("dummyFight");
        let scott = battle.player_units()[0];
        let max_hp = battle.unit(scott).max_hp();
        battle
            .take_damage(scott, max_hp as f64 / 2.0, &[], true)
            .unwrap();
        let before = battle.unit(scott).hp();
        let effect = Effect::new(EffectKind::RecoverHp { strength: 10.0 });
        battle.apply_effect(scott, &[scott], &effect).unwrap();
        let expected = (before + (max_hp as f64 * 0.1).round() as u32).min(max_hp);
        assert_eq!(battle.unit(scott).hp(), expected);
    }
}
