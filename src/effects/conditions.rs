//! Built-in field condition catalogue

use crate::combat::formulas;
use crate::combat::stat::stat_value;
use crate::core::error::Result;
use crate::core::types::{StatId, UnitRef};
use crate::effects::condition::{ConditionCx, ConditionDef, ConditionHooks, ConditionState};
use crate::effects::events::{
    tags, ActionTakenEvent, AfflictEvent, ConditionInstalledEvent, EndTurnEvent,
};

pub fn builtin_conditions() -> Vec<ConditionDef> {
    vec![
        ConditionDef {
            id: "blackout",
            name: "Blackout",
            hooks: ConditionHooks {
                initialize: Some(blackout_init),
                action_taken: Some(blackout_action_taken),
                ..ConditionHooks::default()
            },
        },
        ConditionDef {
            id: "generalDisarray",
            name: "G. Disarray",
            hooks: ConditionHooks {
                initialize: Some(general_disarray_init),
                action_taken: Some(general_disarray_action_taken),
                ..ConditionHooks::default()
            },
        },
        ConditionDef {
            id: "healingAura",
            name: "Healing Aura",
            hooks: ConditionHooks {
                initialize: Some(healing_aura_init),
                begin_cycle: Some(healing_aura_begin_cycle),
                ..ConditionHooks::default()
            },
        },
        ConditionDef {
            id: "inferno",
            name: "Inferno",
            hooks: ConditionHooks {
                initialize: Some(inferno_init),
                action_taken: Some(inferno_action_taken),
                begin_cycle: Some(inferno_begin_cycle),
                condition_installed: Some(inferno_condition_installed),
                unit_afflicted: Some(inferno_unit_afflicted),
                ..ConditionHooks::default()
            },
        },
        ConditionDef {
            id: "subzero",
            name: "Subzero",
            hooks: ConditionHooks {
                initialize: Some(subzero_init),
                action_taken: Some(subzero_action_taken),
                condition_installed: Some(subzero_condition_installed),
                end_turn: Some(subzero_end_turn),
                unit_afflicted: Some(subzero_unit_afflicted),
                ..ConditionHooks::default()
            },
        },
        ConditionDef {
            id: "thunderstorm",
            name: "Thunderstorm",
            hooks: ConditionHooks {
                initialize: Some(thunderstorm_init),
                end_turn: Some(thunderstorm_end_turn),
                ..ConditionHooks::default()
            },
        },
    ]
}

fn countdown(remaining: i32) -> ConditionState {
    ConditionState::Countdown { remaining }
}

fn random_living_unit(cx: &mut ConditionCx<'_>) -> Option<UnitRef> {
    let living = cx.battle.living_units();
    if living.is_empty() {
        return None;
    }
    let i = cx.battle.rng_mut().index(living.len());
    Some(living[i])
}

fn vitality_of(cx: &ConditionCx<'_>, unit: UnitRef) -> f64 {
    let unit = cx.battle.unit(unit);
    stat_value(unit.base_stat(StatId::Vit), unit.level()) as f64
}

/// Scale every live damage effect of an element
fn scale_element(event: &mut ActionTakenEvent, element: &str, factor: f64) {
    for effect in event.action.element_effects_mut(element) {
        effect.scale_power(factor);
    }
}

/// Two opposing fields cancel out and leave the field full of the undead
fn annihilate(
    cx: &mut ConditionCx<'_>,
    event: &mut ConditionInstalledEvent,
    opposite: &str,
) -> Result<()> {
    if event.condition_id != opposite {
        return Ok(());
    }
    tracing::info!(
        installed = %opposite,
        active = cx.condition_id,
        "opposing field conditions annihilate"
    );
    event.cancel = true;
    cx.lift_self();
    for unit in cx.battle.living_units() {
        cx.battle.add_status(unit, "zombie", true)?;
    }
    Ok(())
}

fn lift_from_living(cx: &mut ConditionCx<'_>, statuses: &[&str]) -> Result<()> {
    for unit in cx.battle.living_units() {
        for status in statuses {
            cx.battle.lift_status(unit, status)?;
        }
    }
    Ok(())
}

// === BLACKOUT ===

fn blackout_init(cx: &mut ConditionCx<'_>, _: &mut ()) -> Result<()> {
    cx.set_state(countdown(10));
    Ok(())
}

fn blackout_action_taken(cx: &mut ConditionCx<'_>, event: &mut ActionTakenEvent) -> Result<()> {
    if event.targets.len() == 1 && cx.battle.rng_mut().chance(0.5) {
        let target = event.targets[0];
        let pool: Vec<UnitRef> = if cx.battle.rng_mut().chance(0.5) {
            cx.battle.allies_of(target).to_vec()
        } else {
            cx.battle.enemies_of(target).to_vec()
        };
        if !pool.is_empty() {
            let i = cx.battle.rng_mut().index(pool.len());
            tracing::debug!(from = target.0, to = pool[i].0, "blackout scrambled target");
            event.targets = vec![pool[i]];
        }
    }
    cx.count_down();
    Ok(())
}

// === GENERAL DISARRAY ===

fn general_disarray_init(cx: &mut ConditionCx<'_>, _: &mut ()) -> Result<()> {
    cx.set_state(countdown(15));
    Ok(())
}

fn general_disarray_action_taken(
    cx: &mut ConditionCx<'_>,
    event: &mut ActionTakenEvent,
) -> Result<()> {
    event.action.rank = cx.battle.rng_mut().range(1, 5);
    cx.count_down();
    Ok(())
}

// === HEALING AURA ===

fn healing_aura_init(cx: &mut ConditionCx<'_>, _: &mut ()) -> Result<()> {
    cx.set_state(countdown(25));
    Ok(())
}

fn healing_aura_begin_cycle(cx: &mut ConditionCx<'_>, _: &mut ()) -> Result<()> {
    if let Some(unit) = random_living_unit(cx) {
        let amount = vitality_of(cx, unit);
        cx.battle.heal(unit, amount, &tags(&["cure"]), false)?;
    }
    cx.count_down();
    Ok(())
}

// === INFERNO ===

fn inferno_init(cx: &mut ConditionCx<'_>, _: &mut ()) -> Result<()> {
    lift_from_living(cx, &["frostbite"])
}

fn inferno_action_taken(cx: &mut ConditionCx<'_>, event: &mut ActionTakenEvent) -> Result<()> {
    let bonus = cx.bonus();
    scale_element(event, "fire", bonus);
    scale_element(event, "ice", 1.0 / bonus);
    Ok(())
}

fn inferno_begin_cycle(cx: &mut ConditionCx<'_>, _: &mut ()) -> Result<()> {
    if let Some(unit) = random_living_unit(cx) {
        let amount = vitality_of(cx, unit);
        cx.battle
            .take_damage(unit, amount, &tags(&["special", "fire"]), false)?;
    }
    Ok(())
}

fn inferno_condition_installed(
    cx: &mut ConditionCx<'_>,
    event: &mut ConditionInstalledEvent,
) -> Result<()> {
    annihilate(cx, event, "subzero")
}

fn inferno_unit_afflicted(_cx: &mut ConditionCx<'_>, event: &mut AfflictEvent) -> Result<()> {
    if event.status_id == "frostbite" {
        event.cancel = true;
    }
    Ok(())
}

// === SUBZERO ===

fn subzero_init(cx: &mut ConditionCx<'_>, _: &mut ()) -> Result<()> {
    cx.set_state(ConditionState::Subzero {
        multiplier: 1.0,
        rank: 0,
    });
    lift_from_living(cx, &["frostbite", "ignite"])
}

fn subzero_action_taken(cx: &mut ConditionCx<'_>, event: &mut ActionTakenEvent) -> Result<()> {
    let bonus = cx.bonus();
    if let Some(ConditionState::Subzero { rank, .. }) = cx.state() {
        *rank = event.action.rank;
    }
    scale_element(event, "ice", bonus);
    scale_element(event, "fire", 1.0 / bonus);
    Ok(())
}

fn subzero_condition_installed(
    cx: &mut ConditionCx<'_>,
    event: &mut ConditionInstalledEvent,
) -> Result<()> {
    annihilate(cx, event, "inferno")
}

fn subzero_end_turn(cx: &mut ConditionCx<'_>, event: &mut EndTurnEvent) -> Result<()> {
    let unit = event.acting_unit;
    let (multiplier, rank) = match cx.state() {
        Some(ConditionState::Subzero { multiplier, rank }) => {
            let taken = (*multiplier, *rank);
            *multiplier = (*multiplier + 0.1 * *rank as f64 / 5.0).min(2.0);
            *rank = 0;
            taken
        }
        _ => return Ok(()),
    };
    if rank == 0 || !cx.battle.unit(unit).is_alive() {
        return Ok(());
    }
    let amount = rank as f64 * vitality_of(cx, unit) * multiplier / 5.0;
    cx.battle
        .take_damage(unit, amount, &tags(&["special", "ice"]), false)
}

fn subzero_unit_afflicted(_cx: &mut ConditionCx<'_>, event: &mut AfflictEvent) -> Result<()> {
    if event.status_id == "frostbite" || event.status_id == "ignite" {
        event.cancel = true;
    }
    Ok(())
}

// === THUNDERSTORM ===

fn thunderstorm_init(cx: &mut ConditionCx<'_>, _: &mut ()) -> Result<()> {
    cx.set_state(countdown(10));
    Ok(())
}

fn thunderstorm_end_turn(cx: &mut ConditionCx<'_>, event: &mut EndTurnEvent) -> Result<()> {
    if !cx.battle.rng_mut().chance(0.5) {
        return Ok(());
    }
    let unit = event.acting_unit;
    if !cx.battle.unit(unit).is_alive() {
        return Ok(());
    }
    tracing::debug!(unit = unit.0, "thunderstorm strike");
    let config = cx.battle.config();
    let amount = formulas::hazard_damage(&config, 5.0, cx.battle.level());
    let roll = cx
        .battle
        .rng_mut()
        .uniform(amount, amount * config.damage_tolerance);
    cx.battle
        .take_damage(unit, roll, &tags(&["special", "lightning"]), false)?;
    cx.battle.lift_status_tags(unit, &["buff"])?;
    cx.count_down();
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::battle::testing::battle_with;
    use crate::content::action::Action;
    use crate::core::rng::BattleRng;

    /// Plays back a fixed list of rolls, then rolls zero
    struct Rolls(VecDeque<f64>);

    impl BattleRng for Rolls {
        fn next_f64(&mut self) -> f64 {
            self.0.pop_front().unwrap_or(0.0)
        }
    }

    #[test]
    fn test_catalogue_ids() {
        let ids: Vec<_> = builtin_conditions().iter().map(|d| d.id).collect();
        for id in [
            "blackout",
            "generalDisarray",
            "healingAura",
            "inferno",
            "subzero",
            "thunderstorm",
        ] {
            assert!(ids.contains(&id));
        }
    }

    #[test]
    fn test_thunderstorm_strikes_acting_unit_and_lifts_buffs() {
        let mut battle = battle_with("dummyFight");
        let dummy = battle.enemy_units()[0];
        let scott = battle.player_units()[0];
        assert!(battle.add_condition("thunderstorm").unwrap());
        assert!(battle.add_status(dummy, "reGen", false).unwrap());

        let mut event = EndTurnEvent { acting_unit: dummy };
        battle.raise_battle_event(|h| h.end_turn, &mut event).unwrap();
        assert!(battle.unit(dummy).hp() < battle.unit(dummy).max_hp());
        assert!(!battle.unit(dummy).has_status("reGen"));
        assert_eq!(battle.unit(scott).hp(), battle.unit(scott).max_hp());
    }

    #[test]
    fn test_blackout_turns_single_target_around() {
        let mut battle = battle_with("dummyFight");
        let dummy = battle.enemy_units()[0];
        let scott = battle.player_units()[0];
        assert!(battle.add_condition("blackout").unwrap());
        battle.rng = Box::new(Rolls(VecDeque::from([0.0, 0.9, 0.0])));

        let mut event = ActionTakenEvent {
            acting_unit: scott,
            action: Action::new(2),
            targets: vec![dummy],
        };
        battle.raise_battle_event(|h| h.action_taken, &mut event).unwrap();
        assert_eq!(event.targets, vec![scott]);
    }

    #[test]
    fn test_blackout_leaves_group_targets_alone() {
        let mut battle = battle_with("dummyFight");
        let dummy = battle.enemy_units()[0];
        let scott = battle.player_units()[0];
        assert!(battle.add_condition("blackout").unwrap());

        let mut event = ActionTakenEvent {
            acting_unit: scott,
            action: Action::new(2),
            targets: vec![dummy, scott],
        };
        battle.raise_battle_event(|h| h.action_taken, &mut event).unwrap();
        assert_eq!(event.targets, vec![dummy, scott]);
    }

    #[test]
    fn test_healing_aura_heals_a_living_unit_by_its_vitality() {
        let mut battle = battle_with("dummyFight");
        assert!(battle.add_condition("healingAura").unwrap());
        for unit in battle.turn_order() {
            battle.take_damage(unit, 100.0, &[], true).unwrap();
        }

        battle.raise_battle_event(|h| h.begin_cycle, &mut ()).unwrap();
        let lucky = battle.living_units()[0];
        let target = battle.unit(lucky);
        let vitality = stat_value(target.base_stat(StatId::Vit), target.level());
        assert_eq!(target.hp(), target.max_hp() - 100 + vitality);
        for unit in battle.turn_order().into_iter().filter(|&u| u != lucky) {
            assert_eq!(battle.unit(unit).hp(), battle.unit(unit).max_hp() - 100);
        }
    }
}
