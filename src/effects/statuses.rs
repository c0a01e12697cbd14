//! Built-in status catalogue

use crate::combat::stance::Stance;
use crate::content::action::{DamageType, EffectKind};
use crate::core::error::Result;
use crate::core::types::StatId;
use crate::effects::events::{
    has_any_tag, has_tag, tags, ActingEvent, AfflictEvent, AimingEvent, AttackedEvent, CureEvent,
    DamageEvent, DyingEvent, HealEvent, TurnEvent,
};
use crate::effects::status::{StatusCx, StatusDef, StatusHooks, StatusState};

pub fn builtin_statuses() -> Vec<StatusDef> {
    vec![
        StatusDef {
            id: "crackdown",
            name: "Crackdown",
            tags: &["debuff"],
            overrules: &[],
            weakened_stats: &[],
            hooks: StatusHooks {
                initialize: Some(crackdown_init),
                acting: Some(crackdown_acting),
                ..StatusHooks::default()
            },
        },
        StatusDef {
            id: "curse",
            name: "Curse",
            tags: &["debuff"],
            overrules: &[],
            weakened_stats: &[],
            hooks: StatusHooks {
                initialize: Some(curse_init),
                afflicted: Some(curse_afflicted),
                begin_turn: Some(expire_on_turn),
                ..StatusHooks::default()
            },
        },
        StatusDef {
            id: "delusion",
            name: "Delusion",
            tags: &["ailment", "acute"],
            overrules: &[],
            weakened_stats: &[],
            hooks: StatusHooks::default(),
        },
        StatusDef {
            id: "disarray",
            name: "Disarray",
            tags: &["ailment", "acute"],
            overrules: &[],
            weakened_stats: &[],
            hooks: StatusHooks {
                initialize: Some(disarray_init),
                acting: Some(disarray_acting),
                ..StatusHooks::default()
            },
        },
        StatusDef {
            id: "drunk",
            name: "Drunk",
            tags: &["acute"],
            overrules: &["immune"],
            weakened_stats: &[StatId::Agi],
            hooks: StatusHooks {
                initialize: Some(drunk_init),
                acting: Some(drunk_acting),
                aiming: Some(drunk_aiming),
                begin_turn: Some(expire_on_turn),
                damaged: Some(drunk_damaged),
                ..StatusHooks::default()
            },
        },
        StatusDef {
            id: "fear",
            name: "Fear",
            tags: &["ailment"],
            overrules: &[],
            weakened_stats: &[],
            hooks: StatusHooks::default(),
        },
        StatusDef {
            id: "finalStand",
            name: "Final Stand",
            tags: &["special"],
            overrules: &["crackdown", "disarray"],
            weakened_stats: &[],
            hooks: StatusHooks {
                initialize: Some(final_stand_init),
                acting: Some(final_stand_acting),
                attacked: Some(final_stand_attacked),
                damaged: Some(final_stand_damaged),
                ..StatusHooks::default()
            },
        },
        StatusDef {
            id: "frostbite",
            name: "Frostbite",
            tags: &["ailment", "damage"],
            overrules: &["ignite"],
            weakened_stats: &[],
            hooks: StatusHooks {
                initialize: Some(multiplier_init),
                attacked: Some(frostbite_attacked),
                damaged: Some(frostbite_damaged),
                end_turn: Some(frostbite_end_turn),
                ..StatusHooks::default()
            },
        },
        StatusDef {
            id: "ghost",
            name: "Ghost",
            tags: &["ailment", "undead"],
            overrules: &["zombie"],
            weakened_stats: &[],
            hooks: StatusHooks {
                aiming: Some(ghost_aiming),
                attacked: Some(ghost_attacked),
                ..StatusHooks::default()
            },
        },
        StatusDef {
            id: "ignite",
            name: "Ignite",
            tags: &["ailment", "damage"],
            overrules: &["frostbite"],
            weakened_stats: &[],
            hooks: StatusHooks {
                initialize: Some(multiplier_init),
                begin_cycle: Some(ignite_begin_cycle),
                attacked: Some(ignite_attacked),
                damaged: Some(ignite_damaged),
                ..StatusHooks::default()
            },
        },
        StatusDef {
            id: "immune",
            name: "Immune",
            tags: &["buff"],
            overrules: &[],
            weakened_stats: &[],
            hooks: StatusHooks {
                initialize: Some(immune_init),
                afflicted: Some(immune_afflicted),
                begin_turn: Some(expire_on_turn),
                ..StatusHooks::default()
            },
        },
        StatusDef {
            id: "offGuard",
            name: "Off Guard",
            tags: &["special"],
            overrules: &[],
            weakened_stats: &[],
            hooks: StatusHooks {
                begin_turn: Some(lift_on_turn),
                damaged: Some(off_guard_damaged),
                ..StatusHooks::default()
            },
        },
        StatusDef {
            id: "protect",
            name: "Protect",
            tags: &["buff"],
            overrules: &[],
            weakened_stats: &[],
            hooks: StatusHooks {
                initialize: Some(protect_init),
                damaged: Some(protect_damaged),
                ..StatusHooks::default()
            },
        },
        StatusDef {
            id: "reGen",
            name: "ReGen",
            tags: &["buff"],
            overrules: &[],
            weakened_stats: &[],
            hooks: StatusHooks {
                initialize: Some(regen_init),
                begin_cycle: Some(regen_begin_cycle),
                ..StatusHooks::default()
            },
        },
        StatusDef {
            id: "rearing",
            name: "Rearing",
            tags: &["special"],
            overrules: &[],
            weakened_stats: &[],
            hooks: StatusHooks {
                begin_turn: Some(lift_on_turn),
                damaged: Some(rearing_damaged),
                ..StatusHooks::default()
            },
        },
        StatusDef {
            id: "skeleton",
            name: "Skeleton",
            tags: &["undead"],
            overrules: &["ghost", "zombie"],
            weakened_stats: &[StatId::Str, StatId::Mag],
            hooks: StatusHooks {
                initialize: Some(undead_init),
                cured: Some(skeleton_cured),
                damaged: Some(skeleton_damaged),
                dying: Some(skeleton_dying),
                healed: Some(skeleton_healed),
                ..StatusHooks::default()
            },
        },
        StatusDef {
            id: "sleep",
            name: "Sleep",
            tags: &["acute"],
            overrules: &["drunk", "offGuard"],
            weakened_stats: &[],
            hooks: StatusHooks {
                initialize: Some(sleep_init),
                begin_cycle: Some(sleep_begin_cycle),
                begin_turn: Some(sleep_begin_turn),
                damaged: Some(sleep_damaged),
                ..StatusHooks::default()
            },
        },
        StatusDef {
            id: "sniper",
            name: "Sniper",
            tags: &["special"],
            overrules: &[],
            weakened_stats: &[],
            hooks: StatusHooks {
                begin_turn: Some(lift_on_turn),
                damaged: Some(sniper_damaged),
                ..StatusHooks::default()
            },
        },
        StatusDef {
            id: "specsAura",
            name: "Specs Aura",
            tags: &["special"],
            overrules: &[],
            weakened_stats: &[],
            hooks: StatusHooks {
                begin_cycle: Some(specs_aura_begin_cycle),
                ..StatusHooks::default()
            },
        },
        StatusDef {
            id: "zombie",
            name: "Zombie",
            tags: &["ailment", "undead"],
            overrules: &[],
            weakened_stats: &[],
            hooks: StatusHooks {
                initialize: Some(undead_init),
                damaged: Some(zombie_damaged),
                dying: Some(zombie_dying),
                healed: Some(zombie_healed),
                ..StatusHooks::default()
            },
        },
    ]
}

// === SHARED HOOKS ===

fn expire_on_turn(cx: &mut StatusCx<'_>, _event: &mut TurnEvent) -> Result<()> {
    if cx.count_down() {
        cx.lift_self()?;
    }
    Ok(())
}

fn lift_on_turn(cx: &mut StatusCx<'_>, _event: &mut TurnEvent) -> Result<()> {
    cx.lift_self()?;
    Ok(())
}

fn multiplier_init(cx: &mut StatusCx<'_>, _: &mut ()) -> Result<()> {
    cx.set_state(StatusState::Multiplier { multiplier: 1.0 });
    Ok(())
}

fn undead_init(cx: &mut StatusCx<'_>, _: &mut ()) -> Result<()> {
    cx.set_state(StatusState::Undead { allow_death: false });
    Ok(())
}

fn set_allow_death(cx: &mut StatusCx<'_>, allow: bool) {
    if let Some(StatusState::Undead { allow_death }) = cx.state() {
        *allow_death = allow;
    }
}

fn allow_death(cx: &mut StatusCx<'_>) -> bool {
    matches!(cx.state(), Some(StatusState::Undead { allow_death: true }))
}

fn state_multiplier(cx: &mut StatusCx<'_>) -> f64 {
    match cx.state() {
        Some(StatusState::Multiplier { multiplier }) => *multiplier,
        _ => 1.0,
    }
}

/// Strip one element-status pairing out of an incoming action
fn strip_status_from_action(event: &mut AttackedEvent, status: &str) {
    for effect in event.action.effects.iter_mut() {
        match &mut effect.kind {
            EffectKind::Damage { add_status, .. } | EffectKind::Heal { add_status, .. }
                if add_status.as_deref() == Some(status) =>
            {
                *add_status = None;
            }
            EffectKind::AddStatus { status: id } if *id == status => {
                effect.suppressed = true;
            }
            _ => {}
        }
    }
}

// === CRACKDOWN ===

fn crackdown_init(cx: &mut StatusCx<'_>, _: &mut ()) -> Result<()> {
    cx.set_state(StatusState::Crackdown {
        last_category: None,
        multiplier: 1.0,
    });
    Ok(())
}

fn crackdown_acting(cx: &mut StatusCx<'_>, event: &mut ActingEvent) -> Result<()> {
    let bonus = cx.bonus();
    let mut factor = 1.0;
    if let Some(StatusState::Crackdown {
        last_category,
        multiplier,
    }) = cx.state()
    {
        if let Some(category) = &event.skill_category {
            *multiplier = if last_category.as_ref() == Some(category) {
                *multiplier / bonus.sqrt()
            } else {
                1.0
            };
            *last_category = Some(category.clone());
        }
        factor = *multiplier;
    }
    for effect in event.action.effects.iter_mut().filter(|e| e.is_damage()) {
        effect.scale_power(factor);
    }
    Ok(())
}

// === CURSE ===

fn curse_init(cx: &mut StatusCx<'_>, _: &mut ()) -> Result<()> {
    cx.set_state(StatusState::Turns { turns_left: 5 });
    cx.battle.lift_status_tags(cx.unit, &["buff"])?;
    Ok(())
}

fn curse_afflicted(cx: &mut StatusCx<'_>, event: &mut AfflictEvent) -> Result<()> {
    let content = cx.battle.content();
    if content.status(&event.status_id)?.has_tag("buff") {
        tracing::debug!(status = %event.status_id, "buff blocked by curse");
        event.cancel = true;
    }
    Ok(())
}

// === DISARRAY ===

fn disarray_init(cx: &mut StatusCx<'_>, _: &mut ()) -> Result<()> {
    cx.set_state(StatusState::Actions { actions_taken: 0 });
    Ok(())
}

fn disarray_acting(cx: &mut StatusCx<'_>, event: &mut ActingEvent) -> Result<()> {
    event.action.rank = cx.battle.rng_mut().range(1, 5);
    let spent = match cx.state() {
        Some(StatusState::Actions { actions_taken }) => {
            *actions_taken += 1;
            *actions_taken >= 3
        }
        _ => false,
    };
    if spent {
        cx.lift_self()?;
    }
    Ok(())
}

// === DRUNK ===

fn drunk_init(cx: &mut StatusCx<'_>, _: &mut ()) -> Result<()> {
    let base_vit = cx.battle.unit(cx.unit).base_stat(StatId::Vit) as f64;
    let turns_left = 10 - (5.0 * base_vit / 100.0).round() as i32 + 1;
    cx.set_state(StatusState::Turns { turns_left });
    Ok(())
}

fn drunk_acting(cx: &mut StatusCx<'_>, event: &mut ActingEvent) -> Result<()> {
    let bonus = cx.bonus();
    for effect in event.action.effects.iter_mut().filter(|e| e.is_damage()) {
        effect.scale_power(bonus);
    }
    Ok(())
}

fn drunk_aiming(cx: &mut StatusCx<'_>, event: &mut AimingEvent) -> Result<()> {
    event.aim_rate /= cx.bonus().sqrt();
    Ok(())
}

fn drunk_damaged(cx: &mut StatusCx<'_>, event: &mut DamageEvent) -> Result<()> {
    if has_tag(&event.tags, "earth") {
        event.amount *= cx.bonus();
    }
    Ok(())
}

// === FINAL STAND ===

fn final_stand_init(cx: &mut StatusCx<'_>, _: &mut ()) -> Result<()> {
    cx.set_state(StatusState::FinalStand {
        fatigue: 1.0,
        knockback: 5,
    });
    Ok(())
}

fn final_stand_acting(cx: &mut StatusCx<'_>, event: &mut ActingEvent) -> Result<()> {
    let fatigue = match cx.state() {
        Some(StatusState::FinalStand { fatigue, .. }) => *fatigue,
        _ => 1.0,
    };
    for effect in event.action.effects.iter_mut().filter(|e| e.is_damage()) {
        effect.scale_power(1.0 / fatigue);
    }
    Ok(())
}

fn final_stand_attacked(cx: &mut StatusCx<'_>, event: &mut AttackedEvent) -> Result<()> {
    if event.stance != Stance::Counter {
        return Ok(());
    }
    let bonus = cx.bonus();
    let rank = match cx.state() {
        Some(StatusState::FinalStand { fatigue, knockback }) => {
            *fatigue *= bonus;
            let rank = *knockback;
            *knockback += 1;
            Some(rank)
        }
        _ => None,
    };
    if let Some(rank) = rank {
        cx.battle.reset_counter(cx.unit, rank, false);
    }
    Ok(())
}

fn final_stand_damaged(cx: &mut StatusCx<'_>, event: &mut DamageEvent) -> Result<()> {
    if !has_tag(&event.tags, "zombie") {
        if let Some(StatusState::FinalStand { fatigue, .. }) = cx.state() {
            event.amount *= *fatigue;
        }
    }
    Ok(())
}

// === FROSTBITE / IGNITE ===

fn frostbite_attacked(_cx: &mut StatusCx<'_>, event: &mut AttackedEvent) -> Result<()> {
    strip_status_from_action(event, "ignite");
    Ok(())
}

fn frostbite_damaged(cx: &mut StatusCx<'_>, event: &mut DamageEvent) -> Result<()> {
    if has_tag(&event.tags, "fire") && cx.battle.unit(cx.unit).stance() != Stance::Guard {
        event.amount *= cx.bonus();
        cx.lift_self()?;
    }
    Ok(())
}

fn frostbite_end_turn(cx: &mut StatusCx<'_>, _: &mut ()) -> Result<()> {
    let multiplier = state_multiplier(cx);
    if let Some(StatusState::Multiplier { multiplier }) = cx.state() {
        *multiplier = (*multiplier + 0.1).min(2.0);
    }
    let amount = 0.5 * cx.vitality() * multiplier;
    cx.battle
        .take_damage(cx.unit, amount, &tags(&["ice", "special"]), false)
}

fn ignite_begin_cycle(cx: &mut StatusCx<'_>, _: &mut ()) -> Result<()> {
    let multiplier = state_multiplier(cx);
    if let Some(StatusState::Multiplier { multiplier }) = cx.state() {
        *multiplier = (*multiplier - 0.05).max(0.5);
    }
    let amount = 0.5 * cx.vitality() * multiplier;
    cx.battle
        .take_damage(cx.unit, amount, &tags(&["fire", "special"]), false)
}

fn ignite_attacked(_cx: &mut StatusCx<'_>, event: &mut AttackedEvent) -> Result<()> {
    strip_status_from_action(event, "frostbite");
    Ok(())
}

fn ignite_damaged(cx: &mut StatusCx<'_>, event: &mut DamageEvent) -> Result<()> {
    if has_tag(&event.tags, "ice") && cx.battle.unit(cx.unit).stance() != Stance::Guard {
        event.amount *= cx.bonus();
        cx.lift_self()?;
    }
    Ok(())
}

// === GHOST ===

fn ghost_aiming(_cx: &mut StatusCx<'_>, event: &mut AimingEvent) -> Result<()> {
    let physical = event.action.effects.iter().any(|e| {
        matches!(e.kind, EffectKind::Damage { damage_type, .. } if damage_type != DamageType::Magic)
    });
    if physical && !event.target_info.has_status("ghost") {
        event.aim_rate = 0.0;
    }
    Ok(())
}

fn ghost_attacked(_cx: &mut StatusCx<'_>, event: &mut AttackedEvent) -> Result<()> {
    let physical = event.action.effects.iter().any(|e| {
        matches!(e.kind, EffectKind::Damage { damage_type, .. } if damage_type != DamageType::Magic)
    });
    if physical && !event.acting_unit_info.has_status("ghost") {
        event.action.accuracy_rate = 0.0;
    }
    Ok(())
}

// === IMMUNE ===

fn immune_init(cx: &mut StatusCx<'_>, _: &mut ()) -> Result<()> {
    cx.set_state(StatusState::Turns { turns_left: 5 });
    Ok(())
}

fn immune_afflicted(cx: &mut StatusCx<'_>, event: &mut AfflictEvent) -> Result<()> {
    let content = cx.battle.content();
    if content.status(&event.status_id)?.has_tag("ailment") {
        tracing::debug!(status = %event.status_id, "ailment blocked by immune");
        event.cancel = true;
    }
    Ok(())
}

// === ONE-TURN STANCES ===

fn off_guard_damaged(cx: &mut StatusCx<'_>, event: &mut DamageEvent) -> Result<()> {
    if event.acting_unit.is_some() {
        event.amount *= cx.bonus().sqrt();
    }
    Ok(())
}

fn rearing_damaged(cx: &mut StatusCx<'_>, event: &mut DamageEvent) -> Result<()> {
    if has_any_tag(&event.tags, &["physical", "earth"]) {
        cx.battle.clear_queue(cx.unit);
        cx.lift_self()?;
        cx.battle.reset_counter(cx.unit, 5, false);
    }
    if !has_any_tag(&event.tags, &["special", "magic"]) {
        event.amount *= 2.0;
    }
    Ok(())
}

fn sniper_damaged(cx: &mut StatusCx<'_>, event: &mut DamageEvent) -> Result<()> {
    if !has_any_tag(&event.tags, &["special", "zombie"]) {
        event.amount *= cx.bonus().sqrt();
        cx.battle.clear_queue(cx.unit);
        cx.lift_self()?;
        cx.battle.reset_counter(cx.unit, 1, false);
    }
    Ok(())
}

// === PROTECT ===

fn protect_init(cx: &mut StatusCx<'_>, _: &mut ()) -> Result<()> {
    let multiplier = 1.0 / cx.bonus();
    cx.set_state(StatusState::Protect {
        multiplier,
        loss_per_hit: (1.0 - multiplier) / 10.0,
    });
    Ok(())
}

fn protect_damaged(cx: &mut StatusCx<'_>, event: &mut DamageEvent) -> Result<()> {
    if has_any_tag(&event.tags, &["special", "zombie"]) {
        return Ok(());
    }
    let worn_out = match cx.state() {
        Some(StatusState::Protect {
            multiplier,
            loss_per_hit,
        }) => {
            event.amount *= *multiplier;
            *multiplier += *loss_per_hit;
            *multiplier >= 1.0
        }
        _ => false,
    };
    if worn_out {
        cx.lift_self()?;
    }
    Ok(())
}

// === REGEN / SPECS AURA ===

fn regen_init(cx: &mut StatusCx<'_>, _: &mut ()) -> Result<()> {
    cx.set_state(StatusState::Turns { turns_left: 10 });
    Ok(())
}

fn regen_begin_cycle(cx: &mut StatusCx<'_>, _: &mut ()) -> Result<()> {
    let amount = cx.vitality();
    cx.battle.heal(cx.unit, amount, &tags(&["cure"]), false)?;
    if cx.count_down() {
        cx.lift_self()?;
    }
    Ok(())
}

fn specs_aura_begin_cycle(cx: &mut StatusCx<'_>, _: &mut ()) -> Result<()> {
    let amount = 0.25 * cx.vitality();
    cx.battle.heal(cx.unit, amount, &tags(&["specs"]), false)
}

// === SLEEP ===

fn sleep_init(cx: &mut StatusCx<'_>, _: &mut ()) -> Result<()> {
    cx.set_state(StatusState::Sleep { wake_chance: 0.0 });
    cx.battle.animate(cx.unit, "sleep");
    Ok(())
}

fn sleep_begin_cycle(cx: &mut StatusCx<'_>, _: &mut ()) -> Result<()> {
    let chance = match cx.state() {
        Some(StatusState::Sleep { wake_chance }) => {
            let chance = *wake_chance;
            *wake_chance += 0.01;
            chance
        }
        _ => return Ok(()),
    };
    if cx.battle.rng_mut().chance(chance) {
        cx.lift_self()?;
    }
    Ok(())
}

fn sleep_begin_turn(_cx: &mut StatusCx<'_>, event: &mut TurnEvent) -> Result<()> {
    event.skip_turn = true;
    Ok(())
}

fn sleep_damaged(cx: &mut StatusCx<'_>, event: &mut DamageEvent) -> Result<()> {
    if has_any_tag(&event.tags, &["magic", "special"]) {
        return Ok(());
    }
    let wake_chance = match cx.state() {
        Some(StatusState::Sleep { wake_chance }) => *wake_chance,
        _ => return Ok(()),
    };
    let max_hp = cx.battle.unit(cx.unit).max_hp().max(1) as f64;
    let health_lost = 100.0 * event.amount / max_hp;
    if cx.battle.rng_mut().chance(health_lost * 5.0 * wake_chance) {
        cx.lift_self()?;
    }
    Ok(())
}

// === UNDEAD ===

fn skeleton_cured(cx: &mut StatusCx<'_>, event: &mut CureEvent) -> Result<()> {
    if event.status_id == "skeleton" {
        cx.battle.heal(cx.unit, 1.0, &[], true)?;
    }
    Ok(())
}

fn skeleton_damaged(cx: &mut StatusCx<'_>, event: &mut DamageEvent) -> Result<()> {
    let allow = has_any_tag(
        &event.tags,
        &["zombie", "physical", "sword", "earth", "omni"],
    );
    set_allow_death(cx, allow);
    if !allow {
        event.cancel = true;
    }
    Ok(())
}

fn skeleton_dying(cx: &mut StatusCx<'_>, event: &mut DyingEvent) -> Result<()> {
    event.cancel = !allow_death(cx);
    Ok(())
}

fn skeleton_healed(cx: &mut StatusCx<'_>, event: &mut HealEvent) -> Result<()> {
    if has_tag(&event.tags, "cure") {
        cx.battle
            .take_damage(cx.unit, event.amount, &tags(&["zombie"]), false)?;
        event.cancel = true;
    }
    Ok(())
}

fn zombie_damaged(cx: &mut StatusCx<'_>, event: &mut DamageEvent) -> Result<()> {
    let allow = has_tag(&event.tags, "zombie") && !has_tag(&event.tags, "specs");
    set_allow_death(cx, allow);
    Ok(())
}

fn zombie_dying(cx: &mut StatusCx<'_>, event: &mut DyingEvent) -> Result<()> {
    if !allow_death(cx) {
        let unit = cx.unit;
        cx.battle.add_status(unit, "skeleton", false)?;
        event.cancel = true;
    }
    Ok(())
}

fn zombie_healed(cx: &mut StatusCx<'_>, event: &mut HealEvent) -> Result<()> {
    if has_any_tag(&event.tags, &["cure", "specs"]) {
        let damage_tags = if has_tag(&event.tags, "specs") {
            tags(&["zombie", "specs"])
        } else {
            tags(&["zombie"])
        };
        cx.battle
            .take_damage(cx.unit, event.amount, &damage_tags, false)?;
        event.cancel = true;
    }
    Ok(())
}
