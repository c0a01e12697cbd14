//! Battle system integration tests

use std::path::Path;
use std::sync::Arc;

use saga_battle::battle::*;
use saga_battle::combat::Stance;
use saga_battle::effects::events::tags;
use saga_battle::{ContentRegistry, FixedRng, SeededRng, UnitRef};

fn content() -> Arc<ContentRegistry> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/content.toml");
    Arc::new(ContentRegistry::load(&path).unwrap())
}

fn autopilot_party(members: &[(&str, u32)]) -> PartySetup {
    PartySetup::new(
        members
            .iter()
            .map(|&(id, level)| PartyMemberSetup::new(id, level).with_autopilot("basic"))
            .collect(),
    )
}

#[test]
fn test_ai_phase_ratchets_once() {
    let party = autopilot_party(&[("scott", 10)]);
    let mut battle = Battle::new(content(), "phaseFight", &party, Box::new(FixedRng::new(0.0))).unwrap();
    let golem = battle.enemy_units()[0];
    assert_eq!(battle.unit(golem).hp(), 9000);

    battle.update_ai_phase(golem).unwrap();
    assert_eq!(battle.ai_phase(golem), Some(1));

    battle.take_damage(golem, 6500.0, &[], true).unwrap();
    assert_eq!(battle.unit(golem).hp(), 2500);
    battle.update_ai_phase(golem).unwrap();
    battle.update_ai_phase(golem).unwrap();
    assert_eq!(battle.ai_phase(golem), Some(2));

    // healing back up never lowers the phase
    battle.heal(golem, 9000.0, &[], true).unwrap();
    battle.update_ai_phase(golem).unwrap();
    assert_eq!(battle.ai_phase(golem), Some(2));

    let entered_second = battle.log().count(|e| {
        matches!(e, BattleEventType::PhaseChanged { unit, phase: 2, last_phase: 1 } if *unit == golem)
    });
    assert_eq!(entered_second, 1);
}

#[test]
fn test_opposing_fields_annihilate_into_zombies() {
    let party = autopilot_party(&[("scott", 10)]);
    let mut battle = Battle::new(content(), "dummyFight", &party, Box::new(FixedRng::new(0.0))).unwrap();

    assert!(battle.add_condition("inferno").unwrap());
    assert!(!battle.add_condition("subzero").unwrap());

    assert!(!battle.has_condition("inferno"));
    assert!(!battle.has_condition("subzero"));
    for unit in battle.living_units() {
        assert!(battle.unit(unit).has_status("zombie"));
    }
    assert_eq!(
        battle
            .log()
            .count(|e| matches!(e, BattleEventType::ConditionCancelled { condition } if condition == "subzero")),
        1
    );
}

#[test]
fn test_adding_an_active_condition_is_a_noop() {
    let party = autopilot_party(&[("scott", 10)]);
    let mut battle = Battle::new(content(), "dummyFight", &party, Box::new(FixedRng::new(0.0))).unwrap();
    assert!(battle.add_condition("healingAura").unwrap());
    assert!(!battle.add_condition("healingAura").unwrap());
    assert_eq!(battle.condition_ids(), vec!["healingAura"]);
}

#[test]
fn test_zombie_death_rises_as_skeleton() {
    let party = autopilot_party(&[("scott", 10)]);
    let mut battle = Battle::new(content(), "dummyFight", &party, Box::new(FixedRng::new(0.0))).unwrap();
    let dummy = battle.enemy_units()[0];
    assert!(battle.add_status(dummy, "zombie", false).unwrap());

    battle.take_damage(dummy, 5000.0, &tags(&["sword"]), false).unwrap();

    let unit = battle.unit(dummy);
    assert_eq!(unit.hp(), 0);
    assert!(unit.is_alive());
    assert!(unit.has_status("skeleton"));
    assert!(!unit.has_status("zombie"));
    assert_eq!(
        battle
            .log()
            .count(|e| matches!(e, BattleEventType::DeathSuspended { unit } if *unit == dummy)),
        1
    );
}

#[test]
fn test_zombie_damage_kills_a_zombie() {
    let party = autopilot_party(&[("scott", 10)]);
    let mut battle = Battle::new(content(), "dummyFight", &party, Box::new(FixedRng::new(0.0))).unwrap();
    let dummy = battle.enemy_units()[0];
    battle.add_status(dummy, "zombie", false).unwrap();

    battle.take_damage(dummy, 5000.0, &tags(&["zombie"]), false).unwrap();
    assert!(!battle.unit(dummy).is_alive());
}

#[test]
fn test_scott_temple_opens_on_elysia() {
    let party = autopilot_party(&[("scott", 10), ("elysia", 10)]);
    let mut battle = Battle::new(content(), "scottFight", &party, Box::new(SeededRng::new(11))).unwrap();
    let temple = battle.enemy_units()[0];
    let elysia = battle.find_unit("elysia").unwrap();
    assert_eq!(battle.unit(temple).full_name(), "Scott Victor Temple");

    for _ in 0..20 {
        battle.update().unwrap();
        if battle
            .log()
            .count(|e| matches!(e, BattleEventType::ActionAnnounced { unit, .. } if *unit == temple))
            > 0
        {
            break;
        }
    }

    let opener = battle
        .log()
        .iter()
        .find_map(|e| match &e.event_type {
            BattleEventType::ActionAnnounced { unit, text } if *unit == temple => Some(text.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(opener, "Omni");
    assert!(
        battle
            .log()
            .count(|e| matches!(e, BattleEventType::Damaged { unit, .. } if *unit == elysia))
            > 0
    );
}

#[test]
fn test_player_turn_resumes_after_input() {
    let selector = ScriptedSelector::new();
    let party = PartySetup::new(vec![PartyMemberSetup::new("scott", 10)]);
    let mut battle = Battle::new(content(), "dummyFight", &party, Box::new(FixedRng::new(0.0)))
        .unwrap()
        .with_move_selector(Box::new(selector.clone()));
    let scott = battle.player_units()[0];
    let dummy = battle.enemy_units()[0];

    for _ in 0..50 {
        battle.update().unwrap();
        if battle.pending_input().is_some() {
            break;
        }
    }
    let pending = battle.pending_input().unwrap();
    assert_eq!(pending.unit(), scott);
    assert_eq!(pending.stance(), Stance::Attack);

    selector.push(ChosenMove::skill("swordSlash", 10, vec![dummy]));
    battle.update().unwrap();
    assert!(battle.pending_input().is_none());
    assert!(
        battle
            .log()
            .count(|e| matches!(e, BattleEventType::ActionAnnounced { text, .. } if text == "Sword Slash"))
            == 1
    );
}

#[test]
fn test_autopilot_battle_finishes() {
    let party = autopilot_party(&[("scott", 10), ("elysia", 10)]);
    let mut battle = Battle::new(content(), "goblinFight", &party, Box::new(SeededRng::new(7))).unwrap();

    let result = battle.run(20_000).unwrap();
    assert!(matches!(result, Some(BattleResult::Win) | Some(BattleResult::Lose)));
    assert_eq!(battle.mode(), BattleMode::Finished);
    assert!(!battle.update().unwrap());

    let json = battle.log().to_json_lines().unwrap();
    assert_eq!(json.lines().count(), battle.log().len());
    assert!(json.contains("BattleEnded"));
}

#[test]
fn test_flee_ends_the_battle() {
    let party = autopilot_party(&[("scott", 10)]);
    let mut battle = Battle::new(content(), "goblinFight", &party, Box::new(SeededRng::new(3))).unwrap();
    battle.update().unwrap();
    battle.flee();
    assert!(!battle.update().unwrap());
    assert_eq!(battle.result(), Some(BattleResult::Flee));
}

#[test]
fn test_spawn_enemy_mid_battle() {
    let party = autopilot_party(&[("scott", 10)]);
    let mut battle = Battle::new(content(), "dummyFight", &party, Box::new(FixedRng::new(0.0))).unwrap();
    battle.update().unwrap();
    let slime = battle.spawn_enemy("snack").unwrap();
    assert_eq!(battle.enemy_units().len(), 2);
    assert_eq!(battle.turn_order()[1], slime);
    assert!(battle.unit(slime).has_ai());
    assert_eq!(slime, UnitRef(2));
}
