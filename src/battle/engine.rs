//! Battle orchestrator state, setup and roster queries
//!
//! The battle owns every combatant, the field conditions, the MP pools and
//! the random source. Combatants are addressed by `UnitRef` so hooks can
//! hold a reference to "their" unit while mutating the whole battle.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::battle::ai::strategies::create_strategy;
use crate::battle::ai::{AiEvent, BattleAi};
use crate::battle::interface::{MoveSelector, NullPresenter, Presenter};
use crate::battle::log::{BattleEventLog, BattleEventType, BattleResult};
use crate::battle::unit::BattleUnit;
use crate::battle::usable::{ItemUsable, SkillUsable};
use crate::combat::formulas;
use crate::combat::info::BattlerInfo;
use crate::combat::mp_pool::MpPool;
use crate::combat::stance::Stance;
use crate::combat::stat::{stat_value, Stat};
use crate::content::{BaseStats, ContentRegistry};
use crate::core::config::BattleConfig;
use crate::core::error::Result;
use crate::core::rng::BattleRng;
use crate::core::types::{PoolRef, Side, StatId, Tick, UnitRef};
use crate::effects::condition::{ConditionInstance, ConditionState};
use crate::effects::status::StatusState;

/// Frame driver state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleMode {
    Setup,
    Battle,
    Finished,
}

/// A turn parked while the player picks a move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PendingInput {
    Turn(UnitRef),
    Counter(UnitRef),
}

impl PendingInput {
    pub fn unit(&self) -> UnitRef {
        match *self {
            PendingInput::Turn(unit) | PendingInput::Counter(unit) => unit,
        }
    }

    pub fn stance(&self) -> Stance {
        match self {
            PendingInput::Turn(_) => Stance::Attack,
            PendingInput::Counter(_) => Stance::Counter,
        }
    }
}

/// Where the current cycle is, so a suspended pass resumes in place
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CycleStage {
    /// Ticking units in roster order; `acted` once anyone took a turn
    Units { next: usize, acted: bool },
    EndCycle { next: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartyMemberSetup {
    pub character_id: String,
    pub level: u32,
    #[serde(default)]
    pub items: Vec<String>,
    #[serde(default)]
    pub weapon: Option<String>,
    /// AI strategy id; the member is player-controlled when unset
    #[serde(default)]
    pub autopilot: Option<String>,
}

impl PartyMemberSetup {
    pub fn new(character_id: impl Into<String>, level: u32) -> Self {
        Self {
            character_id: character_id.into(),
            level,
            items: Vec::new(),
            weapon: None,
            autopilot: None,
        }
    }

    pub fn with_items(mut self, items: &[&str]) -> Self {
        self.items = items.iter().map(|i| i.to_string()).collect();
        self
    }

    pub fn with_weapon(mut self, weapon: impl Into<String>) -> Self {
        self.weapon = Some(weapon.into());
        self
    }

    pub fn with_autopilot(mut self, strategy: impl Into<String>) -> Self {
        self.autopilot = Some(strategy.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartySetup {
    pub members: Vec<PartyMemberSetup>,
}

impl PartySetup {
    pub fn new(members: Vec<PartyMemberSetup>) -> Self {
        Self { members }
    }

    /// Rounded average member level
    pub fn level(&self) -> u32 {
        if self.members.is_empty() {
            return 1;
        }
        let total: u32 = self.members.iter().map(|m| m.level).sum();
        ((total as f64 / self.members.len() as f64).round() as u32).max(1)
    }
}

pub struct Battle {
    pub(crate) content: Arc<ContentRegistry>,
    encounter_id: String,
    level: u32,
    pub(crate) units: Vec<BattleUnit>,
    pub(crate) enemy_units: Vec<UnitRef>,
    pub(crate) player_units: Vec<UnitRef>,
    pub(crate) conditions: Vec<ConditionInstance>,
    pub(crate) pools: Vec<MpPool>,
    pub(crate) timer: Tick,
    suspend_count: u32,
    pub(crate) result: Option<BattleResult>,
    pub(crate) mode: BattleMode,
    pub(crate) cycle: Option<CycleStage>,
    pub(crate) pending_input: Option<PendingInput>,
    next_serial: u64,
    pub(crate) rng: Box<dyn BattleRng>,
    pub(crate) presenter: Box<dyn Presenter>,
    pub(crate) selector: Option<Box<dyn MoveSelector>>,
    pub(crate) log: BattleEventLog,
    /// Units whose AI is checked out of the roster right now
    pub(crate) busy_ais: Vec<UnitRef>,
    /// Events raised for a busy AI, delivered once it is back
    pub(crate) held_ai_events: Vec<(UnitRef, AiEvent)>,
}

impl Battle {
    /// Build a battle for an encounter
    ///
    /// Enemies are created first, then the party, which shares one MP
    /// pool funded by every member.
    pub fn new(
        content: Arc<ContentRegistry>,
        encounter_id: &str,
        party: &PartySetup,
        rng: Box<dyn BattleRng>,
    ) -> Result<Self> {
        let encounter = content.encounter(encounter_id)?.clone();
        let level = encounter.battle_level.unwrap_or_else(|| party.level());
        tracing::info!(encounter = encounter_id, level, "initialize battle context");

        let mut battle = Self {
            content: Arc::clone(&content),
            encounter_id: encounter_id.to_string(),
            level,
            units: Vec::new(),
            enemy_units: Vec::new(),
            player_units: Vec::new(),
            conditions: Vec::new(),
            pools: Vec::new(),
            timer: 0,
            suspend_count: 0,
            result: None,
            mode: BattleMode::Setup,
            cycle: None,
            pending_input: None,
            next_serial: 0,
            rng,
            presenter: Box::new(NullPresenter),
            selector: None,
            log: BattleEventLog::new(),
            busy_ais: Vec::new(),
            held_ai_events: Vec::new(),
        };

        for enemy_id in &encounter.enemies {
            battle.spawn_enemy(enemy_id)?;
        }

        let config = content.config;
        let mut party_mp = 0u32;
        for member in &party.members {
            let def = content.character(&member.character_id)?;
            let donated = formulas::mp_capacity(
                &config,
                stat_value(def.base_stats.mag, member.level),
                stat_value(def.base_stats.foc, member.level),
            );
            tracing::debug!(member = %def.name, donated, "MP donated to shared pool");
            party_mp = party_mp.saturating_add(donated);
        }
        let pool = battle.add_pool("partyMP", party_mp.min(config.party_mp_cap));
        for member in &party.members {
            battle.add_party_member(member, pool)?;
        }
        Ok(battle)
    }

    pub fn with_presenter(mut self, presenter: Box<dyn Presenter>) -> Self {
        self.presenter = presenter;
        self
    }

    pub fn with_move_selector(mut self, selector: Box<dyn MoveSelector>) -> Self {
        self.selector = Some(selector);
        self
    }

    fn add_pool(&mut self, id: &str, capacity: u32) -> PoolRef {
        let pool = PoolRef(self.pools.len());
        self.pools.push(MpPool::new(id, capacity));
        pool
    }

    pub(crate) fn next_serial(&mut self) -> u64 {
        self.next_serial += 1;
        self.next_serial
    }

    fn build_stats(&self, base: &BaseStats, level: u32, can_grow: bool) -> [Stat; 6] {
        let curve = self.content.config.growth;
        StatId::ALL.map(|id| Stat::with_curve(base.get(id), level, can_grow, curve))
    }

    /// Add an enemy to the battle, mid-fight or during setup
    pub fn spawn_enemy(&mut self, enemy_id: &str) -> Result<UnitRef> {
        let content = Arc::clone(&self.content);
        let config = content.config;
        let def = content.enemy(enemy_id)?;
        tracing::info!(enemy = enemy_id, "spawn enemy");

        let stats = self.build_stats(&def.base_stats, self.level, false);
        let max_hp = def.max_hp.unwrap_or_else(|| {
            formulas::max_hp(&config, stats[StatId::Vit.index()].value(), def.tier)
        });
        let mp = formulas::mp_capacity(
            &config,
            stats[StatId::Mag.index()].value(),
            stats[StatId::Foc.index()].value(),
        );
        let pool = self.add_pool(&format!("{}MP", enemy_id), mp);

        let mut items = Vec::new();
        for item_id in &def.items {
            let item = content.item(item_id)?;
            items.push(ItemUsable {
                item_id: item_id.clone(),
                uses_left: item.uses,
            });
        }
        let mut skills = Vec::new();
        for skill_id in &def.skills {
            content.skill(skill_id)?;
            skills.push(SkillUsable::new(skill_id.clone(), self.level));
        }
        let weapon_level = match &def.weapon {
            Some(weapon) => content.weapon(weapon)?.level,
            None => 0,
        };
        let strategy = create_strategy(def.ai.as_deref().unwrap_or("basic"))?;

        let unit = UnitRef(self.units.len());
        self.units.push(BattleUnit {
            template_id: enemy_id.to_string(),
            name: def.name.clone(),
            full_name: def.full_name.clone().unwrap_or_else(|| def.name.clone()),
            side: Side::Enemy,
            tier: def.tier,
            turn_ratio: def.turn_ratio,
            has_life_bar: def.has_life_bar,
            hp: max_hp,
            max_hp,
            lazarus: false,
            level: self.level,
            base_stats: def.base_stats,
            stats,
            stance: Stance::Attack,
            new_stance: Stance::Attack,
            statuses: Vec::new(),
            action_queue: Default::default(),
            cv: 0,
            affinities: def.damage_modifiers.clone(),
            immunities: def.immunities.clone(),
            pool,
            skills,
            items,
            weapon: def.weapon.clone(),
            weapon_level,
            munch_skill: def.munch_skill.clone(),
            ai: None,
            move_used: None,
            counter_target: None,
            last_attacker: None,
            disposed: false,
        });
        self.enemy_units.push(unit);
        self.shift_cycle_cursor(self.enemy_units.len() - 1);
        self.reset_counter(unit, config.default_move_rank, true);

        let mut ai = Box::new(BattleAi::new(unit, strategy));
        ai.setup(self)?;
        self.units[unit.0].ai = Some(ai);

        self.log_event(
            BattleEventType::EnemySpawned { unit },
            format!("{} joined the battle", def.name),
        );
        Ok(unit)
    }

    /// Keep a live cycle cursor on the same unit after a roster insert
    fn shift_cycle_cursor(&mut self, inserted_at: usize) {
        self.cycle = match self.cycle {
            Some(CycleStage::Units { next, acted }) if inserted_at < next => {
                Some(CycleStage::Units {
                    next: next + 1,
                    acted,
                })
            }
            Some(CycleStage::EndCycle { next }) if inserted_at < next => {
                Some(CycleStage::EndCycle { next: next + 1 })
            }
            other => other,
        };
    }

    fn add_party_member(&mut self, member: &PartyMemberSetup, pool: PoolRef) -> Result<UnitRef> {
        let content = Arc::clone(&self.content);
        let config = content.config;
        let def = content.character(&member.character_id)?;

        let stats = self.build_stats(&def.base_stats, member.level, true);
        let max_hp = formulas::max_hp(&config, stats[StatId::Vit.index()].value(), 1)
            .min(config.party_hp_cap);

        let mut skills = Vec::new();
        for skill_id in &def.skills {
            content.skill(skill_id)?;
            skills.push(SkillUsable::new(skill_id.clone(), member.level));
        }
        let mut items: Vec<ItemUsable> = Vec::new();
        for item_id in &member.items {
            let item = content.item(item_id)?;
            match items.iter_mut().find(|i| &i.item_id == item_id) {
                Some(owned) => owned.uses_left += item.uses,
                None => items.push(ItemUsable {
                    item_id: item_id.clone(),
                    uses_left: item.uses,
                }),
            }
        }
        let weapon_level = match &member.weapon {
            Some(weapon) => content.weapon(weapon)?.level,
            None => 0,
        };
        let strategy = member
            .autopilot
            .as_deref()
            .map(create_strategy)
            .transpose()?;

        let unit = UnitRef(self.units.len());
        self.units.push(BattleUnit {
            template_id: member.character_id.clone(),
            name: def.name.clone(),
            full_name: def.full_name.clone().unwrap_or_else(|| def.name.clone()),
            side: Side::Party,
            tier: 1,
            turn_ratio: 1.0,
            has_life_bar: true,
            hp: max_hp,
            max_hp,
            lazarus: false,
            level: member.level,
            base_stats: def.base_stats,
            stats,
            stance: Stance::Attack,
            new_stance: Stance::Attack,
            statuses: Vec::new(),
            action_queue: Default::default(),
            cv: 0,
            affinities: Default::default(),
            immunities: Vec::new(),
            pool,
            skills,
            items,
            weapon: member.weapon.clone(),
            weapon_level,
            munch_skill: None,
            ai: None,
            move_used: None,
            counter_target: None,
            last_attacker: None,
            disposed: false,
        });
        self.player_units.push(unit);
        self.reset_counter(unit, config.default_move_rank, true);

        if let Some(strategy) = strategy {
            let mut ai = Box::new(BattleAi::new(unit, strategy));
            ai.setup(self)?;
            self.units[unit.0].ai = Some(ai);
        }
        tracing::debug!(
            unit = %def.name,
            hp = max_hp,
            controller = if self.units[unit.0].has_ai() { "AI" } else { "player" },
            "created party unit"
        );
        Ok(unit)
    }

    // === QUERIES ===

    pub fn encounter_id(&self) -> &str {
        &self.encounter_id
    }

    pub fn content(&self) -> &ContentRegistry {
        &self.content
    }

    pub fn config(&self) -> BattleConfig {
        self.content.config
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    /// Number of cycles started so far
    pub fn timer(&self) -> Tick {
        self.timer
    }

    pub fn mode(&self) -> BattleMode {
        self.mode
    }

    pub fn result(&self) -> Option<BattleResult> {
        self.result
    }

    pub fn is_active(&self) -> bool {
        self.result.is_none()
    }

    pub fn is_suspended(&self) -> bool {
        self.suspend_count > 0
    }

    pub fn pending_input(&self) -> Option<PendingInput> {
        self.pending_input
    }

    pub fn log(&self) -> &BattleEventLog {
        &self.log
    }

    pub fn rng_mut(&mut self) -> &mut dyn BattleRng {
        self.rng.as_mut()
    }

    pub fn unit(&self, unit: UnitRef) -> &BattleUnit {
        &self.units[unit.0]
    }

    pub fn units(&self) -> impl Iterator<Item = (UnitRef, &BattleUnit)> {
        self.units.iter().enumerate().map(|(i, u)| (UnitRef(i), u))
    }

    pub fn enemy_units(&self) -> &[UnitRef] {
        &self.enemy_units
    }

    pub fn player_units(&self) -> &[UnitRef] {
        &self.player_units
    }

    pub fn allies_of(&self, unit: UnitRef) -> &[UnitRef] {
        match self.units[unit.0].side {
            Side::Party => &self.player_units,
            Side::Enemy => &self.enemy_units,
        }
    }

    pub fn enemies_of(&self, unit: UnitRef) -> &[UnitRef] {
        match self.units[unit.0].side {
            Side::Party => &self.enemy_units,
            Side::Enemy => &self.player_units,
        }
    }

    pub fn are_enemies(&self, a: UnitRef, b: UnitRef) -> bool {
        self.units[a.0].side != self.units[b.0].side
    }

    /// Roster order used for ticking: enemies first, then the party
    pub fn turn_order(&self) -> Vec<UnitRef> {
        self.enemy_units
            .iter()
            .chain(self.player_units.iter())
            .copied()
            .collect()
    }

    pub fn living_units(&self) -> Vec<UnitRef> {
        self.turn_order()
            .into_iter()
            .filter(|&u| self.units[u.0].is_alive())
            .collect()
    }

    /// First unit built from the given template
    pub fn find_unit(&self, template_id: &str) -> Option<UnitRef> {
        self.turn_order()
            .into_iter()
            .find(|&u| self.units[u.0].template_id == template_id)
    }

    pub fn unit_info(&self, unit: UnitRef) -> BattlerInfo {
        self.units[unit.0].info(&self.content)
    }

    pub fn pool(&self, pool: PoolRef) -> &MpPool {
        &self.pools[pool.0]
    }

    pub fn condition_ids(&self) -> Vec<&str> {
        self.conditions.iter().map(|c| c.id.as_str()).collect()
    }

    pub fn has_condition(&self, condition_id: &str) -> bool {
        self.conditions.iter().any(|c| c.id == condition_id)
    }

    pub(crate) fn status_state_mut(&mut self, unit: UnitRef, serial: u64) -> Option<&mut StatusState> {
        self.units[unit.0]
            .statuses
            .iter_mut()
            .find(|s| s.serial == serial)
            .map(|s| &mut s.state)
    }

    pub(crate) fn condition_state_mut(&mut self, serial: u64) -> Option<&mut ConditionState> {
        self.conditions
            .iter_mut()
            .find(|c| c.serial == serial)
            .map(|c| &mut c.state)
    }

    // === CONTROL ===

    pub fn suspend(&mut self) {
        self.suspend_count += 1;
    }

    pub fn resume(&mut self) {
        self.suspend_count = self.suspend_count.saturating_sub(1);
    }

    pub fn flee(&mut self) {
        if self.result.is_none() {
            self.finish(BattleResult::Flee);
        }
    }

    pub(crate) fn finish(&mut self, result: BattleResult) {
        if self.result.is_some() {
            return;
        }
        self.result = Some(result);
        tracing::info!(?result, cycle = self.timer, "battle over");
        self.log_event(
            BattleEventType::BattleEnded { result },
            format!("battle ended: {:?}", result),
        );
        self.presenter.battle_ended(result);
    }

    pub(crate) fn log_event(&mut self, event_type: BattleEventType, description: String) {
        self.log.push(event_type, description, self.timer);
    }

    /// Current AI phase of a unit, if it has an AI
    pub fn ai_phase(&self, unit: UnitRef) -> Option<u32> {
        self.units[unit.0].ai.as_ref().map(|ai| ai.core.phase())
    }

    /// Re-evaluate a unit's AI phase against its current HP
    pub fn update_ai_phase(&mut self, unit: UnitRef) -> Result<()> {
        self.with_ai(unit, |ai, battle| ai.update_phase(battle))
            .map(|_| ())
    }

    /// Release everything the battle holds on teardown
    pub(crate) fn dispose(&mut self) {
        for unit in &mut self.units {
            unit.ai = None;
            unit.disposed = true;
        }
        self.held_ai_events.clear();
        self.selector = None;
        self.mode = BattleMode::Finished;
        tracing::info!(encounter = %self.encounter_id, "shut down battle engine");
    }
}
