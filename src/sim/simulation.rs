//! The battle engine
//!
//! One `Simulation` owns everything for a single battle: the unit arena,
//! the grid, the RNG, the projectile set, persistent zones, the event log
//! and the optional item/trait managers. Each tick runs six phases in
//! strict order; within a phase units are visited in stable id order.
//!
//!   1. update buffs/debuffs (burn and DoT pulses, zones, interval
//!      triggers, passive mana regeneration)
//!   2. check ability triggers (full mana -> enter Casting)
//!   3. AI decision (target selection, desired state)
//!   4. execute actions (movement, auto-attacks, cast resolution)
//!   5. update projectiles
//!   6. check end condition

use ahash::AHashMap;
use serde_json::Value;

use crate::abilities::ability::{AbilityDef, AoeAnchor, AoeShape, AoeSpec, Affiliation, Delivery};
use crate::abilities::effect::EffectKind;
use crate::abilities::projectile::{FlightStep, Projectile, ProjectileManager};
use crate::battle::aoe;
use crate::battle::grid::HexGrid;
use crate::battle::hex::HexCoord;
use crate::battle::pathfinding;
use crate::combat::damage::{self, DamageOptions, DamageResult, DamageType};
use crate::core::config::SimConfig;
use crate::core::error::{Result, SimError};
use crate::core::rng::BattleRng;
use crate::core::types::{StarLevel, Team, Tick, UnitId};
use crate::items::{ItemDef, ItemManager, TriggerKind};
use crate::sim::events::EventLog;
use crate::traits::{TraitDef, TraitManager};
use crate::units::state::{StateTransition, UnitState};
use crate::units::unit::{round1, Unit, UnitDef};

/// Persistent area applying an effect to its occupants on an interval
#[derive(Debug, Clone)]
pub(crate) struct Zone {
    pub hexes: Vec<HexCoord>,
    pub effect: EffectKind,
    pub caster: UnitId,
    pub star: StarLevel,
    pub remaining: Tick,
    pub interval: Tick,
    pub until_pulse: Tick,
}

/// Periodic effect bound to a caster/target pair (`interval_trigger`)
#[derive(Debug, Clone)]
pub(crate) struct ScheduledEffect {
    pub caster: UnitId,
    pub target: UnitId,
    pub effects: Vec<EffectKind>,
    pub star: StarLevel,
    pub remaining: Tick,
    pub interval: Tick,
    pub until_pulse: Tick,
}

/// Outcome of a single `tick` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    Done,
}

/// Final result of a battle
#[derive(Debug, Clone)]
pub struct BattleResult {
    /// None means a draw
    pub winner_team: Option<Team>,
    pub total_ticks: Tick,
    pub deaths_per_team: [u32; 2],
    pub survivors: Vec<UnitId>,
}

pub struct Simulation {
    pub config: SimConfig,
    pub rng: BattleRng,
    pub log: EventLog,
    pub grid: HexGrid,

    pub(crate) units: Vec<Unit>,
    pub(crate) abilities: AHashMap<String, AbilityDef>,
    pub(crate) projectiles: ProjectileManager,
    pub(crate) zones: Vec<Zone>,
    pub(crate) schedules: Vec<ScheduledEffect>,
    pub(crate) items: Option<ItemManager>,
    pub(crate) traits: Option<TraitManager>,

    pub(crate) current_tick: Tick,
    pub(crate) started: bool,
    pub(crate) finished: bool,
    pub(crate) winner: Option<Team>,
    pub(crate) trigger_depth: u32,
}

impl Simulation {
    pub fn new(seed: u64) -> Self {
        Self::with_config(seed, SimConfig::default()).expect("default config is valid")
    }

    pub fn with_config(seed: u64, config: SimConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            grid: HexGrid::new(config.grid_width, config.grid_height),
            rng: BattleRng::new(seed),
            log: EventLog::new(
                seed,
                config.grid_width,
                config.grid_height,
                config.ticks_per_second,
            ),
            config,
            units: Vec::new(),
            abilities: AHashMap::new(),
            projectiles: ProjectileManager::new(),
            zones: Vec::new(),
            schedules: Vec::new(),
            items: None,
            traits: None,
            current_tick: 0,
            started: false,
            finished: false,
            winner: None,
            trigger_depth: 0,
        })
    }

    // Setup API

    pub fn register_ability(&mut self, id: impl Into<String>, def: AbilityDef) {
        self.abilities.insert(id.into(), def);
    }

    /// Add a unit before the battle starts. The ability id, star level and
    /// placement are validated here; errors are fatal to the setup.
    pub fn add_unit(
        &mut self,
        def: &UnitDef,
        team: Team,
        position: HexCoord,
        star: StarLevel,
    ) -> Result<UnitId> {
        if self.started {
            return Err(SimError::BattleAlreadyRun);
        }
        if team > 1 {
            return Err(SimError::InvalidConfig(format!("team must be 0 or 1, got {}", team)));
        }
        if let Some(ability) = &def.ability {
            if !self.abilities.contains_key(ability) {
                return Err(SimError::UnknownAbility(ability.clone()));
            }
        }

        let id = UnitId(self.units.len() as u32);
        let unit = Unit::from_def(id, def, team, position, star, &self.config)?;
        self.grid.place(id, position)?;
        let snapshot = unit.snapshot();
        self.units.push(unit);
        self.log.log_spawn(0, id, snapshot);
        Ok(id)
    }

    pub fn equip_item(&mut self, unit_id: UnitId, def: &ItemDef) -> Result<()> {
        if self.started {
            return Err(SimError::BattleAlreadyRun);
        }
        let mut items = self.items.take().unwrap_or_default();
        let result = items.equip(&mut self.units[unit_id.index()], def);
        self.items = Some(items);
        result
    }

    pub fn attach_traits(&mut self, defs: impl IntoIterator<Item = (String, TraitDef)>) {
        self.traits = Some(TraitManager::new(defs));
    }

    pub fn attach_items(&mut self) {
        if self.items.is_none() {
            self.items = Some(ItemManager::new());
        }
    }

    // Accessors

    pub fn unit(&self, id: UnitId) -> &Unit {
        &self.units[id.index()]
    }

    pub fn unit_mut(&mut self, id: UnitId) -> &mut Unit {
        &mut self.units[id.index()]
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn current_tick(&self) -> Tick {
        self.current_tick
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn winner(&self) -> Option<Team> {
        self.winner
    }

    fn living_ids(&self) -> Vec<UnitId> {
        self.units.iter().filter(|u| u.is_alive()).map(|u| u.id).collect()
    }

    pub(crate) fn living_enemies_of(&self, team: Team) -> Vec<UnitId> {
        self.units
            .iter()
            .filter(|u| u.is_alive() && u.team != team)
            .map(|u| u.id)
            .collect()
    }

    pub(crate) fn living_allies_of(&self, team: Team) -> Vec<UnitId> {
        self.units
            .iter()
            .filter(|u| u.is_alive() && u.team == team)
            .map(|u| u.id)
            .collect()
    }

    // Run loop

    /// Run the battle to completion and report the result
    pub fn run(&mut self) -> Result<BattleResult> {
        if self.started {
            return Err(SimError::BattleAlreadyRun);
        }
        self.start();
        while self.tick() == TickOutcome::Continue {}
        Ok(self.result())
    }

    fn start(&mut self) {
        self.started = true;
        let snapshots: Vec<Value> = self.units.iter().map(|u| u.snapshot()).collect();
        self.log.log_simulation_start(0, snapshots);

        if let Some(mut traits) = self.traits.take() {
            traits.activate(&mut self.units);
            self.traits = Some(traits);
        }
    }

    /// Advance one tick. Usable by embedded drivers; `run` loops over it.
    pub fn tick(&mut self) -> TickOutcome {
        if self.finished {
            return TickOutcome::Done;
        }
        if !self.started {
            self.start();
        }
        if self.current_tick >= self.config.max_ticks {
            self.end_battle(None);
            return TickOutcome::Done;
        }

        self.phase_update_statuses();
        self.phase_check_abilities();
        self.phase_ai_decision();
        self.phase_execute_actions();
        self.phase_update_projectiles();
        self.phase_check_end();

        if self.finished {
            return TickOutcome::Done;
        }
        self.current_tick += 1;
        TickOutcome::Continue
    }

    pub fn result(&self) -> BattleResult {
        let mut deaths = [0u32; 2];
        for unit in &self.units {
            if !unit.is_alive() {
                deaths[unit.team as usize] += 1;
            }
        }
        BattleResult {
            winner_team: self.winner,
            total_ticks: self.current_tick,
            deaths_per_team: deaths,
            survivors: self.living_ids(),
        }
    }

    // Phase 1: buffs, debuffs, zones, schedules, interval triggers

    fn phase_update_statuses(&mut self) {
        let tick = self.current_tick;

        for index in 0..self.units.len() {
            let id = UnitId(index as u32);
            if !self.units[index].is_alive() {
                continue;
            }

            let expired = self.units[index].update_buffs();
            for buff_id in expired {
                self.log.log_buff_expire(tick, id, &buff_id);
            }

            let pulses = {
                let tps = self.config.ticks_per_second;
                self.units[index].status.tick(tps)
            };
            for pulse in pulses {
                match pulse {
                    crate::units::status::StatusPulse::Damage {
                        amount,
                        damage_type,
                        source,
                    } => {
                        self.deal_damage(source, id, amount, damage_type, DamageOptions::periodic());
                    }
                    crate::units::status::StatusPulse::Heal { amount, source } => {
                        let healed = self.units[index].apply_heal(amount);
                        if healed > 0.0 {
                            let hp_after = self.units[index].stats.current_hp;
                            self.log.log_heal(
                                tick,
                                id,
                                Some(source),
                                round1(healed),
                                round1(hp_after),
                            );
                        }
                    }
                }
            }

            // passive mana regeneration, divided across ticks; a burn or
            // DoT pulse above may have killed the unit this tick
            let regen = if self.units[index].is_alive() {
                let config = &self.config;
                self.units[index].gain_mana_passive(config)
            } else {
                0.0
            };
            if regen > 0.0 {
                let mana_after = self.units[index].stats.current_mana;
                self.log.log_mana_gain(tick, id, round1(regen), round1(mana_after));
            }
        }

        self.tick_zones();
        self.tick_schedules();
        self.tick_item_intervals();
        self.tick_trait_triggers();
    }

    fn tick_zones(&mut self) {
        let mut zones = std::mem::take(&mut self.zones);
        for zone in zones.iter_mut() {
            zone.remaining = zone.remaining.saturating_sub(1);
            zone.until_pulse = zone.until_pulse.saturating_sub(1);
            if zone.until_pulse == 0 {
                zone.until_pulse = zone.interval;
                let caster_team = self.units[zone.caster.index()].team;
                let occupants: Vec<UnitId> = self
                    .units
                    .iter()
                    .filter(|u| {
                        u.is_alive() && u.team != caster_team && zone.hexes.contains(&u.position)
                    })
                    .map(|u| u.id)
                    .collect();
                for target in occupants {
                    self.apply_effect(&zone.effect.clone(), zone.caster, target, zone.star, "zone");
                }
            }
        }
        zones.retain(|z| z.remaining > 0);
        // zones created by zone pulses land in self.zones; keep both
        zones.extend(std::mem::take(&mut self.zones));
        self.zones = zones;
    }

    fn tick_schedules(&mut self) {
        let mut schedules = std::mem::take(&mut self.schedules);
        for schedule in schedules.iter_mut() {
            schedule.remaining = schedule.remaining.saturating_sub(1);
            schedule.until_pulse = schedule.until_pulse.saturating_sub(1);
            if schedule.until_pulse == 0 {
                schedule.until_pulse = schedule.interval;
                if self.units[schedule.target.index()].is_alive() {
                    for effect in schedule.effects.clone() {
                        self.apply_effect(
                            &effect,
                            schedule.caster,
                            schedule.target,
                            schedule.star,
                            "interval_trigger",
                        );
                    }
                }
            }
        }
        schedules.retain(|s| s.remaining > 0);
        schedules.extend(std::mem::take(&mut self.schedules));
        self.schedules = schedules;
    }

    fn tick_item_intervals(&mut self) {
        let Some(items) = &self.items else {
            return;
        };
        let tick = self.current_tick;
        let mut due: Vec<(UnitId, Vec<EffectKind>)> = Vec::new();
        for unit in &self.units {
            if !unit.is_alive() {
                continue;
            }
            let effects = items.interval_due(unit.id, tick);
            if !effects.is_empty() {
                due.push((unit.id, effects));
            }
        }
        for (owner, effects) in due {
            // offensive interval effects aim at the current target,
            // support effects resolve against the owner itself
            let target = self.units[owner.index()]
                .target
                .filter(|t| self.units[t.index()].is_alive())
                .unwrap_or(owner);
            for effect in effects {
                self.apply_effect(&effect, owner, target, self.units[owner.index()].star, "item");
            }
        }
    }

    fn tick_trait_triggers(&mut self) {
        let Some(mut traits) = self.traits.take() else {
            return;
        };
        let mut due = traits.due_this_tick(self.current_tick);
        due.extend(traits.hp_triggers(&self.units));
        self.traits = Some(traits);

        for (recipient, effects) in due {
            if !self.units[recipient.index()].is_alive() {
                continue;
            }
            let star = self.units[recipient.index()].star;
            for effect in effects {
                self.apply_effect(&effect, recipient, recipient, star, "trait");
            }
        }
    }

    // Phase 2: enter Casting when the bar is full

    fn phase_check_abilities(&mut self) {
        for index in 0..self.units.len() {
            let unit = &self.units[index];
            if !unit.is_alive() || !unit.state.current.can_act() || !unit.ready_to_cast() {
                continue;
            }
            let Some(ability_id) = unit.ability.clone() else {
                continue;
            };
            let Some(def) = self.abilities.get(&ability_id) else {
                continue;
            };
            let star = unit.star;
            let cast_ticks = def.cast_ticks(star);
            let effect_delay = def.effect_delay_ticks(star);

            let id = UnitId(index as u32);
            let from = self.units[index].state.current.name();
            let unit = &mut self.units[index];
            unit.status.mana_reave_pct = 0.0;
            unit.state.start_cast(cast_ticks, effect_delay);
            self.log
                .log_state_change(self.current_tick, id, from, UnitState::Casting.name());
        }
    }

    // Phase 3: target selection and desired state

    fn phase_ai_decision(&mut self) {
        for index in 0..self.units.len() {
            let id = UnitId(index as u32);
            if !self.units[index].can_act() {
                continue;
            }
            match self.units[index].state.current {
                UnitState::Idle => self.ai_idle(id),
                UnitState::Moving => self.ai_moving(id),
                UnitState::Attacking => self.ai_attacking(id),
                _ => {}
            }
        }
    }

    fn acquire_target(&mut self, id: UnitId) -> Option<UnitId> {
        let unit = &self.units[id.index()];

        // taunt overrides any policy
        if let Some(taunter) = unit.status.taunted_by() {
            if self.units[taunter.index()].is_alive() {
                return Some(taunter);
            }
        }

        let enemies = self.living_enemies_of(unit.team);
        if enemies.is_empty() {
            return None;
        }
        let pool: Vec<&Unit> = enemies.iter().map(|e| &self.units[e.index()]).collect();
        let selector = unit.selector.clone();
        selector.select(unit, &pool, &mut self.rng)
    }

    fn ai_idle(&mut self, id: UnitId) {
        let Some(target) = self.acquire_target(id) else {
            return;
        };
        self.units[id.index()].target = Some(target);
        self.log.log_target_acquired(self.current_tick, id, target);

        let in_range = {
            let unit = &self.units[id.index()];
            unit.in_attack_range(&self.units[target.index()])
        };
        let next = if in_range { UnitState::Attacking } else { UnitState::Moving };
        self.transition(id, next);
    }

    fn ai_moving(&mut self, id: UnitId) {
        if !self.has_valid_target(id) {
            self.units[id.index()].target = None;
            self.transition(id, UnitState::Idle);
            return;
        }
        let target = self.units[id.index()].target.unwrap();
        let in_range = self.units[id.index()].in_attack_range(&self.units[target.index()]);
        if in_range {
            self.transition(id, UnitState::Attacking);
        }
    }

    fn ai_attacking(&mut self, id: UnitId) {
        if !self.has_valid_target(id) {
            self.units[id.index()].target = None;
            self.transition(id, UnitState::Idle);
            return;
        }
        // taunt may retarget mid-fight
        if let Some(taunter) = self.units[id.index()].status.taunted_by() {
            if self.units[taunter.index()].is_alive()
                && self.units[id.index()].target != Some(taunter)
            {
                self.units[id.index()].target = Some(taunter);
                self.log.log_target_acquired(self.current_tick, id, taunter);
            }
        }
        let target = self.units[id.index()].target.unwrap();
        let in_range = self.units[id.index()].in_attack_range(&self.units[target.index()]);
        if !in_range {
            self.transition(id, UnitState::Moving);
        }
    }

    fn has_valid_target(&self, id: UnitId) -> bool {
        match self.units[id.index()].target {
            Some(target) => self.units[target.index()].is_alive(),
            None => false,
        }
    }

    pub(crate) fn transition(&mut self, id: UnitId, to: UnitState) {
        let from = self.units[id.index()].state.current;
        if from == to {
            return;
        }
        if self.units[id.index()].state.transition_to(to) {
            self.log
                .log_state_change(self.current_tick, id, from.name(), to.name());
        }
    }

    // Phase 4: act

    fn phase_execute_actions(&mut self) {
        for index in 0..self.units.len() {
            let id = UnitId(index as u32);
            if !self.units[index].is_alive() {
                continue;
            }

            if self.units[index].state.should_fire_effect() {
                self.execute_ability(id);
            }

            match self.units[index].state.tick() {
                Some(StateTransition::CastEnded) => self.finish_cast(id),
                Some(StateTransition::StunExpired(restored)) => {
                    self.log.log_state_change(
                        self.current_tick,
                        id,
                        UnitState::Stunned.name(),
                        restored.name(),
                    );
                }
                None => {}
            }

            if self.units[index].attack_cooldown > 0.0 {
                self.units[index].attack_cooldown -= 1.0;
            }

            match self.units[index].state.current {
                UnitState::Moving => self.execute_move(id),
                UnitState::Attacking => self.execute_attack(id),
                _ => {}
            }
        }
    }

    fn finish_cast(&mut self, id: UnitId) {
        let tick = self.current_tick;
        {
            let config = &self.config;
            let unit = &mut self.units[id.index()];
            unit.finish_cast_mana(config);
            unit.casts_completed += 1;
            if let Some((after, ability)) = unit.pending_transform.clone() {
                if unit.casts_completed >= after {
                    unit.ability = Some(ability);
                    unit.pending_transform = None;
                }
            }
        }
        self.log
            .log_state_change(tick, id, UnitState::Casting.name(), UnitState::Idle.name());
    }

    fn execute_move(&mut self, id: UnitId) {
        if !self.has_valid_target(id) {
            return;
        }
        let target = self.units[id.index()].target.unwrap();

        let pace = self.units[id.index()].move_pace();
        self.units[id.index()].move_progress += pace;
        if self.units[id.index()].move_progress < 1.0 {
            return;
        }
        self.units[id.index()].move_progress -= 1.0;

        let from = self.units[id.index()].position;
        let goal = self.units[target.index()].position;
        let Some(step) = pathfinding::next_step(&self.grid, from, goal, Some(target)) else {
            return; // boxed in; wait for the board to open up
        };
        if self.grid.relocate(id, step) {
            self.units[id.index()].position = step;
            self.log
                .log_move(self.current_tick, id, (from.q, from.r), (step.q, step.r));
        }
    }

    fn execute_attack(&mut self, id: UnitId) {
        if !self.units[id.index()].can_attack() || !self.has_valid_target(id) {
            return;
        }
        let target = self.units[id.index()].target.unwrap();
        if !self.units[id.index()].in_attack_range(&self.units[target.index()]) {
            return;
        }

        // replace_attacks swaps the effect list in for the plain hit
        let empowered = self.units[id.index()].empowered.as_ref().map(|e| e.effects.clone());
        if let Some(effects) = empowered {
            self.log
                .log_attack(self.current_tick, id, target, 0.0, false, false);
            let star = self.units[id.index()].star;
            for effect in &effects {
                self.apply_effect(effect, id, target, star, "empowered_attack");
            }
            if let Some(emp) = &mut self.units[id.index()].empowered {
                emp.remaining = emp.remaining.saturating_sub(1);
                if emp.remaining == 0 {
                    self.units[id.index()].empowered = None;
                }
            }
            let config = &self.config;
            self.units[id.index()].gain_mana_on_attack(config);
            let tps = self.config.ticks_per_second;
            self.units[id.index()].start_attack_cooldown(tps);
            return;
        }

        let base = self.units[id.index()].stats.attack_damage();
        let result = self.resolve_only(id, target, base, DamageType::Physical, DamageOptions::auto_attack());

        self.log.log_attack(
            self.current_tick,
            id,
            target,
            round1(result.final_damage),
            result.is_crit,
            result.dodged,
        );

        if !result.dodged {
            self.apply_damage_result(id, target, &result, DamageOptions::auto_attack());

            let config = &self.config;
            self.units[id.index()].gain_mana_on_attack(config);

            self.fire_item_trigger(id, target, TriggerKind::OnHit);

            if !self.units[target.index()].is_alive() {
                self.units[id.index()].target = None;
                if self.units[id.index()].state.current == UnitState::Attacking {
                    self.transition(id, UnitState::Idle);
                }
            }
        }

        let tps = self.config.ticks_per_second;
        self.units[id.index()].start_attack_cooldown(tps);
    }

    // Ability resolution (effect point)

    fn execute_ability(&mut self, id: UnitId) {
        self.units[id.index()].state.mark_effect_fired();

        let Some(ability_id) = self.units[id.index()].ability.clone() else {
            return;
        };
        let Some(def) = self.abilities.get(&ability_id).cloned() else {
            return;
        };
        let star = self.units[id.index()].star;

        let primary = {
            let unit = &self.units[id.index()];
            let enemies = self.living_enemies_of(unit.team);
            let pool: Vec<&Unit> = enemies.iter().map(|e| &self.units[e.index()]).collect();
            def.target.select(unit, &pool, &mut self.rng)
        };
        let Some(primary) = primary else {
            // no valid target: the cast fizzles, mana is still spent
            self.units[id.index()].stats.spend_mana(def.mana_cost);
            return;
        };

        self.log
            .log_ability_cast(self.current_tick, id, &ability_id, Some(primary));
        self.units[id.index()].stats.spend_mana(def.mana_cost);

        self.fire_item_trigger(id, primary, TriggerKind::OnAbilityCast);

        match def.delivery {
            Delivery::Projectile => {
                let spec = def.projectile_spec();
                let source_hex = self.units[id.index()].position;
                let dest_hex = self.units[primary.index()].position;
                self.projectiles.spawn(
                    id,
                    source_hex,
                    Some(primary),
                    dest_hex,
                    spec.speed,
                    spec.homing,
                    spec.can_miss,
                    star,
                    ability_id.clone(),
                    def.effects.clone(),
                    def.aoe.clone(),
                );
                self.log
                    .log_projectile_spawn(self.current_tick, id, Some(primary), &ability_id);
            }
            Delivery::Instant | Delivery::Area => {
                let targets = self.ability_targets(id, primary, &def, star);
                self.apply_effect_list(&def.effects, id, &targets, star, &ability_id);
            }
        }
    }

    /// Compute the target set for an instant or area delivery
    pub(crate) fn ability_targets(
        &self,
        caster: UnitId,
        primary: UnitId,
        def: &AbilityDef,
        star: StarLevel,
    ) -> Vec<UnitId> {
        let caster_team = self.units[caster.index()].team;
        let pool_ids: Vec<UnitId> = match def.affiliation {
            Affiliation::Enemies => self.living_enemies_of(caster_team),
            Affiliation::Allies => self.living_allies_of(caster_team),
            Affiliation::All => self.living_ids(),
        };

        let Some(aoe) = &def.aoe else {
            return vec![primary];
        };

        let pairs: Vec<(UnitId, HexCoord)> = pool_ids
            .iter()
            .map(|id| (*id, self.units[id.index()].position))
            .collect();
        let caster_hex = self.units[caster.index()].position;
        let primary_hex = self.units[primary.index()].position;
        let anchor = match aoe.anchor {
            AoeAnchor::Target => primary_hex,
            AoeAnchor::Caster => caster_hex,
        };

        let mut targets = match &aoe.shape {
            AoeShape::Circle { radius } => {
                aoe_circle(anchor, radius.at_ticks(star), &pairs)
            }
            AoeShape::Cone { angle, range } => {
                aoe::units_in_cone(caster_hex, primary_hex, *angle, *range, &pairs)
            }
            AoeShape::Line { width } => {
                aoe::units_in_line(caster_hex, primary_hex, *width, &pairs)
            }
        };

        if def.affiliation == Affiliation::Enemies && !targets.contains(&primary) {
            targets.insert(0, primary);
        }
        targets
    }

    pub(crate) fn apply_effect_list(
        &mut self,
        effects: &[EffectKind],
        caster: UnitId,
        targets: &[UnitId],
        star: StarLevel,
        ability_id: &str,
    ) {
        for effect in effects {
            for target in targets {
                if !self.units[target.index()].is_alive() {
                    continue;
                }
                let outcome = self.apply_effect(effect, caster, *target, star, ability_id);
                if outcome.success {
                    self.log.log_ability_effect(
                        self.current_tick,
                        caster,
                        ability_id,
                        effect.tag(),
                        round1(outcome.value),
                        outcome.affected.iter().map(|u| u.0).collect(),
                    );
                }
            }
        }
    }

    // Phase 5: projectiles

    fn phase_update_projectiles(&mut self) {
        let mut in_flight = std::mem::take(&mut self.projectiles).projectiles;
        let mut survivors = Vec::with_capacity(in_flight.len());

        for mut projectile in in_flight.drain(..) {
            let (target_hex, target_alive) = match projectile.target {
                Some(target) => {
                    let unit = &self.units[target.index()];
                    (Some(unit.position), unit.is_alive())
                }
                None => (None, false),
            };

            match projectile.advance(target_hex, target_alive) {
                FlightStep::InFlight => survivors.push(projectile),
                FlightStep::Expired => {
                    self.log.log_projectile_miss(
                        self.current_tick,
                        projectile.source,
                        projectile.target,
                        &projectile.ability_id,
                    );
                }
                FlightStep::Arrived => self.resolve_projectile_hit(projectile),
            }
        }

        // projectiles spawned while resolving impacts keep flying next tick
        survivors.extend(std::mem::take(&mut self.projectiles).projectiles);
        self.projectiles.projectiles = survivors;
    }

    fn resolve_projectile_hit(&mut self, projectile: Projectile) {
        let tick = self.current_tick;
        let source = projectile.source;
        let star = projectile.star;

        let impact_target = match projectile.target {
            Some(target) if self.units[target.index()].is_alive() => Some(target),
            Some(target) => {
                // target died mid-flight with can_miss = false: an AoE
                // payload still detonates on the last hex, a single-target
                // payload is dropped
                if projectile.aoe.is_none() {
                    self.log
                        .log_projectile_miss(tick, source, Some(target), &projectile.ability_id);
                    return;
                }
                None
            }
            None => self
                .grid
                .occupant(projectile.dest_hex)
                .filter(|occupant| {
                    let unit = &self.units[occupant.index()];
                    unit.is_alive() && unit.team != self.units[source.index()].team
                }),
        };

        let targets = match (&projectile.aoe, impact_target) {
            (Some(aoe_spec), _) => {
                self.impact_aoe_targets(source, projectile.dest_hex, aoe_spec, impact_target, star)
            }
            (None, Some(target)) => vec![target],
            (None, None) => {
                self.log
                    .log_projectile_miss(tick, source, None, &projectile.ability_id);
                return;
            }
        };

        self.log
            .log_projectile_hit(tick, source, impact_target, &projectile.ability_id);
        self.apply_effect_list(&projectile.effects, source, &targets, star, &projectile.ability_id);
    }

    fn impact_aoe_targets(
        &self,
        source: UnitId,
        impact_hex: HexCoord,
        aoe_spec: &AoeSpec,
        primary: Option<UnitId>,
        star: StarLevel,
    ) -> Vec<UnitId> {
        let source_team = self.units[source.index()].team;
        let pairs: Vec<(UnitId, HexCoord)> = self
            .units
            .iter()
            .filter(|u| u.is_alive() && u.team != source_team)
            .map(|u| (u.id, u.position))
            .collect();

        let mut targets = match &aoe_spec.shape {
            AoeShape::Circle { radius } => aoe_circle(impact_hex, radius.at_ticks(star), &pairs),
            AoeShape::Cone { angle, range } => aoe::units_in_cone(
                self.units[source.index()].position,
                impact_hex,
                *angle,
                *range,
                &pairs,
            ),
            AoeShape::Line { width } => aoe::units_in_line(
                self.units[source.index()].position,
                impact_hex,
                *width,
                &pairs,
            ),
        };
        if let Some(primary) = primary {
            if !targets.contains(&primary) {
                targets.insert(0, primary);
            }
        }
        targets
    }

    // Phase 6: end detection

    fn phase_check_end(&mut self) {
        let mut alive = [0u32; 2];
        for unit in &self.units {
            if unit.is_alive() {
                alive[unit.team as usize] += 1;
            }
        }
        match (alive[0], alive[1]) {
            (0, 0) => self.end_battle(None),
            (0, _) => self.end_battle(Some(1)),
            (_, 0) => self.end_battle(Some(0)),
            _ => {}
        }
    }

    fn end_battle(&mut self, winner: Option<Team>) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.winner = winner;
        let survivors: Vec<Value> = self
            .units
            .iter()
            .filter(|u| u.is_alive())
            .map(|u| u.snapshot())
            .collect();
        self.log
            .log_simulation_end(self.current_tick, winner, survivors);
    }

    // Damage plumbing shared by attacks, effects and status pulses

    /// Situational amplifier product from items and traits, including the
    /// defender's conditional damage reduction
    fn external_amp(&self, attacker: UnitId, defender: UnitId) -> f32 {
        let mut amp = 1.0;
        if let Some(items) = &self.items {
            let atk = &self.units[attacker.index()];
            let def = &self.units[defender.index()];
            amp *= items.damage_amp(atk, def);
            amp *= items.damage_reduction(atk, def);
        }
        if let Some(traits) = &self.traits {
            amp *= traits.damage_amp(attacker);
        }
        amp
    }

    pub(crate) fn resolve_only(
        &mut self,
        attacker: UnitId,
        defender: UnitId,
        base: f32,
        damage_type: DamageType,
        opts: DamageOptions,
    ) -> DamageResult {
        let amp = self.external_amp(attacker, defender);
        let atk = &self.units[attacker.index()];
        let def = &self.units[defender.index()];
        damage::resolve_damage(atk, def, base, damage_type, opts, amp, &mut self.rng)
    }

    /// Resolve and immediately apply one damage event
    pub(crate) fn deal_damage(
        &mut self,
        attacker: UnitId,
        defender: UnitId,
        base: f32,
        damage_type: DamageType,
        opts: DamageOptions,
    ) -> DamageResult {
        if !self.units[defender.index()].is_alive() {
            return DamageResult {
                raw_damage: 0.0,
                final_damage: 0.0,
                damage_type,
                is_crit: false,
                dodged: false,
                mitigation: 0.0,
            };
        }
        let result = self.resolve_only(attacker, defender, base, damage_type, opts);
        if !result.dodged {
            self.apply_damage_result(attacker, defender, &result, opts);
        }
        result
    }

    /// Apply a resolved damage event: shields, HP, defender mana, vamp
    /// healing, triggers and death handling. Never rolled back.
    pub(crate) fn apply_damage_result(
        &mut self,
        attacker: UnitId,
        defender: UnitId,
        result: &DamageResult,
        opts: DamageOptions,
    ) {
        let tick = self.current_tick;

        let (absorbed, hp_after) = {
            let config = &self.config;
            let unit = &mut self.units[defender.index()];
            let absorbed = unit.status.absorb(result.final_damage);
            unit.stats.take_damage(result.final_damage - absorbed);
            unit.gain_mana_on_damage(result.raw_damage, result.final_damage, config);
            (absorbed, unit.stats.current_hp)
        };

        self.log.log_damage(
            tick,
            defender,
            Some(attacker),
            round1(result.final_damage),
            result.damage_type.name(),
            round1(hp_after),
            round1(absorbed),
        );

        // lifesteal on physical hits, omnivamp on everything
        let vamp = {
            let atk = &self.units[attacker.index()];
            let mut vamp = result.final_damage * atk.stats.omnivamp();
            if result.damage_type == DamageType::Physical && !opts.is_ability {
                vamp += result.final_damage * atk.stats.lifesteal();
            }
            vamp
        };
        if vamp > 0.0 && self.units[attacker.index()].is_alive() {
            let healed = self.units[attacker.index()].apply_heal(vamp);
            if healed > 0.0 {
                let hp = self.units[attacker.index()].stats.current_hp;
                self.log
                    .log_heal(tick, attacker, Some(attacker), round1(healed), round1(hp));
            }
        }

        self.fire_item_trigger(defender, attacker, TriggerKind::OnTakeDamage);

        if !self.units[defender.index()].stats.is_alive() {
            self.handle_death(defender, Some(attacker));
        }
    }

    /// Mark a unit dead: terminal state, freed hex, death event, kill
    /// triggers for the killer.
    pub(crate) fn handle_death(&mut self, id: UnitId, killer: Option<UnitId>) {
        if !self.units[id.index()].state.is_alive() {
            return; // already processed
        }
        self.units[id.index()].die();
        self.grid.vacate(id);
        self.log.log_death(self.current_tick, id, killer);

        if let Some(killer) = killer {
            if self.units[killer.index()].is_alive() {
                self.fire_item_trigger(killer, id, TriggerKind::OnKill);
            }
        }
    }

    /// Fire item-trigger effects with a depth guard so reactive triggers
    /// cannot recurse forever.
    fn fire_item_trigger(&mut self, owner: UnitId, other: UnitId, trigger: TriggerKind) {
        if self.trigger_depth >= 2 {
            return;
        }
        let Some(items) = &self.items else {
            return;
        };
        let effects = items.triggered(owner, trigger);
        if effects.is_empty() {
            return;
        }
        if !self.units[owner.index()].is_alive() {
            return;
        }
        let star = self.units[owner.index()].star;
        self.trigger_depth += 1;
        for effect in effects {
            self.apply_effect(&effect, owner, other, star, "item");
        }
        self.trigger_depth -= 1;
    }
}

/// Circle AoE including the anchor hex occupant
fn aoe_circle(center: HexCoord, radius: u32, pairs: &[(UnitId, HexCoord)]) -> Vec<UnitId> {
    aoe::units_in_circle(center, radius, pairs)
}
