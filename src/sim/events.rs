//! Structured battle event log
//!
//! Append-only stream of `{tick, kind, unit_id?, target_id?, data}`
//! records plus a metadata header carrying the seed, tick rate and grid
//! dimensions. The log together with the seed is sufficient to replay and
//! analyse the battle; given identical inputs the serialized log is
//! byte-identical across runs.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::core::error::Result;
use crate::core::types::{Team, Tick, UnitId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    SimulationStart,
    SimulationEnd,
    UnitSpawn,
    UnitMove,
    UnitAttack,
    UnitDamage,
    UnitHeal,
    UnitDeath,
    UnitManaGain,
    AbilityCast,
    AbilityEffect,
    ProjectileSpawn,
    ProjectileHit,
    ProjectileMiss,
    BuffApply,
    BuffExpire,
    DebuffApply,
    StateChange,
    TargetAcquired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub tick: Tick,
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_id: Option<u32>,
    #[serde(skip_serializing_if = "Map::is_empty", default)]
    pub data: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogMetadata {
    pub version: String,
    pub seed: u64,
    pub ticks_per_second: u32,
    pub grid: GridMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridMetadata {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLog {
    pub metadata: LogMetadata,
    pub initial_state: Value,
    pub events: Vec<Event>,
    pub final_state: Value,
}

impl EventLog {
    pub fn new(seed: u64, grid_width: u32, grid_height: u32, ticks_per_second: u32) -> Self {
        Self {
            metadata: LogMetadata {
                version: "1.0".into(),
                seed,
                ticks_per_second,
                grid: GridMetadata {
                    width: grid_width,
                    height: grid_height,
                },
            },
            initial_state: Value::Null,
            events: Vec::new(),
            final_state: Value::Null,
        }
    }

    pub fn push(
        &mut self,
        tick: Tick,
        kind: EventKind,
        unit_id: Option<UnitId>,
        target_id: Option<UnitId>,
        data: Map<String, Value>,
    ) {
        self.events.push(Event {
            tick,
            kind,
            unit_id: unit_id.map(|u| u.0),
            target_id: target_id.map(|u| u.0),
            data,
        });
    }

    fn obj(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    // Typed helpers

    pub fn log_simulation_start(&mut self, tick: Tick, units: Vec<Value>) {
        self.initial_state = json!({ "units": units.clone() });
        self.push(
            tick,
            EventKind::SimulationStart,
            None,
            None,
            Self::obj(json!({ "units": units })),
        );
    }

    pub fn log_simulation_end(
        &mut self,
        tick: Tick,
        winner_team: Option<Team>,
        survivors: Vec<Value>,
    ) {
        let survivor_ids: Vec<Value> = survivors
            .iter()
            .filter_map(|s| s.get("id").cloned())
            .collect();
        self.final_state = json!({
            "winner_team": winner_team,
            "total_ticks": tick,
            "survivors": survivors,
        });
        self.push(
            tick,
            EventKind::SimulationEnd,
            None,
            None,
            Self::obj(json!({
                "winner_team": winner_team,
                "total_ticks": tick,
                "survivors": survivor_ids,
            })),
        );
    }

    pub fn log_spawn(&mut self, tick: Tick, unit_id: UnitId, snapshot: Value) {
        self.push(
            tick,
            EventKind::UnitSpawn,
            Some(unit_id),
            None,
            Self::obj(snapshot),
        );
    }

    pub fn log_move(&mut self, tick: Tick, unit_id: UnitId, from: (i32, i32), to: (i32, i32)) {
        self.push(
            tick,
            EventKind::UnitMove,
            Some(unit_id),
            None,
            Self::obj(json!({ "from": [from.0, from.1], "to": [to.0, to.1] })),
        );
    }

    pub fn log_attack(
        &mut self,
        tick: Tick,
        unit_id: UnitId,
        target_id: UnitId,
        damage: f64,
        is_crit: bool,
        dodged: bool,
    ) {
        self.push(
            tick,
            EventKind::UnitAttack,
            Some(unit_id),
            Some(target_id),
            Self::obj(json!({ "damage": damage, "is_crit": is_crit, "dodged": dodged })),
        );
    }

    #[allow(clippy::too_many_arguments)]
    pub fn log_damage(
        &mut self,
        tick: Tick,
        unit_id: UnitId,
        source_id: Option<UnitId>,
        damage: f64,
        damage_type: &str,
        hp_after: f64,
        shielded: f64,
    ) {
        let mut data = Self::obj(json!({
            "damage": damage,
            "damage_type": damage_type,
            "hp_after": hp_after,
        }));
        if let Some(source) = source_id {
            data.insert("source_id".into(), json!(source.0));
        }
        if shielded > 0.0 {
            data.insert("shielded".into(), json!(shielded));
        }
        self.push(tick, EventKind::UnitDamage, Some(unit_id), None, data);
    }

    pub fn log_heal(
        &mut self,
        tick: Tick,
        unit_id: UnitId,
        source_id: Option<UnitId>,
        amount: f64,
        hp_after: f64,
    ) {
        let mut data = Self::obj(json!({ "amount": amount, "hp_after": hp_after }));
        if let Some(source) = source_id {
            data.insert("source_id".into(), json!(source.0));
        }
        self.push(tick, EventKind::UnitHeal, Some(unit_id), None, data);
    }

    pub fn log_death(&mut self, tick: Tick, unit_id: UnitId, killer_id: Option<UnitId>) {
        let mut data = Map::new();
        if let Some(killer) = killer_id {
            data.insert("killer_id".into(), json!(killer.0));
        }
        self.push(tick, EventKind::UnitDeath, Some(unit_id), None, data);
    }

    pub fn log_mana_gain(&mut self, tick: Tick, unit_id: UnitId, amount: f64, mana_after: f64) {
        self.push(
            tick,
            EventKind::UnitManaGain,
            Some(unit_id),
            None,
            Self::obj(json!({ "amount": amount, "mana_after": mana_after })),
        );
    }

    pub fn log_ability_cast(
        &mut self,
        tick: Tick,
        unit_id: UnitId,
        ability_id: &str,
        target_id: Option<UnitId>,
    ) {
        self.push(
            tick,
            EventKind::AbilityCast,
            Some(unit_id),
            target_id,
            Self::obj(json!({ "ability_id": ability_id })),
        );
    }

    pub fn log_ability_effect(
        &mut self,
        tick: Tick,
        unit_id: UnitId,
        ability_id: &str,
        effect_type: &str,
        value: f64,
        targets: Vec<u32>,
    ) {
        self.push(
            tick,
            EventKind::AbilityEffect,
            Some(unit_id),
            None,
            Self::obj(json!({
                "ability_id": ability_id,
                "effect_type": effect_type,
                "value": value,
                "targets": targets,
            })),
        );
    }

    pub fn log_projectile_spawn(
        &mut self,
        tick: Tick,
        unit_id: UnitId,
        target_id: Option<UnitId>,
        ability_id: &str,
    ) {
        self.push(
            tick,
            EventKind::ProjectileSpawn,
            Some(unit_id),
            target_id,
            Self::obj(json!({ "ability_id": ability_id })),
        );
    }

    pub fn log_projectile_hit(
        &mut self,
        tick: Tick,
        unit_id: UnitId,
        target_id: Option<UnitId>,
        ability_id: &str,
    ) {
        self.push(
            tick,
            EventKind::ProjectileHit,
            Some(unit_id),
            target_id,
            Self::obj(json!({ "ability_id": ability_id })),
        );
    }

    pub fn log_projectile_miss(
        &mut self,
        tick: Tick,
        unit_id: UnitId,
        target_id: Option<UnitId>,
        ability_id: &str,
    ) {
        self.push(
            tick,
            EventKind::ProjectileMiss,
            Some(unit_id),
            target_id,
            Self::obj(json!({ "ability_id": ability_id })),
        );
    }

    pub fn log_buff_apply(&mut self, tick: Tick, unit_id: UnitId, buff_id: &str, duration: Tick) {
        self.push(
            tick,
            EventKind::BuffApply,
            Some(unit_id),
            None,
            Self::obj(json!({ "buff_id": buff_id, "duration": duration })),
        );
    }

    pub fn log_buff_expire(&mut self, tick: Tick, unit_id: UnitId, buff_id: &str) {
        self.push(
            tick,
            EventKind::BuffExpire,
            Some(unit_id),
            None,
            Self::obj(json!({ "buff_id": buff_id })),
        );
    }

    pub fn log_debuff_apply(
        &mut self,
        tick: Tick,
        unit_id: UnitId,
        debuff: &str,
        value: f64,
        duration: Tick,
    ) {
        self.push(
            tick,
            EventKind::DebuffApply,
            Some(unit_id),
            None,
            Self::obj(json!({ "debuff": debuff, "value": value, "duration": duration })),
        );
    }

    pub fn log_state_change(&mut self, tick: Tick, unit_id: UnitId, from: &str, to: &str) {
        self.push(
            tick,
            EventKind::StateChange,
            Some(unit_id),
            None,
            Self::obj(json!({ "from_state": from, "to_state": to })),
        );
    }

    pub fn log_target_acquired(&mut self, tick: Tick, unit_id: UnitId, target_id: UnitId) {
        self.push(tick, EventKind::TargetAcquired, Some(unit_id), Some(target_id), Map::new());
    }

    // Queries used by analysers and tests

    pub fn events_of_kind(&self, kind: EventKind) -> Vec<&Event> {
        self.events.iter().filter(|e| e.kind == kind).collect()
    }

    pub fn events_for_unit(&self, unit_id: UnitId) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.unit_id == Some(unit_id.0))
            .collect()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
