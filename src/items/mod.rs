//! Item application: stat bonuses, flags, conditional amplifiers and
//! triggered effects
//!
//! Item definitions arrive as data. Equipping pushes flat/percent stat
//! bonuses into the unit's modifier layers and records the definition so
//! triggers (`on_hit`, `on_ability_cast`, ...) and conditional damage
//! amplifiers can be consulted during the fight.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::abilities::effect::EffectKind;
use crate::core::error::{Result, SimError};
use crate::core::types::{Tick, UnitId};
use crate::units::stats::Stat;
use crate::units::unit::Unit;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    OnHit,
    OnAbilityCast,
    OnTakeDamage,
    OnKill,
    OnInterval,
}

/// Effects fired when a trigger condition occurs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggeredEffect {
    pub trigger: TriggerKind,
    /// Pulse cadence for `on_interval`, in ticks
    #[serde(default)]
    pub interval: Tick,
    pub effects: Vec<EffectKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CondOp {
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<=")]
    Lte,
}

impl CondOp {
    fn check(&self, a: f32, b: f32) -> bool {
        match self {
            CondOp::Gt => a > b,
            CondOp::Lt => a < b,
            CondOp::Gte => a >= b,
            CondOp::Lte => a <= b,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKind {
    TargetMaxHp,
    TargetHpPercent,
    TargetCurrentHp,
    SelfMaxHp,
    SelfHpPercent,
    TargetHasShield,
}

/// Predicate over the attacker/defender pair, evaluated per damage event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    #[serde(rename = "type")]
    pub kind: ConditionKind,
    pub operator: CondOp,
    #[serde(default)]
    pub value: f32,
}

impl Condition {
    pub fn check(&self, owner: &Unit, other: &Unit) -> bool {
        match self.kind {
            ConditionKind::TargetMaxHp => self.operator.check(other.stats.max_hp(), self.value),
            ConditionKind::TargetHpPercent => {
                self.operator.check(other.stats.hp_fraction(), self.value)
            }
            ConditionKind::TargetCurrentHp => {
                self.operator.check(other.stats.current_hp, self.value)
            }
            ConditionKind::SelfMaxHp => self.operator.check(owner.stats.max_hp(), self.value),
            ConditionKind::SelfHpPercent => {
                self.operator.check(owner.stats.hp_fraction(), self.value)
            }
            ConditionKind::TargetHasShield => {
                self.operator.check(other.status.total_shield(), self.value)
            }
        }
    }
}

/// What a satisfied condition contributes to the damage pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConditionalBonus {
    /// Multiply outgoing damage by `1 + value`
    DamageAmp { value: f32 },
    /// Multiply incoming damage by `1 - value`
    DamageReduction { value: f32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionalEffect {
    pub condition: Condition,
    pub effect: ConditionalBonus,
}

/// One item definition record.
///
/// `stats` keys use the definition-table spelling; a `_percent` suffix
/// routes the value into the percent layer (`"ad_percent": 0.35`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDef {
    pub name: String,
    #[serde(default)]
    pub stats: BTreeMap<String, f32>,
    #[serde(default)]
    pub flags: BTreeMap<String, bool>,
    #[serde(default)]
    pub effects: Vec<TriggeredEffect>,
    #[serde(default)]
    pub conditional_effects: Vec<ConditionalEffect>,
    /// At most one copy per unit
    #[serde(default)]
    pub unique: bool,
}

/// All equipped items for one battle
#[derive(Debug, Clone, Default)]
pub struct ItemManager {
    equipped: Vec<(UnitId, ItemDef)>,
}

impl ItemManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an item's stat table and flags to the unit and remember the
    /// definition for trigger/condition queries.
    pub fn equip(&mut self, unit: &mut Unit, def: &ItemDef) -> Result<()> {
        if def.unique
            && self
                .equipped
                .iter()
                .any(|(id, item)| *id == unit.id && item.name == def.name)
        {
            return Err(SimError::InvalidConfig(format!(
                "unit {} already holds unique item {}",
                unit.id, def.name
            )));
        }

        for (key, value) in &def.stats {
            match key.strip_suffix("_percent") {
                Some(base) => unit.stats.add_percent(Stat::parse(base)?, *value),
                None => unit.stats.add_flat(Stat::parse(key)?, *value),
            }
        }

        if def.flags.get("ability_crit").copied().unwrap_or(false) {
            unit.ability_crit = true;
        }

        self.equipped.push((unit.id, def.clone()));
        Ok(())
    }

    pub fn items_of(&self, unit: UnitId) -> impl Iterator<Item = &ItemDef> {
        self.equipped
            .iter()
            .filter(move |(id, _)| *id == unit)
            .map(|(_, def)| def)
    }

    /// Multiplicative product of satisfied attacker-side amplifiers
    pub fn damage_amp(&self, attacker: &Unit, defender: &Unit) -> f32 {
        let mut amp = 1.0;
        for item in self.items_of(attacker.id) {
            for cond in &item.conditional_effects {
                if let ConditionalBonus::DamageAmp { value } = cond.effect {
                    if cond.condition.check(attacker, defender) {
                        amp *= 1.0 + value;
                    }
                }
            }
        }
        amp
    }

    /// Multiplicative product of satisfied defender-side reductions
    pub fn damage_reduction(&self, attacker: &Unit, defender: &Unit) -> f32 {
        let mut mult = 1.0;
        for item in self.items_of(defender.id) {
            for cond in &item.conditional_effects {
                if let ConditionalBonus::DamageReduction { value } = cond.effect {
                    if cond.condition.check(defender, attacker) {
                        mult *= 1.0 - value;
                    }
                }
            }
        }
        mult
    }

    /// Effect lists fired by `trigger` for this unit
    pub fn triggered(&self, unit: UnitId, trigger: TriggerKind) -> Vec<EffectKind> {
        let mut out = Vec::new();
        for item in self.items_of(unit) {
            for fx in &item.effects {
                if fx.trigger == trigger && trigger != TriggerKind::OnInterval {
                    out.extend(fx.effects.iter().cloned());
                }
            }
        }
        out
    }

    /// Interval effects due on this tick
    pub fn interval_due(&self, unit: UnitId, tick: Tick) -> Vec<EffectKind> {
        let mut out = Vec::new();
        for item in self.items_of(unit) {
            for fx in &item.effects {
                if fx.trigger == TriggerKind::OnInterval
                    && fx.interval > 0
                    && tick > 0
                    && tick % fx.interval == 0
                {
                    out.extend(fx.effects.iter().cloned());
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::hex::HexCoord;
    use crate::core::config::SimConfig;
    use crate::units::stats::BaseStats;
    use crate::units::unit::UnitDef;

    fn mk_unit(id: u32, hp: f32) -> Unit {
        let mut base = BaseStats::default();
        base.hp = hp;
        let def = UnitDef {
            name: "dummy".into(),
            stats: base,
            ..UnitDef::default()
        };
        Unit::from_def(UnitId(id), &def, 0, HexCoord::new(id as i32, 0), 1, &SimConfig::default())
            .unwrap()
    }

    fn giant_slayer() -> ItemDef {
        serde_json::from_str(
            r#"{
                "name": "Giant Slayer",
                "stats": {"ad_percent": 0.2},
                "conditional_effects": [{
                    "condition": {"type": "target_max_hp", "operator": ">", "value": 1600},
                    "effect": {"type": "damage_amp", "value": 0.2}
                }]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_equip_applies_stats() {
        let mut manager = ItemManager::new();
        let mut unit = mk_unit(0, 500.0);
        let baseline = unit.stats.attack_damage();
        manager.equip(&mut unit, &giant_slayer()).unwrap();
        assert!((unit.stats.attack_damage() - baseline * 1.2).abs() < 1e-3);
    }

    #[test]
    fn test_conditional_amp_only_against_big_targets() {
        let mut manager = ItemManager::new();
        let mut attacker = mk_unit(0, 500.0);
        manager.equip(&mut attacker, &giant_slayer()).unwrap();

        let small = mk_unit(1, 800.0);
        let big = mk_unit(2, 2000.0);
        assert_eq!(manager.damage_amp(&attacker, &small), 1.0);
        assert!((manager.damage_amp(&attacker, &big) - 1.2).abs() < 1e-5);
    }

    #[test]
    fn test_unknown_stat_rejected_at_equip() {
        let mut manager = ItemManager::new();
        let mut unit = mk_unit(0, 500.0);
        let bad: ItemDef = serde_json::from_str(
            r#"{"name": "Cursed Gem", "stats": {"luck": 7}}"#,
        )
        .unwrap();
        assert!(manager.equip(&mut unit, &bad).is_err());
    }

    #[test]
    fn test_unique_item_rejects_second_copy() {
        let mut manager = ItemManager::new();
        let mut unit = mk_unit(0, 500.0);
        let mut def = giant_slayer();
        def.unique = true;
        manager.equip(&mut unit, &def).unwrap();
        assert!(manager.equip(&mut unit, &def).is_err());
    }

    #[test]
    fn test_ability_crit_flag() {
        let mut manager = ItemManager::new();
        let mut unit = mk_unit(0, 500.0);
        let def: ItemDef = serde_json::from_str(
            r#"{"name": "Jeweled Gauntlet", "flags": {"ability_crit": true}}"#,
        )
        .unwrap();
        manager.equip(&mut unit, &def).unwrap();
        assert!(unit.ability_crit);
    }

    #[test]
    fn test_interval_trigger_cadence() {
        let mut manager = ItemManager::new();
        let mut unit = mk_unit(0, 500.0);
        let def: ItemDef = serde_json::from_str(
            r#"{
                "name": "Sunfire",
                "effects": [{
                    "trigger": "on_interval",
                    "interval": 60,
                    "effects": [{"type": "shield_self", "value": 50, "duration": 60}]
                }]
            }"#,
        )
        .unwrap();
        manager.equip(&mut unit, &def).unwrap();

        assert!(manager.interval_due(unit.id, 0).is_empty());
        assert!(manager.interval_due(unit.id, 59).is_empty());
        assert_eq!(manager.interval_due(unit.id, 60).len(), 1);
        assert_eq!(manager.interval_due(unit.id, 120).len(), 1);
    }

    #[test]
    fn test_on_hit_effects_returned() {
        let mut manager = ItemManager::new();
        let mut unit = mk_unit(0, 500.0);
        let def: ItemDef = serde_json::from_str(
            r#"{
                "name": "Red Buff",
                "effects": [{
                    "trigger": "on_hit",
                    "effects": [{"type": "burn", "value": 15, "duration": 90}]
                }]
            }"#,
        )
        .unwrap();
        manager.equip(&mut unit, &def).unwrap();
        assert_eq!(manager.triggered(unit.id, TriggerKind::OnHit).len(), 1);
        assert!(manager.triggered(unit.id, TriggerKind::OnKill).is_empty());
    }
}
