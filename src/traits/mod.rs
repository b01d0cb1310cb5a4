//! Trait (synergy) application
//!
//! A trait activates when enough distinct unit kinds on a team carry it;
//! higher thresholds replace lower ones. Activation grants stat bonuses or
//! damage amplifiers to the holders (or the whole team) and may register
//! interval or HP-threshold triggers that fire during the battle.

use std::collections::BTreeMap;

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::abilities::effect::EffectKind;
use crate::core::types::{Team, Tick, UnitId};
use crate::units::stats::Stat;
use crate::units::unit::Unit;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TraitTrigger {
    #[default]
    OnBattleStart,
    /// Fires once per holder when its HP falls to the threshold
    OnHpThreshold,
    /// Fires every `interval` ticks for each holder
    OnInterval,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TraitTarget {
    #[default]
    Holders,
    Team,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TraitBonus {
    StatBonus {
        stat: Stat,
        value: f32,
        #[serde(default)]
        is_percent: bool,
        #[serde(default)]
        target: TraitTarget,
    },
    DamageAmp {
        value: f32,
        #[serde(default)]
        target: TraitTarget,
    },
    /// Any ordinary effect, applied with each recipient as caster and target
    Effect {
        effect: Box<EffectKind>,
        #[serde(default)]
        target: TraitTarget,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraitThreshold {
    #[serde(default)]
    pub trigger: TraitTrigger,
    /// Pulse cadence for `on_interval`, in ticks
    #[serde(default)]
    pub interval: Tick,
    /// HP fraction for `on_hp_threshold`
    #[serde(default)]
    pub hp_threshold: f32,
    pub effects: Vec<TraitBonus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraitDef {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Required distinct-holder count per tier
    pub thresholds: BTreeMap<u32, TraitThreshold>,
}

impl TraitDef {
    /// Highest tier at or below `count`. Tiers replace, never sum.
    pub fn active_threshold(&self, count: u32) -> Option<&TraitThreshold> {
        self.thresholds
            .iter()
            .filter(|(required, _)| **required <= count)
            .map(|(_, threshold)| threshold)
            .last()
    }
}

/// A trigger registered at activation, bound to its recipients
#[derive(Debug, Clone)]
struct ActiveTrigger {
    trigger: TraitTrigger,
    interval: Tick,
    hp_threshold: f32,
    recipients: Vec<UnitId>,
    effects: Vec<EffectKind>,
    fired: AHashSet<UnitId>,
}

#[derive(Debug, Clone, Default)]
pub struct TraitManager {
    defs: BTreeMap<String, TraitDef>,
    amps: BTreeMap<UnitId, f32>,
    triggers: Vec<ActiveTrigger>,
}

impl TraitManager {
    pub fn new(defs: impl IntoIterator<Item = (String, TraitDef)>) -> Self {
        Self {
            defs: defs.into_iter().collect(),
            amps: BTreeMap::new(),
            triggers: Vec::new(),
        }
    }

    /// Distinct unit kinds on `team` holding `trait_id`
    fn holder_count(units: &[Unit], team: Team, trait_id: &str) -> u32 {
        let mut kinds: Vec<&str> = units
            .iter()
            .filter(|u| u.team == team && u.traits.iter().any(|t| t == trait_id))
            .map(|u| u.kind.as_str())
            .collect();
        kinds.sort_unstable();
        kinds.dedup();
        kinds.len() as u32
    }

    /// Resolve thresholds at battle start. Stat bonuses are applied to the
    /// units directly; amp bonuses and triggers are recorded for later.
    pub fn activate(&mut self, units: &mut [Unit]) {
        let defs = self.defs.clone();
        for (trait_id, def) in &defs {
            for team in [0u8, 1u8] {
                let count = Self::holder_count(units, team, trait_id);
                let Some(threshold) = def.active_threshold(count) else {
                    continue;
                };

                let holders: Vec<UnitId> = units
                    .iter()
                    .filter(|u| u.team == team && u.traits.iter().any(|t| t == trait_id))
                    .map(|u| u.id)
                    .collect();
                let team_ids: Vec<UnitId> =
                    units.iter().filter(|u| u.team == team).map(|u| u.id).collect();

                let recipients_of = |target: TraitTarget| -> Vec<UnitId> {
                    match target {
                        TraitTarget::Holders => holders.clone(),
                        TraitTarget::Team => team_ids.clone(),
                    }
                };

                if threshold.trigger == TraitTrigger::OnBattleStart {
                    for bonus in &threshold.effects {
                        match bonus {
                            TraitBonus::StatBonus {
                                stat,
                                value,
                                is_percent,
                                target,
                            } => {
                                for id in recipients_of(*target) {
                                    let unit = &mut units[id.index()];
                                    if *is_percent {
                                        unit.stats.add_percent(*stat, *value);
                                    } else {
                                        unit.stats.add_flat(*stat, *value);
                                    }
                                }
                            }
                            TraitBonus::DamageAmp { value, target } => {
                                for id in recipients_of(*target) {
                                    let amp = self.amps.entry(id).or_insert(1.0);
                                    *amp *= 1.0 + value;
                                }
                            }
                            TraitBonus::Effect { effect, target } => {
                                // battle-start plain effects become a
                                // one-shot trigger consumed on tick 0
                                self.triggers.push(ActiveTrigger {
                                    trigger: TraitTrigger::OnBattleStart,
                                    interval: 0,
                                    hp_threshold: 0.0,
                                    recipients: recipients_of(*target),
                                    effects: vec![(**effect).clone()],
                                    fired: AHashSet::new(),
                                });
                            }
                        }
                    }
                } else {
                    // interval / hp triggers carry their plain effects
                    let effects: Vec<EffectKind> = threshold
                        .effects
                        .iter()
                        .filter_map(|b| match b {
                            TraitBonus::Effect { effect, .. } => Some((**effect).clone()),
                            _ => None,
                        })
                        .collect();
                    if !effects.is_empty() {
                        self.triggers.push(ActiveTrigger {
                            trigger: threshold.trigger,
                            interval: threshold.interval,
                            hp_threshold: threshold.hp_threshold,
                            recipients: recipients_of(TraitTarget::Holders),
                            effects,
                            fired: AHashSet::new(),
                        });
                    }
                }
            }
        }
    }

    /// Multiplicative amp contribution for one attacker
    pub fn damage_amp(&self, attacker: UnitId) -> f32 {
        self.amps.get(&attacker).copied().unwrap_or(1.0)
    }

    /// (recipient, effects) pairs due this tick from battle-start one-shots
    /// and interval triggers
    pub fn due_this_tick(&mut self, tick: Tick) -> Vec<(UnitId, Vec<EffectKind>)> {
        let mut due = Vec::new();
        for trigger in self.triggers.iter_mut() {
            match trigger.trigger {
                TraitTrigger::OnBattleStart => {
                    for id in &trigger.recipients {
                        if trigger.fired.insert(*id) {
                            due.push((*id, trigger.effects.clone()));
                        }
                    }
                }
                TraitTrigger::OnInterval => {
                    if trigger.interval > 0 && tick > 0 && tick % trigger.interval == 0 {
                        for id in &trigger.recipients {
                            due.push((*id, trigger.effects.clone()));
                        }
                    }
                }
                TraitTrigger::OnHpThreshold => {}
            }
        }
        due
    }

    /// HP-threshold triggers that newly fired, given current unit state
    pub fn hp_triggers(&mut self, units: &[Unit]) -> Vec<(UnitId, Vec<EffectKind>)> {
        let mut due = Vec::new();
        for trigger in self.triggers.iter_mut() {
            if trigger.trigger != TraitTrigger::OnHpThreshold {
                continue;
            }
            for id in &trigger.recipients {
                let unit = &units[id.index()];
                if unit.is_alive()
                    && unit.stats.hp_fraction() <= trigger.hp_threshold
                    && trigger.fired.insert(*id)
                {
                    due.push((*id, trigger.effects.clone()));
                }
            }
        }
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::hex::HexCoord;
    use crate::core::config::SimConfig;
    use crate::units::unit::UnitDef;

    fn mk_unit(id: u32, team: u8, kind: &str, traits: &[&str]) -> Unit {
        let def = UnitDef {
            name: kind.into(),
            traits: traits.iter().map(|t| t.to_string()).collect(),
            ..UnitDef::default()
        };
        Unit::from_def(
            UnitId(id),
            &def,
            team,
            HexCoord::new(id as i32 % 7, id as i32 / 7),
            1,
            &SimConfig::default(),
        )
        .unwrap()
    }

    fn knight_trait() -> (String, TraitDef) {
        let def: TraitDef = serde_json::from_str(
            r#"{
                "name": "Knight",
                "thresholds": {
                    "2": {"effects": [{"type": "stat_bonus", "stat": "armor", "value": 20}]},
                    "4": {"effects": [{"type": "stat_bonus", "stat": "armor", "value": 45}]}
                }
            }"#,
        )
        .unwrap();
        ("knight".to_string(), def)
    }

    #[test]
    fn test_duplicate_kinds_count_once() {
        let units = vec![
            mk_unit(0, 0, "warrior", &["knight"]),
            mk_unit(1, 0, "warrior", &["knight"]),
        ];
        assert_eq!(TraitManager::holder_count(&units, 0, "knight"), 1);
    }

    #[test]
    fn test_threshold_applies_to_holders() {
        let mut units = vec![
            mk_unit(0, 0, "warrior", &["knight"]),
            mk_unit(1, 0, "guard", &["knight"]),
            mk_unit(2, 0, "archer", &[]),
            mk_unit(3, 1, "rogue", &["knight"]),
        ];
        let base_armor = units[0].stats.armor();

        let mut manager = TraitManager::new([knight_trait()]);
        manager.activate(&mut units);

        assert_eq!(units[0].stats.armor(), base_armor + 20.0);
        assert_eq!(units[1].stats.armor(), base_armor + 20.0);
        // non-holder untouched, lone enemy holder below threshold
        assert_eq!(units[2].stats.armor(), base_armor);
        assert_eq!(units[3].stats.armor(), base_armor);
    }

    #[test]
    fn test_higher_threshold_replaces_lower() {
        let mut units: Vec<Unit> = (0..4)
            .map(|i| mk_unit(i, 0, &format!("knight_{}", i), &["knight"]))
            .collect();
        let base_armor = units[0].stats.armor();

        let mut manager = TraitManager::new([knight_trait()]);
        manager.activate(&mut units);

        // 4 distinct holders: the tier-4 bonus applies alone
        assert_eq!(units[0].stats.armor(), base_armor + 45.0);
    }

    #[test]
    fn test_damage_amp_recorded_per_holder() {
        let def: TraitDef = serde_json::from_str(
            r#"{
                "name": "Slayer",
                "thresholds": {
                    "2": {"effects": [{"type": "damage_amp", "value": 0.15}]}
                }
            }"#,
        )
        .unwrap();
        let mut units = vec![
            mk_unit(0, 0, "axe", &["slayer"]),
            mk_unit(1, 0, "blade", &["slayer"]),
            mk_unit(2, 0, "archer", &[]),
        ];
        let mut manager = TraitManager::new([("slayer".to_string(), def)]);
        manager.activate(&mut units);

        assert!((manager.damage_amp(UnitId(0)) - 1.15).abs() < 1e-5);
        assert_eq!(manager.damage_amp(UnitId(2)), 1.0);
    }

    #[test]
    fn test_hp_threshold_fires_once() {
        let def: TraitDef = serde_json::from_str(
            r#"{
                "name": "Juggernaut",
                "thresholds": {
                    "1": {
                        "trigger": "on_hp_threshold",
                        "hp_threshold": 0.5,
                        "effects": [{
                            "type": "effect",
                            "effect": {"type": "shield_self", "value": 200, "duration": 120}
                        }]
                    }
                }
            }"#,
        )
        .unwrap();
        let mut units = vec![mk_unit(0, 0, "bruiser", &["juggernaut"])];
        let mut manager = TraitManager::new([("juggernaut".to_string(), def)]);
        manager.activate(&mut units);

        assert!(manager.hp_triggers(&units).is_empty());
        units[0].stats.take_damage(300.0);
        assert_eq!(manager.hp_triggers(&units).len(), 1);
        // does not fire twice
        assert!(manager.hp_triggers(&units).is_empty());
    }
}
