//! Target selection policies
//!
//! Selectors are pure functions over (source, candidate pool, rng) that
//! return at most one candidate. Candidates beyond `max_range` are
//! filtered out first. Ties always resolve to the smallest stable id, so
//! selection is deterministic; only `random` consumes the RNG stream.

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize};

use crate::core::error::{Result, SimError};
use crate::core::rng::BattleRng;
use crate::core::types::UnitId;
use crate::units::stats::Stat;
use crate::units::unit::Unit;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectorKind {
    Nearest,
    Farthest,
    LowestHpPercent,
    LowestHpFlat,
    HighestStat,
    Cluster,
    Random,
    Frontline,
    Backline,
    CurrentTarget,
}

impl SelectorKind {
    fn from_name(name: &str) -> Result<Self> {
        match name {
            "nearest" => Ok(Self::Nearest),
            "farthest" => Ok(Self::Farthest),
            "lowest_hp_percent" | "lowest_hp" => Ok(Self::LowestHpPercent),
            "lowest_hp_flat" => Ok(Self::LowestHpFlat),
            "highest_stat" => Ok(Self::HighestStat),
            "cluster" => Ok(Self::Cluster),
            "random" => Ok(Self::Random),
            "frontline" => Ok(Self::Frontline),
            "backline" => Ok(Self::Backline),
            "current_target" => Ok(Self::CurrentTarget),
            other => Err(SimError::UnknownSelector(other.to_string())),
        }
    }
}

/// A selector policy plus its parameters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetSelector {
    pub kind: SelectorKind,
    /// Candidates farther than this (in hexes) are ignored
    pub max_range: Option<u32>,
    /// Stat compared by `highest_stat`
    pub stat: Option<Stat>,
    /// Neighborhood radius used by `cluster`
    pub radius: u32,
}

impl Default for TargetSelector {
    fn default() -> Self {
        Self::new(SelectorKind::CurrentTarget)
    }
}

impl TargetSelector {
    pub fn new(kind: SelectorKind) -> Self {
        Self {
            kind,
            max_range: None,
            stat: None,
            radius: 2,
        }
    }

    pub fn nearest() -> Self {
        Self::new(SelectorKind::Nearest)
    }

    /// Pick a target from `candidates` (live units of the relevant
    /// affiliation, in stable id order).
    pub fn select(&self, source: &Unit, candidates: &[&Unit], rng: &mut BattleRng) -> Option<UnitId> {
        let pool: Vec<&Unit> = candidates
            .iter()
            .copied()
            .filter(|c| match self.max_range {
                Some(range) => source.position.distance(&c.position) <= range,
                None => true,
            })
            .collect();
        if pool.is_empty() {
            return None;
        }

        match self.kind {
            SelectorKind::Nearest => lowest_by(&pool, |c| source.position.distance(&c.position) as f64),
            SelectorKind::Farthest => {
                highest_by(&pool, |c| source.position.distance(&c.position) as f64)
            }
            SelectorKind::LowestHpPercent => lowest_by(&pool, |c| c.stats.hp_fraction() as f64),
            SelectorKind::LowestHpFlat => lowest_by(&pool, |c| c.stats.current_hp as f64),
            SelectorKind::HighestStat => {
                let stat = self.stat.unwrap_or(Stat::AttackDamage);
                highest_by(&pool, |c| stat_value(c, stat) as f64)
            }
            SelectorKind::Cluster => highest_by(&pool, |c| {
                pool.iter()
                    .filter(|o| o.id != c.id && c.position.distance(&o.position) <= self.radius)
                    .count() as f64
            }),
            SelectorKind::Random => rng.choice(&pool).map(|c| c.id),
            SelectorKind::Frontline => {
                // Team 0 spawns at low r, so the enemy closest to our edge
                // has the smallest r (and vice versa for team 1).
                if source.team == 0 {
                    lowest_by(&pool, |c| c.position.r as f64)
                } else {
                    highest_by(&pool, |c| c.position.r as f64)
                }
            }
            SelectorKind::Backline => {
                if source.team == 0 {
                    highest_by(&pool, |c| c.position.r as f64)
                } else {
                    lowest_by(&pool, |c| c.position.r as f64)
                }
            }
            SelectorKind::CurrentTarget => {
                if let Some(current) = source.target {
                    if pool.iter().any(|c| c.id == current) {
                        return Some(current);
                    }
                }
                lowest_by(&pool, |c| source.position.distance(&c.position) as f64)
            }
        }
    }
}

fn stat_value(unit: &Unit, stat: Stat) -> f32 {
    match stat {
        Stat::MaxHp => unit.stats.max_hp(),
        Stat::AttackDamage => unit.stats.attack_damage(),
        Stat::AbilityPower => unit.stats.ability_power(),
        Stat::Armor => unit.stats.armor(),
        Stat::MagicResist => unit.stats.magic_resist(),
        Stat::AttackSpeed => unit.stats.attack_speed(),
        Stat::CritChance => unit.stats.crit_chance(),
        Stat::CritDamage => unit.stats.crit_damage(),
        Stat::DodgeChance => unit.stats.dodge_chance(),
        Stat::Lifesteal => unit.stats.lifesteal(),
        Stat::Omnivamp => unit.stats.omnivamp(),
        Stat::MaxMana => unit.stats.max_mana(),
        Stat::StartMana => unit.stats.start_mana(),
        Stat::ManaRegen => unit.stats.mana_regen(),
        Stat::DamageAmp => unit.stats.damage_amp(),
        Stat::Durability => unit.stats.durability(),
    }
}

/// Smallest key wins; ties go to the smallest id
fn lowest_by<F: Fn(&Unit) -> f64>(pool: &[&Unit], key: F) -> Option<UnitId> {
    pool.iter()
        .min_by(|a, b| key(a).total_cmp(&key(b)).then(a.id.cmp(&b.id)))
        .map(|c| c.id)
}

/// Largest key wins; ties go to the smallest id
fn highest_by<F: Fn(&Unit) -> f64>(pool: &[&Unit], key: F) -> Option<UnitId> {
    pool.iter()
        .min_by(|a, b| key(b).total_cmp(&key(a)).then(a.id.cmp(&b.id)))
        .map(|c| c.id)
}

// Selectors deserialize from either a bare name ("nearest") or an object
// ({"selector": "cluster", "radius": 3, "max_range": 5}).
impl<'de> Deserialize<'de> for TargetSelector {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Spec {
            Name(String),
            Full {
                selector: String,
                #[serde(default)]
                max_range: Option<u32>,
                #[serde(default)]
                stat: Option<Stat>,
                #[serde(default)]
                radius: Option<u32>,
            },
        }

        match Spec::deserialize(deserializer)? {
            Spec::Name(name) => {
                let kind = SelectorKind::from_name(&name).map_err(DeError::custom)?;
                Ok(TargetSelector::new(kind))
            }
            Spec::Full {
                selector,
                max_range,
                stat,
                radius,
            } => {
                let kind = SelectorKind::from_name(&selector).map_err(DeError::custom)?;
                let mut out = TargetSelector::new(kind);
                out.max_range = max_range;
                out.stat = stat;
                if let Some(radius) = radius {
                    out.radius = radius;
                }
                Ok(out)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::hex::HexCoord;
    use crate::core::config::SimConfig;
    use crate::units::stats::BaseStats;
    use crate::units::unit::{Unit, UnitDef};

    fn mk_unit(id: u32, team: u8, pos: (i32, i32), hp: f32) -> Unit {
        let mut base = BaseStats::default();
        base.hp = hp;
        let def = UnitDef {
            name: format!("dummy_{}", id),
            stats: base,
            ..UnitDef::default()
        };
        Unit::from_def(UnitId(id), &def, team, HexCoord::new(pos.0, pos.1), 1, &SimConfig::default())
            .unwrap()
    }

    #[test]
    fn test_nearest_picks_closest() {
        let source = mk_unit(0, 0, (0, 0), 500.0);
        let near = mk_unit(1, 1, (1, 0), 500.0);
        let far = mk_unit(2, 1, (5, 0), 500.0);
        let mut rng = BattleRng::new(1);

        let picked = TargetSelector::nearest().select(&source, &[&near, &far], &mut rng);
        assert_eq!(picked, Some(UnitId(1)));
    }

    #[test]
    fn test_nearest_tie_breaks_by_id() {
        let source = mk_unit(0, 0, (0, 0), 500.0);
        let a = mk_unit(3, 1, (1, 0), 500.0);
        let b = mk_unit(1, 1, (0, 1), 500.0);
        let mut rng = BattleRng::new(1);

        let picked = TargetSelector::nearest().select(&source, &[&a, &b], &mut rng);
        assert_eq!(picked, Some(UnitId(1)));
    }

    #[test]
    fn test_max_range_filters() {
        let source = mk_unit(0, 0, (0, 0), 500.0);
        let far = mk_unit(1, 1, (5, 0), 500.0);
        let mut rng = BattleRng::new(1);

        let mut selector = TargetSelector::nearest();
        selector.max_range = Some(3);
        assert_eq!(selector.select(&source, &[&far], &mut rng), None);
    }

    #[test]
    fn test_lowest_hp_percent() {
        let source = mk_unit(0, 0, (0, 0), 500.0);
        let mut healthy = mk_unit(1, 1, (1, 0), 1000.0);
        let mut hurt = mk_unit(2, 1, (2, 0), 1000.0);
        healthy.stats.take_damage(100.0);
        hurt.stats.take_damage(700.0);
        let mut rng = BattleRng::new(1);

        let selector = TargetSelector::new(SelectorKind::LowestHpPercent);
        assert_eq!(selector.select(&source, &[&healthy, &hurt], &mut rng), Some(UnitId(2)));
    }

    #[test]
    fn test_highest_stat_attack_damage() {
        let source = mk_unit(0, 0, (0, 0), 500.0);
        let weak = mk_unit(1, 1, (1, 0), 500.0);
        let mut strong = mk_unit(2, 1, (2, 0), 500.0);
        strong.stats.add_flat(Stat::AttackDamage, 100.0);
        let mut rng = BattleRng::new(1);

        let mut selector = TargetSelector::new(SelectorKind::HighestStat);
        selector.stat = Some(Stat::AttackDamage);
        assert_eq!(selector.select(&source, &[&weak, &strong], &mut rng), Some(UnitId(2)));
    }

    #[test]
    fn test_cluster_prefers_crowded_candidate() {
        let source = mk_unit(0, 0, (0, 7), 500.0);
        let lone = mk_unit(1, 1, (6, 0), 500.0);
        let packed_a = mk_unit(2, 1, (0, 0), 500.0);
        let packed_b = mk_unit(3, 1, (1, 0), 500.0);
        let mut rng = BattleRng::new(1);

        let mut selector = TargetSelector::new(SelectorKind::Cluster);
        selector.radius = 1;
        let picked = selector.select(&source, &[&lone, &packed_a, &packed_b], &mut rng);
        assert_eq!(picked, Some(UnitId(2)));
    }

    #[test]
    fn test_backline_for_team_zero_is_high_r() {
        let source = mk_unit(0, 0, (0, 0), 500.0);
        let front = mk_unit(1, 1, (2, 2), 500.0);
        let back = mk_unit(2, 1, (2, 6), 500.0);
        let mut rng = BattleRng::new(1);

        let selector = TargetSelector::new(SelectorKind::Backline);
        assert_eq!(selector.select(&source, &[&front, &back], &mut rng), Some(UnitId(2)));

        let selector = TargetSelector::new(SelectorKind::Frontline);
        assert_eq!(selector.select(&source, &[&front, &back], &mut rng), Some(UnitId(1)));
    }

    #[test]
    fn test_current_target_keeps_valid_target() {
        let mut source = mk_unit(0, 0, (0, 0), 500.0);
        let a = mk_unit(1, 1, (1, 0), 500.0);
        let b = mk_unit(2, 1, (3, 0), 500.0);
        source.target = Some(UnitId(2));
        let mut rng = BattleRng::new(1);

        let selector = TargetSelector::default();
        assert_eq!(selector.select(&source, &[&a, &b], &mut rng), Some(UnitId(2)));

        // falls back to nearest when the target left the pool
        source.target = Some(UnitId(9));
        assert_eq!(selector.select(&source, &[&a, &b], &mut rng), Some(UnitId(1)));
    }

    #[test]
    fn test_random_is_deterministic_per_seed() {
        let source = mk_unit(0, 0, (0, 0), 500.0);
        let a = mk_unit(1, 1, (1, 0), 500.0);
        let b = mk_unit(2, 1, (2, 0), 500.0);

        let selector = TargetSelector::new(SelectorKind::Random);
        let first = selector.select(&source, &[&a, &b], &mut BattleRng::new(9));
        let second = selector.select(&source, &[&a, &b], &mut BattleRng::new(9));
        assert_eq!(first, second);
    }

    #[test]
    fn test_parse_bare_name_and_object() {
        let plain: TargetSelector = serde_json::from_str("\"nearest\"").unwrap();
        assert_eq!(plain.kind, SelectorKind::Nearest);

        let full: TargetSelector =
            serde_json::from_str(r#"{"selector": "cluster", "radius": 3, "max_range": 5}"#).unwrap();
        assert_eq!(full.kind, SelectorKind::Cluster);
        assert_eq!(full.radius, 3);
        assert_eq!(full.max_range, Some(5));
    }

    #[test]
    fn test_unknown_selector_rejected() {
        let bad: std::result::Result<TargetSelector, _> = serde_json::from_str("\"sideways\"");
        assert!(bad.is_err());
    }
}
