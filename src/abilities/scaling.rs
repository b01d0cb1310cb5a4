//! Star-level value arrays and stat-ratio scaling
//!
//! Effect values are declared per star (`[200, 350, 600]`) or as one
//! scalar for all stars. A declared scaling key multiplies the star value
//! by `stat / 100`, read from the caster's current effective stats except
//! for the target-side keys (`max_hp`, `missing_hp`).

use serde::{Deserialize, Serialize};

use crate::core::types::StarLevel;
use crate::units::unit::Unit;

/// One value per star level, or a single scalar shared by all stars
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StarValue {
    Scalar(f32),
    PerStar(Vec<f32>),
}

impl Default for StarValue {
    fn default() -> Self {
        StarValue::Scalar(0.0)
    }
}

impl From<f32> for StarValue {
    fn from(v: f32) -> Self {
        StarValue::Scalar(v)
    }
}

impl StarValue {
    /// Value for a star level; short arrays repeat their last entry
    pub fn at(&self, star: StarLevel) -> f32 {
        match self {
            StarValue::Scalar(v) => *v,
            StarValue::PerStar(values) => {
                if values.is_empty() {
                    return 0.0;
                }
                let index = (star.max(1) as usize - 1).min(values.len() - 1);
                values[index]
            }
        }
    }

    pub fn at_ticks(&self, star: StarLevel) -> u32 {
        self.at(star).max(0.0) as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalingKey {
    Ad,
    Ap,
    Armor,
    Mr,
    /// Target's effective max HP
    MaxHp,
    /// Target's missing HP
    MissingHp,
    /// Caster's effective max HP
    CasterHp,
    /// Caster's missing HP
    CasterMissingHp,
}

fn scaling_stat(key: ScalingKey, caster: &Unit, target: Option<&Unit>) -> f32 {
    match key {
        ScalingKey::Ad => caster.stats.attack_damage(),
        ScalingKey::Ap => caster.stats.ability_power(),
        ScalingKey::Armor => caster.stats.armor(),
        ScalingKey::Mr => caster.stats.magic_resist(),
        ScalingKey::CasterHp => caster.stats.max_hp(),
        ScalingKey::CasterMissingHp => caster.stats.max_hp() - caster.stats.current_hp,
        ScalingKey::MaxHp => target.map(|t| t.stats.max_hp()).unwrap_or(100.0),
        ScalingKey::MissingHp => target
            .map(|t| t.stats.max_hp() - t.stats.current_hp)
            .unwrap_or(0.0),
    }
}

/// `value[star] * (stat / 100)`, or the bare star value with no key
pub fn scaled_value(
    value: &StarValue,
    scaling: Option<ScalingKey>,
    star: StarLevel,
    caster: &Unit,
    target: Option<&Unit>,
) -> f32 {
    let base = value.at(star);
    match scaling {
        None => base,
        Some(key) => base * scaling_stat(key, caster, target) / 100.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::hex::HexCoord;
    use crate::core::config::SimConfig;
    use crate::core::types::UnitId;
    use crate::units::stats::{BaseStats, Stat};
    use crate::units::unit::UnitDef;

    fn caster_with_ap(ap: f32) -> Unit {
        let mut base = BaseStats::default();
        base.ability_power = ap;
        let def = UnitDef {
            name: "caster".into(),
            stats: base,
            ..UnitDef::default()
        };
        Unit::from_def(UnitId(0), &def, 0, HexCoord::new(0, 0), 1, &SimConfig::default()).unwrap()
    }

    #[test]
    fn test_star_value_lookup() {
        let v = StarValue::PerStar(vec![100.0, 200.0, 400.0]);
        assert_eq!(v.at(1), 100.0);
        assert_eq!(v.at(2), 200.0);
        assert_eq!(v.at(3), 400.0);
    }

    #[test]
    fn test_scalar_value_same_for_all_stars() {
        let v = StarValue::Scalar(150.0);
        assert_eq!(v.at(1), 150.0);
        assert_eq!(v.at(3), 150.0);
    }

    #[test]
    fn test_short_array_repeats_last() {
        let v = StarValue::PerStar(vec![100.0, 200.0]);
        assert_eq!(v.at(3), 200.0);
    }

    #[test]
    fn test_ap_scaling_ratio() {
        let caster = caster_with_ap(150.0);
        let value = StarValue::PerStar(vec![200.0, 350.0, 600.0]);
        let scaled = scaled_value(&value, Some(ScalingKey::Ap), 2, &caster, None);
        assert!((scaled - 525.0).abs() < 1e-3); // 350 * 1.5
    }

    #[test]
    fn test_no_scaling_returns_star_value() {
        let caster = caster_with_ap(150.0);
        let value = StarValue::Scalar(90.0);
        assert_eq!(scaled_value(&value, None, 2, &caster, None), 90.0);
    }

    #[test]
    fn test_missing_hp_reads_target() {
        let caster = caster_with_ap(100.0);
        let mut target = caster_with_ap(100.0);
        target.stats.take_damage(200.0);

        let value = StarValue::Scalar(50.0);
        let scaled = scaled_value(&value, Some(ScalingKey::MissingHp), 1, &caster, Some(&target));
        assert!((scaled - 50.0 * 200.0 / 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_scaling_tracks_live_modifiers() {
        let mut caster = caster_with_ap(100.0);
        let value = StarValue::Scalar(100.0);
        let before = scaled_value(&value, Some(ScalingKey::Ap), 1, &caster, None);
        caster.stats.add_percent(Stat::AbilityPower, 0.5);
        let after = scaled_value(&value, Some(ScalingKey::Ap), 1, &caster, None);
        assert!((after - before * 1.5).abs() < 1e-3);
    }

    #[test]
    fn test_parse_both_shapes() {
        let scalar: StarValue = serde_json::from_str("120.5").unwrap();
        assert_eq!(scalar, StarValue::Scalar(120.5));
        let array: StarValue = serde_json::from_str("[1, 2, 3]").unwrap();
        assert_eq!(array, StarValue::PerStar(vec![1.0, 2.0, 3.0]));
    }
}
