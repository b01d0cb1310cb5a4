//! Unit classes: per-archetype tweaks to the mana economy and targeting
//!
//! A class scales mana income, adds passive regeneration and may override
//! the default target selector (assassins jump the backline, marksmen
//! shoot the farthest target).

use serde::{Deserialize, Serialize};

use crate::combat::targeting::TargetSelector;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitClass {
    pub name: String,
    /// Multiplier on mana gained per landed auto-attack
    pub mana_per_attack_multiplier: f32,
    /// Multiplier on mana gained from damage taken
    pub mana_from_damage_multiplier: f32,
    /// Passive mana per second, divided across ticks
    pub mana_per_second: f32,
    /// Overrides the unit's default target selector when set
    pub target_selector: Option<TargetSelector>,
}

impl Default for UnitClass {
    fn default() -> Self {
        Self {
            name: "default".into(),
            mana_per_attack_multiplier: 1.0,
            mana_from_damage_multiplier: 1.0,
            mana_per_second: 0.0,
            target_selector: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_class_is_neutral() {
        let class = UnitClass::default();
        assert_eq!(class.mana_per_attack_multiplier, 1.0);
        assert_eq!(class.mana_from_damage_multiplier, 1.0);
        assert_eq!(class.mana_per_second, 0.0);
        assert!(class.target_selector.is_none());
    }

    #[test]
    fn test_class_parses_from_json() {
        let class: UnitClass = serde_json::from_str(
            r#"{
                "name": "sorcerer",
                "mana_per_attack_multiplier": 0.5,
                "mana_from_damage_multiplier": 1.5,
                "mana_per_second": 2.0
            }"#,
        )
        .unwrap();
        assert_eq!(class.name, "sorcerer");
        assert_eq!(class.mana_from_damage_multiplier, 1.5);
    }
}
