//! Ability definitions
//!
//! An ability is a reference record: mana cost, cast timing, a target
//! selector, a delivery mode (instant, projectile, or area) and an
//! ordered effect list. Instances never mutate; the engine captures the
//! caster's star level when the cast resolves.

use serde::{Deserialize, Serialize};

use crate::abilities::effect::EffectKind;
use crate::abilities::scaling::StarValue;
use crate::battle::constants::{
    DEFAULT_CAST_TICKS, DEFAULT_CONE_ANGLE_DEG, DEFAULT_PROJECTILE_SPEED,
};
use crate::combat::targeting::TargetSelector;
use crate::core::types::{StarLevel, Tick};

/// How the effect list reaches its targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Delivery {
    #[default]
    Instant,
    Projectile,
    Area,
}

/// Which side of the fight an area effect touches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Affiliation {
    #[default]
    Enemies,
    Allies,
    All,
}

/// Where an AoE shape is anchored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AoeAnchor {
    #[default]
    Target,
    Caster,
}

fn default_cone_angle() -> f32 {
    DEFAULT_CONE_ANGLE_DEG
}

fn default_line_width() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum AoeShape {
    Circle {
        radius: StarValue,
    },
    Cone {
        #[serde(default = "default_cone_angle")]
        angle: f32,
        range: u32,
    },
    Line {
        #[serde(default = "default_line_width")]
        width: u32,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AoeSpec {
    #[serde(flatten)]
    pub shape: AoeShape,
    #[serde(default)]
    pub anchor: AoeAnchor,
}

fn default_speed() -> f32 {
    DEFAULT_PROJECTILE_SPEED
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectileSpec {
    /// Hexes per tick
    #[serde(default = "default_speed")]
    pub speed: f32,
    /// Re-aim at the target's hex every tick
    #[serde(default = "default_true")]
    pub homing: bool,
    /// Discard with a miss when the target dies mid-flight
    #[serde(default = "default_true")]
    pub can_miss: bool,
}

impl Default for ProjectileSpec {
    fn default() -> Self {
        Self {
            speed: default_speed(),
            homing: true,
            can_miss: true,
        }
    }
}

fn default_mana_cost() -> f32 {
    100.0
}

fn default_cast_time() -> StarValue {
    StarValue::Scalar(DEFAULT_CAST_TICKS as f32)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbilityDef {
    pub name: String,
    #[serde(default = "default_mana_cost")]
    pub mana_cost: f32,
    /// Full cast window in ticks, per star
    #[serde(default = "default_cast_time")]
    pub cast_time: StarValue,
    /// Ticks from cast start to the effect point
    #[serde(default)]
    pub effect_delay: StarValue,
    #[serde(default)]
    pub target: TargetSelector,
    #[serde(default)]
    pub delivery: Delivery,
    #[serde(default)]
    pub projectile: Option<ProjectileSpec>,
    #[serde(default)]
    pub aoe: Option<AoeSpec>,
    #[serde(default)]
    pub affiliation: Affiliation,
    pub effects: Vec<EffectKind>,
}

impl AbilityDef {
    pub fn cast_ticks(&self, star: StarLevel) -> Tick {
        self.cast_time.at_ticks(star).max(1)
    }

    pub fn effect_delay_ticks(&self, star: StarLevel) -> Tick {
        self.effect_delay.at_ticks(star).min(self.cast_ticks(star))
    }

    pub fn projectile_spec(&self) -> ProjectileSpec {
        self.projectile.clone().unwrap_or_default()
    }
}
