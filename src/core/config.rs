//! Simulation configuration
//!
//! The numeric defaults live in `battle::constants`; this struct is the
//! per-simulation view of them, so a caller can override tick rate, board
//! size or the mana economy for one battle without touching the rest.

use crate::battle::constants::{
    GRID_HEIGHT, GRID_WIDTH, MANA_DAMAGE_GAIN_CAP, MANA_PER_ATTACK, MANA_POST_MITIGATION_PCT,
    MANA_PRE_MITIGATION_PCT, MAX_BATTLE_TICKS, STAR_DAMAGE_MULTIPLIERS, STAR_HP_MULTIPLIERS,
    TICKS_PER_SECOND,
};
use crate::core::error::{Result, SimError};
use crate::core::types::Tick;

/// Mana economy parameters.
///
/// Mana from damage taken follows
/// `gain = min(cap, raw * pre_mitigation_pct + mitigated * post_mitigation_pct)`.
#[derive(Debug, Clone)]
pub struct ManaConfig {
    /// Mana granted per landed auto-attack, before class multipliers
    pub per_attack: f32,
    /// Fraction of pre-mitigation damage converted to mana
    pub pre_mitigation_pct: f32,
    /// Fraction of post-mitigation damage converted to mana
    pub post_mitigation_pct: f32,
    /// Cap on mana gained from a single damage event
    pub damage_gain_cap: f32,
    /// When true, mana gained above max carries into the next cast cycle.
    /// When false, mana resets to zero at cast end.
    pub overflow_enabled: bool,
}

impl Default for ManaConfig {
    fn default() -> Self {
        Self {
            per_attack: MANA_PER_ATTACK,
            pre_mitigation_pct: MANA_PRE_MITIGATION_PCT,
            post_mitigation_pct: MANA_POST_MITIGATION_PCT,
            damage_gain_cap: MANA_DAMAGE_GAIN_CAP,
            overflow_enabled: false,
        }
    }
}

/// Configuration for one simulation instance
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Fixed tick rate. Attack intervals and per-second effects divide by this.
    pub ticks_per_second: u32,
    /// Battle timeout. Reaching it without a wiped team is a draw.
    pub max_ticks: Tick,
    pub grid_width: u32,
    pub grid_height: u32,
    pub mana: ManaConfig,
    /// HP multiplier per star level, indexed by `star - 1`
    pub star_hp_multipliers: [f32; 3],
    /// AD/AP multiplier per star level, indexed by `star - 1`
    pub star_damage_multipliers: [f32; 3],
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            ticks_per_second: TICKS_PER_SECOND,
            max_ticks: MAX_BATTLE_TICKS,
            grid_width: GRID_WIDTH,
            grid_height: GRID_HEIGHT,
            mana: ManaConfig::default(),
            star_hp_multipliers: STAR_HP_MULTIPLIERS,
            star_damage_multipliers: STAR_DAMAGE_MULTIPLIERS,
        }
    }
}

impl SimConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.ticks_per_second == 0 {
            return Err(SimError::InvalidConfig("ticks_per_second must be > 0".into()));
        }
        if self.grid_width == 0 || self.grid_height == 0 {
            return Err(SimError::InvalidConfig(format!(
                "grid {}x{} has no cells",
                self.grid_width, self.grid_height
            )));
        }
        if self.mana.damage_gain_cap < 0.0 {
            return Err(SimError::InvalidConfig(
                "mana damage_gain_cap must be non-negative".into(),
            ));
        }
        for (i, m) in self
            .star_hp_multipliers
            .iter()
            .chain(self.star_damage_multipliers.iter())
            .enumerate()
        {
            if *m <= 0.0 {
                return Err(SimError::InvalidConfig(format!(
                    "star multiplier #{} must be positive, got {}",
                    i, m
                )));
            }
        }
        Ok(())
    }
}
