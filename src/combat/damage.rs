//! Damage pipeline
//!
//! Every damage event in the engine (auto-attack, ability hit, burn pulse,
//! DoT pulse, splash, projectile impact) funnels through `resolve_damage`:
//!
//!   base -> crit -> dodge -> resistance mitigation -> amplifiers
//!        -> durability
//!
//! The result is pure data; the engine applies it (shield absorption, HP
//! loss, lifesteal, mana-on-damage) so the computation itself stays free
//! of side effects. `raw_damage` is preserved on the result because the
//! defender's mana gain is computed from pre-mitigation damage.

use serde::{Deserialize, Serialize};

use crate::battle::constants::{DURABILITY_CAP, RESIST_SOFTCAP};
use crate::core::rng::BattleRng;
use crate::units::unit::Unit;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageType {
    Physical,
    Magical,
    True,
}

impl Default for DamageType {
    fn default() -> Self {
        DamageType::Magical
    }
}

impl DamageType {
    pub fn name(&self) -> &'static str {
        match self {
            DamageType::Physical => "PHYSICAL",
            DamageType::Magical => "MAGICAL",
            DamageType::True => "TRUE",
        }
    }
}

/// Per-call switches for the pipeline
#[derive(Debug, Clone, Copy)]
pub struct DamageOptions {
    pub can_crit: bool,
    pub can_dodge: bool,
    pub is_ability: bool,
}

impl DamageOptions {
    pub fn auto_attack() -> Self {
        Self {
            can_crit: true,
            can_dodge: true,
            is_ability: false,
        }
    }

    pub fn ability() -> Self {
        Self {
            can_crit: true,
            can_dodge: false,
            is_ability: true,
        }
    }

    /// Burn / DoT / zone pulses: no crit, no dodge
    pub fn periodic() -> Self {
        Self {
            can_crit: false,
            can_dodge: false,
            is_ability: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DamageResult {
    /// Damage after crit, before any mitigation
    pub raw_damage: f32,
    /// Damage after mitigation, amplifiers and durability
    pub final_damage: f32,
    pub damage_type: DamageType,
    pub is_crit: bool,
    pub dodged: bool,
    /// Fraction removed by armor / magic resist
    pub mitigation: f32,
}

impl DamageResult {
    pub fn dodged(raw: f32, damage_type: DamageType, is_crit: bool) -> Self {
        Self {
            raw_damage: raw,
            final_damage: 0.0,
            damage_type,
            is_crit,
            dodged: true,
            mitigation: 0.0,
        }
    }
}

/// Resistance after shred: `max(0, res * (1 - pct) - flat)`
pub fn effective_resistance(base: f32, pct_shred: f32, flat_shred: f32) -> f32 {
    (base * (1.0 - pct_shred) - flat_shred).max(0.0)
}

/// Reduction fraction: `res / (res + 100)`
pub fn resistance_reduction(resistance: f32) -> f32 {
    let res = resistance.max(0.0);
    res / (res + RESIST_SOFTCAP)
}

/// Run the pipeline for one damage event.
///
/// `external_amp` is the multiplicative product of situational amplifiers
/// the engine collected from items and traits; buff-granted amps live on
/// the attacker's `damage_amp` stat.
pub fn resolve_damage(
    attacker: &Unit,
    defender: &Unit,
    base_damage: f32,
    damage_type: DamageType,
    opts: DamageOptions,
    external_amp: f32,
    rng: &mut BattleRng,
) -> DamageResult {
    let mut damage = base_damage.max(0.0);
    let mut is_crit = false;

    // Crit: auto-attacks always may; abilities only with the item flag
    let crit_allowed = opts.can_crit && (!opts.is_ability || attacker.ability_crit);
    if crit_allowed && rng.roll(attacker.stats.crit_chance()) {
        is_crit = true;
        damage *= 1.0 + attacker.stats.crit_damage();
    }

    let raw_damage = damage;

    // Dodge: auto-attacks only
    if opts.can_dodge && !opts.is_ability && rng.roll(defender.stats.dodge_chance()) {
        return DamageResult::dodged(raw_damage, damage_type, is_crit);
    }

    // Resistance mitigation
    let mitigation = match damage_type {
        DamageType::Physical => {
            let (pct, flat) = defender.status.armor_shred();
            resistance_reduction(effective_resistance(defender.stats.armor(), pct, flat))
        }
        DamageType::Magical => {
            let (pct, flat) = defender.status.mr_shred();
            resistance_reduction(effective_resistance(defender.stats.magic_resist(), pct, flat))
        }
        DamageType::True => 0.0,
    };
    damage *= 1.0 - mitigation;

    // Amplifiers, multiplicative across sources
    damage *= (1.0 + attacker.stats.damage_amp()) * external_amp;

    // Durability
    damage *= 1.0 - defender.stats.durability().min(DURABILITY_CAP);

    DamageResult {
        raw_damage,
        final_damage: damage.max(0.0),
        damage_type,
        is_crit,
        dodged: false,
        mitigation,
    }
}
