//! Effect descriptors
//!
//! Effects are data: every ability, item trigger and zone carries an
//! ordered list of these descriptors. Each variant holds its kind-specific
//! fields; application logic is an exhaustive match in the engine's
//! dispatcher. Unknown kinds in a definition table fail at parse time.

use serde::{Deserialize, Serialize};

use crate::abilities::scaling::{ScalingKey, StarValue};
use crate::combat::damage::DamageType;
use crate::units::stats::Stat;

/// Who a support effect lands on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EffectRecipient {
    /// The caster itself
    #[serde(alias = "self")]
    Caster,
    /// The resolved target of the application
    #[default]
    Target,
}

fn recipient_caster() -> EffectRecipient {
    EffectRecipient::Caster
}

/// Result of applying one effect to one target
#[derive(Debug, Clone, Default)]
pub struct EffectOutcome {
    pub success: bool,
    /// Damage dealt, healing done, duration applied - whatever the kind measures
    pub value: f32,
    pub affected: Vec<crate::core::types::UnitId>,
}

impl EffectOutcome {
    pub fn hit(value: f32, affected: Vec<crate::core::types::UnitId>) -> Self {
        Self {
            success: true,
            value,
            affected,
        }
    }

    pub fn fizzle() -> Self {
        Self::default()
    }
}

fn default_interval() -> u32 {
    crate::battle::constants::DEFAULT_PERIODIC_INTERVAL
}

fn default_splash_pct() -> f32 {
    0.5
}

fn default_knockback_stun() -> StarValue {
    StarValue::Scalar(15.0)
}

fn default_true() -> bool {
    true
}

fn one() -> StarValue {
    StarValue::Scalar(1.0)
}

/// One effect descriptor. The `type` tag in definition tables picks the
/// variant; per-star numbers use `StarValue`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EffectKind {
    // Damage-producing: all funnel through the damage pipeline
    Damage {
        #[serde(default)]
        damage_type: DamageType,
        value: StarValue,
        #[serde(default)]
        scaling: Option<ScalingKey>,
    },
    /// AD-scaled and AP-scaled components combined into one hit
    HybridDamage {
        #[serde(default)]
        damage_type: DamageType,
        ad_value: StarValue,
        ap_value: StarValue,
    },
    Dot {
        #[serde(default)]
        damage_type: DamageType,
        value: StarValue,
        duration: StarValue,
        #[serde(default = "default_interval")]
        interval: u32,
        #[serde(default)]
        scaling: Option<ScalingKey>,
    },
    /// True damage per second; refreshes rather than stacks
    Burn {
        value: StarValue,
        duration: StarValue,
        #[serde(default)]
        scaling: Option<ScalingKey>,
    },
    /// Kill outright at or below a percent-HP threshold
    Execute {
        threshold: StarValue,
    },
    PercentHpDamage {
        value: StarValue,
        #[serde(default)]
        damage_type: DamageType,
        #[serde(default)]
        is_current: bool,
    },
    /// Full damage to the target, a fraction to units within `radius`
    SplashDamage {
        value: StarValue,
        #[serde(default = "default_splash_pct")]
        splash_percent: f32,
        #[serde(default = "one")]
        radius: StarValue,
        #[serde(default)]
        damage_type: DamageType,
        #[serde(default)]
        scaling: Option<ScalingKey>,
    },
    /// Chains to the nearest not-yet-hit enemy within `radius`
    Ricochet {
        value: StarValue,
        #[serde(default = "one")]
        chains: StarValue,
        #[serde(default = "default_ricochet_radius")]
        radius: u32,
        #[serde(default)]
        damage_type: DamageType,
        #[serde(default)]
        scaling: Option<ScalingKey>,
    },
    #[serde(alias = "multi_strike")]
    MultiHit {
        value: StarValue,
        hits: StarValue,
        #[serde(default)]
        damage_type: DamageType,
        #[serde(default)]
        scaling: Option<ScalingKey>,
    },
    /// Damage every enemy on the line to the target, then blink beside it
    DashThrough {
        value: StarValue,
        #[serde(default)]
        damage_type: DamageType,
        #[serde(default)]
        scaling: Option<ScalingKey>,
    },
    /// Launch N homing projectiles at the nearest enemies
    ProjectileSwarm {
        count: StarValue,
        #[serde(default = "default_projectile_speed")]
        speed: f32,
        #[serde(default = "default_true")]
        can_miss: bool,
        effects: Vec<EffectKind>,
    },
    /// Launch N point-targeted projectiles fanned around the target axis
    ProjectileSpread {
        count: StarValue,
        #[serde(default = "default_projectile_speed")]
        speed: f32,
        range: u32,
        effects: Vec<EffectKind>,
    },

    // Resistance debuffs: refresh, take the max, never sum
    Sunder {
        value: StarValue,
        duration: StarValue,
        #[serde(default)]
        is_percent: bool,
    },
    Shred {
        value: StarValue,
        duration: StarValue,
        #[serde(default)]
        is_percent: bool,
    },

    // Crowd control
    Stun {
        duration: StarValue,
    },
    Slow {
        value: StarValue,
        duration: StarValue,
    },
    /// Attack-speed debuff that stacks by source
    Chill {
        value: StarValue,
        duration: StarValue,
    },
    Silence {
        duration: StarValue,
    },
    Disarm {
        duration: StarValue,
    },
    /// Push along the caster->target axis; a blocked push collision-stuns
    Knockback {
        distance: StarValue,
        #[serde(default = "default_knockback_stun")]
        stun_ticks: StarValue,
    },
    Pull {
        distance: StarValue,
    },
    /// Force the target to attack the caster
    Taunt {
        duration: StarValue,
    },

    // Support
    Heal {
        value: StarValue,
        #[serde(default)]
        scaling: Option<ScalingKey>,
        #[serde(default)]
        target: EffectRecipient,
    },
    HealOverTime {
        value: StarValue,
        duration: StarValue,
        #[serde(default = "default_interval")]
        interval: u32,
        #[serde(default)]
        scaling: Option<ScalingKey>,
        #[serde(default)]
        target: EffectRecipient,
    },
    Shield {
        value: StarValue,
        duration: StarValue,
        #[serde(default)]
        scaling: Option<ScalingKey>,
        #[serde(default)]
        target: EffectRecipient,
    },
    ShieldSelf {
        value: StarValue,
        duration: StarValue,
        #[serde(default)]
        scaling: Option<ScalingKey>,
    },
    Buff {
        stat: Stat,
        value: StarValue,
        duration: StarValue,
        #[serde(default)]
        is_percent: bool,
        #[serde(default = "recipient_caster")]
        target: EffectRecipient,
    },
    /// Buff every living ally of the caster
    BuffTeam {
        stat: Stat,
        value: StarValue,
        duration: StarValue,
        #[serde(default)]
        is_percent: bool,
    },
    /// Buff that decays linearly to zero over its duration
    DecayingBuff {
        stat: Stat,
        value: StarValue,
        duration: StarValue,
        #[serde(default)]
        is_percent: bool,
        #[serde(default = "recipient_caster")]
        target: EffectRecipient,
    },
    /// Permanent stacking stat gain, capped per counter group
    StackingBuff {
        stat: Stat,
        value: StarValue,
        cap: f32,
        #[serde(default)]
        group: Option<String>,
    },
    ManaGrant {
        value: StarValue,
        #[serde(default)]
        target: EffectRecipient,
    },
    /// Remove crowd control and damaging debuffs
    Cleanse {
        #[serde(default)]
        target: EffectRecipient,
    },
    /// Reduce the target's outgoing healing
    Wound {
        value: StarValue,
        duration: StarValue,
    },

    // Movement
    /// Teleport the caster next to the target, occupancy permitting
    Dash {},

    // Special / meta
    /// Nested effects applied in order as one application
    EffectGroup {
        effects: Vec<EffectKind>,
    },
    /// Persistent area that re-applies an effect on an interval
    CreateZone {
        radius: u32,
        duration: StarValue,
        #[serde(default = "default_interval")]
        interval: u32,
        effect: Box<EffectKind>,
    },
    /// Periodic effect bound to the caster/target pair
    IntervalTrigger {
        interval: u32,
        duration: StarValue,
        effects: Vec<EffectKind>,
    },
    /// Irreversible flat stat gain
    PermanentStack {
        stat: Stat,
        value: StarValue,
    },
    /// The target's next cast requires `value` percent more mana
    ManaReave {
        value: StarValue,
    },
    /// The caster's next N auto-attacks apply these effects instead
    ReplaceAttacks {
        count: StarValue,
        effects: Vec<EffectKind>,
    },
    /// Swap the caster's ability immediately
    Transform {
        ability: String,
    },
    /// Swap the caster's ability once it has completed N casts
    TransformAfterCasts {
        casts: u32,
        ability: String,
    },
    /// Each completed cast permanently amplifies the caster's damage
    EscalatingAbility {
        amp_per_cast: f32,
    },
}

fn default_projectile_speed() -> f32 {
    crate::battle::constants::DEFAULT_PROJECTILE_SPEED
}

fn default_ricochet_radius() -> u32 {
    3
}

impl EffectKind {
    /// Tag string used in logs, matching the definition-table spelling
    pub fn tag(&self) -> &'static str {
        match self {
            EffectKind::Damage { .. } => "damage",
            EffectKind::HybridDamage { .. } => "hybrid_damage",
            EffectKind::Dot { .. } => "dot",
            EffectKind::Burn { .. } => "burn",
            EffectKind::Execute { .. } => "execute",
            EffectKind::PercentHpDamage { .. } => "percent_hp_damage",
            EffectKind::SplashDamage { .. } => "splash_damage",
            EffectKind::Ricochet { .. } => "ricochet",
            EffectKind::MultiHit { .. } => "multi_hit",
            EffectKind::DashThrough { .. } => "dash_through",
            EffectKind::ProjectileSwarm { .. } => "projectile_swarm",
            EffectKind::ProjectileSpread { .. } => "projectile_spread",
            EffectKind::Sunder { .. } => "sunder",
            EffectKind::Shred { .. } => "shred",
            EffectKind::Stun { .. } => "stun",
            EffectKind::Slow { .. } => "slow",
            EffectKind::Chill { .. } => "chill",
            EffectKind::Silence { .. } => "silence",
            EffectKind::Disarm { .. } => "disarm",
            EffectKind::Knockback { .. } => "knockback",
            EffectKind::Pull { .. } => "pull",
            EffectKind::Taunt { .. } => "taunt",
            EffectKind::Heal { .. } => "heal",
            EffectKind::HealOverTime { .. } => "heal_over_time",
            EffectKind::Shield { .. } => "shield",
            EffectKind::ShieldSelf { .. } => "shield_self",
            EffectKind::Buff { .. } => "buff",
            EffectKind::BuffTeam { .. } => "buff_team",
            EffectKind::DecayingBuff { .. } => "decaying_buff",
            EffectKind::StackingBuff { .. } => "stacking_buff",
            EffectKind::ManaGrant { .. } => "mana_grant",
            EffectKind::Cleanse { .. } => "cleanse",
            EffectKind::Wound { .. } => "wound",
            EffectKind::Dash {} => "dash",
            EffectKind::EffectGroup { .. } => "effect_group",
            EffectKind::CreateZone { .. } => "create_zone",
            EffectKind::IntervalTrigger { .. } => "interval_trigger",
            EffectKind::PermanentStack { .. } => "permanent_stack",
            EffectKind::ManaReave { .. } => "mana_reave",
            EffectKind::ReplaceAttacks { .. } => "replace_attacks",
            EffectKind::Transform { .. } => "transform",
            EffectKind::TransformAfterCasts { .. } => "transform_after_casts",
            EffectKind::EscalatingAbility { .. } => "escalating_ability",
        }
    }
}
