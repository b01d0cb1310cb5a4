//! Abilities: definitions, effect descriptors, buffs, scaling, projectiles

pub mod ability;
pub mod buff;
pub mod effect;
pub mod projectile;
pub mod scaling;

pub use ability::{AbilityDef, Affiliation, AoeAnchor, AoeShape, AoeSpec, Delivery, ProjectileSpec};
pub use buff::{Buff, StackPolicy, StatDelta};
pub use effect::{EffectKind, EffectOutcome, EffectRecipient};
pub use projectile::{Projectile, ProjectileManager};
pub use scaling::{ScalingKey, StarValue};
