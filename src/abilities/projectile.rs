//! In-flight projectiles
//!
//! Projectiles travel through cartesian space at `speed` hexes per tick.
//! Homing projectiles re-aim at the target's hex every tick; point
//! projectiles fly to the hex captured at launch. The manager advances
//! them in insertion order so resolution is deterministic.

use glam::Vec2;

use crate::abilities::ability::AoeSpec;
use crate::abilities::effect::EffectKind;
use crate::battle::constants::PROJECTILE_TIMEOUT_TICKS;
use crate::battle::hex::HexCoord;
use crate::core::types::{StarLevel, Tick, UnitId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightStep {
    InFlight,
    Arrived,
    /// Target died mid-flight and the projectile may miss, or it timed out
    Expired,
}

#[derive(Debug, Clone)]
pub struct Projectile {
    pub source: UnitId,
    /// Homing target; None for point-targeted shots
    pub target: Option<UnitId>,
    /// Destination hex captured at launch (and updated while homing)
    pub dest_hex: HexCoord,
    pub position: Vec2,
    pub speed: f32,
    pub homing: bool,
    pub can_miss: bool,
    pub star: StarLevel,
    pub ability_id: String,
    pub effects: Vec<EffectKind>,
    pub aoe: Option<AoeSpec>,
    pub ticks_alive: Tick,
}

impl Projectile {
    /// Advance one tick toward the destination.
    ///
    /// `target_hex` is the target's current hex when it is still alive;
    /// `target_alive` drives the miss-on-death rule.
    pub fn advance(&mut self, target_hex: Option<HexCoord>, target_alive: bool) -> FlightStep {
        self.ticks_alive += 1;
        if self.ticks_alive > PROJECTILE_TIMEOUT_TICKS {
            return FlightStep::Expired;
        }

        if self.target.is_some() && !target_alive && self.can_miss {
            return FlightStep::Expired;
        }

        if self.homing && target_alive {
            if let Some(hex) = target_hex {
                self.dest_hex = hex;
            }
        }

        let dest = self.dest_hex.to_cartesian();
        let delta = dest - self.position;
        let distance = delta.length();

        if distance <= self.speed {
            self.position = dest;
            return FlightStep::Arrived;
        }

        self.position += delta / distance * self.speed;
        FlightStep::InFlight
    }

    /// Hex under the projectile's current position
    pub fn current_hex(&self) -> HexCoord {
        HexCoord::from_cartesian(self.position)
    }
}

/// Live projectile set, keyed by insertion order
#[derive(Debug, Clone, Default)]
pub struct ProjectileManager {
    pub projectiles: Vec<Projectile>,
}

impl ProjectileManager {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(clippy::too_many_arguments)]
    pub fn spawn(
        &mut self,
        source: UnitId,
        source_hex: HexCoord,
        target: Option<UnitId>,
        dest_hex: HexCoord,
        speed: f32,
        homing: bool,
        can_miss: bool,
        star: StarLevel,
        ability_id: String,
        effects: Vec<EffectKind>,
        aoe: Option<AoeSpec>,
    ) {
        self.projectiles.push(Projectile {
            source,
            target,
            dest_hex,
            position: source_hex.to_cartesian(),
            speed: speed.max(0.05),
            homing,
            can_miss,
            star,
            ability_id,
            effects,
            aoe,
            ticks_alive: 0,
        });
    }

    pub fn active_count(&self) -> usize {
        self.projectiles.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mk_projectile(speed: f32, homing: bool, can_miss: bool) -> Projectile {
        Projectile {
            source: UnitId(0),
            target: Some(UnitId(1)),
            dest_hex: HexCoord::new(4, 0),
            position: HexCoord::new(0, 0).to_cartesian(),
            speed,
            homing,
            can_miss,
            star: 1,
            ability_id: "bolt".into(),
            effects: Vec::new(),
            aoe: None,
            ticks_alive: 0,
        }
    }

    #[test]
    fn test_arrives_after_distance_over_speed_ticks() {
        let mut p = mk_projectile(1.0, false, true);
        let mut steps = 0;
        loop {
            steps += 1;
            match p.advance(Some(HexCoord::new(4, 0)), true) {
                FlightStep::Arrived => break,
                FlightStep::InFlight => {}
                FlightStep::Expired => panic!("should not expire"),
            }
        }
        assert_eq!(steps, 4);
    }

    #[test]
    fn test_fast_projectile_arrives_immediately() {
        let mut p = mk_projectile(10.0, false, true);
        assert_eq!(p.advance(Some(HexCoord::new(4, 0)), true), FlightStep::Arrived);
    }

    #[test]
    fn test_homing_retargets_moved_target() {
        let mut p = mk_projectile(1.0, true, true);
        p.advance(Some(HexCoord::new(4, 0)), true);
        // target relocated; destination follows
        p.advance(Some(HexCoord::new(0, 4)), true);
        assert_eq!(p.dest_hex, HexCoord::new(0, 4));
    }

    #[test]
    fn test_non_homing_keeps_launch_destination() {
        let mut p = mk_projectile(1.0, false, true);
        p.advance(Some(HexCoord::new(0, 4)), true);
        assert_eq!(p.dest_hex, HexCoord::new(4, 0));
    }

    #[test]
    fn test_miss_on_death_when_can_miss() {
        let mut p = mk_projectile(1.0, true, true);
        assert_eq!(p.advance(None, false), FlightStep::Expired);
    }

    #[test]
    fn test_no_miss_flies_to_last_hex() {
        let mut p = mk_projectile(1.0, true, false);
        // keeps flying to the captured hex even though the target died
        for _ in 0..3 {
            assert_eq!(p.advance(None, false), FlightStep::InFlight);
        }
        assert_eq!(p.advance(None, false), FlightStep::Arrived);
    }

    #[test]
    fn test_timeout_expires_projectile() {
        let mut p = mk_projectile(0.0001, false, true);
        let mut expired = false;
        for _ in 0..=PROJECTILE_TIMEOUT_TICKS {
            if p.advance(Some(HexCoord::new(4, 0)), true) == FlightStep::Expired {
                expired = true;
                break;
            }
        }
        assert!(expired);
    }
}
