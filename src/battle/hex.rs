//! Hex coordinate system for the battle board (axial coordinates)
//!
//! Uses axial coordinates (q, r) for easy neighbor calculation.

use glam::Vec2;
use serde::{Deserialize, Serialize};

const SQRT_3: f32 = 1.732_050_8;

/// Axial hex coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct HexCoord {
    pub q: i32,
    pub r: i32,
}

impl HexCoord {
    pub fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// Cube coordinate S (derived from q and r)
    pub fn s(&self) -> i32 {
        -self.q - self.r
    }

    /// Hex distance: `(|dq| + |dr| + |dq + dr|) / 2`
    pub fn distance(&self, other: &Self) -> u32 {
        let dq = (self.q - other.q).abs();
        let dr = (self.r - other.r).abs();
        let ds = (self.s() - other.s()).abs();
        ((dq + dr + ds) / 2) as u32
    }

    /// Get all 6 neighboring hex coordinates
    pub fn neighbors(&self) -> [HexCoord; 6] {
        [
            HexCoord::new(self.q + 1, self.r),
            HexCoord::new(self.q + 1, self.r - 1),
            HexCoord::new(self.q, self.r - 1),
            HexCoord::new(self.q - 1, self.r),
            HexCoord::new(self.q - 1, self.r + 1),
            HexCoord::new(self.q, self.r + 1),
        ]
    }

    /// Center of this hex in cartesian space, with unit spacing between
    /// adjacent hex centers. Used for cone angles and projectile flight.
    pub fn to_cartesian(&self) -> Vec2 {
        Vec2::new(self.q as f32 + self.r as f32 / 2.0, self.r as f32 * SQRT_3 / 2.0)
    }

    /// Nearest hex to a cartesian point (inverse of `to_cartesian`)
    pub fn from_cartesian(point: Vec2) -> Self {
        let q = point.x - point.y / SQRT_3;
        let r = point.y * 2.0 / SQRT_3;
        Self::round(q, r)
    }

    /// Get hex coordinates in a line from self to other (inclusive)
    pub fn line_to(&self, other: &Self) -> Vec<HexCoord> {
        let n = self.distance(other) as i32;
        if n == 0 {
            return vec![*self];
        }

        let mut results = Vec::with_capacity((n + 1) as usize);
        for i in 0..=n {
            let t = i as f32 / n as f32;
            let q = self.q as f32 + (other.q - self.q) as f32 * t;
            let r = self.r as f32 + (other.r - self.r) as f32 * t;
            results.push(Self::round(q, r));
        }
        results
    }

    /// Round floating point hex to nearest integer hex
    pub fn round(q: f32, r: f32) -> Self {
        let s = -q - r;
        let mut rq = q.round();
        let mut rr = r.round();
        let rs = s.round();

        let q_diff = (rq - q).abs();
        let r_diff = (rr - r).abs();
        let s_diff = (rs - s).abs();

        if q_diff > r_diff && q_diff > s_diff {
            rq = -rr - rs;
        } else if r_diff > s_diff {
            rr = -rq - rs;
        }

        Self::new(rq as i32, rr as i32)
    }

    /// All hexes within `range` of self (inclusive, contains self)
    pub fn hexes_in_range(&self, range: u32) -> Vec<HexCoord> {
        let range = range as i32;
        let mut results = Vec::new();
        for q in -range..=range {
            for r in (-range).max(-q - range)..=range.min(-q + range) {
                results.push(HexCoord::new(self.q + q, self.r + r));
            }
        }
        results
    }

    /// Thick rasterised line from self to `other`: the exact line hexes,
    /// widened by `width` rings of neighbors around each line hex.
    pub fn thick_line_to(&self, other: &Self, width: u32) -> Vec<HexCoord> {
        let line = self.line_to(other);
        if width == 0 {
            return line;
        }

        let span = self.distance(other) + 1;
        let mut seen = Vec::new();
        for hex in &line {
            for candidate in hex.hexes_in_range(width) {
                if self.distance(&candidate) <= span && !seen.contains(&candidate) {
                    seen.push(candidate);
                }
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_distance_same() {
        let a = HexCoord::new(0, 0);
        assert_eq!(a.distance(&a), 0);
    }

    #[test]
    fn test_hex_distance_adjacent() {
        let a = HexCoord::new(0, 0);
        for n in a.neighbors() {
            assert_eq!(a.distance(&n), 1);
        }
    }

    #[test]
    fn test_hex_distance_formula() {
        let a = HexCoord::new(0, 0);
        let b = HexCoord::new(3, -1);
        assert_eq!(a.distance(&b), 3);
    }

    #[test]
    fn test_hex_neighbors_count() {
        assert_eq!(HexCoord::new(5, 5).neighbors().len(), 6);
    }

    #[test]
    fn test_hex_line_inclusive() {
        let a = HexCoord::new(0, 0);
        let b = HexCoord::new(3, 0);
        let line = a.line_to(&b);
        assert_eq!(line.len(), 4);
        assert_eq!(line.first(), Some(&a));
        assert_eq!(line.last(), Some(&b));
    }

    #[test]
    fn test_hexes_in_range() {
        let center = HexCoord::new(0, 0);
        assert_eq!(center.hexes_in_range(1).len(), 7);
        assert_eq!(center.hexes_in_range(2).len(), 19);
    }

    #[test]
    fn test_cartesian_adjacent_distance_is_one() {
        let a = HexCoord::new(0, 0).to_cartesian();
        for n in HexCoord::new(0, 0).neighbors() {
            let d = (n.to_cartesian() - a).length();
            assert!((d - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_cartesian_roundtrip() {
        for q in -3..=3 {
            for r in -3..=3 {
                let hex = HexCoord::new(q, r);
                assert_eq!(HexCoord::from_cartesian(hex.to_cartesian()), hex);
            }
        }
    }

    #[test]
    fn test_thick_line_contains_plain_line() {
        let a = HexCoord::new(0, 0);
        let b = HexCoord::new(4, 0);
        let thick = a.thick_line_to(&b, 1);
        for hex in a.line_to(&b) {
            assert!(thick.contains(&hex));
        }
        assert!(thick.len() > 5);
    }
}
