//! Core type definitions used throughout the engine

use serde::{Deserialize, Serialize};

/// Stable identifier for a unit.
///
/// Ids are arena indices assigned in insertion order at `add_unit` time,
/// so iterating units by id is the canonical deterministic ordering. A dead
/// unit keeps its id and stays readable for in-flight projectiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub u32);

impl UnitId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for UnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "u{}", self.0)
    }
}

/// Simulation tick counter (30 ticks = 1 second at the default rate)
pub type Tick = u32;

/// Team index. Battles are always team 0 versus team 1.
pub type Team = u8;

/// Unit power tier, 1 through 3
pub type StarLevel = u8;
