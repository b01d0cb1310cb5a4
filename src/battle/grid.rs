//! Battle board occupancy map
//!
//! Tracks which hex each living unit stands on. At most one unit per hex;
//! a move either fully succeeds or leaves the map untouched. Bounds use the
//! odd-r offset mapping so the axial board forms a width x height rectangle.

use ahash::AHashMap;

use crate::battle::hex::HexCoord;
use crate::core::error::{Result, SimError};
use crate::core::types::UnitId;

#[derive(Debug, Clone)]
pub struct HexGrid {
    pub width: u32,
    pub height: u32,
    occupancy: AHashMap<HexCoord, UnitId>,
    positions: AHashMap<UnitId, HexCoord>,
}

impl HexGrid {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            occupancy: AHashMap::new(),
            positions: AHashMap::new(),
        }
    }

    fn to_offset(pos: HexCoord) -> (i32, i32) {
        (pos.q + pos.r.div_euclid(2), pos.r)
    }

    pub fn in_bounds(&self, pos: HexCoord) -> bool {
        let (x, y) = Self::to_offset(pos);
        x >= 0 && y >= 0 && x < self.width as i32 && y < self.height as i32
    }

    pub fn occupant(&self, pos: HexCoord) -> Option<UnitId> {
        self.occupancy.get(&pos).copied()
    }

    pub fn position_of(&self, id: UnitId) -> Option<HexCoord> {
        self.positions.get(&id).copied()
    }

    pub fn is_occupied(&self, pos: HexCoord) -> bool {
        self.occupancy.contains_key(&pos)
    }

    /// A hex can be entered when it is on the board and empty
    pub fn is_walkable(&self, pos: HexCoord) -> bool {
        self.in_bounds(pos) && !self.is_occupied(pos)
    }

    /// Place a unit on an empty hex. Used at battle setup.
    pub fn place(&mut self, id: UnitId, pos: HexCoord) -> Result<()> {
        if !self.in_bounds(pos) {
            return Err(SimError::HexOutOfBounds { q: pos.q, r: pos.r });
        }
        if let Some(other) = self.occupant(pos) {
            if other != id {
                return Err(SimError::HexOccupied { q: pos.q, r: pos.r });
            }
        }
        if let Some(old) = self.positions.insert(id, pos) {
            self.occupancy.remove(&old);
        }
        self.occupancy.insert(pos, id);
        Ok(())
    }

    /// Move a tracked unit to a walkable hex. Returns false when blocked.
    pub fn relocate(&mut self, id: UnitId, new_pos: HexCoord) -> bool {
        if !self.positions.contains_key(&id) || !self.is_walkable(new_pos) {
            return false;
        }
        let old = self.positions[&id];
        self.occupancy.remove(&old);
        self.occupancy.insert(new_pos, id);
        self.positions.insert(id, new_pos);
        true
    }

    /// Free a unit's hex. Called when the unit dies.
    pub fn vacate(&mut self, id: UnitId) -> bool {
        match self.positions.remove(&id) {
            Some(pos) => {
                self.occupancy.remove(&pos);
                true
            }
            None => false,
        }
    }

    /// Neighbors of `pos` that can be entered. `ignore` treats one unit's
    /// hex as free, so paths may end next to (or on) the combat target.
    pub fn walkable_neighbors(&self, pos: HexCoord, ignore: Option<UnitId>) -> Vec<HexCoord> {
        pos.neighbors()
            .into_iter()
            .filter(|n| {
                if !self.in_bounds(*n) {
                    return false;
                }
                match self.occupant(*n) {
                    None => true,
                    Some(id) => Some(id) == ignore,
                }
            })
            .collect()
    }
}
