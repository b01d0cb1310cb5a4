//! Battle board: hex geometry, occupancy, pathfinding and AoE queries

pub mod aoe;
pub mod constants;
pub mod grid;
pub mod hex;
pub mod pathfinding;

pub use grid::HexGrid;
pub use hex::HexCoord;
