//! The engine aggregate: tick scheduler, effect dispatch, event log

pub mod effects;
pub mod events;
pub mod simulation;

pub use events::{Event, EventKind, EventLog};
pub use simulation::{BattleResult, Simulation, TickOutcome};
