//! Timed stat buffs
//!
//! A buff carries flat and percent deltas that are pushed into the unit's
//! modifier layers on apply and pulled back out on expiry. Stacking policy
//! decides what a re-application does; decaying buffs shrink their
//! contribution linearly each tick.

use serde::{Deserialize, Serialize};

use crate::core::types::{Tick, UnitId};
use crate::units::stats::{Stat, UnitStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackPolicy {
    /// A re-application is ignored while the buff is active
    None,
    /// A re-application restarts the timer
    Refresh,
    /// A re-application adds a stack (stronger effect) and restarts the timer
    Intensify,
    /// Applications coexist as independent instances
    MultiStack,
}

/// One stat delta inside a buff
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatDelta {
    pub stat: Stat,
    pub value: f32,
    #[serde(default)]
    pub is_percent: bool,
}

#[derive(Debug, Clone)]
pub struct Buff {
    pub id: String,
    pub deltas: Vec<StatDelta>,
    pub duration: Tick,
    pub remaining: Tick,
    pub stacks: u32,
    pub max_stacks: u32,
    pub policy: StackPolicy,
    /// Linearly decay contributions to zero over the duration
    pub decaying: bool,
    pub source: Option<UnitId>,
    /// What is currently pushed into the stat layers, per delta
    applied: Vec<f32>,
}

impl Buff {
    pub fn new(id: impl Into<String>, deltas: Vec<StatDelta>, duration: Tick) -> Self {
        Self {
            id: id.into(),
            applied: vec![0.0; deltas.len()],
            deltas,
            duration: duration.max(1),
            remaining: duration.max(1),
            stacks: 1,
            max_stacks: 1,
            policy: StackPolicy::Refresh,
            decaying: false,
            source: None,
        }
    }

    fn target_value(&self, delta: &StatDelta) -> f32 {
        let mut value = delta.value * self.stacks as f32;
        if self.decaying {
            value *= self.remaining as f32 / self.duration as f32;
        }
        value
    }

    /// Push current contributions into the stat layers, replacing whatever
    /// this buff had applied before.
    pub fn sync_to(&mut self, stats: &mut UnitStats) {
        for (i, delta) in self.deltas.iter().enumerate() {
            let target = self.target_value(delta);
            let diff = target - self.applied[i];
            if diff != 0.0 {
                if delta.is_percent {
                    stats.add_percent(delta.stat, diff);
                } else {
                    stats.add_flat(delta.stat, diff);
                }
                self.applied[i] = target;
            }
        }
    }

    /// Remove every contribution this buff made
    pub fn remove_from(&mut self, stats: &mut UnitStats) {
        for (i, delta) in self.deltas.iter().enumerate() {
            if self.applied[i] != 0.0 {
                if delta.is_percent {
                    stats.remove_percent(delta.stat, self.applied[i]);
                } else {
                    stats.remove_flat(delta.stat, self.applied[i]);
                }
                self.applied[i] = 0.0;
            }
        }
    }

    /// Handle a re-application of a buff with the same id
    pub fn reapply(&mut self, incoming: &Buff, stats: &mut UnitStats) {
        match self.policy {
            StackPolicy::None => {}
            StackPolicy::Refresh => {
                self.remaining = incoming.duration.max(self.remaining);
                self.sync_to(stats);
            }
            StackPolicy::Intensify => {
                self.stacks = (self.stacks + 1).min(self.max_stacks.max(1));
                self.remaining = incoming.duration.max(self.remaining);
                self.sync_to(stats);
            }
            // MultiStack never reaches here; the unit pushes a new instance
            StackPolicy::MultiStack => {}
        }
    }

    /// Count down one tick; returns true when the buff expired
    pub fn tick(&mut self, stats: &mut UnitStats) -> bool {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.remove_from(stats);
            return true;
        }
        if self.decaying {
            self.sync_to(stats);
        }
        false
    }
}
