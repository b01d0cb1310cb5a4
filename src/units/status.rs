//! Debuff and shield bookkeeping for one unit
//!
//! Burn, sunder and shred refresh rather than stack: re-applying keeps the
//! original start, takes the larger value and the larger total duration.
//! Chill stacks per source. Shields are independent pools, each expiring
//! on its own clock.

use crate::combat::damage::DamageType;
use crate::core::types::{Tick, UnitId};

/// A single refresh-style debuff: magnitude plus a countdown that
/// remembers how long ago the first application happened.
#[derive(Debug, Clone)]
pub struct Debuff {
    pub value: f32,
    pub remaining: Tick,
    elapsed: Tick,
}

impl Debuff {
    pub fn new(value: f32, duration: Tick) -> Self {
        Self {
            value,
            remaining: duration,
            elapsed: 0,
        }
    }

    /// Refresh-don't-stack: value = max(old, new), and the new duration is
    /// measured from the original application, so the countdown becomes
    /// `max(remaining, new_duration - elapsed)`.
    pub fn refresh(&mut self, value: f32, duration: Tick) {
        self.value = self.value.max(value);
        self.remaining = self.remaining.max(duration.saturating_sub(self.elapsed));
    }

    /// Returns true when the debuff expired this tick
    pub fn tick(&mut self) -> bool {
        self.elapsed += 1;
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining == 0
    }
}

/// True damage per second, refresh-don't-stack
#[derive(Debug, Clone)]
pub struct Burn {
    pub dps: f32,
    pub debuff: Debuff,
    pub source: UnitId,
}

/// Typed damage over time, pulsing every `interval` ticks
#[derive(Debug, Clone)]
pub struct Dot {
    pub damage: f32,
    pub damage_type: DamageType,
    pub remaining: Tick,
    pub interval: Tick,
    pub until_pulse: Tick,
    pub source: UnitId,
}

/// Heal over time, pulsing every `interval` ticks
#[derive(Debug, Clone)]
pub struct Hot {
    pub heal: f32,
    pub remaining: Tick,
    pub interval: Tick,
    pub until_pulse: Tick,
    pub source: UnitId,
}

/// One shield pool. Multiple shields coexist and expire independently.
#[derive(Debug, Clone)]
pub struct Shield {
    pub amount: f32,
    pub remaining: Tick,
}

/// Attack-speed chill, stacking by source
#[derive(Debug, Clone)]
pub struct Chill {
    pub source: UnitId,
    pub value: f32,
    pub remaining: Tick,
}

/// One damage or heal pulse produced by phase 1 of the tick
#[derive(Debug, Clone)]
pub enum StatusPulse {
    Damage {
        amount: f32,
        damage_type: DamageType,
        source: UnitId,
    },
    Heal {
        amount: f32,
        source: UnitId,
    },
}

#[derive(Debug, Clone, Default)]
pub struct StatusBoard {
    pub shields: Vec<Shield>,
    pub burn: Option<Burn>,
    pub dots: Vec<Dot>,
    pub hots: Vec<Hot>,

    pub wound: Option<Debuff>,          // heal reduction fraction
    pub slow: Option<Debuff>,           // attack speed reduction fraction
    pub chills: Vec<Chill>,             // per-source AS reduction
    pub armor_shred_flat: Option<Debuff>,
    pub armor_shred_pct: Option<Debuff>,
    pub mr_shred_flat: Option<Debuff>,
    pub mr_shred_pct: Option<Debuff>,

    pub silence: Tick,
    pub disarm: Tick,
    pub taunt: Option<(UnitId, Tick)>,

    /// Surcharge on the next cast's mana requirement, consumed at cast start
    pub mana_reave_pct: f32,
}

impl StatusBoard {
    pub fn total_shield(&self) -> f32 {
        self.shields.iter().map(|s| s.amount).sum()
    }

    pub fn add_shield(&mut self, amount: f32, duration: Tick) {
        self.shields.push(Shield {
            amount,
            remaining: duration,
        });
    }

    /// Absorb damage into shields, oldest first. Returns the absorbed amount.
    pub fn absorb(&mut self, mut damage: f32) -> f32 {
        let mut absorbed = 0.0;
        for shield in self.shields.iter_mut() {
            if damage <= 0.0 {
                break;
            }
            let soak = shield.amount.min(damage);
            shield.amount -= soak;
            damage -= soak;
            absorbed += soak;
        }
        self.shields.retain(|s| s.amount > 0.0);
        absorbed
    }

    pub fn apply_burn(&mut self, dps: f32, duration: Tick, source: UnitId) {
        match &mut self.burn {
            Some(burn) => {
                burn.debuff.refresh(dps, duration);
                burn.dps = burn.debuff.value;
            }
            None => {
                self.burn = Some(Burn {
                    dps,
                    debuff: Debuff::new(dps, duration),
                    source,
                });
            }
        }
    }

    pub fn apply_wound(&mut self, fraction: f32, duration: Tick) {
        refresh_slot(&mut self.wound, fraction, duration);
    }

    pub fn apply_slow(&mut self, fraction: f32, duration: Tick) {
        refresh_slot(&mut self.slow, fraction, duration);
    }

    pub fn apply_chill(&mut self, source: UnitId, fraction: f32, duration: Tick) {
        match self.chills.iter_mut().find(|c| c.source == source) {
            Some(chill) => {
                chill.value = chill.value.max(fraction);
                chill.remaining = chill.remaining.max(duration);
            }
            None => self.chills.push(Chill {
                source,
                value: fraction,
                remaining: duration,
            }),
        }
    }

    pub fn apply_armor_shred(&mut self, value: f32, duration: Tick, is_percent: bool) {
        let slot = if is_percent {
            &mut self.armor_shred_pct
        } else {
            &mut self.armor_shred_flat
        };
        refresh_slot(slot, value, duration);
    }

    pub fn apply_mr_shred(&mut self, value: f32, duration: Tick, is_percent: bool) {
        let slot = if is_percent {
            &mut self.mr_shred_pct
        } else {
            &mut self.mr_shred_flat
        };
        refresh_slot(slot, value, duration);
    }

    pub fn apply_silence(&mut self, duration: Tick) {
        self.silence = self.silence.max(duration);
    }

    pub fn apply_disarm(&mut self, duration: Tick) {
        self.disarm = self.disarm.max(duration);
    }

    pub fn apply_taunt(&mut self, source: UnitId, duration: Tick) {
        self.taunt = Some((source, duration));
    }

    pub fn is_silenced(&self) -> bool {
        self.silence > 0
    }

    pub fn is_disarmed(&self) -> bool {
        self.disarm > 0
    }

    pub fn taunted_by(&self) -> Option<UnitId> {
        self.taunt.map(|(id, _)| id)
    }

    pub fn heal_reduction(&self) -> f32 {
        self.wound.as_ref().map(|w| w.value).unwrap_or(0.0)
    }

    /// Combined attack-speed reduction from slow and chills, capped at 90%
    pub fn attack_speed_reduction(&self) -> f32 {
        let slow = self.slow.as_ref().map(|s| s.value).unwrap_or(0.0);
        let chill: f32 = self.chills.iter().map(|c| c.value).sum();
        (slow + chill).min(0.9)
    }

    pub fn armor_shred(&self) -> (f32, f32) {
        (
            self.armor_shred_pct.as_ref().map(|d| d.value).unwrap_or(0.0),
            self.armor_shred_flat.as_ref().map(|d| d.value).unwrap_or(0.0),
        )
    }

    pub fn mr_shred(&self) -> (f32, f32) {
        (
            self.mr_shred_pct.as_ref().map(|d| d.value).unwrap_or(0.0),
            self.mr_shred_flat.as_ref().map(|d| d.value).unwrap_or(0.0),
        )
    }

    /// Remove crowd control and damaging debuffs. Returns how many were
    /// cleared.
    pub fn cleanse(&mut self) -> u32 {
        let mut removed = 0;
        removed += self.burn.take().is_some() as u32;
        removed += self.dots.len() as u32;
        self.dots.clear();
        removed += self.wound.take().is_some() as u32;
        removed += self.slow.take().is_some() as u32;
        removed += self.chills.len() as u32;
        self.chills.clear();
        removed += self.armor_shred_flat.take().is_some() as u32;
        removed += self.armor_shred_pct.take().is_some() as u32;
        removed += self.mr_shred_flat.take().is_some() as u32;
        removed += self.mr_shred_pct.take().is_some() as u32;
        if self.silence > 0 {
            self.silence = 0;
            removed += 1;
        }
        if self.disarm > 0 {
            self.disarm = 0;
            removed += 1;
        }
        if self.taunt.take().is_some() {
            removed += 1;
        }
        removed
    }

    /// Advance all timers one tick and collect damage/heal pulses.
    /// Burn pulses every tick at `dps / ticks_per_second`; DoTs and HoTs
    /// pulse on their own intervals.
    pub fn tick(&mut self, ticks_per_second: u32) -> Vec<StatusPulse> {
        let mut pulses = Vec::new();

        for shield in self.shields.iter_mut() {
            shield.remaining = shield.remaining.saturating_sub(1);
        }
        self.shields.retain(|s| s.remaining > 0 && s.amount > 0.0);

        if let Some(burn) = &mut self.burn {
            pulses.push(StatusPulse::Damage {
                amount: burn.dps / ticks_per_second as f32,
                damage_type: DamageType::True,
                source: burn.source,
            });
            if burn.debuff.tick() {
                self.burn = None;
            }
        }

        for dot in self.dots.iter_mut() {
            dot.remaining = dot.remaining.saturating_sub(1);
            dot.until_pulse = dot.until_pulse.saturating_sub(1);
            if dot.until_pulse == 0 {
                pulses.push(StatusPulse::Damage {
                    amount: dot.damage,
                    damage_type: dot.damage_type,
                    source: dot.source,
                });
                dot.until_pulse = dot.interval;
            }
        }
        self.dots.retain(|d| d.remaining > 0);

        for hot in self.hots.iter_mut() {
            hot.remaining = hot.remaining.saturating_sub(1);
            hot.until_pulse = hot.until_pulse.saturating_sub(1);
            if hot.until_pulse == 0 {
                pulses.push(StatusPulse::Heal {
                    amount: hot.heal,
                    source: hot.source,
                });
                hot.until_pulse = hot.interval;
            }
        }
        self.hots.retain(|h| h.remaining > 0);

        tick_slot(&mut self.wound);
        tick_slot(&mut self.slow);
        for chill in self.chills.iter_mut() {
            chill.remaining = chill.remaining.saturating_sub(1);
        }
        self.chills.retain(|c| c.remaining > 0);
        tick_slot(&mut self.armor_shred_flat);
        tick_slot(&mut self.armor_shred_pct);
        tick_slot(&mut self.mr_shred_flat);
        tick_slot(&mut self.mr_shred_pct);

        self.silence = self.silence.saturating_sub(1);
        self.disarm = self.disarm.saturating_sub(1);
        if let Some((_, ticks)) = &mut self.taunt {
            *ticks = ticks.saturating_sub(1);
            if *ticks == 0 {
                self.taunt = None;
            }
        }

        pulses
    }
}

fn refresh_slot(slot: &mut Option<Debuff>, value: f32, duration: Tick) {
    match slot {
        Some(debuff) => debuff.refresh(value, duration),
        None => *slot = Some(Debuff::new(value, duration)),
    }
}

fn tick_slot(slot: &mut Option<Debuff>) {
    if let Some(debuff) = slot {
        if debuff.tick() {
            *slot = None;
        }
    }
}
