//! Per-unit lifecycle state machine
//!
//! One state at a time: Idle, Moving, Attacking, Casting, Stunned, Dead.
//! Casting carries internal phases (cast start, effect point, cast end)
//! measured in ticks. Stun remembers the interrupted state and restores it
//! on expiry. Dead is terminal.

use serde::{Deserialize, Serialize};

use crate::core::types::Tick;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnitState {
    #[default]
    Idle,
    Moving,
    Attacking,
    Casting,
    Stunned,
    Dead,
}

impl UnitState {
    /// Can the unit make decisions and act in this state?
    pub fn can_act(&self) -> bool {
        matches!(self, UnitState::Idle | UnitState::Moving | UnitState::Attacking)
    }

    pub fn is_terminal(&self) -> bool {
        *self == UnitState::Dead
    }

    pub fn name(&self) -> &'static str {
        match self {
            UnitState::Idle => "IDLE",
            UnitState::Moving => "MOVING",
            UnitState::Attacking => "ATTACKING",
            UnitState::Casting => "CASTING",
            UnitState::Stunned => "STUNNED",
            UnitState::Dead => "DEAD",
        }
    }
}

/// State machine with cast phase and stun tracking
#[derive(Debug, Clone, Default)]
pub struct StateMachine {
    pub current: UnitState,
    previous: Option<UnitState>,

    stun_remaining: Tick,

    cast_remaining: Tick,
    effect_delay_remaining: Tick,
    effect_fired: bool,

    mana_locked: bool,
    mana_lock_remaining: Tick,
}

/// Transition surfaced by `tick` so the engine can log it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateTransition {
    StunExpired(UnitState),
    CastEnded,
}

impl StateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch state. Dead is never left; entering Stunned records the
    /// prior state for restore.
    pub fn transition_to(&mut self, new_state: UnitState) -> bool {
        if self.current == UnitState::Dead {
            return false;
        }
        if new_state == UnitState::Stunned {
            self.previous = Some(self.current);
        }
        self.current = new_state;
        true
    }

    /// Apply a stun. Interrupting a cast cancels it (the effect never
    /// fires) and the unit resumes Idle rather than a half-finished cast.
    pub fn apply_stun(&mut self, duration: Tick) {
        if self.current == UnitState::Dead {
            return;
        }
        if self.current == UnitState::Casting {
            self.cast_remaining = 0;
            self.effect_delay_remaining = 0;
            self.effect_fired = false;
            self.previous = Some(UnitState::Idle);
            self.stun_remaining = self.stun_remaining.max(duration);
            self.current = UnitState::Stunned;
            return;
        }
        if self.current == UnitState::Stunned {
            self.stun_remaining = self.stun_remaining.max(duration);
            return;
        }
        self.stun_remaining = duration;
        self.transition_to(UnitState::Stunned);
    }

    /// Begin casting. Mana is locked for the whole cast window.
    pub fn start_cast(&mut self, cast_ticks: Tick, effect_delay: Tick) {
        if self.current == UnitState::Dead {
            return;
        }
        self.cast_remaining = cast_ticks.max(1);
        self.effect_delay_remaining = effect_delay.min(cast_ticks);
        self.effect_fired = false;
        self.mana_locked = true;
        self.mana_lock_remaining = self.cast_remaining;
        self.transition_to(UnitState::Casting);
    }

    /// Advance timers one tick. Returns a transition when the stun expired
    /// or the cast finished this tick.
    pub fn tick(&mut self) -> Option<StateTransition> {
        if self.mana_lock_remaining > 0 {
            self.mana_lock_remaining -= 1;
            if self.mana_lock_remaining == 0 {
                self.mana_locked = false;
            }
        }

        match self.current {
            UnitState::Stunned => {
                self.stun_remaining = self.stun_remaining.saturating_sub(1);
                if self.stun_remaining == 0 {
                    let restored = self.previous.take().unwrap_or(UnitState::Idle);
                    self.current = restored;
                    return Some(StateTransition::StunExpired(restored));
                }
                None
            }
            UnitState::Casting => {
                self.effect_delay_remaining = self.effect_delay_remaining.saturating_sub(1);
                self.cast_remaining = self.cast_remaining.saturating_sub(1);
                if self.cast_remaining == 0 {
                    self.current = UnitState::Idle;
                    self.effect_fired = false;
                    return Some(StateTransition::CastEnded);
                }
                None
            }
            _ => None,
        }
    }

    /// True exactly once per cast, when the effect point is reached
    pub fn should_fire_effect(&self) -> bool {
        self.current == UnitState::Casting && self.effect_delay_remaining == 0 && !self.effect_fired
    }

    pub fn mark_effect_fired(&mut self) {
        self.effect_fired = true;
    }

    pub fn is_mana_locked(&self) -> bool {
        self.mana_locked
    }

    pub fn is_casting(&self) -> bool {
        self.current == UnitState::Casting
    }

    pub fn is_stunned(&self) -> bool {
        self.current == UnitState::Stunned
    }

    pub fn is_alive(&self) -> bool {
        self.current != UnitState::Dead
    }

    pub fn die(&mut self) {
        self.current = UnitState::Dead;
        self.previous = None;
        self.stun_remaining = 0;
        self.cast_remaining = 0;
        self.effect_delay_remaining = 0;
        self.effect_fired = false;
        self.mana_locked = false;
        self.mana_lock_remaining = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_idle() {
        assert_eq!(StateMachine::new().current, UnitState::Idle);
    }

    #[test]
    fn test_dead_is_terminal() {
        let mut fsm = StateMachine::new();
        fsm.die();
        assert!(!fsm.transition_to(UnitState::Idle));
        assert_eq!(fsm.current, UnitState::Dead);
    }

    #[test]
    fn test_stun_restores_previous_state() {
        let mut fsm = StateMachine::new();
        fsm.transition_to(UnitState::Attacking);
        fsm.apply_stun(2);
        assert_eq!(fsm.current, UnitState::Stunned);

        assert_eq!(fsm.tick(), None);
        assert_eq!(
            fsm.tick(),
            Some(StateTransition::StunExpired(UnitState::Attacking))
        );
        assert_eq!(fsm.current, UnitState::Attacking);
    }

    #[test]
    fn test_stun_refresh_takes_longer_duration() {
        let mut fsm = StateMachine::new();
        fsm.apply_stun(2);
        fsm.apply_stun(5);
        for _ in 0..4 {
            assert_eq!(fsm.tick(), None);
        }
        assert!(fsm.tick().is_some());
    }

    #[test]
    fn test_cast_phases() {
        let mut fsm = StateMachine::new();
        fsm.transition_to(UnitState::Attacking);
        fsm.start_cast(5, 2);

        assert!(fsm.is_casting());
        assert!(fsm.is_mana_locked());
        assert!(!fsm.should_fire_effect());

        fsm.tick();
        assert!(!fsm.should_fire_effect());
        fsm.tick();
        assert!(fsm.should_fire_effect());
        fsm.mark_effect_fired();
        assert!(!fsm.should_fire_effect());

        fsm.tick();
        fsm.tick();
        assert_eq!(fsm.tick(), Some(StateTransition::CastEnded));
        assert_eq!(fsm.current, UnitState::Idle);
        assert!(!fsm.is_mana_locked());
    }

    #[test]
    fn test_instant_effect_fires_at_cast_start() {
        let mut fsm = StateMachine::new();
        fsm.start_cast(5, 0);
        assert!(fsm.should_fire_effect());
    }

    #[test]
    fn test_stun_interrupts_cast() {
        let mut fsm = StateMachine::new();
        fsm.start_cast(10, 5);
        fsm.apply_stun(3);
        assert!(fsm.is_stunned());
        assert!(!fsm.should_fire_effect());

        fsm.tick();
        fsm.tick();
        assert_eq!(fsm.tick(), Some(StateTransition::StunExpired(UnitState::Idle)));
    }

    #[test]
    fn test_effect_fires_once_per_cast() {
        let mut fsm = StateMachine::new();
        fsm.start_cast(3, 0);
        assert!(fsm.should_fire_effect());
        fsm.mark_effect_fired();
        fsm.tick();
        assert!(!fsm.should_fire_effect());
    }
}
