//! The unit aggregate
//!
//! A unit ties together stats, the state machine, the status board, its
//! buff list and its combat bookkeeping (target, cooldowns, mana). Units
//! live in the engine's arena; everything cross-unit is expressed through
//! ids resolved at use time.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::abilities::buff::{Buff, StackPolicy};
use crate::abilities::effect::EffectKind;
use crate::battle::hex::HexCoord;
use crate::combat::targeting::TargetSelector;
use crate::core::config::SimConfig;
use crate::core::error::Result;
use crate::core::types::{StarLevel, Team, UnitId};
use crate::units::class::UnitClass;
use crate::units::state::{StateMachine, UnitState};
use crate::units::stats::{BaseStats, UnitStats};
use crate::units::status::StatusBoard;

/// Configuration record for one unit, as loaded from a definition table
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UnitDef {
    pub name: String,
    #[serde(flatten)]
    pub stats: BaseStats,
    #[serde(default)]
    pub ability: Option<String>,
    #[serde(default)]
    pub traits: Vec<String>,
    #[serde(default)]
    pub class: UnitClass,
    #[serde(default)]
    pub target_selector: Option<TargetSelector>,
}

/// `replace_attacks` bookkeeping: the next N auto-attacks swap their
/// effect list
#[derive(Debug, Clone)]
pub struct EmpoweredAttacks {
    pub remaining: u32,
    pub effects: Vec<EffectKind>,
}

#[derive(Debug, Clone)]
pub struct Unit {
    pub id: UnitId,
    pub name: String,
    /// Definition key; duplicate kinds count once for trait thresholds
    pub kind: String,
    pub team: Team,
    pub star: StarLevel,
    pub position: HexCoord,

    pub stats: UnitStats,
    pub state: StateMachine,
    pub status: StatusBoard,
    pub buffs: Vec<Buff>,

    pub ability: Option<String>,
    pub traits: Vec<String>,
    pub class: UnitClass,
    pub selector: TargetSelector,

    pub target: Option<UnitId>,
    pub attack_cooldown: f32,
    pub move_progress: f32,

    pub casts_completed: u32,
    /// Set by `transform_after_casts`; swapped in at cast end
    pub pending_transform: Option<(u32, String)>,
    pub empowered: Option<EmpoweredAttacks>,

    /// Item flag: abilities may critically strike
    pub ability_crit: bool,
    /// Item stacking counters, keyed by group name, value = stat already granted
    pub stack_counters: AHashMap<String, f32>,

    /// Mana gained above max, carried into the next cycle when overflow is on
    pub pending_overflow: f32,
}

impl Unit {
    pub fn from_def(
        id: UnitId,
        def: &UnitDef,
        team: Team,
        position: HexCoord,
        star: StarLevel,
        config: &SimConfig,
    ) -> Result<Self> {
        let stats = UnitStats::from_base(&def.stats, star, config)?;
        let selector = def
            .target_selector
            .clone()
            .or_else(|| def.class.target_selector.clone())
            .unwrap_or_else(TargetSelector::nearest);

        Ok(Self {
            id,
            name: def.name.clone(),
            kind: def.name.clone(),
            team,
            star,
            position,
            stats,
            state: StateMachine::new(),
            status: StatusBoard::default(),
            buffs: Vec::new(),
            ability: def.ability.clone(),
            traits: def.traits.clone(),
            class: def.class.clone(),
            selector,
            target: None,
            attack_cooldown: 0.0,
            move_progress: 0.0,
            casts_completed: 0,
            pending_transform: None,
            empowered: None,
            ability_crit: false,
            stack_counters: AHashMap::new(),
            pending_overflow: 0.0,
        })
    }

    // Lifecycle

    pub fn is_alive(&self) -> bool {
        self.stats.is_alive() && self.state.is_alive()
    }

    pub fn can_act(&self) -> bool {
        self.is_alive() && self.state.current.can_act()
    }

    pub fn die(&mut self) {
        self.stats.current_hp = 0.0;
        self.state.die();
        self.target = None;
    }

    // Combat

    pub fn attack_range(&self) -> u32 {
        self.stats.attack_range
    }

    pub fn in_attack_range(&self, other: &Unit) -> bool {
        self.position.distance(&other.position) <= self.attack_range()
    }

    /// Attack speed after slow/chill debuffs
    pub fn effective_attack_speed(&self) -> f32 {
        (self.stats.attack_speed() * (1.0 - self.status.attack_speed_reduction())).max(0.05)
    }

    /// Ticks between attacks: `ticks_per_second / attack_speed`
    pub fn attack_interval_ticks(&self, ticks_per_second: u32) -> f32 {
        ticks_per_second as f32 / self.effective_attack_speed()
    }

    pub fn can_attack(&self) -> bool {
        self.is_alive()
            && self.state.current == UnitState::Attacking
            && self.attack_cooldown <= 0.0
            && !self.status.is_disarmed()
    }

    pub fn start_attack_cooldown(&mut self, ticks_per_second: u32) {
        self.attack_cooldown = self.attack_interval_ticks(ticks_per_second);
    }

    /// Hexes advanced per tick, slowed like attack speed
    pub fn move_pace(&self) -> f32 {
        (self.stats.movement_speed * (1.0 - self.status.attack_speed_reduction())).clamp(0.0, 1.0)
    }

    // Mana

    fn mana_blocked(&self) -> bool {
        self.state.is_mana_locked() || self.state.is_stunned() || self.status.is_silenced()
    }

    /// Mana required to start the next cast, including any reave surcharge
    pub fn required_cast_mana(&self) -> f32 {
        self.stats.max_mana() * (1.0 + self.status.mana_reave_pct)
    }

    /// Full bar (plus banked overflow) and able to begin a cast
    pub fn ready_to_cast(&self) -> bool {
        self.ability.is_some()
            && !self.status.is_silenced()
            && !self.state.is_casting()
            && self.stats.current_mana + self.pending_overflow >= self.required_cast_mana()
    }

    pub fn gain_mana_on_attack(&mut self, config: &SimConfig) -> f32 {
        if self.mana_blocked() {
            return 0.0;
        }
        let gain = config.mana.per_attack * self.class.mana_per_attack_multiplier;
        self.pending_overflow += self.stats.add_mana(gain);
        gain
    }

    /// Damage-taken mana: `min(cap, raw * pre + mitigated * post)`
    pub fn gain_mana_on_damage(&mut self, raw: f32, mitigated: f32, config: &SimConfig) -> f32 {
        if self.mana_blocked() {
            return 0.0;
        }
        let gain = (raw * config.mana.pre_mitigation_pct
            + mitigated * config.mana.post_mitigation_pct)
            .min(config.mana.damage_gain_cap)
            * self.class.mana_from_damage_multiplier;
        self.pending_overflow += self.stats.add_mana(gain);
        gain
    }

    pub fn gain_mana_passive(&mut self, config: &SimConfig) -> f32 {
        if self.mana_blocked() {
            return 0.0;
        }
        let per_second = self.stats.mana_regen() + self.class.mana_per_second;
        if per_second <= 0.0 {
            return 0.0;
        }
        let gain = per_second / config.ticks_per_second as f32;
        self.pending_overflow += self.stats.add_mana(gain);
        gain
    }

    /// Reset mana at cast end. With overflow enabled the banked excess
    /// seeds the next cycle; otherwise the bar empties.
    pub fn finish_cast_mana(&mut self, config: &SimConfig) {
        if config.mana.overflow_enabled {
            let overflow = self.pending_overflow;
            self.stats.current_mana = 0.0;
            self.pending_overflow = 0.0;
            self.stats.add_mana(overflow);
        } else {
            self.stats.current_mana = 0.0;
            self.pending_overflow = 0.0;
        }
    }

    // Healing

    /// Heal through the wound debuff. Returns HP actually restored.
    pub fn apply_heal(&mut self, amount: f32) -> f32 {
        let effective = amount * (1.0 - self.status.heal_reduction());
        self.stats.heal(effective)
    }

    // Buffs

    /// Apply a buff honoring its stacking policy. Returns true when a new
    /// instance was added (as opposed to refreshing an existing one).
    pub fn add_buff(&mut self, mut buff: Buff) -> bool {
        if buff.policy != StackPolicy::MultiStack {
            if let Some(existing) = self.buffs.iter_mut().find(|b| b.id == buff.id) {
                existing.reapply(&buff, &mut self.stats);
                return false;
            }
        }
        buff.sync_to(&mut self.stats);
        self.buffs.push(buff);
        true
    }

    /// Tick buff timers; returns the ids of buffs that expired this tick
    pub fn update_buffs(&mut self) -> Vec<String> {
        let mut expired = Vec::new();
        let mut i = 0;
        while i < self.buffs.len() {
            if self.buffs[i].tick(&mut self.stats) {
                expired.push(self.buffs.remove(i).id);
            } else {
                i += 1;
            }
        }
        expired
    }

    // Serialization for the event log

    pub fn snapshot(&self) -> serde_json::Value {
        json!({
            "id": self.id.0,
            "name": self.name,
            "team": self.team,
            "star_level": self.star,
            "position": [self.position.q, self.position.r],
            "hp": round1(self.stats.current_hp),
            "max_hp": round1(self.stats.max_hp()),
            "mana": round1(self.stats.current_mana),
            "max_mana": round1(self.stats.max_mana()),
            "state": self.state.current.name(),
            "target_id": self.target.map(|t| t.0),
        })
    }
}

pub(crate) fn round1(value: f32) -> f64 {
    (value as f64 * 10.0).round() / 10.0
}
