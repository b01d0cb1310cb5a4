//! Unit statistics: base values plus flat and percent modifier layers
//!
//! The effective value of every stat is
//! `(base + sum of flat modifiers) * (1 + sum of percent modifiers)`,
//! clamped per stat. Buffs, items and traits only ever touch the modifier
//! layers; base values are fixed at creation (after star scaling).

use serde::{Deserialize, Serialize};

use crate::battle::constants::{ATTACK_SPEED_MAX, ATTACK_SPEED_MIN};
use crate::core::config::SimConfig;
use crate::core::error::{Result, SimError};
use crate::core::types::StarLevel;

/// Identifies one numeric stat on a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stat {
    MaxHp,
    AttackDamage,
    AbilityPower,
    Armor,
    MagicResist,
    AttackSpeed,
    CritChance,
    CritDamage,
    DodgeChance,
    Lifesteal,
    Omnivamp,
    MaxMana,
    StartMana,
    ManaRegen,
    DamageAmp,
    Durability,
}

impl Stat {
    pub fn parse(name: &str) -> Result<Stat> {
        match name {
            "hp" | "max_hp" => Ok(Stat::MaxHp),
            "ad" | "attack_damage" => Ok(Stat::AttackDamage),
            "ap" | "ability_power" => Ok(Stat::AbilityPower),
            "armor" => Ok(Stat::Armor),
            "mr" | "magic_resist" => Ok(Stat::MagicResist),
            "as" | "attack_speed" => Ok(Stat::AttackSpeed),
            "crit_chance" => Ok(Stat::CritChance),
            "crit_damage" => Ok(Stat::CritDamage),
            "dodge_chance" => Ok(Stat::DodgeChance),
            "lifesteal" => Ok(Stat::Lifesteal),
            "omnivamp" => Ok(Stat::Omnivamp),
            "mana" | "max_mana" => Ok(Stat::MaxMana),
            "start_mana" => Ok(Stat::StartMana),
            "mana_regen" | "mana_per_second" => Ok(Stat::ManaRegen),
            "damage_amp" => Ok(Stat::DamageAmp),
            "durability" => Ok(Stat::Durability),
            other => Err(SimError::UnknownStat(other.to_string())),
        }
    }
}

/// One value per stat. Used for the base layer and both modifier layers.
#[derive(Debug, Clone, Default)]
struct StatBlock {
    max_hp: f32,
    attack_damage: f32,
    ability_power: f32,
    armor: f32,
    magic_resist: f32,
    attack_speed: f32,
    crit_chance: f32,
    crit_damage: f32,
    dodge_chance: f32,
    lifesteal: f32,
    omnivamp: f32,
    max_mana: f32,
    start_mana: f32,
    mana_regen: f32,
    damage_amp: f32,
    durability: f32,
}

impl StatBlock {
    fn get(&self, stat: Stat) -> f32 {
        match stat {
            Stat::MaxHp => self.max_hp,
            Stat::AttackDamage => self.attack_damage,
            Stat::AbilityPower => self.ability_power,
            Stat::Armor => self.armor,
            Stat::MagicResist => self.magic_resist,
            Stat::AttackSpeed => self.attack_speed,
            Stat::CritChance => self.crit_chance,
            Stat::CritDamage => self.crit_damage,
            Stat::DodgeChance => self.dodge_chance,
            Stat::Lifesteal => self.lifesteal,
            Stat::Omnivamp => self.omnivamp,
            Stat::MaxMana => self.max_mana,
            Stat::StartMana => self.start_mana,
            Stat::ManaRegen => self.mana_regen,
            Stat::DamageAmp => self.damage_amp,
            Stat::Durability => self.durability,
        }
    }

    fn get_mut(&mut self, stat: Stat) -> &mut f32 {
        match stat {
            Stat::MaxHp => &mut self.max_hp,
            Stat::AttackDamage => &mut self.attack_damage,
            Stat::AbilityPower => &mut self.ability_power,
            Stat::Armor => &mut self.armor,
            Stat::MagicResist => &mut self.magic_resist,
            Stat::AttackSpeed => &mut self.attack_speed,
            Stat::CritChance => &mut self.crit_chance,
            Stat::CritDamage => &mut self.crit_damage,
            Stat::DodgeChance => &mut self.dodge_chance,
            Stat::Lifesteal => &mut self.lifesteal,
            Stat::Omnivamp => &mut self.omnivamp,
            Stat::MaxMana => &mut self.max_mana,
            Stat::StartMana => &mut self.start_mana,
            Stat::ManaRegen => &mut self.mana_regen,
            Stat::DamageAmp => &mut self.damage_amp,
            Stat::Durability => &mut self.durability,
        }
    }
}

/// Base stat values as declared by a unit definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseStats {
    pub hp: f32,
    pub attack_damage: f32,
    pub ability_power: f32,
    pub armor: f32,
    pub magic_resist: f32,
    pub attack_speed: f32,
    pub attack_range: u32,
    pub movement_speed: f32,
    pub crit_chance: f32,
    pub crit_damage: f32,
    pub dodge_chance: f32,
    pub lifesteal: f32,
    pub omnivamp: f32,
    pub max_mana: f32,
    pub start_mana: f32,
    pub mana_regen: f32,
}

impl Default for BaseStats {
    fn default() -> Self {
        Self {
            hp: 500.0,
            attack_damage: 50.0,
            ability_power: 100.0,
            armor: 20.0,
            magic_resist: 20.0,
            attack_speed: 0.7,
            attack_range: 1,
            movement_speed: 1.0,
            crit_chance: 0.0,
            crit_damage: crate::battle::constants::CRIT_DAMAGE_BONUS,
            dodge_chance: 0.0,
            lifesteal: 0.0,
            omnivamp: 0.0,
            max_mana: 100.0,
            start_mana: 0.0,
            mana_regen: 0.0,
        }
    }
}

/// Runtime stats for one unit
#[derive(Debug, Clone)]
pub struct UnitStats {
    base: StatBlock,
    flat: StatBlock,
    percent: StatBlock,
    pub attack_range: u32,
    pub movement_speed: f32,
    pub current_hp: f32,
    pub current_mana: f32,
}

impl UnitStats {
    /// Build runtime stats from a definition, applying star multipliers to
    /// HP, AD and AP.
    pub fn from_base(base: &BaseStats, star: StarLevel, config: &SimConfig) -> Result<Self> {
        if !(1..=3).contains(&star) {
            return Err(SimError::InvalidStarLevel(star));
        }
        if base.hp <= 0.0 {
            return Err(SimError::StatOutOfRange {
                stat: "hp".into(),
                value: base.hp,
            });
        }
        if !(0.0..=1.0).contains(&base.crit_chance) {
            return Err(SimError::StatOutOfRange {
                stat: "crit_chance".into(),
                value: base.crit_chance,
            });
        }
        if !(0.0..=1.0).contains(&base.dodge_chance) {
            return Err(SimError::StatOutOfRange {
                stat: "dodge_chance".into(),
                value: base.dodge_chance,
            });
        }

        let hp_mult = config.star_hp_multipliers[(star - 1) as usize];
        let dmg_mult = config.star_damage_multipliers[(star - 1) as usize];

        let block = StatBlock {
            max_hp: base.hp * hp_mult,
            attack_damage: base.attack_damage * dmg_mult,
            ability_power: base.ability_power * dmg_mult,
            armor: base.armor,
            magic_resist: base.magic_resist,
            attack_speed: base.attack_speed,
            crit_chance: base.crit_chance,
            crit_damage: base.crit_damage,
            dodge_chance: base.dodge_chance,
            lifesteal: base.lifesteal,
            omnivamp: base.omnivamp,
            max_mana: base.max_mana,
            start_mana: base.start_mana,
            mana_regen: base.mana_regen,
            damage_amp: 0.0,
            durability: 0.0,
        };

        let mut stats = Self {
            base: block,
            flat: StatBlock::default(),
            percent: StatBlock::default(),
            attack_range: base.attack_range,
            movement_speed: base.movement_speed,
            current_hp: 0.0,
            current_mana: 0.0,
        };
        stats.current_hp = stats.max_hp();
        stats.current_mana = base.start_mana;
        Ok(stats)
    }

    fn effective(&self, stat: Stat) -> f32 {
        (self.base.get(stat) + self.flat.get(stat)) * (1.0 + self.percent.get(stat))
    }

    // Effective values, clamped per stat

    pub fn max_hp(&self) -> f32 {
        self.effective(Stat::MaxHp).max(1.0)
    }

    pub fn attack_damage(&self) -> f32 {
        self.effective(Stat::AttackDamage).max(0.0)
    }

    pub fn ability_power(&self) -> f32 {
        self.effective(Stat::AbilityPower).max(0.0)
    }

    pub fn armor(&self) -> f32 {
        self.effective(Stat::Armor)
    }

    pub fn magic_resist(&self) -> f32 {
        self.effective(Stat::MagicResist)
    }

    pub fn attack_speed(&self) -> f32 {
        self.effective(Stat::AttackSpeed)
            .clamp(ATTACK_SPEED_MIN, ATTACK_SPEED_MAX)
    }

    pub fn crit_chance(&self) -> f32 {
        self.effective(Stat::CritChance).clamp(0.0, 1.0)
    }

    /// Bonus damage fraction on crit; the multiplier is `1 + crit_damage`
    pub fn crit_damage(&self) -> f32 {
        self.effective(Stat::CritDamage).max(0.0)
    }

    pub fn dodge_chance(&self) -> f32 {
        self.effective(Stat::DodgeChance).clamp(0.0, 1.0)
    }

    pub fn lifesteal(&self) -> f32 {
        self.effective(Stat::Lifesteal).max(0.0)
    }

    pub fn omnivamp(&self) -> f32 {
        self.effective(Stat::Omnivamp).clamp(0.0, 1.0)
    }

    pub fn max_mana(&self) -> f32 {
        self.effective(Stat::MaxMana).max(0.0)
    }

    pub fn start_mana(&self) -> f32 {
        self.effective(Stat::StartMana).max(0.0)
    }

    pub fn mana_regen(&self) -> f32 {
        self.effective(Stat::ManaRegen).max(0.0)
    }

    pub fn damage_amp(&self) -> f32 {
        self.effective(Stat::DamageAmp)
    }

    pub fn durability(&self) -> f32 {
        self.effective(Stat::Durability).max(0.0)
    }

    // Modifier layers

    pub fn add_flat(&mut self, stat: Stat, value: f32) {
        *self.flat.get_mut(stat) += value;
    }

    pub fn add_percent(&mut self, stat: Stat, value: f32) {
        *self.percent.get_mut(stat) += value;
    }

    pub fn remove_flat(&mut self, stat: Stat, value: f32) {
        self.add_flat(stat, -value);
    }

    pub fn remove_percent(&mut self, stat: Stat, value: f32) {
        self.add_percent(stat, -value);
    }

    // HP and mana management

    /// Reduce HP, never below zero. Returns the amount actually removed.
    pub fn take_damage(&mut self, amount: f32) -> f32 {
        let actual = amount.min(self.current_hp).max(0.0);
        self.current_hp -= actual;
        actual
    }

    /// Restore HP up to the effective max. Returns the amount applied.
    pub fn heal(&mut self, amount: f32) -> f32 {
        let actual = amount.min(self.max_hp() - self.current_hp).max(0.0);
        self.current_hp += actual;
        actual
    }

    /// Add mana, capped at max. Returns the overflow above the cap.
    pub fn add_mana(&mut self, amount: f32) -> f32 {
        let max = self.max_mana();
        let uncapped = self.current_mana + amount;
        self.current_mana = uncapped.min(max);
        (uncapped - max).max(0.0)
    }

    pub fn spend_mana(&mut self, amount: f32) -> bool {
        if self.current_mana >= amount {
            self.current_mana -= amount;
            true
        } else {
            false
        }
    }

    pub fn is_alive(&self) -> bool {
        self.current_hp > 0.0
    }

    pub fn hp_fraction(&self) -> f32 {
        self.current_hp / self.max_hp()
    }
}
