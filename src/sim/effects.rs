//! Effect application
//!
//! The single dispatch point mapping every effect kind to its behaviour.
//! `apply_effect` takes the caster and target by id, resolves star values
//! and stat scaling, and routes damage through the damage pipeline. The
//! match is exhaustive: adding a kind without behaviour fails to compile.

use glam::Vec2;

use crate::abilities::buff::{Buff, StackPolicy, StatDelta};
use crate::abilities::effect::{EffectKind, EffectOutcome, EffectRecipient};
use crate::abilities::scaling::scaled_value;
use crate::battle::hex::HexCoord;
use crate::combat::damage::DamageOptions;
use crate::core::types::{StarLevel, Tick, UnitId};
use crate::sim::simulation::{ScheduledEffect, Simulation, Zone};
use crate::units::stats::Stat;
use crate::units::unit::{round1, EmpoweredAttacks};

impl Simulation {
    /// Apply one effect from `caster` to `target` at the given star level.
    /// `context` names the source for the event log ("fireball", "item",
    /// "zone", ...).
    pub fn apply_effect(
        &mut self,
        effect: &EffectKind,
        caster: UnitId,
        target: UnitId,
        star: StarLevel,
        context: &str,
    ) -> EffectOutcome {
        let tick = self.current_tick;

        match effect {
            // ---- damage-producing ------------------------------------

            EffectKind::Damage {
                damage_type,
                value,
                scaling,
            } => {
                let base = self.scaled(value, *scaling, star, caster, target);
                let result =
                    self.deal_damage(caster, target, base, *damage_type, DamageOptions::ability());
                EffectOutcome::hit(result.final_damage, vec![target])
            }

            EffectKind::HybridDamage {
                damage_type,
                ad_value,
                ap_value,
            } => {
                let base = {
                    let atk = self.unit(caster);
                    ad_value.at(star) * atk.stats.attack_damage() / 100.0
                        + ap_value.at(star) * atk.stats.ability_power() / 100.0
                };
                let result =
                    self.deal_damage(caster, target, base, *damage_type, DamageOptions::ability());
                EffectOutcome::hit(result.final_damage, vec![target])
            }

            EffectKind::Dot {
                damage_type,
                value,
                duration,
                interval,
                scaling,
            } => {
                let pulse = self.scaled(value, *scaling, star, caster, target);
                let ticks = duration.at_ticks(star);
                let interval = (*interval).max(1);
                self.unit_mut(target).status.dots.push(crate::units::status::Dot {
                    damage: pulse,
                    damage_type: *damage_type,
                    remaining: ticks,
                    interval,
                    until_pulse: interval,
                    source: caster,
                });
                self.log
                    .log_debuff_apply(tick, target, "dot", round1(pulse), ticks);
                EffectOutcome::hit(pulse, vec![target])
            }

            EffectKind::Burn {
                value,
                duration,
                scaling,
            } => {
                let dps = self.scaled(value, *scaling, star, caster, target);
                let ticks = duration.at_ticks(star);
                self.unit_mut(target).status.apply_burn(dps, ticks, caster);
                self.log
                    .log_debuff_apply(tick, target, "burn", round1(dps), ticks);
                EffectOutcome::hit(dps, vec![target])
            }

            EffectKind::Execute { threshold } => {
                let pct = threshold.at(star);
                let hp_pct = self.unit(target).stats.hp_fraction() * 100.0;
                if hp_pct <= pct {
                    self.unit_mut(target).stats.current_hp = 0.0;
                    self.handle_death(target, Some(caster));
                    EffectOutcome::hit(pct, vec![target])
                } else {
                    EffectOutcome::fizzle()
                }
            }

            EffectKind::PercentHpDamage {
                value,
                damage_type,
                is_current,
            } => {
                let fraction = value.at(star);
                let base = {
                    let t = self.unit(target);
                    if *is_current {
                        t.stats.current_hp * fraction
                    } else {
                        t.stats.max_hp() * fraction
                    }
                };
                let result =
                    self.deal_damage(caster, target, base, *damage_type, DamageOptions::periodic());
                EffectOutcome::hit(result.final_damage, vec![target])
            }

            EffectKind::SplashDamage {
                value,
                splash_percent,
                radius,
                damage_type,
                scaling,
            } => {
                let main = self.scaled(value, *scaling, star, caster, target);
                let result =
                    self.deal_damage(caster, target, main, *damage_type, DamageOptions::ability());
                let mut total = result.final_damage;
                let mut affected = vec![target];

                let impact_hex = self.unit(target).position;
                let caster_team = self.unit(caster).team;
                let splash_targets: Vec<UnitId> = self
                    .units()
                    .iter()
                    .filter(|u| {
                        u.is_alive()
                            && u.team != caster_team
                            && u.id != target
                            && impact_hex.distance(&u.position) <= radius.at_ticks(star)
                    })
                    .map(|u| u.id)
                    .collect();
                for splashed in splash_targets {
                    let r = self.deal_damage(
                        caster,
                        splashed,
                        main * splash_percent,
                        *damage_type,
                        DamageOptions::ability(),
                    );
                    total += r.final_damage;
                    affected.push(splashed);
                }
                EffectOutcome::hit(total, affected)
            }

            EffectKind::Ricochet {
                value,
                chains,
                radius,
                damage_type,
                scaling,
            } => {
                let damage = self.scaled(value, *scaling, star, caster, target);
                let max_chains = chains.at_ticks(star);
                let mut affected = Vec::new();
                let mut current = target;
                let mut total = 0.0;

                loop {
                    let result = self.deal_damage(
                        caster,
                        current,
                        damage,
                        *damage_type,
                        DamageOptions::ability(),
                    );
                    total += result.final_damage;
                    affected.push(current);
                    if affected.len() as u32 > max_chains {
                        break;
                    }

                    // nearest unhit enemy within the chain radius
                    let here = self.unit(current).position;
                    let caster_team = self.unit(caster).team;
                    let next = self
                        .units()
                        .iter()
                        .filter(|u| {
                            u.is_alive()
                                && u.team != caster_team
                                && !affected.contains(&u.id)
                                && here.distance(&u.position) <= *radius
                        })
                        .min_by_key(|u| (here.distance(&u.position), u.id))
                        .map(|u| u.id);
                    match next {
                        Some(next) => current = next,
                        None => break,
                    }
                }
                EffectOutcome::hit(total, affected)
            }

            EffectKind::MultiHit {
                value,
                hits,
                damage_type,
                scaling,
            } => {
                let per_hit = self.scaled(value, *scaling, star, caster, target);
                let count = hits.at_ticks(star).max(1);
                let mut total = 0.0;
                let mut landed = 0;
                for _ in 0..count {
                    if !self.unit(target).is_alive() {
                        break;
                    }
                    let result = self.deal_damage(
                        caster,
                        target,
                        per_hit,
                        *damage_type,
                        DamageOptions::ability(),
                    );
                    total += result.final_damage;
                    landed += 1;
                }
                EffectOutcome::hit(total, if landed > 0 { vec![target] } else { vec![] })
            }

            EffectKind::DashThrough {
                value,
                damage_type,
                scaling,
            } => {
                let damage = self.scaled(value, *scaling, star, caster, target);
                let from = self.unit(caster).position;
                let to = self.unit(target).position;
                let caster_team = self.unit(caster).team;

                let line = from.thick_line_to(&to, 0);
                let victims: Vec<UnitId> = self
                    .units()
                    .iter()
                    .filter(|u| u.is_alive() && u.team != caster_team && line.contains(&u.position))
                    .map(|u| u.id)
                    .collect();
                let mut total = 0.0;
                for victim in &victims {
                    let result = self.deal_damage(
                        caster,
                        *victim,
                        damage,
                        *damage_type,
                        DamageOptions::ability(),
                    );
                    total += result.final_damage;
                }
                self.blink_adjacent(caster, target);
                EffectOutcome::hit(total, victims)
            }

            EffectKind::ProjectileSwarm {
                count,
                speed,
                can_miss,
                effects,
            } => {
                let shots = count.at_ticks(star).max(1);
                let caster_team = self.unit(caster).team;
                let source_hex = self.unit(caster).position;
                let mut enemies: Vec<UnitId> = self
                    .units()
                    .iter()
                    .filter(|u| u.is_alive() && u.team != caster_team)
                    .map(|u| u.id)
                    .collect();
                enemies.sort_by_key(|e| {
                    (source_hex.distance(&self.unit(*e).position), *e)
                });
                if enemies.is_empty() {
                    return EffectOutcome::fizzle();
                }
                let mut affected = Vec::new();
                for shot in 0..shots {
                    let victim = enemies[shot as usize % enemies.len()];
                    let dest = self.unit(victim).position;
                    self.projectiles.spawn(
                        caster,
                        source_hex,
                        Some(victim),
                        dest,
                        *speed,
                        true,
                        *can_miss,
                        star,
                        context.to_string(),
                        effects.clone(),
                        None,
                    );
                    self.log
                        .log_projectile_spawn(tick, caster, Some(victim), context);
                    affected.push(victim);
                }
                EffectOutcome::hit(shots as f32, affected)
            }

            EffectKind::ProjectileSpread {
                count,
                speed,
                range,
                effects,
            } => {
                let shots = count.at_ticks(star).max(1);
                let source_hex = self.unit(caster).position;
                let axis = self.unit(target).position.to_cartesian() - source_hex.to_cartesian();
                if axis.length_squared() < 1e-6 {
                    return EffectOutcome::fizzle();
                }
                let axis = axis.normalize();
                let step_deg = 15.0f32;
                let first = -(shots as f32 - 1.0) / 2.0;
                for shot in 0..shots {
                    let angle = (first + shot as f32) * step_deg.to_radians();
                    let dir = Vec2::from_angle(angle).rotate(axis);
                    let dest_pt = source_hex.to_cartesian() + dir * (*range as f32);
                    let dest_hex = HexCoord::from_cartesian(dest_pt);
                    self.projectiles.spawn(
                        caster,
                        source_hex,
                        None,
                        dest_hex,
                        *speed,
                        false,
                        false,
                        star,
                        context.to_string(),
                        effects.clone(),
                        None,
                    );
                    self.log.log_projectile_spawn(tick, caster, None, context);
                }
                EffectOutcome::hit(shots as f32, vec![])
            }

            // ---- resistance debuffs ----------------------------------

            EffectKind::Sunder {
                value,
                duration,
                is_percent,
            } => {
                let amount = value.at(star);
                let ticks = duration.at_ticks(star);
                let applied = if *is_percent { amount / 100.0 } else { amount };
                self.unit_mut(target)
                    .status
                    .apply_armor_shred(applied, ticks, *is_percent);
                self.log
                    .log_debuff_apply(tick, target, "sunder", round1(amount), ticks);
                EffectOutcome::hit(amount, vec![target])
            }

            EffectKind::Shred {
                value,
                duration,
                is_percent,
            } => {
                let amount = value.at(star);
                let ticks = duration.at_ticks(star);
                let applied = if *is_percent { amount / 100.0 } else { amount };
                self.unit_mut(target)
                    .status
                    .apply_mr_shred(applied, ticks, *is_percent);
                self.log
                    .log_debuff_apply(tick, target, "shred", round1(amount), ticks);
                EffectOutcome::hit(amount, vec![target])
            }

            // ---- crowd control ---------------------------------------

            EffectKind::Stun { duration } => {
                let ticks = duration.at_ticks(star);
                self.stun(target, ticks);
                EffectOutcome::hit(ticks as f32, vec![target])
            }

            EffectKind::Slow { value, duration } => {
                let amount = normalize_fraction(value.at(star));
                let ticks = duration.at_ticks(star);
                self.unit_mut(target).status.apply_slow(amount, ticks);
                self.log
                    .log_debuff_apply(tick, target, "slow", round1(amount * 100.0), ticks);
                EffectOutcome::hit(amount, vec![target])
            }

            EffectKind::Chill { value, duration } => {
                let amount = normalize_fraction(value.at(star));
                let ticks = duration.at_ticks(star);
                self.unit_mut(target).status.apply_chill(caster, amount, ticks);
                self.log
                    .log_debuff_apply(tick, target, "chill", round1(amount * 100.0), ticks);
                EffectOutcome::hit(amount, vec![target])
            }

            EffectKind::Silence { duration } => {
                let ticks = duration.at_ticks(star);
                self.unit_mut(target).status.apply_silence(ticks);
                self.log.log_debuff_apply(tick, target, "silence", 0.0, ticks);
                EffectOutcome::hit(ticks as f32, vec![target])
            }

            EffectKind::Disarm { duration } => {
                let ticks = duration.at_ticks(star);
                self.unit_mut(target).status.apply_disarm(ticks);
                self.log.log_debuff_apply(tick, target, "disarm", 0.0, ticks);
                EffectOutcome::hit(ticks as f32, vec![target])
            }

            EffectKind::Knockback {
                distance,
                stun_ticks,
            } => {
                let push = distance.at_ticks(star);
                let moved = self.push_along_axis(caster, target, push as i32, false);
                if moved < push {
                    // collision with a wall or another unit stuns
                    let ticks = stun_ticks.at_ticks(star);
                    if ticks > 0 {
                        self.stun(target, ticks);
                    }
                }
                EffectOutcome::hit(moved as f32, vec![target])
            }

            EffectKind::Pull { distance } => {
                let dist = distance.at_ticks(star);
                let moved = self.push_along_axis(caster, target, dist as i32, true);
                EffectOutcome::hit(moved as f32, vec![target])
            }

            EffectKind::Taunt { duration } => {
                let ticks = duration.at_ticks(star);
                {
                    let unit = self.unit_mut(target);
                    unit.status.apply_taunt(caster, ticks);
                    unit.target = Some(caster);
                }
                self.log.log_debuff_apply(tick, target, "taunt", 0.0, ticks);
                EffectOutcome::hit(ticks as f32, vec![target])
            }

            // ---- support ---------------------------------------------

            EffectKind::Heal {
                value,
                scaling,
                target: recipient,
            } => {
                let who = self.pick(*recipient, caster, target);
                let amount = self.scaled(value, *scaling, star, caster, who);
                let healed = self.unit_mut(who).apply_heal(amount);
                let hp_after = self.unit(who).stats.current_hp;
                self.log
                    .log_heal(tick, who, Some(caster), round1(healed), round1(hp_after));
                EffectOutcome::hit(healed, vec![who])
            }

            EffectKind::HealOverTime {
                value,
                duration,
                interval,
                scaling,
                target: recipient,
            } => {
                let who = self.pick(*recipient, caster, target);
                let pulse = self.scaled(value, *scaling, star, caster, who);
                let ticks = duration.at_ticks(star);
                let interval = (*interval).max(1);
                self.unit_mut(who).status.hots.push(crate::units::status::Hot {
                    heal: pulse,
                    remaining: ticks,
                    interval,
                    until_pulse: interval,
                    source: caster,
                });
                EffectOutcome::hit(pulse, vec![who])
            }

            EffectKind::Shield {
                value,
                duration,
                scaling,
                target: recipient,
            } => {
                let who = self.pick(*recipient, caster, target);
                let amount = self.scaled(value, *scaling, star, caster, who);
                let ticks = duration.at_ticks(star);
                self.unit_mut(who).status.add_shield(amount, ticks);
                self.log.log_buff_apply(tick, who, "shield", ticks);
                EffectOutcome::hit(amount, vec![who])
            }

            EffectKind::ShieldSelf {
                value,
                duration,
                scaling,
            } => {
                let amount = self.scaled(value, *scaling, star, caster, caster);
                let ticks = duration.at_ticks(star);
                self.unit_mut(caster).status.add_shield(amount, ticks);
                self.log.log_buff_apply(tick, caster, "shield", ticks);
                EffectOutcome::hit(amount, vec![caster])
            }

            EffectKind::Buff {
                stat,
                value,
                duration,
                is_percent,
                target: recipient,
            } => {
                let who = self.pick(*recipient, caster, target);
                let ticks = duration.at_ticks(star);
                self.grant_buff(who, *stat, value.at(star), *is_percent, ticks, false, context);
                EffectOutcome::hit(value.at(star), vec![who])
            }

            EffectKind::BuffTeam {
                stat,
                value,
                duration,
                is_percent,
            } => {
                let allies = self.living_allies_of(self.unit(caster).team);
                let ticks = duration.at_ticks(star);
                for ally in &allies {
                    self.grant_buff(*ally, *stat, value.at(star), *is_percent, ticks, false, context);
                }
                EffectOutcome::hit(value.at(star), allies)
            }

            EffectKind::DecayingBuff {
                stat,
                value,
                duration,
                is_percent,
                target: recipient,
            } => {
                let who = self.pick(*recipient, caster, target);
                let ticks = duration.at_ticks(star);
                self.grant_buff(who, *stat, value.at(star), *is_percent, ticks, true, context);
                EffectOutcome::hit(value.at(star), vec![who])
            }

            EffectKind::StackingBuff {
                stat,
                value,
                cap,
                group,
            } => {
                let key = group
                    .clone()
                    .unwrap_or_else(|| format!("stack_{}", stat_key(*stat)));
                let amount = value.at(star);
                let unit = self.unit_mut(caster);
                let counter = unit.stack_counters.entry(key).or_insert(0.0);
                let grant = amount.min((*cap - *counter).max(0.0));
                if grant <= 0.0 {
                    return EffectOutcome::fizzle();
                }
                *counter += grant;
                unit.stats.add_flat(*stat, grant);
                EffectOutcome::hit(grant, vec![caster])
            }

            EffectKind::ManaGrant {
                value,
                target: recipient,
            } => {
                let who = self.pick(*recipient, caster, target);
                let amount = value.at(star);
                self.unit_mut(who).stats.add_mana(amount);
                let after = self.unit(who).stats.current_mana;
                self.log
                    .log_mana_gain(tick, who, round1(amount), round1(after));
                EffectOutcome::hit(amount, vec![who])
            }

            EffectKind::Cleanse { target: recipient } => {
                let who = self.pick(*recipient, caster, target);
                let removed = self.unit_mut(who).status.cleanse();
                if removed == 0 {
                    EffectOutcome::fizzle()
                } else {
                    EffectOutcome::hit(removed as f32, vec![who])
                }
            }

            EffectKind::Wound { value, duration } => {
                let amount = normalize_fraction(value.at(star));
                let ticks = duration.at_ticks(star);
                self.unit_mut(target).status.apply_wound(amount, ticks);
                self.log
                    .log_debuff_apply(tick, target, "wound", round1(amount * 100.0), ticks);
                EffectOutcome::hit(amount, vec![target])
            }

            // ---- movement --------------------------------------------

            EffectKind::Dash {} => {
                let moved = self.blink_adjacent(caster, target);
                if moved {
                    EffectOutcome::hit(1.0, vec![caster])
                } else {
                    EffectOutcome::fizzle()
                }
            }

            // ---- special / meta --------------------------------------

            EffectKind::EffectGroup { effects } => {
                let mut outcome = EffectOutcome::fizzle();
                for inner in effects {
                    let result = self.apply_effect(inner, caster, target, star, context);
                    outcome.success |= result.success;
                    outcome.value += result.value;
                    for id in result.affected {
                        if !outcome.affected.contains(&id) {
                            outcome.affected.push(id);
                        }
                    }
                }
                outcome
            }

            EffectKind::CreateZone {
                radius,
                duration,
                interval,
                effect,
            } => {
                let anchor = self.unit(target).position;
                let ticks = duration.at_ticks(star);
                let interval = (*interval).max(1);
                self.zones.push(Zone {
                    hexes: anchor.hexes_in_range(*radius),
                    effect: (**effect).clone(),
                    caster,
                    star,
                    remaining: ticks,
                    interval,
                    // first pulse lands on the next tick, then every interval
                    until_pulse: 1,
                });
                EffectOutcome::hit(ticks as f32, vec![])
            }

            EffectKind::IntervalTrigger {
                interval,
                duration,
                effects,
            } => {
                let ticks = duration.at_ticks(star);
                let interval = (*interval).max(1);
                self.schedules.push(ScheduledEffect {
                    caster,
                    target,
                    effects: effects.clone(),
                    star,
                    remaining: ticks,
                    interval,
                    until_pulse: interval,
                });
                EffectOutcome::hit(ticks as f32, vec![target])
            }

            EffectKind::PermanentStack { stat, value } => {
                let amount = value.at(star);
                self.unit_mut(caster).stats.add_flat(*stat, amount);
                EffectOutcome::hit(amount, vec![caster])
            }

            EffectKind::ManaReave { value } => {
                let surcharge = normalize_fraction(value.at(star));
                self.unit_mut(target).status.mana_reave_pct = surcharge;
                self.log
                    .log_debuff_apply(tick, target, "mana_reave", round1(surcharge * 100.0), 0);
                EffectOutcome::hit(surcharge, vec![target])
            }

            EffectKind::ReplaceAttacks { count, effects } => {
                let n = count.at_ticks(star).max(1);
                self.unit_mut(caster).empowered = Some(EmpoweredAttacks {
                    remaining: n,
                    effects: effects.clone(),
                });
                EffectOutcome::hit(n as f32, vec![caster])
            }

            EffectKind::Transform { ability } => {
                if !self.abilities.contains_key(ability) {
                    return EffectOutcome::fizzle();
                }
                self.unit_mut(caster).ability = Some(ability.clone());
                EffectOutcome::hit(0.0, vec![caster])
            }

            EffectKind::TransformAfterCasts { casts, ability } => {
                if !self.abilities.contains_key(ability) {
                    return EffectOutcome::fizzle();
                }
                self.unit_mut(caster).pending_transform = Some((*casts, ability.clone()));
                EffectOutcome::hit(*casts as f32, vec![caster])
            }

            EffectKind::EscalatingAbility { amp_per_cast } => {
                self.unit_mut(caster).stats.add_flat(Stat::DamageAmp, *amp_per_cast);
                EffectOutcome::hit(*amp_per_cast, vec![caster])
            }
        }
    }

    // Dispatcher helpers

    fn scaled(
        &self,
        value: &crate::abilities::scaling::StarValue,
        scaling: Option<crate::abilities::scaling::ScalingKey>,
        star: StarLevel,
        caster: UnitId,
        target: UnitId,
    ) -> f32 {
        scaled_value(
            value,
            scaling,
            star,
            self.unit(caster),
            Some(self.unit(target)),
        )
    }

    fn pick(&self, recipient: EffectRecipient, caster: UnitId, target: UnitId) -> UnitId {
        match recipient {
            EffectRecipient::Caster => caster,
            EffectRecipient::Target => target,
        }
    }

    fn stun(&mut self, target: UnitId, ticks: Tick) {
        let from = self.unit(target).state.current;
        self.unit_mut(target).state.apply_stun(ticks);
        if from != crate::units::state::UnitState::Stunned && self.unit(target).state.is_stunned() {
            self.log.log_state_change(
                self.current_tick,
                target,
                from.name(),
                crate::units::state::UnitState::Stunned.name(),
            );
        }
        self.log
            .log_debuff_apply(self.current_tick, target, "stun", 0.0, ticks);
    }

    fn grant_buff(
        &mut self,
        who: UnitId,
        stat: Stat,
        value: f32,
        is_percent: bool,
        duration: Tick,
        decaying: bool,
        context: &str,
    ) {
        let id = format!("{}_{}", context, stat_key(stat));
        let mut buff = Buff::new(
            id.clone(),
            vec![StatDelta {
                stat,
                value,
                is_percent,
            }],
            duration,
        );
        buff.decaying = decaying;
        buff.policy = StackPolicy::Refresh;
        let added = self.unit_mut(who).add_buff(buff);
        if added {
            self.log.log_buff_apply(self.current_tick, who, &id, duration);
        }
    }

    /// Displace `target` up to `distance` hexes along the caster->target
    /// axis (inverted for pulls). Returns the hexes actually moved.
    fn push_along_axis(
        &mut self,
        caster: UnitId,
        target: UnitId,
        distance: i32,
        toward_caster: bool,
    ) -> u32 {
        let caster_pt = self.unit(caster).position.to_cartesian();
        let target_pt = self.unit(target).position.to_cartesian();
        let mut axis = target_pt - caster_pt;
        if axis.length_squared() < 1e-6 {
            return 0;
        }
        axis = axis.normalize();
        if toward_caster {
            axis = -axis;
        }

        let start = self.unit(target).position;
        let mut current = start;
        let mut moved = 0u32;
        for _ in 0..distance.max(0) {
            if toward_caster && current.distance(&self.unit(caster).position) <= 1 {
                break;
            }
            let next = HexCoord::from_cartesian(current.to_cartesian() + axis);
            if next == current || !self.grid.is_walkable(next) {
                break;
            }
            current = next;
            moved += 1;
        }

        if moved > 0 && self.grid.relocate(target, current) {
            self.unit_mut(target).position = current;
            self.log.log_move(
                self.current_tick,
                target,
                (start.q, start.r),
                (current.q, current.r),
            );
        }
        moved
    }

    /// Teleport `caster` to a free hex adjacent to `target`, widening the
    /// search ring when every neighbor is taken. Returns false when no
    /// destination exists.
    fn blink_adjacent(&mut self, caster: UnitId, target: UnitId) -> bool {
        let from = self.unit(caster).position;
        let around = self.unit(target).position;

        for ring in 1..=3u32 {
            let mut candidates: Vec<HexCoord> = around
                .hexes_in_range(ring)
                .into_iter()
                .filter(|h| around.distance(h) == ring && self.grid.is_walkable(*h))
                .collect();
            candidates.sort_by_key(|h| (from.distance(h), h.q, h.r));
            if let Some(dest) = candidates.first().copied() {
                if self.grid.relocate(caster, dest) {
                    self.unit_mut(caster).position = dest;
                    self.log
                        .log_move(self.current_tick, caster, (from.q, from.r), (dest.q, dest.r));
                    return true;
                }
            }
        }
        false
    }
}

/// Values above 1 are percent units (30 -> 0.30); at or below 1 they are
/// already fractions.
fn normalize_fraction(value: f32) -> f32 {
    if value > 1.0 {
        (value / 100.0).min(1.0)
    } else {
        value.max(0.0)
    }
}

fn stat_key(stat: Stat) -> String {
    serde_json::to_string(&stat)
        .unwrap_or_default()
        .trim_matches('"')
        .to_string()
}
