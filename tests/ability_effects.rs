//! Effect semantics exercised through the engine: star scaling, crowd
//! control, support effects and the item/trait plumbing.

use hexarena::abilities::ability::AbilityDef;
use hexarena::abilities::effect::EffectKind;
use hexarena::battle::hex::HexCoord;
use hexarena::core::types::UnitId;
use hexarena::items::ItemDef;
use hexarena::sim::events::EventKind;
use hexarena::sim::simulation::{Simulation, TickOutcome};
use hexarena::traits::TraitDef;
use hexarena::units::state::UnitState;
use hexarena::units::stats::BaseStats;
use hexarena::units::unit::UnitDef;

fn plain(name: &str, hp: f32) -> UnitDef {
    let mut stats = BaseStats::default();
    stats.hp = hp;
    stats.attack_damage = 0.0;
    stats.armor = 0.0;
    stats.magic_resist = 0.0;
    stats.crit_chance = 0.0;
    UnitDef {
        name: name.into(),
        stats,
        ..UnitDef::default()
    }
}

fn effect(json: &str) -> EffectKind {
    serde_json::from_str(json).unwrap()
}

fn duo(seed: u64) -> (Simulation, UnitId, UnitId) {
    let mut sim = Simulation::new(seed);
    let a = sim.add_unit(&plain("alpha", 1000.0), 0, HexCoord::new(0, 0), 1).unwrap();
    let b = sim.add_unit(&plain("beta", 1000.0), 1, HexCoord::new(3, 0), 1).unwrap();
    (sim, a, b)
}

#[test]
fn star_scaling_is_symmetric() {
    // value = [v, 2v, 3v] with no stat scaling deals k*v at star k
    let damage = effect(r#"{"type": "damage", "damage_type": "magical", "value": [100, 200, 300]}"#);
    for star in 1..=3u8 {
        let mut sim = Simulation::new(1);
        let a = sim.add_unit(&plain("alpha", 1000.0), 0, HexCoord::new(0, 0), star).unwrap();
        let b = sim.add_unit(&plain("beta", 1000.0), 1, HexCoord::new(3, 0), 1).unwrap();
        let before = sim.unit(b).stats.current_hp;
        sim.apply_effect(&damage, a, b, star, "test");
        let dealt = before - sim.unit(b).stats.current_hp;
        assert!(
            (dealt - 100.0 * star as f32).abs() < 0.01,
            "star {} dealt {}",
            star,
            dealt
        );
    }
}

#[test]
fn execute_kills_only_below_threshold() {
    let (mut sim, a, b) = duo(1);
    let exec = effect(r#"{"type": "execute", "threshold": 15}"#);

    let outcome = sim.apply_effect(&exec, a, b, 1, "test");
    assert!(!outcome.success, "full-health target survives");
    assert!(sim.unit(b).is_alive());

    sim.unit_mut(b).stats.current_hp = 100.0; // 10%
    let outcome = sim.apply_effect(&exec, a, b, 1, "test");
    assert!(outcome.success);
    assert!(!sim.unit(b).is_alive());
    assert_eq!(sim.log.events_of_kind(EventKind::UnitDeath).len(), 1);
}

#[test]
fn sunder_refresh_takes_max_value_and_duration() {
    let (mut sim, a, b) = duo(1);
    sim.apply_effect(&effect(r#"{"type": "sunder", "value": 20, "duration": 60}"#), a, b, 1, "test");
    sim.apply_effect(&effect(r#"{"type": "sunder", "value": 15, "duration": 90}"#), a, b, 1, "test");

    let (pct, flat) = sim.unit(b).status.armor_shred();
    assert_eq!(pct, 0.0);
    assert_eq!(flat, 20.0);
    assert_eq!(sim.unit(b).status.armor_shred_flat.as_ref().unwrap().remaining, 90);
}

#[test]
fn knockback_into_occupied_hex_collision_stuns() {
    let mut sim = Simulation::new(1);
    let a = sim.add_unit(&plain("pusher", 1000.0), 0, HexCoord::new(0, 0), 1).unwrap();
    let b = sim.add_unit(&plain("pushed", 1000.0), 1, HexCoord::new(1, 0), 1).unwrap();
    // wall directly behind the push axis
    sim.add_unit(&plain("wall", 1000.0), 1, HexCoord::new(2, 0), 1).unwrap();

    sim.apply_effect(
        &effect(r#"{"type": "knockback", "distance": 2, "stun_ticks": 15}"#),
        a,
        b,
        1,
        "test",
    );

    assert_eq!(sim.unit(b).position, HexCoord::new(1, 0), "push was fully blocked");
    assert!(sim.unit(b).state.is_stunned(), "blocked knockback stuns");
}

#[test]
fn knockback_into_open_space_moves_the_target() {
    let (mut sim, a, b) = duo(1);
    sim.apply_effect(
        &effect(r#"{"type": "knockback", "distance": 2, "stun_ticks": 0}"#),
        a,
        b,
        1,
        "test",
    );
    assert_eq!(sim.unit(b).position, HexCoord::new(5, 0));
    assert_eq!(sim.grid.occupant(HexCoord::new(5, 0)), Some(b));
    assert!(!sim.unit(b).state.is_stunned());
}

#[test]
fn pull_drags_toward_the_caster() {
    let (mut sim, a, b) = duo(1);
    sim.apply_effect(&effect(r#"{"type": "pull", "distance": 2}"#), a, b, 1, "test");
    assert_eq!(sim.unit(b).position, HexCoord::new(1, 0));
}

#[test]
fn shield_absorbs_before_hp() {
    let (mut sim, a, b) = duo(1);
    sim.apply_effect(&effect(r#"{"type": "shield", "value": 150, "duration": 300}"#), a, b, 1, "test");

    let before = sim.unit(b).stats.current_hp;
    sim.apply_effect(
        &effect(r#"{"type": "damage", "damage_type": "magical", "value": 100}"#),
        a,
        b,
        1,
        "test",
    );
    assert_eq!(sim.unit(b).stats.current_hp, before, "shield soaked the hit");
    assert!((sim.unit(b).status.total_shield() - 50.0).abs() < 0.01);

    sim.apply_effect(
        &effect(r#"{"type": "damage", "damage_type": "magical", "value": 100}"#),
        a,
        b,
        1,
        "test",
    );
    assert!((before - sim.unit(b).stats.current_hp - 50.0).abs() < 0.01);
}

#[test]
fn heal_respects_wound_at_engine_level() {
    let (mut sim, a, b) = duo(1);
    // wound the healer's ally? the wound sits on the heal recipient
    sim.unit_mut(b).stats.take_damage(500.0);
    sim.apply_effect(&effect(r#"{"type": "wound", "value": 33, "duration": 300}"#), a, b, 1, "test");

    let before = sim.unit(b).stats.current_hp;
    let outcome = sim.apply_effect(&effect(r#"{"type": "heal", "value": 100}"#), a, b, 1, "test");
    assert!((outcome.value - 67.0).abs() < 0.01);
    assert!((sim.unit(b).stats.current_hp - before - 67.0).abs() < 0.01);
}

#[test]
fn cleanse_strips_crowd_control() {
    let (mut sim, a, b) = duo(1);
    sim.apply_effect(&effect(r#"{"type": "slow", "value": 30, "duration": 300}"#), a, b, 1, "test");
    sim.apply_effect(&effect(r#"{"type": "silence", "duration": 300}"#), a, b, 1, "test");
    sim.apply_effect(&effect(r#"{"type": "burn", "value": 10, "duration": 300}"#), a, b, 1, "test");

    let outcome = sim.apply_effect(&effect(r#"{"type": "cleanse"}"#), b, b, 1, "test");
    assert!(outcome.success);
    assert!(!sim.unit(b).status.is_silenced());
    assert_eq!(sim.unit(b).status.attack_speed_reduction(), 0.0);
}

#[test]
fn taunt_forces_the_target_onto_the_caster() {
    let mut sim = Simulation::new(1);
    let tank = sim.add_unit(&plain("tank", 2000.0), 0, HexCoord::new(0, 0), 1).unwrap();
    let carry = sim.add_unit(&plain("carry", 500.0), 0, HexCoord::new(1, 0), 1).unwrap();
    let mut striker_def = plain("striker", 800.0);
    striker_def.stats.attack_damage = 50.0;
    let striker = sim.add_unit(&striker_def, 1, HexCoord::new(2, 0), 1).unwrap();

    // the striker would naturally attack the adjacent carry
    sim.tick();
    assert_eq!(sim.unit(striker).target, Some(carry));

    sim.apply_effect(&effect(r#"{"type": "taunt", "duration": 90}"#), tank, striker, 1, "test");
    sim.tick();
    assert_eq!(sim.unit(striker).target, Some(tank));
}

#[test]
fn replace_attacks_swaps_the_hit_effects() {
    let mut sim = Simulation::new(1);
    let mut attacker_def = plain("attacker", 1000.0);
    attacker_def.stats.attack_damage = 50.0;
    attacker_def.stats.attack_speed = 1.0;
    let a = sim.add_unit(&attacker_def, 0, HexCoord::new(0, 0), 1).unwrap();
    let b = sim.add_unit(&plain("dummy", 10_000.0), 1, HexCoord::new(1, 0), 1).unwrap();

    sim.apply_effect(
        &effect(
            r#"{"type": "replace_attacks", "count": 2,
                "effects": [{"type": "damage", "damage_type": "magical", "value": 200}]}"#,
        ),
        a,
        a,
        1,
        "test",
    );

    for _ in 0..65 {
        sim.tick();
    }

    // first two attacks dealt 200 magic, later ones 50 physical
    let hits: Vec<(String, f64)> = sim
        .log
        .events_of_kind(EventKind::UnitDamage)
        .iter()
        .filter(|e| e.unit_id == Some(b.0))
        .map(|e| {
            (
                e.data["damage_type"].as_str().unwrap().to_string(),
                e.data["damage"].as_f64().unwrap(),
            )
        })
        .collect();
    assert!(hits.len() >= 3);
    assert_eq!(hits[0], ("MAGICAL".to_string(), 200.0));
    assert_eq!(hits[1], ("MAGICAL".to_string(), 200.0));
    assert_eq!(hits[2], ("PHYSICAL".to_string(), 50.0));
    assert!(sim.unit(a).empowered.is_none());
}

#[test]
fn splash_damage_hits_adjacent_enemies() {
    let mut sim = Simulation::new(1);
    let a = sim.add_unit(&plain("caster", 1000.0), 0, HexCoord::new(0, 4), 1).unwrap();
    let main = sim.add_unit(&plain("main", 1000.0), 1, HexCoord::new(3, 0), 1).unwrap();
    let near = sim.add_unit(&plain("near", 1000.0), 1, HexCoord::new(4, 0), 1).unwrap();
    let far = sim.add_unit(&plain("far", 1000.0), 1, HexCoord::new(0, 7), 1).unwrap();

    sim.apply_effect(
        &effect(r#"{"type": "splash_damage", "value": 200, "splash_percent": 0.5, "radius": 1}"#),
        a,
        main,
        1,
        "test",
    );

    assert!((1000.0 - sim.unit(main).stats.current_hp - 200.0).abs() < 0.01);
    assert!((1000.0 - sim.unit(near).stats.current_hp - 100.0).abs() < 0.01);
    assert_eq!(sim.unit(far).stats.current_hp, 1000.0);
}

#[test]
fn ricochet_chains_to_nearest_unhit_enemy() {
    let mut sim = Simulation::new(1);
    let a = sim.add_unit(&plain("caster", 1000.0), 0, HexCoord::new(0, 4), 1).unwrap();
    let first = sim.add_unit(&plain("first", 1000.0), 1, HexCoord::new(3, 0), 1).unwrap();
    let second = sim.add_unit(&plain("second", 1000.0), 1, HexCoord::new(4, 0), 1).unwrap();
    let outside = sim.add_unit(&plain("outside", 1000.0), 1, HexCoord::new(0, 7), 1).unwrap();

    let outcome = sim.apply_effect(
        &effect(r#"{"type": "ricochet", "value": 100, "chains": 1, "radius": 2}"#),
        a,
        first,
        1,
        "test",
    );

    assert_eq!(outcome.affected, vec![first, second]);
    assert!((1000.0 - sim.unit(first).stats.current_hp - 100.0).abs() < 0.01);
    assert!((1000.0 - sim.unit(second).stats.current_hp - 100.0).abs() < 0.01);
    assert_eq!(sim.unit(outside).stats.current_hp, 1000.0);
}

#[test]
fn dodged_attack_grants_nothing() {
    let mut sim = Simulation::new(17);
    let mut attacker_def = plain("attacker", 1000.0);
    attacker_def.stats.attack_damage = 100.0;
    attacker_def.stats.attack_speed = 1.0;
    attacker_def.stats.lifesteal = 0.5;
    let a = sim.add_unit(&attacker_def, 0, HexCoord::new(0, 0), 1).unwrap();

    let mut dodger_def = plain("dodger", 1000.0);
    dodger_def.stats.dodge_chance = 1.0;
    let b = sim.add_unit(&dodger_def, 1, HexCoord::new(1, 0), 1).unwrap();

    // the dodger never swings back, so any mana it gains must come from
    // taking hits - which dodges suppress
    sim.unit_mut(b).status.apply_disarm(2000);
    sim.unit_mut(a).stats.take_damage(500.0); // room to observe lifesteal
    for _ in 0..40 {
        sim.tick();
    }

    let attacks = sim.log.events_of_kind(EventKind::UnitAttack);
    let a_attacks: Vec<_> = attacks
        .iter()
        .filter(|e| e.unit_id == Some(a.0))
        .collect();
    assert!(!a_attacks.is_empty());
    for attack in &a_attacks {
        assert_eq!(attack.data["dodged"], serde_json::json!(true));
    }
    assert_eq!(sim.unit(b).stats.current_hp, 1000.0);
    assert_eq!(sim.unit(b).stats.current_mana, 0.0, "no mana from dodged hits");
    assert_eq!(sim.unit(a).stats.current_hp, 500.0, "no lifesteal from dodged hits");
}

#[test]
fn area_cone_ability_hits_the_wedge() {
    let mut sim = Simulation::new(1);
    sim.register_ability(
        "breath",
        serde_json::from_str::<AbilityDef>(
            r#"{"name": "Breath", "mana_cost": 100, "cast_time": 1, "delivery": "area",
                "target": "nearest",
                "aoe": {"shape": "cone", "angle": 90, "range": 3, "anchor": "caster"},
                "effects": [{"type": "damage", "damage_type": "magical", "value": 100}]}"#,
        )
        .unwrap(),
    );

    let mut caster_def = plain("dragon", 1000.0);
    caster_def.ability = Some("breath".into());
    caster_def.stats.start_mana = 100.0;
    sim.add_unit(&caster_def, 0, HexCoord::new(0, 0), 1).unwrap();
    let ahead = sim.add_unit(&plain("ahead", 1000.0), 1, HexCoord::new(1, 0), 1).unwrap();
    let also_ahead = sim.add_unit(&plain("also", 1000.0), 1, HexCoord::new(2, 0), 1).unwrap();
    let behind = sim.add_unit(&plain("behind", 1000.0), 1, HexCoord::new(0, 7), 1).unwrap();

    sim.tick();

    assert!(sim.unit(ahead).stats.current_hp < 1000.0);
    assert!(sim.unit(also_ahead).stats.current_hp < 1000.0);
    assert_eq!(sim.unit(behind).stats.current_hp, 1000.0);
}

#[test]
fn point_projectile_with_aoe_detonates_on_last_hex() {
    let mut sim = Simulation::new(1);
    sim.register_ability(
        "mortar",
        serde_json::from_str::<AbilityDef>(
            r#"{"name": "Mortar", "mana_cost": 100, "cast_time": 1, "delivery": "projectile",
                "projectile": {"speed": 0.5, "homing": false, "can_miss": false},
                "aoe": {"shape": "circle", "radius": 1},
                "effects": [{"type": "damage", "damage_type": "magical", "value": 150}]}"#,
        )
        .unwrap(),
    );

    let mut caster_def = plain("sapper", 1000.0);
    caster_def.ability = Some("mortar".into());
    caster_def.stats.start_mana = 100.0;
    let caster = sim.add_unit(&caster_def, 0, HexCoord::new(0, 0), 1).unwrap();
    let doomed = sim.add_unit(&plain("doomed", 100.0), 1, HexCoord::new(4, 0), 1).unwrap();
    let bystander = sim.add_unit(&plain("bystander", 1000.0), 1, HexCoord::new(5, 0), 1).unwrap();

    // the doomed target dies while the shell is in the air; the bystander
    // is pinned in place so it is still beside the impact hex
    sim.apply_effect(&effect(r#"{"type": "burn", "value": 600, "duration": 300}"#), caster, doomed, 1, "t");
    sim.apply_effect(&effect(r#"{"type": "stun", "duration": 3000}"#), caster, bystander, 1, "t");

    for _ in 0..20 {
        if sim.tick() == TickOutcome::Done {
            break;
        }
    }

    // can_miss = false: the AoE payload still resolves around the
    // launch-time hex and catches the bystander
    assert!(sim.unit(bystander).stats.current_hp < 1000.0);
    assert_eq!(sim.log.events_of_kind(EventKind::ProjectileHit).len(), 1);
}

#[test]
fn item_conditional_amp_applies_in_combat() {
    let mut sim = Simulation::new(1);
    let mut attacker_def = plain("slayer", 1000.0);
    attacker_def.stats.attack_damage = 100.0;
    attacker_def.stats.attack_speed = 1.0;
    let a = sim.add_unit(&attacker_def, 0, HexCoord::new(0, 0), 1).unwrap();
    let b = sim.add_unit(&plain("giant", 5000.0), 1, HexCoord::new(1, 0), 1).unwrap();

    let item: ItemDef = serde_json::from_str(
        r#"{
            "name": "Giant Slayer",
            "conditional_effects": [{
                "condition": {"type": "target_max_hp", "operator": ">", "value": 1600},
                "effect": {"type": "damage_amp", "value": 0.2}
            }]
        }"#,
    )
    .unwrap();
    sim.equip_item(a, &item).unwrap();

    sim.tick();

    let hit = sim
        .log
        .events_of_kind(EventKind::UnitDamage)
        .iter()
        .find(|e| e.unit_id == Some(b.0))
        .map(|e| e.data["damage"].as_f64().unwrap())
        .unwrap();
    assert!((hit - 120.0).abs() < 0.1, "100 AD amped 20%, got {}", hit);
}

#[test]
fn trait_bonus_reaches_holders_at_battle_start() {
    let mut sim = Simulation::new(1);
    let mut knight_def = plain("knight", 1000.0);
    knight_def.traits = vec!["steelguard".into()];
    let k1 = sim.add_unit(&knight_def, 0, HexCoord::new(0, 0), 1).unwrap();
    let mut knight2 = knight_def.clone();
    knight2.name = "paladin".into();
    sim.add_unit(&knight2, 0, HexCoord::new(1, 0), 1).unwrap();
    sim.add_unit(&plain("enemy", 1000.0), 1, HexCoord::new(0, 7), 1).unwrap();

    let steelguard: TraitDef = serde_json::from_str(
        r#"{
            "name": "Steelguard",
            "thresholds": {
                "2": {"effects": [{"type": "stat_bonus", "stat": "armor", "value": 40}]}
            }
        }"#,
    )
    .unwrap();
    sim.attach_traits([("steelguard".to_string(), steelguard)]);

    let armor_before = sim.unit(k1).stats.armor();
    sim.tick();
    assert_eq!(sim.unit(k1).stats.armor(), armor_before + 40.0);
}

#[test]
fn stun_interrupts_and_restores() {
    let mut sim = Simulation::new(1);
    let mut attacker_def = plain("bruiser", 1000.0);
    attacker_def.stats.attack_damage = 10.0;
    let a = sim.add_unit(&attacker_def, 0, HexCoord::new(0, 0), 1).unwrap();
    let b = sim.add_unit(&plain("victim", 1000.0), 1, HexCoord::new(1, 0), 1).unwrap();

    sim.tick(); // both settle into Attacking
    assert_eq!(sim.unit(a).state.current, UnitState::Attacking);

    sim.apply_effect(&effect(r#"{"type": "stun", "duration": 10}"#), b, a, 1, "test");
    assert_eq!(sim.unit(a).state.current, UnitState::Stunned);

    for _ in 0..12 {
        sim.tick();
    }
    assert_eq!(sim.unit(a).state.current, UnitState::Attacking, "prior state restored");
}

#[test]
fn mana_grant_fills_the_bar() {
    let (mut sim, a, b) = duo(1);
    let outcome = sim.apply_effect(
        &effect(r#"{"type": "mana_grant", "value": 40}"#),
        a,
        b,
        1,
        "test",
    );
    assert!(outcome.success);
    assert_eq!(sim.unit(b).stats.current_mana, 40.0);
    assert_eq!(sim.log.events_of_kind(EventKind::UnitManaGain).len(), 1);
}

#[test]
fn stacking_buff_respects_its_cap() {
    let (mut sim, a, _) = duo(1);
    let stack = effect(
        r#"{"type": "stacking_buff", "stat": "attack_damage", "value": 10, "cap": 25, "group": "resolve"}"#,
    );
    let base = sim.unit(a).stats.attack_damage();

    sim.apply_effect(&stack, a, a, 1, "test");
    sim.apply_effect(&stack, a, a, 1, "test");
    sim.apply_effect(&stack, a, a, 1, "test"); // clipped to the cap
    let outcome = sim.apply_effect(&stack, a, a, 1, "test");

    assert!(!outcome.success, "cap reached");
    assert_eq!(sim.unit(a).stats.attack_damage(), base + 25.0);
}

#[test]
fn zone_pulses_damage_units_standing_in_it() {
    let (mut sim, a, b) = duo(1);
    sim.apply_effect(
        &effect(
            r#"{"type": "create_zone", "radius": 1, "duration": 120, "interval": 30,
                "effect": {"type": "damage", "damage_type": "magical", "value": 50}}"#,
        ),
        a,
        b,
        1,
        "test",
    );

    for _ in 0..95 {
        sim.tick();
    }
    // the victim wanders toward the caster, taking at least one pulse on
    // the way out of the zone
    assert!(sim.unit(b).stats.current_hp < 1000.0);
}

#[test]
fn transform_after_casts_swaps_the_ability() {
    let mut sim = Simulation::new(1);
    sim.register_ability(
        "spark",
        serde_json::from_str::<AbilityDef>(
            r#"{"name": "Spark", "mana_cost": 100, "cast_time": 1,
                "effects": [
                    {"type": "damage", "damage_type": "magical", "value": 10},
                    {"type": "transform_after_casts", "casts": 1, "ability": "nova"}
                ]}"#,
        )
        .unwrap(),
    );
    sim.register_ability(
        "nova",
        serde_json::from_str::<AbilityDef>(
            r#"{"name": "Nova", "mana_cost": 100, "cast_time": 1,
                "effects": [{"type": "damage", "damage_type": "magical", "value": 400}]}"#,
        )
        .unwrap(),
    );

    let mut caster_def = plain("adept", 1000.0);
    caster_def.ability = Some("spark".into());
    caster_def.stats.start_mana = 100.0;
    let caster = sim.add_unit(&caster_def, 0, HexCoord::new(0, 0), 1).unwrap();
    sim.add_unit(&plain("dummy", 10_000.0), 1, HexCoord::new(1, 0), 1).unwrap();

    for _ in 0..5 {
        sim.tick();
    }
    assert_eq!(sim.unit(caster).ability.as_deref(), Some("nova"));
}
