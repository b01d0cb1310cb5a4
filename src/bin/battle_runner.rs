//! Headless battle runner
//!
//! Runs a demo battle with a built-in roster and prints the result as JSON
//! (or text) for batch analysers. Exits 0 on a completed battle, nonzero
//! on a configuration error.

use clap::Parser;
use serde::Serialize;

use hexarena::abilities::ability::AbilityDef;
use hexarena::battle::hex::HexCoord;
use hexarena::core::config::SimConfig;
use hexarena::core::error::Result;
use hexarena::sim::simulation::Simulation;
use hexarena::units::stats::BaseStats;
use hexarena::units::unit::UnitDef;

#[derive(Parser, Debug)]
#[command(name = "battle_runner")]
#[command(about = "Run a deterministic auto-battler combat simulation")]
struct Args {
    /// Random seed for deterministic runs
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Maximum ticks before the battle is called a draw
    #[arg(long, default_value_t = 3000)]
    max_ticks: u32,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,

    /// Write the full event log to this path
    #[arg(long)]
    log_path: Option<std::path::PathBuf>,

    /// Print every event to stderr as it is replayed
    #[arg(long, short = 'v')]
    verbose: bool,
}

#[derive(Serialize)]
struct RunSummary {
    winner_team: Option<u8>,
    total_ticks: u32,
    deaths_team_0: u32,
    deaths_team_1: u32,
    events: usize,
    seed: u64,
}

fn fireball() -> AbilityDef {
    serde_json::from_value(serde_json::json!({
        "name": "Fireball",
        "mana_cost": 100,
        "cast_time": [20, 18, 15],
        "delivery": "projectile",
        "projectile": {"speed": 2.0, "homing": true},
        "aoe": {"shape": "circle", "radius": 1},
        "effects": [
            {"type": "damage", "damage_type": "magical", "value": [200, 350, 600], "scaling": "ap"},
            {"type": "burn", "value": [20, 35, 50], "duration": 90}
        ]
    }))
    .expect("built-in ability is valid")
}

fn crushing_blow() -> AbilityDef {
    serde_json::from_value(serde_json::json!({
        "name": "Crushing Blow",
        "mana_cost": 100,
        "cast_time": 15,
        "effects": [
            {"type": "damage", "damage_type": "physical", "value": [150, 270, 480], "scaling": "ad"},
            {"type": "stun", "duration": [30, 30, 45]}
        ]
    }))
    .expect("built-in ability is valid")
}

fn unit(name: &str, hp: f32, ad: f32, attack_speed: f32, range: u32, ability: Option<&str>) -> UnitDef {
    let mut stats = BaseStats::default();
    stats.hp = hp;
    stats.attack_damage = ad;
    stats.attack_speed = attack_speed;
    stats.attack_range = range;
    UnitDef {
        name: name.into(),
        stats,
        ability: ability.map(|a| a.to_string()),
        ..UnitDef::default()
    }
}

fn run(args: &Args) -> Result<RunSummary> {
    let mut config = SimConfig::default();
    config.max_ticks = args.max_ticks;

    let mut sim = Simulation::with_config(args.seed, config)?;
    sim.register_ability("fireball", fireball());
    sim.register_ability("crushing_blow", crushing_blow());

    // team 0 spawns along the top edge, team 1 along the bottom
    sim.add_unit(&unit("warrior", 900.0, 60.0, 0.8, 1, Some("crushing_blow")), 0, HexCoord::new(2, 0), 1)?;
    sim.add_unit(&unit("archer", 550.0, 55.0, 1.0, 4, None), 0, HexCoord::new(3, 0), 1)?;
    sim.add_unit(&unit("mage", 500.0, 40.0, 0.7, 3, Some("fireball")), 0, HexCoord::new(4, 0), 1)?;

    sim.add_unit(&unit("warrior", 900.0, 60.0, 0.8, 1, Some("crushing_blow")), 1, HexCoord::new(-1, 7), 1)?;
    sim.add_unit(&unit("archer", 550.0, 55.0, 1.0, 4, None), 1, HexCoord::new(0, 7), 1)?;
    sim.add_unit(&unit("mage", 500.0, 40.0, 0.7, 3, Some("fireball")), 1, HexCoord::new(1, 7), 1)?;

    let result = sim.run()?;

    if args.verbose {
        for event in &sim.log.events {
            eprintln!("{}", serde_json::to_string(event)?);
        }
    }
    if let Some(path) = &args.log_path {
        sim.log.save(path)?;
    }

    Ok(RunSummary {
        winner_team: result.winner_team,
        total_ticks: result.total_ticks,
        deaths_team_0: result.deaths_per_team[0],
        deaths_team_1: result.deaths_per_team[1],
        events: sim.log.events.len(),
        seed: args.seed,
    })
}

fn main() {
    let args = Args::parse();

    match run(&args) {
        Ok(summary) => {
            if args.format == "text" {
                match summary.winner_team {
                    Some(team) => println!("Team {} wins after {} ticks", team, summary.total_ticks),
                    None => println!("Draw after {} ticks", summary.total_ticks),
                }
                println!(
                    "deaths: {} / {}  events: {}",
                    summary.deaths_team_0, summary.deaths_team_1, summary.events
                );
            } else {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&summary).expect("summary serializes")
                );
            }
        }
        Err(err) => {
            eprintln!("configuration error: {}", err);
            std::process::exit(1);
        }
    }
}
