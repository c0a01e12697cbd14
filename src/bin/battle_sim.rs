//! Headless Battle Simulator
//!
//! Runs a fully autopiloted battle and prints a JSON summary.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use saga_battle::battle::BattleEventType;
use saga_battle::{
    Battle, BattleError, BattleResult, ContentRegistry, PartyMemberSetup, PartySetup, Result,
    SeededRng,
};
use serde::Serialize;

/// Headless battle simulator - the whole party on autopilot
#[derive(Parser, Debug)]
#[command(name = "battle_sim")]
#[command(about = "Run a battle with every unit under AI control")]
struct Args {
    /// Content file to load
    #[arg(long, default_value = "data/content.toml")]
    content: PathBuf,

    /// Encounter id
    #[arg(long, default_value = "goblinFight")]
    encounter: String,

    /// Party as comma-separated character:level pairs
    #[arg(long, default_value = "scott:10,elysia:10")]
    party: String,

    /// AI strategy driving the party
    #[arg(long, default_value = "basic")]
    strategy: String,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Frames before giving up
    #[arg(long, default_value_t = 10_000)]
    max_frames: usize,

    /// Write the event log here as JSON lines
    #[arg(long)]
    log: Option<PathBuf>,
}

/// JSON output structure
#[derive(Serialize)]
struct Summary {
    encounter: String,
    result: Option<BattleResult>,
    cycles: u64,
    turns: usize,
    survivors: Vec<String>,
    seed: u64,
}

fn parse_party(roster: &str, strategy: &str) -> Result<PartySetup> {
    let mut members = Vec::new();
    for entry in roster.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (id, level) = entry.split_once(':').unwrap_or((entry, "10"));
        let level: u32 = level
            .parse()
            .map_err(|_| BattleError::InvalidConfig(format!("bad level in '{}'", entry)))?;
        members.push(PartyMemberSetup::new(id, level).with_autopilot(strategy));
    }
    if members.is_empty() {
        return Err(BattleError::InvalidConfig("party is empty".into()));
    }
    Ok(PartySetup::new(members))
}

fn run(args: &Args, seed: u64) -> Result<Summary> {
    let content = Arc::new(ContentRegistry::load(&args.content)?);
    let party = parse_party(&args.party, &args.strategy)?;
    let mut battle = Battle::new(
        content,
        &args.encounter,
        &party,
        Box::new(SeededRng::new(seed)),
    )?;

    let result = battle.run(args.max_frames)?;
    if result.is_none() {
        tracing::warn!(frames = args.max_frames, "battle did not finish");
    }

    if let Some(path) = &args.log {
        fs::write(path, battle.log().to_json_lines()?)?;
        tracing::info!(path = %path.display(), events = battle.log().len(), "event log written");
    }

    let survivors = battle
        .units()
        .filter(|(_, unit)| unit.is_alive())
        .map(|(_, unit)| unit.full_name().to_string())
        .collect();
    Ok(Summary {
        encounter: args.encounter.clone(),
        result,
        cycles: battle.timer(),
        turns: battle
            .log()
            .count(|e| matches!(e, BattleEventType::TurnStarted { .. })),
        survivors,
        seed,
    })
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("saga_battle=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(rand::random);

    match run(&args, seed).and_then(|summary| Ok(serde_json::to_string_pretty(&summary)?)) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("battle_sim: {}", e);
            std::process::exit(1);
        }
    }
}
