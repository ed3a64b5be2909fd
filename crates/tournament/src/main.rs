//! Tournament CLI
//!
//! Build a stage, simulate it, and report schedule, bracket and standings.

use anyhow::{bail, Context, Result};
use bracket_core::{BracketEngine, CompetitionMode, EngineConfig, Entrant, MemoryStore, Store};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::env;
use std::path::PathBuf;
use tournament::{SimConfig, Simulator, StageReport};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn print_usage() {
    println!("Tournament Stage Runner");
    println!();
    println!("Usage:");
    println!("  tournament round-robin <team>... [options]");
    println!("  tournament bracket <single|double> <team>... [options]");
    println!("  tournament report <report.json>");
    println!("  tournament check <store.json> [--config FILE] [--repair]");
    println!();
    println!("Options:");
    println!("  --teams N           Generate N teams instead of naming them");
    println!("  --config FILE       Engine configuration (TOML)");
    println!("  --seed S            Simulation seed (default 42)");
    println!("  --forfeit-rate R    Chance a simulated match is forfeited (default 0)");
    println!("  --shuffle           Shuffle seeding with the simulation seed");
    println!("  --no-sim            Build the stage without playing it");
    println!("  --name NAME         Stage name (default \"Stop 1\")");
    println!("  --out FILE          Save the stage report as JSON");
    println!("  --store FILE        Save the whole store snapshot as JSON");
    println!();
    println!("Logging is controlled with RUST_LOG (default: info).");
    println!();
    println!("Examples:");
    println!("  tournament round-robin Aces Dinkers Lobsters Volleys --seed 7");
    println!("  tournament bracket double --teams 12 --out stop1.json");
}

/// Options shared by the stage-building commands
#[derive(Debug)]
struct RunOptions {
    name: String,
    teams: Vec<String>,
    config: Option<PathBuf>,
    seed: u64,
    forfeit_rate: f64,
    shuffle: bool,
    simulate: bool,
    out: Option<PathBuf>,
    store: Option<PathBuf>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            name: "Stop 1".to_string(),
            teams: Vec::new(),
            config: None,
            seed: 42,
            forfeit_rate: 0.0,
            shuffle: false,
            simulate: true,
            out: None,
            store: None,
        }
    }
}

fn flag_value<'a>(args: &'a [String], i: usize, flag: &str) -> Result<&'a str> {
    args.get(i + 1)
        .map(|s| s.as_str())
        .with_context(|| format!("{} requires a value", flag))
}

fn parse_options(args: &[String]) -> Result<RunOptions> {
    let mut options = RunOptions::default();
    let mut generated: Option<usize> = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--teams" | "-t" => {
                let value = flag_value(args, i, "--teams")?;
                generated = Some(value.parse().with_context(|| format!("invalid team count: {}", value))?);
                i += 1;
            }
            "--config" | "-c" => {
                options.config = Some(PathBuf::from(flag_value(args, i, "--config")?));
                i += 1;
            }
            "--seed" | "-s" => {
                let value = flag_value(args, i, "--seed")?;
                options.seed = value.parse().with_context(|| format!("invalid seed: {}", value))?;
                i += 1;
            }
            "--forfeit-rate" => {
                let value = flag_value(args, i, "--forfeit-rate")?;
                options.forfeit_rate = value
                    .parse()
                    .with_context(|| format!("invalid forfeit rate: {}", value))?;
                if !(0.0..=1.0).contains(&options.forfeit_rate) {
                    bail!("forfeit rate must be between 0 and 1");
                }
                i += 1;
            }
            "--name" | "-n" => {
                options.name = flag_value(args, i, "--name")?.to_string();
                i += 1;
            }
            "--out" | "-o" => {
                options.out = Some(PathBuf::from(flag_value(args, i, "--out")?));
                i += 1;
            }
            "--store" => {
                options.store = Some(PathBuf::from(flag_value(args, i, "--store")?));
                i += 1;
            }
            "--shuffle" => options.shuffle = true,
            "--no-sim" => options.simulate = false,
            flag if flag.starts_with("--") => bail!("unknown option: {}", flag),
            team => options.teams.push(team.to_string()),
        }
        i += 1;
    }

    if let Some(count) = generated {
        if !options.teams.is_empty() {
            bail!("use either team names or --teams, not both");
        }
        options.teams = (1..=count).map(|n| format!("Team {:02}", n)).collect();
    }
    Ok(options)
}

fn load_config(path: Option<&PathBuf>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::load(path).with_context(|| format!("loading {}", path.display())),
        None => Ok(EngineConfig::default()),
    }
}

fn run_stage(mode: CompetitionMode, args: &[String]) -> Result<()> {
    let options = parse_options(args)?;
    let config = load_config(options.config.as_ref())?;

    let mut entrants: Vec<Entrant> = options.teams.iter().map(|t| Entrant::named(t)).collect();
    if options.shuffle {
        entrants.shuffle(&mut StdRng::seed_from_u64(options.seed));
    }

    println!("=== {}: {} ({} teams) ===", options.name, mode, entrants.len());
    println!();

    let mut engine = BracketEngine::new(MemoryStore::new(), config)?;
    let stage = match mode {
        CompetitionMode::RoundRobin => engine.generate_round_robin(&options.name, entrants)?,
        _ => engine.build_bracket(&options.name, entrants, mode)?,
    };

    let summary = if options.simulate {
        let sim = SimConfig {
            seed: options.seed,
            forfeit_rate: options.forfeit_rate,
            ..Default::default()
        };
        let summary = Simulator::new(sim).run_stage(&mut engine, &stage.id)?;
        info!(matches = summary.matches_played, "simulation finished");
        Some(summary)
    } else {
        None
    };

    let violations = engine.check_integrity(&stage.id)?;
    if !violations.is_empty() {
        warn!(count = violations.len(), "stage has integrity violations");
    }

    let mut report = StageReport::from_engine(&engine, &stage.id, Utc::now())?;
    report.simulation = summary;
    report.print_report();

    if let Some(path) = &options.out {
        report.save(path)?;
        println!("Report saved to {}", path.display());
    }
    if let Some(path) = &options.store {
        engine.store().save(path)?;
        println!("Store snapshot saved to {}", path.display());
    }
    Ok(())
}

fn show_report(args: &[String]) -> Result<()> {
    let Some(path) = args.first() else {
        bail!("report requires a report file");
    };
    StageReport::load(&PathBuf::from(path))?.print_report();
    Ok(())
}

fn check_store(args: &[String]) -> Result<()> {
    let Some(path) = args.first().map(PathBuf::from) else {
        bail!("check requires a store snapshot");
    };
    let mut config_path = None;
    let mut repair = false;
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                config_path = Some(PathBuf::from(flag_value(args, i, "--config")?));
                i += 1;
            }
            "--repair" => repair = true,
            other => bail!("unknown option: {}", other),
        }
        i += 1;
    }

    let store = MemoryStore::load(&path)?;
    let mut engine = BracketEngine::new(store, load_config(config_path.as_ref())?)?;
    let stages = engine.store().stages()?;

    let mut dirty = false;
    for stage in &stages {
        let violations = engine.check_integrity(&stage.id)?;
        println!("{} ({}): {} violation(s)", stage.name, stage.mode, violations.len());
        for v in &violations {
            println!("  - {}", v);
        }

        if repair && !violations.is_empty() {
            let report = engine.repair_stage(&stage.id)?;
            println!(
                "  repaired: {} round(s) removed, {} match(es) removed, {} link(s) fixed, {} game(s) created",
                report.rounds_removed.len(),
                report.matches_removed.len(),
                report.links_repaired.len(),
                report.games_created.len()
            );
            dirty |= !report.is_empty();
        }
    }

    if dirty {
        engine.store().save(&path)?;
        println!("Store snapshot updated");
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return Ok(());
    }

    match args[1].as_str() {
        "round-robin" | "rr" => run_stage(CompetitionMode::RoundRobin, &args[2..]),
        "bracket" => {
            let Some(kind) = args.get(2) else {
                print_usage();
                bail!("bracket requires single or double");
            };
            let mode: CompetitionMode = kind.parse()?;
            if !mode.is_elimination() {
                bail!("bracket requires single or double, got {}", kind);
            }
            run_stage(mode, &args[3..])
        }
        "report" => show_report(&args[2..]),
        "check" => check_store(&args[2..]),
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        _ => {
            print_usage();
            bail!("unknown command: {}", args[1]);
        }
    }
}
