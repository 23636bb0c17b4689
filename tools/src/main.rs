//! sim-runner: headless runner for the workforce simulation.
//!
//! Usage:
//!   sim-runner --config sim.json --db run.db --baseline 1000
//!   sim-runner --config sim.json --mode single --engine process --project-dir ./dbt
//!   sim-runner --mode full --year 2026 --db run.db
//!   sim-runner --baseline 500 --json

use anyhow::{bail, Result};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use workforce_core::{
    config::SimConfig,
    engine::RunSummary,
    jobs::{self, SimContext},
    reference_engine::ReferenceEngine,
    store::{ConnectionProvider, StoreProvider},
    transform::{ProcessEngine, TransformEngine},
    workforce::generate_baseline,
};

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let mut config = match flag(&args, "--config") {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default_test(),
    };
    config.start_year = parse_arg(&args, "--start-year", config.start_year);
    config.end_year = parse_arg(&args, "--end-year", config.end_year);
    config.random_seed = parse_arg(&args, "--seed", config.random_seed);
    config.full_refresh |= args.iter().any(|a| a == "--full-refresh");
    config.validate()?;

    let db = flag(&args, "--db").unwrap_or(":memory:");
    let mode = flag(&args, "--mode").unwrap_or("multi");
    let engine_kind = flag(&args, "--engine").unwrap_or("reference");
    let baseline = parse_arg(&args, "--baseline", 0usize);
    let json = args.iter().any(|a| a == "--json");

    println!("Workforce simulation: sim-runner");
    println!("  years:     {}..={}", config.start_year, config.end_year);
    println!("  seed:      {}", config.random_seed);
    println!("  db:        {db}");
    println!("  mode:      {mode}");
    println!("  engine:    {engine_kind}");
    println!();

    let provider: Arc<StoreProvider> = Arc::new(if db == ":memory:" {
        StoreProvider::in_memory()?
    } else {
        StoreProvider::open(db)?
    });

    if baseline > 0 {
        let employees = generate_baseline(baseline, config.random_seed, config.first_year());
        provider.acquire()?.replace_baseline(&employees)?;
        log::info!("seeded baseline with {baseline} employees");
    }
    let baseline_valid = provider.acquire()?.baseline_active_count()? > 0;

    let engine: Arc<dyn TransformEngine> = match engine_kind {
        "reference" => Arc::new(ReferenceEngine::build(provider.clone())),
        "process" => Arc::new(ProcessEngine::new(
            flag(&args, "--engine-cmd").unwrap_or("dbt"),
            flag(&args, "--project-dir").map(PathBuf::from),
        )),
        other => bail!("unknown engine '{other}' (expected reference or process)"),
    };
    let ctx = SimContext::new(config.clone(), provider, engine);

    match mode {
        "single" => {
            print_summary(&jobs::single_year_report(&ctx)?, json)?;
        }
        "multi" => {
            let summary = jobs::multi_year_report(&ctx, baseline_valid)?;
            print_summary(&summary, json)?;
            if summary.failed_years > 0 {
                bail!("one or more years failed");
            }
        }
        "full" => {
            let year = parse_arg(&args, "--year", config.start_year);
            let summary = jobs::full_pipeline(&ctx, year, &mut |line| println!("  | {line}"))?;
            println!();
            println!("=== FULL PIPELINE ===");
            println!("  year:           {}", summary.year);
            println!("  snapshot rows:  {}", summary.rows);
        }
        other => bail!("unknown mode '{other}' (expected single, multi or full)"),
    }

    Ok(())
}

fn print_summary(summary: &RunSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
    } else {
        print!("{}", summary.render());
    }
    Ok(())
}

fn flag<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.windows(2).find(|w| w[0] == name).map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
