#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs seeded random-walk scenarios on a grid.

mod render;
mod scenario;
mod simulation;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing::info;

use crate::scenario::Scenario;

/// Runs a seeded agent simulation and prints the final grid.
#[derive(Debug, Parser)]
#[command(name = "cellgrid", version, about = "Random-walk agents on a 2D grid")]
struct CliArgs {
    /// TOML scenario describing the grid, population and walk behaviour.
    #[arg(long, value_name = "PATH")]
    scenario: Option<PathBuf>,
    /// Overrides the scenario seed.
    #[arg(long)]
    seed: Option<u64>,
    /// Overrides the number of simulation steps.
    #[arg(long)]
    steps: Option<u32>,
    /// Overrides the number of agents seeded onto the grid.
    #[arg(long)]
    agents: Option<u32>,
    /// Output format for the final grid.
    #[arg(long, value_enum, default_value_t = OutputFormat::Ascii)]
    format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Ascii,
    Json,
}

/// Entry point for the cellgrid command-line interface.
fn main() -> Result<()> {
    init_tracing();

    let args = CliArgs::parse();
    let scenario = resolve_scenario(&args)?;
    let outcome = simulation::run(&scenario)?;

    let rendered = match args.format {
        OutputFormat::Ascii => render::ascii(&outcome.grid),
        OutputFormat::Json => render::json(&outcome.grid)?,
    };
    println!("{rendered}");

    let report = outcome.report;
    info!(
        seed = scenario.seed,
        steps = scenario.steps,
        placed = report.placed,
        moves = report.moves,
        evictions = report.evictions,
        rejections = report.rejections,
        "simulation finished"
    );

    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

fn resolve_scenario(args: &CliArgs) -> Result<Scenario> {
    let mut scenario = match &args.scenario {
        Some(path) => Scenario::load(path)?,
        None => Scenario::default(),
    };

    if let Some(seed) = args.seed {
        scenario.seed = seed;
    }
    if let Some(steps) = args.steps {
        scenario.steps = steps;
    }
    if let Some(agents) = args.agents {
        scenario.agents = agents;
    }

    Ok(scenario)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_overrides_default_scenario() {
        let args = CliArgs::parse_from([
            "cellgrid", "--seed", "7", "--steps", "3", "--format", "json",
        ]);
        assert_eq!(args.format, OutputFormat::Json);

        let scenario = resolve_scenario(&args).expect("default scenario");
        assert_eq!(scenario.seed, 7);
        assert_eq!(scenario.steps, 3);
        assert_eq!(scenario.agents, Scenario::default().agents);
    }

    #[test]
    fn missing_scenario_file_is_reported_with_path() {
        let args = CliArgs::parse_from(["cellgrid", "--scenario", "does/not/exist.toml"]);

        let error = resolve_scenario(&args).expect_err("file is missing");
        assert!(format!("{error:#}").contains("does/not/exist.toml"));
    }
}
