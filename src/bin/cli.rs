//! Ropewalk CLI - validate player tuning and run headless scenarios

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ropewalk::config::PlayerConfig;
use ropewalk::game::{run_scenario, PlayerEvent, Scenario, StepReport};

#[derive(Parser)]
#[command(name = "ropewalk")]
#[command(about = "Ropewalk platformer core CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and validate a player configuration
    Check {
        /// Path to the player TOML file
        config: PathBuf,
    },
    /// Run a scenario headless and print JSON lines to stdout
    Simulate {
        /// Player configuration (default: every sub-system enabled)
        #[arg(long, env = "ROPEWALK_CONFIG")]
        config: Option<PathBuf>,
        /// Scenario file (default: flat floor, no input)
        #[arg(long)]
        scenario: Option<PathBuf>,
        /// Override the scenario step count
        #[arg(long)]
        steps: Option<u64>,
        /// Print every K-th step report
        #[arg(long, default_value_t = 1)]
        every: u64,
    },
}

/// One line of simulation output.
#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum OutputLine<'a> {
    Report(&'a StepReport),
    Event { step: u64, event: &'a PlayerEvent },
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { config } => check_config(&config),
        Commands::Simulate {
            config,
            scenario,
            steps,
            every,
        } => simulate(config.as_deref(), scenario.as_deref(), steps, every),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn load_config(path: &Path) -> PlayerConfig {
    match PlayerConfig::from_file(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

// =============================================================================
// Check Command
// =============================================================================

fn check_config(path: &Path) {
    let config = load_config(path);
    let enabled: Vec<&str> = [
        ("jetpack", config.jetpack.is_some()),
        ("crouch", config.crouch.is_some()),
        ("tether", config.tether.is_some()),
    ]
    .into_iter()
    .filter_map(|(name, on)| on.then_some(name))
    .collect();
    info!(path = %path.display(), ?enabled, "configuration valid");
    println!("OK: {}", path.display());
}

// =============================================================================
// Simulate Command
// =============================================================================

fn simulate(config: Option<&Path>, scenario: Option<&Path>, steps: Option<u64>, every: u64) {
    let config = config.map(load_config).unwrap_or_else(PlayerConfig::full);
    let mut scenario = match scenario.map(Scenario::from_file).transpose() {
        Ok(scenario) => scenario.unwrap_or_default(),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(steps) = steps {
        scenario.steps = steps;
    }
    let every = if every == 0 {
        warn!("--every 0 treated as 1");
        1
    } else {
        every
    };

    info!(steps = scenario.steps, dt = scenario.dt, "simulating");
    let run = run_scenario(&config, &scenario);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut events = run.events.iter().peekable();
    for report in &run.reports {
        while let Some((step, event)) = events.next_if(|(step, _)| *step <= report.step) {
            emit(&mut out, &OutputLine::Event { step: *step, event });
        }
        if report.step % every == 0 {
            emit(&mut out, &OutputLine::Report(report));
        }
    }
}

fn emit(out: &mut impl Write, line: &OutputLine<'_>) {
    let result = serde_json::to_string(line)
        .map_err(std::io::Error::from)
        .and_then(|json| writeln!(out, "{}", json));
    if let Err(e) = result {
        eprintln!("Error: failed to write output: {}", e);
        std::process::exit(1);
    }
}
