//! CLI entrypoint for the bench simulator.

#[path = "benchsim/cli.rs"]
mod cli;
#[path = "benchsim/console.rs"]
mod console;
#[path = "benchsim/run.rs"]
mod run;
#[path = "benchsim/style.rs"]
mod style;

use std::path::Path;

use anyhow::Context;
use clap::Parser;

use benchsim_runtime::BenchConfig;
use cli::{Cli, Command};

fn main() {
    if let Err(err) = run() {
        eprintln!("{}", style::error(format!("Error: {err:#}")));
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Command::Run {
            scenario,
            config,
            json,
        } => run::run_scenario(&scenario, config.as_deref(), json),
        Command::Console { config } => console::run_console(config.as_deref()),
        Command::Config { config } => {
            let config = load_config(config.as_deref())?;
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

pub(crate) fn load_config(path: Option<&Path>) -> anyhow::Result<BenchConfig> {
    match path {
        Some(path) => BenchConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(BenchConfig::default()),
    }
}
