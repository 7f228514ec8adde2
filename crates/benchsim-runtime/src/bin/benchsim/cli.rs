//! CLI definitions for benchsim.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "benchsim",
    version,
    about = "Test-bench panel simulator",
    infer_subcommands = true,
    after_help = "Examples:\n  benchsim run scenarios/tc1_pass.toml\n  benchsim run scenarios/reset_mid_test.toml --json\n  benchsim console --config bench.toml\n  benchsim config"
)]
pub struct Cli {
    /// Show debug logs.
    #[arg(long, short, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a scenario script in virtual time and check its expectations.
    Run {
        /// Scenario TOML file.
        scenario: PathBuf,
        /// Bench timing overrides (bench.toml).
        #[arg(long)]
        config: Option<PathBuf>,
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Drive a live bench from stdin in wall-clock time.
    Console {
        /// Bench timing overrides (bench.toml).
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the effective bench configuration.
    Config {
        /// Bench timing overrides (bench.toml).
        #[arg(long)]
        config: Option<PathBuf>,
    },
}
