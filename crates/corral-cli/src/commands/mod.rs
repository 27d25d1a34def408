//! CLI command definitions and dispatch.

pub mod demo;
pub mod stress;

use clap::{Parser, Subcommand};

/// corral — cooperative round-robin scheduling over resource containers.
#[derive(Parser, Debug)]
#[command(name = "corral", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Walk the join / rotate / leave / mmap protocol with a few threads.
    Demo(demo::DemoArgs),
    /// Interleave joins, rotations, and departures, auditing invariants.
    Stress(stress::StressArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Demo(args) => demo::execute(&args),
        Command::Stress(args) => stress::execute(&args),
    }
}
