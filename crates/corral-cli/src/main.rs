//! # corral — resource-container scheduler CLI
//!
//! Drives the cooperative round-robin scheduler with real OS threads:
//! a guided demo walk and a configurable stress run with invariant audits.

mod commands;

use clap::Parser;

use crate::commands::Cli;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    commands::execute(cli)
}
