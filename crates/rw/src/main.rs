//! RW CLI - Documentation versioning.
//!
//! Provides commands for:
//! - `versions snapshot`: Freeze the live docs into the newly declared version
//! - `versions sidebar`: Print the composed sidebar of every version
//! - `versions url`: Rewrite a page URL to other versions
//! - `versions list`: List the configured versions

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::VersionsCommand;
use output::Output;

/// RW - Documentation versioning.
#[derive(Parser)]
#[command(name = "rw", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Documentation versioning commands.
    #[command(subcommand)]
    Versions(VersionsCommand),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let verbose = match &cli.command {
        Commands::Versions(cmd) => cmd.verbose(),
    };
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let result = match cli.command {
        Commands::Versions(cmd) => cmd.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
