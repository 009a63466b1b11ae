//! # pea-cli
//!
//! Command-line front end for the Pea module-aliasing engine.
//!
//! This is the main entry point for the Pea CLI tool. It handles command parsing,
//! sets up logging and error handling, and dispatches to the appropriate command handlers.

use clap::{Parser, Subcommand};
use pea_core::error::{PeaError, PeaResult};
use tracing::{error, info};

mod commands;
mod output;

use commands::{AliasesArgs, CommandContext};
use output::errors::ErrorFormatter;

/// Module aliasing for Pea package graphs
#[derive(Parser)]
#[command(name = "pea", version, about = "Module aliasing for Pea package graphs")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Apply module aliases to a package graph snapshot
    Aliases(AliasesArgs),
    /// Check configuration
    Check,
    /// Show version information
    Version,
}

fn main() {
    let cli = Cli::parse();

    setup_logging(cli.verbose);
    setup_panic_handler();

    info!("Starting Pea CLI v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run_cli(cli) {
        eprintln!("{}", ErrorFormatter::new().format_error(&e));
        std::process::exit(1);
    }
}

fn run_cli(cli: Cli) -> PeaResult<()> {
    // Create Tokio runtime for async operations
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| PeaError::io("Failed to create async runtime".to_string(), e))?;

    rt.block_on(async {
        let ctx = CommandContext::new()?;
        commands::dispatch_command(cli.command, &ctx).await
    })
}

fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "pea={level},pea_alias={level},pea_config={level},pea_core={level}"
        ))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        error!("Pea encountered an unexpected error: {}", panic_info);
        eprintln!("Pea crashed! This is a bug.");
        eprintln!("Please report this at: https://github.com/pea-lang/pea/issues");
        eprintln!("Error: {}", panic_info);
    }));
}
