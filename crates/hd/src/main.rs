//! HD CLI - Versioned documentation server.
//!
//! Provides commands for:
//! - `serve`: Start the documentation server with background sync
//! - `sync`: Run one synchronization pass against the upstream origin
//! - `resolve`: Show how a `/help` URL resolves

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{ResolveArgs, ServeArgs, SyncArgs};
use output::Output;

/// HD - Versioned documentation server.
#[derive(Parser)]
#[command(name = "hd", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the documentation server.
    Serve(ServeArgs),
    /// Synchronize the mirror with the upstream origin once.
    Sync(SyncArgs),
    /// Resolve a product URL to its version and page.
    Resolve(ResolveArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    let verbose = match &cli.command {
        Commands::Serve(args) => args.verbose,
        Commands::Sync(args) => args.verbose,
        Commands::Resolve(_) => false,
    };

    // Initialize tracing with appropriate log level
    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let result = match cli.command {
        Commands::Serve(args) => {
            let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
            rt.block_on(args.execute())
        }
        Commands::Sync(args) => args.execute(),
        Commands::Resolve(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
