//! AgriTrace CLI
//!
//! Command-line access to an AgriTrace ledger file.
//!
//! # Commands
//!
//! - `invoke` - Invoke a contract operation by name
//! - `trace` - Print the provenance trace of a product
//! - `inspect` - Display ledger statistics
//! - `version` - Show version information

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// AgriTrace command-line ledger tools.
#[derive(Parser)]
#[command(name = "agritrace")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the ledger file
    #[arg(global = true, short, long)]
    ledger: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Invoke a contract operation by name
    Invoke {
        /// Operation name, e.g. CreateProduct
        function: String,

        /// Positional arguments; payloads are JSON
        args: Vec<String>,

        /// Caller identity handed to the authorizer
        #[arg(short, long, default_value = "cli")]
        caller: String,

        /// Pretty-print the JSON answer
        #[arg(short, long)]
        pretty: bool,
    },

    /// Print the provenance trace of a product
    Trace {
        /// Product id
        product_id: String,

        /// Print a chronological timeline instead of grouped records
        #[arg(short, long)]
        timeline: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Display ledger statistics
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so answers on stdout stay machine-readable.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Invoke {
            function,
            args,
            caller,
            pretty,
        } => {
            let path = cli.ledger.ok_or("Ledger path required for invoke")?;
            commands::invoke::run(&path, &caller, &function, &args, pretty)?;
        }
        Commands::Trace {
            product_id,
            timeline,
            format,
        } => {
            let path = cli.ledger.ok_or("Ledger path required for trace")?;
            commands::trace::run(&path, &product_id, timeline, &format)?;
        }
        Commands::Inspect { format } => {
            let path = cli.ledger.ok_or("Ledger path required for inspect")?;
            commands::inspect::run(&path, &format)?;
        }
        Commands::Version => {
            println!("AgriTrace CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("AgriTrace Core v{}", agritrace_core::VERSION);
        }
    }

    Ok(())
}
