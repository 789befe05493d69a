//! ringlog CLI
//!
//! Command-line tools for inspecting and manipulating ring files.
//!
//! # Commands
//!
//! - `inspect` - Display header, recovery actions and capacity
//! - `dump` - List records in either direction
//! - `append` / `dequeue` / `pop` - Change the ring
//! - `clear` - Reset the ring to empty

mod commands;

use clap::{Parser, Subcommand};
use commands::RingTarget;
use ringlog_core::RingConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// ringlog command-line ring tools.
#[derive(Parser)]
#[command(name = "ringlog")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the ring file
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Storage budget in bytes, header included
    #[arg(global = true, short, long, default_value_t = RingConfig::default().max_size)]
    max_size: u64,

    /// Open the ring with stack framing
    #[arg(global = true, short, long)]
    stack: bool,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display header, recovery actions and capacity
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List records
    Dump {
        /// Maximum number of records to dump
        #[arg(short, long)]
        limit: Option<usize>,

        /// Newest first (stack rings only)
        #[arg(short, long)]
        reverse: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Append a value as the newest record
    Append {
        /// Value to append
        value: String,
    },

    /// Remove and print the oldest record
    Dequeue,

    /// Remove and print the newest record (stack rings only)
    Pop,

    /// Reset the ring to empty
    Clear,

    /// Show version information
    Version,
}

impl Cli {
    fn target(&self, command: &str) -> Result<RingTarget, String> {
        let path = self
            .path
            .clone()
            .ok_or_else(|| format!("Ring path required for {command}"))?;
        Ok(RingTarget {
            path,
            max_size: self.max_size,
            stack: self.stack,
        })
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Inspect { format } => {
            commands::inspect::run(&cli.target("inspect")?, format)?;
        }
        Commands::Dump {
            limit,
            reverse,
            format,
        } => {
            commands::dump::run(&cli.target("dump")?, *limit, *reverse, format)?;
        }
        Commands::Append { value } => {
            commands::mutate::append(&cli.target("append")?, value)?;
        }
        Commands::Dequeue => {
            commands::mutate::dequeue(&cli.target("dequeue")?)?;
        }
        Commands::Pop => {
            commands::mutate::pop(&cli.target("pop")?)?;
        }
        Commands::Clear => {
            commands::mutate::clear(&cli.target("clear")?)?;
        }
        Commands::Version => {
            println!("ringlog CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("Header size: {} bytes", ringlog_core::HEADER_SIZE);
        }
    }

    Ok(())
}
