//! FlexDB CLI
//!
//! Command-line tools for FlexDB collection directories.
//!
//! # Commands
//!
//! - `inspect` - Display a collection's journal and pending commits
//! - `verify` - Check the journal against the record files
//! - `rebuild` - Rescan a collection and rewrite its snapshot
//! - `dump` - Print stored records as JSON

mod commands;

use clap::{Parser, Subcommand};
use flexdb_core::{Config, Pool};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// FlexDB command-line collection tools.
#[derive(Parser)]
#[command(name = "flexdb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Root directory collection names are resolved against
    #[arg(global = true, short, long, default_value = ".")]
    root: PathBuf,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display a collection's journal and pending commits
    Inspect {
        /// Collection name, relative to the root (e.g. `logs/20240101`)
        collection: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Check the journal against the record files
    Verify {
        /// Collection name, relative to the root
        collection: String,
    },

    /// Rescan every record file and rewrite the snapshot and journal
    Rebuild {
        /// Collection name, relative to the root
        collection: String,
    },

    /// Print stored records as JSON
    Dump {
        /// Collection name, relative to the root
        collection: String,

        /// Only print this record
        #[arg(short, long)]
        id: Option<i64>,

        /// One record per line instead of indented output
        #[arg(short, long)]
        compact: bool,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Maintenance never creates collection directories
    let pool = Pool::new(Config::new(&cli.root).create_if_missing(false));

    match cli.command {
        Commands::Inspect { collection, format } => {
            commands::inspect::run(&pool, &collection, &format)?;
        }
        Commands::Verify { collection } => {
            commands::verify::run(&pool, &collection)?;
        }
        Commands::Rebuild { collection } => {
            commands::rebuild::run(&pool, &collection)?;
        }
        Commands::Dump {
            collection,
            id,
            compact,
        } => {
            commands::dump::run(&pool, &collection, id, compact)?;
        }
        Commands::Version => {
            println!("FlexDB CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("FlexDB Core v{}", flexdb_core::VERSION);
        }
    }

    Ok(())
}
