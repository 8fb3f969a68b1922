//! eventlog CLI - inspect and maintain event cache directories.

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod output;

use commands::{clean, list, verify};

#[derive(Parser)]
#[command(name = "eventlog")]
#[command(about = "Inspect and maintain eventlog cache directories")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List cached events in replay order
    List {
        /// Cache directory
        directory: String,
        /// Output as JSON lines
        #[arg(long)]
        json: bool,
        /// Stop after N events (default: unlimited)
        #[arg(long)]
        max_events: Option<u64>,
        /// Segment file stem
        #[arg(long, default_value = eventlog_cache::DEFAULT_FILE_STEM)]
        stem: String,
    },
    /// Decode every segment and report the ones that fail
    Verify {
        /// Cache directory
        directory: String,
        /// Exit with error code if any segment fails to decode
        #[arg(long)]
        strict: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
        /// Segment file stem
        #[arg(long, default_value = eventlog_cache::DEFAULT_FILE_STEM)]
        stem: String,
    },
    /// Remove in-progress files left by interrupted readers
    Clean {
        /// Cache directory
        directory: String,
        /// Also remove segments that fail to decode, the segments after them,
        /// and segments stranded behind a gap
        #[arg(long)]
        corrupt: bool,
        /// Segment file stem
        #[arg(long, default_value = eventlog_cache::DEFAULT_FILE_STEM)]
        stem: String,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::List {
            directory,
            json,
            max_events,
            stem,
        } => list::run(directory, json, max_events, stem),
        Commands::Verify {
            directory,
            strict,
            json,
            stem,
        } => verify::run(directory, strict, json, stem),
        Commands::Clean {
            directory,
            corrupt,
            stem,
        } => clean::run(directory, corrupt, stem),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
