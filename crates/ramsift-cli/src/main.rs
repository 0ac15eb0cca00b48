mod commands;
mod config;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use ramsift_core::{ByteAddress, FilterStep, SizeClass};
use tracing_subscriber::EnvFilter;

use commands::ScanRange;
use commands::hex_utils::{parse_hex_address, parse_number};
use config::CliConfig;

#[derive(Parser)]
#[command(name = "ramsift")]
#[command(about = "Incremental RAM search over memory snapshots")]
struct Args {
    #[arg(short, long, default_value = "ramsift.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan the first snapshot and narrow with each following snapshot
    Scan {
        /// Snapshot files, oldest first
        #[arg(required = true)]
        snapshots: Vec<PathBuf>,

        #[command(flatten)]
        range: RangeArgs,

        /// Filter for each narrowing step, in order (e.g. "=171", "!=", ">+1").
        /// Steps without a filter keep candidates that changed.
        #[arg(short = 'f', long = "filter")]
        filters: Vec<FilterStep>,

        /// Maximum number of candidates to print
        #[arg(long)]
        limit: Option<usize>,

        /// Print candidates as JSON
        #[arg(long)]
        json: bool,
    },
    /// Narrow interactively, re-reading the snapshot before every step
    Session {
        /// Snapshot file kept up to date by another process
        snapshot: PathBuf,

        #[command(flatten)]
        range: RangeArgs,
    },
}

#[derive(clap::Args)]
struct RangeArgs {
    /// Value size (8-bit, 16-bit, 24-bit, 32-bit, 16-bit BE, 32-bit BE, Lower4, Upper4)
    #[arg(short, long, default_value = "8-bit")]
    size: SizeClass,

    /// First address to scan (hex)
    #[arg(long, default_value = "0", value_parser = parse_hex_address)]
    start: ByteAddress,

    /// Number of bytes to scan (defaults to the rest of the snapshot)
    #[arg(long, value_parser = parse_number)]
    length: Option<u32>,
}

impl From<RangeArgs> for ScanRange {
    fn from(args: RangeArgs) -> Self {
        Self {
            size: args.size,
            start: args.start,
            length: args.length,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("ramsift=info".parse()?))
        .init();

    let args = Args::parse();
    let config = CliConfig::load_or_default(&args.config);

    match args.command {
        Command::Scan {
            snapshots,
            range,
            filters,
            limit,
            json,
        } => commands::scan::run(&snapshots, range.into(), &filters, limit, json, &config),
        Command::Session { snapshot, range } => {
            commands::session::run(snapshot, range.into(), config)
        }
    }
}
