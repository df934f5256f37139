//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// What to print while replaying the capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Mode {
    /// Every decoded frame
    #[default]
    Frames,
    /// Every captured ECM exchange
    Ecm,
    /// Nothing; only lookups and summary
    Quiet,
}

/// Replay a B-CAS card capture through the pseudo card.
#[derive(Debug, Clone, Parser)]
#[command(name = "bcas-dump", version, about)]
pub struct Args {
    /// Capture file with the raw card stream
    pub capture: Option<PathBuf>,

    /// What to print while replaying
    #[arg(short, long, value_enum, default_value_t = Mode::Frames)]
    pub mode: Mode,

    /// TOML config file with a [card] table
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Bytes read from the capture per push
    #[arg(long, default_value_t = 512, value_parser = clap::value_parser!(u64).range(1..))]
    pub chunk_size: u64,

    /// ECM records kept for lookup (overrides config)
    #[arg(long)]
    pub queue_size: Option<usize>,

    /// System key as hex (overrides config)
    #[arg(long)]
    pub system_key: Option<String>,

    /// Initial CBC as hex (overrides config)
    #[arg(long)]
    pub init_cbc: Option<String>,

    /// ECM body (hex) to look up after the capture is loaded; repeatable
    #[arg(short, long = "lookup", value_name = "HEX")]
    pub lookups: Vec<String>,

    /// Print the card init status as a config table
    #[arg(long)]
    pub dump_init_status: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}
