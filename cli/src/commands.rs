pub mod identify;
pub mod poll;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "fleetpoll")]
#[command(about = "Polls a fleet of network devices over SNMP and maps what it finds.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Poll every host of a work file and print the device records
    #[command(alias = "p")]
    Poll(PollArgs),
    /// Identify a single device and show the strategy it maps to
    #[command(alias = "i")]
    Identify(IdentifyArgs),
}

#[derive(clap::Args, Debug)]
pub struct PollArgs {
    /// JSON file with `hosts` and `templates`
    pub work: PathBuf,
    /// Write records here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Number of concurrent workers
    #[arg(short, long)]
    pub workers: Option<usize>,
    /// Per-query timeout in seconds
    #[arg(short, long)]
    pub timeout: Option<u64>,
    /// Retries per query
    #[arg(short, long)]
    pub retries: Option<u32>,
    /// Log every per-host failure
    #[arg(long)]
    pub debug: bool,
    /// Exchange worker results through JSON files in this directory
    #[arg(long)]
    pub spool: Option<PathBuf>,
    /// Give up waiting for the poll after this many seconds
    #[arg(long)]
    pub deadline: Option<u64>,
}

#[derive(clap::Args, Debug)]
pub struct IdentifyArgs {
    /// Device address, optionally with a port
    pub address: String,
    #[arg(short, long, default_value = "public")]
    pub community: String,
    /// SNMP version: 1, 2 (v2c) or 3
    #[arg(short, long, default_value_t = 2)]
    pub version: u8,
    /// Treat the device as a network site
    #[arg(long)]
    pub site: bool,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
