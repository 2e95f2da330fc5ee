pub mod scan;
pub mod serve;

use std::net::SocketAddr;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use sweepr_common::config::{DEFAULT_MAX_CONCURRENT, ScanConfig};
use sweepr_common::network::ports::PortSpec;

pub const DEFAULT_BIND: &str = "127.0.0.1:7878";
/// A /16 worth of hosts.
pub const DEFAULT_MAX_HOSTS: usize = 65_536;

#[derive(Parser)]
#[command(name = "sweepr", version)]
#[command(about = "A TCP connect port scanner with banner grabbing and service detection.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Reduce output (-q drops headers, -qq drops the progress bar as well)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub quiet: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan one or more hosts
    #[command(alias = "s")]
    Scan(ScanArgs),
    /// Answer scan requests over HTTP
    Serve {
        #[arg(long, default_value = DEFAULT_BIND)]
        bind: SocketAddr,
    },
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Hosts, CIDR blocks (10.0.0.0/24) or last-octet ranges (10.0.0.1-50), comma separated
    pub targets: String,

    /// Ports: list and ranges (22,80,8000-8100), "common", "top100", "top1000" or "-" for all
    ///
    /// "top1000" is the built-in ranking followed by the lowest unranked port numbers.
    #[arg(short, long, default_value = "common")]
    pub ports: PortSpec,

    /// Per-probe deadline in milliseconds
    #[arg(short, long, default_value_t = 1500)]
    pub timeout: u64,

    /// Maximum probes in flight per host
    #[arg(short = 'c', long, default_value_t = DEFAULT_MAX_CONCURRENT)]
    pub concurrency: usize,

    /// Probe one port at a time, in random order, with random pauses
    #[arg(long)]
    pub stealth: bool,

    /// Stealth pause window in milliseconds, as min-max
    #[arg(long, default_value = "100-500", value_parser = parse_delay)]
    pub delay: RangeInclusive<u64>,

    /// Also report hosts where every port was closed
    #[arg(long)]
    pub include_down: bool,

    /// Skip the scanner's own DNS lookups (hostname targets are then resolved by the OS on each connect)
    #[arg(long)]
    pub no_dns: bool,

    /// Refuse target lists that expand to more hosts than this
    #[arg(long, default_value_t = DEFAULT_MAX_HOSTS)]
    pub max_hosts: usize,

    /// List closed and filtered ports individually
    #[arg(short = 'a', long)]
    pub all: bool,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

impl ScanArgs {
    pub fn to_config(&self, verbose: bool) -> ScanConfig {
        ScanConfig::default()
            .with_timeout(Duration::from_millis(self.timeout))
            .with_max_concurrent(self.concurrency)
            .with_verbose(verbose)
            .with_include_down_hosts(self.include_down)
            .with_dns(!self.no_dns)
            .with_max_hosts(Some(self.max_hosts))
            .with_stealth_delay_ms(self.delay.clone())
    }
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

fn parse_delay(s: &str) -> Result<RangeInclusive<u64>, String> {
    let (min, max) = match s.split_once('-') {
        Some((min, max)) => (min.trim(), max.trim()),
        None => (s.trim(), s.trim()),
    };
    let min: u64 = min.parse().map_err(|_| format!("invalid delay '{s}'"))?;
    let max: u64 = max.parse().map_err(|_| format!("invalid delay '{s}'"))?;
    if min > max {
        return Err(format!("delay window '{s}' is inverted"));
    }
    Ok(min..=max)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
