use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use colored::*;
use sweepr_common::network::host::{HostScanResult, NetworkScanResult};
use sweepr_common::network::target::parse_targets_bounded;
use sweepr_common::{info, success};
use sweepr_core::export;
use sweepr_core::scanner::{PortScanner, ProgressFn};
use sweepr_core::summary::{self, DEFAULT_TOP_SERVICES, ScanSummary};

use crate::commands::{OutputFormat, ScanArgs};
use crate::mprint;
use crate::terminal::{colors, format, print, spinner};

const KEY_WIDTH: usize = 7;

pub async fn scan(args: ScanArgs, verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let cfg = args.to_config(verbose > 0);
    cfg.validate()?;
    let targets = parse_targets_bounded(&args.targets, args.max_hosts)?;

    print::header("starting scanner", quiet);
    if quiet == 0 {
        print::aligned_line("Targets", KEY_WIDTH, format!("{} hosts", targets.len()));
        print::aligned_line("Ports", KEY_WIDTH, format!("{} per host", args.ports.len()));
        let mode: &str = if args.stealth { "stealth" } else { "parallel" };
        print::aligned_line("Mode", KEY_WIDTH, mode);
    }

    let total: u64 = targets.len() as u64 * args.ports.len() as u64;
    spinner::start_scan_progress(total, quiet);
    let progress: ProgressFn = Arc::new(spinner::report_scan_progress);
    let scanner = PortScanner::system().with_progress(progress);

    let outcome = if args.stealth {
        scanner
            .stealth_scan_network(&args.targets, &args.ports, &cfg)
            .await
    } else {
        scanner.scan_network(&args.targets, &args.ports, &cfg).await
    };
    spinner::finish_scan_progress();
    let result: NetworkScanResult = outcome?;

    match args.format {
        OutputFormat::Text => report(&result, args.all, quiet),
        OutputFormat::Json => emit(&export::to_json(result.hosts())?, args.output.as_deref())?,
        OutputFormat::Csv => emit(&export::to_csv(result.hosts())?, args.output.as_deref())?,
    }

    if let Some(path) = &args.output
        && args.format != OutputFormat::Text
    {
        success!("Report written to {}", path.display());
    }
    Ok(())
}

/// Writes machine-readable output to `path`, or stdout when no path is given.
fn emit(document: &str, path: Option<&Path>) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            writeln!(writer, "{document}")?;
            writer.flush()?;
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{document}")?;
        }
    }
    Ok(())
}

fn report(result: &NetworkScanResult, show_all: bool, quiet: u8) {
    let hosts: &[HostScanResult] = result.hosts();
    if hosts.is_empty() {
        print::header("no responsive hosts", quiet);
        print::no_results();
        return;
    }

    print::header("scan results", quiet);
    for (idx, host) in hosts.iter().enumerate() {
        print_host_tree(host, idx, show_all);
        if idx + 1 != hosts.len() {
            mprint!();
        }
    }

    let summary: ScanSummary = summary::summarize(hosts, DEFAULT_TOP_SERVICES);
    print_summary(result, &summary, quiet);
}

fn print_host_tree(host: &HostScanResult, idx: usize, show_all: bool) {
    let hostname: Option<&str> = Some(host.resolved_hostname()).filter(|h| !h.is_empty());
    print::tree_head(idx, &host.address(), hostname);
    print::as_tree_one_level(format::host_to_details(host, show_all));
}

fn print_summary(result: &NetworkScanResult, summary: &ScanSummary, quiet: u8) {
    let hosts_up: ColoredString = format!("{}/{} hosts up", result.alive_count(), result.total_scanned())
        .bold()
        .green();
    let open: ColoredString = format!("{} open ports", summary.total_open_ports).bold().green();
    let total_time: ColoredString = format!("{:.2}s", result.duration().as_secs_f64())
        .bold()
        .yellow();
    let output: String = format!("Scan Complete: {hosts_up}, {open} in {total_time}");

    match quiet {
        0 => {
            print::fat_separator();
            print::centerln(&output);
        }
        _ => {
            mprint!();
            success!("{}", output);
        }
    }

    if !summary.top_services.is_empty() {
        let services: String = summary
            .top_services
            .iter()
            .map(|s| format!("{} ({})", s.service.color(colors::SERVICE), s.count))
            .collect::<Vec<String>>()
            .join(", ");
        info!(
            "Top services: {services}; {:.1} open ports per responsive host",
            summary.avg_open_per_host
        );
    }
}
