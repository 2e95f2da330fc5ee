use serde::Serialize;
use sweepr_common::network::host::HostScanResult;
use sweepr_common::network::port::PortProbeResult;

pub const DEFAULT_TOP_SERVICES: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceCount {
    pub service: String,
    pub count: usize,
}

/// Aggregate figures over a finished scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanSummary {
    pub total_open_ports: usize,
    /// Hosts with at least one Open or Filtered port.
    pub hosts_up: usize,
    /// Open ports per responsive host, `0.0` when no host responded.
    pub avg_open_per_host: f64,
    /// Most frequent services among Open ports, highest count first.
    pub top_services: Vec<ServiceCount>,
}

/// Folds host results into a [`ScanSummary`]. Equal counts keep first-seen order.
pub fn summarize(hosts: &[HostScanResult], top_k: usize) -> ScanSummary {
    let open: Vec<&PortProbeResult> = hosts
        .iter()
        .flat_map(|h| h.ports())
        .filter(|p| p.is_open())
        .collect();

    let hosts_up: usize = hosts.iter().filter(|h| h.is_responsive()).count();
    let avg_open_per_host: f64 = if hosts_up == 0 {
        0.0
    } else {
        open.len() as f64 / hosts_up as f64
    };

    let mut histogram: Vec<ServiceCount> = Vec::new();
    for port in &open {
        match histogram.iter_mut().find(|s| s.service == port.service()) {
            Some(entry) => entry.count += 1,
            None => histogram.push(ServiceCount {
                service: port.service().to_string(),
                count: 1,
            }),
        }
    }
    // Stable sort, so ties stay in first-seen order.
    histogram.sort_by(|a, b| b.count.cmp(&a.count));
    histogram.truncate(top_k);

    ScanSummary {
        total_open_ports: open.len(),
        hosts_up,
        avg_open_per_host,
        top_services: histogram,
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
