//! Per-host and per-network scan results.
//!
//! Both types are assembled once, after every probe they cover has completed, and are
//! read-only afterwards. Reporting and export layers only ever borrow them.

use std::collections::BTreeSet;
use std::net::IpAddr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::network::port::{PortProbeResult, PortState, serialize_millis};

pub const UNKNOWN_OS: &str = "Unknown";

/// A heuristic operating system guess. `confidence` is in `[0, 1]` and is advisory only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OsGuess {
    pub name: String,
    pub confidence: f32,
}

impl OsGuess {
    pub fn new(name: impl Into<String>, confidence: f32) -> Self {
        Self {
            name: name.into(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    pub fn unknown() -> Self {
        Self::new(UNKNOWN_OS, 0.0)
    }

    pub fn is_unknown(&self) -> bool {
        self.confidence == 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HostScanResult {
    host: String,
    resolved_address: Option<IpAddr>,
    resolved_hostname: String,
    ports: Vec<PortProbeResult>,
    os_guess: String,
    os_confidence: f32,
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    elapsed: Duration,
    timestamp: DateTime<Utc>,
}

impl HostScanResult {
    /// Assembles a host result. `ports` is sorted ascending by port number here,
    /// whatever order the probes completed in.
    pub fn new(
        host: impl Into<String>,
        resolved_address: Option<IpAddr>,
        resolved_hostname: impl Into<String>,
        mut ports: Vec<PortProbeResult>,
        os: OsGuess,
        elapsed: Duration,
        timestamp: DateTime<Utc>,
    ) -> Self {
        ports.sort_by_key(PortProbeResult::port);
        Self {
            host: host.into(),
            resolved_address,
            resolved_hostname: resolved_hostname.into(),
            ports,
            os_guess: os.name,
            os_confidence: os.confidence,
            elapsed,
            timestamp,
        }
    }

    /// The target identifier as given by the caller.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn resolved_address(&self) -> Option<IpAddr> {
        self.resolved_address
    }

    /// The resolved address when known, the raw target otherwise.
    pub fn address(&self) -> String {
        self.resolved_address
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| self.host.clone())
    }

    /// Empty when reverse resolution failed or was disabled.
    pub fn resolved_hostname(&self) -> &str {
        &self.resolved_hostname
    }

    pub fn ports(&self) -> &[PortProbeResult] {
        &self.ports
    }

    pub fn open_ports(&self) -> BTreeSet<u16> {
        self.ports
            .iter()
            .filter(|p| p.is_open())
            .map(PortProbeResult::port)
            .collect()
    }

    pub fn count_state(&self, state: PortState) -> usize {
        self.ports.iter().filter(|p| p.state() == state).count()
    }

    /// Whether at least one port was Open or Filtered.
    pub fn is_responsive(&self) -> bool {
        self.ports.iter().any(|p| p.state().is_responsive())
    }

    pub fn os_guess(&self) -> &str {
        &self.os_guess
    }

    pub fn os_confidence(&self) -> f32 {
        self.os_confidence
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkScanResult {
    target_spec: String,
    hosts: Vec<HostScanResult>,
    alive_count: usize,
    total_scanned: usize,
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    duration: Duration,
}

impl NetworkScanResult {
    /// Folds every scanned host into a network result.
    ///
    /// Hosts with no Open or Filtered port are dropped unless `include_down_hosts` is set.
    /// `alive_count` always counts responsive hosts; `total_scanned` counts all of them.
    pub fn from_hosts(
        target_spec: impl Into<String>,
        scanned: Vec<HostScanResult>,
        include_down_hosts: bool,
        duration: Duration,
    ) -> Self {
        let total_scanned = scanned.len();
        let alive_count = scanned.iter().filter(|h| h.is_responsive()).count();
        let hosts = scanned
            .into_iter()
            .filter(|h| include_down_hosts || h.is_responsive())
            .collect();

        Self {
            target_spec: target_spec.into(),
            hosts,
            alive_count,
            total_scanned,
            duration,
        }
    }

    pub fn target_spec(&self) -> &str {
        &self.target_spec
    }

    pub fn hosts(&self) -> &[HostScanResult] {
        &self.hosts
    }

    pub fn alive_count(&self) -> usize {
        self.alive_count
    }

    pub fn total_scanned(&self) -> usize {
        self.total_scanned
    }

    pub fn duration(&self) -> Duration {
        self.duration
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
