//! The scan scheduler.
//!
//! [`PortScanner`] fans the probes for one host out over a task group gated by a counting
//! semaphore, waits for every one of them, then folds the outcomes into a
//! [`HostScanResult`]. Network scans walk their hosts one after another, so the
//! concurrency bound always applies per host.
//!
//! The prober and the resolver are generic parameters, so tests drive the
//! scheduler without touching the network.

use std::collections::{BTreeSet, HashMap};
use std::net::IpAddr;
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use rand::seq::SliceRandom;
use sweepr_common::config::ScanConfig;
use sweepr_common::error::ScanError;
use sweepr_common::network::host::{HostScanResult, NetworkScanResult};
use sweepr_common::network::port::{PortProbeResult, PortState};
use sweepr_common::network::ports::PortSpec;
use sweepr_common::network::target::parse_targets_bounded;
use tokio::sync::Semaphore;
use tokio::task::{Id, JoinSet};
use tracing::{debug, warn};

use crate::classify::{classify_service, guess_os};
use crate::network::tcp::{Prober, TcpConnectProber};

pub mod resolver;

use resolver::{Resolver, SystemResolver};

/// Called with the port number each time a probe completes.
pub type ProgressFn = Arc<dyn Fn(u16) + Send + Sync>;

/// How probes for one host are dispatched.
#[derive(Debug, Clone)]
enum Dispatch {
    /// Port order, up to `max_concurrent` in flight.
    Parallel,
    /// Shuffled order, one in flight, random pause between dispatches.
    Stealth { delay_ms: RangeInclusive<u64> },
}

pub struct PortScanner<P = TcpConnectProber, R = SystemResolver> {
    prober: Arc<P>,
    resolver: R,
    on_probe: Option<ProgressFn>,
}

impl PortScanner {
    /// TCP connect probing with the operating system's resolver configuration.
    pub fn system() -> Self {
        Self::new(TcpConnectProber, SystemResolver::from_system())
    }
}

impl Default for PortScanner {
    fn default() -> Self {
        Self::system()
    }
}

impl<P, R> PortScanner<P, R>
where
    P: Prober + 'static,
    R: Resolver,
{
    pub fn new(prober: P, resolver: R) -> Self {
        Self {
            prober: Arc::new(prober),
            resolver,
            on_probe: None,
        }
    }

    pub fn with_progress(mut self, on_probe: ProgressFn) -> Self {
        self.on_probe = Some(on_probe);
        self
    }

    /// Scans every port in `ports` on one host.
    ///
    /// Never fails: unreachable ports become Filtered, refused ones Closed, and a failed
    /// name lookup falls back to probing the raw target string.
    pub async fn scan_host(
        &self,
        address: &str,
        ports: &PortSpec,
        cfg: &ScanConfig,
    ) -> HostScanResult {
        self.scan_host_with(address, ports, cfg, Dispatch::Parallel)
            .await
    }

    /// Like [`scan_host`](Self::scan_host), but probes in random order, one at a time,
    /// with a random delay drawn from `cfg.stealth_delay_ms` between dispatches.
    pub async fn stealth_scan(
        &self,
        address: &str,
        ports: &PortSpec,
        cfg: &ScanConfig,
    ) -> HostScanResult {
        let dispatch = Dispatch::Stealth {
            delay_ms: cfg.stealth_delay_ms.clone(),
        };
        self.scan_host_with(address, ports, cfg, dispatch).await
    }

    /// Parses `target_spec` and scans each host in turn.
    ///
    /// Malformed specs and configs are rejected before the first probe is sent.
    pub async fn scan_network(
        &self,
        target_spec: &str,
        ports: &PortSpec,
        cfg: &ScanConfig,
    ) -> Result<NetworkScanResult, ScanError> {
        self.scan_targets(target_spec, ports, cfg, Dispatch::Parallel)
            .await
    }

    /// [`scan_network`](Self::scan_network) with every host scanned in stealth mode.
    pub async fn stealth_scan_network(
        &self,
        target_spec: &str,
        ports: &PortSpec,
        cfg: &ScanConfig,
    ) -> Result<NetworkScanResult, ScanError> {
        let dispatch = Dispatch::Stealth {
            delay_ms: cfg.stealth_delay_ms.clone(),
        };
        self.scan_targets(target_spec, ports, cfg, dispatch).await
    }

    async fn scan_targets(
        &self,
        target_spec: &str,
        ports: &PortSpec,
        cfg: &ScanConfig,
        dispatch: Dispatch,
    ) -> Result<NetworkScanResult, ScanError> {
        cfg.validate()?;
        let targets = parse_targets_bounded(target_spec, cfg.max_hosts.unwrap_or(usize::MAX))?;
        if ports.is_empty() {
            return Err(ScanError::InvalidSpec("no ports to scan".to_string()));
        }

        let started: Instant = Instant::now();
        let mut hosts: Vec<HostScanResult> = Vec::with_capacity(targets.len());
        for host in &targets {
            let result = self
                .scan_host_with(host, ports, cfg, dispatch.clone())
                .await;
            hosts.push(result);
        }

        Ok(NetworkScanResult::from_hosts(
            target_spec,
            hosts,
            cfg.include_down_hosts,
            started.elapsed(),
        ))
    }

    async fn scan_host_with(
        &self,
        address: &str,
        ports: &PortSpec,
        cfg: &ScanConfig,
        dispatch: Dispatch,
    ) -> HostScanResult {
        let started: Instant = Instant::now();
        let timestamp = Utc::now();

        let resolved_address: Option<IpAddr> = self.resolve(address, cfg).await;
        let probe_target: Arc<str> = match resolved_address {
            Some(ip) => Arc::from(ip.to_string()),
            None => Arc::from(address),
        };

        let mut order: Vec<u16> = ports.iter().collect();
        let (limit, delay_ms) = match dispatch {
            Dispatch::Parallel => (cfg.max_concurrent.max(1), None),
            Dispatch::Stealth { delay_ms } => {
                order.shuffle(&mut rand::rng());
                (1, Some(delay_ms))
            }
        };

        debug!(
            "scanning {} ports on {address} with {limit} in flight",
            order.len()
        );
        let results: Vec<PortProbeResult> = self
            .probe_all(probe_target, order, cfg, limit, delay_ms)
            .await;

        let resolved_hostname: String = match resolved_address {
            Some(ip) if cfg.resolve_dns => self.resolver.reverse(ip).await.unwrap_or_default(),
            _ => String::new(),
        };

        let open_ports: BTreeSet<u16> = results
            .iter()
            .filter(|p| p.is_open())
            .map(PortProbeResult::port)
            .collect();
        let os = guess_os(&open_ports);

        HostScanResult::new(
            address,
            resolved_address,
            resolved_hostname,
            results,
            os,
            started.elapsed(),
            timestamp,
        )
    }

    async fn resolve(&self, address: &str, cfg: &ScanConfig) -> Option<IpAddr> {
        if let Ok(ip) = address.parse::<IpAddr>() {
            return Some(ip);
        }
        if !cfg.resolve_dns {
            return None;
        }
        match self.resolver.lookup(address).await {
            Ok(ip) => Some(ip),
            Err(e) => {
                warn!("{e}, probing the name as given");
                None
            }
        }
    }

    /// Runs one probe per port and waits for all of them.
    ///
    /// A permit is taken before each task is spawned and moved into it, so it is
    /// released however the task ends. A task that panics is recorded as Filtered for
    /// its own port.
    async fn probe_all(
        &self,
        address: Arc<str>,
        order: Vec<u16>,
        cfg: &ScanConfig,
        limit: usize,
        delay_ms: Option<RangeInclusive<u64>>,
    ) -> Vec<PortProbeResult> {
        let semaphore: Arc<Semaphore> = Arc::new(Semaphore::new(limit));
        let shared_cfg: Arc<ScanConfig> = Arc::new(cfg.clone());
        let mut tasks: JoinSet<PortProbeResult> = JoinSet::new();
        let mut in_flight: HashMap<Id, u16> = HashMap::with_capacity(order.len());

        for (i, port) in order.into_iter().enumerate() {
            let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                break;
            };
            if let Some(window) = &delay_ms
                && i > 0
            {
                tokio::time::sleep(random_delay(window)).await;
            }

            let prober = Arc::clone(&self.prober);
            let address = Arc::clone(&address);
            let cfg = Arc::clone(&shared_cfg);
            let on_probe = self.on_probe.clone();

            let handle = tasks.spawn(async move {
                let _permit = permit;
                let result = prober.probe(&address, port, &cfg).await;
                if let Some(cb) = on_probe {
                    cb(port);
                }
                result
            });
            in_flight.insert(handle.id(), port);
        }

        let mut results: Vec<PortProbeResult> = Vec::with_capacity(in_flight.len());
        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((id, result)) => {
                    in_flight.remove(&id);
                    if cfg.verbose {
                        debug!(
                            port = result.port(),
                            state = result.state().as_str(),
                            latency_ms = result.latency().as_millis() as u64,
                            "probe finished on {address}"
                        );
                    }
                    results.push(result);
                }
                Err(err) => {
                    let Some(port) = in_flight.remove(&err.id()) else {
                        continue;
                    };
                    warn!("probe for port {port} on {address} aborted: {err}");
                    if let Some(cb) = &self.on_probe {
                        cb(port);
                    }
                    results.push(failed_probe(port));
                }
            }
        }

        results.sort_by_key(PortProbeResult::port);
        results
    }
}

fn failed_probe(port: u16) -> PortProbeResult {
    let (service, version) = classify_service(port, "");
    PortProbeResult::new(port, PortState::Filtered, service, version, "", Duration::ZERO)
}

fn random_delay(window_ms: &RangeInclusive<u64>) -> Duration {
    let (lo, hi) = (*window_ms.start(), *window_ms.end());
    let ms: u64 = if lo >= hi {
        lo
    } else {
        rand::random_range(lo..=hi)
    };
    Duration::from_millis(ms)
}

/// Scans one host with the TCP connect prober and the system resolver.
pub async fn scan_host(address: &str, ports: &PortSpec, cfg: &ScanConfig) -> HostScanResult {
    PortScanner::system().scan_host(address, ports, cfg).await
}

pub async fn scan_network(
    target_spec: &str,
    ports: &PortSpec,
    cfg: &ScanConfig,
) -> Result<NetworkScanResult, ScanError> {
    PortScanner::system()
        .scan_network(target_spec, ports, cfg)
        .await
}

pub async fn stealth_scan(address: &str, ports: &PortSpec, cfg: &ScanConfig) -> HostScanResult {
    PortScanner::system()
        .stealth_scan(address, ports, cfg)
        .await
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
