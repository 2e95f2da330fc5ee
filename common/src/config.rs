//! # Scan Configuration
//!
//! Every scan entry point receives its own [`ScanConfig`] by reference. There is no
//! process-wide default instance: two scans running side by side never observe each
//! other's settings.

use std::ops::RangeInclusive;
use std::time::Duration;

use crate::error::ScanError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1_500);
pub const DEFAULT_MAX_CONCURRENT: usize = 500;
pub const DEFAULT_STEALTH_DELAY_MS: RangeInclusive<u64> = 100..=500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Hard deadline for a single probe, covering connect and banner read.
    pub timeout: Duration,
    /// Upper bound on simultaneously in-flight probes for one host.
    pub max_concurrent: usize,
    /// Emit a debug event for every finished probe.
    pub verbose: bool,
    /// Keep hosts in the network result even when every port came back closed.
    pub include_down_hosts: bool,
    /// Let the scanner resolve hostname targets once up front and reverse-resolve the
    /// scanned address. When off, the scanner does no lookups of its own and a hostname
    /// target is handed to the operating system's resolver on every connect.
    pub resolve_dns: bool,
    /// Refuse target expressions that expand to more hosts than this. `None` expands
    /// anything from `/0` to `/32`.
    pub max_hosts: Option<usize>,
    /// Window, in milliseconds, from which stealth scans draw the inter-probe delay.
    pub stealth_delay_ms: RangeInclusive<u64>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            verbose: false,
            include_down_hosts: false,
            resolve_dns: true,
            max_hosts: None,
            stealth_delay_ms: DEFAULT_STEALTH_DELAY_MS,
        }
    }
}

impl ScanConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_include_down_hosts(mut self, include: bool) -> Self {
        self.include_down_hosts = include;
        self
    }

    pub fn with_dns(mut self, resolve_dns: bool) -> Self {
        self.resolve_dns = resolve_dns;
        self
    }

    pub fn with_max_hosts(mut self, max_hosts: Option<usize>) -> Self {
        self.max_hosts = max_hosts;
        self
    }

    pub fn with_stealth_delay_ms(mut self, window: RangeInclusive<u64>) -> Self {
        self.stealth_delay_ms = window;
        self
    }

    /// Checks the invariants the scheduler relies on.
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.max_concurrent == 0 {
            return Err(ScanError::InvalidConfig(
                "max_concurrent must be greater than zero".to_string(),
            ));
        }
        if self.max_hosts == Some(0) {
            return Err(ScanError::InvalidConfig(
                "max_hosts must be greater than zero".to_string(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(ScanError::InvalidConfig(
                "timeout must be greater than zero".to_string(),
            ));
        }
        if self.stealth_delay_ms.start() > self.stealth_delay_ms.end() {
            return Err(ScanError::InvalidConfig(format!(
                "stealth delay window {}-{}ms is inverted",
                self.stealth_delay_ms.start(),
                self.stealth_delay_ms.end()
            )));
        }
        Ok(())
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(ScanConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let cfg = ScanConfig::default().with_max_concurrent(0);
        assert!(matches!(cfg.validate(), Err(ScanError::InvalidConfig(_))));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let cfg = ScanConfig::default().with_timeout(Duration::ZERO);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn inverted_delay_window_is_rejected() {
        #[allow(clippy::reversed_empty_ranges)]
        let cfg = ScanConfig::default().with_stealth_delay_ms(500..=100);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn host_limit_defaults_to_unbounded() {
        assert_eq!(ScanConfig::default().max_hosts, None);
        let cfg = ScanConfig::default().with_max_hosts(Some(0));
        assert!(matches!(cfg.validate(), Err(ScanError::InvalidConfig(_))));
        assert!(ScanConfig::default().with_max_hosts(Some(1)).validate().is_ok());
    }

    #[test]
    fn builders_do_not_touch_other_instances() {
        let a = ScanConfig::default();
        let b = a.clone().with_timeout(Duration::from_millis(10));
        assert_eq!(a.timeout, DEFAULT_TIMEOUT);
        assert_eq!(b.timeout, Duration::from_millis(10));
    }
}
