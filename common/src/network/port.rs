use std::fmt;
use std::time::Duration;

use serde::{Serialize, Serializer};

/// Upper bound on captured banner bytes.
pub const MAX_BANNER_LEN: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PortState {
    /// The handshake completed.
    Open,
    /// The peer actively refused the connection.
    Closed,
    /// No definitive answer before the deadline.
    Filtered,
}

impl PortState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PortState::Open => "open",
            PortState::Closed => "closed",
            PortState::Filtered => "filtered",
        }
    }

    /// Whether the host answered on this port in a way that suggests it is alive.
    pub fn is_responsive(&self) -> bool {
        matches!(self, PortState::Open | PortState::Filtered)
    }
}

impl fmt::Display for PortState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The outcome of probing one (host, port) pair. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortProbeResult {
    port: u16,
    state: PortState,
    protocol: Protocol,
    service: String,
    version: String,
    banner: String,
    #[serde(rename = "response_time_ms", serialize_with = "serialize_millis")]
    latency: Duration,
}

impl PortProbeResult {
    /// Builds a TCP result. The banner is cut to [`MAX_BANNER_LEN`] bytes and its
    /// trailing whitespace trimmed.
    pub fn new(
        port: u16,
        state: PortState,
        service: impl Into<String>,
        version: impl Into<String>,
        banner: &str,
        latency: Duration,
    ) -> Self {
        Self {
            port,
            state,
            protocol: Protocol::Tcp,
            service: service.into(),
            version: version.into(),
            banner: normalize_banner(banner),
            latency,
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn state(&self) -> PortState {
        self.state
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn banner(&self) -> &str {
        &self.banner
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }

    pub fn is_open(&self) -> bool {
        self.state == PortState::Open
    }
}

/// Truncates to [`MAX_BANNER_LEN`] bytes on a char boundary, then trims trailing whitespace.
pub fn normalize_banner(raw: &str) -> String {
    let mut end = raw.len().min(MAX_BANNER_LEN);
    while !raw.is_char_boundary(end) {
        end -= 1;
    }
    raw[..end].trim_end().to_string()
}

pub(crate) fn serialize_millis<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64() * 1_000.0)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
