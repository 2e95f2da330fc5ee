//! TCP connect probing.
//!
//! One probe is one full handshake against `(address, port)`, an optional client-first
//! request, and a short banner read. Every outcome, including failures, is folded into a
//! [`PortProbeResult`]; nothing here returns an error to the scheduler.

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use sweepr_common::config::ScanConfig;
use sweepr_common::network::port::{MAX_BANNER_LEN, PortProbeResult, PortState};
use sweepr_protocols::http;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, trace};

use crate::classify::classify_service;

/// How long further banner reads wait once the first chunk has arrived.
pub const BANNER_GRACE: Duration = Duration::from_millis(250);

/// Defines the strategy for probing transport-layer ports to identify active services.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, address: &str, port: u16, cfg: &ScanConfig) -> PortProbeResult;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TcpConnectProber;

#[async_trait]
impl Prober for TcpConnectProber {
    async fn probe(&self, address: &str, port: u16, cfg: &ScanConfig) -> PortProbeResult {
        probe(address, port, cfg.timeout).await
    }
}

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("deadline elapsed")]
    Timeout,
    #[error("connection refused")]
    Refused,
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ProbeError {
    fn from_connect(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::ConnectionRefused | io::ErrorKind::ConnectionReset => Self::Refused,
            _ => Self::Io(err),
        }
    }

    pub fn state(&self) -> PortState {
        match self {
            Self::Refused => PortState::Closed,
            Self::Timeout | Self::Io(_) => PortState::Filtered,
        }
    }
}

/// Probes a single port. `deadline_after` bounds connect and banner read together.
pub async fn probe(address: &str, port: u16, deadline_after: Duration) -> PortProbeResult {
    let started: Instant = Instant::now();
    let deadline: Instant = started + deadline_after;

    match connect(address, port, deadline).await {
        Ok(stream) => {
            let latency: Duration = started.elapsed();
            let banner: String = grab_banner(stream, address, port, deadline).await;
            let (service, version) = classify_service(port, &banner);
            debug!(address, port, service = %service, "open");
            PortProbeResult::new(port, PortState::Open, service, version, &banner, latency)
        }
        Err(err) => {
            let latency: Duration = started.elapsed();
            trace!(address, port, %err, "probe failed");
            let (service, version) = classify_service(port, "");
            PortProbeResult::new(port, err.state(), service, version, "", latency)
        }
    }
}

async fn connect(address: &str, port: u16, deadline: Instant) -> Result<TcpStream, ProbeError> {
    match timeout_at(deadline, TcpStream::connect((address, port))).await {
        Ok(Ok(stream)) => Ok(stream),
        Ok(Err(err)) => Err(ProbeError::from_connect(err)),
        Err(_elapsed) => Err(ProbeError::Timeout),
    }
}

/// Reads whatever the service volunteers. The stream is dropped, and so closed, on return.
async fn grab_banner(mut stream: TcpStream, address: &str, port: u16, deadline: Instant) -> String {
    if http::is_client_first(port) {
        let request: Vec<u8> = http::head_request(address);
        match timeout_at(deadline, stream.write_all(&request)).await {
            Ok(Ok(())) => {}
            _ => return String::new(),
        }
    }

    let mut buf: Vec<u8> = vec![0u8; MAX_BANNER_LEN];
    let mut filled: usize = 0;

    while filled < buf.len() {
        let read_deadline: Instant = if filled == 0 {
            deadline
        } else {
            deadline.min(Instant::now() + BANNER_GRACE)
        };
        match timeout_at(read_deadline, stream.read(&mut buf[filled..])).await {
            Ok(Ok(0)) | Ok(Err(_)) | Err(_) => break,
            Ok(Ok(n)) => filled += n,
        }
    }

    String::from_utf8_lossy(&buf[..filled]).into_owned()
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
