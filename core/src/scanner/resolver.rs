use std::{
    net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr},
    sync::atomic::{AtomicU16, Ordering},
    time::Duration,
};

use anyhow::{Context, bail};
use async_trait::async_trait;
use sweepr_common::error::ScanError;
use sweepr_protocols::dns::{self, DNS_PORT};
use tokio::net::UdpSocket;
use tokio::time::{Instant, timeout, timeout_at};
use tracing::debug;

const RESOLV_CONF: &str = "/etc/resolv.conf";
const FALLBACK_NAMESERVER: IpAddr = IpAddr::V4(Ipv4Addr::new(1, 1, 1, 1));
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(2);
const PTR_TIMEOUT: Duration = Duration::from_millis(750);
const MAX_DNS_PAYLOAD: usize = 512;

/// Name resolution around a host scan. Both directions are best effort.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Maps a target to an address. IP literals never hit the network.
    async fn lookup(&self, host: &str) -> Result<IpAddr, ScanError>;

    /// Reverse (PTR) lookup. `None` on any failure.
    async fn reverse(&self, ip: IpAddr) -> Option<String>;
}

/// Forward lookups through the operating system, reverse lookups sent straight to the
/// configured nameserver.
pub struct SystemResolver {
    nameserver: SocketAddr,
    id_counter: AtomicU16,
}

impl SystemResolver {
    pub fn new(nameserver: IpAddr) -> Self {
        Self {
            nameserver: SocketAddr::new(nameserver, DNS_PORT),
            id_counter: AtomicU16::new(rand::random()),
        }
    }

    /// Uses the first `nameserver` line of `/etc/resolv.conf`, or 1.1.1.1.
    pub fn from_system() -> Self {
        let nameserver: IpAddr = std::fs::read_to_string(RESOLV_CONF)
            .ok()
            .and_then(|contents| nameserver_from_resolv_conf(&contents))
            .unwrap_or(FALLBACK_NAMESERVER);
        Self::new(nameserver)
    }

    pub fn nameserver(&self) -> SocketAddr {
        self.nameserver
    }

    async fn query_ptr(&self, ip: IpAddr) -> anyhow::Result<String> {
        let id: u16 = self.get_next_trans_id();
        let packet: Vec<u8> = dns::create_ptr_packet(&ip, id)?;

        let bind_addr: SocketAddr = match self.nameserver {
            SocketAddr::V4(_) => SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
            SocketAddr::V6(_) => SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0),
        };
        let socket: UdpSocket = UdpSocket::bind(bind_addr).await.context("binding udp socket")?;
        socket.connect(self.nameserver).await?;
        socket.send(&packet).await?;

        let deadline: Instant = Instant::now() + PTR_TIMEOUT;
        let mut buf: [u8; MAX_DNS_PAYLOAD] = [0u8; MAX_DNS_PAYLOAD];
        loop {
            let len: usize = match timeout_at(deadline, socket.recv(&mut buf)).await {
                Ok(res) => res?,
                Err(_) => bail!("no answer from {} for {ip}", self.nameserver),
            };
            // Stray datagrams for other ids are skipped until the deadline.
            if let Ok((response_id, hostname)) = dns::get_hostname(&buf[..len])
                && response_id == id
            {
                return Ok(hostname);
            }
        }
    }

    fn get_next_trans_id(&self) -> u16 {
        self.id_counter.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for SystemResolver {
    fn default() -> Self {
        Self::from_system()
    }
}

#[async_trait]
impl Resolver for SystemResolver {
    async fn lookup(&self, host: &str) -> Result<IpAddr, ScanError> {
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(ip);
        }
        let failure = || ScanError::ResolutionFailure {
            host: host.to_string(),
        };

        let mut addrs = timeout(LOOKUP_TIMEOUT, tokio::net::lookup_host((host, 0)))
            .await
            .map_err(|_| failure())?
            .map_err(|_| failure())?
            .map(|addr| addr.ip())
            .collect::<Vec<IpAddr>>();

        // Prefer IPv4, most targets are only reachable that way.
        addrs.sort_by_key(|ip| ip.is_ipv6());
        addrs.into_iter().next().ok_or_else(failure)
    }

    async fn reverse(&self, ip: IpAddr) -> Option<String> {
        match self.query_ptr(ip).await {
            Ok(hostname) => Some(hostname),
            Err(e) => {
                debug!("reverse lookup for {ip} failed: {e}");
                None
            }
        }
    }
}

fn nameserver_from_resolv_conf(contents: &str) -> Option<IpAddr> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#') && !line.starts_with(';'))
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            match (fields.next(), fields.next()) {
                (Some("nameserver"), Some(addr)) => addr.parse::<IpAddr>().ok(),
                _ => None,
            }
        })
        .next()
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
