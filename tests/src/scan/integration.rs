use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use sweepr_common::config::ScanConfig;
use sweepr_common::error::ScanError;
use sweepr_common::network::port::{PortProbeResult, PortState};
use sweepr_common::network::ports::PortSpec;
use sweepr_core::export;
use sweepr_core::network::tcp::{Prober, TcpConnectProber};
use sweepr_core::scanner::resolver::Resolver;
use sweepr_core::scanner::{self, PortScanner};
use sweepr_core::summary;

use crate::util::{BLACKHOLE, banner_listener, closed_port};

fn config() -> ScanConfig {
    ScanConfig::default()
        .with_timeout(Duration::from_millis(400))
        .with_dns(false)
}

/// Real TCP prober that counts how often it was asked.
struct CountingProber {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Prober for CountingProber {
    async fn probe(&self, address: &str, port: u16, cfg: &ScanConfig) -> PortProbeResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        TcpConnectProber.probe(address, port, cfg).await
    }
}

struct NoDns;

#[async_trait]
impl Resolver for NoDns {
    async fn lookup(&self, host: &str) -> Result<IpAddr, ScanError> {
        Err(ScanError::ResolutionFailure {
            host: host.to_string(),
        })
    }

    async fn reverse(&self, _ip: IpAddr) -> Option<String> {
        None
    }
}

#[tokio::test]
async fn loopback_open_and_closed() {
    let open = banner_listener(b"SSH-2.0-OpenSSH_9.6p1\r\n").await;
    let closed = closed_port().await;
    let ports = PortSpec::from([closed, open].as_slice());

    let host = scanner::scan_host("127.0.0.1", &ports, &config()).await;

    assert_eq!(host.ports().len(), 2);
    let by_port = |p: u16| host.ports().iter().find(|r| r.port() == p).unwrap();
    assert_eq!(by_port(open).state(), PortState::Open);
    assert_eq!(by_port(open).service(), "ssh");
    assert_eq!(by_port(open).version(), "9.6p1");
    assert_eq!(by_port(closed).state(), PortState::Closed);
    assert_eq!(by_port(closed).banner(), "");
    assert!(host.is_responsive());
}

#[tokio::test]
async fn unroutable_target_is_filtered() {
    let ports = PortSpec::from([9999u16].as_slice());
    let host = scanner::scan_host(&BLACKHOLE.to_string(), &ports, &config()).await;

    assert_eq!(host.ports()[0].state(), PortState::Filtered);
    assert!(host.ports()[0].latency() < Duration::from_secs(2));
}

#[tokio::test]
async fn network_scan_covers_all_three_states() {
    let open = banner_listener(b"220 (vsFTPd 3.0.5)\r\n").await;
    let closed = closed_port().await;
    let ports = PortSpec::from([open, closed, 9999].as_slice());
    let spec = format!("127.0.0.1, {BLACKHOLE}");

    let result = scanner::scan_network(&spec, &ports, &config()).await.unwrap();

    assert_eq!(result.total_scanned(), 2);
    let states: Vec<PortState> = result
        .hosts()
        .iter()
        .flat_map(|h| h.ports())
        .map(|p| p.state())
        .collect();
    assert!(states.contains(&PortState::Open));
    assert!(states.contains(&PortState::Closed));
    assert!(states.contains(&PortState::Filtered));

    let loopback = &result.hosts()[0];
    let ftp = loopback.ports().iter().find(|p| p.port() == open).unwrap();
    assert_eq!(ftp.service(), "ftp");
    assert_eq!(ftp.version(), "3.0.5");
}

#[tokio::test]
async fn results_are_sorted_by_port() {
    let mut ports: Vec<u16> = Vec::new();
    for _ in 0..5 {
        ports.push(banner_listener(b"+OK ready\r\n").await);
        ports.push(closed_port().await);
    }
    ports.reverse();
    let spec = PortSpec::from(ports.as_slice());

    let host = scanner::scan_host("127.0.0.1", &spec, &config().with_max_concurrent(3)).await;

    let order: Vec<u16> = host.ports().iter().map(|p| p.port()).collect();
    let mut expected = ports.clone();
    expected.sort_unstable();
    expected.dedup();
    assert_eq!(order, expected);
}

#[tokio::test]
async fn stealth_scan_on_loopback() {
    let open = banner_listener(b"* OK IMAP4rev1 ready\r\n").await;
    let closed = closed_port().await;
    let ports = PortSpec::from([open, closed].as_slice());
    let cfg = config().with_stealth_delay_ms(1..=5);

    let host = scanner::stealth_scan("127.0.0.1", &ports, &cfg).await;

    let mut expected = vec![open, closed];
    expected.sort_unstable();
    let order: Vec<u16> = host.ports().iter().map(|p| p.port()).collect();
    assert_eq!(order, expected);
    assert_eq!(host.open_ports().len(), 1);
}

#[tokio::test]
async fn invalid_spec_fails_before_any_probe() {
    let calls = Arc::new(AtomicUsize::new(0));
    let prober = CountingProber {
        calls: Arc::clone(&calls),
    };
    let scanner = PortScanner::new(prober, NoDns);
    let ports = PortSpec::from([22u16].as_slice());

    let err = scanner
        .scan_network("127.0.0.1,10.0.0.300", &ports, &config())
        .await
        .unwrap_err();

    assert!(matches!(err, ScanError::InvalidSpec(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);
    let scanner = scanner.with_progress(Arc::new(move |_: u16| {
        counter.fetch_add(1, Ordering::SeqCst);
    }));
    scanner
        .scan_network("127.0.0.1", &ports, &config())
        .await
        .unwrap();
    assert_eq!(seen.load(Ordering::SeqCst), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn down_hosts_are_dropped_unless_requested() {
    let closed = closed_port().await;
    let ports = PortSpec::from([closed].as_slice());

    let result = scanner::scan_network("127.0.0.1", &ports, &config()).await.unwrap();
    assert_eq!(result.alive_count(), 0);
    assert!(result.hosts().is_empty());

    let cfg = config().with_include_down_hosts(true);
    let result = scanner::scan_network("127.0.0.1", &ports, &cfg).await.unwrap();
    assert_eq!(result.hosts().len(), 1);
    assert_eq!(result.hosts()[0].ports()[0].state(), PortState::Closed);
}

#[tokio::test]
async fn reports_from_a_real_scan() {
    let ssh = banner_listener(b"SSH-2.0-OpenSSH_8.9\r\n").await;
    let redis = banner_listener(b"-ERR unknown command, redis says hi\r\n").await;
    let ports = PortSpec::from([ssh, redis].as_slice());

    let result = scanner::scan_network("127.0.0.1", &ports, &config()).await.unwrap();

    let stats = summary::summarize(result.hosts(), 5);
    assert_eq!(stats.total_open_ports, 2);
    assert_eq!(stats.hosts_up, 1);
    assert_eq!(stats.avg_open_per_host, 2.0);

    let csv = export::to_csv(result.hosts()).unwrap();
    assert!(csv.starts_with("ip,port,protocol,state,service,version,response_time_ms"));
    assert!(csv.contains(&format!("127.0.0.1,{ssh},tcp,open,ssh,8.9,")));

    let json = export::to_json(result.hosts()).unwrap();
    assert!(json.contains("\"ip\": \"127.0.0.1\""));
    assert!(json.contains("\"service\": \"redis\""));
}
