//! A minimal HTTP front for the scanner.
//!
//! `GET /status` reports liveness, `GET /scan?target=..&ports=..` runs a network scan
//! and returns its result as JSON. All scanning is delegated to `sweepr_core`.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use anyhow::Context;
use serde_json::{Value, json};
use sweepr_common::config::ScanConfig;
use sweepr_common::error::ScanError;
use sweepr_common::network::ports::parse_ports;
use sweepr_common::{success, warn};
use sweepr_core::scanner;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tracing::debug;
use url::Url;

const MAX_REQUEST_LEN: usize = 8 * 1024;
const READ_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_PORTS: &str = "common";
const SERVE_MAX_HOSTS: usize = 4096;

pub async fn serve(bind: SocketAddr) -> anyhow::Result<()> {
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("binding {bind}"))?;
    success!("Listening on http://{}", listener.local_addr()?);

    let started: Instant = Instant::now();
    loop {
        let (stream, peer) = listener.accept().await?;
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, started).await {
                warn!("{peer}: {e}");
            }
        });
    }
}

async fn handle_connection(mut stream: TcpStream, started: Instant) -> anyhow::Result<()> {
    let request: String = timeout(READ_TIMEOUT, read_request_head(&mut stream))
        .await
        .context("request timed out")??;
    let request_line: &str = request.lines().next().unwrap_or_default();
    debug!("{request_line}");

    let (status, body) = route(request_line, started).await;
    let body: String = serde_json::to_string_pretty(&body)?;
    let response: String = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_line(status),
        body.len(),
        body
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await?;
    Ok(())
}

async fn read_request_head(stream: &mut TcpStream) -> anyhow::Result<String> {
    let mut buf: Vec<u8> = Vec::with_capacity(1024);
    let mut chunk: [u8; 1024] = [0u8; 1024];
    loop {
        let n: usize = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if buf.windows(4).any(|w| w == b"\r\n\r\n") || buf.len() >= MAX_REQUEST_LEN {
            break;
        }
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Maps a request line such as `GET /scan?target=10.0.0.1 HTTP/1.1` to a status and body.
pub(crate) async fn route(request_line: &str, started: Instant) -> (u16, Value) {
    let mut parts = request_line.split_whitespace();
    let (method, uri) = match (parts.next(), parts.next()) {
        (Some(method), Some(uri)) => (method, uri),
        _ => return (400, error_body("malformed request line")),
    };
    if method != "GET" {
        return (405, error_body("only GET is supported"));
    }

    let Ok(url) = Url::parse("http://localhost").and_then(|base| base.join(uri)) else {
        return (400, error_body("malformed request target"));
    };
    match url.path() {
        "/status" => (200, status_body(started)),
        "/scan" => scan_route(&url.query_pairs().into_owned().collect()).await,
        _ => (404, error_body("not found")),
    }
}

fn status_body(started: Instant) -> Value {
    json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": started.elapsed().as_secs(),
    })
}

async fn scan_route(params: &HashMap<String, String>) -> (u16, Value) {
    let Some(target) = params.get("target") else {
        return (400, error_body("missing 'target' parameter"));
    };
    let ports_spec: &str = params.get("ports").map_or(DEFAULT_PORTS, String::as_str);
    let ports = match parse_ports(ports_spec) {
        Ok(ports) => ports,
        Err(e) => return (400, error_body(&e.to_string())),
    };

    let mut cfg: ScanConfig = ScanConfig::default().with_max_hosts(Some(SERVE_MAX_HOSTS));
    if let Some(ms) = params.get("timeout").and_then(|v| v.parse::<u64>().ok()) {
        cfg = cfg.with_timeout(Duration::from_millis(ms));
    }
    if params.get("dns").is_some_and(|v| v == "0" || v == "false") {
        cfg = cfg.with_dns(false);
    }

    match scanner::scan_network(target, &ports, &cfg).await {
        Ok(result) => match serde_json::to_value(&result) {
            Ok(value) => (200, value),
            Err(e) => (500, error_body(&e.to_string())),
        },
        Err(e @ (ScanError::InvalidSpec(_) | ScanError::InvalidConfig(_))) => {
            (400, error_body(&e.to_string()))
        }
        Err(e) => (500, error_body(&e.to_string())),
    }
}

fn error_body(msg: &str) -> Value {
    json!({ "error": msg })
}

fn status_line(status: u16) -> &'static str {
    match status {
        200 => "200 OK",
        400 => "400 Bad Request",
        404 => "404 Not Found",
        405 => "405 Method Not Allowed",
        _ => "500 Internal Server Error",
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
