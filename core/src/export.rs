//! Machine-readable renderings of finished scans.
//!
//! Both formats are pure functions of the results. Where the bytes end up (stdout, a
//! file, an HTTP body) is decided by the caller.

use std::io;

use anyhow::Context;
use serde::Serialize;
use sweepr_common::network::host::HostScanResult;
use sweepr_common::network::port::PortState;

pub const CSV_HEADER: [&str; 7] = [
    "ip",
    "port",
    "protocol",
    "state",
    "service",
    "version",
    "response_time_ms",
];

#[derive(Serialize)]
struct JsonHost<'a> {
    ip: String,
    hostname: &'a str,
    os: &'a str,
    scan_time: String,
    ports: Vec<JsonPort<'a>>,
}

#[derive(Serialize)]
struct JsonPort<'a> {
    port: u16,
    service: &'a str,
    state: PortState,
}

impl<'a> From<&'a HostScanResult> for JsonHost<'a> {
    fn from(host: &'a HostScanResult) -> Self {
        Self {
            ip: host.address(),
            hostname: host.resolved_hostname(),
            os: host.os_guess(),
            scan_time: host.timestamp().to_rfc3339(),
            ports: host
                .ports()
                .iter()
                .map(|p| JsonPort {
                    port: p.port(),
                    service: p.service(),
                    state: p.state(),
                })
                .collect(),
        }
    }
}

/// Pretty-printed JSON array, one object per host.
pub fn to_json(hosts: &[HostScanResult]) -> anyhow::Result<String> {
    let documents: Vec<JsonHost> = hosts.iter().map(JsonHost::from).collect();
    serde_json::to_string_pretty(&documents).context("serializing scan results")
}

/// One CSV row per probed port, header first.
pub fn write_csv<W: io::Write>(hosts: &[HostScanResult], writer: W) -> anyhow::Result<()> {
    let mut csv = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv.write_record(CSV_HEADER)?;

    for host in hosts {
        let ip: String = host.address();
        for port in host.ports() {
            let port_number: String = port.port().to_string();
            let latency_ms: String = format!("{:.3}", port.latency().as_secs_f64() * 1_000.0);
            csv.write_record([
                ip.as_str(),
                port_number.as_str(),
                port.protocol().as_str(),
                port.state().as_str(),
                port.service(),
                port.version(),
                latency_ms.as_str(),
            ])?;
        }
    }

    csv.flush().context("flushing csv output")?;
    Ok(())
}

pub fn to_csv(hosts: &[HostScanResult]) -> anyhow::Result<String> {
    let mut buf: Vec<u8> = Vec::new();
    write_csv(hosts, &mut buf)?;
    String::from_utf8(buf).context("csv output is not utf-8")
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
    use chrono::{TimeZone, Utc};
    use std::net::IpAddr;
    use std::time::Duration;
    use sweepr_common::network::host::OsGuess;
    use sweepr_common::network::port::PortProbeResult;

    fn sample() -> HostScanResult {
        HostScanResult::new(
            "gateway.lan",
            Some("192.168.1.1".parse::<IpAddr>().unwrap()),
            "gateway.lan",
            vec![
                PortProbeResult::new(
                    80,
                    PortState::Open,
                    "http",
                    "2.4.57",
                    "HTTP/1.1 200 OK",
                    Duration::from_micros(1_500),
                ),
                PortProbeResult::new(22, PortState::Closed, "ssh", "", "", Duration::from_millis(2)),
            ],
            OsGuess::new("Linux/Unix", 0.7),
            Duration::from_millis(40),
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        )
    }

    #[test]
    fn json_shape() {
        let json = to_json(&[sample()]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let host = &value[0];

        assert_eq!(host["ip"], "192.168.1.1");
        assert_eq!(host["hostname"], "gateway.lan");
        assert_eq!(host["os"], "Linux/Unix");
        assert_eq!(host["scan_time"], "2024-05-01T12:00:00+00:00");
        assert_eq!(host["ports"][0]["port"], 22);
        assert_eq!(host["ports"][0]["state"], "closed");
        assert_eq!(host["ports"][1]["service"], "http");
        assert_eq!(host["ports"][1]["state"], "open");
    }

    #[test]
    fn json_of_nothing_is_an_empty_array() {
        assert_eq!(to_json(&[]).unwrap(), "[]");
    }

    #[test]
    fn csv_rows() {
        let csv = to_csv(&[sample()]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "ip,port,protocol,state,service,version,response_time_ms");
        assert_eq!(lines[1], "192.168.1.1,22,tcp,closed,ssh,,2.000");
        assert_eq!(lines[2], "192.168.1.1,80,tcp,open,http,2.4.57,1.500");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn csv_header_even_without_hosts() {
        let csv = to_csv(&[]).unwrap();
        assert_eq!(csv.trim_end(), CSV_HEADER.join(","));
    }
}
