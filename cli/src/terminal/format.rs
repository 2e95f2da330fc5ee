use colored::*;
use sweepr_common::network::host::HostScanResult;
use sweepr_common::network::port::{PortProbeResult, PortState};

use crate::terminal::colors;

type Detail = (String, ColoredString);

pub fn state_color(state: PortState) -> Color {
    match state {
        PortState::Open => colors::PORT_OPEN,
        PortState::Closed => colors::PORT_CLOSED,
        PortState::Filtered => colors::PORT_FILTERED,
    }
}

/// `22/tcp` -> `open     ssh OpenSSH 9.6p1`
pub fn port_to_detail(port: &PortProbeResult) -> Detail {
    let key: String = format!("{}/{}", port.port(), port.protocol());
    let state: ColoredString = format!("{:<8}", port.state().as_str()).color(state_color(port.state()));
    let mut value: String = format!("{} {}", state, port.service().color(colors::SERVICE));
    if !port.version().is_empty() {
        value.push_str(&format!(" {}", port.version().color(colors::VERSION)));
    }
    (key, value.normal())
}

pub fn os_to_detail(host: &HostScanResult) -> Option<Detail> {
    if host.os_confidence() == 0.0 {
        return None;
    }
    let confidence: u32 = (host.os_confidence() * 100.0).round() as u32;
    let value: String = format!(
        "{} {}",
        host.os_guess().color(colors::ACCENT),
        format!("({confidence}%)").color(colors::SEPARATOR)
    );
    Some(("OS".to_string(), value.normal()))
}

/// Counts of the non-open states, for hosts where those ports are not listed one by one.
pub fn hidden_ports_to_detail(host: &HostScanResult) -> Option<Detail> {
    let closed: usize = host.count_state(PortState::Closed);
    let filtered: usize = host.count_state(PortState::Filtered);
    if closed + filtered == 0 {
        return None;
    }
    let value: String = format!(
        "{} closed, {} filtered",
        closed.to_string().color(colors::PORT_CLOSED),
        filtered.to_string().color(colors::PORT_FILTERED)
    );
    Some(("Other".to_string(), value.normal()))
}

/// Tree rows for one host. Closed and filtered ports are only listed individually when
/// `show_all` is set.
pub fn host_to_details(host: &HostScanResult, show_all: bool) -> Vec<Detail> {
    let mut details: Vec<Detail> = Vec::new();
    if let Some(os) = os_to_detail(host) {
        details.push(os);
    }

    details.extend(
        host.ports()
            .iter()
            .filter(|p| show_all || p.is_open())
            .map(port_to_detail),
    );

    if !show_all && let Some(hidden) = hidden_ports_to_detail(host) {
        details.push(hidden);
    }
    details
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
