use std::collections::BTreeSet;

use sweepr_common::network::host::OsGuess;

const WINDOWS_PORTS: [u16; 4] = [135, 139, 445, 3389];
const WINDOWS_STRONG_PORTS: [u16; 2] = [3389, 445];
const UNIX_PORTS: [u16; 3] = [22, 111, 2049];
const MACOS_PORTS: [u16; 2] = [548, 5900];
const NETWORK_DEVICE_PORTS: [u16; 2] = [161, 22];

/// Guesses the operating system from the set of open ports.
///
/// Rules are checked in a fixed order and the first one that applies wins. The result
/// is a hint for the operator; the confidence is deliberately modest.
pub fn guess_os(open_ports: &BTreeSet<u16>) -> OsGuess {
    let present = |candidates: &[u16]| {
        candidates
            .iter()
            .filter(|port| open_ports.contains(port))
            .count()
    };

    if present(&WINDOWS_PORTS) >= 2 {
        return OsGuess::new("Windows", 0.9);
    }
    if present(&WINDOWS_STRONG_PORTS) >= 1 {
        return OsGuess::new("Windows", 0.6);
    }
    if present(&UNIX_PORTS) >= 2 {
        return OsGuess::new("Linux/Unix", 0.7);
    }
    if present(&MACOS_PORTS) >= 1 {
        return OsGuess::new("macOS", 0.5);
    }
    if present(&NETWORK_DEVICE_PORTS) == NETWORK_DEVICE_PORTS.len() {
        return OsGuess::new("Network Device", 0.4);
    }
    OsGuess::unknown()
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
