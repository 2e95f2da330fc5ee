use std::net::IpAddr;

/// Builds the reverse-lookup name for `ip`, e.g. `4.3.2.1.in-addr.arpa`.
pub fn reverse_address_to_ptr(ip: &IpAddr) -> String {
    match ip {
        IpAddr::V4(v4) => {
            let [a, b, c, d] = v4.octets();
            format!("{d}.{c}.{b}.{a}.in-addr.arpa")
        }
        IpAddr::V6(v6) => {
            let nibbles: Vec<String> = v6
                .octets()
                .iter()
                .rev()
                .flat_map(|byte| [byte & 0x0f, byte >> 4])
                .map(|nibble| format!("{nibble:x}"))
                .collect();
            format!("{}.ip6.arpa", nibbles.join("."))
        }
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
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn ptr_name_for_ipv4() {
        let ip = IpAddr::V4(Ipv4Addr::new(192, 0, 2, 10));
        assert_eq!(reverse_address_to_ptr(&ip), "10.2.0.192.in-addr.arpa");
    }

    #[test]
    fn ptr_name_for_ipv6() {
        let ip = IpAddr::V6(Ipv6Addr::LOCALHOST);
        let ptr = reverse_address_to_ptr(&ip);
        assert!(ptr.starts_with("1.0.0.0."));
        assert!(ptr.ends_with(".ip6.arpa"));
        assert_eq!(ptr.split('.').count(), 32 + 2);
    }
}
