//! # IPv4 Range Model
//!
//! Continuous, inclusive ranges of IPv4 addresses, used by the target parser to
//! expand CIDR blocks (`10.0.0.0/24`) and last-octet ranges (`10.0.0.1-50`).

use std::net::Ipv4Addr;

use pnet::ipnetwork::Ipv4Network;

/// The prefix at which network and broadcast addresses are dropped from expansions.
pub const EXCLUDE_EDGES_PREFIX: u8 = 24;

/// Inclusive span of IPv4 addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ipv4Range {
    pub start_addr: Ipv4Addr,
    pub end_addr: Ipv4Addr,
}

impl Ipv4Range {
    pub fn new(start_addr: Ipv4Addr, end_addr: Ipv4Addr) -> Self {
        Self {
            start_addr,
            end_addr,
        }
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = Ipv4Addr> + Clone + use<> {
        (u32::from(self.start_addr)..=u32::from(self.end_addr)).map(Ipv4Addr::from)
    }

    /// Number of addresses in the range. Zero when `start > end`.
    pub fn len(&self) -> u64 {
        let start: u64 = u32::from(self.start_addr).into();
        let end: u64 = u32::from(self.end_addr).into();
        if start > end { 0 } else { end - start + 1 }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates the range skipping addresses whose last octet is `0` or `255`.
    pub fn iter_without_edges(&self) -> impl Iterator<Item = Ipv4Addr> + Clone {
        self.iter().filter(|addr| !matches!(addr.octets()[3], 0 | 255))
    }
}

/// Creates a range covering the entire network block of `ip/prefix`.
pub fn cidr_range(ip: Ipv4Addr, prefix: u8) -> anyhow::Result<Ipv4Range> {
    let network = Ipv4Network::new(ip, prefix)?;
    Ok(Ipv4Range::new(network.network(), network.broadcast()))
}

/// Lazily walks the addresses a scan of `ip/prefix` should visit.
///
/// A `/24` drops its network and broadcast addresses (254 hosts). Every other prefix is
/// expanded whole, so `/25` through `/30` keep `.0` and their broadcast address, and
/// `/31` point-to-point links keep both ends.
pub fn cidr_iter(ip: Ipv4Addr, prefix: u8) -> anyhow::Result<impl Iterator<Item = Ipv4Addr>> {
    let range = cidr_range(ip, prefix)?;
    let drop_edges: bool = prefix == EXCLUDE_EDGES_PREFIX;
    Ok(range
        .iter()
        .filter(move |addr| !drop_edges || !matches!(addr.octets()[3], 0 | 255)))
}

/// Number of addresses [`cidr_iter`] yields for `prefix`. Zero for prefixes above 32.
pub fn cidr_host_count(prefix: u8) -> u64 {
    match prefix {
        EXCLUDE_EDGES_PREFIX => 254,
        0..=32 => 1u64 << (32 - u32::from(prefix)),
        _ => 0,
    }
}

/// [`cidr_iter`], collected.
pub fn cidr_hosts(ip: Ipv4Addr, prefix: u8) -> anyhow::Result<Vec<Ipv4Addr>> {
    Ok(cidr_iter(ip, prefix)?.collect())
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
    fn test_range_is_inclusive() {
        let range = Ipv4Range::new(Ipv4Addr::new(10, 9, 8, 1), Ipv4Addr::new(10, 9, 8, 3));
        let last_octets: Vec<u8> = range.iter().map(|a| a.octets()[3]).collect();
        assert_eq!(last_octets, [1, 2, 3]);
        assert_eq!(range.len(), 3);
    }

    #[test]
    fn test_ipv4range_inverted_is_empty() {
        let range = Ipv4Range::new(Ipv4Addr::new(10, 0, 0, 5), Ipv4Addr::new(10, 0, 0, 1));
        assert!(range.is_empty());
        assert!(range.iter().next().is_none());
    }

    #[test]
    fn test_iter_without_edges_crosses_blocks() {
        let range = Ipv4Range::new(Ipv4Addr::new(10, 0, 0, 254), Ipv4Addr::new(10, 0, 1, 1));
        let addrs: Vec<Ipv4Addr> = range.iter_without_edges().collect();
        assert_eq!(
            addrs,
            vec![Ipv4Addr::new(10, 0, 0, 254), Ipv4Addr::new(10, 0, 1, 1)]
        );
    }

    #[test]
    fn test_cidr_range_masks_host_bits() {
        let range = cidr_range(Ipv4Addr::new(192, 168, 1, 100), 24).unwrap();
        assert_eq!(range.start_addr, Ipv4Addr::new(192, 168, 1, 0));
        assert_eq!(range.end_addr, Ipv4Addr::new(192, 168, 1, 255));
        assert_eq!(range.len(), 256);
    }

    #[test]
    fn test_cidr_range_whole_space() {
        let range = cidr_range(Ipv4Addr::new(10, 20, 30, 40), 0).unwrap();
        assert_eq!(range.start_addr, Ipv4Addr::new(0, 0, 0, 0));
        assert_eq!(range.end_addr, Ipv4Addr::new(255, 255, 255, 255));
    }

    #[test]
    fn test_cidr_range_rejects_prefix_33() {
        assert!(cidr_range(Ipv4Addr::new(192, 168, 1, 1), 33).is_err());
    }

    #[test]
    fn test_cidr_hosts_slash_24_drops_edges() {
        let hosts = cidr_hosts(Ipv4Addr::new(10, 0, 0, 0), 24).unwrap();
        assert_eq!(hosts.len(), 254);
        assert_eq!(hosts.first(), Some(&Ipv4Addr::new(10, 0, 0, 1)));
        assert_eq!(hosts.last(), Some(&Ipv4Addr::new(10, 0, 0, 254)));
    }

    #[test]
    fn test_cidr_hosts_slash_30_keeps_edges() {
        let hosts = cidr_hosts(Ipv4Addr::new(10, 0, 0, 0), 30).unwrap();
        assert_eq!(hosts.len(), 4);
        assert_eq!(hosts[0], Ipv4Addr::new(10, 0, 0, 0));
        assert_eq!(hosts[3], Ipv4Addr::new(10, 0, 0, 3));
    }

    #[test]
    fn test_cidr_hosts_slash_25_keeps_edges() {
        let hosts = cidr_hosts(Ipv4Addr::new(10, 0, 0, 0), 25).unwrap();
        assert_eq!(hosts.len(), 128);
        assert_eq!(hosts.first(), Some(&Ipv4Addr::new(10, 0, 0, 0)));
        assert_eq!(hosts.last(), Some(&Ipv4Addr::new(10, 0, 0, 127)));
    }

    #[test]
    fn test_cidr_host_count_matches_expansion() {
        for prefix in [16u8, 22, 24, 25, 29, 30, 31, 32] {
            let walked = cidr_iter(Ipv4Addr::new(10, 1, 0, 0), prefix).unwrap().count() as u64;
            assert_eq!(cidr_host_count(prefix), walked, "/{prefix}");
        }
        assert_eq!(cidr_host_count(0), 1 << 32);
        assert_eq!(cidr_host_count(33), 0);
    }

    #[test]
    fn test_cidr_hosts_slash_32_is_single() {
        let hosts = cidr_hosts(Ipv4Addr::new(172, 16, 0, 1), 32).unwrap();
        assert_eq!(hosts, vec![Ipv4Addr::new(172, 16, 0, 1)]);
    }
}
