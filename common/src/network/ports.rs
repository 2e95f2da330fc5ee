//! # Port Specifications
//!
//! Parses port expressions into a de-duplicated, order-preserving [`PortSpec`].
//!
//! Accepted tokens, comma-separated:
//! * `-`: every port, `1-65535`.
//! * `common`: a short curated list of well-known service ports.
//! * `top100` / `top1000`: the most frequently open ports, by rank. The ranking
//!   holds fewer than a thousand entries, so `top1000` fills the remainder with the
//!   lowest unranked port numbers in ascending order.
//! * `N` or `start-end`: literal ports and inclusive ranges within `1-65535`.

use std::collections::HashSet;
use std::str::FromStr;

use crate::error::ScanError;

pub const ALL_PORTS_TOKEN: &str = "-";

pub const COMMON_PORTS: &[u16] = &[
    21, 22, 23, 25, 53, 80, 110, 111, 135, 139, 143, 443, 445, 548, 587, 993, 995, 1433, 1521,
    1723, 2049, 3306, 3389, 5432, 5900, 6379, 8000, 8080, 8443, 27017,
];

/// Ports ranked by how often they are found open, most frequent first.
pub const RANKED_PORTS: &[u16] = &[
    80, 23, 443, 21, 22, 25, 3389, 110, 445, 139, 143, 53, 135, 3306, 8080, 1723, 111, 995, 993,
    5900, 1025, 587, 8888, 199, 1720, 465, 548, 113, 81, 6001, 10000, 514, 5060, 179, 1026, 2000,
    8443, 8000, 32768, 554, 26, 1433, 49152, 2001, 515, 8008, 49154, 1027, 5666, 646, 5000, 5631,
    631, 49153, 8081, 2049, 88, 79, 5800, 106, 2121, 1110, 49155, 6000, 513, 990, 5357, 427,
    49156, 543, 544, 5101, 144, 7, 389, 8009, 3128, 444, 9999, 5009, 7070, 5190, 3000, 5432,
    1900, 3986, 13, 1029, 9, 5051, 6646, 49157, 1028, 873, 1755, 2717, 4899, 9100, 119, 37,
    // Beyond the first hundred: frequently exposed infrastructure and database ports.
    1521, 2375, 2376, 5985, 5986, 6379, 6443, 8086, 8181, 8880, 9000, 9090, 9200, 9300, 9418,
    11211, 27017, 27018, 50000, 5984, 5672, 15672, 1883, 8883, 2181, 9092, 7001, 8161, 4443,
    10250,
];

/// A de-duplicated sequence of ports, in first-seen order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PortSpec {
    ports: Vec<u16>,
}

impl PortSpec {
    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        self.ports.iter().copied()
    }

    pub fn as_slice(&self) -> &[u16] {
        &self.ports
    }
}

impl From<&[u16]> for PortSpec {
    /// Builds a spec from literal ports, dropping zeros and duplicates.
    fn from(ports: &[u16]) -> Self {
        let mut builder = PortSpecBuilder::default();
        ports
            .iter()
            .copied()
            .filter(|port| *port != 0)
            .for_each(|port| builder.push(port));
        builder.build()
    }
}

impl FromStr for PortSpec {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_ports(s)
    }
}

#[derive(Default)]
struct PortSpecBuilder {
    ports: Vec<u16>,
    seen: HashSet<u16>,
}

impl PortSpecBuilder {
    fn push(&mut self, port: u16) {
        if self.seen.insert(port) {
            self.ports.push(port);
        }
    }

    fn extend(&mut self, ports: impl IntoIterator<Item = u16>) {
        ports.into_iter().for_each(|port| self.push(port));
    }

    fn build(self) -> PortSpec {
        PortSpec { ports: self.ports }
    }
}

/// Parses a port expression such as `"22,80,443,8000-8100"`, `"common"` or `"-"`.
pub fn parse_ports(spec: &str) -> Result<PortSpec, ScanError> {
    let mut builder = PortSpecBuilder::default();

    for token in spec.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        match token.to_ascii_lowercase().as_str() {
            ALL_PORTS_TOKEN => builder.extend(1..=u16::MAX),
            "common" => builder.extend(COMMON_PORTS.iter().copied()),
            "top100" => builder.extend(top_ports(100)),
            "top1000" => builder.extend(top_ports(1000)),
            _ => builder.extend(parse_port_token(token)?),
        }
    }

    let spec_out = builder.build();
    if spec_out.is_empty() {
        return Err(ScanError::spec(format!("no ports in '{spec}'")));
    }
    Ok(spec_out)
}

/// The `n` highest ranked ports, padded with ascending port numbers once the ranking
/// runs out.
pub fn top_ports(n: usize) -> Vec<u16> {
    let mut builder = PortSpecBuilder::default();
    builder.extend(RANKED_PORTS.iter().copied());
    for port in 1..=u16::MAX {
        if builder.ports.len() >= n {
            break;
        }
        builder.push(port);
    }
    let mut ports = builder.build().ports;
    ports.truncate(n);
    ports
}

fn parse_port_token(token: &str) -> Result<std::ops::RangeInclusive<u16>, ScanError> {
    match token.split_once('-') {
        Some((start_str, end_str)) => {
            let start = parse_port_number(start_str.trim(), token)?;
            let end = parse_port_number(end_str.trim(), token)?;
            if start > end {
                return Err(ScanError::spec(format!(
                    "port range start exceeds end in '{token}'"
                )));
            }
            Ok(start..=end)
        }
        None => {
            let port = parse_port_number(token, token)?;
            Ok(port..=port)
        }
    }
}

fn parse_port_number(s: &str, token: &str) -> Result<u16, ScanError> {
    let port = s
        .parse::<u16>()
        .map_err(|e| ScanError::spec(format!("invalid port '{s}' in '{token}': {e}")))?;
    if port == 0 {
        return Err(ScanError::spec(format!("port 0 is not scannable in '{token}'")));
    }
    Ok(port)
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
    fn mixed_list_and_range() {
        let spec = parse_ports("22,80,443,8000-8100").unwrap();
        assert_eq!(spec.len(), 103);
        assert_eq!(&spec.as_slice()[..4], &[22, 80, 443, 8000]);
        assert_eq!(spec.as_slice().last(), Some(&8100));
    }

    #[test]
    fn dash_means_every_port() {
        let spec = parse_ports("-").unwrap();
        assert_eq!(spec.len(), 65535);
        assert_eq!(spec.as_slice().first(), Some(&1));
        assert_eq!(spec.as_slice().last(), Some(&65535));
    }

    #[test]
    fn duplicates_keep_first_position() {
        let spec = parse_ports("443, 80, 443, 79-81").unwrap();
        assert_eq!(spec.as_slice(), &[443, 80, 79, 81]);
    }

    #[test]
    fn keywords_expand_to_curated_lists() {
        let common = parse_ports("common").unwrap();
        assert_eq!(common.as_slice(), COMMON_PORTS);

        let top100 = parse_ports("top100").unwrap();
        let top1000 = parse_ports("TOP1000").unwrap();
        assert_eq!(top100.len(), 100);
        assert_eq!(top1000.len(), 1000);
        assert_eq!(&top1000.as_slice()[..100], top100.as_slice());
        assert_eq!(top100.as_slice()[0], 80);
    }

    #[test]
    fn top1000_pads_the_ranking_with_ascending_ports() {
        let top = top_ports(1000);
        let (ranked, filler) = top.split_at(RANKED_PORTS.len());
        assert_eq!(ranked, RANKED_PORTS);

        let expected: Vec<u16> = (1..=u16::MAX)
            .filter(|port| !RANKED_PORTS.contains(port))
            .take(filler.len())
            .collect();
        assert_eq!(filler, expected.as_slice());
        assert_eq!(filler.first(), Some(&1));
        assert!(filler.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn ranked_ports_have_no_duplicates() {
        let unique: HashSet<u16> = RANKED_PORTS.iter().copied().collect();
        assert_eq!(unique.len(), RANKED_PORTS.len());
        assert!(RANKED_PORTS.len() >= 100);
    }

    #[test]
    fn keyword_can_be_combined_with_literals() {
        let spec = parse_ports("common,31337").unwrap();
        assert_eq!(spec.len(), COMMON_PORTS.len() + 1);
        assert_eq!(spec.as_slice().last(), Some(&31337));
    }

    #[test]
    fn malformed_specs_are_rejected() {
        for bad in ["", " , ", "0", "65536", "80-", "-80", "100-90", "http", "1-2-3"] {
            assert!(
                matches!(parse_ports(bad), Err(ScanError::InvalidSpec(_))),
                "'{bad}' should be rejected"
            );
        }
    }

    #[test]
    fn from_slice_filters_zero_and_duplicates() {
        let spec = PortSpec::from(&[0u16, 22, 22, 80][..]);
        assert_eq!(spec.as_slice(), &[22, 80]);
    }
}
