//! # Scan Target Model
//!
//! Parses target expressions into a de-duplicated, order-preserving [`TargetSpec`].
//!
//! Accepted segments:
//! * A single host: IPv4/IPv6 literal (`192.168.1.5`, `::1`) or hostname (`scanme.example`).
//! * A CIDR block: `192.168.1.0/24`.
//! * A last-octet range: `192.168.1.10-50` (or `192.168.1.10-192.168.1.50`).
//! * A comma-separated list of any of the above.

use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use crate::error::ScanError;
use crate::network::range::{self, Ipv4Range};

const MAX_HOSTNAME_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// Represents a distinct target expression before expansion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    /// A single IP literal.
    Literal { addr: IpAddr },
    /// A name to be resolved at scan time.
    Hostname { name: String },
    /// A CIDR block.
    Cidr { network_addr: Ipv4Addr, prefix: u8 },
    /// A last-octet range inside one /24.
    LastOctet { span: Ipv4Range },
    /// A comma-separated list.
    List { items: Vec<Target> },
}

impl FromStr for Target {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ScanError::spec("empty target"));
        }

        if s.contains(',') {
            return parse_commas(s);
        }

        if let Some(target) = parse_literal(s) {
            return Ok(target);
        }

        if let Some(target) = parse_cidr(s)? {
            return Ok(target);
        }

        if let Some(target) = parse_octet_range(s)? {
            return Ok(target);
        }

        if is_valid_hostname(s) {
            return Ok(Target::Hostname {
                name: s.to_ascii_lowercase(),
            });
        }

        Err(ScanError::spec(format!("invalid target: {s}")))
    }
}

/// A de-duplicated sequence of host identifiers, in first-seen order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TargetSpec {
    hosts: Vec<String>,
    seen: HashSet<String>,
}

impl TargetSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `host` unless it is already present.
    pub fn push(&mut self, host: String) {
        if self.seen.insert(host.clone()) {
            self.hosts.push(host);
        }
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.hosts.iter()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.hosts
    }
}

impl<'a> IntoIterator for &'a TargetSpec {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.hosts.iter()
    }
}

/// Parses a full target expression and expands it into concrete hosts.
///
/// Every prefix from `/0` to `/32` is expanded. Use [`parse_targets_bounded`] when the
/// expression comes from somewhere that should not be able to ask for the whole
/// address space.
pub fn parse_targets(spec: &str) -> Result<TargetSpec, ScanError> {
    parse_targets_bounded(spec, usize::MAX)
}

/// [`parse_targets`], failing with `InvalidSpec` once more than `max_hosts` distinct hosts
/// would be produced. Oversized CIDR blocks are refused before they are walked.
pub fn parse_targets_bounded(spec: &str, max_hosts: usize) -> Result<TargetSpec, ScanError> {
    let target = Target::from_str(spec)?;
    let mut collection = TargetSpec::new();
    resolve_target(target, &mut collection, max_hosts)?;

    if collection.is_empty() {
        return Err(ScanError::spec(format!("'{spec}' expands to no hosts")));
    }
    Ok(collection)
}

/// Expands a single `address/prefix` expression.
pub fn expand_cidr(spec: &str) -> Result<Vec<Ipv4Addr>, ScanError> {
    match parse_cidr(spec.trim())? {
        Some(Target::Cidr {
            network_addr,
            prefix,
        }) => range::cidr_hosts(network_addr, prefix).map_err(|e| ScanError::spec(e.to_string())),
        _ => Err(ScanError::spec(format!("not a CIDR block: {spec}"))),
    }
}

fn resolve_target(
    target: Target,
    collection: &mut TargetSpec,
    max_hosts: usize,
) -> Result<(), ScanError> {
    match target {
        Target::Literal { addr } => push_bounded(collection, addr.to_string(), max_hosts),
        Target::Hostname { name } => push_bounded(collection, name, max_hosts),
        Target::Cidr {
            network_addr,
            prefix,
        } => {
            let block: u64 = range::cidr_host_count(prefix);
            if block > max_hosts as u64 {
                return Err(too_many_hosts(max_hosts));
            }
            range::cidr_iter(network_addr, prefix)
                .map_err(|e| ScanError::spec(e.to_string()))?
                .try_for_each(|addr| push_bounded(collection, addr.to_string(), max_hosts))
        }
        Target::LastOctet { span } => span
            .iter_without_edges()
            .try_for_each(|addr| push_bounded(collection, addr.to_string(), max_hosts)),
        Target::List { items } => items
            .into_iter()
            .try_for_each(|item| resolve_target(item, collection, max_hosts)),
    }
}

fn push_bounded(collection: &mut TargetSpec, host: String, max_hosts: usize) -> Result<(), ScanError> {
    collection.push(host);
    if collection.len() > max_hosts {
        return Err(too_many_hosts(max_hosts));
    }
    Ok(())
}

fn too_many_hosts(max_hosts: usize) -> ScanError {
    ScanError::spec(format!("target expands to more than {max_hosts} hosts"))
}

/// Parses a comma-separated list of targets (e.g., "192.168.1.5, 10.0.0.1-50, example.org").
fn parse_commas(s: &str) -> Result<Target, ScanError> {
    let items: Vec<Target> = s
        .split(',')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(Target::from_str)
        .collect::<Result<_, _>>()?;

    if items.is_empty() {
        return Err(ScanError::spec(format!("no targets in list: {s}")));
    }
    Ok(Target::List { items })
}

fn parse_literal(s: &str) -> Option<Target> {
    s.parse::<IpAddr>()
        .ok()
        .map(|addr| Target::Literal { addr })
}

/// `Ok(None)` when `s` has no slash.
fn parse_cidr(s: &str) -> Result<Option<Target>, ScanError> {
    let Some((addr_part, prefix_part)) = s.split_once('/') else {
        return Ok(None);
    };

    let network_addr = addr_part
        .parse::<Ipv4Addr>()
        .map_err(|e| ScanError::spec(format!("invalid IP in CIDR '{s}': {e}")))?;

    let prefix: u8 = prefix_part
        .parse::<u8>()
        .map_err(|e| ScanError::spec(format!("invalid prefix in CIDR '{s}': {e}")))?;

    if prefix > 32 {
        return Err(ScanError::spec(format!("prefix {prefix} > 32 in '{s}'")));
    }

    Ok(Some(Target::Cidr {
        network_addr,
        prefix,
    }))
}

/// Parses a last-octet range like "10.0.0.1-50".
///
/// Returns `Ok(None)` when the left side is not an IPv4 address so that hyphenated
/// hostnames fall through to hostname parsing.
fn parse_octet_range(s: &str) -> Result<Option<Target>, ScanError> {
    let Some((low, high)) = s.split_once('-') else {
        return Ok(None);
    };
    let Ok(start_addr) = low.trim().parse::<Ipv4Addr>() else {
        return Ok(None);
    };

    let end_addr = range_end(high.trim(), start_addr, s)?;
    if start_addr > end_addr {
        return Err(ScanError::spec(format!("range start exceeds end in '{s}'")));
    }

    Ok(Some(Target::LastOctet {
        span: Ipv4Range::new(start_addr, end_addr),
    }))
}

/// Accepts either a bare last octet (`50`) or a full address inside the start's /24.
fn range_end(high: &str, start: Ipv4Addr, expr: &str) -> Result<Ipv4Addr, ScanError> {
    let [a, b, c, _] = start.octets();
    if let Ok(end) = high.parse::<Ipv4Addr>() {
        return match end.octets() {
            [x, y, z, _] if [x, y, z] == [a, b, c] => Ok(end),
            _ => Err(ScanError::spec(format!(
                "range '{expr}' must only vary the last octet"
            ))),
        };
    }

    let last: u8 = high
        .parse()
        .map_err(|e| ScanError::spec(format!("invalid end of range '{expr}': {e}")))?;
    Ok(Ipv4Addr::new(a, b, c, last))
}

fn is_valid_hostname(s: &str) -> bool {
    if s.len() > MAX_HOSTNAME_LEN {
        return false;
    }
    let name = s.strip_suffix('.').unwrap_or(s);
    let labels: Vec<&str> = name.split('.').collect();

    let labels_ok = labels.iter().all(|label| {
        !label.is_empty()
            && label.len() <= MAX_LABEL_LEN
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    });

    // An all-numeric final label would be a mangled IPv4 address, not a name.
    let tld_ok = labels
        .last()
        .is_some_and(|tld| !tld.chars().all(|c| c.is_ascii_digit()));

    labels_ok && tld_ok
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
    fn range_end_short_and_full_forms() {
        let start = Ipv4Addr::new(192, 168, 1, 10);
        let expr = "192.168.1.10-x";
        let fifty = Ipv4Addr::new(192, 168, 1, 50);

        assert_eq!(range_end("50", start, expr), Ok(fifty));
        assert_eq!(range_end("192.168.1.50", start, expr), Ok(fifty));

        for bad in ["256", "192.168.2.1", "", "2.66"] {
            assert!(range_end(bad, start, expr).is_err(), "{bad}");
        }
    }

    #[test]
    fn target_kinds() {
        assert!(matches!(Target::from_str("8.8.4.4"), Ok(Target::Literal { .. })));
        assert!(matches!(Target::from_str("fe80::1"), Ok(Target::Literal { .. })));
        assert!(matches!(
            Target::from_str("192.168.1.1-254"),
            Ok(Target::LastOctet { .. })
        ));
        assert!(matches!(
            Target::from_str("172.16.4.0/24"),
            Ok(Target::Cidr { prefix: 24, .. })
        ));
        assert!(matches!(
            Target::from_str("scan-me.example.org"),
            Ok(Target::Hostname { .. })
        ));
        assert!(matches!(
            Target::from_str("localhost"),
            Ok(Target::Hostname { .. })
        ));

        assert!(Target::from_str("10.0.0.1/33").is_err());
        assert!(Target::from_str("10.0.0.300-10.0.0.9").is_err());
        assert!(Target::from_str("10.0.0.9-3").is_err());
        assert!(Target::from_str("10.0.0").is_err());
        assert!(Target::from_str("bad_host!").is_err());
        assert!(Target::from_str("-leading.example").is_err());
    }

    #[test]
    fn parse_targets_cidr_24_excludes_network_and_broadcast() {
        let spec = parse_targets("10.0.0.0/24").unwrap();
        assert_eq!(spec.len(), 254);
        assert_eq!(spec.as_slice()[0], "10.0.0.1");
        assert_eq!(spec.as_slice()[253], "10.0.0.254");
    }

    #[test]
    fn expand_cidr_matches_documented_counts() {
        let hosts = expand_cidr("10.0.0.0/24").unwrap();
        assert_eq!(hosts.len(), 254);
        assert_eq!(hosts[0], Ipv4Addr::new(10, 0, 0, 1));

        let small = expand_cidr("10.0.0.0/30").unwrap();
        assert_eq!(small.len(), 4);
        assert!(small.contains(&Ipv4Addr::new(10, 0, 0, 0)));
        assert!(small.contains(&Ipv4Addr::new(10, 0, 0, 3)));

        assert!(expand_cidr("10.0.0.1").is_err());
    }

    #[test]
    fn every_prefix_down_to_zero_parses() {
        assert!(matches!(
            Target::from_str("10.0.0.0/7"),
            Ok(Target::Cidr { prefix: 7, .. })
        ));
        assert!(matches!(
            Target::from_str("0.0.0.0/0"),
            Ok(Target::Cidr { prefix: 0, .. })
        ));

        let spec = parse_targets("10.0.0.0/22").unwrap();
        assert_eq!(spec.len(), 1024);
        assert_eq!(spec.as_slice()[0], "10.0.0.0");
    }

    #[test]
    fn host_limit_is_opt_in() {
        let err = parse_targets_bounded("10.0.0.0/7", 65_536).unwrap_err();
        assert!(matches!(err, ScanError::InvalidSpec(ref msg) if msg.contains("65536")));

        assert_eq!(parse_targets_bounded("10.0.0.0/24", 254).unwrap().len(), 254);
        assert!(parse_targets_bounded("10.0.0.0/24", 253).is_err());

        // Duplicates do not count against the limit.
        assert_eq!(parse_targets_bounded("10.0.0.1,10.0.0.2,10.0.0.1", 2).unwrap().len(), 2);
        assert!(parse_targets_bounded("10.0.0.1,10.0.0.2,10.0.0.3", 2).is_err());
    }

    #[test]
    fn last_octet_range_never_yields_edges() {
        let spec = parse_targets("192.168.5.0-255").unwrap();
        assert_eq!(spec.len(), 254);
        assert!(!spec.iter().any(|h| h == "192.168.5.0" || h == "192.168.5.255"));

        let spec = parse_targets("192.168.5.10-12").unwrap();
        assert_eq!(spec.as_slice(), ["192.168.5.10", "192.168.5.11", "192.168.5.12"]);
    }

    #[test]
    fn comma_list_is_trimmed_and_deduplicated() {
        let spec = parse_targets(" 10.0.0.2 , example.org,10.0.0.1-3,, Example.org ").unwrap();
        assert_eq!(
            spec.as_slice(),
            ["10.0.0.2", "example.org", "10.0.0.1", "10.0.0.3"]
        );
    }

    #[test]
    fn malformed_segment_fails_the_whole_list() {
        assert!(parse_targets("10.0.0.1, 10.0.0.0/40").is_err());
        assert!(parse_targets(",,").is_err());
        assert!(parse_targets("").is_err());
    }
}
