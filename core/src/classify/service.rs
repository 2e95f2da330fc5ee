use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

pub const UNKNOWN_SERVICE: &str = "unknown";

/// A bare `220` greeting is shared by FTP and SMTP; the port decides which.
const BARE_GREETING: &str = "220";
const MAIL_SERVICES: &[&str] = &["smtp", "submission", "smtps"];

/// Banner signatures, evaluated in order.
const SIGNATURE_TABLE: &[(&str, &str)] = &[
    (r"^SSH-\d+\.\d+", "ssh"),
    (r"(?i)^HTTP/\d(\.\d)?\s+\d{3}", "http"),
    (r"(?im)^server:\s*nginx", "http"),
    (r"(?im)^server:\s*apache", "http"),
    (r"(?im)^server:\s*microsoft-iis", "http"),
    (r"^220[ -].*(?i:ftp)", "ftp"),
    (r"^220[ -].*(?i:smtp|postfix|exim|sendmail)", "smtp"),
    (r"^220[ -]", BARE_GREETING),
    (r"^\+OK", "pop3"),
    (r"^\* OK", "imap"),
    (r"(?s)^.{4}\n\d+\.\d+\.\d+[^\x00]*\x00", "mysql"),
    (r"(?i)mysql|mariadb", "mysql"),
    (r"(?i)postgres", "postgresql"),
    (r"(?i)redis", "redis"),
    (r"(?i)mongodb", "mongodb"),
    (r"^RFB \d{3}\.\d{3}", "vnc"),
];

/// Version extractors, keyed by the service they apply to. First captured group wins.
const VERSION_TABLE: &[(&str, &str)] = &[
    ("ssh", r"OpenSSH[_-]([\w.]+)"),
    ("http", r"Apache/([\d.]+)"),
    ("http", r"nginx/([\d.]+)"),
    ("http", r"Microsoft-IIS/([\d.]+)"),
    ("mysql", r"(?s)^.{4}\n(\d+\.\d+\.\d+[\w.-]*)"),
    ("mysql", r"(\d+\.\d+\.\d+)-MariaDB"),
    ("ftp", r"vsFTPd ([\d.]+)"),
    ("vnc", r"^RFB (\d{3}\.\d{3})"),
];

/// Well-known TCP ports and the service usually found behind them.
pub const WELL_KNOWN_PORTS: &[(u16, &str)] = &[
    (7, "echo"),
    (9, "discard"),
    (13, "daytime"),
    (20, "ftp-data"),
    (21, "ftp"),
    (22, "ssh"),
    (23, "telnet"),
    (25, "smtp"),
    (37, "time"),
    (53, "domain"),
    (69, "tftp"),
    (79, "finger"),
    (80, "http"),
    (81, "http-alt"),
    (88, "kerberos"),
    (106, "pop3pw"),
    (110, "pop3"),
    (111, "rpcbind"),
    (113, "ident"),
    (119, "nntp"),
    (123, "ntp"),
    (135, "msrpc"),
    (137, "netbios-ns"),
    (139, "netbios-ssn"),
    (143, "imap"),
    (161, "snmp"),
    (179, "bgp"),
    (389, "ldap"),
    (427, "svrloc"),
    (443, "https"),
    (445, "microsoft-ds"),
    (465, "smtps"),
    (513, "login"),
    (514, "shell"),
    (515, "printer"),
    (548, "afp"),
    (554, "rtsp"),
    (587, "submission"),
    (631, "ipp"),
    (636, "ldaps"),
    (873, "rsync"),
    (902, "vmware-auth"),
    (990, "ftps"),
    (993, "imaps"),
    (995, "pop3s"),
    (1080, "socks"),
    (1194, "openvpn"),
    (1433, "ms-sql-s"),
    (1521, "oracle"),
    (1723, "pptp"),
    (1883, "mqtt"),
    (1900, "upnp"),
    (2049, "nfs"),
    (2181, "zookeeper"),
    (2375, "docker"),
    (2376, "docker-tls"),
    (3000, "http-alt"),
    (3128, "squid-http"),
    (3306, "mysql"),
    (3389, "rdp"),
    (4369, "epmd"),
    (5060, "sip"),
    (5222, "xmpp-client"),
    (5432, "postgresql"),
    (5672, "amqp"),
    (5900, "vnc"),
    (5984, "couchdb"),
    (5985, "wsman"),
    (5986, "wsmans"),
    (6379, "redis"),
    (6443, "kubernetes-api"),
    (6667, "irc"),
    (8000, "http-alt"),
    (8008, "http"),
    (8080, "http-proxy"),
    (8443, "https-alt"),
    (8888, "http-alt"),
    (9000, "http-alt"),
    (9100, "jetdirect"),
    (9200, "elasticsearch"),
    (9418, "git"),
    (11211, "memcached"),
    (15672, "rabbitmq-mgmt"),
    (27017, "mongodb"),
];

struct Signature {
    pattern: Regex,
    service: &'static str,
}

struct VersionPattern {
    service: &'static str,
    pattern: Regex,
}

static SIGNATURES: LazyLock<Vec<Signature>> = LazyLock::new(|| {
    SIGNATURE_TABLE
        .iter()
        .filter_map(|&(pattern, service)| {
            Regex::new(pattern).ok().map(|pattern| Signature { pattern, service })
        })
        .collect()
});

static VERSIONS: LazyLock<Vec<VersionPattern>> = LazyLock::new(|| {
    VERSION_TABLE
        .iter()
        .filter_map(|&(service, pattern)| {
            Regex::new(pattern)
                .ok()
                .map(|pattern| VersionPattern { service, pattern })
        })
        .collect()
});

/// Maps a port and its captured banner to `(service, version)`.
///
/// A non-empty banner is matched against the signature list first; the well-known
/// port table is the fallback; `"unknown"` is last. `version` is empty when no
/// extractor for the detected service matched.
pub fn classify_service(port: u16, banner: &str) -> (String, String) {
    if let Some(service) = match_banner(banner) {
        let service = match service {
            BARE_GREETING => greeting_service(port),
            other => other,
        };
        let version = extract_version(service, banner).unwrap_or_default();
        trace!(port, service, version = %version, "classified from banner");
        return (service.to_string(), version);
    }

    let service = service_for_port(port).unwrap_or(UNKNOWN_SERVICE);
    (service.to_string(), String::new())
}

pub fn service_for_port(port: u16) -> Option<&'static str> {
    WELL_KNOWN_PORTS
        .iter()
        .find(|(known, _)| *known == port)
        .map(|(_, service)| *service)
}

fn greeting_service(port: u16) -> &'static str {
    service_for_port(port)
        .filter(|service| MAIL_SERVICES.contains(service))
        .unwrap_or("ftp")
}

fn match_banner(banner: &str) -> Option<&'static str> {
    if banner.is_empty() {
        return None;
    }
    SIGNATURES
        .iter()
        .find(|sig| sig.pattern.is_match(banner))
        .map(|sig| sig.service)
}

fn extract_version(service: &str, banner: &str) -> Option<String> {
    VERSIONS
        .iter()
        .filter(|v| v.service == service)
        .find_map(|v| v.pattern.captures(banner))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
