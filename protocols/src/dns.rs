use std::net::IpAddr;

use anyhow::{Context, ensure};
use pnet::packet::dns::{DnsClass, DnsPacket, DnsQuery, DnsTypes, MutableDnsPacket, Opcode, Retcode};

use sweepr_common::utils::ip;

pub const DNS_HDR_LEN: usize = 12;
pub const DNS_PORT: u16 = 53;

const MAX_POINTER_JUMPS: usize = 16;

/// Extracts the transaction id and the first PTR target from a DNS response.
pub fn get_hostname(payload: &[u8]) -> anyhow::Result<(u16, String)> {
    let dns = DnsPacket::new(payload).context("Failed to parse DNS packet")?;
    let transaction_id = dns.get_id();
    ensure!(dns.get_is_response() == 1, "packet {transaction_id} is not a response");
    ensure!(
        matches!(dns.get_rcode(), Retcode::NoError),
        "lookup {transaction_id} failed with {:?}",
        dns.get_rcode()
    );

    let hostname = dns
        .get_responses()
        .iter()
        .filter(|response| response.rtype == DnsTypes::PTR)
        .find_map(|response| decode_dns_name(payload, &response.data))
        .ok_or_else(|| anyhow::anyhow!("No valid PTR record found"))?;

    Ok((transaction_id, hostname))
}

/// Builds a recursive PTR query for `ip_addr` with transaction id `id`.
pub fn create_ptr_packet(ip_addr: &IpAddr, id: u16) -> anyhow::Result<Vec<u8>> {
    let question: DnsQuery = ptr_question(ip_addr);
    let mut packet: Vec<u8> = vec![0u8; DNS_HDR_LEN];
    {
        // Zeroed header: only the non-zero fields need writing.
        let mut header = MutableDnsPacket::new(&mut packet).context("dns header buffer too short")?;
        header.set_id(id);
        header.set_opcode(Opcode::StandardQuery);
        header.set_is_recursion_desirable(1);
        header.set_query_count(1);
    }

    packet.extend_from_slice(&question.qname);
    packet.extend_from_slice(&question.qtype.0.to_be_bytes());
    packet.extend_from_slice(&question.qclass.0.to_be_bytes());
    Ok(packet)
}

fn ptr_question(ip_addr: &IpAddr) -> DnsQuery {
    DnsQuery {
        qname: encode_dns_name(&ip::reverse_address_to_ptr(ip_addr)),
        qtype: DnsTypes::PTR,
        qclass: DnsClass(1),
        payload: Vec::new(),
    }
}

fn encode_dns_name(name: &str) -> Vec<u8> {
    let mut encoded: Vec<u8> = Vec::new();
    for label in name.split('.') {
        if label.is_empty() {
            continue;
        }
        encoded.push(label.len() as u8);
        encoded.extend_from_slice(label.as_bytes());
    }
    encoded.push(0);
    encoded
}

/// Decodes a (possibly compressed) name from `data`. Compression pointers are
/// offsets into the whole `message`.
fn decode_dns_name(message: &[u8], data: &[u8]) -> Option<String> {
    let mut parts: Vec<&str> = Vec::new();
    let mut buf: &[u8] = data;
    let mut cursor: usize = 0;
    let mut jumps: usize = 0;

    loop {
        let len: usize = *buf.get(cursor)? as usize;
        if len == 0 {
            break;
        }
        if len & 0xC0 == 0xC0 {
            let low: usize = *buf.get(cursor + 1)? as usize;
            jumps += 1;
            if jumps > MAX_POINTER_JUMPS {
                return None;
            }
            buf = message;
            cursor = ((len & 0x3F) << 8) | low;
            continue;
        }
        cursor += 1;
        let label_bytes: &[u8] = buf.get(cursor..cursor + len)?;
        parts.push(std::str::from_utf8(label_bytes).ok()?);
        cursor += len;
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("."))
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
    use std::net::Ipv4Addr;

    #[test]
    fn ptr_query_layout() {
        let ip = IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1));
        let packet = create_ptr_packet(&ip, 0xBEEF).unwrap();

        assert_eq!(&packet[..2], &[0xBE, 0xEF]);
        // recursion desired, standard query
        assert_eq!(packet[2] & 0x01, 0x01);
        assert_eq!(&packet[4..6], &[0, 1]);

        let qname = encode_dns_name("1.0.0.127.in-addr.arpa");
        assert_eq!(&packet[DNS_HDR_LEN..DNS_HDR_LEN + qname.len()], qname.as_slice());
        assert_eq!(&packet[packet.len() - 4..], &[0, 12, 0, 1]);
    }

    #[test]
    fn encode_skips_empty_labels() {
        assert_eq!(encode_dns_name("a.b."), vec![1, b'a', 1, b'b', 0]);
    }

    #[test]
    fn decode_follows_compression_pointers() {
        // "host" followed by a pointer to "example.org" at offset 2 of the message.
        let message = [0u8, 0, 7, b'e', b'x', b'a', b'm', b'p', b'l', b'e', 3, b'o', b'r', b'g', 0];
        let data = [4u8, b'h', b'o', b's', b't', 0xC0, 2];
        assert_eq!(
            decode_dns_name(&message, &data).as_deref(),
            Some("host.example.org")
        );
    }

    #[test]
    fn decode_rejects_pointer_loops_and_truncation() {
        let message = [0xC0u8, 0];
        assert_eq!(decode_dns_name(&message, &[0xC0, 0]), None);
        assert_eq!(decode_dns_name(&message, &[5, b'a']), None);
        assert_eq!(decode_dns_name(&message, &[0]), None);
    }

    #[test]
    fn hostname_from_response() {
        let ip = IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1));
        let mut response = create_ptr_packet(&ip, 0x1234).unwrap();
        // QR = 1, RD = 1, RA = 1, one answer
        response[2] = 0x81;
        response[3] = 0x80;
        response[7] = 1;
        // answer: pointer to the question name, PTR, IN, ttl 60
        response.extend_from_slice(&[0xC0, 0x0C, 0, 12, 0, 1, 0, 0, 0, 60]);
        let rdata = encode_dns_name("localhost");
        response.extend_from_slice(&(rdata.len() as u16).to_be_bytes());
        response.extend_from_slice(&rdata);

        let (id, hostname) = get_hostname(&response).unwrap();
        assert_eq!(id, 0x1234);
        assert_eq!(hostname, "localhost");
    }
}
