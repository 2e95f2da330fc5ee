//! Wire-level helpers used by the scan engine: DNS PTR packets for reverse lookups and
//! the payloads sent to services that wait for the client to speak first.

pub mod dns;
pub mod http;
