//! Scan inputs (targets, ports) and scan outputs (port, host and network results).

pub mod host;
pub mod port;
pub mod ports;
pub mod range;
pub mod target;
