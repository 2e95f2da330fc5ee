//! Pure classification functions: banner/port to service, open-port set to OS guess.
//!
//! Both are deterministic. Signature tables are ordered lists evaluated top to bottom,
//! so the first match always wins.

pub mod os;
pub mod service;

pub use os::guess_os;
pub use service::classify_service;
