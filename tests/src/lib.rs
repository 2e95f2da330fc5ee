//! End-to-end scans against listeners on the loopback interface.

#[cfg(test)]
mod scan;
#[cfg(test)]
mod util;
