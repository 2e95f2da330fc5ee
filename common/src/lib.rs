//! # Sweepr Common
//!
//! Types shared by every crate in the workspace:
//!
//! * **[`config`]**: the per-scan [`config::ScanConfig`].
//! * **[`error`]**: the error taxonomy surfaced at the parsing boundary.
//! * **[`network`]**: target and port specifications plus the scan result model.
//! * **[`utils`]**: small address helpers.

pub mod config;
pub mod error;
pub mod network;
pub mod utils;

pub use tracing;

#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::tracing::info!($($arg)*)
    };
}

/// Logs a positive outcome. Rendered with a distinct prefix by the CLI formatter.
#[macro_export]
macro_rules! success {
    ($($arg:tt)*) => {
        $crate::tracing::info!(target: "sweepr::success", $($arg)*)
    };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::tracing::warn!($($arg)*)
    };
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::tracing::error!($($arg)*)
    };
}
