use thiserror::Error;

/// Failures surfaced to the caller of a scan.
///
/// Per-probe failures (timeouts, refusals, short banner reads) are never represented
/// here: they are recorded in the affected port's result and the scan carries on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    /// Malformed target or port expression.
    #[error("invalid spec: {0}")]
    InvalidSpec(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// DNS lookup failed. Scanning degrades to the raw target string.
    #[error("could not resolve {host}")]
    ResolutionFailure { host: String },
}

impl ScanError {
    pub(crate) fn spec(msg: impl Into<String>) -> Self {
        Self::InvalidSpec(msg.into())
    }
}
