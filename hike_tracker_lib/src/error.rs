use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum SampleError {
    #[error("latitude {0} is outside [-90, 90]")]
    Latitude(f64),
    #[error("longitude {0} is outside [-180, 180]")]
    Longitude(f64),
}

/// Errors reported by a position source. All of them are transient:
/// the session logs them and keeps listening.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PositionError {
    #[error("permission to read the position was denied")]
    PermissionDenied,
    #[error("no position fix within {0} ms")]
    Timeout(u64),
    #[error("position unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FinalizeError {
    /// A required metadata field was empty. The session stays stopped and
    /// finalizing may be retried with corrected metadata.
    #[error("{0} must not be empty")]
    Validation(&'static str),
    #[error("session has already been finalized")]
    AlreadyFinalized,
}
