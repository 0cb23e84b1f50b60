//! Configuration-time errors.
//!
//! Per the error-handling design: configuration errors are fatal at construction time and carry
//! a descriptive diagnostic; capacity drops and invariant clamps are not errors (they're counted
//! stats or logged warnings respectively) and so have no representation here.

use thiserror::Error;

/// Fatal misconfiguration detected when constructing a [`crate::pi_controller::PiController`] or
/// [`crate::dual_queue::DualQueue`].
#[derive(Debug, Error, Clone, Copy)]
pub enum ConfigError {
    #[error("update period must be positive, got {0:?}")]
    NonPositiveUpdatePeriod(crate::time::Duration),

    #[error("coupling factor k must be >= 1, got {0}")]
    InvalidCouplingFactor(u32),

    #[error("queue limit must be positive")]
    ZeroLimit,

    #[error("mean packet size must be positive")]
    ZeroMeanPacketSize,

    #[error("segment size must be positive")]
    ZeroSegmentSize,

    #[error("estimation gain g must be in (0, 1], got {0}")]
    InvalidGain(f64),
}
