//! Ring Store Error Types

use thiserror::Error;

/// Errors raised by the sample ring
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RingError {
    /// Capacity must hold at least one sample
    #[error("Invalid ring capacity {0}: must be at least 1")]
    ConfigurationError(usize),

    /// Channel name does not match any sample channel
    #[error("Unknown channel: {0}")]
    UnknownChannel(String),

    /// Sample could not be encoded for the wire
    #[error("Encoding error: {0}")]
    Encode(String),
}
