//! Session Error Types

use ring_buffer::RingError;
use thiserror::Error;

/// Errors returned to a session consumer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Handle is not open (never opened or already closed)
    #[error("Session {0} is not open")]
    UnknownSession(String),

    /// Reader buffer cannot hold a formatted sample
    #[error("Read buffer too small: {available} bytes available, {required} required")]
    BufferTooSmall { required: usize, available: usize },

    /// Formatting the sample failed
    #[error("Presentation failed: {0}")]
    Presentation(#[from] RingError),
}
