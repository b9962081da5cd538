//! Sampler Error Types

use thiserror::Error;

/// Errors during sensor acquisition
#[derive(Debug, Error)]
pub enum SamplerError {
    /// Register bus transfer failed
    #[error("Bus error on register {register:#04X}: {message}")]
    Bus { register: u8, message: String },

    /// Device at the address is not an MPU-6050
    #[error("Wrong device found: expected WHO_AM_I {expected:#04X}, got {actual:#04X}")]
    WrongDevice { expected: u8, actual: u8 },

    /// Bus adapter could not be opened
    #[error("Failed to open {device}: {message}")]
    Open { device: String, message: String },

    /// Sampling thread could not be started
    #[error("Failed to spawn sampler thread: {0}")]
    Spawn(#[from] std::io::Error),
}
