//! Sample formatting for readers

use crate::{RingError, SampleRecord};
use std::io::Write;

/// Decimal digits of `u64::MAX`
const TIMESTAMP_DIGITS: usize = 20;
/// Widest `i32` rendering (`-2147483648`)
const CHANNEL_DIGITS: usize = 11;

/// Turns a sample into the bytes handed to a reader
pub trait Presenter: Send + Sync {
    /// Encode one sample
    fn present(&self, record: &SampleRecord) -> Result<Vec<u8>, RingError>;

    /// Upper bound on the encoded size of any sample
    fn max_len(&self) -> usize;
}

/// Text line: `<timestamp>: gyro=<x>:<y>:<z> acc=<x>:<y>:<z>\n`
#[derive(Debug, Clone, Copy, Default)]
pub struct LinePresenter;

impl LinePresenter {
    /// Worst-case line length including the trailing newline
    pub const MAX_LEN: usize = TIMESTAMP_DIGITS
        + ": gyro=".len()
        + 3 * CHANNEL_DIGITS
        + 2
        + " acc=".len()
        + 3 * CHANNEL_DIGITS
        + 2
        + 1;
}

impl Presenter for LinePresenter {
    fn present(&self, record: &SampleRecord) -> Result<Vec<u8>, RingError> {
        let mut line = Vec::with_capacity(Self::MAX_LEN);
        writeln!(
            line,
            "{}: gyro={}:{}:{} acc={}:{}:{}",
            record.timestamp_ms,
            record.gyro_x,
            record.gyro_y,
            record.gyro_z,
            record.accel_x,
            record.accel_y,
            record.accel_z,
        )
        .map_err(|e| RingError::Encode(e.to_string()))?;
        Ok(line)
    }

    fn max_len(&self) -> usize {
        Self::MAX_LEN
    }
}

/// Compact binary encoding using postcard
#[derive(Debug, Clone, Copy, Default)]
pub struct PostcardPresenter;

impl PostcardPresenter {
    /// Varint u64 timestamp plus seven zigzag varint i32 channels
    pub const MAX_LEN: usize = 10 + 7 * 5;
}

impl Presenter for PostcardPresenter {
    fn present(&self, record: &SampleRecord) -> Result<Vec<u8>, RingError> {
        postcard::to_allocvec(record).map_err(|e| RingError::Encode(e.to_string()))
    }

    fn max_len(&self) -> usize {
        Self::MAX_LEN
    }
}
