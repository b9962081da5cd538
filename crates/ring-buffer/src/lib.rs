//! IMU Sample Ring
//!
//! Fixed-capacity circular store for motion sensor samples. A single producer
//! keeps appending (overwriting the oldest sample once full) while any number
//! of readers either peek the most recent sample or walk the surviving history
//! oldest-to-newest with their own traversal token.

mod buffer;
mod error;
mod presenter;

pub use buffer::{RingStore, TraversalToken, DEFAULT_CAPACITY};
pub use error::RingError;
pub use presenter::{LinePresenter, PostcardPresenter, Presenter};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One sensor reading: raw acceleration, angular rate and temperature channels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SampleRecord {
    /// Milliseconds since the sampler started
    pub timestamp_ms: u64,
    pub accel_x: i32,
    pub accel_y: i32,
    pub accel_z: i32,
    pub gyro_x: i32,
    pub gyro_y: i32,
    pub gyro_z: i32,
    /// Degrees Celsius
    pub temperature: i32,
}

impl SampleRecord {
    /// Value of a single channel
    pub fn channel(&self, channel: Channel) -> i32 {
        match channel {
            Channel::AccelX => self.accel_x,
            Channel::AccelY => self.accel_y,
            Channel::AccelZ => self.accel_z,
            Channel::GyroX => self.gyro_x,
            Channel::GyroY => self.gyro_y,
            Channel::GyroZ => self.gyro_z,
            Channel::Temperature => self.temperature,
        }
    }
}

/// Named channel of a [`SampleRecord`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    AccelX,
    AccelY,
    AccelZ,
    GyroX,
    GyroY,
    GyroZ,
    Temperature,
}

impl Channel {
    /// All channels in register order
    pub const ALL: [Channel; 7] = [
        Channel::AccelX,
        Channel::AccelY,
        Channel::AccelZ,
        Channel::GyroX,
        Channel::GyroY,
        Channel::GyroZ,
        Channel::Temperature,
    ];

    /// Attribute name of the channel
    pub fn name(self) -> &'static str {
        match self {
            Channel::AccelX => "accel_x",
            Channel::AccelY => "accel_y",
            Channel::AccelZ => "accel_z",
            Channel::GyroX => "gyro_x",
            Channel::GyroY => "gyro_y",
            Channel::GyroZ => "gyro_z",
            Channel::Temperature => "temperature",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Channel {
    type Err = RingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Channel::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| RingError::UnknownChannel(s.to_string()))
    }
}
