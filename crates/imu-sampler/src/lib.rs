//! IMU Sampling
//!
//! Reads MPU-6050 accelerometer/gyroscope registers over embedded-hal I2C and
//! feeds decoded samples into the sample ring at a bounded rate.

mod error;
mod i2cdev;
mod mpu6050;
mod sampler;
mod simulated;

pub use error::SamplerError;
pub use i2cdev::open_mpu6050;
pub use mpu6050::{regs, Mpu6050, RawSample};
pub use sampler::{
    BoxedSource, SampleSource, Sampler, SamplerConfig, SamplerService, SharedSampler,
    TickOutcome,
};
pub use simulated::SimulatedImu;
