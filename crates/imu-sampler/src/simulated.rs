//! Hardware-free sample source

use crate::error::SamplerError;
use crate::mpu6050::RawSample;
use crate::sampler::SampleSource;

/// 1 g at the default +/-2 g accelerometer range
const ONE_G: i16 = 16384;

/// Device lying flat with a slow wobble on every axis
#[derive(Debug, Clone, Default)]
pub struct SimulatedImu {
    step: u32,
}

impl SimulatedImu {
    pub fn new() -> Self {
        Self::default()
    }

    fn wobble(&self, period: u32, amplitude: f32) -> i16 {
        let phase = (self.step % period) as f32 / period as f32 * std::f32::consts::TAU;
        (phase.sin() * amplitude) as i16
    }
}

impl SampleSource for SimulatedImu {
    fn read_raw(&mut self) -> Result<RawSample, SamplerError> {
        let raw = RawSample {
            accel: [self.wobble(17, 800.0), self.wobble(23, 800.0), ONE_G],
            gyro: [self.wobble(11, 250.0), self.wobble(13, 250.0), self.wobble(19, 250.0)],
            // About 25 degrees Celsius
            temperature: -4000 + self.wobble(60, 340.0),
        };
        self.step = self.step.wrapping_add(1);
        Ok(raw)
    }
}
