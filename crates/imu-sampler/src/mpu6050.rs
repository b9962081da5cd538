//! MPU-6050 register access and decoding

use crate::error::SamplerError;
use crate::sampler::SampleSource;
use embedded_hal::i2c::I2c;
use ring_buffer::SampleRecord;
use tracing::{debug, info};

/// MPU-6050 register addresses
pub mod regs {
    pub const CONFIG: u8 = 0x1A;
    pub const GYRO_CONFIG: u8 = 0x1B;
    pub const ACCEL_CONFIG: u8 = 0x1C;
    pub const FIFO_EN: u8 = 0x23;
    pub const INT_PIN_CFG: u8 = 0x37;
    pub const INT_ENABLE: u8 = 0x38;
    pub const ACCEL_XOUT_H: u8 = 0x3B;
    pub const ACCEL_YOUT_H: u8 = 0x3D;
    pub const ACCEL_ZOUT_H: u8 = 0x3F;
    pub const TEMP_OUT_H: u8 = 0x41;
    pub const GYRO_XOUT_H: u8 = 0x43;
    pub const GYRO_YOUT_H: u8 = 0x45;
    pub const GYRO_ZOUT_H: u8 = 0x47;
    pub const USER_CTRL: u8 = 0x6A;
    pub const PWR_MGMT_1: u8 = 0x6B;
    pub const PWR_MGMT_2: u8 = 0x6C;
    pub const WHO_AM_I: u8 = 0x75;

    /// Expected WHO_AM_I value
    pub const MPU6050_WHO_AM_I: u8 = 0x68;

    /// Bus address with AD0 tied low
    pub const DEFAULT_ADDRESS: u8 = 0x68;

    /// Registers zeroed during setup, in write order
    pub const SETUP: [u8; 9] = [
        CONFIG,
        GYRO_CONFIG,
        ACCEL_CONFIG,
        FIFO_EN,
        INT_PIN_CFG,
        INT_ENABLE,
        USER_CTRL,
        PWR_MGMT_1,
        PWR_MGMT_2,
    ];
}

/// Raw signed register values of one reading
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawSample {
    pub accel: [i16; 3],
    pub gyro: [i16; 3],
    pub temperature: i16,
}

impl RawSample {
    /// Temperature in whole degrees Celsius (raw / 340 + 36.53)
    pub fn temperature_celsius(&self) -> i32 {
        (i32::from(self.temperature) + 12420 + 170) / 340
    }

    /// Decode into a sample stamped with `timestamp_ms`
    pub fn into_record(self, timestamp_ms: u64) -> SampleRecord {
        SampleRecord {
            timestamp_ms,
            accel_x: self.accel[0].into(),
            accel_y: self.accel[1].into(),
            accel_z: self.accel[2].into(),
            gyro_x: self.gyro[0].into(),
            gyro_y: self.gyro[1].into(),
            gyro_z: self.gyro[2].into(),
            temperature: self.temperature_celsius(),
        }
    }
}

/// MPU-6050 driver over an I2C bus
pub struct Mpu6050<I> {
    i2c: I,
    address: u8,
}

fn bus_error<E: embedded_hal::i2c::Error>(register: u8, error: E) -> SamplerError {
    SamplerError::Bus {
        register,
        message: format!("{:?}", error.kind()),
    }
}

impl<I: I2c> Mpu6050<I> {
    /// Check WHO_AM_I at `address` and put the device in its default configuration
    pub fn init(i2c: I, address: u8) -> Result<Self, SamplerError> {
        let mut imu = Self { i2c, address };

        let who_am_i = imu.read_byte(regs::WHO_AM_I)?;
        if who_am_i != regs::MPU6050_WHO_AM_I {
            return Err(SamplerError::WrongDevice {
                expected: regs::MPU6050_WHO_AM_I,
                actual: who_am_i,
            });
        }
        info!("MPU-6050 found at {:#04X}, WHO_AM_I = {:#04X}", address, who_am_i);

        for register in regs::SETUP {
            imu.write_byte(register, 0)?;
        }
        debug!("MPU-6050 configured");

        Ok(imu)
    }

    fn read_byte(&mut self, register: u8) -> Result<u8, SamplerError> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(self.address, &[register], &mut buf)
            .map_err(|e| bus_error(register, e))?;
        Ok(buf[0])
    }

    fn write_byte(&mut self, register: u8, value: u8) -> Result<(), SamplerError> {
        self.i2c
            .write(self.address, &[register, value])
            .map_err(|e| bus_error(register, e))
    }

    /// Big-endian signed word starting at `register`
    fn read_signed(&mut self, register: u8) -> Result<i16, SamplerError> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(self.address, &[register], &mut buf)
            .map_err(|e| bus_error(register, e))?;
        Ok(i16::from_be_bytes(buf))
    }

    /// Release the bus
    pub fn into_inner(self) -> I {
        self.i2c
    }
}

impl<I: I2c> SampleSource for Mpu6050<I> {
    fn read_raw(&mut self) -> Result<RawSample, SamplerError> {
        Ok(RawSample {
            accel: [
                self.read_signed(regs::ACCEL_XOUT_H)?,
                self.read_signed(regs::ACCEL_YOUT_H)?,
                self.read_signed(regs::ACCEL_ZOUT_H)?,
            ],
            gyro: [
                self.read_signed(regs::GYRO_XOUT_H)?,
                self.read_signed(regs::GYRO_YOUT_H)?,
                self.read_signed(regs::GYRO_ZOUT_H)?,
            ],
            temperature: self.read_signed(regs::TEMP_OUT_H)?,
        })
    }
}
