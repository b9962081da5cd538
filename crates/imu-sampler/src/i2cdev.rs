//! MPU-6050 on a Linux i2c-dev adapter

use crate::error::SamplerError;
use crate::sampler::BoxedSource;

/// Open `device` (e.g. `/dev/i2c-1`) and initialise the MPU-6050 at `address`
#[cfg(target_os = "linux")]
pub fn open_mpu6050(device: &str, address: u8) -> Result<BoxedSource, SamplerError> {
    use crate::mpu6050::Mpu6050;
    use linux_embedded_hal::I2cdev;

    let bus = I2cdev::new(device).map_err(|e| SamplerError::Open {
        device: device.to_string(),
        message: e.to_string(),
    })?;
    tracing::info!("Opened I2C adapter {}", device);
    Ok(Box::new(Mpu6050::init(bus, address)?))
}

#[cfg(not(target_os = "linux"))]
pub fn open_mpu6050(device: &str, _address: u8) -> Result<BoxedSource, SamplerError> {
    Err(SamplerError::Open {
        device: device.to_string(),
        message: "i2c-dev is only available on Linux".to_string(),
    })
}
