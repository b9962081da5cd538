//! Configuration management.

use crate::error::ApiError;
use config::{Config, Environment, File};
use imu_sampler::{regs, SamplerConfig};
use serde::{Deserialize, Serialize};

/// Config file used when no path is given (extension resolved by `config`)
pub const DEFAULT_CONFIG_PATH: &str = "config/imu-ring";
/// Environment variable overriding the config file path
pub const CONFIG_PATH_ENV: &str = "IMU_RING_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Maximum tracing level (trace, debug, info, warn, error)
    pub log_level: String,
    pub server: ServerSettings,
    pub store: StoreSettings,
    pub sampler: SamplerSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            server: ServerSettings::default(),
            store: StoreSettings::default(),
            sampler: SamplerSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind_addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Number of samples kept in the ring
    pub capacity: usize,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            capacity: ring_buffer::DEFAULT_CAPACITY,
        }
    }
}

/// Where samples come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    #[default]
    Simulated,
    /// MPU-6050 on a Linux i2c-dev adapter
    Mpu6050,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerSettings {
    pub min_interval_ms: u64,
    pub poll_interval_ms: u64,
    pub source: SourceKind,
    /// I2C device path (mpu6050 source only)
    pub device: String,
    /// I2C address (default: 0x68)
    pub address: u8,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        let timing = SamplerConfig::default();
        Self {
            min_interval_ms: timing.min_interval_ms,
            poll_interval_ms: timing.poll_interval_ms,
            source: SourceKind::default(),
            device: "/dev/i2c-1".to_string(),
            address: regs::DEFAULT_ADDRESS,
        }
    }
}

impl SamplerSettings {
    pub fn sampler_config(&self) -> SamplerConfig {
        SamplerConfig {
            min_interval_ms: self.min_interval_ms,
            poll_interval_ms: self.poll_interval_ms,
        }
    }
}

impl Settings {
    /// Layer defaults, an optional config file and `IMU_RING__*` environment
    /// variables (e.g. `IMU_RING__STORE__CAPACITY=32`).
    pub fn load(path: Option<&str>) -> Result<Self, ApiError> {
        let path = path
            .map(str::to_owned)
            .or_else(|| std::env::var(CONFIG_PATH_ENV).ok())
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

        let s = Config::builder()
            .add_source(File::with_name(&path).required(false))
            .add_source(
                Environment::with_prefix("IMU_RING")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(s.try_deserialize()?)
    }
}
