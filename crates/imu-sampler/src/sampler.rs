//! Rate-limited sample production

use crate::error::SamplerError;
use crate::mpu6050::RawSample;
use metrics::counter;
use ring_buffer::{RingStore, SampleRecord};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Anything that yields raw IMU readings
pub trait SampleSource {
    fn read_raw(&mut self) -> Result<RawSample, SamplerError>;
}

/// Type-erased source chosen at startup
pub type BoxedSource = Box<dyn SampleSource + Send>;

impl<S: SampleSource + ?Sized> SampleSource for Box<S> {
    fn read_raw(&mut self) -> Result<RawSample, SamplerError> {
        (**self).read_raw()
    }
}

/// Sampling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Minimum age of the latest sample before a new one is taken (ms)
    pub min_interval_ms: u64,
    /// How often the background thread attempts a sample (ms)
    pub poll_interval_ms: u64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: 1000,
            poll_interval_ms: 1000,
        }
    }
}

/// Result of one sampling attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A new sample was stored
    Produced(SampleRecord),
    /// The latest sample is younger than the minimum interval
    Skipped { age_ms: u64 },
}

/// Reads the source and produces into the ring, at most once per interval
pub struct Sampler<S> {
    store: Arc<RingStore>,
    source: S,
    config: SamplerConfig,
}

impl<S: SampleSource> Sampler<S> {
    pub fn new(store: Arc<RingStore>, source: S, config: SamplerConfig) -> Self {
        Self {
            store,
            source,
            config,
        }
    }

    /// Attempt one sample at time `now_ms`
    pub fn tick(&mut self, now_ms: u64) -> Result<TickOutcome, SamplerError> {
        if let Some(latest) = self.store.peek_active() {
            let age_ms = now_ms.saturating_sub(latest.timestamp_ms);
            if age_ms < self.config.min_interval_ms {
                counter!("sampler_skipped_total").increment(1);
                debug!("Sample skipped, latest is {} ms old", age_ms);
                return Ok(TickOutcome::Skipped { age_ms });
            }
        }

        let record = self.source.read_raw()?.into_record(now_ms);
        self.store.produce(record);
        debug!(
            "Sampled ACCEL[{}, {}, {}] GYRO[{}, {}, {}] TEMP {}",
            record.accel_x,
            record.accel_y,
            record.accel_z,
            record.gyro_x,
            record.gyro_y,
            record.gyro_z,
            record.temperature
        );
        Ok(TickOutcome::Produced(record))
    }
}

/// One [`Sampler`] shared by the polling thread and session opens.
///
/// Timestamps are milliseconds since construction. The lock keeps ticks from
/// running concurrently, so the source sees one transfer at a time.
pub struct SharedSampler {
    sampler: Mutex<Sampler<BoxedSource>>,
    started: Instant,
    poll_interval: Duration,
}

impl SharedSampler {
    pub fn new(store: Arc<RingStore>, source: BoxedSource, config: SamplerConfig) -> Self {
        let poll_interval = Duration::from_millis(config.poll_interval_ms);
        Self {
            sampler: Mutex::new(Sampler::new(store, source, config)),
            started: Instant::now(),
            poll_interval,
        }
    }

    /// Attempt one sample now, unless the latest is younger than the interval
    pub fn tick_now(&self) -> Result<TickOutcome, SamplerError> {
        let mut sampler = self.sampler.lock().unwrap_or_else(PoisonError::into_inner);
        let now_ms = self.started.elapsed().as_millis() as u64;
        sampler.tick(now_ms).inspect_err(|_| {
            counter!("sampler_errors_total").increment(1);
        })
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

/// Background thread driving a [`SharedSampler`]
pub struct SamplerService {
    handle: Option<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

impl SamplerService {
    /// Spawn the polling thread
    pub fn spawn(sampler: Arc<SharedSampler>) -> Result<Self, SamplerError> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let interval = sampler.poll_interval();

        let handle = thread::Builder::new()
            .name("imu-sampler".to_string())
            .spawn(move || {
                info!("Sampler started, polling every {:?}", interval);

                while !shutdown_clone.load(Ordering::SeqCst) {
                    if let Err(e) = sampler.tick_now() {
                        warn!("IMU read error: {}", e);
                    }
                    thread::park_timeout(interval);
                }

                info!("Sampler stopped");
            })?;

        Ok(Self {
            handle: Some(handle),
            shutdown,
        })
    }
    /// Stop the thread and wait for it to finish
    pub fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        self.shutdown.store(true, Ordering::SeqCst);
        handle.thread().unpark();
        if handle.join().is_err() {
            warn!("Sampler thread panicked");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for SamplerService {
    fn drop(&mut self) {
        self.stop();
    }
}
