//! IMU Ring - Main Entry Point
//!
//! Usage: `imu-ring [CONFIG_PATH]`

use api::{init_logging, run, Settings};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args().nth(1);
    let settings = Settings::load(config_path.as_deref())?;
    init_logging(&settings.log_level)?;

    info!("=== IMU Ring v{} ===", env!("CARGO_PKG_VERSION"));
    info!(
        "Ring capacity {}, sampling every {} ms",
        settings.store.capacity, settings.sampler.min_interval_ms
    );

    run(settings).await?;

    Ok(())
}
