//! IMU Ring API Server
//!
//! HTTP surface over the sample ring: reader sessions, per-channel
//! attributes, raw history, health and Prometheus metrics.

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use imu_sampler::{open_mpu6050, BoxedSource, SamplerService, SharedSampler, SimulatedImu};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use read_session::{RefreshHook, SessionTable};
use ring_buffer::{LinePresenter, RingStore};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

mod error;
mod routes;
mod settings;

pub use error::ApiError;
pub use settings::{SamplerSettings, ServerSettings, Settings, SourceKind, StoreSettings};

/// Application state shared across handlers
pub struct AppState {
    /// Open reader sessions over the sample ring
    pub sessions: SessionTable,
    /// Prometheus renderer, absent when no recorder was installed
    pub metrics: Option<PrometheusHandle>,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Create new application state around a ring. With a sampler, every
    /// session open first refreshes a stale latest sample.
    pub fn new(
        store: Arc<RingStore>,
        sampler: Option<Arc<SharedSampler>>,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        let mut sessions = SessionTable::new(store, Arc::new(LinePresenter));
        if let Some(sampler) = sampler {
            sessions = sessions.with_refresh(refresh_on_open(sampler));
        }
        Self {
            sessions,
            metrics,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
        }
    }
}

fn refresh_on_open(sampler: Arc<SharedSampler>) -> RefreshHook {
    Arc::new(move || {
        if let Err(e) = sampler.tick_now() {
            warn!("Sample refresh on open failed: {}", e);
        }
    })
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub store: StoreStatus,
    pub open_sessions: usize,
}

/// Ring fill status
#[derive(Debug, Serialize)]
pub struct StoreStatus {
    pub capacity: usize,
    pub len: usize,
    pub total_produced: u64,
    pub latest_timestamp_ms: Option<u64>,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/sessions", post(routes::sessions::open_session))
        .route("/api/v1/sessions/:id", delete(routes::sessions::close_session))
        .route("/api/v1/sessions/:id/read", get(routes::sessions::read_next))
        .route("/api/v1/sessions/:id/reset", post(routes::sessions::reset_session))
        .route("/api/v1/samples/latest", get(routes::samples::get_latest))
        .route("/api/v1/samples/history", get(routes::samples::get_history))
        .route("/api/v1/attributes/:channel", get(routes::samples::get_attribute))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let store = state.sessions.store();
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        store: StoreStatus {
            capacity: store.capacity(),
            len: store.len(),
            total_produced: store.total_produced(),
            latest_timestamp_ms: store.peek_active().map(|r| r.timestamp_ms),
        },
        open_sessions: state.sessions.open_count(),
    })
}

async fn metrics_handler(State(state): State<Arc<AppState>>) -> Result<String, ApiError> {
    state
        .metrics
        .as_ref()
        .map(PrometheusHandle::render)
        .ok_or_else(|| ApiError::Metrics("no recorder installed".to_string()))
}

/// Initialize logging at the given level
pub fn init_logging(level: &str) -> Result<(), ApiError> {
    let level: Level = level
        .parse()
        .map_err(|_| ApiError::Logging(format!("unknown log level '{}'", level)))?;

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| ApiError::Logging(e.to_string()))
}

/// Install the global Prometheus recorder
pub fn init_metrics() -> Result<PrometheusHandle, ApiError> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| ApiError::Metrics(e.to_string()))
}

/// Allocate the sample ring
pub fn build_store(settings: &StoreSettings) -> Result<Arc<RingStore>, ApiError> {
    Ok(Arc::new(RingStore::new(settings.capacity)?))
}

/// Open the configured sample source
pub fn build_source(settings: &SamplerSettings) -> Result<BoxedSource, ApiError> {
    match settings.source {
        SourceKind::Simulated => {
            info!("Using simulated IMU source");
            Ok(Box::new(SimulatedImu::new()))
        }
        SourceKind::Mpu6050 => {
            info!(
                "Using MPU-6050 on {} at {:#04X}",
                settings.device, settings.address
            );
            Ok(open_mpu6050(&settings.device, settings.address)?)
        }
    }
}

/// Build the ring, start sampling and serve until Ctrl-C
pub async fn run(settings: Settings) -> Result<(), ApiError> {
    let store = build_store(&settings.store)?;
    let metrics = init_metrics()?;

    let source = build_source(&settings.sampler)?;
    let sampler = Arc::new(SharedSampler::new(
        store.clone(),
        source,
        settings.sampler.sampler_config(),
    ));
    let _service = SamplerService::spawn(sampler.clone())?;

    let state = Arc::new(AppState::new(store, Some(sampler), Some(metrics)));
    let app = create_router(state);

    info!("Starting API server on {}", settings.server.bind_addr);
    let listener = tokio::net::TcpListener::bind(&settings.server.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown requested");
        })
        .await?;

    Ok(())
}
