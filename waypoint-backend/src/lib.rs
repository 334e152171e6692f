mod cache;
pub mod compress;
pub mod config;
mod error;
pub mod helpers;
mod routes;
mod validation;

pub use cache::PlayerCache;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::StatusCode,
    routing::{get, post},
};
use std::sync::Arc;
use std::time::Duration;
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor,
};
use tower_http::compression::CompressionLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use waypoint_history::{HistoryStore, JsonFileRepository};

pub type History = HistoryStore<JsonFileRepository>;

pub struct AppState {
    pub history: Arc<History>,
    pub players: PlayerCache,
    pub ingest_token: Option<String>,
}

/// Rate limiting configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Requests per second for snapshot ingestion
    pub ingest_per_sec: u64,
    /// Burst size for snapshot ingestion
    pub ingest_burst: u32,
    /// Requests per second for read endpoints
    pub general_per_sec: u64,
    /// Burst size for read endpoints
    pub general_burst: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            ingest_per_sec: 10,
            ingest_burst: 20,
            general_per_sec: 10,
            general_burst: 20,
        }
    }
}

/// Create the application router around a shared history store
pub fn create_app(
    history: Arc<History>,
    ingest_token: Option<String>,
    request_body_limit: usize,
    request_timeout: Duration,
    rate_limit: RateLimitConfig,
) -> Router {
    let state = Arc::new(AppState {
        history,
        players: PlayerCache::new(),
        ingest_token,
    });

    // Pollers post one snapshot per server every few seconds
    let ingest_governor = GovernorConfigBuilder::default()
        .per_second(rate_limit.ingest_per_sec.max(1))
        .burst_size(rate_limit.ingest_burst.max(1))
        .key_extractor(SmartIpKeyExtractor)
        .finish()
        .expect("non-zero rate limits always build");

    // General rate limit for read endpoints
    let general_governor = GovernorConfigBuilder::default()
        .per_second(rate_limit.general_per_sec.max(1))
        .burst_size(rate_limit.general_burst.max(1))
        .key_extractor(SmartIpKeyExtractor)
        .finish()
        .expect("non-zero rate limits always build");

    let ingest_routes = Router::new()
        .route("/servers/{server}/snapshot", post(routes::ingest))
        .layer(GovernorLayer::new(ingest_governor));

    let general_routes = Router::new()
        .route("/servers/{server}/players", get(routes::players))
        .route("/status", get(routes::status))
        .layer(GovernorLayer::new(general_governor));

    Router::new()
        .route("/health", get(|| async { StatusCode::OK }))
        .merge(ingest_routes)
        .merge(general_routes)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        // The tower-http limit below replaces axum's built-in 2MB cap
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(request_body_limit))
        .with_state(state)
}
