use crate::limiter::RateLimiter;
use crate::metrics::MetricsSnapshot;
use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

static START_TIME: std::sync::LazyLock<SystemTime> = std::sync::LazyLock::new(SystemTime::now);

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub tracked_clients: usize,
    pub rate_limit_per_sec: f64,
    pub rate_limit_burst: u32,
    #[serde(flatten)]
    pub admission: MetricsSnapshot,
}

pub async fn root() -> &'static str {
    "ok"
}

pub async fn health_check() -> Json<HealthResponse> {
    let now = SystemTime::now();
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: now
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: now.duration_since(*START_TIME).unwrap_or_default().as_secs(),
    })
}

pub async fn stats(State(limiter): State<RateLimiter>) -> Json<StatsResponse> {
    Json(StatsResponse {
        tracked_clients: limiter.tracked_clients(),
        rate_limit_per_sec: limiter.rate(),
        rate_limit_burst: limiter.burst(),
        admission: limiter.metrics(),
    })
}
