//! `GET /health` and `GET /` — service metadata and global quota usage.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use super::now_rfc3339;
use crate::rate_limit::TierUsage;
use crate::state::AppState;

const SERVICE_NAME: &str = "chatgate";

/// Global quota usage as shown by the status endpoints.
#[derive(Debug, Serialize)]
pub struct RateLimitSummary {
    pub daily_limit: u64,
    pub hourly_limit: u64,
    pub window: &'static str,
    pub requests_used_today: u64,
    pub requests_remaining_today: u64,
    pub requests_used_this_hour: u64,
    pub requests_remaining_this_hour: u64,
}

impl From<&TierUsage> for RateLimitSummary {
    fn from(usage: &TierUsage) -> Self {
        Self {
            daily_limit: usage.daily.limit,
            hourly_limit: usage.hourly.limit,
            window: "24 hours / 1 hour",
            requests_used_today: usage.daily.used,
            requests_remaining_today: usage.daily.remaining(),
            requests_used_this_hour: usage.hourly.used,
            requests_remaining_this_hour: usage.hourly.remaining(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub version: &'static str,
    pub model: String,
    pub rate_limit: RateLimitSummary,
    pub tracked_clients: usize,
    pub cors_origins: Vec<String>,
    pub llm_configured: bool,
}

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: &'static str,
    pub version: &'static str,
    pub model: String,
    pub status: &'static str,
    pub rate_limit: RateLimitSummary,
    pub cors_origins: Vec<String>,
    pub llm_configured: bool,
}

/// `GET /health` — never gated, never counted.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let usage = state.ledger.snapshot(None, state.clock.now());
    Json(HealthResponse {
        status: "healthy",
        timestamp: now_rfc3339(),
        version: env!("CARGO_PKG_VERSION"),
        model: state.model.to_string(),
        rate_limit: RateLimitSummary::from(&usage.global),
        tracked_clients: state.ledger.tracked_clients(),
        cors_origins: state.cors_origins.to_vec(),
        llm_configured: state.llm.is_some(),
    })
}

/// `GET /` — service banner.
pub async fn root(State(state): State<AppState>) -> Json<RootResponse> {
    let usage = state.ledger.snapshot(None, state.clock.now());
    Json(RootResponse {
        message: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        model: state.model.to_string(),
        status: "running",
        rate_limit: RateLimitSummary::from(&usage.global),
        cors_origins: state.cors_origins.to_vec(),
        llm_configured: state.llm.is_some(),
    })
}
