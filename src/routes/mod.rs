//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Three routes behind one Axum router. Layers, outermost first: request
//! tracing, CORS (so preflights never reach the gate), then the quota gate.

pub mod chat;
pub mod gate;
pub mod status;

use axum::Router;
use axum::http::{HeaderValue, Method};
use axum::middleware;
use axum::routing::{get, post};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::state::AppState;
use gate::{CHAT_PATH, HEALTH_PATH};

pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.cors_origins);

    Router::new()
        .route(HEALTH_PATH, get(status::health))
        .route("/", get(status::root))
        .route(CHAT_PATH, post(chat::chat))
        .layer(middleware::from_fn_with_state(state.clone(), gate::quota_gate))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(AllowHeaders::mirror_request())
}

/// Current UTC time as RFC 3339, for response timestamps.
pub(crate) fn now_rfc3339() -> String {
    OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default()
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
