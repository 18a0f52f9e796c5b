//! Quota gate — middleware in front of every route except `/health`.
//!
//! DESIGN
//! ======
//! Per request: resolve the client key, `evaluate` the ledger, reject with
//! 429 or run the handler. Only `/api/chat` is ever charged, and only when
//! the handler answered below 400 without tagging the response as a
//! [`DownstreamFailure`]. Allowed responses carry the 16
//! `X-RateLimit-{Global|IP}-{Hourly|Daily}-{Limit|Used|Remaining|Reset}`
//! headers: post-increment after a charge, the evaluation snapshot otherwise.
//!
//! The ledger lock is never held across `next.run`.

use std::net::SocketAddr;

use axum::Json;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{info, warn};

use crate::identity;
use crate::rate_limit::window::WindowKind;
use crate::rate_limit::{QuotaExceeded, QuotaSnapshot, Tier, WindowUsage};
use crate::state::AppState;

pub const HEALTH_PATH: &str = "/health";
pub const CHAT_PATH: &str = "/api/chat";

/// Response extension set by a handler whose upstream call failed even though
/// it still answered with a success-shaped body. Such responses are not charged.
#[derive(Debug, Clone, Copy)]
pub struct DownstreamFailure;

pub async fn quota_gate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if request.uri().path() == HEALTH_PATH {
        return next.run(request).await;
    }

    let chargeable_route = request.uri().path() == CHAT_PATH;
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client_key = identity::client_key(request.headers(), peer);

    let snapshot = match state.ledger.evaluate(&client_key, state.clock.now()) {
        Ok(snapshot) => snapshot,
        Err(exceeded) => {
            warn!(
                %client_key,
                tier = %exceeded.tier,
                window = %exceeded.window,
                count = exceeded.count,
                limit = exceeded.limit,
                "request rejected: quota exceeded"
            );
            return rejection_response(&exceeded);
        }
    };

    let mut response = next.run(request).await;

    let snapshot = if chargeable_route && is_chargeable(&response) {
        let charged = state.ledger.commit(&client_key, state.clock.now());
        info!(
            %client_key,
            client_hourly = charged.client.hourly.used,
            client_daily = charged.client.daily.used,
            global_hourly = charged.global.hourly.used,
            global_daily = charged.global.daily.used,
            "chat request charged"
        );
        charged
    } else {
        snapshot
    };

    apply_quota_headers(response.headers_mut(), &snapshot);
    response
}

fn is_chargeable(response: &Response) -> bool {
    response.status().as_u16() < 400 && response.extensions().get::<DownstreamFailure>().is_none()
}

// =============================================================================
// HEADERS
// =============================================================================

pub(crate) fn apply_quota_headers(headers: &mut HeaderMap, snapshot: &QuotaSnapshot) {
    let windows = [
        ("Global", "Hourly", &snapshot.global.hourly),
        ("Global", "Daily", &snapshot.global.daily),
        ("IP", "Hourly", &snapshot.client.hourly),
        ("IP", "Daily", &snapshot.client.daily),
    ];
    for (scope, window, usage) in windows {
        insert_window_headers(headers, scope, window, usage);
    }
}

fn insert_window_headers(headers: &mut HeaderMap, scope: &str, window: &str, usage: &WindowUsage) {
    let fields = [
        ("Limit", usage.limit),
        ("Used", usage.used),
        ("Remaining", usage.remaining()),
        ("Reset", usage.reset_at),
    ];
    for (field, value) in fields {
        // Names are built from fixed ASCII parts and always parse.
        if let Ok(name) = HeaderName::try_from(format!("X-RateLimit-{scope}-{window}-{field}")) {
            headers.insert(name, HeaderValue::from(value));
        }
    }
}

// =============================================================================
// REJECTION
// =============================================================================

fn rejection_response(exceeded: &QuotaExceeded) -> Response {
    let (hourly_limit, daily_limit) = exceeded.limits();
    let (used_this_hour, used_today) = exceeded.counts();
    let window = exceeded.window.span_label();

    let detail = match exceeded.tier {
        Tier::Client => json!({
            "error": format!("{} request limit exceeded for your IP", capitalized(exceeded.window)),
            "ip_hourly_limit": hourly_limit,
            "ip_daily_limit": daily_limit,
            "requests_used_this_hour": used_this_hour,
            "requests_used_today": used_today,
            "window": window,
            "reset_time": exceeded.reset_at,
            "message": format!(
                "You have reached your {} limit of {} requests. Please try again {}.",
                exceeded.window,
                exceeded.limit,
                retry_hint(exceeded.window)
            ),
        }),
        Tier::Global => json!({
            "error": format!("{} request limit exceeded for all users", capitalized(exceeded.window)),
            "hourly_limit": hourly_limit,
            "daily_limit": daily_limit,
            "requests_used_this_hour": used_this_hour,
            "requests_used_today": used_today,
            "window": window,
            "reset_time": exceeded.reset_at,
            "message": format!(
                "The API has reached its {} limit of {} requests. Please try again {}.",
                exceeded.window,
                exceeded.limit,
                retry_hint(exceeded.window)
            ),
        }),
    };

    (StatusCode::TOO_MANY_REQUESTS, Json(json!({ "detail": detail }))).into_response()
}

fn capitalized(window: WindowKind) -> &'static str {
    match window {
        WindowKind::Hourly => "Hourly",
        WindowKind::Daily => "Daily",
    }
}

fn retry_hint(window: WindowKind) -> &'static str {
    match window {
        WindowKind::Hourly => "in the next hour",
        WindowKind::Daily => "tomorrow",
    }
}

#[cfg(test)]
#[path = "gate_test.rs"]
mod tests;
