use super::*;
use crate::rate_limit::{Ledger, QuotaPolicy};

async fn detail_of(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    body["detail"].clone()
}

fn exceeded(tier: Tier, window: WindowKind) -> QuotaExceeded {
    QuotaExceeded { tier, window, limit: 100, sibling_limit: 200, count: 100, sibling_count: 150, reset_at: 1_700_003_600 }
}

#[test]
fn headers_mirror_snapshot() {
    let ledger = Ledger::new(QuotaPolicy::default());
    ledger.commit("a", 1_700_000_000);
    let snapshot = ledger.commit("a", 1_700_000_000);

    let mut headers = HeaderMap::new();
    apply_quota_headers(&mut headers, &snapshot);
    assert_eq!(headers.len(), 16);
    assert_eq!(headers["x-ratelimit-ip-hourly-used"], "2");
    assert_eq!(headers["x-ratelimit-ip-daily-remaining"], "198");
    assert_eq!(headers["x-ratelimit-global-hourly-reset"], "1700002800");
    assert_eq!(headers["x-ratelimit-global-daily-reset"], "1700006400");
}

#[test]
fn remaining_never_underflows() {
    let ledger = Ledger::new(QuotaPolicy { client_hourly: 1, ..QuotaPolicy::default() });
    ledger.commit("a", 1_700_000_000);
    let snapshot = ledger.commit("a", 1_700_000_000);

    let mut headers = HeaderMap::new();
    apply_quota_headers(&mut headers, &snapshot);
    assert_eq!(headers["x-ratelimit-ip-hourly-used"], "2");
    assert_eq!(headers["x-ratelimit-ip-hourly-remaining"], "0");
}

#[tokio::test]
async fn client_hourly_rejection_body() {
    let resp = rejection_response(&exceeded(Tier::Client, WindowKind::Hourly));
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    let detail = detail_of(resp).await;
    assert_eq!(detail["error"], "Hourly request limit exceeded for your IP");
    assert_eq!(detail["ip_hourly_limit"], 100);
    assert_eq!(detail["ip_daily_limit"], 200);
    assert_eq!(detail["requests_used_this_hour"], 100);
    assert_eq!(detail["requests_used_today"], 150);
    assert_eq!(detail["window"], "1 hour");
    assert_eq!(detail["reset_time"], 1_700_003_600);
    assert_eq!(
        detail["message"],
        "You have reached your hourly limit of 100 requests. Please try again in the next hour."
    );
    assert!(detail.get("hourly_limit").is_none());
}

#[tokio::test]
async fn global_daily_rejection_body() {
    let err = QuotaExceeded {
        tier: Tier::Global,
        window: WindowKind::Daily,
        limit: 500,
        sibling_limit: 100,
        count: 500,
        sibling_count: 7,
        reset_at: 1_700_006_400,
    };
    let detail = detail_of(rejection_response(&err)).await;
    assert_eq!(detail["error"], "Daily request limit exceeded for all users");
    assert_eq!(detail["hourly_limit"], 100);
    assert_eq!(detail["daily_limit"], 500);
    assert_eq!(detail["requests_used_this_hour"], 7);
    assert_eq!(detail["requests_used_today"], 500);
    assert_eq!(detail["window"], "24 hours");
    assert_eq!(
        detail["message"],
        "The API has reached its daily limit of 500 requests. Please try again tomorrow."
    );
    assert!(detail.get("ip_daily_limit").is_none());
}

#[test]
fn downstream_failure_marker_blocks_charge() {
    let ok = StatusCode::OK.into_response();
    assert!(is_chargeable(&ok));

    let mut failed = StatusCode::OK.into_response();
    failed.extensions_mut().insert(DownstreamFailure);
    assert!(!is_chargeable(&failed));

    assert!(is_chargeable(&StatusCode::FOUND.into_response()));
    assert!(!is_chargeable(&StatusCode::BAD_REQUEST.into_response()));
    assert!(!is_chargeable(&StatusCode::BAD_GATEWAY.into_response()));
}
