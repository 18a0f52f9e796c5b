//! Client identity for per-client quotas.
//!
//! The key is the raw address token the proxy reports, checked in order:
//! leftmost `x-forwarded-for` entry, then `x-real-ip`, then the socket peer.
//! Nothing is validated or normalized, so the service must sit behind a proxy
//! that overwrites these headers.

use std::borrow::Cow;
use std::net::SocketAddr;

use axum::http::HeaderMap;

pub const FORWARDED_FOR: &str = "x-forwarded-for";
pub const REAL_IP: &str = "x-real-ip";
pub const UNKNOWN_CLIENT: &str = "unknown";

#[must_use]
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    if let Some(forwarded) = header_text(headers, FORWARDED_FOR) {
        let first = forwarded.split(',').next().map_or("", str::trim);
        if !first.is_empty() {
            return first.to_owned();
        }
    }

    if let Some(real_ip) = header_text(headers, REAL_IP).filter(|v| !v.trim().is_empty()) {
        return real_ip.into_owned();
    }

    peer.map_or_else(|| UNKNOWN_CLIENT.to_owned(), |addr| addr.ip().to_string())
}

/// Header bytes as text. Bytes that are not valid UTF-8 become U+FFFD rather
/// than hiding the header.
fn header_text<'a>(headers: &'a HeaderMap, name: &str) -> Option<Cow<'a, str>> {
    headers.get(name).map(|v| String::from_utf8_lossy(v.as_bytes()))
}

#[cfg(test)]
#[path = "identity_test.rs"]
mod tests;
