//! Client identity derivation for rate limiting.
//!
//! The identity is a best-effort heuristic, not authentication: forwarded
//! headers are taken at face value, so they are only trustworthy when the
//! edge in front of this service strips or overwrites them.

use http::HeaderMap;
use std::net::SocketAddr;

/// Identity used when no source yields a usable value
pub const UNKNOWN_CLIENT: &str = "unknown";

pub mod names {
    pub const CF_CONNECTING_IP: &str = "cf-connecting-ip";
    pub const X_REAL_IP: &str = "x-real-ip";
    pub const X_FORWARDED_FOR: &str = "x-forwarded-for";
}

/// Derive the client identifier from request headers.
///
/// Resolution order (first present wins): `cf-connecting-ip`, `x-real-ip`,
/// the first entry of `x-forwarded-for`, then `"unknown"`.
pub fn client_identity(headers: &HeaderMap) -> String {
    header_identity(headers).unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

/// Derive the client identifier according to the deployment's trust setting.
///
/// With `trust_proxy_headers` this is [`client_identity`]. Without it the
/// headers are ignored and the socket peer address is used.
pub fn resolve_client_identity(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trust_proxy_headers: bool,
) -> String {
    if trust_proxy_headers {
        return client_identity(headers);
    }
    peer.map(|p| p.ip().to_string()).unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

fn header_identity(headers: &HeaderMap) -> Option<String> {
    if let Some(ip) = single_value(headers, names::CF_CONNECTING_IP) {
        return Some(ip);
    }
    if let Some(ip) = single_value(headers, names::X_REAL_IP) {
        return Some(ip);
    }
    headers
        .get(names::X_FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn single_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
