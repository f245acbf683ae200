//! # Utilities
//!
//! Small pure helpers used by the service and HTTP layers.

use std::net::SocketAddr;

use axum::http::HeaderMap;

// =====================================
// Constants
// =====================================
/// Longest original URL accepted at creation.
pub const MAX_URL_LENGTH: usize = 2048;

/// Trusted header set by the fronting proxy.
pub const REAL_IP_HEADER: &str = "x-real-ip";

/// Comma separated proxy chain, client first.
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

// =====================================
// URL Validation
// =====================================
/// Only absolute http(s) URLs within [`MAX_URL_LENGTH`] are accepted.
///
/// ```rust
/// use link_shortener::utils::is_valid_url;
///
/// assert!(is_valid_url("https://example.com/a?b=c"));
/// assert!(!is_valid_url("ftp://example.com"));
/// ```
#[must_use]
pub fn is_valid_url(url_str: &str) -> bool {
    if url_str.is_empty() || url_str.len() > MAX_URL_LENGTH {
        return false;
    }

    match url::Url::parse(url_str) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.has_host(),
        Err(_) => false,
    }
}

// =====================================
// Client IP
// =====================================
/// Resolves the client IP for click analytics.
///
/// Precedence: `X-Real-IP`, then the first entry of `X-Forwarded-For`, then
/// the socket address with its port removed.
///
/// ```rust
/// use axum::http::HeaderMap;
/// use link_shortener::utils::resolve_client_ip;
///
/// let headers = HeaderMap::new();
/// assert_eq!(
///     resolve_client_ip(&headers, Some("10.0.0.1:54321")).as_deref(),
///     Some("10.0.0.1")
/// );
/// ```
#[must_use]
pub fn resolve_client_ip(headers: &HeaderMap, remote_addr: Option<&str>) -> Option<String> {
    let header_value = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    if let Some(real_ip) = header_value(REAL_IP_HEADER) {
        return Some(real_ip.to_string());
    }

    if let Some(first) = header_value(FORWARDED_FOR_HEADER)
        .and_then(|chain| chain.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
    {
        return Some(first.to_string());
    }

    remote_addr.map(strip_port).filter(|ip| !ip.is_empty())
}

/// `10.0.0.1:54321` -> `10.0.0.1`, `[::1]:80` -> `::1`. A bare address is
/// returned unchanged.
fn strip_port(addr: &str) -> String {
    if let Ok(socket) = addr.parse::<SocketAddr>() {
        return socket.ip().to_string();
    }

    // Bare IPv6 has several colons and no port.
    if addr.parse::<std::net::IpAddr>().is_ok() {
        return addr.to_string();
    }

    match addr.rfind(':') {
        Some(idx) => addr[..idx].to_string(),
        None => addr.to_string(),
    }
}
