//! Tenant extraction from the request host.
//!
//! Extraction never validates. The middleware hands the candidate to
//! [`shopwright_core::TenantId::parse`] before it reaches the database.

use axum::extract::Request;
use axum::http::header::HOST;
use shopwright_core::PUBLIC_TENANT;

const LOCAL_HOSTS: [&str; 3] = ["localhost", "127.0.0.1", "::1"];

/// Candidate tenant id for a host: the first DNS label, or `public` for
/// local and empty hosts.
pub fn extract_tenant_id(host: &str) -> &str {
    let host = strip_port(host);
    if LOCAL_HOSTS.contains(&host) {
        return PUBLIC_TENANT;
    }
    match host.split('.').next() {
        Some(label) if !label.is_empty() => label,
        _ => PUBLIC_TENANT,
    }
}

/// Remove a trailing `:port`. Bracketed IPv6 literals lose their brackets;
/// a bare IPv6 literal is returned unchanged.
fn strip_port(host: &str) -> &str {
    if let Some(rest) = host.strip_prefix('[') {
        return match rest.find(']') {
            Some(end) => &rest[..end],
            None => host,
        };
    }
    match host.rfind(':') {
        Some(idx) if host[..idx].contains(':') => host,
        Some(idx) => &host[..idx],
        None => host,
    }
}

/// The `Host` header, or the URI authority when the header is absent.
pub fn request_host(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .or_else(|| request.uri().authority().map(|a| a.as_str()))
}
