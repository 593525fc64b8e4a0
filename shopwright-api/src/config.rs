//! API Configuration Module
//!
//! Server binding, CORS, request limits and tenant-host policy. Configuration
//! is loaded from `SHOPWRIGHT_*` environment variables with defaults suited to
//! local development.

use std::net::SocketAddr;
use std::time::Duration;

use crate::error::{ApiError, ApiResult};

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    // ========================================================================
    // Binding
    // ========================================================================
    /// Interface to bind.
    pub bind_host: String,

    /// Port to listen on. `PORT` wins over `SHOPWRIGHT_API_PORT`.
    pub port: u16,

    // ========================================================================
    // CORS Configuration
    // ========================================================================
    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means allow all origins (dev mode).
    pub cors_origins: Vec<String>,

    /// Whether to allow credentials in CORS requests.
    pub cors_allow_credentials: bool,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,

    // ========================================================================
    // Tenancy
    // ========================================================================
    /// Upper bound on a whole request, transaction included. Exceeding it
    /// rolls the transaction back and answers 504.
    pub request_timeout: Duration,

    /// Optional PostgreSQL `statement_timeout` applied inside each tenant
    /// transaction.
    pub statement_timeout: Option<Duration>,

    /// Reject hosts whose first label is not a valid tenant id with 400
    /// instead of serving them as `public`.
    pub strict_tenant_hosts: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            port: 3000,

            cors_origins: Vec::new(), // Empty = allow all
            cors_allow_credentials: false,
            cors_max_age_secs: 86400, // 24 hours

            request_timeout: Duration::from_secs(30),
            statement_timeout: None,
            strict_tenant_hosts: false,
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `SHOPWRIGHT_API_BIND`: Interface to bind (default: 0.0.0.0)
    /// - `PORT` / `SHOPWRIGHT_API_PORT`: Listen port (default: 3000)
    /// - `SHOPWRIGHT_CORS_ORIGINS`: Comma-separated allowed origins (empty = allow all)
    /// - `SHOPWRIGHT_CORS_ALLOW_CREDENTIALS`: "true" or "false" (default: false)
    /// - `SHOPWRIGHT_CORS_MAX_AGE_SECS`: Preflight cache duration (default: 86400)
    /// - `SHOPWRIGHT_REQUEST_TIMEOUT_MS`: Whole-request bound (default: 30000)
    /// - `SHOPWRIGHT_STATEMENT_TIMEOUT_MS`: Postgres statement timeout (default: unset)
    /// - `SHOPWRIGHT_STRICT_TENANT_HOSTS`: "true" to reject unsafe hosts (default: false)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let bind_host = std::env::var("SHOPWRIGHT_API_BIND").unwrap_or(defaults.bind_host);

        let port = std::env::var("PORT")
            .ok()
            .or_else(|| std::env::var("SHOPWRIGHT_API_PORT").ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.port);

        let cors_origins = std::env::var("SHOPWRIGHT_CORS_ORIGINS")
            .ok()
            .map(|s| parse_origins(&s))
            .unwrap_or_default();

        let cors_allow_credentials = std::env::var("SHOPWRIGHT_CORS_ALLOW_CREDENTIALS")
            .ok()
            .map(|s| s.to_lowercase() == "true")
            .unwrap_or(false);

        let cors_max_age_secs = std::env::var("SHOPWRIGHT_CORS_MAX_AGE_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.cors_max_age_secs);

        let request_timeout = std::env::var("SHOPWRIGHT_REQUEST_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|ms: &u64| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(defaults.request_timeout);

        let statement_timeout = std::env::var("SHOPWRIGHT_STATEMENT_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|ms: &u64| *ms > 0)
            .map(Duration::from_millis);

        let strict_tenant_hosts = std::env::var("SHOPWRIGHT_STRICT_TENANT_HOSTS")
            .ok()
            .map(|s| matches!(s.to_lowercase().as_str(), "true" | "1"))
            .unwrap_or(false);

        Self {
            bind_host,
            port,
            cors_origins,
            cors_allow_credentials,
            cors_max_age_secs,
            request_timeout,
            statement_timeout,
            strict_tenant_hosts,
        }
    }

    /// Socket address to bind.
    pub fn bind_addr(&self) -> ApiResult<SocketAddr> {
        let addr = format!("{}:{}", self.bind_host, self.port);
        addr.parse::<SocketAddr>().map_err(|e| {
            ApiError::invalid_input(format!("Invalid bind address {}: {}", addr, e))
        })
    }

    /// Check if a given origin is allowed.
    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        if self.cors_origins.is_empty() {
            // Dev mode: allow all
            return true;
        }

        self.cors_origins.iter().any(|allowed| {
            if allowed == origin {
                return true;
            }
            // Wildcard subdomains: *.shopwright.dev
            if let Some(pattern) = allowed.strip_prefix("*.") {
                if let Some(origin_domain) = origin.strip_prefix("https://") {
                    return origin_domain.ends_with(&format!(".{}", pattern));
                }
            }
            false
        })
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .collect()
}
