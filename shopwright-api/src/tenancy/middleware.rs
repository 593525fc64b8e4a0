//! Transactional tenancy middleware.
//!
//! Every request under this layer runs inside one database transaction whose
//! search path names the tenant resolved from the host. The final response
//! decides the outcome:
//!
//! | Outcome                       | Transaction | Response             |
//! |-------------------------------|-------------|----------------------|
//! | status < 400                  | commit      | handler's response   |
//! | status >= 400                 | rollback    | handler's response   |
//! | handler panicked              | rollback    | 500                  |
//! | request timeout               | rollback    | 504                  |
//! | commit failed                 | (commit)    | 500                  |
//! | future dropped (disconnect)   | rollback    | none                 |
//!
//! Handlers reach the transaction only through [`RequestScope`], which cannot
//! commit or roll back.

use super::host::{extract_tenant_id, request_host};
use super::schema::{apply_search_path, apply_statement_timeout};
use crate::config::ApiConfig;
use crate::error::{ApiError, ErrorCode};
use axum::extract::{Request, State};
use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use futures_util::FutureExt;
use shopwright_core::{DbError, DbResult, RequestScope, TenantId, TenantTransaction, TransactionSource};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, warn};
use uuid::Uuid;

/// Cookie carrying the storefront session.
pub const SESSION_COOKIE: &str = "session_id";

// ============================================================================
// ERRORS
// ============================================================================

/// Failures inside the middleware itself. Logged in full; clients only ever
/// see the generic [`ApiError`] each one maps to.
#[derive(Debug, Error)]
pub enum TenancyError {
    #[error("Host does not name a valid tenant: {reason}")]
    UnsafeHost { reason: String },

    #[error("Failed to begin transaction: {0}")]
    Begin(DbError),

    #[error("Failed to prepare tenant transaction: {0}")]
    Prepare(DbError),

    #[error("Failed to commit transaction: {0}")]
    Commit(DbError),

    #[error("Request exceeded {0:?}")]
    Timeout(Duration),

    #[error("Handler panicked: {0}")]
    Panicked(String),
}

impl From<TenancyError> for ApiError {
    fn from(err: TenancyError) -> Self {
        match err {
            TenancyError::UnsafeHost { .. } => ApiError::invalid_tenant_host(),
            TenancyError::Begin(DbError::PoolExhausted) => ApiError::connection_pool_exhausted(),
            TenancyError::Timeout(_) => ApiError::timeout("request"),
            TenancyError::Begin(_)
            | TenancyError::Prepare(_)
            | TenancyError::Commit(_)
            | TenancyError::Panicked(_) => ApiError::from_code(ErrorCode::InternalError),
        }
    }
}

impl IntoResponse for TenancyError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

// ============================================================================
// STATE
// ============================================================================

/// Middleware state: where transactions come from and the per-request limits.
#[derive(Clone)]
pub struct TenancyState {
    source: Arc<dyn TransactionSource>,
    request_timeout: Duration,
    statement_timeout: Option<Duration>,
    strict_hosts: bool,
}

impl TenancyState {
    pub fn new(source: Arc<dyn TransactionSource>, config: &ApiConfig) -> Self {
        Self {
            source,
            request_timeout: config.request_timeout,
            statement_timeout: config.statement_timeout,
            strict_hosts: config.strict_tenant_hosts,
        }
    }

    /// Resolve and validate the tenant for a host.
    fn resolve_tenant(&self, host: Option<&str>) -> Result<TenantId, TenancyError> {
        let candidate = host.map(extract_tenant_id).unwrap_or(shopwright_core::PUBLIC_TENANT);
        match TenantId::parse(candidate) {
            Ok(tenant) => Ok(tenant),
            Err(e) if self.strict_hosts => Err(TenancyError::UnsafeHost {
                reason: e.to_string(),
            }),
            Err(e) => {
                warn!(candidate = ?candidate, error = %e, "Unsafe tenant id in host, serving public");
                Ok(TenantId::public())
            }
        }
    }

    async fn prepare(&self, tx: &dyn TenantTransaction, tenant: &TenantId) -> DbResult<()> {
        apply_search_path(tx, tenant).await?;
        if let Some(timeout) = self.statement_timeout {
            apply_statement_timeout(tx, timeout).await?;
        }
        Ok(())
    }
}

// ============================================================================
// TRANSACTION GUARD
// ============================================================================

/// Finishes the transaction exactly once. Dropped unfinished, it schedules a
/// rollback on the current runtime.
struct TxGuard {
    tx: Option<Arc<dyn TenantTransaction>>,
    tenant: TenantId,
}

impl TxGuard {
    fn new(tx: Arc<dyn TenantTransaction>, tenant: TenantId) -> Self {
        Self { tx: Some(tx), tenant }
    }

    async fn commit(mut self) -> DbResult<()> {
        match self.tx.take() {
            Some(tx) => tx.commit().await,
            None => Err(DbError::TransactionFinished),
        }
    }

    async fn rollback(mut self) {
        if let Some(tx) = self.tx.take() {
            if let Err(e) = tx.rollback().await {
                warn!(tenant_id = %self.tenant, error = %e, "Rollback failed");
            }
        }
    }
}

impl Drop for TxGuard {
    fn drop(&mut self) {
        let Some(tx) = self.tx.take() else {
            return;
        };
        let tenant = self.tenant.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                debug!(tenant_id = %tenant, "Request dropped, rolling back");
                handle.spawn(async move {
                    if let Err(e) = tx.rollback().await {
                        warn!(tenant_id = %tenant, error = %e, "Rollback after drop failed");
                    }
                });
            }
            // Dropping the last handle discards the connection, which aborts
            // the transaction server-side.
            Err(_) => warn!(tenant_id = %tenant, "No runtime for rollback, discarding transaction"),
        }
    }
}

// ============================================================================
// MIDDLEWARE
// ============================================================================

/// Wrap the rest of the chain in a tenant-scoped transaction.
pub async fn tenancy_middleware(
    State(state): State<TenancyState>,
    mut request: Request,
    next: Next,
) -> Response {
    let tenant = match state.resolve_tenant(request_host(&request)) {
        Ok(tenant) => tenant,
        Err(e) => {
            warn!(error = %e, "Rejecting request for unsafe host");
            return e.into_response();
        }
    };

    let tx = match state.source.begin().await {
        Ok(tx) => tx,
        Err(e) => {
            error!(tenant_id = %tenant, error = %e, "Failed to begin tenant transaction");
            return TenancyError::Begin(e).into_response();
        }
    };
    let guard = TxGuard::new(Arc::clone(&tx), tenant.clone());

    if let Err(e) = state.prepare(tx.as_ref(), &tenant).await {
        error!(tenant_id = %tenant, error = %e, "Failed to set tenant schema");
        guard.rollback().await;
        return TenancyError::Prepare(e).into_response();
    }

    let scope = RequestScope::new(tenant.clone(), tx).with_session(session_cookie(request.headers()));
    request.extensions_mut().insert(scope);

    let run = AssertUnwindSafe(next.run(request)).catch_unwind();
    let outcome = match tokio::time::timeout(state.request_timeout, run).await {
        Err(_) => Err(TenancyError::Timeout(state.request_timeout)),
        Ok(Err(panic)) => Err(TenancyError::Panicked(panic_message(panic.as_ref()))),
        Ok(Ok(response)) => Ok(response),
    };

    match outcome {
        Err(e) => {
            error!(tenant_id = %tenant, error = %e, "Request aborted, rolling back");
            guard.rollback().await;
            e.into_response()
        }
        Ok(response) if response.status().as_u16() >= 400 => {
            debug!(tenant_id = %tenant, status = %response.status(), "Rolling back");
            guard.rollback().await;
            response
        }
        Ok(response) => match guard.commit().await {
            Ok(()) => response,
            Err(e) => {
                error!(tenant_id = %tenant, error = %e, "Commit failed");
                TenancyError::Commit(e).into_response()
            }
        },
    }
}

/// The `session_id` cookie, if it holds a UUID.
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
        .map(|id| id.to_string())
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use shopwright_test_utils::RecordingTransactionSource;

    fn state(strict: bool) -> TenancyState {
        let config = ApiConfig {
            strict_tenant_hosts: strict,
            ..ApiConfig::default()
        };
        TenancyState::new(Arc::new(RecordingTransactionSource::new()), &config)
    }

    #[test]
    fn test_resolve_tenant_falls_back_to_public() {
        let tenant = state(false).resolve_tenant(Some("Bad-Host.example.com"));
        assert_eq!(tenant.map(|t| t.to_string()).ok(), Some("public".to_string()));
    }

    #[test]
    fn test_resolve_tenant_strict_rejects() {
        let tenant = state(true).resolve_tenant(Some("bad-host.example.com"));
        assert!(matches!(tenant, Err(TenancyError::UnsafeHost { .. })));

        let tenant = state(true).resolve_tenant(Some("localhost:3000"));
        assert!(matches!(tenant, Ok(ref t) if t.is_public()));
    }

    #[test]
    fn test_missing_host_is_public() {
        let tenant = state(false).resolve_tenant(None);
        assert!(matches!(tenant, Ok(ref t) if t.is_public()));
    }

    #[test]
    fn test_session_cookie_parsing() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        let cookie = format!("theme=dark; session_id={}; other=1", id);
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            headers.insert(COOKIE, value);
        }
        assert_eq!(session_cookie(&headers), Some(id.to_string()));

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("session_id=not-a-uuid"));
        assert_eq!(session_cookie(&headers), None);
        assert_eq!(session_cookie(&HeaderMap::new()), None);
    }

    #[test]
    fn test_errors_never_echo_internals() {
        let err = ApiError::from(TenancyError::Prepare(DbError::query("schema \"shop1\" does not exist")));
        assert_eq!(err.code, ErrorCode::InternalError);
        assert!(!err.message.contains("shop1"));

        let err = ApiError::from(TenancyError::UnsafeHost {
            reason: "evil'; DROP".to_string(),
        });
        assert!(!err.message.contains("DROP"));
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
    }
}
