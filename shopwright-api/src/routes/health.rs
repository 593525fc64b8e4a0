//! Health Check Endpoints
//!
//! Kubernetes-compatible health checks, served outside the tenancy layer:
//! - /health/ping - Simple liveness check
//! - /health/live - Process alive check
//! - /health/ready - Database connectivity check

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use shopwright_core::{TenantExecutor, TransactionSource};
use std::sync::Arc;

// ============================================================================
// TYPES
// ============================================================================

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HealthDetails>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthDetails {
    pub database: ComponentHealth,
    pub version: String,
    pub uptime_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ============================================================================
// STATE
// ============================================================================

#[derive(Clone)]
pub struct HealthState {
    pub transactions: Arc<dyn TransactionSource>,
    pub start_time: std::time::Instant,
}

impl HealthState {
    pub fn new(transactions: Arc<dyn TransactionSource>) -> Self {
        Self {
            transactions,
            start_time: std::time::Instant::now(),
        }
    }
}

// ============================================================================
// HANDLERS
// ============================================================================

/// GET /health/ping - Simple pong response
pub async fn ping() -> impl IntoResponse {
    (StatusCode::OK, "pong")
}

/// GET /health/live - Process liveness check
pub async fn liveness() -> impl IntoResponse {
    let response = HealthResponse {
        status: HealthStatus::Healthy,
        message: Some("Process is alive".to_string()),
        details: None,
    };
    (StatusCode::OK, Json(response))
}

/// GET /health/ready - Readiness check (database connectivity)
pub async fn readiness(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    let db_health = match check_database(state.transactions.as_ref()).await {
        Ok(latency) => ComponentHealth {
            status: HealthStatus::Healthy,
            latency_ms: Some(latency),
            error: None,
        },
        Err(e) => ComponentHealth {
            status: HealthStatus::Unhealthy,
            latency_ms: None,
            error: Some(e),
        },
    };

    let overall_status = db_health.status;
    let response = HealthResponse {
        status: overall_status,
        message: None,
        details: Some(HealthDetails {
            database: db_health,
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: state.start_time.elapsed().as_secs(),
        }),
    };

    let status_code = if overall_status == HealthStatus::Healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response))
}

/// Open a transaction, run a trivial statement, roll back.
async fn check_database(transactions: &dyn TransactionSource) -> Result<u64, String> {
    let start = std::time::Instant::now();

    let tx = transactions
        .begin()
        .await
        .map_err(|e| format!("Database check failed: {}", e))?;
    let ping = tx.execute("SELECT 1", &[]).await;
    let rollback = tx.rollback().await;
    ping
        .and(rollback)
        .map_err(|e| format!("Database check failed: {}", e))?;

    Ok(start.elapsed().as_millis() as u64)
}

// ============================================================================
// ROUTER
// ============================================================================

/// Create health check router (no tenancy)
pub fn create_router(transactions: Arc<dyn TransactionSource>) -> Router {
    let state = Arc::new(HealthState::new(transactions));

    Router::new()
        .route("/ping", get(ping))
        .route("/live", get(liveness))
        .route("/ready", get(readiness))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopwright_core::DbError;
    use shopwright_test_utils::RecordingTransactionSource;

    #[test]
    fn test_health_response_serialization() -> Result<(), serde_json::Error> {
        let response = HealthResponse {
            status: HealthStatus::Healthy,
            message: Some("All systems operational".to_string()),
            details: None,
        };

        let json = serde_json::to_string(&response)?;
        assert!(json.contains("\"status\":\"healthy\""));
        assert!(!json.contains("details"));
        Ok(())
    }

    #[tokio::test]
    async fn test_check_database_rolls_back_ping() {
        let source = RecordingTransactionSource::new();
        assert!(check_database(&source).await.is_ok());

        let tx = source.last();
        assert_eq!(tx.as_ref().map(|t| (t.commits(), t.rollbacks())), Some((0, 1)));
    }

    #[tokio::test]
    async fn test_check_database_reports_pool_errors() {
        let source = RecordingTransactionSource::failing_begin(DbError::PoolExhausted);
        let result = check_database(&source).await;
        assert!(matches!(result, Err(ref e) if e.contains("exhausted")));
    }
}
