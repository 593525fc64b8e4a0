//! Database Connection Pool Module
//!
//! PostgreSQL connection pooling with deadpool-postgres, and the
//! [`TransactionSource`] / [`TenantTransaction`] implementations the tenancy
//! middleware runs every request through.
//!
//! A [`PgTransaction`] owns its pooled connection for its whole life. It is
//! finished exactly once. If it is dropped while still open, the connection
//! is detached from the pool instead of being recycled mid-transaction;
//! closing it makes PostgreSQL abort the transaction.

use crate::error::{ApiError, ApiResult};
use async_trait::async_trait;
use deadpool_postgres::{Config, ManagerConfig, Object, Pool, PoolError, RecyclingMethod, Runtime};
use serde_json::Value as JsonValue;
use shopwright_core::{DbError, DbResult, SqlValue, TenantExecutor, TenantTransaction, TransactionSource};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_postgres::types::ToSql;
use tokio_postgres::NoTls;

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// How long a request waits for a free connection
    pub timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "shopwright".to_string(),
            user: "postgres".to_string(),
            password: "".to_string(),
            max_size: 16,
            timeout: Duration::from_secs(30),
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("SHOPWRIGHT_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("SHOPWRIGHT_DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5432),
            dbname: std::env::var("SHOPWRIGHT_DB_NAME").unwrap_or_else(|_| "shopwright".to_string()),
            user: std::env::var("SHOPWRIGHT_DB_USER").unwrap_or_else(|_| "postgres".to_string()),
            password: std::env::var("SHOPWRIGHT_DB_PASSWORD").unwrap_or_default(),
            max_size: std::env::var("SHOPWRIGHT_DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(16),
            timeout: Duration::from_secs(
                std::env::var("SHOPWRIGHT_DB_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }

    /// Create a connection pool from this configuration.
    pub fn create_pool(&self) -> ApiResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let mut pool_cfg = deadpool_postgres::PoolConfig::new(self.max_size);
        pool_cfg.timeouts.wait = Some(self.timeout);
        cfg.pool = Some(pool_cfg);

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| ApiError::database_error(format!("Failed to create pool: {}", e)))?;

        Ok(pool)
    }
}

// ============================================================================
// ERROR MAPPING
// ============================================================================

fn pool_error(err: PoolError) -> DbError {
    match err {
        PoolError::Timeout(_) => DbError::PoolExhausted,
        PoolError::Closed => DbError::PoolUnavailable {
            reason: "pool closed".to_string(),
        },
        other => DbError::PoolUnavailable {
            reason: other.to_string(),
        },
    }
}

fn query_error(err: tokio_postgres::Error) -> DbError {
    tracing::debug!("Statement failed: {:?}", err);
    DbError::query(err.to_string())
}

/// Borrow a bound parameter as a driver value.
fn as_sql(value: &SqlValue) -> &(dyn ToSql + Sync) {
    match value {
        SqlValue::Text(v) => v,
        SqlValue::OptText(v) => v,
        SqlValue::Int(v) => v,
        SqlValue::Bool(v) => v,
        SqlValue::Uuid(v) => v,
        SqlValue::OptUuid(v) => v,
        SqlValue::Json(v) => v,
    }
}

// ============================================================================
// TRANSACTIONS
// ============================================================================

/// Opens one transaction per request on a pooled connection.
#[derive(Clone)]
pub struct PgTransactionSource {
    pool: Pool,
}

impl PgTransactionSource {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create a transaction source from configuration.
    pub fn from_config(config: &DbConfig) -> ApiResult<Self> {
        Ok(Self::new(config.create_pool()?))
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }
}

#[async_trait]
impl TransactionSource for PgTransactionSource {
    async fn begin(&self) -> DbResult<Arc<dyn TenantTransaction>> {
        let client = self.pool.get().await.map_err(pool_error)?;
        client.batch_execute("BEGIN").await.map_err(query_error)?;
        Ok(Arc::new(PgTransaction {
            client: Mutex::new(Some(client)),
        }))
    }
}

/// A transaction on an owned pooled connection.
///
/// `None` once finished: later statements and a second finish return
/// [`DbError::TransactionFinished`].
pub struct PgTransaction {
    client: Mutex<Option<Object>>,
}

impl PgTransaction {
    async fn finish(&self, statement: &str) -> DbResult<()> {
        let client = self
            .client
            .lock()
            .await
            .take()
            .ok_or(DbError::TransactionFinished)?;

        match client.batch_execute(statement).await {
            // The connection goes back to the pool here.
            Ok(()) => Ok(()),
            Err(e) => {
                // State unknown, never recycle it.
                drop(Object::take(client));
                Err(query_error(e))
            }
        }
    }
}

#[async_trait]
impl TenantExecutor for PgTransaction {
    async fn execute(&self, sql: &str, params: &[SqlValue]) -> DbResult<u64> {
        let guard = self.client.lock().await;
        let client = guard.as_ref().ok_or(DbError::TransactionFinished)?;
        let bound: Vec<&(dyn ToSql + Sync)> = params.iter().map(as_sql).collect();
        client.execute(sql, &bound).await.map_err(query_error)
    }

    async fn query_json(&self, sql: &str, params: &[SqlValue]) -> DbResult<Vec<JsonValue>> {
        let guard = self.client.lock().await;
        let client = guard.as_ref().ok_or(DbError::TransactionFinished)?;
        let bound: Vec<&(dyn ToSql + Sync)> = params.iter().map(as_sql).collect();
        let rows = client.query(sql, &bound).await.map_err(query_error)?;
        rows.iter()
            .map(|row| {
                row.try_get::<_, JsonValue>(0)
                    .map_err(|e| DbError::decode(e.to_string()))
            })
            .collect()
    }
}

#[async_trait]
impl TenantTransaction for PgTransaction {
    async fn commit(&self) -> DbResult<()> {
        self.finish("COMMIT").await
    }

    async fn rollback(&self) -> DbResult<()> {
        self.finish("ROLLBACK").await
    }
}

impl Drop for PgTransaction {
    fn drop(&mut self) {
        if let Some(client) = self.client.get_mut().take() {
            tracing::warn!("Transaction dropped while open, discarding its connection");
            drop(Object::take(client));
        }
    }
}
