//! Request Scope
//!
//! The per-request binding of tenant, transaction and session. Handlers and
//! resolvers read and write through it; only the tenancy middleware can
//! finish the transaction underneath.

use crate::db::{SqlValue, TenantExecutor, TenantTransaction};
use crate::error::{DbError, DbResult};
use crate::tenant::TenantId;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::fmt;
use std::sync::Arc;

/// Tenant, transaction and session for one request.
#[derive(Clone)]
pub struct RequestScope {
    tenant_id: TenantId,
    tx: Arc<dyn TenantTransaction>,
    session_id: Option<String>,
}

impl RequestScope {
    pub fn new(tenant_id: TenantId, tx: Arc<dyn TenantTransaction>) -> Self {
        Self {
            tenant_id,
            tx,
            session_id: None,
        }
    }

    pub fn with_session(mut self, session_id: Option<String>) -> Self {
        self.session_id = session_id.filter(|s| !s.is_empty());
        self
    }

    /// The same transaction and session, acting for another tenant.
    ///
    /// Used by shop provisioning, which writes into a freshly created schema
    /// from inside the platform request. The caller is responsible for
    /// pointing the transaction's search path at that schema.
    pub fn rebind(&self, tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            tx: Arc::clone(&self.tx),
            session_id: self.session_id.clone(),
        }
    }

    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Query and deserialize each JSON row into `T`.
    pub async fn query_as<T: DeserializeOwned>(
        &self,
        sql: &str,
        params: &[SqlValue],
    ) -> DbResult<Vec<T>> {
        self.tx
            .query_json(sql, params)
            .await?
            .into_iter()
            .map(|row| serde_json::from_value(row).map_err(|e| DbError::decode(e.to_string())))
            .collect()
    }

    /// Query for at most one row.
    pub async fn query_opt_as<T: DeserializeOwned>(
        &self,
        sql: &str,
        params: &[SqlValue],
    ) -> DbResult<Option<T>> {
        Ok(self.query_as(sql, params).await?.into_iter().next())
    }
}

#[async_trait::async_trait]
impl TenantExecutor for RequestScope {
    async fn execute(&self, sql: &str, params: &[SqlValue]) -> DbResult<u64> {
        self.tx.execute(sql, params).await
    }

    async fn query_json(&self, sql: &str, params: &[SqlValue]) -> DbResult<Vec<JsonValue>> {
        self.tx.query_json(sql, params).await
    }
}

impl fmt::Debug for RequestScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestScope")
            .field("tenant_id", &self.tenant_id)
            .field("session_id", &self.session_id)
            .finish_non_exhaustive()
    }
}
