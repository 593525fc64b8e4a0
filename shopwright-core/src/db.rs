//! Transaction Traits
//!
//! Storage-agnostic seams for the per-request transaction. The HTTP crate
//! implements them over deadpool-postgres, tests implement them with
//! recording fakes.
//!
//! Rows come back as JSON values (queries select `to_jsonb(...)`), which keeps
//! the traits object-safe and free of driver types.

use crate::error::DbResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use uuid::Uuid;

/// A bound statement parameter.
///
/// Everything that reaches SQL from outside goes through one of these; no
/// value is ever spliced into statement text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SqlValue {
    Text(String),
    OptText(Option<String>),
    Int(i64),
    Bool(bool),
    Uuid(Uuid),
    OptUuid(Option<Uuid>),
    Json(JsonValue),
}

impl SqlValue {
    /// Text content of a `Text` parameter.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::OptText(s) => s.as_deref(),
            _ => None,
        }
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Uuid> for SqlValue {
    fn from(value: Uuid) -> Self {
        Self::Uuid(value)
    }
}

impl From<JsonValue> for SqlValue {
    fn from(value: JsonValue) -> Self {
        Self::Json(value)
    }
}

/// Statement execution inside an already-open transaction.
#[async_trait]
pub trait TenantExecutor: Send + Sync {
    /// Run a statement and return the number of affected rows.
    async fn execute(&self, sql: &str, params: &[SqlValue]) -> DbResult<u64>;

    /// Run a query whose single column is a JSON value per row.
    async fn query_json(&self, sql: &str, params: &[SqlValue]) -> DbResult<Vec<JsonValue>>;
}

/// A transaction that can be finished. Only the tenancy middleware holds this
/// view; handlers see it through [`crate::scope::RequestScope`].
#[async_trait]
pub trait TenantTransaction: TenantExecutor {
    async fn commit(&self) -> DbResult<()>;
    async fn rollback(&self) -> DbResult<()>;
}

/// Opens transactions on pooled connections.
#[async_trait]
pub trait TransactionSource: Send + Sync {
    async fn begin(&self) -> DbResult<Arc<dyn TenantTransaction>>;
}
