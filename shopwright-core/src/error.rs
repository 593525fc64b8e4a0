//! Error types for Shopwright core operations

use thiserror::Error;

/// Reasons a tenant identifier candidate is rejected.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TenantIdError {
    #[error("Tenant id is empty")]
    Empty,

    #[error("Tenant id is {len} bytes, maximum is {max}")]
    TooLong { len: usize, max: usize },

    #[error("Tenant id contains characters outside [a-z0-9_]")]
    InvalidCharacters,
}

/// Database access errors surfaced through the transaction traits.
///
/// Messages are meant for logs. The HTTP layer maps these to generic
/// client-facing errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DbError {
    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Connection pool unavailable: {reason}")]
    PoolUnavailable { reason: String },

    #[error("Query failed: {reason}")]
    QueryFailed { reason: String },

    #[error("Failed to decode row: {reason}")]
    Decode { reason: String },

    #[error("Transaction already finished")]
    TransactionFinished,
}

impl DbError {
    /// Create a QueryFailed error.
    pub fn query(reason: impl Into<String>) -> Self {
        Self::QueryFailed {
            reason: reason.into(),
        }
    }

    /// Create a Decode error.
    pub fn decode(reason: impl Into<String>) -> Self {
        Self::Decode {
            reason: reason.into(),
        }
    }
}

/// Result type alias for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tenant_id_error_display() {
        let err = TenantIdError::TooLong { len: 80, max: 63 };
        let msg = format!("{}", err);
        assert!(msg.contains("80"));
        assert!(msg.contains("63"));
    }

    #[test]
    fn test_db_error_constructors() {
        assert_eq!(
            DbError::query("boom"),
            DbError::QueryFailed {
                reason: "boom".to_string()
            }
        );
        assert!(format!("{}", DbError::decode("bad json")).contains("bad json"));
    }
}
