//! Shopwright API - Tenant-Isolated HTTP Layer
//!
//! Axum routes for the storefront and the platform. Each shop is a
//! PostgreSQL schema; the tenancy middleware resolves the shop from the
//! request host and runs the whole request inside one transaction scoped to
//! that schema.

#[macro_use]
mod macros;

pub mod config;
pub mod db;
pub mod error;
pub mod repo;
pub mod routes;
pub mod state;
pub mod telemetry;
pub mod tenancy;

// Re-export commonly used types
pub use config::ApiConfig;
pub use db::{DbConfig, PgTransaction, PgTransactionSource};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use routes::create_api_router;
pub use state::{AppState, Backends};
pub use telemetry::{init_tracing, TelemetryConfig};
pub use tenancy::{tenancy_middleware, TenancyError, TenancyState};
