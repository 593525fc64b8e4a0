//! Tenant isolation for the HTTP layer
//!
//! - `host`: tenant candidate from the request host
//! - `schema`: search path and shop DDL, the only SQL built from a tenant id
//! - `middleware`: one transaction per request, committed or rolled back
//!   from the response
//!
//! # Layer order
//!
//! ```ignore
//! Router::new()
//!     .route("/api/v1/pages", get(handler))
//!     .with_state(app_state)
//!     // Every handler above sees a RequestScope extension
//!     .layer(from_fn_with_state(tenancy_state, tenancy_middleware))
//! ```

pub mod host;
pub mod middleware;
pub mod schema;

pub use host::{extract_tenant_id, request_host};
pub use middleware::{session_cookie, tenancy_middleware, TenancyError, TenancyState, SESSION_COOKIE};
pub use schema::{
    apply_search_path, apply_statement_timeout, bootstrap_platform_schema, platform_schema_statements,
    run_statements, shop_schema_statements,
};
