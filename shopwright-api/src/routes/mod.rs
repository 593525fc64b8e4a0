//! REST API Routes Module
//!
//! Includes:
//! - Storefront routes under /api/v1/* (pages, products, cart, orders,
//!   components)
//! - Shop directory and provisioning under /platform/*
//! - Health check endpoints (Kubernetes-compatible, outside tenancy)
//! - CORS support for browser-based editors
//!
//! Everything except /health runs behind the tenancy middleware.

pub mod cart;
pub mod components;
pub mod health;
pub mod orders;
pub mod pages;
pub mod platform;
pub mod products;

use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::state::{AppState, Backends};
use crate::tenancy::{tenancy_middleware, TenancyState};

pub use health::create_router as health_router;
pub use pages::create_router as pages_router;

// ============================================================================
// ROUTER
// ============================================================================

/// Routes that need a tenant transaction, without the tenancy layer.
fn tenant_routes(state: AppState) -> Router {
    let api = Router::new()
        .nest("/pages", pages::create_router())
        .route(
            "/products",
            get(products::list_products).post(products::create_product),
        )
        .nest("/cart", cart::create_router())
        .route("/orders", post(orders::place_order))
        .route("/components", get(components::list_components));

    Router::new()
        .nest("/api/v1", api)
        .route(
            "/platform/shops",
            get(platform::list_shops).post(platform::create_shop),
        )
        .with_state(state)
}

/// Create the complete API router.
///
/// # Middleware Order (outer to inner)
/// 1. CORS - handles preflight requests
/// 2. Trace - one span per request
/// 3. Tenancy (tenant routes only) - transaction per request
pub fn create_api_router(backends: Backends, config: &ApiConfig) -> ApiResult<Router> {
    if config.request_timeout.is_zero() {
        return Err(ApiError::invalid_input("Request timeout must be greater than zero"));
    }

    let tenancy = TenancyState::new(backends.transactions.clone(), config);
    let storefront = tenant_routes(AppState::new(&backends))
        .layer(from_fn_with_state(tenancy, tenancy_middleware));

    Ok(Router::new()
        .merge(storefront)
        .nest("/health", health::create_router(backends.transactions))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(config)))
}

// ============================================================================
// CORS LAYER
// ============================================================================

/// Build the CORS layer from ApiConfig.
///
/// In development mode (empty origins), allows all origins.
/// In production mode, only allows configured origins, including
/// `*.domain` wildcards for shop subdomains.
fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::COOKIE])
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if config.cors_origins.is_empty() {
        tracing::info!("CORS: Development mode - allowing all origins");
        cors.allow_origin(Any).allow_headers(Any)
    } else {
        tracing::info!(
            "CORS: Production mode - allowing origins: {:?}",
            config.cors_origins
        );
        let allowed = config.clone();
        let origins = AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            origin
                .to_str()
                .map(|o| allowed.is_origin_allowed(o))
                .unwrap_or(false)
        });

        if config.cors_allow_credentials {
            cors.allow_origin(origins).allow_credentials(true)
        } else {
            cors.allow_origin(origins)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopwright_test_utils::{InMemoryCart, InMemoryCatalog, InMemoryPageStore, RecordingTransactionSource};
    use std::sync::Arc;

    fn backends() -> Backends {
        Backends {
            transactions: Arc::new(RecordingTransactionSource::new()),
            catalog: Arc::new(InMemoryCatalog::new(Vec::new())),
            carts: Arc::new(InMemoryCart::new()),
            pages: Arc::new(InMemoryPageStore::new()),
        }
    }

    #[test]
    fn test_router_rejects_zero_timeout() {
        let config = ApiConfig {
            request_timeout: Duration::ZERO,
            ..ApiConfig::default()
        };
        assert!(create_api_router(backends(), &config).is_err());
    }

    #[test]
    fn test_router_builds_with_defaults() {
        assert!(create_api_router(backends(), &ApiConfig::default()).is_ok());
    }

    #[test]
    fn test_cors_layer_builds_for_wildcards() {
        let config = ApiConfig {
            cors_origins: vec!["*.shopwright.dev".to_string()],
            cors_allow_credentials: true,
            ..ApiConfig::default()
        };
        let _layer = build_cors_layer(&config);
    }
}
