#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::Path,
    http::{Request, StatusCode},
    middleware::from_fn_with_state,
    response::Response,
    routing::get,
    Extension, Router,
};
use shopwright_api::{
    create_api_router,
    tenancy::{tenancy_middleware, TenancyState},
    ApiConfig, Backends,
};
use shopwright_core::{RequestScope, TenantExecutor, TransactionSource};
use shopwright_test_utils::{
    fixtures::featured_products, InMemoryCart, InMemoryCatalog, InMemoryPageStore,
    RecordingTransactionSource,
};

/// Full API router over recording transactions and in-memory stores.
pub struct TestApp {
    pub router: Router,
    pub transactions: Arc<RecordingTransactionSource>,
    pub catalog: Arc<InMemoryCatalog>,
    pub pages: Arc<InMemoryPageStore>,
}

pub fn test_app(pages: InMemoryPageStore) -> TestApp {
    test_app_with(pages, RecordingTransactionSource::new(), &ApiConfig::default())
}

pub fn test_app_with(
    pages: InMemoryPageStore,
    transactions: RecordingTransactionSource,
    config: &ApiConfig,
) -> TestApp {
    let transactions = Arc::new(transactions);
    let catalog = Arc::new(InMemoryCatalog::new(featured_products(6)));
    let pages = Arc::new(pages);
    let backends = Backends {
        transactions: transactions.clone(),
        catalog: catalog.clone(),
        carts: Arc::new(InMemoryCart::new()),
        pages: pages.clone(),
    };
    let router = create_api_router(backends, config).expect("router should build");
    TestApp {
        router,
        transactions,
        catalog,
        pages,
    }
}

// ============================================================================
// OUTCOME HANDLERS
// ============================================================================

async fn ok(Extension(scope): Extension<RequestScope>) -> StatusCode {
    match scope.execute("SELECT 1", &[]).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn status(Path(code): Path<u16>) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

async fn panics() -> StatusCode {
    panic!("handler exploded")
}

async fn sleeps() -> StatusCode {
    tokio::time::sleep(Duration::from_secs(10)).await;
    StatusCode::OK
}

async fn whoami(Extension(scope): Extension<RequestScope>) -> String {
    format!("{}|{}", scope.tenant_id(), scope.session_id().unwrap_or("-"))
}

/// Minimal handlers behind the tenancy middleware, one per outcome.
pub fn outcome_router(transactions: Arc<RecordingTransactionSource>, config: &ApiConfig) -> Router {
    let source: Arc<dyn TransactionSource> = transactions;
    Router::new()
        .route("/ok", get(ok))
        .route("/status/:code", get(status))
        .route("/panic", get(panics))
        .route("/sleep", get(sleeps))
        .route("/whoami", get(whoami))
        .layer(from_fn_with_state(TenancyState::new(source, config), tenancy_middleware))
}

// ============================================================================
// REQUEST HELPERS
// ============================================================================

pub fn get_request(uri: &str, host: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("GET")
        .header("host", host)
        .body(Body::empty())
        .expect("request should build")
}

pub fn json_request(method: &str, uri: &str, host: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method(method)
        .header("host", host)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request should build")
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    String::from_utf8_lossy(&bytes).into_owned()
}
