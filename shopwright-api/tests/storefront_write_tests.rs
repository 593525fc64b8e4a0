//! Cart, order and catalog writes through the full router.
//!
//! These handlers issue several statements per request; a failure at any
//! step must roll all of them back.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value as JsonValue};
use shopwright_api::ApiConfig;
use shopwright_test_utils::{
    assertions::{assert_committed_once, assert_rolled_back_once},
    InMemoryPageStore, RecordingTransaction, RecordingTransactionSource, TxBehavior,
};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

#[path = "support/app.rs"]
mod test_app_support;
use test_app_support::{body_json, get_request, json_request, test_app_with, TestApp};

const SHOP_HOST: &str = "shop1.example.com";

fn app_with(behavior: TxBehavior) -> TestApp {
    test_app_with(
        InMemoryPageStore::new(),
        RecordingTransactionSource::with_behavior(behavior),
        &ApiConfig::default(),
    )
}

fn with_session(mut request: Request<Body>, session: Uuid) -> Request<Body> {
    request.headers_mut().insert(
        header::COOKIE,
        format!("session_id={}", session).parse().expect("valid header"),
    );
    request
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method(method)
        .header("host", SHOP_HOST)
        .body(Body::empty())
        .expect("request should build")
}

fn last_tx(app: &TestApp) -> Arc<RecordingTransaction> {
    app.transactions.last().expect("transaction")
}

fn sql_of(tx: &RecordingTransaction) -> Vec<String> {
    tx.statements().into_iter().map(|s| s.sql).collect()
}

/// A cart holding a mug and a poster, plus the order insert's returned row.
fn cart_rows(cart_id: Uuid) -> Vec<(String, Vec<JsonValue>)> {
    let header = vec![json!({"cart_id": cart_id, "session_id": "ignored"})];
    vec![
        ("INSERT INTO carts".to_string(), header.clone()),
        ("FROM carts WHERE".to_string(), header),
        (
            "FROM cart_items".to_string(),
            vec![
                json!({"product_id": Uuid::new_v4(), "title": "Mug", "quantity": 2,
                       "unit_price_cents": 1500, "is_digital": false}),
                json!({"product_id": Uuid::new_v4(), "title": "Poster", "quantity": 1,
                       "unit_price_cents": 999, "is_digital": true}),
            ],
        ),
        (
            "INSERT INTO orders".to_string(),
            vec![json!({"id": Uuid::new_v4(), "created_at": "2026-03-01T12:00:00Z"})],
        ),
    ]
}

// ============================================================================
// CART
// ============================================================================

#[tokio::test]
async fn test_add_item_starts_session_and_commits() {
    let app = app_with(TxBehavior {
        canned_rows: cart_rows(Uuid::new_v4()),
        ..TxBehavior::default()
    });
    let body = json!({"product_id": Uuid::new_v4(), "quantity": 2});

    let response = app
        .router
        .clone()
        .oneshot(json_request("POST", "/api/v1/cart/items", SHOP_HOST, &body))
        .await
        .expect("infallible");

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_default();
    assert!(cookie.starts_with("session_id="), "cookie: {:?}", cookie);
    let cart = body_json(response).await;
    assert_eq!(cart["subtotal_cents"], 3999);

    let tx = last_tx(&app);
    assert_committed_once(&tx);
    assert!(sql_of(&tx).iter().any(|s| s.contains("INSERT INTO cart_items")));
}

#[tokio::test]
async fn test_add_item_with_session_sets_no_cookie() {
    let app = app_with(TxBehavior {
        canned_rows: cart_rows(Uuid::new_v4()),
        ..TxBehavior::default()
    });
    let session = Uuid::new_v4();
    let body = json!({"product_id": Uuid::new_v4()});

    let response = app
        .router
        .clone()
        .oneshot(with_session(
            json_request("POST", "/api/v1/cart/items", SHOP_HOST, &body),
            session,
        ))
        .await
        .expect("infallible");

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    let upsert = last_tx(&app)
        .statements()
        .into_iter()
        .find(|s| s.sql.contains("INSERT INTO carts"))
        .map(|s| s.params);
    assert_eq!(
        upsert.and_then(|p| p.first().and_then(|v| v.as_text().map(str::to_string))),
        Some(session.to_string())
    );
}

#[tokio::test]
async fn test_out_of_range_quantity_rolls_back_untouched() {
    let app = app_with(TxBehavior::default());
    let body = json!({"product_id": Uuid::new_v4(), "quantity": 0});

    let response = app
        .router
        .clone()
        .oneshot(json_request("POST", "/api/v1/cart/items", SHOP_HOST, &body))
        .await
        .expect("infallible");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let tx = last_tx(&app);
    assert_rolled_back_once(&tx);
    assert!(sql_of(&tx).iter().all(|s| !s.contains("cart")));
}

#[tokio::test]
async fn test_failed_item_write_rolls_back_cart_creation() {
    let app = app_with(TxBehavior {
        canned_rows: cart_rows(Uuid::new_v4()),
        fail_statements_containing: Some("INSERT INTO cart_items".to_string()),
        ..TxBehavior::default()
    });
    let body = json!({"product_id": Uuid::new_v4(), "quantity": 1});

    let response = app
        .router
        .clone()
        .oneshot(json_request("POST", "/api/v1/cart/items", SHOP_HOST, &body))
        .await
        .expect("infallible");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert!(!body.to_string().contains("injected"));
    let tx = last_tx(&app);
    assert_rolled_back_once(&tx);
    assert!(sql_of(&tx).iter().any(|s| s.contains("INSERT INTO carts")));
}

#[tokio::test]
async fn test_cart_line_routes_need_a_session() {
    let app = app_with(TxBehavior::default());
    let uri = format!("/api/v1/cart/items/{}", Uuid::new_v4());

    let response = app
        .router
        .clone()
        .oneshot(json_request("PUT", &uri, SHOP_HOST, &json!({"quantity": 3})))
        .await
        .expect("infallible");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "MISSING_FIELD");
    assert_rolled_back_once(&last_tx(&app));
}

#[tokio::test]
async fn test_update_without_cart_is_404() {
    let app = app_with(TxBehavior::default());
    let uri = format!("/api/v1/cart/items/{}", Uuid::new_v4());

    let response = app
        .router
        .clone()
        .oneshot(with_session(
            json_request("PUT", &uri, SHOP_HOST, &json!({"quantity": 3})),
            Uuid::new_v4(),
        ))
        .await
        .expect("infallible");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "ENTITY_NOT_FOUND");
    assert_rolled_back_once(&last_tx(&app));
}

#[tokio::test]
async fn test_remove_item_commits() {
    let app = app_with(TxBehavior {
        canned_rows: cart_rows(Uuid::new_v4()),
        ..TxBehavior::default()
    });
    let uri = format!("/api/v1/cart/items/{}", Uuid::new_v4());

    let response = app
        .router
        .clone()
        .oneshot(with_session(empty_request("DELETE", &uri), Uuid::new_v4()))
        .await
        .expect("infallible");

    assert_eq!(response.status(), StatusCode::OK);
    let tx = last_tx(&app);
    assert_committed_once(&tx);
    assert!(sql_of(&tx).iter().any(|s| s.starts_with("DELETE FROM cart_items")));
}

#[tokio::test]
async fn test_get_cart_reads_without_creating() {
    let app = app_with(TxBehavior {
        canned_rows: cart_rows(Uuid::new_v4()),
        ..TxBehavior::default()
    });

    let response = app
        .router
        .clone()
        .oneshot(with_session(get_request("/api/v1/cart", SHOP_HOST), Uuid::new_v4()))
        .await
        .expect("infallible");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["items"].as_array().map(Vec::len), Some(2));
    assert!(sql_of(&last_tx(&app)).iter().all(|s| !s.contains("INSERT")));
}

// ============================================================================
// ORDERS
// ============================================================================

#[tokio::test]
async fn test_order_from_cart_commits_lines_and_clears_cart() {
    let cart_id = Uuid::new_v4();
    let app = app_with(TxBehavior {
        canned_rows: cart_rows(cart_id),
        ..TxBehavior::default()
    });

    let response = app
        .router
        .clone()
        .oneshot(with_session(empty_request("POST", "/api/v1/orders"), Uuid::new_v4()))
        .await
        .expect("infallible");

    assert_eq!(response.status(), StatusCode::CREATED);
    let order = body_json(response).await;
    assert_eq!(order["total_cents"], 3999);
    assert_eq!(order["status"], "pending");
    assert_eq!(order["payment_status"], "unpaid");
    assert_eq!(order["items"].as_array().map(Vec::len), Some(2));

    let tx = last_tx(&app);
    assert_committed_once(&tx);
    let statements = tx.statements();
    let lines = statements
        .iter()
        .filter(|s| s.sql.contains("INSERT INTO order_items"))
        .count();
    assert_eq!(lines, 2);
    let last = statements.last().expect("statements");
    assert!(last.sql.starts_with("DELETE FROM carts"));
    assert_eq!(last.params, vec![shopwright_test_utils::SqlValue::Uuid(cart_id)]);
}

#[tokio::test]
async fn test_failed_order_line_rolls_back_whole_order() {
    let app = app_with(TxBehavior {
        canned_rows: cart_rows(Uuid::new_v4()),
        fail_statements_containing: Some("INSERT INTO order_items".to_string()),
        ..TxBehavior::default()
    });

    let response = app
        .router
        .clone()
        .oneshot(with_session(empty_request("POST", "/api/v1/orders"), Uuid::new_v4()))
        .await
        .expect("infallible");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let tx = last_tx(&app);
    assert_rolled_back_once(&tx);
    let sql = sql_of(&tx);
    assert!(sql.iter().any(|s| s.contains("INSERT INTO orders")));
    assert!(sql.iter().all(|s| !s.starts_with("DELETE FROM carts")));
}

#[tokio::test]
async fn test_order_from_missing_cart_is_400() {
    let app = app_with(TxBehavior::default());

    let response = app
        .router
        .clone()
        .oneshot(with_session(empty_request("POST", "/api/v1/orders"), Uuid::new_v4()))
        .await
        .expect("infallible");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let tx = last_tx(&app);
    assert_rolled_back_once(&tx);
    assert!(sql_of(&tx).iter().all(|s| !s.contains("INSERT INTO orders")));
}

// ============================================================================
// CATALOG
// ============================================================================

fn new_product() -> JsonValue {
    json!({"title": "Blue Mug", "price_cents": 1500, "is_featured": true})
}

#[tokio::test]
async fn test_create_product_commits() {
    let app = app_with(TxBehavior {
        canned_rows: vec![(
            "INSERT INTO products".to_string(),
            vec![json!({
                "id": Uuid::new_v4(),
                "title": "Blue Mug",
                "slug": "blue-mug",
                "description": null,
                "price_cents": 1500,
                "is_digital": false,
                "is_featured": true,
                "category_id": null,
                "created_at": "2026-03-01T12:00:00Z"
            })],
        )],
        ..TxBehavior::default()
    });

    let response = app
        .router
        .clone()
        .oneshot(json_request("POST", "/api/v1/products", SHOP_HOST, &new_product()))
        .await
        .expect("infallible");

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["slug"], "blue-mug");
    assert_committed_once(&last_tx(&app));
}

#[tokio::test]
async fn test_failed_product_insert_rolls_back() {
    let app = app_with(TxBehavior {
        fail_statements_containing: Some("INSERT INTO products".to_string()),
        ..TxBehavior::default()
    });

    let response = app
        .router
        .clone()
        .oneshot(json_request("POST", "/api/v1/products", SHOP_HOST, &new_product()))
        .await
        .expect("infallible");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_rolled_back_once(&last_tx(&app));
}

#[tokio::test]
async fn test_duplicate_product_slug_is_409() {
    let app = app_with(TxBehavior::default());

    let response = app
        .router
        .clone()
        .oneshot(json_request("POST", "/api/v1/products", SHOP_HOST, &new_product()))
        .await
        .expect("infallible");

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "ENTITY_ALREADY_EXISTS");
    assert_rolled_back_once(&last_tx(&app));
}

// ============================================================================
// PLATFORM
// ============================================================================

#[tokio::test]
async fn test_shop_listing_is_platform_only() {
    let app = app_with(TxBehavior {
        canned_rows: vec![(
            "FROM public.shops".to_string(),
            vec![json!({"tenant_id": "shop1", "name": "Shop One"})],
        )],
        ..TxBehavior::default()
    });

    let forbidden = app
        .router
        .clone()
        .oneshot(get_request("/platform/shops", SHOP_HOST))
        .await
        .expect("infallible");
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    let listed = app
        .router
        .clone()
        .oneshot(get_request("/platform/shops", "localhost:3000"))
        .await
        .expect("infallible");
    assert_eq!(listed.status(), StatusCode::OK);
    assert_eq!(
        body_json(listed).await,
        json!({"shops": [{"tenant_id": "shop1", "name": "Shop One"}]})
    );
}
