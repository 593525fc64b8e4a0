//! Cart REST API Routes
//!
//! Carts are keyed by the `session_id` cookie. Adding an item without a
//! session starts one and sets the cookie on the response; every other cart
//! route needs an existing session.

use axum::{
    extract::{Path, State},
    http::{header::SET_COOKIE, HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use shopwright_core::{CartSnapshot, RequestScope};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult, ErrorCode},
    repo::PgCarts,
    state::AppState,
    tenancy::SESSION_COOKIE,
};

/// Largest quantity accepted in one add or update.
pub const MAX_QUANTITY: i32 = 99;

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddItemRequest {
    pub product_id: Uuid,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartResponse {
    #[serde(flatten)]
    pub cart: CartSnapshot,
    pub subtotal_cents: i64,
}

impl From<CartSnapshot> for CartResponse {
    fn from(cart: CartSnapshot) -> Self {
        Self {
            subtotal_cents: cart.subtotal_cents(),
            cart,
        }
    }
}

fn check_quantity(quantity: i32) -> ApiResult<()> {
    if (1..=MAX_QUANTITY).contains(&quantity) {
        Ok(())
    } else {
        Err(ApiError::invalid_input(format!(
            "quantity must be between 1 and {}",
            MAX_QUANTITY
        )))
    }
}

pub(crate) fn require_session(scope: &RequestScope) -> ApiResult<&str> {
    scope
        .session_id()
        .ok_or_else(|| ApiError::new(ErrorCode::MissingField, "A session_id cookie is required"))
}

fn session_cookie_value(session_id: &str) -> ApiResult<HeaderValue> {
    HeaderValue::from_str(&format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        SESSION_COOKIE, session_id
    ))
    .map_err(|e| ApiError::internal_error(format!("Invalid session cookie: {}", e)))
}

fn line_not_found(product_id: Uuid) -> ApiError {
    ApiError::entity_not_found("Cart item for product", product_id)
}

/// GET /api/v1/cart - The session's cart
pub async fn get_cart(
    State(carts): State<PgCarts>,
    Extension(scope): Extension<RequestScope>,
) -> ApiResult<Json<CartResponse>> {
    let session_id = require_session(&scope)?;
    let cart = carts
        .find_cart(&scope, session_id)
        .await?
        .ok_or_else(|| ApiError::new(ErrorCode::EntityNotFound, "No cart for this session"))?;
    Ok(Json(cart.into()))
}

/// POST /api/v1/cart/items - Add a product, starting a session if needed
pub async fn add_item(
    State(carts): State<PgCarts>,
    Extension(scope): Extension<RequestScope>,
    Json(request): Json<AddItemRequest>,
) -> ApiResult<Response> {
    check_quantity(request.quantity)?;
    let (session_id, issued) = match scope.session_id() {
        Some(session_id) => (session_id.to_string(), false),
        None => (Uuid::new_v4().to_string(), true),
    };

    let cart = carts
        .add_item(&scope, &session_id, request.product_id, request.quantity)
        .await?
        .ok_or_else(|| ApiError::entity_not_found("Product", request.product_id))?;

    let mut response = Json(CartResponse::from(cart)).into_response();
    if issued {
        response
            .headers_mut()
            .insert(SET_COOKIE, session_cookie_value(&session_id)?);
    }
    Ok(response)
}

/// PUT /api/v1/cart/items/:product_id - Replace a line's quantity
pub async fn update_item(
    State(carts): State<PgCarts>,
    Extension(scope): Extension<RequestScope>,
    Path(product_id): Path<Uuid>,
    Json(request): Json<UpdateItemRequest>,
) -> ApiResult<Json<CartResponse>> {
    check_quantity(request.quantity)?;
    let session_id = require_session(&scope)?;
    let cart = carts
        .set_quantity(&scope, session_id, product_id, request.quantity)
        .await?
        .ok_or_else(|| line_not_found(product_id))?;
    Ok(Json(cart.into()))
}

/// DELETE /api/v1/cart/items/:product_id - Drop a line
pub async fn remove_item(
    State(carts): State<PgCarts>,
    Extension(scope): Extension<RequestScope>,
    Path(product_id): Path<Uuid>,
) -> ApiResult<Json<CartResponse>> {
    let session_id = require_session(&scope)?;
    let cart = carts
        .remove_item(&scope, session_id, product_id)
        .await?
        .ok_or_else(|| line_not_found(product_id))?;
    Ok(Json(cart.into()))
}

/// Create the cart router.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_cart))
        .route("/items", post(add_item))
        .route("/items/:product_id", put(update_item).delete(remove_item))
}
