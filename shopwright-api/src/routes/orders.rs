//! Order REST API Routes

use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use shopwright_core::RequestScope;

use crate::{
    error::{ApiError, ApiResult},
    repo::PgOrders,
    routes::cart::require_session,
};

/// POST /api/v1/orders - Place an order from the session's cart
pub async fn place_order(
    State(orders): State<PgOrders>,
    Extension(scope): Extension<RequestScope>,
) -> ApiResult<impl IntoResponse> {
    let session_id = require_session(&scope)?;
    let order = orders
        .place_from_cart(&scope, session_id)
        .await?
        .ok_or_else(|| ApiError::invalid_input("Cart is empty"))?;
    Ok((StatusCode::CREATED, Json(order)))
}
