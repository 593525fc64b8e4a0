//! Component catalog route: every registered component with its variants
//! and prop schemas, for page editors.

use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use shopwright_pages::ComponentRegistry;

/// GET /api/v1/components - Registered component schemas
pub async fn list_components(State(registry): State<Arc<ComponentRegistry>>) -> impl IntoResponse {
    Json(registry.schema())
}
