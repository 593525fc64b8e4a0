//! Page REST API Routes
//!
//! Render, save, validate and seed pages for the tenant resolved from the
//! host. Every handler runs inside the request transaction.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use shopwright_core::{PageConfig, PageDraft, RequestScope, Section};
use shopwright_pages::{PageService, HOME_ROUTE};

use crate::{error::ApiResult, state::AppState};

// ============================================================================
// REQUEST / RESPONSE TYPES
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct PageQuery {
    /// Defaults to the home page.
    pub route: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidatePageRequest {
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatePageResponse {
    pub valid: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedResponse {
    pub created: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<PageConfig>,
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /api/v1/pages?route=/ - Resolve and render a page
pub async fn get_page(
    State(pages): State<PageService>,
    Extension(scope): Extension<RequestScope>,
    Query(query): Query<PageQuery>,
) -> ApiResult<impl IntoResponse> {
    let route = query.route.unwrap_or_else(|| HOME_ROUTE.to_string());
    let page = pages.render_page(&scope, &route).await?;
    Ok(Json(page))
}

/// PUT /api/v1/pages - Validate and save a page
pub async fn save_page(
    State(pages): State<PageService>,
    Extension(scope): Extension<RequestScope>,
    Json(draft): Json<PageDraft>,
) -> ApiResult<impl IntoResponse> {
    let page = pages.save_page(&scope, draft).await?;
    Ok(Json(page))
}

/// POST /api/v1/pages/validate - Validate a section tree without saving
pub async fn validate_page(
    State(pages): State<PageService>,
    Json(request): Json<ValidatePageRequest>,
) -> ApiResult<impl IntoResponse> {
    pages.validate(&request.sections)?;
    Ok(Json(ValidatePageResponse { valid: true }))
}

/// POST /api/v1/pages/seed - Create the default home page if missing
pub async fn seed_pages(
    State(pages): State<PageService>,
    Extension(scope): Extension<RequestScope>,
) -> ApiResult<impl IntoResponse> {
    let page = pages.seed_defaults(&scope).await?;
    let status = if page.is_some() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(SeedResponse {
            created: page.is_some(),
            page,
        }),
    ))
}

// ============================================================================
// ROUTER SETUP
// ============================================================================

/// Create the page routes router.
pub fn create_router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", get(get_page).put(save_page))
        .route("/validate", post(validate_page))
        .route("/seed", post(seed_pages))
}
