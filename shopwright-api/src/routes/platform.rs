//! Platform REST API Routes
//!
//! Shop directory and provisioning. Only reachable from the platform's own
//! host (the `public` tenant); a shop host cannot see or create other shops.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use shopwright_core::{RequestScope, TenantId};
use shopwright_pages::PageService;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    repo::{PgShops, Shop},
    tenancy::apply_search_path,
};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateShopRequest {
    pub tenant_id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateShopResponse {
    pub tenant_id: TenantId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_page_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListShopsResponse {
    pub shops: Vec<Shop>,
}

fn require_platform(scope: &RequestScope) -> ApiResult<()> {
    if scope.tenant_id().is_public() {
        Ok(())
    } else {
        Err(ApiError::forbidden("Shops are only managed from the platform host"))
    }
}

/// GET /platform/shops - List registered shops
pub async fn list_shops(
    State(shops): State<PgShops>,
    Extension(scope): Extension<RequestScope>,
) -> ApiResult<Json<ListShopsResponse>> {
    require_platform(&scope)?;
    Ok(Json(ListShopsResponse {
        shops: shops.list(&scope).await?,
    }))
}

/// POST /platform/shops - Provision a shop schema and seed its home page
pub async fn create_shop(
    State(shops): State<PgShops>,
    State(pages): State<PageService>,
    Extension(scope): Extension<RequestScope>,
    Json(request): Json<CreateShopRequest>,
) -> ApiResult<impl IntoResponse> {
    require_platform(&scope)?;
    let name = request.name.trim();
    if name.is_empty() {
        return Err(ApiError::missing_field("name"));
    }
    let tenant = TenantId::parse(&request.tenant_id)?;
    if tenant.is_public() {
        return Err(ApiError::invalid_input("tenant_id 'public' is reserved"));
    }

    let shop = shops
        .provision(&scope, &tenant, name)
        .await?
        .ok_or_else(|| ApiError::entity_already_exists("Shop", &tenant))?;

    // Provisioning left the search path on the new schema.
    let shop_scope = scope.rebind(tenant);
    let home = pages.seed_defaults(&shop_scope).await?;
    apply_search_path(&scope, scope.tenant_id()).await?;

    tracing::info!(tenant_id = %shop.tenant_id, "Shop created");
    Ok((
        StatusCode::CREATED,
        Json(CreateShopResponse {
            tenant_id: shop.tenant_id,
            name: shop.name,
            home_page_id: home.map(|page| page.id),
        }),
    ))
}
