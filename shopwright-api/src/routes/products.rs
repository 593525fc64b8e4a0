//! Product REST API Routes

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use shopwright_core::{NewProduct, Product, ProductCatalog, ProductFilter, ProductQuery, RequestScope};

use crate::error::{ApiError, ApiResult};
use crate::repo::PgCatalog;

pub const DEFAULT_LIMIT: usize = 20;
pub const MAX_LIMIT: usize = 100;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListProductsQuery {
    /// `featured`, `new_arrivals`, anything else lists all.
    pub filter: Option<String>,
    pub limit: Option<i64>,
}

impl ListProductsQuery {
    fn to_query(&self) -> ApiResult<ProductQuery> {
        let limit = match self.limit {
            None => DEFAULT_LIMIT,
            Some(n) if (1..=MAX_LIMIT as i64).contains(&n) => n as usize,
            Some(_) => {
                return Err(ApiError::invalid_input(format!(
                    "limit must be between 1 and {}",
                    MAX_LIMIT
                )))
            }
        };
        Ok(ProductQuery::new(
            ProductFilter::from_prop(self.filter.as_deref()),
            limit,
        ))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ListProductsResponse {
    pub products: Vec<Product>,
    pub filter: ProductFilter,
}

/// GET /api/v1/products?filter=&limit= - List catalog products
pub async fn list_products(
    State(catalog): State<Arc<dyn ProductCatalog>>,
    Extension(scope): Extension<RequestScope>,
    Query(params): Query<ListProductsQuery>,
) -> ApiResult<impl IntoResponse> {
    let query = params.to_query()?;
    let mut products = catalog.list_products(&scope, query).await?;
    products.truncate(query.limit);
    Ok(Json(ListProductsResponse {
        products,
        filter: query.filter,
    }))
}

fn check_new_product(product: &mut NewProduct) -> ApiResult<()> {
    product.title = product.title.trim().to_string();
    if product.title.is_empty() {
        return Err(ApiError::missing_field("title"));
    }
    if product.slug().is_empty() {
        return Err(ApiError::invalid_format("title", "at least one letter or digit"));
    }
    if product.price_cents < 0 {
        return Err(ApiError::invalid_input("price_cents must not be negative"));
    }
    Ok(())
}

/// POST /api/v1/products - Add a product to the catalog
pub async fn create_product(
    State(products): State<PgCatalog>,
    Extension(scope): Extension<RequestScope>,
    Json(mut request): Json<NewProduct>,
) -> ApiResult<impl IntoResponse> {
    check_new_product(&mut request)?;
    let slug = request.slug();
    let product = products
        .create_product(&scope, request)
        .await?
        .ok_or_else(|| ApiError::entity_already_exists("Product", &slug))?;
    Ok((StatusCode::CREATED, Json(product)))
}
