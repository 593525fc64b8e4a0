//! Product listings and creation over the tenant's `products` table.

use async_trait::async_trait;
use shopwright_core::{DbResult, NewProduct, Product, ProductCatalog, ProductQuery, RequestScope, SqlValue};
use tracing::info;

/// `$1` is the filter name, `$2` the limit.
pub(crate) const LIST_PRODUCTS_SQL: &str = "\
    SELECT to_jsonb(p) FROM (\
        SELECT id, title, slug, description, price_cents, is_digital, is_featured, \
               category_id, created_at \
        FROM products \
        WHERE ($1::text <> 'featured' OR is_featured) \
        ORDER BY CASE WHEN $1::text = 'new_arrivals' THEN created_at END DESC NULLS LAST, \
                 title \
        LIMIT $2\
    ) p";

/// Returns no row when the slug is taken.
pub(crate) const INSERT_PRODUCT_SQL: &str = "\
    INSERT INTO products (title, slug, description, price_cents, is_digital, is_featured, category_id) \
    VALUES ($1, $2, $3, $4, $5, $6, $7) \
    ON CONFLICT (slug) DO NOTHING \
    RETURNING to_jsonb(products)";

/// Catalog backed by the request transaction. Unqualified table names
/// resolve through the tenant's search path.
#[derive(Debug, Clone, Copy, Default)]
pub struct PgCatalog;

impl PgCatalog {
    /// Insert a product under its title's slug. `None` when a product with
    /// that slug already exists.
    pub async fn create_product(&self, scope: &RequestScope, product: NewProduct) -> DbResult<Option<Product>> {
        let slug = product.slug();
        let created: Option<Product> = scope
            .query_opt_as(
                INSERT_PRODUCT_SQL,
                &[
                    SqlValue::from(product.title),
                    SqlValue::from(slug.as_str()),
                    SqlValue::OptText(product.description),
                    SqlValue::Int(product.price_cents),
                    SqlValue::Bool(product.is_digital),
                    SqlValue::Bool(product.is_featured),
                    SqlValue::OptUuid(product.category_id),
                ],
            )
            .await?;
        if let Some(created) = &created {
            info!(tenant_id = %scope.tenant_id(), product_id = %created.id, %slug, "Product created");
        }
        Ok(created)
    }
}

#[async_trait]
impl ProductCatalog for PgCatalog {
    async fn list_products(&self, scope: &RequestScope, query: ProductQuery) -> DbResult<Vec<Product>> {
        scope
            .query_as(
                LIST_PRODUCTS_SQL,
                &[
                    SqlValue::from(query.filter.as_str()),
                    SqlValue::Int(i64::try_from(query.limit).unwrap_or(i64::MAX)),
                ],
            )
            .await
    }
}
