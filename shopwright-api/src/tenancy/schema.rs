//! Schema statements.
//!
//! The only module that turns a [`TenantId`] into SQL. The per-request search
//! path is set through a bound parameter; DDL cannot take parameters, so shop
//! provisioning interpolates [`TenantId::quoted_identifier`] and nothing else.

use shopwright_core::{DbResult, SqlValue, TenantExecutor, TenantId, TransactionSource};
use std::time::Duration;
use tracing::{debug, info};

/// Transaction-local search path. `$1` is `"tenant", public`.
pub const SET_SEARCH_PATH_SQL: &str = "SELECT set_config('search_path', $1, true)";

/// Transaction-local statement timeout. `$1` is e.g. `5000ms`.
pub const SET_STATEMENT_TIMEOUT_SQL: &str = "SELECT set_config('statement_timeout', $1, true)";

/// Point the transaction at the tenant's schema, then `public`.
pub async fn apply_search_path<E>(executor: &E, tenant: &TenantId) -> DbResult<()>
where
    E: TenantExecutor + ?Sized,
{
    executor
        .execute(SET_SEARCH_PATH_SQL, &[SqlValue::Text(tenant.search_path())])
        .await?;
    debug!(tenant_id = %tenant, "Search path set");
    Ok(())
}

/// Bound every statement in the transaction.
pub async fn apply_statement_timeout<E>(executor: &E, timeout: Duration) -> DbResult<()>
where
    E: TenantExecutor + ?Sized,
{
    executor
        .execute(
            SET_STATEMENT_TIMEOUT_SQL,
            &[SqlValue::Text(format!("{}ms", timeout.as_millis()))],
        )
        .await?;
    Ok(())
}

/// Storefront tables, created in the schema named by `schema`.
fn storefront_tables(schema: &str) -> Vec<String> {
    vec![
        format!(
            "CREATE TABLE IF NOT EXISTS {schema}.categories (\
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(), \
                name TEXT NOT NULL, \
                slug TEXT NOT NULL UNIQUE)"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS {schema}.products (\
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(), \
                title TEXT NOT NULL, \
                slug TEXT NOT NULL UNIQUE, \
                description TEXT, \
                price_cents BIGINT NOT NULL DEFAULT 0 CHECK (price_cents >= 0), \
                is_digital BOOLEAN NOT NULL DEFAULT false, \
                is_featured BOOLEAN NOT NULL DEFAULT false, \
                category_id UUID REFERENCES {schema}.categories(id), \
                created_at TIMESTAMPTZ NOT NULL DEFAULT now())"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS {schema}.carts (\
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(), \
                session_id TEXT NOT NULL UNIQUE, \
                created_at TIMESTAMPTZ NOT NULL DEFAULT now())"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS {schema}.cart_items (\
                cart_id UUID NOT NULL REFERENCES {schema}.carts(id) ON DELETE CASCADE, \
                product_id UUID NOT NULL REFERENCES {schema}.products(id), \
                quantity INT NOT NULL CHECK (quantity > 0), \
                PRIMARY KEY (cart_id, product_id))"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS {schema}.orders (\
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(), \
                session_id TEXT NOT NULL, \
                status TEXT NOT NULL DEFAULT 'pending', \
                payment_status TEXT NOT NULL DEFAULT 'unpaid', \
                total_cents BIGINT NOT NULL CHECK (total_cents >= 0), \
                created_at TIMESTAMPTZ NOT NULL DEFAULT now())"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS {schema}.order_items (\
                order_id UUID NOT NULL REFERENCES {schema}.orders(id) ON DELETE CASCADE, \
                product_id UUID NOT NULL REFERENCES {schema}.products(id), \
                title TEXT NOT NULL, \
                quantity INT NOT NULL CHECK (quantity > 0), \
                unit_price_cents BIGINT NOT NULL, \
                PRIMARY KEY (order_id, product_id))"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS {schema}.pages (\
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(), \
                route TEXT NOT NULL UNIQUE, \
                title TEXT NOT NULL, \
                sections JSONB NOT NULL DEFAULT '[]'::jsonb, \
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now())"
        ),
    ]
}

/// DDL for a new shop: its schema and storefront tables.
pub fn shop_schema_statements(tenant: &TenantId) -> Vec<String> {
    let schema = tenant.quoted_identifier();
    let mut statements = vec![format!("CREATE SCHEMA IF NOT EXISTS {schema}")];
    statements.extend(storefront_tables(&schema));
    statements
}

/// DDL for the platform itself: the shop directory plus storefront tables in
/// `public`, which serves unmatched hosts.
pub fn platform_schema_statements() -> Vec<String> {
    let schema = TenantId::public().quoted_identifier();
    let mut statements = vec![format!(
        "CREATE TABLE IF NOT EXISTS {schema}.shops (\
            tenant_id TEXT PRIMARY KEY CHECK (tenant_id ~ '^[a-z0-9_]+$'), \
            name TEXT NOT NULL, \
            created_at TIMESTAMPTZ NOT NULL DEFAULT now())"
    )];
    statements.extend(storefront_tables(&schema));
    statements
}

/// Run DDL statements in order.
pub async fn run_statements<E>(executor: &E, statements: &[String]) -> DbResult<()>
where
    E: TenantExecutor + ?Sized,
{
    for statement in statements {
        executor.execute(statement, &[]).await?;
    }
    Ok(())
}

/// Create the platform tables in one transaction at startup.
pub async fn bootstrap_platform_schema(source: &dyn TransactionSource) -> DbResult<()> {
    let tx = source.begin().await?;
    let statements = platform_schema_statements();
    if let Err(e) = run_statements(tx.as_ref(), &statements).await {
        tx.rollback().await?;
        return Err(e);
    }
    tx.commit().await?;
    info!(statements = statements.len(), "Platform schema ready");
    Ok(())
}
