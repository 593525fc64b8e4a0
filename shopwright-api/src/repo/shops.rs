//! Shop directory and provisioning.
//!
//! Runs from the `public` tenant's transaction: registers the shop in
//! `public.shops`, creates its schema and storefront tables, then leaves the
//! search path on the new schema so the caller can seed it.

use crate::tenancy::schema::{apply_search_path, run_statements, shop_schema_statements};
use serde::{Deserialize, Serialize};
use shopwright_core::{DbResult, RequestScope, SqlValue, TenantExecutor, TenantId};
use tracing::info;

pub(crate) const REGISTER_SHOP_SQL: &str = "\
    INSERT INTO public.shops (tenant_id, name) VALUES ($1, $2) \
    ON CONFLICT (tenant_id) DO NOTHING";

pub(crate) const LIST_SHOPS_SQL: &str = "\
    SELECT jsonb_build_object('tenant_id', tenant_id, 'name', name) \
    FROM public.shops ORDER BY tenant_id";

/// A provisioned shop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shop {
    pub tenant_id: TenantId,
    pub name: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PgShops;

impl PgShops {
    /// Every registered shop, by tenant id.
    pub async fn list(&self, scope: &RequestScope) -> DbResult<Vec<Shop>> {
        scope.query_as(LIST_SHOPS_SQL, &[]).await
    }

    /// Register and provision a shop.
    ///
    /// Returns `None` when the tenant id is already taken; nothing is created
    /// in that case.
    pub async fn provision(&self, scope: &RequestScope, tenant: &TenantId, name: &str) -> DbResult<Option<Shop>> {
        let inserted = scope
            .execute(
                REGISTER_SHOP_SQL,
                &[SqlValue::from(tenant.as_str()), SqlValue::from(name)],
            )
            .await?;
        if inserted == 0 {
            return Ok(None);
        }

        run_statements(scope, &shop_schema_statements(tenant)).await?;
        apply_search_path(scope, tenant).await?;
        info!(tenant_id = %tenant, "Shop schema provisioned");

        Ok(Some(Shop {
            tenant_id: tenant.clone(),
            name: name.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopwright_test_utils::assertions::assert_search_path_safe;
    use shopwright_test_utils::scope_with_tx;

    #[tokio::test]
    async fn test_provision_registers_then_creates_schema() {
        let (scope, tx) = scope_with_tx("public");
        let tenant = TenantId::parse("shop7").unwrap_or_else(|_| TenantId::public());

        let shop = PgShops.provision(&scope, &tenant, "Shop Seven").await;

        assert!(matches!(shop, Ok(Some(ref s)) if s.tenant_id == tenant));
        let sql: Vec<String> = tx.statements().into_iter().map(|s| s.sql).collect();
        assert_eq!(sql[0], REGISTER_SHOP_SQL);
        assert_eq!(sql[1], "CREATE SCHEMA IF NOT EXISTS \"shop7\"");
        assert!(sql.last().is_some_and(|s| s.contains("search_path")));
        assert_search_path_safe(&tx);
    }

    #[tokio::test]
    async fn test_list_decodes_shops() {
        let tx = std::sync::Arc::new(shopwright_test_utils::RecordingTransaction::with_behavior(
            shopwright_test_utils::TxBehavior {
                canned_rows: vec![(
                    "FROM public.shops".to_string(),
                    vec![serde_json::json!({"tenant_id": "shop1", "name": "Shop One"})],
                )],
                ..Default::default()
            },
        ));
        let scope = RequestScope::new(TenantId::public(), tx);

        let shops = PgShops.list(&scope).await;

        assert_eq!(shops.map(|s| s.len()), Ok(1));
    }
}
