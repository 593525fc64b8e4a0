//! Page configurations over the tenant's `pages` table.
//!
//! Sections are stored as a JSONB array of `{type, props}` and round-trip
//! untouched, unknown prop keys included.

use async_trait::async_trait;
use shopwright_core::{DbError, DbResult, PageConfig, PageDraft, PageStore, RequestScope, SqlValue};

const PAGE_JSON: &str =
    "jsonb_build_object('id', id, 'route', route, 'title', title, 'sections', sections)";

#[derive(Debug, Clone, Copy, Default)]
pub struct PgPages;

impl PgPages {
    fn find_sql() -> String {
        format!("SELECT {PAGE_JSON} FROM pages WHERE route = $1")
    }

    fn upsert_sql() -> String {
        format!(
            "INSERT INTO pages (route, title, sections) VALUES ($1, $2, $3) \
             ON CONFLICT (route) DO UPDATE \
             SET title = EXCLUDED.title, sections = EXCLUDED.sections, updated_at = now() \
             RETURNING {PAGE_JSON}"
        )
    }
}

#[async_trait]
impl PageStore for PgPages {
    async fn find_by_route(&self, scope: &RequestScope, route: &str) -> DbResult<Option<PageConfig>> {
        scope.query_opt_as(&Self::find_sql(), &[SqlValue::from(route)]).await
    }

    async fn upsert(&self, scope: &RequestScope, draft: PageDraft) -> DbResult<PageConfig> {
        let sections = serde_json::to_value(&draft.sections)
            .map_err(|e| DbError::query(format!("failed to encode sections: {}", e)))?;
        scope
            .query_opt_as(
                &Self::upsert_sql(),
                &[
                    SqlValue::Text(draft.route),
                    SqlValue::Text(draft.title),
                    SqlValue::Json(sections),
                ],
            )
            .await?
            .ok_or_else(|| DbError::query("page upsert returned no row"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shopwright_test_utils::fixtures::storefront_home;
    use shopwright_test_utils::{RecordingTransaction, TenantId, TxBehavior};
    use std::sync::Arc;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_find_decodes_stored_sections() {
        let id = Uuid::new_v4();
        let tx = Arc::new(RecordingTransaction::with_behavior(TxBehavior {
            canned_rows: vec![(
                "FROM pages".to_string(),
                vec![json!({
                    "id": id,
                    "route": "/",
                    "title": "Home",
                    "sections": [{"type": "hero", "props": {"Title": "Hi", "Custom": [1, 2]}}]
                })],
            )],
            ..TxBehavior::default()
        }));
        let scope = RequestScope::new(TenantId::public(), tx);

        let page = PgPages.find_by_route(&scope, "/").await;

        let page = match page {
            Ok(Some(page)) => page,
            other => panic!("unexpected: {:?}", other),
        };
        assert_eq!(page.id, id);
        assert_eq!(page.sections[0].props.get("Custom"), Some(&json!([1, 2])));
    }

    #[tokio::test]
    async fn test_upsert_binds_sections_as_json() {
        let (scope, tx) = shopwright_test_utils::scope_with_tx("shop1");
        let draft = storefront_home();
        let expected = serde_json::to_value(&draft.sections).unwrap_or_default();

        // The recording transaction returns no rows.
        let result = PgPages.upsert(&scope, draft).await;

        assert!(result.is_err());
        let params = &tx.statements()[0].params;
        assert_eq!(params[0], SqlValue::from("/"));
        assert_eq!(params[2], SqlValue::Json(expected));
    }
}
