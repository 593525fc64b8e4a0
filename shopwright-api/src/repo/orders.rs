//! Orders placed from a session's cart.
//!
//! Placing an order writes the order, one row per line, then deletes the
//! cart. All of it runs on the request transaction, so a failure at any step
//! leaves the cart as it was.

use crate::repo::PgCarts;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use shopwright_core::{
    DbError, DbResult, Order, OrderLine, RequestScope, SqlValue, TenantExecutor, ORDER_PENDING,
    PAYMENT_UNPAID,
};
use tracing::info;
use uuid::Uuid;

pub(crate) const INSERT_ORDER_SQL: &str = "\
    INSERT INTO orders (session_id, status, payment_status, total_cents) \
    VALUES ($1, $2, $3, $4) \
    RETURNING jsonb_build_object('id', id, 'created_at', created_at)";

pub(crate) const INSERT_ORDER_LINE_SQL: &str = "\
    INSERT INTO order_items (order_id, product_id, title, quantity, unit_price_cents) \
    VALUES ($1, $2, $3, $4::bigint, $5)";

#[derive(Debug, Deserialize)]
struct OrderHeader {
    id: Uuid,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PgOrders;

impl PgOrders {
    /// Turn the session's cart into a pending, unpaid order.
    ///
    /// Returns `None` when the session has no cart or the cart is empty.
    pub async fn place_from_cart(&self, scope: &RequestScope, session_id: &str) -> DbResult<Option<Order>> {
        let Some(cart) = PgCarts.find_cart(scope, session_id).await? else {
            return Ok(None);
        };
        if cart.items.is_empty() {
            return Ok(None);
        }

        let total_cents = cart.subtotal_cents();
        let header: OrderHeader = scope
            .query_opt_as(
                INSERT_ORDER_SQL,
                &[
                    SqlValue::from(session_id),
                    SqlValue::from(ORDER_PENDING),
                    SqlValue::from(PAYMENT_UNPAID),
                    SqlValue::Int(total_cents),
                ],
            )
            .await?
            .ok_or_else(|| DbError::query("order insert returned no row"))?;

        let items: Vec<OrderLine> = cart.items.iter().map(OrderLine::from).collect();
        for line in &items {
            scope
                .execute(
                    INSERT_ORDER_LINE_SQL,
                    &[
                        SqlValue::Uuid(header.id),
                        SqlValue::Uuid(line.product_id),
                        SqlValue::from(line.title.as_str()),
                        SqlValue::Int(i64::from(line.quantity)),
                        SqlValue::Int(line.unit_price_cents),
                    ],
                )
                .await?;
        }
        PgCarts.delete(scope, cart.cart_id).await?;

        info!(
            tenant_id = %scope.tenant_id(),
            order_id = %header.id,
            lines = items.len(),
            total_cents,
            "Order placed"
        );
        Ok(Some(Order {
            id: header.id,
            session_id: session_id.to_string(),
            status: ORDER_PENDING.to_string(),
            payment_status: PAYMENT_UNPAID.to_string(),
            total_cents,
            items,
            created_at: header.created_at,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::cart::DELETE_CART_SQL;
    use serde_json::json;
    use shopwright_test_utils::{scope_with_tx, RecordingTransaction, TenantId, TxBehavior};
    use std::sync::Arc;

    fn checkout_rows(cart_id: Uuid, order_id: Uuid) -> Vec<(String, Vec<serde_json::Value>)> {
        vec![
            (
                "FROM carts WHERE".to_string(),
                vec![json!({"cart_id": cart_id, "session_id": "s1"})],
            ),
            (
                "FROM cart_items".to_string(),
                vec![
                    json!({"product_id": Uuid::new_v4(), "title": "Mug", "quantity": 2,
                           "unit_price_cents": 1500, "is_digital": false}),
                    json!({"product_id": Uuid::new_v4(), "title": "Poster", "quantity": 1,
                           "unit_price_cents": 999, "is_digital": true}),
                ],
            ),
            (
                "INSERT INTO orders".to_string(),
                vec![json!({"id": order_id, "created_at": "2026-01-01T00:00:00Z"})],
            ),
        ]
    }

    #[tokio::test]
    async fn test_order_copies_lines_then_deletes_cart() {
        let cart_id = Uuid::new_v4();
        let order_id = Uuid::new_v4();
        let tx = Arc::new(RecordingTransaction::with_behavior(TxBehavior {
            canned_rows: checkout_rows(cart_id, order_id),
            ..TxBehavior::default()
        }));
        let scope = RequestScope::new(TenantId::public(), tx.clone());

        let order = match PgOrders.place_from_cart(&scope, "s1").await {
            Ok(Some(order)) => order,
            other => panic!("expected an order, got {:?}", other),
        };

        assert_eq!(order.id, order_id);
        assert_eq!(order.total_cents, 3999);
        assert_eq!(order.status, "pending");
        assert_eq!(order.items.len(), 2);

        let sql: Vec<String> = tx.statements().into_iter().map(|s| s.sql).collect();
        assert_eq!(sql.iter().filter(|s| s.as_str() == INSERT_ORDER_LINE_SQL).count(), 2);
        assert_eq!(sql.last().map(String::as_str), Some(DELETE_CART_SQL));
    }

    #[tokio::test]
    async fn test_failed_line_stops_before_cart_delete() {
        let tx = Arc::new(RecordingTransaction::with_behavior(TxBehavior {
            canned_rows: checkout_rows(Uuid::new_v4(), Uuid::new_v4()),
            fail_statements_containing: Some("INSERT INTO order_items".to_string()),
            ..TxBehavior::default()
        }));
        let scope = RequestScope::new(TenantId::public(), tx.clone());

        let order = PgOrders.place_from_cart(&scope, "s1").await;

        assert!(matches!(order, Err(DbError::QueryFailed { .. })));
        assert!(tx.statements().iter().all(|s| s.sql != DELETE_CART_SQL));
    }

    #[tokio::test]
    async fn test_no_cart_places_nothing() {
        let (scope, tx) = scope_with_tx("shop1");
        assert_eq!(PgOrders.place_from_cart(&scope, "s1").await, Ok(None));
        assert_eq!(tx.statements().len(), 1);
    }
}
