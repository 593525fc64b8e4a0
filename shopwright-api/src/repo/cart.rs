//! Session carts over the tenant's `carts` and `cart_items` tables.
//!
//! A cart belongs to one browser session. Reads go through [`CartSource`] so
//! the checkout widget can be tested without SQL; the storefront cart routes
//! call the write methods on [`PgCarts`] directly.

use async_trait::async_trait;
use serde::Deserialize;
use shopwright_core::{
    CartItem, CartSnapshot, CartSource, DbError, DbResult, RequestScope, SqlValue, TenantExecutor,
};
use uuid::Uuid;

/// Get-or-create by session.
pub(crate) const UPSERT_CART_SQL: &str = "\
    INSERT INTO carts (session_id) VALUES ($1) \
    ON CONFLICT (session_id) DO UPDATE SET session_id = EXCLUDED.session_id \
    RETURNING jsonb_build_object('cart_id', id, 'session_id', session_id)";

pub(crate) const FIND_CART_SQL: &str = "\
    SELECT jsonb_build_object('cart_id', id, 'session_id', session_id) \
    FROM carts WHERE session_id = $1";

pub(crate) const CART_ITEMS_SQL: &str = "\
    SELECT jsonb_build_object(\
        'product_id', p.id, 'title', p.title, 'quantity', ci.quantity, \
        'unit_price_cents', p.price_cents, 'is_digital', p.is_digital) \
    FROM cart_items ci JOIN products p ON p.id = ci.product_id \
    WHERE ci.cart_id = $1 \
    ORDER BY p.title";

/// Inserts nothing when the product does not exist. Adding a product already
/// in the cart adds to its quantity.
pub(crate) const ADD_ITEM_SQL: &str = "\
    INSERT INTO cart_items (cart_id, product_id, quantity) \
    SELECT $1::uuid, p.id, $3::bigint FROM products p WHERE p.id = $2 \
    ON CONFLICT (cart_id, product_id) DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity";

pub(crate) const SET_QUANTITY_SQL: &str = "\
    UPDATE cart_items SET quantity = $3::bigint WHERE cart_id = $1 AND product_id = $2";

pub(crate) const REMOVE_ITEM_SQL: &str = "\
    DELETE FROM cart_items WHERE cart_id = $1 AND product_id = $2";

/// Items go with the cart (`ON DELETE CASCADE`).
pub(crate) const DELETE_CART_SQL: &str = "DELETE FROM carts WHERE id = $1";

#[derive(Debug, Deserialize)]
struct CartHeader {
    cart_id: Uuid,
    session_id: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PgCarts;

impl PgCarts {
    async fn upsert_header(&self, scope: &RequestScope, session_id: &str) -> DbResult<CartHeader> {
        scope
            .query_opt_as(UPSERT_CART_SQL, &[SqlValue::from(session_id)])
            .await?
            .ok_or_else(|| DbError::query("cart upsert returned no row"))
    }

    async fn snapshot(&self, scope: &RequestScope, header: CartHeader) -> DbResult<CartSnapshot> {
        let items: Vec<CartItem> = scope
            .query_as(CART_ITEMS_SQL, &[SqlValue::Uuid(header.cart_id)])
            .await?;
        Ok(CartSnapshot {
            cart_id: header.cart_id,
            session_id: header.session_id,
            items,
        })
    }

    /// The session's cart, without creating one.
    pub async fn find_cart(&self, scope: &RequestScope, session_id: &str) -> DbResult<Option<CartSnapshot>> {
        let header: Option<CartHeader> = scope
            .query_opt_as(FIND_CART_SQL, &[SqlValue::from(session_id)])
            .await?;
        match header {
            Some(header) => Ok(Some(self.snapshot(scope, header).await?)),
            None => Ok(None),
        }
    }

    /// Add `quantity` of a product, creating the cart on first use.
    ///
    /// Returns `None` when the product is not in the catalog.
    pub async fn add_item(
        &self,
        scope: &RequestScope,
        session_id: &str,
        product_id: Uuid,
        quantity: i32,
    ) -> DbResult<Option<CartSnapshot>> {
        let header = self.upsert_header(scope, session_id).await?;
        let inserted = scope
            .execute(
                ADD_ITEM_SQL,
                &[
                    SqlValue::Uuid(header.cart_id),
                    SqlValue::Uuid(product_id),
                    SqlValue::Int(i64::from(quantity)),
                ],
            )
            .await?;
        if inserted == 0 {
            return Ok(None);
        }
        Ok(Some(self.snapshot(scope, header).await?))
    }

    /// Replace a line's quantity. `None` when the session has no cart or the
    /// cart has no line for the product.
    pub async fn set_quantity(
        &self,
        scope: &RequestScope,
        session_id: &str,
        product_id: Uuid,
        quantity: i32,
    ) -> DbResult<Option<CartSnapshot>> {
        self.change_line(
            scope,
            session_id,
            SET_QUANTITY_SQL,
            vec![SqlValue::Uuid(product_id), SqlValue::Int(i64::from(quantity))],
        )
        .await
    }

    /// Drop a line. `None` when there was nothing to remove.
    pub async fn remove_item(
        &self,
        scope: &RequestScope,
        session_id: &str,
        product_id: Uuid,
    ) -> DbResult<Option<CartSnapshot>> {
        self.change_line(scope, session_id, REMOVE_ITEM_SQL, vec![SqlValue::Uuid(product_id)])
            .await
    }

    /// Run a line statement whose `$1` is the cart id.
    async fn change_line(
        &self,
        scope: &RequestScope,
        session_id: &str,
        sql: &str,
        rest: Vec<SqlValue>,
    ) -> DbResult<Option<CartSnapshot>> {
        let header: Option<CartHeader> = scope
            .query_opt_as(FIND_CART_SQL, &[SqlValue::from(session_id)])
            .await?;
        let Some(header) = header else {
            return Ok(None);
        };

        let mut params = vec![SqlValue::Uuid(header.cart_id)];
        params.extend(rest);
        if scope.execute(sql, &params).await? == 0 {
            return Ok(None);
        }
        Ok(Some(self.snapshot(scope, header).await?))
    }

    pub async fn delete(&self, scope: &RequestScope, cart_id: Uuid) -> DbResult<()> {
        scope.execute(DELETE_CART_SQL, &[SqlValue::Uuid(cart_id)]).await?;
        Ok(())
    }
}

#[async_trait]
impl CartSource for PgCarts {
    async fn cart_for_session(&self, scope: &RequestScope, session_id: &str) -> DbResult<CartSnapshot> {
        let header = self.upsert_header(scope, session_id).await?;
        self.snapshot(scope, header).await
    }
}
