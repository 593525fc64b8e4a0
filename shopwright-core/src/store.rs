//! Collaborator Traits
//!
//! Data sources the page engine consumes. Every call runs inside the
//! request's tenant transaction, passed in as a [`RequestScope`].

use crate::catalog::{CartSnapshot, Product, ProductQuery};
use crate::error::DbResult;
use crate::page::{PageConfig, PageDraft};
use crate::scope::RequestScope;
use async_trait::async_trait;

/// Product listings for the current tenant.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn list_products(&self, scope: &RequestScope, query: ProductQuery) -> DbResult<Vec<Product>>;
}

/// Carts keyed by browser session.
#[async_trait]
pub trait CartSource: Send + Sync {
    /// Fetch the session's cart, creating an empty one when none exists.
    async fn cart_for_session(&self, scope: &RequestScope, session_id: &str) -> DbResult<CartSnapshot>;
}

/// Persisted page configurations.
#[async_trait]
pub trait PageStore: Send + Sync {
    async fn find_by_route(&self, scope: &RequestScope, route: &str) -> DbResult<Option<PageConfig>>;

    /// Insert or replace the page at `draft.route`, keeping its id if it exists.
    async fn upsert(&self, scope: &RequestScope, draft: PageDraft) -> DbResult<PageConfig>;
}
