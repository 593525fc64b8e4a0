//! Shared application state for Axum routers.

use std::sync::Arc;

use deadpool_postgres::Pool;
use shopwright_core::{CartSource, PageStore, ProductCatalog, TransactionSource};
use shopwright_pages::{default_registry, ComponentRegistry, PageService};

use crate::db::PgTransactionSource;
use crate::repo::{PgCarts, PgCatalog, PgOrders, PgPages, PgShops};

/// The storage the server runs against. Production wires PostgreSQL; tests
/// swap in recording transactions and in-memory stores.
#[derive(Clone)]
pub struct Backends {
    pub transactions: Arc<dyn TransactionSource>,
    pub catalog: Arc<dyn ProductCatalog>,
    pub carts: Arc<dyn CartSource>,
    pub pages: Arc<dyn PageStore>,
}

impl Backends {
    /// PostgreSQL for everything, over one pool.
    pub fn postgres(pool: Pool) -> Self {
        Self {
            transactions: Arc::new(PgTransactionSource::new(pool)),
            catalog: Arc::new(PgCatalog),
            carts: Arc::new(PgCarts),
            pages: Arc::new(PgPages),
        }
    }
}

/// Application-wide state shared across tenant-scoped routes.
#[derive(Clone)]
pub struct AppState {
    /// Frozen component registry, shared with the page service.
    pub registry: Arc<ComponentRegistry>,
    pub pages: PageService,
    pub catalog: Arc<dyn ProductCatalog>,
    /// Write paths run SQL on the request transaction directly.
    pub products: PgCatalog,
    pub carts: PgCarts,
    pub orders: PgOrders,
    pub shops: PgShops,
}

impl AppState {
    /// Build the registry over the catalog and cart backends, then the page
    /// service over it.
    pub fn new(backends: &Backends) -> Self {
        let registry = default_registry(Arc::clone(&backends.catalog), Arc::clone(&backends.carts));
        Self {
            pages: PageService::new(Arc::clone(&registry), Arc::clone(&backends.pages)),
            registry,
            catalog: Arc::clone(&backends.catalog),
            products: PgCatalog,
            carts: PgCarts,
            orders: PgOrders,
            shops: PgShops,
        }
    }
}

// Use macro to reduce boilerplate for FromRef implementations
crate::impl_from_ref!(Arc<ComponentRegistry>, registry);
crate::impl_from_ref!(PageService, pages);
crate::impl_from_ref!(Arc<dyn ProductCatalog>, catalog);
crate::impl_from_ref!(PgCatalog, products);
crate::impl_from_ref!(PgCarts, carts);
crate::impl_from_ref!(PgOrders, orders);
crate::impl_from_ref!(PgShops, shops);
