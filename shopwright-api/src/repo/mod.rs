//! PostgreSQL repositories
//!
//! Stateless implementations of the storage traits. Every statement runs on
//! the request's transaction through [`shopwright_core::RequestScope`], and
//! table names are left unqualified so the tenant's search path picks the
//! schema. Rows come back as `jsonb` and are decoded with serde.

pub mod cart;
pub mod catalog;
pub mod orders;
pub mod pages;
pub mod shops;

pub use cart::PgCarts;
pub use catalog::PgCatalog;
pub use orders::PgOrders;
pub use pages::PgPages;
pub use shops::{PgShops, Shop};
