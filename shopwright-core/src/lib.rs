//! Shopwright Core - Shared Types
//!
//! Tenant identifiers, page and section models, catalog read models, and the
//! transaction traits every other crate is written against. No HTTP and no
//! database driver lives here.

pub mod catalog;
pub mod db;
pub mod error;
pub mod page;
pub mod scope;
pub mod store;
pub mod tenant;

pub use catalog::{
    CartItem, CartSnapshot, NewProduct, Order, OrderLine, Product, ProductFilter, ProductQuery,
    ORDER_PENDING, PAYMENT_UNPAID,
};
pub use db::{SqlValue, TenantExecutor, TenantTransaction, TransactionSource};
pub use error::{DbError, DbResult, TenantIdError};
pub use page::{PageConfig, PageDraft, PropMap, PropMapExt, Section, CHILDREN_PROP, VARIANT_PROP};
pub use scope::RequestScope;
pub use store::{CartSource, PageStore, ProductCatalog};
pub use tenant::{TenantId, MAX_TENANT_ID_LEN, PUBLIC_TENANT};
