//! Shopwright Test Utilities
//!
//! Centralized test infrastructure for the Shopwright workspace:
//! - Recording transactions that count commits and rollbacks
//! - In-memory catalog, cart and page stores
//! - Proptest generators for hosts, tenants, products and section trees
//! - Fixtures and assertions for common scenarios

pub use shopwright_core::{
    CartItem, CartSnapshot, CartSource, DbError, DbResult, PageConfig, PageDraft, PageStore,
    Product, ProductCatalog, ProductFilter, ProductQuery, PropMap, RequestScope, Section, SqlValue,
    TenantExecutor, TenantId, TenantTransaction, TransactionSource,
};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ============================================================================
// RECORDING TRANSACTIONS
// ============================================================================

/// A statement seen by a [`RecordingTransaction`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedStatement {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

/// How a transaction ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxOutcome {
    Open,
    Committed,
    RolledBack,
}

/// Failure injection for new transactions.
#[derive(Debug, Clone, Default)]
pub struct TxBehavior {
    /// Statements containing this text fail.
    pub fail_statements_containing: Option<String>,
    pub fail_commit: bool,
    /// Rows returned by `query_json`, keyed by a substring of the SQL.
    pub canned_rows: Vec<(String, Vec<JsonValue>)>,
}

/// Transaction fake that records every statement and counts how it ended.
#[derive(Debug, Default)]
pub struct RecordingTransaction {
    behavior: TxBehavior,
    statements: Mutex<Vec<RecordedStatement>>,
    commits: AtomicUsize,
    rollbacks: AtomicUsize,
    finished: AtomicBool,
}

impl RecordingTransaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_behavior(behavior: TxBehavior) -> Self {
        Self {
            behavior,
            ..Self::default()
        }
    }

    pub fn statements(&self) -> Vec<RecordedStatement> {
        lock(&self.statements).clone()
    }

    pub fn commits(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    pub fn rollbacks(&self) -> usize {
        self.rollbacks.load(Ordering::SeqCst)
    }

    pub fn outcome(&self) -> TxOutcome {
        match (self.commits(), self.rollbacks()) {
            (0, 0) => TxOutcome::Open,
            (_, 0) => TxOutcome::Committed,
            _ => TxOutcome::RolledBack,
        }
    }

    /// Total number of finish calls, successful or not.
    pub fn finish_calls(&self) -> usize {
        self.commits() + self.rollbacks()
    }

    fn record(&self, sql: &str, params: &[SqlValue]) -> DbResult<()> {
        if self.finished.load(Ordering::SeqCst) {
            return Err(DbError::TransactionFinished);
        }
        lock(&self.statements).push(RecordedStatement {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        match &self.behavior.fail_statements_containing {
            Some(needle) if sql.contains(needle.as_str()) => {
                Err(DbError::query(format!("injected failure for: {}", needle)))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl TenantExecutor for RecordingTransaction {
    async fn execute(&self, sql: &str, params: &[SqlValue]) -> DbResult<u64> {
        self.record(sql, params)?;
        Ok(1)
    }

    async fn query_json(&self, sql: &str, params: &[SqlValue]) -> DbResult<Vec<JsonValue>> {
        self.record(sql, params)?;
        Ok(self
            .behavior
            .canned_rows
            .iter()
            .find(|(needle, _)| sql.contains(needle.as_str()))
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl TenantTransaction for RecordingTransaction {
    async fn commit(&self) -> DbResult<()> {
        self.commits.fetch_add(1, Ordering::SeqCst);
        if self.finished.swap(true, Ordering::SeqCst) {
            return Err(DbError::TransactionFinished);
        }
        if self.behavior.fail_commit {
            return Err(DbError::query("injected commit failure"));
        }
        Ok(())
    }

    async fn rollback(&self) -> DbResult<()> {
        self.rollbacks.fetch_add(1, Ordering::SeqCst);
        if self.finished.swap(true, Ordering::SeqCst) {
            return Err(DbError::TransactionFinished);
        }
        Ok(())
    }
}

/// Transaction source handing out [`RecordingTransaction`]s and keeping them
/// for inspection.
#[derive(Debug, Default)]
pub struct RecordingTransactionSource {
    behavior: TxBehavior,
    fail_begin: Option<DbError>,
    transactions: Mutex<Vec<Arc<RecordingTransaction>>>,
}

impl RecordingTransactionSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_behavior(behavior: TxBehavior) -> Self {
        Self {
            behavior,
            ..Self::default()
        }
    }

    pub fn failing_begin(error: DbError) -> Self {
        Self {
            fail_begin: Some(error),
            ..Self::default()
        }
    }

    pub fn transactions(&self) -> Vec<Arc<RecordingTransaction>> {
        lock(&self.transactions).clone()
    }

    pub fn last(&self) -> Option<Arc<RecordingTransaction>> {
        lock(&self.transactions).last().cloned()
    }

    pub fn begun(&self) -> usize {
        lock(&self.transactions).len()
    }
}

#[async_trait]
impl TransactionSource for RecordingTransactionSource {
    async fn begin(&self) -> DbResult<Arc<dyn TenantTransaction>> {
        if let Some(error) = &self.fail_begin {
            return Err(error.clone());
        }
        let tx = Arc::new(RecordingTransaction::with_behavior(self.behavior.clone()));
        lock(&self.transactions).push(Arc::clone(&tx));
        Ok(tx)
    }
}

/// A request scope over a fresh recording transaction.
///
/// # Panics
/// If `tenant` is not a valid tenant id.
pub fn scope_for(tenant: &str) -> RequestScope {
    scope_with_tx(tenant).0
}

/// A request scope plus the transaction behind it.
///
/// # Panics
/// If `tenant` is not a valid tenant id.
pub fn scope_with_tx(tenant: &str) -> (RequestScope, Arc<RecordingTransaction>) {
    let tenant = match TenantId::parse(tenant) {
        Ok(tenant) => tenant,
        Err(e) => panic!("invalid test tenant {:?}: {}", tenant, e),
    };
    let tx = Arc::new(RecordingTransaction::new());
    (RequestScope::new(tenant, tx.clone()), tx)
}

// ============================================================================
// IN-MEMORY STORES
// ============================================================================

/// Catalog fake. Filtered listings are returned whole, ignoring the limit,
/// so callers that must truncate are exercised.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    products: Vec<Product>,
    queries: Mutex<Vec<(String, ProductQuery)>>,
    fail: bool,
}

impl InMemoryCatalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self {
            products,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Tenant and query of every listing call.
    pub fn queries(&self) -> Vec<(String, ProductQuery)> {
        lock(&self.queries).clone()
    }
}

#[async_trait]
impl ProductCatalog for InMemoryCatalog {
    async fn list_products(&self, scope: &RequestScope, query: ProductQuery) -> DbResult<Vec<Product>> {
        lock(&self.queries).push((scope.tenant_id().to_string(), query));
        if self.fail {
            return Err(DbError::query("catalog unavailable"));
        }
        let mut products: Vec<Product> = match query.filter {
            ProductFilter::Featured => self.products.iter().filter(|p| p.is_featured).cloned().collect(),
            ProductFilter::NewArrivals | ProductFilter::All => self.products.clone(),
        };
        if query.filter == ProductFilter::NewArrivals {
            products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        }
        Ok(products)
    }
}

/// Cart fake keyed by session id.
#[derive(Debug, Default)]
pub struct InMemoryCart {
    carts: Mutex<HashMap<String, CartSnapshot>>,
}

impl InMemoryCart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cart(self, cart: CartSnapshot) -> Self {
        lock(&self.carts).insert(cart.session_id.clone(), cart);
        self
    }

    pub fn len(&self) -> usize {
        lock(&self.carts).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CartSource for InMemoryCart {
    async fn cart_for_session(&self, _scope: &RequestScope, session_id: &str) -> DbResult<CartSnapshot> {
        let mut carts = lock(&self.carts);
        let cart = carts
            .entry(session_id.to_string())
            .or_insert_with(|| CartSnapshot {
                cart_id: Uuid::new_v4(),
                session_id: session_id.to_string(),
                items: Vec::new(),
            });
        Ok(cart.clone())
    }
}

/// Page store fake keyed by tenant and route.
#[derive(Debug, Default)]
pub struct InMemoryPageStore {
    pages: Mutex<BTreeMap<(String, String), PageConfig>>,
}

impl InMemoryPageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a page for a tenant.
    pub fn with_page(self, tenant: &str, draft: PageDraft) -> Self {
        let page = draft.into_page(Uuid::new_v4());
        lock(&self.pages).insert((tenant.to_string(), page.route.clone()), page);
        self
    }

    pub fn get(&self, tenant: &str, route: &str) -> Option<PageConfig> {
        lock(&self.pages)
            .get(&(tenant.to_string(), route.to_string()))
            .cloned()
    }

    pub fn len(&self) -> usize {
        lock(&self.pages).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl PageStore for InMemoryPageStore {
    async fn find_by_route(&self, scope: &RequestScope, route: &str) -> DbResult<Option<PageConfig>> {
        Ok(self.get(scope.tenant_id().as_str(), route))
    }

    async fn upsert(&self, scope: &RequestScope, draft: PageDraft) -> DbResult<PageConfig> {
        let key = (scope.tenant_id().to_string(), draft.route.clone());
        let mut pages = lock(&self.pages);
        let id = pages.get(&key).map_or_else(Uuid::new_v4, |existing| existing.id);
        let page = draft.into_page(id);
        pages.insert(key, page.clone());
        Ok(page)
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for Shopwright types.

    use super::*;
    use proptest::prelude::*;

    /// Generate a random UUID.
    pub fn arb_uuid() -> impl Strategy<Value = Uuid> {
        any::<[u8; 16]>().prop_map(Uuid::from_bytes)
    }

    /// A valid tenant id.
    pub fn arb_tenant_id() -> impl Strategy<Value = String> {
        "[a-z0-9_]{1,63}"
    }

    /// A host label that is never a valid tenant id.
    pub fn arb_hostile_label() -> impl Strategy<Value = String> {
        prop_oneof![
            "[a-z0-9_]{0,10}[A-Z'\";\\- ()]{1,5}[a-z0-9_]{0,10}",
            Just("evil'; DROP SCHEMA public;--".to_string()),
            Just("a\" ; SELECT pg_sleep(10); --".to_string()),
            "[a-z]{64,80}",
        ]
    }

    /// Any label a client might send, valid or not. Never contains a dot.
    pub fn arb_any_label() -> impl Strategy<Value = String> {
        "[^.:\\[\\]]{0,80}"
    }

    /// An optional `:port` suffix.
    pub fn arb_port_suffix() -> impl Strategy<Value = String> {
        prop_oneof![Just(String::new()), (1u16..=u16::MAX).prop_map(|p| format!(":{}", p))]
    }

    /// Any HTTP status a handler might return.
    pub fn arb_status_code() -> impl Strategy<Value = u16> {
        prop_oneof![200u16..=299, 300u16..=399, 400u16..=499, 500u16..=599]
    }

    pub fn arb_product() -> impl Strategy<Value = Product> {
        (
            arb_uuid(),
            "[A-Za-z ]{1,30}",
            0i64..1_000_000,
            any::<bool>(),
            any::<bool>(),
            0i64..10_000,
        )
            .prop_map(|(id, title, price_cents, is_digital, is_featured, age)| Product {
                id,
                slug: title.to_lowercase().replace(' ', "-"),
                title,
                description: None,
                price_cents,
                is_digital,
                is_featured,
                category_id: None,
                created_at: Utc::now() - Duration::minutes(age),
            })
    }

    /// Section trees over the given component types, up to three levels deep.
    pub fn arb_section_tree(types: Vec<&'static str>) -> impl Strategy<Value = Section> {
        let leaf = prop::sample::select(types.clone()).prop_map(Section::new);
        leaf.prop_recursive(3, 16, 4, move |inner| {
            (prop::sample::select(types.clone()), prop::collection::vec(inner, 0..4))
                .prop_map(|(component_type, children)| {
                    Section::new(component_type).with_children(children)
                })
        })
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built fixtures for common scenarios.

    use super::*;

    pub fn product(title: &str, is_featured: bool, is_digital: bool) -> Product {
        Product {
            id: Uuid::new_v4(),
            title: title.to_string(),
            slug: title.to_lowercase().replace(' ', "-"),
            description: Some(format!("{} description", title)),
            price_cents: 1999,
            is_digital,
            is_featured,
            category_id: None,
            created_at: Utc::now(),
        }
    }

    /// `count` featured products, newest last.
    pub fn featured_products(count: usize) -> Vec<Product> {
        (0..count)
            .map(|i| {
                let mut p = product(&format!("Featured {}", i), true, false);
                p.created_at = Utc::now() - Duration::minutes((count - i) as i64);
                p
            })
            .collect()
    }

    pub fn cart(session_id: &str, items: Vec<CartItem>) -> CartSnapshot {
        CartSnapshot {
            cart_id: Uuid::new_v4(),
            session_id: session_id.to_string(),
            items,
        }
    }

    pub fn cart_item(title: &str, quantity: i32, is_digital: bool) -> CartItem {
        CartItem {
            product_id: Uuid::new_v4(),
            title: title.to_string(),
            quantity,
            unit_price_cents: 1000,
            is_digital,
        }
    }

    /// The storefront home page used by end-to-end tests: a hero above a
    /// featured grid limited to four products.
    pub fn storefront_home() -> PageDraft {
        PageDraft {
            route: "/".to_string(),
            title: "Home".to_string(),
            sections: vec![
                Section::new("hero")
                    .with_prop("Title", "Spring Sale")
                    .with_prop("Subtitle", "Everything must go"),
                Section::new("product_grid")
                    .with_prop("Title", "Featured")
                    .with_prop("Limit", 4)
                    .with_prop("Filter", "featured"),
            ],
        }
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions for transaction outcomes.

    use super::*;

    /// Assert the transaction was finished exactly once, by commit.
    #[track_caller]
    pub fn assert_committed_once(tx: &RecordingTransaction) {
        assert_eq!(
            (tx.commits(), tx.rollbacks()),
            (1, 0),
            "expected exactly one commit, statements: {:?}",
            tx.statements()
        );
    }

    /// Assert the transaction was finished exactly once, by rollback.
    #[track_caller]
    pub fn assert_rolled_back_once(tx: &RecordingTransaction) {
        assert_eq!(
            (tx.commits(), tx.rollbacks()),
            (0, 1),
            "expected exactly one rollback, statements: {:?}",
            tx.statements()
        );
    }

    /// Assert every `search_path` parameter names only a safe identifier
    /// ahead of `public`.
    #[track_caller]
    pub fn assert_search_path_safe(tx: &RecordingTransaction) {
        for statement in tx.statements() {
            if !statement.sql.contains("search_path") {
                continue;
            }
            for param in &statement.params {
                if let Some(text) = param.as_text() {
                    let identifier = text.split(',').next().unwrap_or_default().trim().trim_matches('"');
                    assert!(
                        identifier
                            .chars()
                            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'),
                        "unsafe identifier {:?} in {:?}",
                        identifier,
                        statement.sql
                    );
                }
            }
        }
    }
}
