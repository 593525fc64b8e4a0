//! Catalog, Cart and Order Types
//!
//! Read models that page components enrich sections with, plus the write
//! models for products and orders. Prices are integer cents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A product as listed in a tenant's catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price_cents: i64,
    #[serde(default)]
    pub is_digital: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// A product to be added to the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price_cents: i64,
    #[serde(default)]
    pub is_digital: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub category_id: Option<Uuid>,
}

impl NewProduct {
    /// URL slug derived from the title: lowercase alphanumeric runs joined
    /// by `-`. Empty when the title has no letters or digits.
    pub fn slug(&self) -> String {
        self.title
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("-")
    }
}

/// Which slice of the catalog a listing returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductFilter {
    /// Products flagged as featured.
    Featured,
    /// Most recently created first.
    NewArrivals,
    #[default]
    All,
}

impl ProductFilter {
    /// Interpret a `Filter` prop or query value. Unknown and empty values mean
    /// no filtering.
    pub fn from_prop(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("featured") => Self::Featured,
            Some("new_arrivals") => Self::NewArrivals,
            _ => Self::All,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Featured => "featured",
            Self::NewArrivals => "new_arrivals",
            Self::All => "all",
        }
    }
}

/// A catalog listing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductQuery {
    pub filter: ProductFilter,
    pub limit: usize,
}

impl ProductQuery {
    pub fn new(filter: ProductFilter, limit: usize) -> Self {
        Self { filter, limit }
    }
}

/// One line in a shopping cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: Uuid,
    pub title: String,
    pub quantity: i32,
    pub unit_price_cents: i64,
    #[serde(default)]
    pub is_digital: bool,
}

/// A cart and its items, as seen by the checkout widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub cart_id: Uuid,
    pub session_id: String,
    #[serde(default)]
    pub items: Vec<CartItem>,
}

impl CartSnapshot {
    /// True when any item needs shipping.
    pub fn has_physical_items(&self) -> bool {
        self.items.iter().any(|item| !item.is_digital)
    }

    pub fn subtotal_cents(&self) -> i64 {
        self.items
            .iter()
            .map(|item| item.unit_price_cents * i64::from(item.quantity))
            .sum()
    }
}

// ============================================================================
// ORDERS
// ============================================================================

/// Status of a freshly placed order.
pub const ORDER_PENDING: &str = "pending";

/// Payment status of a freshly placed order.
pub const PAYMENT_UNPAID: &str = "unpaid";

/// One line of an order, priced when the order was placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: Uuid,
    pub title: String,
    pub quantity: i32,
    pub unit_price_cents: i64,
}

impl From<&CartItem> for OrderLine {
    fn from(item: &CartItem) -> Self {
        Self {
            product_id: item.product_id,
            title: item.title.clone(),
            quantity: item.quantity,
            unit_price_cents: item.unit_price_cents,
        }
    }
}

/// An order placed from a session's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub session_id: String,
    pub status: String,
    pub payment_status: String,
    pub total_cents: i64,
    pub items: Vec<OrderLine>,
    pub created_at: DateTime<Utc>,
}
