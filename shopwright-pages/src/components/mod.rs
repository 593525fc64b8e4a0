//! Built-in Components
//!
//! Storefront components registered at startup. Each module exposes a
//! `descriptor` constructor; data-backed components take their collaborators
//! as arguments so registration stays explicit.

pub mod checkout;
pub mod container;
pub mod hero;
pub mod product_grid;

use crate::registry::ComponentRegistry;
use serde::Serialize;
use serde_json::Value as JsonValue;
use shopwright_core::{CartSource, ProductCatalog, PropMap};
use std::sync::Arc;

pub use checkout::CheckoutProps;
pub use hero::HeroProps;
pub use product_grid::ProductGridProps;

/// Register every built-in component.
pub fn register_builtins(
    registry: &mut ComponentRegistry,
    catalog: Arc<dyn ProductCatalog>,
    carts: Arc<dyn CartSource>,
) {
    registry.register(hero::descriptor());
    registry.register(product_grid::descriptor(catalog));
    registry.register(checkout::descriptor(carts));
    registry.register(container::descriptor());
}

/// Registry with every built-in component, frozen for sharing.
pub fn default_registry(
    catalog: Arc<dyn ProductCatalog>,
    carts: Arc<dyn CartSource>,
) -> Arc<ComponentRegistry> {
    let mut registry = ComponentRegistry::new();
    register_builtins(&mut registry, catalog, carts);
    registry.freeze()
}

/// Authored props overlaid with typed, defaulted values.
///
/// Keys the typed struct does not know about (resolved data, editor notes)
/// pass through to the template.
pub(crate) fn overlay<T: Serialize>(props: &PropMap, typed: &T) -> PropMap {
    let mut out = props.clone();
    if let Ok(JsonValue::Object(fields)) = serde_json::to_value(typed) {
        for (key, value) in fields {
            if !value.is_null() {
                out.insert(key, value);
            }
        }
    }
    out
}
