//! Checkout widget
//!
//! Shows the visitor's cart. Without a session the widget renders its empty
//! state.

use super::overlay;
use crate::component::{ComponentDescriptor, RenderedComponent, SectionResolver};
use crate::error::ResolveError;
use async_trait::async_trait;
use serde::Serialize;
use shopwright_core::{CartSource, PropMap, PropMapExt, RequestScope, Section};
use std::sync::Arc;

pub const COMPONENT_TYPE: &str = "checkout_widget";

/// Typed view of the checkout widget's resolved props.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CheckoutProps {
    pub is_physical: bool,
    pub item_count: usize,
    pub empty: bool,
}

impl CheckoutProps {
    pub fn from_props(props: &PropMap) -> Self {
        let item_count = props
            .get("Items")
            .and_then(|items| items.as_array())
            .map_or(0, Vec::len);
        Self {
            is_physical: props.get_bool("IsPhysical").unwrap_or(false),
            item_count,
            empty: item_count == 0,
        }
    }
}

/// Adds `Cart`, `Items` and `IsPhysical` for the request's session.
pub struct CartResolver {
    carts: Arc<dyn CartSource>,
}

impl CartResolver {
    pub fn new(carts: Arc<dyn CartSource>) -> Self {
        Self { carts }
    }
}

#[async_trait]
impl SectionResolver for CartResolver {
    async fn resolve(&self, scope: &RequestScope, section: &mut Section) -> Result<(), ResolveError> {
        let Some(session_id) = scope.session_id() else {
            return Ok(());
        };

        let cart = self
            .carts
            .cart_for_session(scope, session_id)
            .await?;

        let items = serde_json::to_value(&cart.items).map_err(ResolveError::encode)?;
        let is_physical = cart.has_physical_items();
        let cart = serde_json::to_value(&cart).map_err(ResolveError::encode)?;

        section.props.insert("Cart".to_string(), cart);
        section.props.insert("Items".to_string(), items);
        section.props.insert("IsPhysical".to_string(), is_physical.into());
        Ok(())
    }
}

fn render(props: &PropMap) -> RenderedComponent {
    let typed = CheckoutProps::from_props(props);
    RenderedComponent::new(COMPONENT_TYPE, overlay(props, &typed))
}

pub fn descriptor(carts: Arc<dyn CartSource>) -> ComponentDescriptor {
    ComponentDescriptor::new(COMPONENT_TYPE)
        .with_title("Checkout")
        .with_description("Cart summary and checkout form for the current visitor.")
        .with_category("Commerce")
        .with_renderer(render)
        .with_resolver(Arc::new(CartResolver::new(carts)))
}
