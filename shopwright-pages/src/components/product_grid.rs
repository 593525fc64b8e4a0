//! Product grid
//!
//! Lists catalog products. The `grid` variant (default) shows 8 unfiltered
//! products; the `carousel` variant shows 12 new arrivals. `Limit` and
//! `Filter` props override both.

use super::overlay;
use crate::component::{ComponentDescriptor, RenderedComponent, SectionResolver, VariantDescriptor};
use crate::error::ResolveError;
use crate::schema::PropDefinition;
use async_trait::async_trait;
use serde::Serialize;
use shopwright_core::{
    ProductCatalog, ProductFilter, ProductQuery, PropMap, PropMapExt, RequestScope, Section,
};
use std::sync::Arc;
use tracing::debug;

pub const COMPONENT_TYPE: &str = "product_grid";

/// Prop that receives the resolved product list.
pub const PRODUCTS_PROP: &str = "Products";

/// Upper bound on any listing, whatever the section asks for.
pub const MAX_LIMIT: usize = 100;

const GRID_LIMIT: usize = 8;
const CAROUSEL_LIMIT: usize = 12;

/// Typed view of a product grid section's props.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProductGridProps {
    pub title: Option<String>,
    pub view_all_link: Option<String>,
    pub card_variant: String,
    pub limit: usize,
    pub filter: ProductFilter,
}

impl ProductGridProps {
    /// Parse with the given variant defaults. Non-positive limits fall back
    /// to the default.
    pub fn from_props(props: &PropMap, default_limit: usize, default_filter: ProductFilter) -> Self {
        let text = |key: &str| props.get_str(key).filter(|s| !s.is_empty()).map(str::to_string);
        let limit = props
            .get_i64("Limit")
            .filter(|l| *l > 0)
            .map_or(default_limit, |l| usize::try_from(l).unwrap_or(MAX_LIMIT))
            .min(MAX_LIMIT);
        let filter = match text("Filter") {
            Some(raw) => ProductFilter::from_prop(Some(&raw)),
            None => default_filter,
        };
        Self {
            title: text("Title"),
            view_all_link: text("ViewAllLink"),
            card_variant: text("CardVariant").unwrap_or_else(|| "standard".to_string()),
            limit,
            filter,
        }
    }
}

/// Fetches products for one variant's defaults.
pub struct ProductListResolver {
    catalog: Arc<dyn ProductCatalog>,
    default_limit: usize,
    default_filter: ProductFilter,
}

impl ProductListResolver {
    pub fn new(catalog: Arc<dyn ProductCatalog>, default_limit: usize, default_filter: ProductFilter) -> Self {
        Self {
            catalog,
            default_limit,
            default_filter,
        }
    }
}

#[async_trait]
impl SectionResolver for ProductListResolver {
    async fn resolve(&self, scope: &RequestScope, section: &mut Section) -> Result<(), ResolveError> {
        let props = ProductGridProps::from_props(&section.props, self.default_limit, self.default_filter);
        let mut products = self
            .catalog
            .list_products(scope, ProductQuery::new(props.filter, props.limit))
            .await?;
        // Catalog implementations may ignore the limit for unfiltered listings.
        products.truncate(props.limit);

        debug!(
            tenant_id = %scope.tenant_id(),
            filter = props.filter.as_str(),
            count = products.len(),
            "Resolved product grid"
        );
        let value = serde_json::to_value(&products).map_err(ResolveError::encode)?;
        section.props.insert(PRODUCTS_PROP.to_string(), value);
        Ok(())
    }
}

fn render_variant(
    variant: &'static str,
    default_limit: usize,
    default_filter: ProductFilter,
) -> impl Fn(&PropMap) -> RenderedComponent + Send + Sync {
    move |props: &PropMap| {
        let typed = ProductGridProps::from_props(props, default_limit, default_filter);
        RenderedComponent::new(format!("{}/{}", COMPONENT_TYPE, variant), overlay(props, &typed))
    }
}

fn variant_props(variant: VariantDescriptor, title: &str, limit: usize) -> VariantDescriptor {
    variant
        .with_prop("Title", PropDefinition::string().with_default(title))
        .with_prop("Limit", PropDefinition::number().with_default(limit as i64))
        .with_prop(
            "Filter",
            PropDefinition::string().with_description("featured, new_arrivals, or empty for all"),
        )
        .with_prop("CardVariant", PropDefinition::string().with_default("standard"))
        .with_prop("ViewAllLink", PropDefinition::string())
}

pub fn descriptor(catalog: Arc<dyn ProductCatalog>) -> ComponentDescriptor {
    let grid = VariantDescriptor::new("grid")
        .as_default()
        .with_title("Standard Grid")
        .with_renderer(render_variant("grid", GRID_LIMIT, ProductFilter::All))
        .with_resolver(Arc::new(ProductListResolver::new(
            Arc::clone(&catalog),
            GRID_LIMIT,
            ProductFilter::All,
        )));
    let carousel = VariantDescriptor::new("carousel")
        .with_title("Product Carousel")
        .with_renderer(render_variant("carousel", CAROUSEL_LIMIT, ProductFilter::NewArrivals))
        .with_resolver(Arc::new(ProductListResolver::new(
            catalog,
            CAROUSEL_LIMIT,
            ProductFilter::NewArrivals,
        )));

    ComponentDescriptor::new(COMPONENT_TYPE)
        .with_title("Product Grid")
        .with_description("Displays a collection of products.")
        .with_category("Commerce")
        .with_variant(variant_props(grid, "Featured Products", GRID_LIMIT))
        .with_variant(variant_props(carousel, "New Arrivals", CAROUSEL_LIMIT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(value: serde_json::Value) -> PropMap {
        match value {
            serde_json::Value::Object(map) => map,
            _ => PropMap::new(),
        }
    }

    #[test]
    fn test_grid_defaults() {
        let parsed = ProductGridProps::from_props(&PropMap::new(), GRID_LIMIT, ProductFilter::All);
        assert_eq!(parsed.limit, 8);
        assert_eq!(parsed.filter, ProductFilter::All);
    }

    #[test]
    fn test_overrides_and_bounds() {
        let parsed = ProductGridProps::from_props(
            &props(json!({"Limit": 4, "Filter": "featured"})),
            CAROUSEL_LIMIT,
            ProductFilter::NewArrivals,
        );
        assert_eq!(parsed.limit, 4);
        assert_eq!(parsed.filter, ProductFilter::Featured);

        let parsed = ProductGridProps::from_props(&props(json!({"Limit": 0})), GRID_LIMIT, ProductFilter::All);
        assert_eq!(parsed.limit, GRID_LIMIT);

        let parsed = ProductGridProps::from_props(&props(json!({"Limit": 5000})), GRID_LIMIT, ProductFilter::All);
        assert_eq!(parsed.limit, MAX_LIMIT);
    }

    #[test]
    fn test_carousel_defaults_to_new_arrivals() {
        let parsed = ProductGridProps::from_props(&PropMap::new(), CAROUSEL_LIMIT, ProductFilter::NewArrivals);
        assert_eq!(parsed.limit, 12);
        assert_eq!(parsed.filter, ProductFilter::NewArrivals);

        // An unrecognized filter means "all", not the variant default.
        let parsed = ProductGridProps::from_props(
            &props(json!({"Filter": "bestsellers"})),
            CAROUSEL_LIMIT,
            ProductFilter::NewArrivals,
        );
        assert_eq!(parsed.filter, ProductFilter::All);
    }
}
