//! Component and Variant Descriptors
//!
//! A component descriptor is the registered definition of a section type: its
//! display metadata, child whitelist, base renderer and resolver, and named
//! variants. Variant dispatch lives here because it only needs one descriptor
//! and one section.

use crate::error::ResolveError;
use crate::schema::PropSchema;
use async_trait::async_trait;
use serde::Serialize;
use shopwright_core::{PropMap, RequestScope, Section};
use std::fmt;
use std::sync::Arc;

// ============================================================================
// CONTRACTS
// ============================================================================

/// Presentational output of a section: a template name and the props it
/// renders with. HTML generation happens outside this crate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedComponent {
    pub template: String,
    pub props: PropMap,
}

impl RenderedComponent {
    pub fn new(template: impl Into<String>, props: PropMap) -> Self {
        Self {
            template: template.into(),
            props,
        }
    }
}

/// Turns a section's props into presentational output.
pub type RenderFn = Arc<dyn Fn(&PropMap) -> RenderedComponent + Send + Sync>;

/// Fetches or derives live data for a section before render.
///
/// Implementations only add keys to `section.props`; authored keys are left
/// alone.
#[async_trait]
pub trait SectionResolver: Send + Sync {
    async fn resolve(&self, scope: &RequestScope, section: &mut Section) -> Result<(), ResolveError>;
}

// ============================================================================
// VARIANT DESCRIPTOR
// ============================================================================

/// A named alternative within one component type.
#[derive(Clone)]
pub struct VariantDescriptor {
    pub name: String,
    pub title: String,
    pub description: Option<String>,
    pub is_default: bool,
    pub props: PropSchema,
    pub(crate) renderer: Option<RenderFn>,
    pub(crate) resolver: Option<Arc<dyn SectionResolver>>,
}

impl VariantDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            title: name.clone(),
            name,
            description: None,
            is_default: false,
            props: PropSchema::new(),
            renderer: None,
            resolver: None,
        }
    }

    /// Mark this as the component's default variant.
    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_prop(mut self, name: impl Into<String>, definition: crate::schema::PropDefinition) -> Self {
        self.props.insert(name.into(), definition);
        self
    }

    pub fn with_renderer<F>(mut self, renderer: F) -> Self
    where
        F: Fn(&PropMap) -> RenderedComponent + Send + Sync + 'static,
    {
        self.renderer = Some(Arc::new(renderer));
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn SectionResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn has_renderer(&self) -> bool {
        self.renderer.is_some()
    }

    pub fn has_resolver(&self) -> bool {
        self.resolver.is_some()
    }
}

impl fmt::Debug for VariantDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariantDescriptor")
            .field("name", &self.name)
            .field("is_default", &self.is_default)
            .field("props", &self.props.keys().collect::<Vec<_>>())
            .field("renderer", &self.renderer.is_some())
            .field("resolver", &self.resolver.is_some())
            .finish()
    }
}

// ============================================================================
// COMPONENT DESCRIPTOR
// ============================================================================

/// Registered definition of a component type.
#[derive(Clone)]
pub struct ComponentDescriptor {
    pub component_type: String,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    /// Permitted child types. Empty means unconstrained.
    pub allowed_children: Vec<String>,
    pub(crate) variants: Vec<VariantDescriptor>,
    pub(crate) renderer: Option<RenderFn>,
    pub(crate) resolver: Option<Arc<dyn SectionResolver>>,
}

impl ComponentDescriptor {
    pub fn new(component_type: impl Into<String>) -> Self {
        let component_type = component_type.into();
        Self {
            title: component_type.clone(),
            component_type,
            description: None,
            category: None,
            allowed_children: Vec::new(),
            variants: Vec::new(),
            renderer: None,
            resolver: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_allowed_children<I, S>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_children = children.into_iter().map(Into::into).collect();
        self
    }

    /// Attach a variant. Duplicate names and second defaults are rejected
    /// when the descriptor is registered.
    pub fn with_variant(mut self, variant: VariantDescriptor) -> Self {
        self.variants.push(variant);
        self
    }

    pub fn with_renderer<F>(mut self, renderer: F) -> Self
    where
        F: Fn(&PropMap) -> RenderedComponent + Send + Sync + 'static,
    {
        self.renderer = Some(Arc::new(renderer));
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn SectionResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn variants(&self) -> impl Iterator<Item = &VariantDescriptor> {
        self.variants.iter()
    }

    pub fn variant(&self, name: &str) -> Option<&VariantDescriptor> {
        self.variants.iter().find(|v| v.name == name)
    }

    pub fn default_variant(&self) -> Option<&VariantDescriptor> {
        self.variants.iter().find(|v| v.is_default)
    }

    pub fn allows_child(&self, child_type: &str) -> bool {
        self.allowed_children.is_empty() || self.allowed_children.iter().any(|c| c == child_type)
    }

    // ------------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------------

    /// Requested variant, then default variant, then the base renderer.
    pub fn renderer_for(&self, section: &Section) -> Option<&RenderFn> {
        section
            .variant()
            .and_then(|name| self.variant(name))
            .and_then(|v| v.renderer.as_ref())
            .or_else(|| self.default_variant().and_then(|v| v.renderer.as_ref()))
            .or(self.renderer.as_ref())
    }

    /// Requested variant, then default variant (unless the requested variant
    /// is the default), then the base resolver.
    pub fn resolver_for(&self, section: &Section) -> Option<&Arc<dyn SectionResolver>> {
        let requested = section.variant().and_then(|name| self.variant(name));
        if let Some(resolver) = requested.and_then(|v| v.resolver.as_ref()) {
            return Some(resolver);
        }

        let requested_is_default = requested.map_or(false, |v| v.is_default);
        if !requested_is_default {
            if let Some(resolver) = self.default_variant().and_then(|v| v.resolver.as_ref()) {
                return Some(resolver);
            }
        }

        self.resolver.as_ref()
    }

    /// Prop schema that applies to a section: requested variant, else default.
    pub fn schema_for(&self, section: &Section) -> Option<&PropSchema> {
        section
            .variant()
            .and_then(|name| self.variant(name))
            .or_else(|| self.default_variant())
            .map(|v| &v.props)
    }

    /// Render a section, or `None` when no renderer applies.
    pub fn render(&self, section: &Section) -> Option<RenderedComponent> {
        self.renderer_for(section).map(|render| render(&section.props))
    }

    /// Serializable description for editors and agents.
    pub fn schema(&self) -> ComponentSchema {
        ComponentSchema {
            component_type: self.component_type.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            category: self.category.clone(),
            allowed_children: self.allowed_children.clone(),
            resolves_data: self.resolver.is_some() || self.variants.iter().any(|v| v.resolver.is_some()),
            variants: self
                .variants
                .iter()
                .map(|v| VariantSchema {
                    name: v.name.clone(),
                    title: v.title.clone(),
                    description: v.description.clone(),
                    is_default: v.is_default,
                    props: v.props.clone(),
                })
                .collect(),
        }
    }
}

impl fmt::Debug for ComponentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDescriptor")
            .field("component_type", &self.component_type)
            .field("allowed_children", &self.allowed_children)
            .field("variants", &self.variants)
            .field("renderer", &self.renderer.is_some())
            .field("resolver", &self.resolver.is_some())
            .finish()
    }
}

// ============================================================================
// SCHEMA EXPORT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariantSchema {
    pub name: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub is_default: bool,
    pub props: PropSchema,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentSchema {
    #[serde(rename = "type")]
    pub component_type: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allowed_children: Vec<String>,
    pub resolves_data: bool,
    pub variants: Vec<VariantSchema>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopwright_core::VARIANT_PROP;

    struct Tag(&'static str);

    #[async_trait]
    impl SectionResolver for Tag {
        async fn resolve(&self, _scope: &RequestScope, section: &mut Section) -> Result<(), ResolveError> {
            section.props.insert("ResolvedBy".to_string(), self.0.into());
            Ok(())
        }
    }

    fn template(name: &'static str) -> impl Fn(&PropMap) -> RenderedComponent + Send + Sync {
        move |props: &PropMap| RenderedComponent::new(name, props.clone())
    }

    fn descriptor() -> ComponentDescriptor {
        ComponentDescriptor::new("product_grid")
            .with_renderer(template("base"))
            .with_resolver(Arc::new(Tag("base")))
            .with_variant(
                VariantDescriptor::new("grid")
                    .as_default()
                    .with_renderer(template("grid"))
                    .with_resolver(Arc::new(Tag("grid"))),
            )
            .with_variant(VariantDescriptor::new("carousel").with_renderer(template("carousel")))
            .with_variant(VariantDescriptor::new("list").with_resolver(Arc::new(Tag("list"))))
    }

    fn section(variant: Option<&str>) -> Section {
        let section = Section::new("product_grid");
        match variant {
            Some(v) => section.with_prop(VARIANT_PROP, v),
            None => section,
        }
    }

    fn rendered_template(component: &ComponentDescriptor, variant: Option<&str>) -> Option<String> {
        component.render(&section(variant)).map(|r| r.template)
    }

    #[test]
    fn test_render_dispatch_order() {
        let component = descriptor();
        assert_eq!(rendered_template(&component, Some("carousel")).as_deref(), Some("carousel"));
        // Variant without a renderer falls to the default variant.
        assert_eq!(rendered_template(&component, Some("list")).as_deref(), Some("grid"));
        assert_eq!(rendered_template(&component, Some("unknown")).as_deref(), Some("grid"));
        assert_eq!(rendered_template(&component, None).as_deref(), Some("grid"));
    }

    #[test]
    fn test_render_falls_back_to_base_then_nothing() {
        let component = ComponentDescriptor::new("hero")
            .with_renderer(template("base"))
            .with_variant(VariantDescriptor::new("standard").as_default());
        assert_eq!(rendered_template(&component, Some("standard")).as_deref(), Some("base"));

        let bare = ComponentDescriptor::new("spacer");
        assert_eq!(rendered_template(&bare, None), None);
    }

    #[test]
    fn test_resolver_dispatch_order() {
        let component = descriptor();
        let picked = |variant: Option<&str>| component.resolver_for(&section(variant)).is_some();
        assert!(picked(Some("list")));
        assert!(picked(Some("carousel")));
        assert!(picked(None));
    }

    #[tokio::test]
    async fn test_resolver_dispatch_targets() {
        let scope = shopwright_test_utils::scope_for("shop1");
        let component = descriptor();

        for (variant, expected) in [
            (Some("list"), "list"),
            (Some("carousel"), "grid"),
            (Some("grid"), "grid"),
            (None, "grid"),
        ] {
            let mut s = section(variant);
            let resolver = component.resolver_for(&s).cloned();
            if let Some(resolver) = resolver {
                resolver.resolve(&scope, &mut s).await.ok();
            }
            assert_eq!(s.props.get("ResolvedBy").and_then(|v| v.as_str()), Some(expected));
        }
    }

    #[tokio::test]
    async fn test_default_variant_without_resolver_uses_base() {
        let scope = shopwright_test_utils::scope_for("shop1");
        let component = ComponentDescriptor::new("checkout_widget")
            .with_resolver(Arc::new(Tag("base")))
            .with_variant(VariantDescriptor::new("compact").as_default())
            .with_variant(VariantDescriptor::new("full"));

        for variant in [Some("compact"), Some("full"), None] {
            let mut s = section(variant);
            if let Some(resolver) = component.resolver_for(&s).cloned() {
                resolver.resolve(&scope, &mut s).await.ok();
            }
            assert_eq!(s.props.get("ResolvedBy").and_then(|v| v.as_str()), Some("base"));
        }
    }

    #[test]
    fn test_no_resolver_anywhere() {
        let component = ComponentDescriptor::new("hero")
            .with_variant(VariantDescriptor::new("standard").as_default());
        assert!(component.resolver_for(&section(None)).is_none());
    }

    #[test]
    fn test_allows_child() {
        let open = ComponentDescriptor::new("product_grid");
        assert!(open.allows_child("checkout_widget"));

        let closed = ComponentDescriptor::new("container").with_allowed_children(["hero"]);
        assert!(closed.allows_child("hero"));
        assert!(!closed.allows_child("checkout_widget"));
    }

    #[test]
    fn test_schema_export() {
        let schema = descriptor().schema();
        assert_eq!(schema.component_type, "product_grid");
        assert!(schema.resolves_data);
        assert_eq!(schema.variants.len(), 3);
        assert!(schema.variants.iter().filter(|v| v.is_default).count() == 1);
    }
}
