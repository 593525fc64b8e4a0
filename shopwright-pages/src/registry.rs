//! Component Registry
//!
//! Components must be explicitly registered at startup. Once populated, the
//! registry is frozen behind an `Arc` and only read.
//!
//! # Example
//! ```ignore
//! let mut registry = ComponentRegistry::new();
//! registry.register(hero::descriptor());
//! registry.register_variant("hero", VariantDescriptor::new("split"));
//! let registry = registry.freeze();
//! ```

use crate::component::{ComponentDescriptor, ComponentSchema, VariantDescriptor};
use crate::error::RegistryError;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Catalog of component types keyed by type name.
#[derive(Debug, Default, Clone)]
pub struct ComponentRegistry {
    components: BTreeMap<String, ComponentDescriptor>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component.
    ///
    /// # Panics
    /// On a duplicate type name, a duplicate variant name, or a second default
    /// variant. Use [`Self::try_register`] to handle these as errors.
    pub fn register(&mut self, descriptor: ComponentDescriptor) {
        if let Err(e) = self.try_register(descriptor) {
            panic!("registry: {}", e);
        }
    }

    /// Register a component, leaving any existing entry untouched on error.
    pub fn try_register(&mut self, descriptor: ComponentDescriptor) -> Result<(), RegistryError> {
        if self.components.contains_key(&descriptor.component_type) {
            return Err(RegistryError::DuplicateComponent {
                component_type: descriptor.component_type,
            });
        }
        check_variants(&descriptor.component_type, &descriptor.variants)?;
        self.components
            .insert(descriptor.component_type.clone(), descriptor);
        Ok(())
    }

    /// Add a variant to a registered component.
    ///
    /// # Panics
    /// When the component is unknown, the variant name is taken, or the
    /// variant is a second default.
    pub fn register_variant(&mut self, component_type: &str, variant: VariantDescriptor) {
        if let Err(e) = self.try_register_variant(component_type, variant) {
            panic!("registry: {}", e);
        }
    }

    pub fn try_register_variant(
        &mut self,
        component_type: &str,
        variant: VariantDescriptor,
    ) -> Result<(), RegistryError> {
        let component = self.components.get_mut(component_type).ok_or_else(|| {
            RegistryError::UnknownComponent {
                component_type: component_type.to_string(),
            }
        })?;

        if component.variant(&variant.name).is_some() {
            return Err(RegistryError::DuplicateVariant {
                component_type: component_type.to_string(),
                variant: variant.name,
            });
        }
        if variant.is_default {
            if let Some(existing) = component.default_variant() {
                return Err(RegistryError::SecondDefaultVariant {
                    component_type: component_type.to_string(),
                    existing: existing.name.clone(),
                    variant: variant.name,
                });
            }
        }

        component.variants.push(variant);
        Ok(())
    }

    pub fn get(&self, component_type: &str) -> Option<&ComponentDescriptor> {
        self.components.get(component_type)
    }

    pub fn contains(&self, component_type: &str) -> bool {
        self.components.contains_key(component_type)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Registered components in type-name order.
    pub fn iter(&self) -> impl Iterator<Item = &ComponentDescriptor> {
        self.components.values()
    }

    /// Schema of every registered component, for editors and agents.
    pub fn schema(&self) -> Vec<ComponentSchema> {
        self.iter().map(ComponentDescriptor::schema).collect()
    }

    /// End registration and share the registry read-only.
    pub fn freeze(self) -> Arc<Self> {
        Arc::new(self)
    }
}

fn check_variants(component_type: &str, variants: &[VariantDescriptor]) -> Result<(), RegistryError> {
    let mut default: Option<&str> = None;
    for (i, variant) in variants.iter().enumerate() {
        if variants[..i].iter().any(|v| v.name == variant.name) {
            return Err(RegistryError::DuplicateVariant {
                component_type: component_type.to_string(),
                variant: variant.name.clone(),
            });
        }
        if variant.is_default {
            if let Some(existing) = default {
                return Err(RegistryError::SecondDefaultVariant {
                    component_type: component_type.to_string(),
                    existing: existing.to_string(),
                    variant: variant.name.clone(),
                });
            }
            default = Some(&variant.name);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::RenderedComponent;

    fn hero(title: &str) -> ComponentDescriptor {
        ComponentDescriptor::new("hero")
            .with_title(title)
            .with_variant(VariantDescriptor::new("standard").as_default())
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = ComponentRegistry::new();
        assert!(registry.is_empty());
        registry.register(hero("Hero Section"));

        let found = registry.get("hero").map(|c| c.title.as_str());
        assert_eq!(found, Some("Hero Section"));
        assert!(registry.get("marquee").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    #[should_panic(expected = "Duplicate component registration for type: hero")]
    fn test_duplicate_register_panics() {
        let mut registry = ComponentRegistry::new();
        registry.register(hero("First"));
        registry.register(hero("Second"));
    }

    #[test]
    fn test_try_register_keeps_existing_entry() {
        let mut registry = ComponentRegistry::new();
        registry.register(hero("First"));

        let result = registry.try_register(hero("Second"));
        assert_eq!(
            result,
            Err(RegistryError::DuplicateComponent {
                component_type: "hero".to_string()
            })
        );
        assert_eq!(registry.get("hero").map(|c| c.title.as_str()), Some("First"));
    }

    #[test]
    fn test_register_variant() {
        let mut registry = ComponentRegistry::new();
        registry.register(hero("Hero"));
        registry.register_variant(
            "hero",
            VariantDescriptor::new("video")
                .with_renderer(|props| RenderedComponent::new("hero/video", props.clone())),
        );
        let names: Vec<_> = registry
            .get("hero")
            .map(|c| c.variants().map(|v| v.name.clone()).collect())
            .unwrap_or_default();
        assert_eq!(names, vec!["standard", "video"]);
    }

    #[test]
    fn test_variant_errors() {
        let mut registry = ComponentRegistry::new();
        registry.register(hero("Hero"));

        assert!(matches!(
            registry.try_register_variant("marquee", VariantDescriptor::new("x")),
            Err(RegistryError::UnknownComponent { .. })
        ));
        assert!(matches!(
            registry.try_register_variant("hero", VariantDescriptor::new("standard")),
            Err(RegistryError::DuplicateVariant { .. })
        ));
        assert!(matches!(
            registry.try_register_variant("hero", VariantDescriptor::new("split").as_default()),
            Err(RegistryError::SecondDefaultVariant { .. })
        ));
        assert_eq!(registry.get("hero").map(|c| c.variants().count()), Some(1));
    }

    #[test]
    #[should_panic(expected = "Cannot register variant for unknown component type")]
    fn test_register_variant_unknown_component_panics() {
        let mut registry = ComponentRegistry::new();
        registry.register_variant("hero", VariantDescriptor::new("video"));
    }

    #[test]
    fn test_descriptor_with_two_defaults_is_rejected() {
        let mut registry = ComponentRegistry::new();
        let descriptor = ComponentDescriptor::new("product_grid")
            .with_variant(VariantDescriptor::new("grid").as_default())
            .with_variant(VariantDescriptor::new("carousel").as_default());
        assert!(matches!(
            registry.try_register(descriptor),
            Err(RegistryError::SecondDefaultVariant { .. })
        ));
        assert!(!registry.contains("product_grid"));
    }
}
