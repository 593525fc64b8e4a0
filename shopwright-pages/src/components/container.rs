//! Layout container
//!
//! Groups content sections under a shared heading and width. Only content
//! and commerce listing components may be nested; checkout must stay at the
//! top level.

use super::{hero, overlay, product_grid};
use crate::component::{ComponentDescriptor, RenderedComponent, VariantDescriptor};
use crate::schema::PropDefinition;
use serde::Serialize;
use shopwright_core::{PropMap, PropMapExt};

pub const COMPONENT_TYPE: &str = "container";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ContainerProps {
    width: String,
    background: Option<String>,
}

fn render(props: &PropMap) -> RenderedComponent {
    let typed = ContainerProps {
        width: props.get_str("Width").unwrap_or("contained").to_string(),
        background: props.get_str("Background").map(str::to_string),
    };
    RenderedComponent::new(COMPONENT_TYPE, overlay(props, &typed))
}

pub fn descriptor() -> ComponentDescriptor {
    ComponentDescriptor::new(COMPONENT_TYPE)
        .with_title("Container")
        .with_description("Groups sections in a shared layout block.")
        .with_category("Layout")
        .with_allowed_children([hero::COMPONENT_TYPE, product_grid::COMPONENT_TYPE, COMPONENT_TYPE])
        .with_renderer(render)
        .with_variant(
            VariantDescriptor::new("contained")
                .as_default()
                .with_prop("Width", PropDefinition::string().with_default("contained"))
                .with_prop("Background", PropDefinition::color()),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitelist_excludes_checkout() {
        let component = descriptor();
        assert!(component.allows_child("hero"));
        assert!(component.allows_child("container"));
        assert!(!component.allows_child("checkout_widget"));
    }
}
