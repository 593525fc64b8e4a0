//! Section rendering through variant dispatch.

use crate::error::SectionPath;
use crate::registry::ComponentRegistry;
use crate::component::RenderedComponent;
use serde::Serialize;
use shopwright_core::Section;

/// Rendered output of one section and its children.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedSection {
    pub path: SectionPath,
    #[serde(rename = "type")]
    pub component_type: String,
    /// `None` when no renderer applies; the section is simply not shown.
    pub output: Option<RenderedComponent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RenderedSection>,
}

/// Render sections in order. Unknown types and sections without a renderer
/// produce no output rather than an error.
pub fn render_sections(registry: &ComponentRegistry, sections: &[Section]) -> Vec<RenderedSection> {
    sections
        .iter()
        .enumerate()
        .map(|(index, section)| render_tree(registry, section, SectionPath::root(index)))
        .collect()
}

fn render_tree(registry: &ComponentRegistry, section: &Section, path: SectionPath) -> RenderedSection {
    let output = registry
        .get(&section.component_type)
        .and_then(|component| component.render(section));
    let children = match section.children() {
        Some(Ok(children)) => children
            .iter()
            .enumerate()
            .map(|(index, child)| render_tree(registry, child, path.child(index)))
            .collect(),
        _ => Vec::new(),
    };
    RenderedSection {
        path,
        component_type: section.component_type.clone(),
        output,
        children,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::ComponentDescriptor;

    #[test]
    fn test_unrenderable_sections_produce_no_output() {
        let mut registry = ComponentRegistry::new();
        registry.register(
            ComponentDescriptor::new("banner")
                .with_renderer(|props| RenderedComponent::new("banner", props.clone())),
        );
        registry.register(ComponentDescriptor::new("spacer"));

        let sections = vec![
            Section::new("banner"),
            Section::new("spacer"),
            Section::new("marquee"),
        ];
        let rendered = render_sections(&registry, &sections);
        assert_eq!(rendered.len(), 3);
        assert!(rendered[0].output.is_some());
        assert!(rendered[1].output.is_none());
        assert!(rendered[2].output.is_none());
    }

    #[test]
    fn test_children_render_with_paths() {
        let mut registry = ComponentRegistry::new();
        registry.register(
            ComponentDescriptor::new("banner")
                .with_renderer(|props| RenderedComponent::new("banner", props.clone())),
        );
        let sections = vec![Section::new("banner").with_children(vec![Section::new("banner")])];
        let rendered = render_sections(&registry, &sections);
        assert_eq!(rendered[0].children.len(), 1);
        assert_eq!(rendered[0].children[0].path, SectionPath::from(vec![0, 0]));
    }
}
