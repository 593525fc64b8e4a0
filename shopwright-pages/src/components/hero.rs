//! Hero banner

use super::overlay;
use crate::component::{ComponentDescriptor, RenderedComponent, VariantDescriptor};
use crate::schema::PropDefinition;
use serde::Serialize;
use shopwright_core::{PropMap, PropMapExt, VARIANT_PROP};

pub const COMPONENT_TYPE: &str = "hero";

const DEFAULT_TITLE: &str = "Welcome";
const DEFAULT_ALIGN: &str = "center";
const STANDARD: &str = "standard";
const VIDEO: &str = "video";

/// Typed view of a hero section's props.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct HeroProps {
    pub title: String,
    pub subtitle: Option<String>,
    pub button_text: Option<String>,
    pub button_link: Option<String>,
    pub background_image: Option<String>,
    #[serde(rename = "VideoURL")]
    pub video_url: Option<String>,
    pub overlay: bool,
    pub align: String,
    pub variant: String,
}

impl HeroProps {
    /// Parse props. An unregistered `Variant` reads as `standard`.
    pub fn from_props(props: &PropMap) -> Self {
        let text = |key: &str| props.get_str(key).filter(|s| !s.is_empty()).map(str::to_string);
        let variant = match props.get_str(VARIANT_PROP) {
            Some(VIDEO) => VIDEO,
            _ => STANDARD,
        }
        .to_string();
        Self {
            title: text("Title").unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            subtitle: text("Subtitle"),
            button_text: text("ButtonText"),
            button_link: text("ButtonLink"),
            background_image: text("BackgroundImage"),
            video_url: text("VideoURL"),
            overlay: props.get_bool("Overlay").unwrap_or(true),
            align: text("Align").unwrap_or_else(|| DEFAULT_ALIGN.to_string()),
            variant,
        }
    }
}

fn render_variant(variant: &'static str) -> impl Fn(&PropMap) -> RenderedComponent + Send + Sync {
    move |props: &PropMap| {
        let typed = HeroProps {
            variant: variant.to_string(),
            ..HeroProps::from_props(props)
        };
        RenderedComponent::new(format!("{}/{}", COMPONENT_TYPE, variant), overlay(props, &typed))
    }
}

pub fn descriptor() -> ComponentDescriptor {
    ComponentDescriptor::new(COMPONENT_TYPE)
        .with_title("Hero Section")
        .with_description("A large banner area usually placed at the top of the page.")
        .with_category("Content")
        .with_variant(
            VariantDescriptor::new(STANDARD)
                .as_default()
                .with_renderer(render_variant(STANDARD))
                .with_title("Standard Image")
                .with_description("Title, Subtitle, and Background Image")
                .with_prop("Title", PropDefinition::string().required().with_default(DEFAULT_TITLE))
                .with_prop("Subtitle", PropDefinition::string())
                .with_prop("ButtonText", PropDefinition::string())
                .with_prop("ButtonLink", PropDefinition::string())
                .with_prop(
                    "BackgroundImage",
                    PropDefinition::image().with_description("URL for background"),
                )
                .with_prop("Align", PropDefinition::string().with_default(DEFAULT_ALIGN)),
        )
        .with_variant(
            VariantDescriptor::new(VIDEO)
                .with_renderer(render_variant(VIDEO))
                .with_title("Background Video")
                .with_description("Hero with looped background video")
                .with_prop("Title", PropDefinition::string().required())
                .with_prop("VideoURL", PropDefinition::string().required().with_description("MP4 URL"))
                .with_prop("Overlay", PropDefinition::boolean().with_default(true)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopwright_core::Section;

    #[test]
    fn test_defaults_applied() {
        let props = HeroProps::from_props(&PropMap::new());
        assert_eq!(props.title, "Welcome");
        assert_eq!(props.align, "center");
        assert_eq!(props.variant, "standard");
        assert!(props.overlay);
    }

    #[test]
    fn test_render_uses_variant_template() {
        let component = descriptor();
        let section = Section::new(COMPONENT_TYPE)
            .with_prop(VARIANT_PROP, "video")
            .with_prop("Title", "Summer")
            .with_prop("VideoURL", "https://cdn.example.com/summer.mp4")
            .with_prop("Overlay", false);
        let rendered = component.render(&section);
        assert_eq!(rendered.as_ref().map(|r| r.template.as_str()), Some("hero/video"));
        let overlay = rendered.and_then(|r| r.props.get("Overlay").cloned());
        assert_eq!(overlay, Some(serde_json::Value::Bool(false)));
    }

    #[test]
    fn test_unregistered_variant_renders_default_template() {
        let section = Section::new(COMPONENT_TYPE).with_prop(VARIANT_PROP, "bogus");
        let rendered = descriptor().render(&section);
        assert_eq!(rendered.as_ref().map(|r| r.template.as_str()), Some("hero/standard"));
        let variant = rendered.and_then(|r| r.props.get_str(VARIANT_PROP).map(str::to_string));
        assert_eq!(variant.as_deref(), Some("standard"));
        assert_eq!(HeroProps::from_props(&section.props).variant, "standard");
    }

    #[test]
    fn test_render_passes_unknown_props_through() {
        let section = Section::new(COMPONENT_TYPE).with_prop("x-theme", "dark");
        let rendered = descriptor().render(&section);
        let props = rendered.map(|r| r.props).unwrap_or_default();
        assert_eq!(props.get_str("x-theme"), Some("dark"));
        assert_eq!(props.get_str("Title"), Some("Welcome"));
    }

    #[test]
    fn test_hero_has_no_resolver() {
        let section = Section::new(COMPONENT_TYPE);
        assert!(descriptor().resolver_for(&section).is_none());
    }
}
