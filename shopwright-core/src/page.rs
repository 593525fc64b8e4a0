//! Page and Section Types
//!
//! A page is an ordered list of sections. Each section names a registered
//! component type and carries an open prop map. Sections may nest through the
//! `children` prop. Props are kept as raw JSON so that keys unknown to any
//! component survive a load/resolve/save cycle unchanged.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value as JsonValue};
use uuid::Uuid;

/// Open, string-keyed prop map of a section.
pub type PropMap = Map<String, JsonValue>;

/// Prop that holds nested sections.
pub const CHILDREN_PROP: &str = "children";

/// Prop that selects a component variant.
pub const VARIANT_PROP: &str = "Variant";

// ============================================================================
// SECTION
// ============================================================================

/// One component instance placed on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Registered component type name.
    #[serde(rename = "type")]
    pub component_type: String,

    /// Component props. `null` in stored JSON loads as an empty map.
    #[serde(default, deserialize_with = "null_as_empty_map")]
    pub props: PropMap,
}

impl Section {
    pub fn new(component_type: impl Into<String>) -> Self {
        Self {
            component_type: component_type.into(),
            props: PropMap::new(),
        }
    }

    /// Builder-style prop setter.
    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }

    /// Builder-style setter for nested sections.
    pub fn with_children(mut self, children: Vec<Section>) -> Self {
        let value = JsonValue::Array(children.into_iter().map(Section::into_json).collect());
        self.props.insert(CHILDREN_PROP.to_string(), value);
        self
    }

    /// Requested variant name, if a non-empty one is set.
    pub fn variant(&self) -> Option<&str> {
        self.props.get_str(VARIANT_PROP).filter(|v| !v.is_empty())
    }

    /// Nested sections under the `children` prop.
    ///
    /// Returns `None` when the prop is absent, and an error when it is present
    /// but is not an array of `{type, props}` objects.
    pub fn children(&self) -> Option<Result<Vec<Section>, serde_json::Error>> {
        self.props
            .get(CHILDREN_PROP)
            .map(|raw| serde_json::from_value(raw.clone()))
    }

    fn into_json(self) -> JsonValue {
        let mut object = Map::new();
        object.insert("type".to_string(), JsonValue::String(self.component_type));
        object.insert("props".to_string(), JsonValue::Object(self.props));
        JsonValue::Object(object)
    }
}

fn null_as_empty_map<'de, D>(deserializer: D) -> Result<PropMap, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<PropMap>::deserialize(deserializer)?.unwrap_or_default())
}

// ============================================================================
// PROP ACCESS
// ============================================================================

/// Lenient typed accessors over a prop map.
///
/// Stored pages come from hand-edited JSON, so numbers may arrive as floats
/// (`4.0`) or strings (`"4"`).
pub trait PropMapExt {
    fn get_str(&self, key: &str) -> Option<&str>;
    fn get_i64(&self, key: &str) -> Option<i64>;
    fn get_bool(&self, key: &str) -> Option<bool>;
}

impl PropMapExt for PropMap {
    fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(JsonValue::as_str)
    }

    fn get_i64(&self, key: &str) -> Option<i64> {
        match self.get(key)? {
            JsonValue::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            JsonValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            JsonValue::Bool(b) => Some(*b),
            JsonValue::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

// ============================================================================
// PAGE CONFIG
// ============================================================================

/// A stored page: route, title and ordered sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageConfig {
    pub id: Uuid,
    pub route: String,
    pub title: String,
    #[serde(default)]
    pub sections: Vec<Section>,
}

/// Page content submitted by an author, before it has an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageDraft {
    pub route: String,
    pub title: String,
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl PageDraft {
    pub fn into_page(self, id: Uuid) -> PageConfig {
        PageConfig {
            id,
            route: self.route,
            title: self.title,
            sections: self.sections,
        }
    }
}
