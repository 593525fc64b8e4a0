//! Prop Schemas
//!
//! Describes the props a variant accepts, for editors and agents, and checks
//! authored props loosely against it when a page is saved.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;

/// Expected kind of a prop value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropType {
    String,
    Number,
    Boolean,
    /// Image URL.
    Image,
    /// CSS color value.
    Color,
}

impl PropType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Image => "image",
            Self::Color => "color",
        }
    }

    /// Loose type match: numbers and booleans may also arrive as strings.
    pub fn accepts(&self, value: &JsonValue) -> bool {
        match (self, value) {
            (_, JsonValue::Null) => true,
            (Self::String | Self::Image | Self::Color, JsonValue::String(_)) => true,
            (Self::Number, JsonValue::Number(_)) => true,
            (Self::Number, JsonValue::String(s)) => s.trim().parse::<f64>().is_ok(),
            (Self::Boolean, JsonValue::Bool(_)) => true,
            (Self::Boolean, JsonValue::String(s)) => s == "true" || s == "false",
            _ => false,
        }
    }
}

impl fmt::Display for PropType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One prop in a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropDefinition {
    #[serde(rename = "type")]
    pub prop_type: PropType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<JsonValue>,
}

impl PropDefinition {
    pub fn new(prop_type: PropType) -> Self {
        Self {
            prop_type,
            description: None,
            required: false,
            default: None,
        }
    }

    pub fn string() -> Self {
        Self::new(PropType::String)
    }

    pub fn number() -> Self {
        Self::new(PropType::Number)
    }

    pub fn boolean() -> Self {
        Self::new(PropType::Boolean)
    }

    pub fn image() -> Self {
        Self::new(PropType::Image)
    }

    pub fn color() -> Self {
        Self::new(PropType::Color)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, default: impl Into<JsonValue>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Prop name to definition, ordered for stable schema export.
pub type PropSchema = BTreeMap<String, PropDefinition>;

/// Short name of a JSON value's kind, for error messages.
pub(crate) fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
