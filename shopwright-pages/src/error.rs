//! Error types for page composition

use crate::schema::PropType;
use serde::Serialize;
use shopwright_core::DbError;
use std::fmt;
use thiserror::Error;

/// Component registration errors. Always a programming mistake, so the
/// panicking `register*` calls turn these into startup failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Duplicate component registration for type: {component_type}")]
    DuplicateComponent { component_type: String },

    #[error("Cannot register variant for unknown component type: {component_type}")]
    UnknownComponent { component_type: String },

    #[error("Duplicate variant '{variant}' for component: {component_type}")]
    DuplicateVariant {
        component_type: String,
        variant: String,
    },

    #[error("Component {component_type} already has default variant '{existing}', cannot add '{variant}'")]
    SecondDefaultVariant {
        component_type: String,
        existing: String,
        variant: String,
    },
}

/// Failure of a single section's resolver.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Data access failed: {0}")]
    Data(#[from] DbError),

    #[error("Invalid prop {prop}: {reason}")]
    InvalidProp { prop: String, reason: String },

    #[error("Failed to encode resolved data: {reason}")]
    Encode { reason: String },
}

impl ResolveError {
    pub fn encode(err: serde_json::Error) -> Self {
        Self::Encode {
            reason: err.to_string(),
        }
    }
}

// ============================================================================
// SECTION PATHS
// ============================================================================

/// Location of a section in a page tree: top-level index, then child indices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SectionPath(Vec<usize>);

impl SectionPath {
    pub fn root(index: usize) -> Self {
        Self(vec![index])
    }

    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }
}

impl From<Vec<usize>> for SectionPath {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

impl fmt::Display for SectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut indices = self.0.iter();
        match indices.next() {
            Some(first) => write!(f, "sections[{}]", first)?,
            None => return f.write_str("sections"),
        }
        for index in indices {
            write!(f, ".children[{}]", index)?;
        }
        Ok(())
    }
}

// ============================================================================
// VALIDATION
// ============================================================================

/// Structural or prop-level problem in a page's section tree.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageValidationError {
    #[error("Unknown component type '{component_type}' at {path}")]
    UnknownComponent {
        path: SectionPath,
        component_type: String,
    },

    #[error("Malformed children at {path}: {reason}")]
    MalformedChildren { path: SectionPath, reason: String },

    #[error("Component '{parent}' does not allow child '{child}' at {path} (allowed: {})", .allowed.join(", "))]
    DisallowedChild {
        path: SectionPath,
        parent: String,
        child: String,
        allowed: Vec<String>,
    },

    #[error("Missing required prop '{prop}' on '{component_type}' at {path}")]
    MissingRequiredProp {
        path: SectionPath,
        component_type: String,
        prop: String,
    },

    #[error("Prop '{prop}' on '{component_type}' at {path} should be {expected}, got {found}")]
    PropTypeMismatch {
        path: SectionPath,
        component_type: String,
        prop: String,
        expected: PropType,
        found: String,
    },
}

impl PageValidationError {
    pub fn path(&self) -> &SectionPath {
        match self {
            Self::UnknownComponent { path, .. }
            | Self::MalformedChildren { path, .. }
            | Self::DisallowedChild { path, .. }
            | Self::MissingRequiredProp { path, .. }
            | Self::PropTypeMismatch { path, .. } => path,
        }
    }
}

// ============================================================================
// PAGE SERVICE
// ============================================================================

/// Errors from [`crate::service::PageService`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PageError {
    #[error("Page not found: {route}")]
    NotFound { route: String },

    #[error("Invalid page: {0}")]
    Invalid(#[from] PageValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] DbError),
}

pub type PageResult<T> = Result<T, PageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_path_display() {
        assert_eq!(SectionPath::root(2).to_string(), "sections[2]");
        assert_eq!(
            SectionPath::root(0).child(1).child(3).to_string(),
            "sections[0].children[1].children[3]"
        );
        assert_eq!(SectionPath::default().to_string(), "sections");
    }

    #[test]
    fn test_disallowed_child_message_names_both_types() {
        let err = PageValidationError::DisallowedChild {
            path: SectionPath::root(0).child(0),
            parent: "product_grid".to_string(),
            child: "checkout_widget".to_string(),
            allowed: vec!["hero".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("product_grid"));
        assert!(msg.contains("checkout_widget"));
        assert!(msg.contains("allowed: hero"));
    }

    #[test]
    fn test_validation_error_serializes_with_kind() -> Result<(), serde_json::Error> {
        let err = PageValidationError::UnknownComponent {
            path: SectionPath::root(1),
            component_type: "marquee".to_string(),
        };
        let value = serde_json::to_value(&err)?;
        assert_eq!(value["kind"], "unknown_component");
        assert_eq!(value["path"], serde_json::json!([1]));
        Ok(())
    }
}
