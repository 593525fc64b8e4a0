//! Page Validation
//!
//! Structural validation walks the whole section tree and enforces each
//! component's child whitelist. Prop validation checks authored props
//! against the applicable variant schema. Both run when a page is saved.

use crate::error::{PageValidationError, SectionPath};
use crate::registry::ComponentRegistry;
use crate::schema::json_kind;
use shopwright_core::{Section, VARIANT_PROP};

/// Check that every section is registered and that nesting respects each
/// parent's `allowed_children`. An empty whitelist puts no constraint on
/// child types.
pub fn validate_page(
    registry: &ComponentRegistry,
    sections: &[Section],
) -> Result<(), PageValidationError> {
    for (index, section) in sections.iter().enumerate() {
        validate_section(registry, section, &SectionPath::root(index))?;
    }
    Ok(())
}

fn validate_section(
    registry: &ComponentRegistry,
    section: &Section,
    path: &SectionPath,
) -> Result<(), PageValidationError> {
    let component = registry.get(&section.component_type).ok_or_else(|| {
        PageValidationError::UnknownComponent {
            path: path.clone(),
            component_type: section.component_type.clone(),
        }
    })?;

    let children = match section.children() {
        None => return Ok(()),
        Some(parsed) => parsed.map_err(|e| PageValidationError::MalformedChildren {
            path: path.clone(),
            reason: e.to_string(),
        })?,
    };

    for (index, child) in children.iter().enumerate() {
        let child_path = path.child(index);
        if !component.allows_child(&child.component_type) {
            return Err(PageValidationError::DisallowedChild {
                path: child_path,
                parent: component.component_type.clone(),
                child: child.component_type.clone(),
                allowed: component.allowed_children.clone(),
            });
        }
        validate_section(registry, child, &child_path)?;
    }
    Ok(())
}

/// Check authored props against the variant schema that applies to each
/// section: required props must be present unless they have a default, and
/// present values must loosely match their declared type. Unknown keys pass.
///
/// Assumes the tree already passed [`validate_page`]; sections that fail
/// structural checks are skipped here.
pub fn validate_section_props(
    registry: &ComponentRegistry,
    sections: &[Section],
) -> Result<(), PageValidationError> {
    for (index, section) in sections.iter().enumerate() {
        validate_props(registry, section, &SectionPath::root(index))?;
    }
    Ok(())
}

fn validate_props(
    registry: &ComponentRegistry,
    section: &Section,
    path: &SectionPath,
) -> Result<(), PageValidationError> {
    let Some(component) = registry.get(&section.component_type) else {
        return Ok(());
    };

    if let Some(schema) = component.schema_for(section) {
        for (name, definition) in schema {
            if name == VARIANT_PROP {
                continue;
            }
            match section.props.get(name) {
                None | Some(serde_json::Value::Null) => {
                    if definition.required && definition.default.is_none() {
                        return Err(PageValidationError::MissingRequiredProp {
                            path: path.clone(),
                            component_type: section.component_type.clone(),
                            prop: name.clone(),
                        });
                    }
                }
                Some(value) if !definition.prop_type.accepts(value) => {
                    return Err(PageValidationError::PropTypeMismatch {
                        path: path.clone(),
                        component_type: section.component_type.clone(),
                        prop: name.clone(),
                        expected: definition.prop_type,
                        found: json_kind(value).to_string(),
                    });
                }
                Some(_) => {}
            }
        }
    }

    if let Some(Ok(children)) = section.children() {
        for (index, child) in children.iter().enumerate() {
            validate_props(registry, child, &path.child(index))?;
        }
    }
    Ok(())
}
