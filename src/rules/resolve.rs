//! Attribute and record resolution with explicit fallback
//!
//! Title and receiver lookups may fail for ordinary reasons (a missing
//! attribute, an unregistered parent type, a dangling foreign key). Those
//! failures never abort an audit: callers go through [`try_resolve`] and
//! pick their fallback from the returned `Option`.

use thiserror::Error;

use crate::models::{display_value, EntityConfig, Record, RecordId};
use crate::registry::TypeRegistry;

/// Why a lookup could not be resolved
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("{entity_type} has no value for '{attribute}'")]
    MissingAttribute {
        entity_type: String,
        attribute: String,
    },

    #[error("{entity_type} does not configure a {selector}")]
    NotConfigured {
        entity_type: String,
        selector: &'static str,
    },

    #[error("no lookup matched {entity_type} {id}")]
    MissingRecord { entity_type: String, id: String },
}

/// Run a resolution, logging and discarding any failure
pub fn try_resolve<T>(what: &str, resolve: impl FnOnce() -> Result<T, ResolutionError>) -> Option<T> {
    match resolve() {
        Ok(value) => Some(value),
        Err(error) => {
            tracing::debug!(%error, "could not resolve {what}; using fallback");
            None
        }
    }
}

/// Display text of `attribute` on `record`
pub fn attribute_text(record: &Record, attribute: &str) -> Result<String, ResolutionError> {
    record
        .get(attribute)
        .and_then(display_value)
        .ok_or_else(|| ResolutionError::MissingAttribute {
            entity_type: record.entity_type.clone(),
            attribute: attribute.to_string(),
        })
}

/// Id stored in `attribute` on `record`
pub fn attribute_id(record: &Record, attribute: &str) -> Result<RecordId, ResolutionError> {
    record
        .get(attribute)
        .and_then(RecordId::from_value)
        .ok_or_else(|| ResolutionError::MissingAttribute {
            entity_type: record.entity_type.clone(),
            attribute: attribute.to_string(),
        })
}

/// Text of the type's title attribute on `record`
pub fn title_text(config: &EntityConfig, record: &Record) -> Result<String, ResolutionError> {
    let attribute = config
        .title_attribute
        .as_deref()
        .ok_or_else(|| ResolutionError::NotConfigured {
            entity_type: config.entity_type.clone(),
            selector: "title attribute",
        })?;
    attribute_text(record, attribute)
}

/// Receiver id stored on `record` according to its type's configuration
pub fn receiver_id(config: &EntityConfig, record: &Record) -> Result<RecordId, ResolutionError> {
    let attribute = config
        .receiver_attribute
        .as_deref()
        .ok_or_else(|| ResolutionError::NotConfigured {
            entity_type: config.entity_type.clone(),
            selector: "receiver attribute",
        })?;
    attribute_id(record, attribute)
}

/// Fetch a live record through the registry
pub fn find_record(
    registry: &TypeRegistry,
    entity_type: &str,
    id: &RecordId,
) -> Result<Record, ResolutionError> {
    registry
        .find(entity_type, id)
        .ok_or_else(|| ResolutionError::MissingRecord {
            entity_type: entity_type.to_string(),
            id: id.to_string(),
        })
}

/// The entity's own title, or its type's display name
pub fn default_title(config: &EntityConfig, record: &Record) -> String {
    try_resolve("title", || title_text(config, record))
        .unwrap_or_else(|| config.display_name().to_string())
}
