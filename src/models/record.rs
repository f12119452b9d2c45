//! Live tracked-entity state
//!
//! A `Record` is the audit engine's view of an entity owned by the external
//! data layer: its type tag, id, attribute snapshot, the transient audit
//! comment the caller attached to the pending save, and the live version
//! counter.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ids::RecordId;

/// Attribute name to value snapshot
pub type Attributes = Map<String, Value>;

/// A tracked entity as seen by the audit engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Registered type tag (e.g. "Order")
    pub entity_type: String,

    /// Identifier in the owning data layer
    pub id: RecordId,

    /// Current attribute values
    pub attributes: Attributes,

    /// Comment attached to the pending mutation; cleared once audited
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_comment: Option<String>,

    /// Version of the latest audit record written for this entity, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
}

impl Record {
    /// Create a record from an attribute snapshot
    pub fn new(entity_type: impl Into<String>, id: impl Into<RecordId>, attributes: Attributes) -> Self {
        Self {
            entity_type: entity_type.into(),
            id: id.into(),
            attributes,
            audit_comment: None,
            version: None,
        }
    }

    /// Build a record from a JSON object literal.
    ///
    /// Non-object values produce an empty attribute set.
    pub fn from_json(entity_type: impl Into<String>, id: impl Into<RecordId>, value: Value) -> Self {
        let attributes = match value {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self::new(entity_type, id, attributes)
    }

    /// Attach a comment to the next audited mutation
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.audit_comment = Some(comment.into());
        self
    }

    /// Get an attribute value
    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.attributes.get(attribute)
    }

    /// Set an attribute value
    pub fn set(&mut self, attribute: impl Into<String>, value: Value) {
        self.attributes.insert(attribute.into(), value);
    }

    /// The pending comment, if it has any non-whitespace content
    pub fn comment(&self) -> Option<&str> {
        self.audit_comment
            .as_deref()
            .filter(|comment| !comment.trim().is_empty())
    }
}

/// Render an attribute value as display text.
///
/// Strings are shown without quotes; `null` has no display text.
pub fn display_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json() {
        let record = Record::from_json("Order", 1u64, json!({"status": "pending"}));
        assert_eq!(record.entity_type, "Order");
        assert_eq!(record.id.as_str(), "1");
        assert_eq!(record.get("status"), Some(&json!("pending")));
        assert!(record.version.is_none());
    }

    #[test]
    fn test_from_json_non_object() {
        let record = Record::from_json("Order", 1u64, json!([1, 2]));
        assert!(record.attributes.is_empty());
    }

    #[test]
    fn test_blank_comment_is_none() {
        let record = Record::from_json("Order", 1u64, json!({})).with_comment("   ");
        assert!(record.comment().is_none());

        let record = record.with_comment("shipped early");
        assert_eq!(record.comment(), Some("shipped early"));
    }

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(&json!("Gadget")), Some("Gadget".to_string()));
        assert_eq!(display_value(&json!(12)), Some("12".to_string()));
        assert_eq!(display_value(&json!(null)), None);
    }
}
