//! Audit record data structures
//!
//! Defines the immutable audit record written for every tracked mutation,
//! the action enum and the per-attribute change representation.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{AuditId, RecordId};

/// Types of mutations that can be audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Entity was created
    Create,
    /// Entity was updated
    Update,
    /// Entity was destroyed
    Destroy,
}

impl Action {
    pub const ALL: [Action; 3] = [Action::Create, Action::Update, Action::Destroy];
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Create => write!(f, "CREATE"),
            Action::Update => write!(f, "UPDATE"),
            Action::Destroy => write!(f, "DESTROY"),
        }
    }
}

/// One attribute's change inside an audit record.
///
/// Creates only carry `new`, destroys only carry `old`, updates carry both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeChange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new: Option<Value>,
}

impl AttributeChange {
    pub fn created(value: Value) -> Self {
        Self {
            old: None,
            new: Some(value),
        }
    }

    pub fn destroyed(value: Value) -> Self {
        Self {
            old: Some(value),
            new: None,
        }
    }

    pub fn updated(old: Value, new: Value) -> Self {
        Self {
            old: Some(old),
            new: Some(new),
        }
    }
}

/// A single immutable audit record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Unique identifier
    pub id: AuditId,

    /// Type tag of the audited entity
    pub entity_type: String,

    /// ID of the audited entity
    pub entity_id: RecordId,

    /// Mutation that produced this record
    pub action: Action,

    /// Attribute changes captured for the mutation
    pub audited_changes: BTreeMap<String, AttributeChange>,

    /// Notification text (rule body, truncated content or default comment)
    pub comment: String,

    /// Notification title
    pub title: String,

    /// Party the notification is addressed to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver_id: Option<RecordId>,

    /// Type tag of the grouping parent, if the entity type declares one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub associated_type: Option<String>,

    /// ID of the grouping parent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub associated_id: Option<RecordId>,

    /// Who made the change
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Per-entity sequence number, starting at 1
    pub version: u32,

    /// Whether the receiver has read the notification
    #[serde(default)]
    pub checked: bool,

    /// When the record was written (UTC)
    pub created_at: DateTime<Utc>,
}

impl AuditRecord {
    /// Value of `attribute` after this mutation, if the record carries one
    pub fn new_value(&self, attribute: &str) -> Option<&Value> {
        self.audited_changes
            .get(attribute)
            .and_then(|change| change.new.as_ref())
    }

    /// Value of `attribute` before this mutation, if the record carries one
    pub fn old_value(&self, attribute: &str) -> Option<&Value> {
        self.audited_changes
            .get(attribute)
            .and_then(|change| change.old.as_ref())
    }

    /// Whether this record was routed to a receiver
    pub fn is_notification(&self) -> bool {
        self.receiver_id.is_some()
    }

    /// Format the record for human-readable output
    pub fn format_human_readable(&self) -> String {
        let mut output = format!(
            "[{}] v{} {} {} {}",
            self.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.version,
            self.action,
            self.entity_type,
            self.entity_id
        );

        if !self.title.is_empty() {
            output.push_str(&format!(" ({})", self.title));
        }

        if let Some(user) = &self.user {
            output.push_str(&format!(" by {}", user));
        }

        if !self.comment.is_empty() {
            output.push_str(&format!("\n  Comment: {}", self.comment));
        }

        if let Some(summary) = super::changes::summarize(&self.audited_changes) {
            output.push_str(&format!("\n  Changes: {}", summary));
        }

        output
    }
}
