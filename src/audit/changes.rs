//! Change-set extraction
//!
//! Works out which attribute changes of a mutation are audit-worthy and
//! renders them as human-readable summaries.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use super::entry::{Action, AttributeChange};
use crate::models::Attributes;

/// Attributes that are never audited unless a type overrides the set
pub const DEFAULT_IGNORED_ATTRIBUTES: &[&str] = &[
    "id",
    "type",
    "lock_version",
    "created_at",
    "updated_at",
    "created_on",
    "updated_on",
];

/// Decides which attributes of an entity take part in auditing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeFilter {
    ignored: BTreeSet<String>,
    only: Option<BTreeSet<String>>,
}

impl Default for AttributeFilter {
    fn default() -> Self {
        Self {
            ignored: DEFAULT_IGNORED_ATTRIBUTES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            only: None,
        }
    }
}

impl AttributeFilter {
    /// Default ignore set plus `extra`
    pub fn with_ignored<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut filter = Self::default();
        filter.ignored.extend(extra.into_iter().map(Into::into));
        filter
    }

    /// Restrict auditing to the given attributes (still minus ignored ones)
    pub fn only<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.only = Some(attributes.into_iter().map(Into::into).collect());
        self
    }

    /// Whether changes to `attribute` are recorded
    pub fn audits(&self, attribute: &str) -> bool {
        if self.ignored.contains(attribute) {
            return false;
        }
        match &self.only {
            Some(only) => only.contains(attribute),
            None => true,
        }
    }

    /// The auditable subset of an attribute snapshot
    pub fn audited_attributes(&self, attributes: &Attributes) -> Attributes {
        attributes
            .iter()
            .filter(|(name, _)| self.audits(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}

/// Audit-worthy changes of one mutation
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChangeSet {
    changes: BTreeMap<String, AttributeChange>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Names of all changed attributes
    pub fn changed_attributes(&self) -> impl Iterator<Item = &str> {
        self.changes.keys().map(String::as_str)
    }

    /// Whether every one of `attributes` changed
    pub fn contains_all<S: AsRef<str>>(&self, attributes: &[S]) -> bool {
        attributes
            .iter()
            .all(|attribute| self.changes.contains_key(attribute.as_ref()))
    }

    /// The value an attribute changed to
    pub fn new_value(&self, attribute: &str) -> Option<&Value> {
        self.changes
            .get(attribute)
            .and_then(|change| change.new.as_ref())
    }

    pub fn get(&self, attribute: &str) -> Option<&AttributeChange> {
        self.changes.get(attribute)
    }

    pub fn as_map(&self) -> &BTreeMap<String, AttributeChange> {
        &self.changes
    }

    pub fn into_changes(self) -> BTreeMap<String, AttributeChange> {
        self.changes
    }
}

/// Compute the change set of a mutation.
///
/// `previous` is only consulted for updates; a missing previous snapshot
/// makes every current attribute count as changed from `null`.
pub fn extract(
    action: Action,
    current: &Attributes,
    previous: Option<&Attributes>,
    filter: &AttributeFilter,
) -> ChangeSet {
    let changes = match action {
        Action::Create => filter
            .audited_attributes(current)
            .into_iter()
            .map(|(name, value)| (name, AttributeChange::created(value)))
            .collect(),
        Action::Destroy => filter
            .audited_attributes(current)
            .into_iter()
            .map(|(name, value)| (name, AttributeChange::destroyed(value)))
            .collect(),
        Action::Update => {
            let empty = Attributes::new();
            let previous = previous.unwrap_or(&empty);
            let names: BTreeSet<&String> = current.keys().chain(previous.keys()).collect();

            names
                .into_iter()
                .filter(|name| filter.audits(name))
                .filter_map(|name| {
                    let old = previous.get(name).cloned().unwrap_or(Value::Null);
                    let new = current.get(name).cloned().unwrap_or(Value::Null);
                    (old != new).then(|| (name.clone(), AttributeChange::updated(old, new)))
                })
                .collect()
        }
    };

    ChangeSet { changes }
}

/// Summarize recorded changes as `attr: old -> new` pairs.
///
/// Returns `None` when there is nothing to show.
pub fn summarize(changes: &BTreeMap<String, AttributeChange>) -> Option<String> {
    let parts: Vec<String> = changes
        .iter()
        .map(|(name, change)| match (&change.old, &change.new) {
            (Some(old), Some(new)) => {
                format!("{}: {} -> {}", name, format_value(old), format_value(new))
            }
            (None, Some(new)) => format!("{}: (added) -> {}", name, format_value(new)),
            (Some(old), None) => format!("{}: {} -> (removed)", name, format_value(old)),
            (None, None) => format!("{}: (unchanged)", name),
        })
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

/// Format a JSON value for human-readable display
fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => {
            // Truncate long strings
            if s.chars().count() > 50 {
                let head: String = s.chars().take(47).collect();
                format!("\"{}...\"", head)
            } else {
                format!("\"{}\"", s)
            }
        }
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(obj) => format!("{{{} fields}}", obj.len()),
    }
}
