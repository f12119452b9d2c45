//! Notification rule definitions
//!
//! Rules are a tagged union so a rule set loaded from configuration is
//! checked once, at registration, instead of on every evaluation.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{AuditError, AuditResult};

fn default_content_attribute() -> String {
    "content".to_string()
}

/// Rule for entities attached to a parent of variable type.
///
/// The parent is identified by the `<parent>_type` and `<parent>_id`
/// attributes of the audited entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolymorphicRule {
    /// Title prefix; the entity's display name when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Association name, e.g. "commentable"
    pub parent: String,

    /// Free-text attribute previewed in the notification comment
    #[serde(default = "default_content_attribute")]
    pub content_attribute: String,
}

impl PolymorphicRule {
    pub fn new(parent: impl Into<String>) -> Self {
        Self {
            title: None,
            parent: parent.into(),
            content_attribute: default_content_attribute(),
        }
    }

    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn content_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.content_attribute = attribute.into();
        self
    }

    pub fn type_column(&self) -> String {
        format!("{}_type", self.parent)
    }

    pub fn id_column(&self) -> String {
        format!("{}_id", self.parent)
    }
}

/// Title enrichment from a record referenced by a watched attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignLookup {
    /// Type tag of the referenced record
    pub entity_type: String,
    /// Attribute of the referenced record shown in the title
    pub display_attribute: String,
}

/// Rule that fires when all of its watched attributes changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeSetRule {
    /// Attributes that must all be present in the change set
    pub watched: Vec<String>,

    /// Notification title; the entity's default title when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Notification comment; `<<here>>` is replaced by the display name
    pub body: String,

    /// Looks up the record referenced by the first watched attribute
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_lookup: Option<ForeignLookup>,
}

impl AttributeSetRule {
    pub fn new<I, S>(watched: I, body: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            watched: watched.into_iter().map(Into::into).collect(),
            title: None,
            body: body.into(),
            foreign_lookup: None,
        }
    }

    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_lookup(
        mut self,
        entity_type: impl Into<String>,
        display_attribute: impl Into<String>,
    ) -> Self {
        self.foreign_lookup = Some(ForeignLookup {
            entity_type: entity_type.into(),
            display_attribute: display_attribute.into(),
        });
        self
    }
}

/// A single notification rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeRule {
    Polymorphic(PolymorphicRule),
    AttributeSet(AttributeSetRule),
}

impl From<PolymorphicRule> for ChangeRule {
    fn from(rule: PolymorphicRule) -> Self {
        Self::Polymorphic(rule)
    }
}

impl From<AttributeSetRule> for ChangeRule {
    fn from(rule: AttributeSetRule) -> Self {
        Self::AttributeSet(rule)
    }
}

impl ChangeRule {
    /// Check the rule's own shape.
    ///
    /// Cross-type references are checked by the registry.
    pub fn validate(&self) -> AuditResult<()> {
        match self {
            ChangeRule::Polymorphic(rule) => {
                if rule.parent.trim().is_empty() {
                    return Err(AuditError::Config(
                        "polymorphic rule needs a parent association name".into(),
                    ));
                }
                if rule.content_attribute.trim().is_empty() {
                    return Err(AuditError::Config(
                        "polymorphic rule needs a content attribute".into(),
                    ));
                }
            }
            ChangeRule::AttributeSet(rule) => {
                if rule.watched.is_empty() {
                    return Err(AuditError::Config(
                        "attribute rule must watch at least one attribute".into(),
                    ));
                }
                let mut seen = HashSet::new();
                for attribute in &rule.watched {
                    if attribute.trim().is_empty() {
                        return Err(AuditError::Config(
                            "attribute rule watches a blank attribute name".into(),
                        ));
                    }
                    if !seen.insert(attribute.as_str()) {
                        return Err(AuditError::Config(format!(
                            "attribute rule watches '{}' twice",
                            attribute
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}
