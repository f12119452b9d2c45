//! Per-type audit configuration
//!
//! Describes how one tracked entity type is audited: which attributes are
//! ignored, which actions are recorded, its ordered notification rule set
//! and the attributes used for titles, receivers and grouping.

use serde::{Deserialize, Serialize};

use crate::audit::{Action, AttributeFilter};
use crate::rules::ChangeRule;

/// Grouping parent declared by an entity type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Association {
    /// Type tag of the parent
    pub entity_type: String,
    /// Attribute of the audited entity holding the parent id
    pub foreign_key: String,
}

/// Default comment templates, one per action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentTemplates {
    #[serde(default = "default_create_comment")]
    pub create: String,
    #[serde(default = "default_update_comment")]
    pub update: String,
    #[serde(default = "default_destroy_comment")]
    pub destroy: String,
}

fn default_create_comment() -> String {
    "<<here>> was created".to_string()
}

fn default_update_comment() -> String {
    "<<here>> was updated".to_string()
}

fn default_destroy_comment() -> String {
    "<<here>> was destroyed".to_string()
}

impl Default for CommentTemplates {
    fn default() -> Self {
        Self {
            create: default_create_comment(),
            update: default_update_comment(),
            destroy: default_destroy_comment(),
        }
    }
}

impl CommentTemplates {
    pub fn for_action(&self, action: Action) -> &str {
        match action {
            Action::Create => &self.create,
            Action::Update => &self.update,
            Action::Destroy => &self.destroy,
        }
    }
}

fn all_actions() -> Vec<Action> {
    Action::ALL.to_vec()
}

/// Audit configuration of one tracked entity type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityConfig {
    /// Type tag (e.g. "Order")
    pub entity_type: String,

    /// Name used in titles and templates; defaults to the type tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Attributes ignored on top of the default set
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignored_attributes: Vec<String>,

    /// Only audit these attributes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub only: Option<Vec<String>>,

    /// Actions that produce audit records
    #[serde(default = "all_actions")]
    pub on: Vec<Action>,

    /// Ordered notification rules; the first match wins
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<ChangeRule>,

    /// Whether every audited mutation needs a comment
    #[serde(default)]
    pub comment_required: bool,

    /// Attribute shown as the entity's title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_attribute: Option<String>,

    /// Attribute holding the id of the notification receiver
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver_attribute: Option<String>,

    /// Grouping parent recorded on every audit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub associated_with: Option<Association>,

    /// Per-type comment templates; fall back to the global defaults
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<CommentTemplates>,
}

impl EntityConfig {
    /// Create a configuration with defaults for `entity_type`
    pub fn new(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            display_name: None,
            ignored_attributes: Vec::new(),
            only: None,
            on: all_actions(),
            rules: Vec::new(),
            comment_required: false,
            title_attribute: None,
            receiver_attribute: None,
            associated_with: None,
            comments: None,
        }
    }

    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.entity_type)
    }

    /// The attribute filter built from the ignore list and `only`
    pub fn filter(&self) -> AttributeFilter {
        let filter = AttributeFilter::with_ignored(self.ignored_attributes.iter().cloned());
        match &self.only {
            Some(only) => filter.only(only.iter().cloned()),
            None => filter,
        }
    }

    pub fn audits_action(&self, action: Action) -> bool {
        self.on.contains(&action)
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn ignoring<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored_attributes
            .extend(attributes.into_iter().map(Into::into));
        self
    }

    pub fn only<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.only = Some(attributes.into_iter().map(Into::into).collect());
        self
    }

    pub fn on(mut self, actions: &[Action]) -> Self {
        self.on = actions.to_vec();
        self
    }

    pub fn rule(mut self, rule: ChangeRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn require_comment(mut self) -> Self {
        self.comment_required = true;
        self
    }

    pub fn title_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.title_attribute = Some(attribute.into());
        self
    }

    pub fn receiver_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.receiver_attribute = Some(attribute.into());
        self
    }

    pub fn associated_with(
        mut self,
        entity_type: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        self.associated_with = Some(Association {
            entity_type: entity_type.into(),
            foreign_key: foreign_key.into(),
        });
        self
    }

    pub fn comments(mut self, templates: CommentTemplates) -> Self {
        self.comments = Some(templates);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config = EntityConfig::new("Order");
        assert_eq!(config.display_name(), "Order");
        assert!(config.audits_action(Action::Create));
        assert!(config.audits_action(Action::Destroy));
        assert!(!config.comment_required);
        assert!(!config.filter().audits("updated_at"));
    }

    #[test]
    fn test_filter_from_config() {
        let config = EntityConfig::new("Order")
            .ignoring(["internal_note"])
            .only(["status", "internal_note"]);
        let filter = config.filter();
        assert!(filter.audits("status"));
        assert!(!filter.audits("internal_note"));
        assert!(!filter.audits("total"));
    }

    #[test]
    fn test_deserialize_minimal_config() {
        let config: EntityConfig =
            serde_json::from_value(json!({"entity_type": "Order", "on": ["update"]})).unwrap();
        assert_eq!(config.entity_type, "Order");
        assert_eq!(config.on, vec![Action::Update]);
        assert!(config.rules.is_empty());
    }

    #[test]
    fn test_comment_templates() {
        let templates = CommentTemplates::default();
        assert_eq!(templates.for_action(Action::Create), "<<here>> was created");
        assert_eq!(templates.for_action(Action::Update), "<<here>> was updated");
    }
}
