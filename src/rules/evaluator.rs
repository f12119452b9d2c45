//! Rule evaluation
//!
//! Walks a type's rule set in order and turns the first matching rule into a
//! notification payload. Later rules are never consulted once one matches.

use serde::Serialize;

use super::resolve::{
    attribute_id, attribute_text, default_title, find_record, receiver_id, title_text,
    try_resolve, ResolutionError,
};
use super::rule::{AttributeSetRule, ChangeRule, PolymorphicRule};
use crate::audit::{format_template, truncate_content, ChangeSet};
use crate::models::{display_value, EntityConfig, Record, RecordId};
use crate::registry::TypeRegistry;

/// Title, comment and receiver of an audit record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationPayload {
    pub title: String,
    pub comment: String,
    pub receiver_id: Option<RecordId>,
}

/// Evaluates rule sets against change sets
pub struct RuleEvaluator<'a> {
    registry: &'a TypeRegistry,
}

impl<'a> RuleEvaluator<'a> {
    pub fn new(registry: &'a TypeRegistry) -> Self {
        Self { registry }
    }

    /// Payload of the first rule in `config.rules` that matches `changes`
    pub fn evaluate(
        &self,
        changes: &ChangeSet,
        config: &EntityConfig,
        entity: &Record,
    ) -> Option<NotificationPayload> {
        config.rules.iter().enumerate().find_map(|(index, rule)| {
            let payload = match rule {
                ChangeRule::Polymorphic(rule) => Some(self.polymorphic(rule, config, entity)),
                ChangeRule::AttributeSet(rule) => self.attribute_set(rule, changes, config, entity),
            }?;
            tracing::debug!(
                entity_type = %entity.entity_type,
                entity_id = %entity.id,
                rule = index,
                "notification rule matched"
            );
            Some(payload)
        })
    }

    fn polymorphic(
        &self,
        rule: &PolymorphicRule,
        config: &EntityConfig,
        entity: &Record,
    ) -> NotificationPayload {
        let parent = try_resolve("polymorphic parent", || {
            let parent_type = attribute_text(entity, &rule.type_column())?;
            let parent_id = attribute_id(entity, &rule.id_column())?;
            find_record(self.registry, &parent_type, &parent_id)
        });
        let parent_config = parent
            .as_ref()
            .and_then(|parent| self.registry.config(&parent.entity_type));

        let title = try_resolve("polymorphic title", || {
            let parent = parent.as_ref().ok_or_else(|| missing_parent(rule, entity))?;
            let parent_config = parent_config.ok_or_else(|| missing_parent(rule, entity))?;
            let display = title_text(parent_config, parent)?;
            let prefix = rule
                .title
                .as_deref()
                .map(|title| format_template(title, config.display_name()))
                .unwrap_or_else(|| config.display_name().to_string());
            Ok(format!("{} - {}[{}]", prefix, parent.entity_type, display))
        })
        .unwrap_or_else(|| config.display_name().to_string());

        let content = try_resolve("polymorphic content", || {
            attribute_text(entity, &rule.content_attribute)
        })
        .unwrap_or_default();

        let receiver = try_resolve("polymorphic receiver", || {
            let parent = parent.as_ref().ok_or_else(|| missing_parent(rule, entity))?;
            let parent_config = parent_config.ok_or_else(|| missing_parent(rule, entity))?;
            receiver_id(parent_config, parent)
        });

        NotificationPayload {
            title,
            comment: truncate_content(&content),
            receiver_id: receiver,
        }
    }

    fn attribute_set(
        &self,
        rule: &AttributeSetRule,
        changes: &ChangeSet,
        config: &EntityConfig,
        entity: &Record,
    ) -> Option<NotificationPayload> {
        if !changes.contains_all(rule.watched.as_slice()) {
            return None;
        }

        let base = match &rule.title {
            Some(title) => format_template(title, config.display_name()),
            None => default_title(config, entity),
        };

        let title = match &rule.foreign_lookup {
            None => base,
            Some(lookup) => try_resolve("foreign lookup", || {
                let attribute = rule.watched.first().ok_or_else(|| {
                    ResolutionError::NotConfigured {
                        entity_type: entity.entity_type.clone(),
                        selector: "watched attribute",
                    }
                })?;
                let id = changes
                    .new_value(attribute)
                    .and_then(RecordId::from_value)
                    .ok_or_else(|| ResolutionError::MissingAttribute {
                        entity_type: entity.entity_type.clone(),
                        attribute: attribute.clone(),
                    })?;
                let referenced = find_record(self.registry, &lookup.entity_type, &id)?;
                let display = attribute_text(&referenced, &lookup.display_attribute)?;
                Ok(format!("{}[{}]", base, display))
            })
            .unwrap_or_else(|| config.display_name().to_string()),
        };

        Some(NotificationPayload {
            title,
            comment: format_template(&rule.body, config.display_name()),
            receiver_id: try_resolve("receiver", || receiver_id(config, entity)),
        })
    }
}

fn missing_parent(rule: &PolymorphicRule, entity: &Record) -> ResolutionError {
    ResolutionError::MissingRecord {
        entity_type: entity
            .get(&rule.type_column())
            .and_then(display_value)
            .unwrap_or_else(|| rule.parent.clone()),
        id: entity
            .get(&rule.id_column())
            .and_then(display_value)
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{extract, Action, AttributeFilter};
    use serde_json::{json, Value};

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry.register_lookup("Widget", |id| {
            (id.as_str() == "7").then(|| {
                Record::from_json("Widget", "7", json!({"name": "Sprocket", "owner_id": 99}))
            })
        });
        registry.register_lookup("User", |id| {
            (id.as_str() == "5").then(|| Record::from_json("User", "5", json!({"name": "Dana"})))
        });
        registry
            .register(
                EntityConfig::new("Widget")
                    .title_attribute("name")
                    .receiver_attribute("owner_id"),
            )
            .unwrap();
        registry
    }

    fn update(before: Value, after: Value) -> ChangeSet {
        extract(
            Action::Update,
            after.as_object().unwrap(),
            Some(before.as_object().unwrap()),
            &AttributeFilter::default(),
        )
    }

    fn comment() -> Record {
        Record::from_json(
            "Comment",
            "1",
            json!({
                "content": "Hello World, this is long text",
                "commentable_type": "Widget",
                "commentable_id": 7,
                "author_id": 3
            }),
        )
    }

    #[test]
    fn test_attribute_rule_matches_order_example() {
        let registry = registry();
        let config = EntityConfig::new("Order").rule(
            AttributeSetRule::new(["status"], "Order status updated")
                .titled("Status Changed")
                .into(),
        );
        let entity = Record::from_json("Order", "1", json!({"status": "shipped"}));
        let changes = update(json!({"status": "pending"}), json!({"status": "shipped"}));

        let payload = RuleEvaluator::new(&registry)
            .evaluate(&changes, &config, &entity)
            .unwrap();

        assert_eq!(payload.title, "Status Changed");
        assert_eq!(payload.comment, "Order status updated");
        assert_eq!(payload.receiver_id, None);
    }

    #[test]
    fn test_attribute_rule_requires_every_watched_attribute() {
        let registry = registry();
        let config = EntityConfig::new("Order")
            .rule(AttributeSetRule::new(["status", "carrier"], "Shipped").into());
        let entity = Record::from_json("Order", "1", json!({"status": "shipped"}));
        let changes = update(json!({"status": "pending"}), json!({"status": "shipped"}));

        assert!(RuleEvaluator::new(&registry)
            .evaluate(&changes, &config, &entity)
            .is_none());
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let registry = registry();
        let config = EntityConfig::new("Order")
            .receiver_attribute("owner_id")
            .rule(AttributeSetRule::new(["total"], "Total changed").into())
            .rule(AttributeSetRule::new(["status"], "First").titled("A").into())
            .rule(AttributeSetRule::new(["status"], "Second").titled("B").into());
        let entity = Record::from_json("Order", "1", json!({"status": "shipped", "owner_id": 4}));
        let changes = update(json!({"status": "pending"}), json!({"status": "shipped"}));

        let payload = RuleEvaluator::new(&registry)
            .evaluate(&changes, &config, &entity)
            .unwrap();
        assert_eq!(payload.title, "A");
        assert_eq!(payload.comment, "First");
        assert_eq!(payload.receiver_id, Some(RecordId::from("4")));
    }

    #[test]
    fn test_untitled_rule_uses_entity_title() {
        let registry = registry();
        let config = EntityConfig::new("Order")
            .title_attribute("number")
            .rule(AttributeSetRule::new(["status"], "<<here>> moved on").into());
        let entity = Record::from_json("Order", "1", json!({"status": "shipped", "number": "SO-9"}));
        let changes = update(json!({"status": "pending"}), json!({"status": "shipped"}));

        let payload = RuleEvaluator::new(&registry)
            .evaluate(&changes, &config, &entity)
            .unwrap();
        assert_eq!(payload.title, "SO-9");
        assert_eq!(payload.comment, "Order moved on");
    }

    #[test]
    fn test_foreign_lookup_suffix() {
        let registry = registry();
        let config = EntityConfig::new("Task").rule(
            AttributeSetRule::new(["assignee_id"], "Task reassigned")
                .titled("Assigned")
                .with_lookup("User", "name")
                .into(),
        );
        let entity = Record::from_json("Task", "1", json!({"assignee_id": 5}));
        let changes = update(json!({"assignee_id": 2}), json!({"assignee_id": 5}));

        let payload = RuleEvaluator::new(&registry)
            .evaluate(&changes, &config, &entity)
            .unwrap();
        assert_eq!(payload.title, "Assigned[Dana]");
    }

    #[test]
    fn test_foreign_lookup_failure_falls_back_to_type_name() {
        let registry = registry();
        let config = EntityConfig::new("Task").rule(
            AttributeSetRule::new(["assignee_id"], "Task reassigned")
                .titled("Assigned")
                .with_lookup("User", "name")
                .into(),
        );
        let entity = Record::from_json("Task", "1", json!({"assignee_id": 404}));
        let changes = update(json!({"assignee_id": 2}), json!({"assignee_id": 404}));

        let payload = RuleEvaluator::new(&registry)
            .evaluate(&changes, &config, &entity)
            .unwrap();
        assert_eq!(payload.title, "Task");
        assert_eq!(payload.comment, "Task reassigned");
    }

    #[test]
    fn test_polymorphic_rule_resolves_parent() {
        let registry = registry();
        let config = EntityConfig::new("Comment")
            .receiver_attribute("author_id")
            .rule(PolymorphicRule::new("commentable").titled("New comment").into());
        let entity = comment();
        let changes = extract(
            Action::Create,
            &entity.attributes,
            None,
            &AttributeFilter::default(),
        );

        let payload = RuleEvaluator::new(&registry)
            .evaluate(&changes, &config, &entity)
            .unwrap();

        assert_eq!(payload.title, "New comment - Widget[Sprocket]");
        assert_eq!(payload.comment, "Hello World, this is ...");
        // Receiver comes from the parent, not the comment author
        assert_eq!(payload.receiver_id, Some(RecordId::from("99")));
    }

    #[test]
    fn test_polymorphic_rule_matches_without_changes() {
        let registry = registry();
        let config = EntityConfig::new("Comment").rule(PolymorphicRule::new("commentable").into());

        let payload = RuleEvaluator::new(&registry)
            .evaluate(&ChangeSet::default(), &config, &comment())
            .unwrap();
        assert_eq!(payload.title, "Comment - Widget[Sprocket]");
    }

    #[test]
    fn test_polymorphic_missing_parent_falls_back() {
        let registry = registry();
        let config = EntityConfig::new("Comment")
            .rule(PolymorphicRule::new("commentable").titled("New comment").into());
        let mut entity = comment();
        entity.set("commentable_id", json!(8));

        let payload = RuleEvaluator::new(&registry)
            .evaluate(&ChangeSet::default(), &config, &entity)
            .unwrap();
        assert_eq!(payload.title, "Comment");
        assert_eq!(payload.receiver_id, None);
        assert_eq!(payload.comment, "Hello World, this is ...");
    }

    #[test]
    fn test_no_rules_no_payload() {
        let registry = registry();
        let config = EntityConfig::new("Order");
        let entity = Record::from_json("Order", "1", json!({"status": "shipped"}));
        let changes = update(json!({"status": "pending"}), json!({"status": "shipped"}));
        assert!(RuleEvaluator::new(&registry)
            .evaluate(&changes, &config, &entity)
            .is_none());
    }

    #[test]
    fn test_lookup_rule_without_watched_attributes_falls_back() {
        let registry = registry();
        let config = EntityConfig::new("Task").rule(
            AttributeSetRule::new(Vec::<String>::new(), "Reassigned")
                .with_lookup("User", "name")
                .into(),
        );
        let entity = Record::from_json("Task", "1", json!({"assignee_id": 5}));
        let changes = extract(
            Action::Create,
            &entity.attributes,
            None,
            &AttributeFilter::default(),
        );

        let payload = RuleEvaluator::new(&registry)
            .evaluate(&changes, &config, &entity)
            .unwrap();
        assert_eq!(payload.title, "Task");
        assert_eq!(payload.comment, "Reassigned");
    }
}
