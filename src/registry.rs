//! Registry of tracked entity types
//!
//! Holds each type's audit configuration and the typed lookup functions the
//! rule evaluator uses to resolve parents and referenced records. Everything
//! is registered up front; the registry is read-only while auditing.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{AuditError, AuditResult};
use crate::models::{CommentTemplates, EntityConfig, Record, RecordId};
use crate::rules::ChangeRule;

/// Finds a live record of one type by id
pub type Lookup = Arc<dyn Fn(&RecordId) -> Option<Record> + Send + Sync>;

/// Configuration and lookups for every tracked type
#[derive(Default)]
pub struct TypeRegistry {
    configs: HashMap<String, EntityConfig>,
    lookups: HashMap<String, Lookup>,
    templates: CommentTemplates,
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut lookups: Vec<&String> = self.lookups.keys().collect();
        lookups.sort();
        f.debug_struct("TypeRegistry")
            .field("configs", &self.configs)
            .field("lookups", &lookups)
            .field("templates", &self.templates)
            .finish()
    }
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `templates` for types without their own comment templates
    pub fn with_templates(templates: CommentTemplates) -> Self {
        Self {
            templates,
            ..Self::default()
        }
    }

    /// Register the lookup for `entity_type`.
    ///
    /// Lookups must be in place before any configuration whose rules
    /// reference the type.
    pub fn register_lookup<F>(&mut self, entity_type: impl Into<String>, lookup: F)
    where
        F: Fn(&RecordId) -> Option<Record> + Send + Sync + 'static,
    {
        self.lookups.insert(entity_type.into(), Arc::new(lookup));
    }

    /// Register a tracked type after validating its rule set
    pub fn register(&mut self, config: EntityConfig) -> AuditResult<()> {
        if config.entity_type.trim().is_empty() {
            return Err(AuditError::Config("entity type name cannot be empty".into()));
        }
        if self.configs.contains_key(&config.entity_type) {
            return Err(AuditError::Config(format!(
                "entity type '{}' is already registered",
                config.entity_type
            )));
        }

        for rule in &config.rules {
            rule.validate().map_err(|e| {
                AuditError::Config(format!("{} rule set: {}", config.entity_type, e))
            })?;

            if let ChangeRule::AttributeSet(rule) = rule {
                if let Some(lookup) = &rule.foreign_lookup {
                    if !self.lookups.contains_key(&lookup.entity_type) {
                        return Err(AuditError::Config(format!(
                            "{} rule set: no lookup registered for '{}'",
                            config.entity_type, lookup.entity_type
                        )));
                    }
                }
            }
        }

        tracing::debug!(
            entity_type = %config.entity_type,
            rules = config.rules.len(),
            "registered audited type"
        );
        self.configs.insert(config.entity_type.clone(), config);
        Ok(())
    }

    /// Register every configuration, stopping at the first invalid one
    pub fn register_all<I>(&mut self, configs: I) -> AuditResult<()>
    where
        I: IntoIterator<Item = EntityConfig>,
    {
        for config in configs {
            self.register(config)?;
        }
        Ok(())
    }

    pub fn config(&self, entity_type: &str) -> Option<&EntityConfig> {
        self.configs.get(entity_type)
    }

    /// Configuration of `entity_type`, or an error if it is not tracked
    pub fn require(&self, entity_type: &str) -> AuditResult<&EntityConfig> {
        self.config(entity_type)
            .ok_or_else(|| AuditError::not_found("Audited type", entity_type))
    }

    pub fn is_registered(&self, entity_type: &str) -> bool {
        self.configs.contains_key(entity_type)
    }

    /// Registered type tags in sorted order
    pub fn entity_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.configs.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    pub fn has_lookup(&self, entity_type: &str) -> bool {
        self.lookups.contains_key(entity_type)
    }

    /// Look up a live record; `None` if the type has no lookup or no match
    pub fn find(&self, entity_type: &str, id: &RecordId) -> Option<Record> {
        self.lookups.get(entity_type).and_then(|lookup| lookup(id))
    }

    /// Comment templates that apply to `config`
    pub fn templates_for<'a>(&'a self, config: &'a EntityConfig) -> &'a CommentTemplates {
        config.comments.as_ref().unwrap_or(&self.templates)
    }

    /// Display name of a type, falling back to the tag itself
    pub fn display_name<'a>(&'a self, entity_type: &'a str) -> &'a str {
        self.config(entity_type)
            .map(EntityConfig::display_name)
            .unwrap_or(entity_type)
    }
}
