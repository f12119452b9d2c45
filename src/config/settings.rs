//! Audit settings
//!
//! Global switches, default comment templates and the per-type audit
//! configurations, persisted as config.json.

use serde::{Deserialize, Serialize};

use super::paths::AuditPaths;
use crate::context::AuditContext;
use crate::error::{AuditError, AuditResult};
use crate::models::{CommentTemplates, EntityConfig};
use crate::registry::TypeRegistry;

/// Settings for audit-trail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Whether auditing starts enabled for new contexts
    #[serde(default = "default_auditing_enabled")]
    pub auditing_enabled: bool,

    /// Comment templates for types without their own
    #[serde(default)]
    pub comments: CommentTemplates,

    /// Tracked entity types
    #[serde(default)]
    pub entity_types: Vec<EntityConfig>,
}

fn default_schema_version() -> u32 {
    1
}

fn default_auditing_enabled() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            auditing_enabled: default_auditing_enabled(),
            comments: CommentTemplates::default(),
            entity_types: Vec::new(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or default settings if the file doesn't exist
    pub fn load_or_create(paths: &AuditPaths) -> Result<Self, AuditError> {
        let settings_path = paths.settings_file();

        if !settings_path.exists() {
            // Don't save yet - let caller decide when to persist
            return Ok(Settings::default());
        }

        let contents = std::fs::read_to_string(&settings_path)
            .map_err(|e| AuditError::Io(format!("Failed to read settings file: {}", e)))?;

        serde_json::from_str(&contents)
            .map_err(|e| AuditError::Config(format!("Failed to parse settings file: {}", e)))
    }

    /// Save settings to disk
    pub fn save(&self, paths: &AuditPaths) -> Result<(), AuditError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| AuditError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| AuditError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }

    /// A fresh context honoring `auditing_enabled`
    pub fn context(&self) -> AuditContext {
        AuditContext::new(self.auditing_enabled)
    }

    /// Build the type registry.
    ///
    /// `register_lookups` runs first so rules referencing other types can be
    /// validated against the lookups it installs.
    pub fn build_registry<F>(&self, register_lookups: F) -> AuditResult<TypeRegistry>
    where
        F: FnOnce(&mut TypeRegistry),
    {
        let mut registry = TypeRegistry::with_templates(self.comments.clone());
        register_lookups(&mut registry);
        registry.register_all(self.entity_types.iter().cloned())?;
        Ok(registry)
    }

    /// Configuration of one tracked type
    pub fn entity_config(&self, entity_type: &str) -> Option<&EntityConfig> {
        self.entity_types
            .iter()
            .find(|config| config.entity_type == entity_type)
    }
}
