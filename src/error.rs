//! Custom error types for audit-trail
//!
//! This module defines the error hierarchy for the audit engine using thiserror
//! for ergonomic error definitions.

use thiserror::Error;

/// The main error type for audit-trail operations
#[derive(Error, Debug)]
pub enum AuditError {
    /// Configuration-related errors (including invalid rule sets)
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// A field-level validation failure that blocks the mutation
    #[error("Validation error on {field}: {message}")]
    Validation { field: &'static str, message: String },

    /// Writing an audit record failed; the enclosing mutation must roll back
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Storage errors (locks, file layout)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    /// A lifecycle hook aborted the audit write
    #[error("Hook '{hook}' failed: {message}")]
    Hook { hook: String, message: String },
}

impl AuditError {
    /// Create the error raised when a required audit comment is blank
    pub fn comment_required() -> Self {
        Self::Validation {
            field: "audit_comment",
            message: "can't be blank".into(),
        }
    }

    /// Create a "not found" error for an entity type
    pub fn not_found(entity_type: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Check if this is a persistence error
    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }
}

impl From<std::io::Error> for AuditError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for AuditError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for audit-trail operations
pub type AuditResult<T> = Result<T, AuditError>;
