//! Core data models for audit-trail
//!
//! Identifiers, the live record view of tracked entities, and the per-type
//! audit configuration.

pub mod config;
pub mod ids;
pub mod record;

pub use config::{Association, CommentTemplates, EntityConfig};
pub use ids::{AuditId, RecordId};
pub use record::{display_value, Attributes, Record};
