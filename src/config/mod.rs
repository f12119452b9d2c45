//! Configuration module for audit-trail
//!
//! This module provides configuration management including:
//! - XDG-compliant path resolution
//! - Settings persistence (global switches, comment templates, tracked types)

pub mod paths;
pub mod settings;

pub use paths::AuditPaths;
pub use settings::Settings;
