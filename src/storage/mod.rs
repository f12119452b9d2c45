//! Storage layer for audit-trail
//!
//! Provides the audit store contract and its JSON file implementation with
//! atomic writes and automatic directory creation.

pub mod audits;
pub mod file_io;

pub use audits::{AuditRepository, AuditStore};
pub use file_io::{read_json, write_json_atomic};

use crate::config::paths::AuditPaths;
use crate::error::AuditError;

/// Main storage coordinator
pub struct Storage {
    pub audits: AuditRepository,
}

impl Storage {
    /// Create a new Storage instance
    pub fn new(paths: AuditPaths) -> Result<Self, AuditError> {
        paths.ensure_directories()?;

        Ok(Self {
            audits: AuditRepository::new(paths.audits_file()),
        })
    }

    /// Load all data from disk
    pub fn load_all(&mut self) -> Result<(), AuditError> {
        self.audits.load()
    }
}
