//! Audit record repository for JSON storage
//!
//! Manages loading and saving audit records to audits.json. Records are
//! append-only: the repository offers no way to change or remove one.

use std::path::PathBuf;
use std::sync::RwLock;

use crate::audit::AuditRecord;
use crate::error::{AuditError, AuditResult};
use crate::models::{AuditId, RecordId};

use super::file_io::{read_json, write_json_atomic};

/// Persistence contract for audit records
pub trait AuditStore {
    /// Persist a new record
    fn insert(&self, record: AuditRecord) -> AuditResult<()>;

    /// Records of one entity in ascending version order
    fn audits_for(&self, entity_type: &str, id: &RecordId) -> AuditResult<Vec<AuditRecord>>;

    /// Records grouped under a parent through `associated_with`
    fn associated_audits(&self, entity_type: &str, id: &RecordId)
        -> AuditResult<Vec<AuditRecord>>;

    /// Notification records addressed to `receiver`, newest first
    fn for_receiver(&self, receiver: &RecordId) -> AuditResult<Vec<AuditRecord>>;

    /// Highest version written for an entity
    fn latest_version(&self, entity_type: &str, id: &RecordId) -> AuditResult<Option<u32>> {
        Ok(self
            .audits_for(entity_type, id)?
            .last()
            .map(|record| record.version))
    }

    /// An entity's own records plus those grouped under it, oldest first
    fn own_and_associated_audits(
        &self,
        entity_type: &str,
        id: &RecordId,
    ) -> AuditResult<Vec<AuditRecord>> {
        let mut records = self.audits_for(entity_type, id)?;
        records.extend(self.associated_audits(entity_type, id)?);
        records.sort_by_key(|record| record.created_at);
        Ok(records)
    }
}

/// Serializable audit data structure
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct AuditData {
    audits: Vec<AuditRecord>,
}

/// Repository for audit record persistence
pub struct AuditRepository {
    path: Option<PathBuf>,
    data: RwLock<Vec<AuditRecord>>,
}

impl AuditRepository {
    /// Create a repository backed by `path`
    pub fn new(path: PathBuf) -> Self {
        Self {
            path: Some(path),
            data: RwLock::new(Vec::new()),
        }
    }

    /// Create a repository that never touches disk
    pub fn in_memory() -> Self {
        Self {
            path: None,
            data: RwLock::new(Vec::new()),
        }
    }

    /// Load records from disk
    pub fn load(&self) -> Result<(), AuditError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let file_data: AuditData = read_json(path)?;

        let mut data = self
            .data
            .write()
            .map_err(|e| AuditError::Storage(format!("Failed to acquire write lock: {}", e)))?;
        *data = file_data.audits;
        data.sort_by(|a, b| {
            (a.entity_type.as_str(), &a.entity_id, a.version)
                .cmp(&(b.entity_type.as_str(), &b.entity_id, b.version))
        });
        Ok(())
    }

    /// Number of stored records
    pub fn count(&self) -> Result<usize, AuditError> {
        Ok(self.read()?.len())
    }

    /// Look up a record by its id
    pub fn get(&self, id: &AuditId) -> Result<Option<AuditRecord>, AuditError> {
        Ok(self.read()?.iter().find(|r| &r.id == id).cloned())
    }

    /// Find a record by full id or by the short `aud-xxxxxxxx` form
    pub fn find(&self, query: &str) -> Result<Option<AuditRecord>, AuditError> {
        if let Ok(id) = AuditId::parse(query.strip_prefix("aud-").unwrap_or(query)) {
            return self.get(&id);
        }

        let prefix = query.strip_prefix("aud-").unwrap_or(query).to_lowercase();
        if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_hexdigit() || c == '-') {
            return Err(AuditError::Validation {
                field: "audit_id",
                message: format!("'{}' is not an audit id", query),
            });
        }

        let data = self.read()?;
        let mut matches = data
            .iter()
            .filter(|r| r.id.as_uuid().to_string().starts_with(&prefix));
        match (matches.next(), matches.next()) {
            (Some(record), None) => Ok(Some(record.clone())),
            (None, _) => Ok(None),
            (Some(_), Some(_)) => Err(AuditError::Validation {
                field: "audit_id",
                message: format!("'{}' matches more than one record", query),
            }),
        }
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Vec<AuditRecord>>, AuditError> {
        self.data
            .read()
            .map_err(|e| AuditError::Storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn filtered(&self, keep: impl Fn(&AuditRecord) -> bool) -> AuditResult<Vec<AuditRecord>> {
        Ok(self.read()?.iter().filter(|r| keep(r)).cloned().collect())
    }
}

impl AuditStore for AuditRepository {
    fn insert(&self, record: AuditRecord) -> AuditResult<()> {
        let mut data = self.data.write().map_err(|e| {
            AuditError::Persistence(format!("Failed to acquire write lock: {}", e))
        })?;

        let latest = data
            .iter()
            .filter(|r| r.entity_type == record.entity_type && r.entity_id == record.entity_id)
            .map(|r| r.version)
            .max()
            .unwrap_or(0);
        if record.version <= latest {
            return Err(AuditError::Persistence(format!(
                "version {} of {} {} is not after {}",
                record.version, record.entity_type, record.entity_id, latest
            )));
        }

        data.push(record);

        if let Some(path) = &self.path {
            let file_data = AuditData {
                audits: data.clone(),
            };
            if let Err(e) = write_json_atomic(path, &file_data) {
                data.pop();
                return Err(AuditError::Persistence(e.to_string()));
            }
        }
        Ok(())
    }

    fn audits_for(&self, entity_type: &str, id: &RecordId) -> AuditResult<Vec<AuditRecord>> {
        let mut records =
            self.filtered(|r| r.entity_type == entity_type && &r.entity_id == id)?;
        records.sort_by_key(|r| r.version);
        Ok(records)
    }

    fn associated_audits(
        &self,
        entity_type: &str,
        id: &RecordId,
    ) -> AuditResult<Vec<AuditRecord>> {
        let mut records = self.filtered(|r| {
            r.associated_type.as_deref() == Some(entity_type) && r.associated_id.as_ref() == Some(id)
        })?;
        records.sort_by_key(|r| r.created_at);
        Ok(records)
    }

    fn for_receiver(&self, receiver: &RecordId) -> AuditResult<Vec<AuditRecord>> {
        let mut records = self.filtered(|r| r.receiver_id.as_ref() == Some(receiver))?;
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }
}
