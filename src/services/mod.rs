//! Service layer for audit-trail
//!
//! The service layer sits on top of the storage layer: the auditor writes
//! records for tracked mutations, the history service answers read-side
//! queries.

pub mod auditor;
pub mod history;

pub use auditor::{AuditOutcome, Auditor, SkipReason};
pub use history::HistoryService;
