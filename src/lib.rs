//! audit-trail - change auditing and notification routing
//!
//! This library records every create, update and destroy of a tracked entity
//! as an immutable, versioned audit record, routes the change to a
//! notification receiver through per-type rules, and reconstructs past
//! revisions of an entity from its records.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Path resolution and persisted settings
//! - `error`: Custom error types
//! - `models`: Identifiers, tracked records and per-type configuration
//! - `audit`: Audit records, change extraction, revision reconstruction
//! - `rules`: Notification rules and their evaluation
//! - `registry`: Tracked types and record lookups
//! - `context`: Per-call enable switches and acting user
//! - `hooks`: Lifecycle hooks around audit writes
//! - `storage`: JSON file storage layer
//! - `services`: Audit writing and history queries
//!
//! # Example
//!
//! ```rust,ignore
//! use audit_trail::{AuditContext, Auditor, EntityConfig, HookRunner, Record, TypeRegistry};
//! use audit_trail::storage::AuditRepository;
//! use serde_json::json;
//!
//! let mut registry = TypeRegistry::new();
//! registry.register(EntityConfig::new("Order").title_attribute("number"))?;
//! let store = AuditRepository::in_memory();
//! let hooks = HookRunner::new();
//! let auditor = Auditor::new(&registry, &store, &hooks);
//!
//! let mut order = Record::from_json("Order", "1", json!({"number": "SO-1"}));
//! auditor.audit_create(&AuditContext::default(), &mut order)?;
//! ```

pub mod audit;
pub mod cli;
pub mod config;
pub mod context;
pub mod display;
pub mod error;
pub mod hooks;
pub mod models;
pub mod registry;
pub mod rules;
pub mod services;
pub mod storage;

pub use audit::{Action, AuditRecord, Revision, RevisionTarget};
pub use context::AuditContext;
pub use error::{AuditError, AuditResult};
pub use hooks::{AuditHook, HookRunner};
pub use models::{EntityConfig, Record, RecordId};
pub use registry::TypeRegistry;
pub use rules::{AttributeSetRule, ChangeRule, PolymorphicRule};
pub use services::{AuditOutcome, Auditor, HistoryService, SkipReason};
