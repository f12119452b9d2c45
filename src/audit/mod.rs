//! Audit record model and the pure change-tracking logic
//!
//! Captures every create, update and destroy of a tracked entity as an
//! immutable audit record, and rebuilds past revisions from those records.
//!
//! # Architecture
//!
//! - `AuditRecord`: a single audit entry with action, attribute changes,
//!   notification title/comment, receiver and per-entity version.
//! - `extract`: computes the audit-worthy change set of a mutation.
//! - `reconstruct_revision`: replays stored records against a live entity to
//!   recover its state at a past version.
//! - `format_template` / `truncate_content`: notification text helpers.
//!
//! # Example
//!
//! ```rust,ignore
//! use audit_trail::audit::{extract, Action, AttributeFilter};
//!
//! let changes = extract(Action::Update, &after, Some(&before), &AttributeFilter::default());
//! if changes.contains_all(&["status"]) {
//!     // notify
//! }
//! ```

mod changes;
mod entry;
mod format;
mod revision;

pub use changes::{extract, summarize, AttributeFilter, ChangeSet, DEFAULT_IGNORED_ATTRIBUTES};
pub use entry::{Action, AttributeChange, AuditRecord};
pub use format::{format_template, truncate_content, PLACEHOLDER};
pub use revision::{
    reconstruct_attributes, reconstruct_revision, replay_forward, resolve_target, revisions,
    Revision, RevisionTarget,
};
