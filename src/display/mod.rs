//! Display formatting for terminal output
//!
//! Provides utilities for formatting audit records and revisions for
//! terminal display.

pub mod audit;

pub use audit::{format_audit_details, format_audit_list, format_notification_list, format_revision};
