//! Audit display formatting
//!
//! Formats audit records, revisions and notification inboxes for terminal
//! output in table and detail views.

use crate::audit::{summarize, AuditRecord, Revision};
use crate::models::display_value;

/// Format a list of audit records as a table
pub fn format_audit_list(records: &[AuditRecord]) -> String {
    if records.is_empty() {
        return "No audit records found.".to_string();
    }

    let entity_width = records
        .iter()
        .map(|r| entity_label(r).len())
        .max()
        .unwrap_or(6)
        .max(6);

    let title_width = records
        .iter()
        .map(|r| r.title.chars().count())
        .max()
        .unwrap_or(5)
        .clamp(5, 40);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<16}  {:>4}  {:<7}  {:<entity_width$}  {:<title_width$}  {}\n",
        "When",
        "Ver",
        "Action",
        "Entity",
        "Title",
        "Comment",
        entity_width = entity_width,
        title_width = title_width,
    ));
    output.push_str(&format!(
        "{:-<16}  {:->4}  {:-<7}  {:-<entity_width$}  {:-<title_width$}  {:-<10}\n",
        "",
        "",
        "",
        "",
        "",
        "",
        entity_width = entity_width,
        title_width = title_width,
    ));

    for record in records {
        output.push_str(&format!(
            "{:<16}  {:>4}  {:<7}  {:<entity_width$}  {:<title_width$}  {}\n",
            record.created_at.format("%Y-%m-%d %H:%M"),
            record.version,
            record.action,
            entity_label(record),
            clip(&record.title, title_width),
            record.comment,
            entity_width = entity_width,
            title_width = title_width,
        ));
    }

    output
}

/// Format a single audit record's details
pub fn format_audit_details(record: &AuditRecord) -> String {
    let mut output = String::new();

    output.push_str(&format!("Audit: {}\n", record.id));
    output.push_str(&format!("  Entity:    {}\n", entity_label(record)));
    output.push_str(&format!("  Action:    {}\n", record.action));
    output.push_str(&format!("  Version:   {}\n", record.version));
    output.push_str(&format!("  Title:     {}\n", record.title));
    output.push_str(&format!("  Comment:   {}\n", record.comment));

    if let Some(receiver) = &record.receiver_id {
        output.push_str(&format!(
            "  Receiver:  {}{}\n",
            receiver,
            if record.checked { " (read)" } else { "" }
        ));
    }
    if let (Some(kind), Some(id)) = (&record.associated_type, &record.associated_id) {
        output.push_str(&format!("  Parent:    {} {}\n", kind, id));
    }
    if let Some(user) = &record.user {
        output.push_str(&format!("  User:      {}\n", user));
    }

    if let Some(summary) = summarize(&record.audited_changes) {
        output.push('\n');
        output.push_str("  Changes:\n");
        for part in summary.split(", ") {
            output.push_str(&format!("    {}\n", part));
        }
    }

    output.push('\n');
    output.push_str(&format!(
        "  Written:   {}\n",
        record.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    output
}

/// Format a reconstructed revision as `name = value` lines
pub fn format_revision(revision: &Revision) -> String {
    let mut output = format!(
        "{} {} at version {}\n",
        revision.entity_type, revision.entity_id, revision.version
    );

    if revision.attributes.is_empty() {
        output.push_str("  (no attributes)\n");
        return output;
    }

    let name_width = revision
        .attributes
        .keys()
        .map(|name| name.len())
        .max()
        .unwrap_or(0);

    let mut names: Vec<&String> = revision.attributes.keys().collect();
    names.sort();
    for name in names {
        let value = revision
            .attributes
            .get(name)
            .and_then(display_value)
            .unwrap_or_else(|| "null".to_string());
        output.push_str(&format!(
            "  {:<name_width$} = {}\n",
            name,
            value,
            name_width = name_width
        ));
    }

    output
}

/// Format a receiver's notifications, newest first
pub fn format_notification_list(records: &[AuditRecord]) -> String {
    if records.is_empty() {
        return "No notifications.".to_string();
    }

    let mut output = String::new();
    for record in records {
        let marker = if record.checked { " " } else { "*" };
        output.push_str(&format!(
            "{} {}  {}\n    {}\n",
            marker,
            record.created_at.format("%Y-%m-%d %H:%M"),
            record.title,
            record.comment
        ));
    }
    output
}

fn entity_label(record: &AuditRecord) -> String {
    format!("{} {}", record.entity_type, record.entity_id)
}

fn clip(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let head: String = text.chars().take(width.saturating_sub(1)).collect();
        format!("{}~", head)
    }
}
