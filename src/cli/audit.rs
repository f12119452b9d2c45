//! Audit CLI commands
//!
//! Read-only inspection of the audit store: per-entity history, single
//! records, replayed revisions and notification inboxes.

use clap::Subcommand;

use crate::config::Settings;
use crate::display::{format_audit_details, format_audit_list, format_notification_list, format_revision};
use crate::error::{AuditError, AuditResult};
use crate::models::RecordId;
use crate::services::HistoryService;
use crate::storage::Storage;

/// Audit inspection subcommands
#[derive(Subcommand)]
pub enum AuditCommands {
    /// List the audit records of an entity
    History {
        /// Entity type tag (e.g. Order)
        entity_type: String,
        /// Entity ID
        id: String,
        /// Include records grouped under this entity
        #[arg(short, long)]
        associated: bool,
        /// Show only the most recent records
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Show one audit record
    Show {
        /// Audit record ID (aud-xxxxxxxx or full UUID)
        audit_id: String,
    },
    /// Reconstruct an entity's attributes at a version
    Revision {
        /// Entity type tag
        entity_type: String,
        /// Entity ID
        id: String,
        /// Version to reconstruct (latest if omitted)
        #[arg(short, long)]
        version: Option<u32>,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// List notifications addressed to a receiver
    Notifications {
        /// Receiver ID
        receiver: String,
        /// Only unread notifications
        #[arg(short, long)]
        unread: bool,
    },
    /// List configured entity types
    Types,
}

/// Handle an audit command
pub fn handle_audit_command(storage: &Storage, settings: &Settings, cmd: AuditCommands) -> AuditResult<()> {
    let service = HistoryService::new(&storage.audits);

    match cmd {
        AuditCommands::History {
            entity_type,
            id,
            associated,
            limit,
        } => {
            let id = RecordId::new(id);
            let mut records = if associated {
                service.own_and_associated(&entity_type, &id)?
            } else {
                service.audits(&entity_type, &id)?
            };

            if let Some(limit) = limit {
                let skip = records.len().saturating_sub(limit);
                records.drain(..skip);
            }

            print!("{}", format_audit_list(&records));
            if !records.is_empty() {
                println!("\nTotal: {} records", records.len());
            } else {
                println!();
            }
        }

        AuditCommands::Show { audit_id } => {
            let record = storage
                .audits
                .find(&audit_id)?
                .ok_or_else(|| AuditError::not_found("Audit record", &audit_id))?;

            print!("{}", format_audit_details(&record));
        }

        AuditCommands::Revision {
            entity_type,
            id,
            version,
            json,
        } => {
            let revision = service.replayed(&entity_type, &RecordId::new(id), version)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&revision)?);
            } else {
                print!("{}", format_revision(&revision));
            }
        }

        AuditCommands::Notifications { receiver, unread } => {
            let records = service.notifications(&RecordId::new(receiver), unread)?;
            print!("{}", format_notification_list(&records));
            if records.is_empty() {
                println!();
            }
        }

        AuditCommands::Types => {
            if settings.entity_types.is_empty() {
                println!("No entity types configured.");
                return Ok(());
            }

            println!("{:20} {:24} {:>5}  {}", "Type", "Actions", "Rules", "Flags");
            println!("{}", "-".repeat(62));

            for config in &settings.entity_types {
                let actions: Vec<String> = config
                    .on
                    .iter()
                    .map(|action| action.to_string().to_lowercase())
                    .collect();

                let mut flags = Vec::new();
                if config.comment_required {
                    flags.push("comment required".to_string());
                }
                if let Some(association) = &config.associated_with {
                    flags.push(format!("grouped under {}", association.entity_type));
                }

                println!(
                    "{:20} {:24} {:>5}  {}",
                    config.entity_type,
                    actions.join(","),
                    config.rules.len(),
                    flags.join(", ")
                );
            }
        }
    }

    Ok(())
}
