//! Audit record writer
//!
//! Turns one tracked mutation into at most one audit record: checks the
//! context and type configuration, extracts the change set, routes it
//! through the rule set, and persists the result between the lifecycle
//! hooks.

use chrono::Utc;

use crate::audit::{extract, format_template, Action, AuditRecord, ChangeSet};
use crate::context::AuditContext;
use crate::error::{AuditError, AuditResult};
use crate::hooks::HookRunner;
use crate::models::{AuditId, Attributes, EntityConfig, Record, RecordId};
use crate::registry::TypeRegistry;
use crate::rules::{default_title, receiver_id, try_resolve, NotificationPayload, RuleEvaluator};
use crate::storage::AuditStore;

/// Why a mutation produced no audit record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Auditing is switched off for the type in this context
    Disabled,
    /// The type does not audit this action
    ActionNotAudited,
    /// An update changed nothing audited and carried no comment
    NoChanges,
}

/// Result of auditing one mutation
#[derive(Debug, Clone, PartialEq)]
pub enum AuditOutcome {
    Written(AuditRecord),
    Skipped(SkipReason),
}

impl AuditOutcome {
    pub fn record(&self) -> Option<&AuditRecord> {
        match self {
            AuditOutcome::Written(record) => Some(record),
            AuditOutcome::Skipped(_) => None,
        }
    }

    pub fn is_written(&self) -> bool {
        matches!(self, AuditOutcome::Written(_))
    }
}

/// Service writing audit records for tracked mutations
pub struct Auditor<'a> {
    registry: &'a TypeRegistry,
    store: &'a dyn AuditStore,
    hooks: &'a HookRunner,
}

impl<'a> Auditor<'a> {
    pub fn new(registry: &'a TypeRegistry, store: &'a dyn AuditStore, hooks: &'a HookRunner) -> Self {
        Self {
            registry,
            store,
            hooks,
        }
    }

    /// Audit a freshly created entity
    pub fn audit_create(&self, ctx: &AuditContext, entity: &mut Record) -> AuditResult<AuditOutcome> {
        self.audit(ctx, Action::Create, entity, None)
    }

    /// Audit an update; `previous` holds the attributes before the save
    pub fn audit_update(
        &self,
        ctx: &AuditContext,
        entity: &mut Record,
        previous: &Attributes,
    ) -> AuditResult<AuditOutcome> {
        self.audit(ctx, Action::Update, entity, Some(previous))
    }

    /// Audit an entity about to be destroyed.
    ///
    /// A validation error means the destroy must not proceed.
    pub fn audit_destroy(&self, ctx: &AuditContext, entity: &mut Record) -> AuditResult<AuditOutcome> {
        self.audit(ctx, Action::Destroy, entity, None)
    }

    fn audit(
        &self,
        ctx: &AuditContext,
        action: Action,
        entity: &mut Record,
        previous: Option<&Attributes>,
    ) -> AuditResult<AuditOutcome> {
        let config = self.registry.require(&entity.entity_type)?;

        if !ctx.is_enabled(&entity.entity_type) {
            return Ok(skipped(entity, action, SkipReason::Disabled));
        }
        if !config.audits_action(action) {
            return Ok(skipped(entity, action, SkipReason::ActionNotAudited));
        }
        if config.comment_required && entity.comment().is_none() {
            return Err(AuditError::comment_required());
        }

        let changes = extract(action, &entity.attributes, previous, &config.filter());
        if action == Action::Update && changes.is_empty() && entity.comment().is_none() {
            return Ok(skipped(entity, action, SkipReason::NoChanges));
        }

        let routed = match action {
            Action::Create | Action::Update => {
                RuleEvaluator::new(self.registry).evaluate(&changes, config, entity)
            }
            Action::Destroy => None,
        };

        let comment = entity.audit_comment.take();
        let payload = match routed {
            Some(payload) => payload,
            None => self.default_payload(config, action, entity, comment),
        };

        let record = self.write(ctx, config, action, entity, changes, payload)?;
        Ok(AuditOutcome::Written(record))
    }

    /// Payload used when no rule matched
    fn default_payload(
        &self,
        config: &EntityConfig,
        action: Action,
        entity: &Record,
        comment: Option<String>,
    ) -> NotificationPayload {
        let comment = comment
            .filter(|comment| !comment.trim().is_empty())
            .unwrap_or_else(|| {
                let template = self.registry.templates_for(config).for_action(action);
                format_template(template, config.display_name())
            });

        NotificationPayload {
            title: default_title(config, entity),
            comment,
            receiver_id: try_resolve("receiver", || receiver_id(config, entity)),
        }
    }

    fn write(
        &self,
        ctx: &AuditContext,
        config: &EntityConfig,
        action: Action,
        entity: &mut Record,
        changes: ChangeSet,
        payload: NotificationPayload,
    ) -> AuditResult<AuditRecord> {
        let version = self
            .store
            .latest_version(&entity.entity_type, &entity.id)?
            .unwrap_or(0)
            + 1;

        let (associated_type, associated_id) = match &config.associated_with {
            Some(association) => (
                Some(association.entity_type.clone()),
                entity
                    .get(&association.foreign_key)
                    .and_then(RecordId::from_value),
            ),
            None => (None, None),
        };

        let record = AuditRecord {
            id: AuditId::new(),
            entity_type: entity.entity_type.clone(),
            entity_id: entity.id.clone(),
            action,
            audited_changes: changes.into_changes(),
            comment: payload.comment,
            title: payload.title,
            receiver_id: payload.receiver_id,
            associated_type: associated_id.as_ref().and(associated_type),
            associated_id,
            user: ctx.user().map(str::to_string),
            version,
            checked: false,
            created_at: Utc::now(),
        };

        self.hooks.run_before(&record)?;
        self.store.insert(record.clone()).map_err(|e| match e {
            AuditError::Persistence(_) => e,
            other => AuditError::Persistence(other.to_string()),
        })?;
        entity.version = Some(version);

        tracing::info!(
            entity_type = %record.entity_type,
            entity_id = %record.entity_id,
            action = %record.action,
            version,
            receiver = record.receiver_id.as_ref().map(RecordId::as_str),
            "audit record written"
        );

        self.hooks.run_after(&record);
        Ok(record)
    }
}

fn skipped(entity: &Record, action: Action, reason: SkipReason) -> AuditOutcome {
    tracing::debug!(
        entity_type = %entity.entity_type,
        entity_id = %entity.id,
        action = %action,
        ?reason,
        "audit skipped"
    );
    AuditOutcome::Skipped(reason)
}
