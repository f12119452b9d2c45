//! History service
//!
//! Read-side queries over the audit store: an entity's records, its
//! reconstructed revisions, and notifications addressed to a receiver.

use chrono::{DateTime, Utc};

use crate::audit::{
    reconstruct_attributes, reconstruct_revision, revisions, AuditRecord, Revision,
    RevisionTarget,
};
use crate::error::{AuditError, AuditResult};
use crate::models::{Record, RecordId};
use crate::storage::AuditStore;

/// Service for reading audit history
pub struct HistoryService<'a> {
    store: &'a dyn AuditStore,
}

impl<'a> HistoryService<'a> {
    pub fn new(store: &'a dyn AuditStore) -> Self {
        Self { store }
    }

    /// Records of one entity, oldest first
    pub fn audits(&self, entity_type: &str, id: &RecordId) -> AuditResult<Vec<AuditRecord>> {
        self.store.audits_for(entity_type, id)
    }

    /// Records of an entity together with those grouped under it
    pub fn own_and_associated(
        &self,
        entity_type: &str,
        id: &RecordId,
    ) -> AuditResult<Vec<AuditRecord>> {
        self.store.own_and_associated_audits(entity_type, id)
    }

    /// The live entity as it was at `target`
    pub fn revision(&self, entity: &Record, target: RevisionTarget) -> AuditResult<Option<Revision>> {
        let records = self.store.audits_for(&entity.entity_type, &entity.id)?;
        Ok(reconstruct_revision(&records, entity, target))
    }

    /// Shorthand for `revision(entity, RevisionTarget::At(at))`
    pub fn revision_at(&self, entity: &Record, at: DateTime<Utc>) -> AuditResult<Option<Revision>> {
        self.revision(entity, RevisionTarget::At(at))
    }

    /// Every revision from `from_version` on
    pub fn revisions(&self, entity: &Record, from_version: u32) -> AuditResult<Vec<Revision>> {
        let records = self.store.audits_for(&entity.entity_type, &entity.id)?;
        Ok(revisions(&records, entity, from_version))
    }

    /// Rebuild an entity's attributes purely from its records.
    ///
    /// Works without the live entity, so it also covers destroyed ones.
    pub fn replayed(&self, entity_type: &str, id: &RecordId, version: Option<u32>) -> AuditResult<Revision> {
        let records = self.store.audits_for(entity_type, id)?;
        let version = match version.or_else(|| records.last().map(|record| record.version)) {
            Some(version) => version,
            None => return Err(AuditError::not_found(entity_type, id.as_str())),
        };

        let attributes = reconstruct_attributes(&records, version).ok_or_else(|| {
            AuditError::not_found(format!("{} version", entity_type), version.to_string())
        })?;

        Ok(Revision {
            entity_type: entity_type.to_string(),
            entity_id: id.clone(),
            version,
            attributes,
        })
    }

    /// Notifications addressed to `receiver`, newest first
    pub fn notifications(&self, receiver: &RecordId, unchecked_only: bool) -> AuditResult<Vec<AuditRecord>> {
        let mut records = self.store.for_receiver(receiver)?;
        if unchecked_only {
            records.retain(|record| !record.checked);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::AuditContext;
    use crate::hooks::HookRunner;
    use crate::models::EntityConfig;
    use crate::registry::TypeRegistry;
    use crate::services::Auditor;
    use crate::storage::AuditRepository;
    use chrono::Duration;
    use serde_json::json;

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry
            .register_all([
                EntityConfig::new("Order")
                    .title_attribute("number")
                    .receiver_attribute("owner_id"),
                EntityConfig::new("LineItem").associated_with("Order", "order_id"),
            ])
            .unwrap();
        registry
    }

    /// Order created pending, shipped, then renumbered
    fn history(store: &AuditRepository, registry: &TypeRegistry) -> Record {
        let hooks = HookRunner::new();
        let auditor = Auditor::new(registry, store, &hooks);
        let ctx = AuditContext::default();

        let mut order = Record::from_json(
            "Order",
            "1",
            json!({"number": "SO-1", "status": "pending", "owner_id": 42}),
        );
        auditor.audit_create(&ctx, &mut order).unwrap();

        let previous = order.attributes.clone();
        order.set("status", json!("shipped"));
        auditor.audit_update(&ctx, &mut order, &previous).unwrap();

        let previous = order.attributes.clone();
        order.set("number", json!("SO-1A"));
        auditor.audit_update(&ctx, &mut order, &previous).unwrap();

        let mut item = Record::from_json("LineItem", "li-1", json!({"order_id": "1", "sku": "X"}));
        auditor.audit_create(&ctx, &mut item).unwrap();

        order
    }

    #[test]
    fn test_revision_by_version_and_previous() {
        let store = AuditRepository::in_memory();
        let registry = registry();
        let order = history(&store, &registry);
        let service = HistoryService::new(&store);

        let first = service
            .revision(&order, RevisionTarget::Version(1))
            .unwrap()
            .unwrap();
        assert_eq!(first.get("status"), Some(&json!("pending")));
        assert_eq!(first.get("number"), Some(&json!("SO-1")));

        let previous = service
            .revision(&order, RevisionTarget::Previous)
            .unwrap()
            .unwrap();
        assert_eq!(previous.version, 2);
        assert_eq!(previous.get("status"), Some(&json!("shipped")));
        assert_eq!(previous.get("number"), Some(&json!("SO-1")));
    }

    #[test]
    fn test_revision_at_point_in_time() {
        let store = AuditRepository::in_memory();
        let registry = registry();
        let order = history(&store, &registry);
        let service = HistoryService::new(&store);

        let now = service.revision_at(&order, Utc::now()).unwrap().unwrap();
        assert_eq!(now.version, 3);
        assert_eq!(now.attributes, order.attributes);

        let before_any = service
            .revision_at(&order, Utc::now() - Duration::days(1))
            .unwrap();
        assert!(before_any.is_none());
    }

    #[test]
    fn test_revisions_and_replay_agree() {
        let store = AuditRepository::in_memory();
        let registry = registry();
        let order = history(&store, &registry);
        let service = HistoryService::new(&store);

        let all = service.revisions(&order, 1).unwrap();
        assert_eq!(all.iter().map(|r| r.version).collect::<Vec<_>>(), vec![1, 2, 3]);

        let replayed = service.replayed("Order", &RecordId::from("1"), Some(2)).unwrap();
        assert_eq!(replayed.attributes, all[1].attributes);

        let latest = service.replayed("Order", &RecordId::from("1"), None).unwrap();
        assert_eq!(latest.version, 3);
        assert_eq!(latest.attributes, order.attributes);
    }

    #[test]
    fn test_replayed_unknown_entity() {
        let store = AuditRepository::in_memory();
        let service = HistoryService::new(&store);
        let err = service
            .replayed("Order", &RecordId::from("404"), None)
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_own_and_associated() {
        let store = AuditRepository::in_memory();
        let registry = registry();
        history(&store, &registry);
        let service = HistoryService::new(&store);

        let own = service.audits("Order", &RecordId::from("1")).unwrap();
        assert_eq!(own.len(), 3);

        let combined = service
            .own_and_associated("Order", &RecordId::from("1"))
            .unwrap();
        assert_eq!(combined.len(), 4);
        assert!(combined.iter().any(|r| r.entity_type == "LineItem"));
    }

    #[test]
    fn test_notifications_for_receiver() {
        let store = AuditRepository::in_memory();
        let registry = registry();
        history(&store, &registry);
        let service = HistoryService::new(&store);

        let inbox = service.notifications(&RecordId::from("42"), true).unwrap();
        assert_eq!(inbox.len(), 3);
        assert!(service
            .notifications(&RecordId::from("7"), false)
            .unwrap()
            .is_empty());
    }
}
