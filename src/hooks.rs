//! Audit lifecycle hooks
//!
//! Collaborators register [`AuditHook`]s to observe audit writes, e.g. to
//! dispatch the notification an audit record describes. Hooks run in
//! registration order around the store insert. The first failing
//! `before_audit` aborts the write; `after_audit` failures are only logged.

use std::sync::Arc;

use crate::audit::AuditRecord;
use crate::error::{AuditError, AuditResult};

/// Callbacks around the persistence of an audit record
pub trait AuditHook: Send + Sync {
    fn name(&self) -> &str;

    /// Runs before the record is stored; an error prevents the write
    fn before_audit(&self, _record: &AuditRecord) -> Result<(), String> {
        Ok(())
    }

    /// Runs once the record is stored; an error is logged, never returned
    fn after_audit(&self, _record: &AuditRecord) -> Result<(), String> {
        Ok(())
    }
}

/// Ordered set of audit hooks
#[derive(Default, Clone)]
pub struct HookRunner {
    hooks: Vec<Arc<dyn AuditHook>>,
}

impl std::fmt::Debug for HookRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.hooks.iter().map(|hook| hook.name()).collect();
        f.debug_struct("HookRunner").field("hooks", &names).finish()
    }
}

impl HookRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook; hooks run in registration order
    pub fn register(&mut self, hook: Arc<dyn AuditHook>) {
        self.hooks.push(hook);
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub fn run_before(&self, record: &AuditRecord) -> AuditResult<()> {
        for hook in &self.hooks {
            hook.before_audit(record)
                .map_err(|message| hook_failed(hook.as_ref(), "before_audit", message))?;
        }
        Ok(())
    }

    /// Notify every hook of a stored record.
    ///
    /// The record is already committed, so failures are logged and the
    /// remaining hooks still run.
    pub fn run_after(&self, record: &AuditRecord) {
        for hook in &self.hooks {
            if let Err(message) = hook.after_audit(record) {
                hook_failed(hook.as_ref(), "after_audit", message);
            }
        }
    }
}

fn hook_failed(hook: &dyn AuditHook, stage: &str, message: String) -> AuditError {
    tracing::warn!(hook = hook.name(), stage, %message, "audit hook failed");
    AuditError::Hook {
        hook: hook.name().to_string(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::Action;
    use crate::models::{AuditId, RecordId};
    use chrono::Utc;
    use std::sync::Mutex;

    struct Recorder {
        name: String,
        calls: Arc<Mutex<Vec<String>>>,
        fail_before: bool,
        fail_after: bool,
    }

    impl AuditHook for Recorder {
        fn name(&self) -> &str {
            &self.name
        }

        fn before_audit(&self, _record: &AuditRecord) -> Result<(), String> {
            self.calls.lock().unwrap().push(format!("{}:before", self.name));
            if self.fail_before {
                Err("rejected".into())
            } else {
                Ok(())
            }
        }

        fn after_audit(&self, _record: &AuditRecord) -> Result<(), String> {
            self.calls.lock().unwrap().push(format!("{}:after", self.name));
            if self.fail_after {
                Err("smtp down".into())
            } else {
                Ok(())
            }
        }
    }

    fn record() -> AuditRecord {
        AuditRecord {
            id: AuditId::new(),
            entity_type: "Order".into(),
            entity_id: RecordId::from("1"),
            action: Action::Create,
            audited_changes: Default::default(),
            comment: String::new(),
            title: "Order".into(),
            receiver_id: None,
            associated_type: None,
            associated_id: None,
            user: None,
            version: 1,
            checked: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_hooks_run_in_order() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut runner = HookRunner::new();
        for name in ["a", "b"] {
            runner.register(Arc::new(Recorder {
                name: name.into(),
                calls: calls.clone(),
                fail_before: false,
                fail_after: false,
            }));
        }

        runner.run_before(&record()).unwrap();
        runner.run_after(&record());

        assert_eq!(
            *calls.lock().unwrap(),
            vec!["a:before", "b:before", "a:after", "b:after"]
        );
    }

    #[test]
    fn test_failing_hook_stops_chain() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut runner = HookRunner::new();
        runner.register(Arc::new(Recorder {
            name: "gate".into(),
            calls: calls.clone(),
            fail_before: true,
            fail_after: false,
        }));
        runner.register(Arc::new(Recorder {
            name: "never".into(),
            calls: calls.clone(),
            fail_before: false,
            fail_after: false,
        }));

        let err = runner.run_before(&record()).unwrap_err();

        assert_eq!(err.to_string(), "Hook 'gate' failed: rejected");
        assert_eq!(*calls.lock().unwrap(), vec!["gate:before"]);
    }

    #[test]
    fn test_failing_after_hook_does_not_stop_others() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut runner = HookRunner::new();
        runner.register(Arc::new(Recorder {
            name: "mailer".into(),
            calls: calls.clone(),
            fail_before: false,
            fail_after: true,
        }));
        runner.register(Arc::new(Recorder {
            name: "feed".into(),
            calls: calls.clone(),
            fail_before: false,
            fail_after: false,
        }));

        runner.run_after(&record());

        assert_eq!(*calls.lock().unwrap(), vec!["mailer:after", "feed:after"]);
    }
}
