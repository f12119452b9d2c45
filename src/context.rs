//! Per-call audit context
//!
//! Carries the auditing switches and the acting user through an audited
//! mutation. Each caller owns its context, so two threads auditing the same
//! entity type never see each other's toggles.

use std::collections::HashSet;

/// Auditing switches and acting user for a unit of work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditContext {
    enabled: bool,
    disabled_types: HashSet<String>,
    user: Option<String>,
}

impl Default for AuditContext {
    fn default() -> Self {
        Self::new(true)
    }
}

impl AuditContext {
    /// Create a context with auditing globally on or off
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            disabled_types: HashSet::new(),
            user: None,
        }
    }

    /// A context in which nothing is audited
    pub fn disabled() -> Self {
        Self::new(false)
    }

    /// Whether mutations of `entity_type` are audited
    pub fn is_enabled(&self, entity_type: &str) -> bool {
        self.enabled && !self.disabled_types.contains(entity_type)
    }

    pub fn disable(&mut self, entity_type: impl Into<String>) {
        self.disabled_types.insert(entity_type.into());
    }

    pub fn enable(&mut self, entity_type: &str) {
        self.disabled_types.remove(entity_type);
    }

    /// Run `f` with auditing of `entity_type` switched off.
    ///
    /// On exit the type is re-enabled only if it was enabled on entry.
    pub fn without_auditing<R>(
        &mut self,
        entity_type: &str,
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        let was_enabled = !self.disabled_types.contains(entity_type);
        self.disable(entity_type);
        let result = f(self);
        if was_enabled {
            self.enable(entity_type);
        }
        result
    }

    /// Run `f` with `user` recorded as the author of every audit
    pub fn as_user<R>(&mut self, user: impl Into<String>, f: impl FnOnce(&mut Self) -> R) -> R {
        let previous = self.user.replace(user.into());
        let result = f(self);
        self.user = previous;
        result
    }

    pub fn set_user(&mut self, user: Option<String>) {
        self.user = user;
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_without_auditing_restores_enabled_state() {
        let mut ctx = AuditContext::default();
        assert!(ctx.is_enabled("Order"));

        let inside = ctx.without_auditing("Order", |ctx| ctx.is_enabled("Order"));

        assert!(!inside);
        assert!(ctx.is_enabled("Order"));
    }

    #[test]
    fn test_without_auditing_keeps_prior_disable() {
        let mut ctx = AuditContext::default();
        ctx.disable("Order");

        ctx.without_auditing("Order", |ctx| assert!(!ctx.is_enabled("Order")));

        assert!(!ctx.is_enabled("Order"));
    }

    #[test]
    fn test_without_auditing_nested() {
        let mut ctx = AuditContext::default();
        ctx.without_auditing("Order", |ctx| {
            ctx.without_auditing("Order", |ctx| assert!(!ctx.is_enabled("Order")));
            // Inner scope found it disabled, so it stays disabled here
            assert!(!ctx.is_enabled("Order"));
        });
        assert!(ctx.is_enabled("Order"));
    }

    #[test]
    fn test_scope_is_per_type() {
        let mut ctx = AuditContext::default();
        ctx.without_auditing("Order", |ctx| {
            assert!(ctx.is_enabled("Comment"));
        });
    }

    #[test]
    fn test_globally_disabled() {
        let ctx = AuditContext::disabled();
        assert!(!ctx.is_enabled("Order"));
    }

    #[test]
    fn test_as_user_restores_previous_user() {
        let mut ctx = AuditContext::default();
        ctx.set_user(Some("system".into()));

        let inside = ctx.as_user("alice", |ctx| ctx.user().map(str::to_string));

        assert_eq!(inside.as_deref(), Some("alice"));
        assert_eq!(ctx.user(), Some("system"));
    }
}
