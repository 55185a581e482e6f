//! Resource-level access decisions.
//!
//! [`ResourcePolicy`] is the seam `AccessGuard::require_resource_access`
//! delegates to. [`RuleBackedPolicy`] combines static RBAC/tenant checks with
//! the ABAC rules stored for a `(resource_type, action)` pair.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use warden_storage::{Permission, RuleEffect, RuleFilter, RuleStore};

use crate::context::{PermissionContext, ResourceRef};
use crate::error::AuthzError;
use crate::evaluator::PermissionEvaluator;
use crate::rules::RuleEngine;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResourcePolicy: Send + Sync {
    /// Whether `ctx.user` may perform `action` on a resource of `resource_type`.
    ///
    /// `Ok(false)` is a denial; `Err` means the decision could not be made.
    async fn can_access(
        &self,
        ctx: &PermissionContext,
        resource_type: &str,
        action: &str,
    ) -> Result<bool, AuthzError>;
}

pub struct RuleBackedPolicy<S: RuleStore + ?Sized> {
    store: Arc<S>,
    evaluator: PermissionEvaluator,
    engine: RuleEngine,
    required: HashMap<(String, String), Permission>,
}

impl<S: RuleStore + ?Sized> RuleBackedPolicy<S> {
    pub fn new(store: Arc<S>, evaluator: PermissionEvaluator, engine: RuleEngine) -> Self {
        Self {
            store,
            evaluator,
            engine,
            required: HashMap::new(),
        }
    }

    /// Require `permission` before any rule for the pair is consulted.
    pub fn require(
        mut self,
        resource_type: impl Into<String>,
        action: impl Into<String>,
        permission: Permission,
    ) -> Self {
        self.required
            .insert((resource_type.into(), action.into()), permission);
        self
    }

    fn static_check(&self, ctx: &PermissionContext, resource_type: &str, action: &str) -> bool {
        let actor = &ctx.user;
        if !actor.active {
            return false;
        }
        let key = (resource_type.to_string(), action.to_string());
        if let Some(permission) = self.required.get(&key) {
            if !self.evaluator.has_permission(actor, *permission) {
                return false;
            }
        }
        match ctx.resource.as_ref().and_then(ResourceRef::company_id) {
            Some(company_id) => self.evaluator.can_access_company(actor, &company_id),
            None => true,
        }
    }
}

#[async_trait]
impl<S: RuleStore + ?Sized> ResourcePolicy for RuleBackedPolicy<S> {
    async fn can_access(
        &self,
        ctx: &PermissionContext,
        resource_type: &str,
        action: &str,
    ) -> Result<bool, AuthzError> {
        if !self.static_check(ctx, resource_type, action) {
            tracing::debug!(
                user_id = %ctx.user.id,
                resource_type,
                action,
                "Static resource check failed"
            );
            return Ok(false);
        }

        let filter = RuleFilter::new()
            .resource_type(resource_type)
            .action(action)
            .active_only();
        let mut rules = self.store.list_rules(&filter).await?;
        rules.sort_by(|a, b| b.priority.cmp(&a.priority));

        // Deny rules veto; allow rules, when any exist, need one match.
        let mut has_allow = false;
        let mut allowed = false;
        for rule in &rules {
            let passed = self.engine.evaluate_rule(rule, ctx);
            match rule.effect {
                RuleEffect::Deny if !passed => {
                    tracing::debug!(
                        user_id = %ctx.user.id,
                        rule_id = %rule.id,
                        rule = %rule.name,
                        "Deny rule rejected access"
                    );
                    return Ok(false);
                }
                RuleEffect::Deny => {}
                RuleEffect::Allow => {
                    has_allow = true;
                    allowed |= passed;
                }
            }
        }

        if has_allow && !allowed {
            tracing::debug!(
                user_id = %ctx.user.id,
                resource_type,
                action,
                "No allow rule matched"
            );
            return Ok(false);
        }
        Ok(true)
    }
}
