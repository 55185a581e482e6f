//! Enforcement surface.
//!
//! Each `require_*` call computes a decision with the evaluator, rule engine
//! or resource policy, hands an [`AuditEntry`] to the audit log and returns
//! `Ok(())` or a typed [`AuthzError`]. A failed audit write is logged and
//! never changes the decision.
//!
//! Role checks look at the role only. Chain [`Requirement::ActiveUser`] in
//! front of them (see [`AccessGuard::enforce`]) when the actor must be active.

use serde_json::json;
use std::sync::Arc;
use warden_audit::{AuditCheck, AuditEntry, AuditEntryBuilder, AuditLog};
use warden_config::EngineConfig;
use warden_storage::{
    Actor, CompanyId, Permission, PermissionRule, Role, StoreError, SubscriptionTier, UserId,
    UserLookup,
};

use crate::catalog::role_level;
use crate::context::PermissionContext;
use crate::error::AuthzError;
use crate::evaluator::PermissionEvaluator;
use crate::policy::ResourcePolicy;
use crate::rules::RuleEngine;

/// One static check in an [`AccessGuard::enforce`] chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Requirement {
    ActiveUser,
    VerifiedEmail,
    Permission(Permission),
    AnyPermission(Vec<Permission>),
    AllPermissions(Vec<Permission>),
    Role(Role),
    AnyRole(Vec<Role>),
    MinimumRole(Role),
    CompanyAccess(CompanyId),
    SubscriptionTier(SubscriptionTier),
    OwnerOrAdmin(UserId),
}

#[derive(Clone)]
pub struct AccessGuard {
    evaluator: PermissionEvaluator,
    engine: RuleEngine,
    policy: Arc<dyn ResourcePolicy>,
    audit: Arc<dyn AuditLog>,
    audit_enabled: bool,
}

impl AccessGuard {
    pub fn new(
        evaluator: PermissionEvaluator,
        engine: RuleEngine,
        policy: Arc<dyn ResourcePolicy>,
        audit: Arc<dyn AuditLog>,
    ) -> Self {
        Self {
            evaluator,
            engine,
            policy,
            audit,
            audit_enabled: true,
        }
    }

    /// Apply the audit switch from configuration.
    pub fn with_config(mut self, config: &EngineConfig) -> Self {
        self.audit_enabled = config.audit_enabled;
        self
    }

    pub fn evaluator(&self) -> &PermissionEvaluator {
        &self.evaluator
    }

    pub fn engine(&self) -> &RuleEngine {
        &self.engine
    }

    /// Load the caller's snapshot through `users`.
    ///
    /// No id, or an id the store doesn't know, is `Unauthenticated`. Other
    /// store failures propagate unchanged.
    pub async fn authenticate(
        &self,
        users: &dyn UserLookup,
        user_id: Option<&UserId>,
    ) -> Result<Actor, AuthzError> {
        let Some(user_id) = user_id else {
            tracing::debug!("Request carries no user id");
            return Err(AuthzError::Unauthenticated);
        };
        let entry = AuditEntry::builder(user_id, AuditCheck::Authenticate);
        match users.get_by_id(user_id).await {
            Ok(actor) => {
                self.finish(entry, Ok(())).await?;
                Ok(actor)
            }
            Err(StoreError::NotFound) => {
                self.finish(entry, Err(AuthzError::Unauthenticated)).await?;
                Err(AuthzError::Unauthenticated)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn require_permission(
        &self,
        actor: &Actor,
        permission: Permission,
    ) -> Result<(), AuthzError> {
        let outcome = if !actor.active {
            Err(inactive(actor))
        } else if self.evaluator.has_permission(actor, permission) {
            Ok(())
        } else {
            Err(AuthzError::permission(permission))
        };
        let entry = AuditEntry::builder(&actor.id, AuditCheck::Permission).permission(permission);
        self.finish(entry, outcome).await
    }

    pub async fn require_any_permission(
        &self,
        actor: &Actor,
        permissions: &[Permission],
    ) -> Result<(), AuthzError> {
        let outcome = if !actor.active {
            Err(inactive(actor))
        } else if self.evaluator.has_any_permission(actor, permissions) {
            Ok(())
        } else {
            Err(AuthzError::permission(format!(
                "any of [{}]",
                join_permissions(permissions)
            )))
        };
        let entry = AuditEntry::builder(&actor.id, AuditCheck::AnyPermission)
            .context(json!({ "permissions": permissions }));
        self.finish(entry, outcome).await
    }

    pub async fn require_all_permissions(
        &self,
        actor: &Actor,
        permissions: &[Permission],
    ) -> Result<(), AuthzError> {
        let missing: Vec<Permission> = permissions
            .iter()
            .copied()
            .filter(|p| !self.evaluator.has_permission(actor, *p))
            .collect();
        let outcome = if !actor.active && !permissions.is_empty() {
            Err(inactive(actor))
        } else if missing.is_empty() {
            Ok(())
        } else {
            Err(AuthzError::permission(join_permissions(&missing)))
        };
        let entry = AuditEntry::builder(&actor.id, AuditCheck::AllPermissions)
            .context(json!({ "permissions": permissions }));
        self.finish(entry, outcome).await
    }

    /// Exact role match.
    pub async fn require_role(&self, actor: &Actor, role: Role) -> Result<(), AuthzError> {
        let outcome = if actor.role == role {
            Ok(())
        } else {
            Err(role_denied(vec![role], actor.role))
        };
        let entry = AuditEntry::builder(&actor.id, AuditCheck::Role)
            .context(json!({ "required": [role], "actual": actor.role }));
        self.finish(entry, outcome).await
    }

    pub async fn require_any_role(&self, actor: &Actor, roles: &[Role]) -> Result<(), AuthzError> {
        let outcome = if roles.contains(&actor.role) {
            Ok(())
        } else {
            Err(role_denied(roles.to_vec(), actor.role))
        };
        let entry = AuditEntry::builder(&actor.id, AuditCheck::AnyRole)
            .context(json!({ "required": roles, "actual": actor.role }));
        self.finish(entry, outcome).await
    }

    /// The actor's role level is at least that of `role`.
    pub async fn require_minimum_role(&self, actor: &Actor, role: Role) -> Result<(), AuthzError> {
        let outcome = if role_level(actor.role) >= role_level(role) {
            Ok(())
        } else {
            Err(role_denied(vec![role], actor.role))
        };
        let entry = AuditEntry::builder(&actor.id, AuditCheck::MinimumRole)
            .context(json!({ "minimum": role, "actual": actor.role }));
        self.finish(entry, outcome).await
    }

    pub async fn require_company_access(
        &self,
        actor: &Actor,
        company_id: &CompanyId,
    ) -> Result<(), AuthzError> {
        let outcome = if !actor.active {
            Err(inactive(actor))
        } else if self.evaluator.can_access_company(actor, company_id) {
            Ok(())
        } else {
            Err(AuthzError::resource("company", Some(company_id.to_string())))
        };
        let entry = AuditEntry::builder(&actor.id, AuditCheck::CompanyAccess)
            .resource("company", Some(company_id.as_str()));
        self.finish(entry, outcome).await
    }

    pub async fn require_user_management(
        &self,
        manager: &Actor,
        target: &Actor,
    ) -> Result<(), AuthzError> {
        let outcome = if !manager.active {
            Err(inactive(manager))
        } else if self.evaluator.can_manage_user(manager, target) {
            Ok(())
        } else {
            Err(AuthzError::resource("user", Some(target.id.to_string())))
        };
        let entry = AuditEntry::builder(&manager.id, AuditCheck::UserManagement)
            .resource("user", Some(target.id.as_str()));
        self.finish(entry, outcome).await
    }

    pub async fn require_user_data_access(
        &self,
        viewer: &Actor,
        target: &Actor,
    ) -> Result<(), AuthzError> {
        let outcome = if self.evaluator.can_view_user_data(viewer, target) {
            Ok(())
        } else {
            Err(AuthzError::resource("user_data", Some(target.id.to_string())))
        };
        let entry = AuditEntry::builder(&viewer.id, AuditCheck::UserDataAccess)
            .resource("user_data", Some(target.id.as_str()));
        self.finish(entry, outcome).await
    }

    /// Delegates to the configured [`ResourcePolicy`]. A policy error is audited
    /// as a denial and returned unchanged.
    pub async fn require_resource_access(
        &self,
        ctx: &PermissionContext,
        resource_type: &str,
        action: &str,
    ) -> Result<(), AuthzError> {
        let resource_id = ctx.resource.as_ref().and_then(|r| r.id.clone());
        let outcome = match self.policy.can_access(ctx, resource_type, action).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(AuthzError::resource(resource_type, resource_id.clone())),
            Err(e) => Err(e),
        };
        let entry = AuditEntry::builder(&ctx.user.id, AuditCheck::ResourceAccess)
            .action(action)
            .resource(resource_type, resource_id)
            .context(ctx.to_value());
        self.finish(entry, outcome).await
    }

    pub async fn require_active_user(&self, actor: &Actor) -> Result<(), AuthzError> {
        let outcome = if actor.active {
            Ok(())
        } else {
            Err(inactive(actor))
        };
        let entry = AuditEntry::builder(&actor.id, AuditCheck::ActiveUser);
        self.finish(entry, outcome).await
    }

    pub async fn require_verified_email(&self, actor: &Actor) -> Result<(), AuthzError> {
        let outcome = if actor.email_verified {
            Ok(())
        } else {
            Err(AuthzError::EmailNotVerified)
        };
        let entry = AuditEntry::builder(&actor.id, AuditCheck::VerifiedEmail);
        self.finish(entry, outcome).await
    }

    /// Ordinal compare: free < premium < enterprise.
    pub async fn require_subscription_tier(
        &self,
        actor: &Actor,
        tier: SubscriptionTier,
    ) -> Result<(), AuthzError> {
        let outcome = if actor.subscription_tier >= tier {
            Ok(())
        } else {
            Err(AuthzError::SubscriptionRequired {
                required: tier,
                actual: actor.subscription_tier,
            })
        };
        let entry = AuditEntry::builder(&actor.id, AuditCheck::SubscriptionTier)
            .context(json!({ "required": tier, "actual": actor.subscription_tier }));
        self.finish(entry, outcome).await
    }

    /// Owner of the resource, a super admin or a company admin.
    pub async fn require_owner_or_admin(
        &self,
        actor: &Actor,
        owner_id: &UserId,
    ) -> Result<(), AuthzError> {
        let allowed = &actor.id == owner_id
            || matches!(actor.role, Role::SuperAdmin | Role::CompanyAdmin);
        let outcome = if allowed {
            Ok(())
        } else {
            Err(AuthzError::resource("owned_resource", Some(owner_id.to_string())))
        };
        let entry = AuditEntry::builder(&actor.id, AuditCheck::OwnerOrAdmin)
            .resource("owned_resource", Some(owner_id.as_str()));
        self.finish(entry, outcome).await
    }

    /// Super admin, or both actors carry the same company id.
    pub async fn require_same_company_access(
        &self,
        actor: &Actor,
        target: &Actor,
    ) -> Result<(), AuthzError> {
        let outcome = if actor.role == Role::SuperAdmin || actor.shares_company_with(target) {
            Ok(())
        } else {
            Err(AuthzError::resource(
                "company",
                target.company_id.as_ref().map(ToString::to_string),
            ))
        };
        let entry = AuditEntry::builder(&actor.id, AuditCheck::SameCompany)
            .resource("user", Some(target.id.as_str()));
        self.finish(entry, outcome).await
    }

    /// Enforce a single rule decision; `true` from the engine passes.
    pub async fn require_rule(
        &self,
        rule: &PermissionRule,
        ctx: &PermissionContext,
    ) -> Result<(), AuthzError> {
        let outcome = if self.engine.evaluate_rule(rule, ctx) {
            Ok(())
        } else {
            Err(AuthzError::permission(format!(
                "{} on {} (rule {})",
                rule.action, rule.resource_type, rule.name
            )))
        };
        let entry = AuditEntry::builder(&ctx.user.id, AuditCheck::Rule)
            .action(rule.action.as_str())
            .resource(
                rule.resource_type.as_str(),
                ctx.resource.as_ref().and_then(|r| r.id.clone()),
            )
            .reason(format!("rule {}", rule.id))
            .context(ctx.to_value());
        self.finish(entry, outcome).await
    }

    /// Run `requirements` in order, stopping at the first failure.
    pub async fn enforce(
        &self,
        actor: &Actor,
        requirements: &[Requirement],
    ) -> Result<(), AuthzError> {
        for requirement in requirements {
            match requirement {
                Requirement::ActiveUser => self.require_active_user(actor).await?,
                Requirement::VerifiedEmail => self.require_verified_email(actor).await?,
                Requirement::Permission(p) => self.require_permission(actor, *p).await?,
                Requirement::AnyPermission(ps) => self.require_any_permission(actor, ps).await?,
                Requirement::AllPermissions(ps) => {
                    self.require_all_permissions(actor, ps).await?
                }
                Requirement::Role(r) => self.require_role(actor, *r).await?,
                Requirement::AnyRole(rs) => self.require_any_role(actor, rs).await?,
                Requirement::MinimumRole(r) => self.require_minimum_role(actor, *r).await?,
                Requirement::CompanyAccess(c) => self.require_company_access(actor, c).await?,
                Requirement::SubscriptionTier(t) => {
                    self.require_subscription_tier(actor, *t).await?
                }
                Requirement::OwnerOrAdmin(owner) => {
                    self.require_owner_or_admin(actor, owner).await?
                }
            }
        }
        Ok(())
    }

    async fn finish(
        &self,
        entry: AuditEntryBuilder,
        outcome: Result<(), AuthzError>,
    ) -> Result<(), AuthzError> {
        let mut entry = entry.granted(outcome.is_ok());
        if let Err(e) = &outcome {
            entry = entry.reason(e.to_string());
        }
        let entry = entry.build();

        tracing::debug!(
            user_id = %entry.user_id,
            check = %entry.check,
            granted = entry.granted,
            "Access decision"
        );

        self.record(entry).await;
        outcome
    }

    /// Hand an entry to the audit log unless auditing is disabled.
    pub(crate) async fn record(&self, entry: AuditEntry) {
        if !self.audit_enabled {
            return;
        }
        if let Err(e) = self.audit.record(entry).await {
            tracing::warn!(error = %e, "Failed to record audit entry");
        }
    }
}

fn inactive(actor: &Actor) -> AuthzError {
    AuthzError::InactiveActor {
        user_id: actor.id.to_string(),
    }
}

fn role_denied(required: Vec<Role>, actual: Role) -> AuthzError {
    AuthzError::RoleDenied { required, actual }
}

fn join_permissions(permissions: &[Permission]) -> String {
    permissions
        .iter()
        .map(Permission::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
