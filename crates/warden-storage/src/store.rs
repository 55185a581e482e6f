//! Collaborator traits the engine reads from.
//!
//! Storage engines implement these so the authorization core doesn't depend on
//! any database or schema details. Every mutation carries the acting user id
//! for traceability.

use crate::types::*;
use crate::StoreError;

/// Read-only access to user snapshots.
#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait::async_trait]
pub trait UserLookup: Send + Sync {
    /// Get user by ID. Fails with `StoreError::NotFound` if absent.
    async fn get_by_id(&self, user_id: &UserId) -> Result<Actor, StoreError>;
}

/// ABAC rule persistence.
#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait::async_trait]
pub trait RuleStore: Send + Sync {
    /// List rules matching the filter. Order is unspecified.
    async fn list_rules(&self, filter: &RuleFilter) -> Result<Vec<PermissionRule>, StoreError>;

    /// Get a rule by ID.
    async fn get_rule(&self, rule_id: &RuleId) -> Result<PermissionRule, StoreError>;

    /// Create a rule (returns the stored record).
    async fn create_rule(
        &self,
        params: &CreateRuleParams,
        created_by: &UserId,
    ) -> Result<PermissionRule, StoreError>;

    /// Apply a partial update to a rule.
    async fn update_rule(
        &self,
        rule_id: &RuleId,
        params: &UpdateRuleParams,
        updated_by: &UserId,
    ) -> Result<PermissionRule, StoreError>;

    /// Delete a rule.
    async fn delete_rule(&self, rule_id: &RuleId, deleted_by: &UserId) -> Result<(), StoreError>;
}

/// Permission template persistence.
#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait::async_trait]
pub trait TemplateStore: Send + Sync {
    async fn create_template(
        &self,
        params: &CreateTemplateParams,
        created_by: &UserId,
    ) -> Result<PermissionTemplate, StoreError>;

    async fn get_template(&self, template_id: &TemplateId)
        -> Result<PermissionTemplate, StoreError>;

    async fn list_templates(&self) -> Result<Vec<PermissionTemplate>, StoreError>;

    /// Union the template's permissions into the user's explicit permissions.
    /// Returns the updated user snapshot.
    async fn apply_template(
        &self,
        user_id: &UserId,
        template_id: &TemplateId,
        applied_by: &UserId,
    ) -> Result<Actor, StoreError>;
}
