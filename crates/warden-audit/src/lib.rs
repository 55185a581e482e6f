//! Audit logging abstraction for warden.
//!
//! This crate defines the `AuditLog` trait for persisting authorization
//! decisions and the types representing one recorded decision. Entries are
//! append-only: nothing in this crate mutates an entry after `build()`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use warden_storage::{Permission, UserId};

/// Unique identifier for an audit log entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuditLogId(pub Uuid);

impl AuditLogId {
    /// Generate a new audit log ID using UUID v7 (time-ordered)
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for AuditLogId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AuditLogId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for AuditLogId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Which check produced the decision
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditCheck {
    // Static RBAC checks
    Permission,
    AnyPermission,
    AllPermissions,
    Role,
    AnyRole,
    MinimumRole,

    // Relationship checks
    CompanyAccess,
    UserManagement,
    UserDataAccess,
    SameCompany,
    OwnerOrAdmin,

    // Account checks
    Authenticate,
    ActiveUser,
    VerifiedEmail,
    SubscriptionTier,

    // Dynamic checks
    ResourceAccess,
    Rule,

    // Administration
    RuleCreate,
    RuleUpdate,
    RuleDelete,
    TemplateCreate,
    TemplateApply,
}

impl AuditCheck {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditCheck::Permission => "permission.require",
            AuditCheck::AnyPermission => "permission.require_any",
            AuditCheck::AllPermissions => "permission.require_all",
            AuditCheck::Role => "role.require",
            AuditCheck::AnyRole => "role.require_any",
            AuditCheck::MinimumRole => "role.require_minimum",
            AuditCheck::CompanyAccess => "company.access",
            AuditCheck::UserManagement => "user.manage",
            AuditCheck::UserDataAccess => "user.view_data",
            AuditCheck::SameCompany => "company.same",
            AuditCheck::OwnerOrAdmin => "resource.owner_or_admin",
            AuditCheck::Authenticate => "account.authenticate",
            AuditCheck::ActiveUser => "account.active",
            AuditCheck::VerifiedEmail => "account.verified_email",
            AuditCheck::SubscriptionTier => "account.subscription_tier",
            AuditCheck::ResourceAccess => "resource.access",
            AuditCheck::Rule => "rule.evaluate",
            AuditCheck::RuleCreate => "rule.create",
            AuditCheck::RuleUpdate => "rule.update",
            AuditCheck::RuleDelete => "rule.delete",
            AuditCheck::TemplateCreate => "template.create",
            AuditCheck::TemplateApply => "template.apply",
        }
    }
}

impl std::fmt::Display for AuditCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AuditCheck {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "permission.require" => Ok(AuditCheck::Permission),
            "permission.require_any" => Ok(AuditCheck::AnyPermission),
            "permission.require_all" => Ok(AuditCheck::AllPermissions),
            "role.require" => Ok(AuditCheck::Role),
            "role.require_any" => Ok(AuditCheck::AnyRole),
            "role.require_minimum" => Ok(AuditCheck::MinimumRole),
            "company.access" => Ok(AuditCheck::CompanyAccess),
            "user.manage" => Ok(AuditCheck::UserManagement),
            "user.view_data" => Ok(AuditCheck::UserDataAccess),
            "company.same" => Ok(AuditCheck::SameCompany),
            "resource.owner_or_admin" => Ok(AuditCheck::OwnerOrAdmin),
            "account.authenticate" => Ok(AuditCheck::Authenticate),
            "account.active" => Ok(AuditCheck::ActiveUser),
            "account.verified_email" => Ok(AuditCheck::VerifiedEmail),
            "account.subscription_tier" => Ok(AuditCheck::SubscriptionTier),
            "resource.access" => Ok(AuditCheck::ResourceAccess),
            "rule.evaluate" => Ok(AuditCheck::Rule),
            "rule.create" => Ok(AuditCheck::RuleCreate),
            "rule.update" => Ok(AuditCheck::RuleUpdate),
            "rule.delete" => Ok(AuditCheck::RuleDelete),
            "template.create" => Ok(AuditCheck::TemplateCreate),
            "template.apply" => Ok(AuditCheck::TemplateApply),
            _ => Err(format!("Unknown audit check: {}", s)),
        }
    }
}

/// One recorded authorization decision.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Unique identifier for this audit entry
    pub id: AuditLogId,
    /// When the decision was made
    pub timestamp: DateTime<Utc>,
    /// Actor the decision was made for
    pub user_id: UserId,
    /// Which check produced the decision
    pub check: AuditCheck,
    /// Permission under test (if applicable)
    pub permission: Option<Permission>,
    /// Action under test (if applicable)
    pub action: Option<String>,
    /// Type of resource under test (if applicable)
    pub resource_type: Option<String>,
    /// Identifier of the resource under test (if applicable)
    pub resource_id: Option<String>,
    /// Whether access was granted
    pub granted: bool,
    /// Denial reason or additional context
    pub reason: Option<String>,
    /// Opaque snapshot of the evaluation context
    pub context: Option<serde_json::Value>,
}

impl AuditEntry {
    /// Create a new audit entry builder
    pub fn builder(user_id: &UserId, check: AuditCheck) -> AuditEntryBuilder {
        AuditEntryBuilder::new(user_id, check)
    }
}

/// Builder for constructing audit entries
pub struct AuditEntryBuilder {
    user_id: UserId,
    check: AuditCheck,
    permission: Option<Permission>,
    action: Option<String>,
    resource_type: Option<String>,
    resource_id: Option<String>,
    granted: bool,
    reason: Option<String>,
    context: Option<serde_json::Value>,
}

impl AuditEntryBuilder {
    pub fn new(user_id: &UserId, check: AuditCheck) -> Self {
        Self {
            user_id: user_id.clone(),
            check,
            permission: None,
            action: None,
            resource_type: None,
            resource_id: None,
            granted: false,
            reason: None,
            context: None,
        }
    }

    pub fn permission(mut self, permission: Permission) -> Self {
        self.permission = Some(permission);
        self
    }

    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn resource(
        mut self,
        resource_type: impl Into<String>,
        resource_id: Option<impl Into<String>>,
    ) -> Self {
        self.resource_type = Some(resource_type.into());
        self.resource_id = resource_id.map(Into::into);
        self
    }

    pub fn granted(mut self, granted: bool) -> Self {
        self.granted = granted;
        self
    }

    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn context(mut self, context: serde_json::Value) -> Self {
        self.context = Some(context);
        self
    }

    pub fn build(self) -> AuditEntry {
        AuditEntry {
            id: AuditLogId::new(),
            timestamp: Utc::now(),
            user_id: self.user_id,
            check: self.check,
            permission: self.permission,
            action: self.action,
            resource_type: self.resource_type,
            resource_id: self.resource_id,
            granted: self.granted,
            reason: self.reason,
            context: self.context,
        }
    }
}

/// Filter for querying audit logs
#[derive(Clone, Debug, Default)]
pub struct AuditLogFilter {
    /// Filter by user ID
    pub user_id: Option<UserId>,
    /// Filter by check
    pub check: Option<AuditCheck>,
    /// Filter by permission
    pub permission: Option<Permission>,
    /// Filter by resource type
    pub resource_type: Option<String>,
    /// Filter by resource ID
    pub resource_id: Option<String>,
    /// Filter by decision
    pub granted: Option<bool>,
    /// Filter by start timestamp (inclusive)
    pub from: Option<DateTime<Utc>>,
    /// Filter by end timestamp (exclusive)
    pub to: Option<DateTime<Utc>>,
    /// Maximum number of results to return
    pub limit: Option<u32>,
    /// Number of results to skip (for pagination)
    pub offset: Option<u32>,
}

impl AuditLogFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_id(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn check(mut self, check: AuditCheck) -> Self {
        self.check = Some(check);
        self
    }

    pub fn permission(mut self, permission: Permission) -> Self {
        self.permission = Some(permission);
        self
    }

    pub fn resource_type(mut self, resource_type: impl Into<String>) -> Self {
        self.resource_type = Some(resource_type.into());
        self
    }

    pub fn resource_id(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = Some(resource_id.into());
        self
    }

    pub fn granted(mut self, granted: bool) -> Self {
        self.granted = Some(granted);
        self
    }

    pub fn from(mut self, from: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self
    }

    pub fn to(mut self, to: DateTime<Utc>) -> Self {
        self.to = Some(to);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Check whether an entry passes every set criterion (ignores limit/offset).
    pub fn matches(&self, entry: &AuditEntry) -> bool {
        if self.user_id.as_ref().is_some_and(|u| u != &entry.user_id) {
            return false;
        }
        if self.check.is_some_and(|c| c != entry.check) {
            return false;
        }
        if self.permission.is_some() && self.permission != entry.permission {
            return false;
        }
        if self.resource_type.is_some() && self.resource_type != entry.resource_type {
            return false;
        }
        if self.resource_id.is_some() && self.resource_id != entry.resource_id {
            return false;
        }
        if self.granted.is_some_and(|g| g != entry.granted) {
            return false;
        }
        if self.from.is_some_and(|from| entry.timestamp < from) {
            return false;
        }
        if self.to.is_some_and(|to| entry.timestamp >= to) {
            return false;
        }
        true
    }
}

/// Error type for audit log operations
#[derive(Debug, Error)]
pub enum AuditLogError {
    #[error("storage error: {0}")]
    Storage(String),

    #[error("audit log not found: {0}")]
    NotFound(AuditLogId),

    #[error("invalid filter: {0}")]
    InvalidFilter(String),
}

/// Trait for audit log persistence.
///
/// Each `record` call must be atomic with respect to other calls. No ordering
/// is promised across concurrent writers.
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Record an audit entry.
    ///
    /// Failures to record audit entries should be logged by the caller but
    /// must not change the authorization decision.
    async fn record(&self, entry: AuditEntry) -> Result<(), AuditLogError>;

    /// Query audit logs with optional filters.
    ///
    /// Returns entries matching the filter criteria, ordered by timestamp descending.
    async fn query(&self, filter: AuditLogFilter) -> Result<Vec<AuditEntry>, AuditLogError>;

    /// Get a specific audit log entry by ID.
    async fn get(&self, id: AuditLogId) -> Result<AuditEntry, AuditLogError>;

    /// Count audit logs matching the filter criteria.
    async fn count(&self, filter: AuditLogFilter) -> Result<u64, AuditLogError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn user() -> UserId {
        UserId::from("u-1")
    }

    #[test]
    fn test_audit_check_display() {
        assert_eq!(AuditCheck::Permission.to_string(), "permission.require");
        assert_eq!(AuditCheck::ResourceAccess.to_string(), "resource.access");
    }

    #[test]
    fn test_audit_check_parse() {
        assert_eq!(
            "rule.evaluate".parse::<AuditCheck>().unwrap(),
            AuditCheck::Rule
        );
        let err = "rule.explode".parse::<AuditCheck>().unwrap_err();
        assert!(err.contains("Unknown audit check"));
    }

    #[test]
    fn test_audit_entry_builder() {
        let entry = AuditEntry::builder(&user(), AuditCheck::Permission)
            .permission(Permission::ManageCompany)
            .granted(false)
            .reason("missing manage_company")
            .build();

        assert_eq!(entry.user_id, user());
        assert_eq!(entry.check, AuditCheck::Permission);
        assert_eq!(entry.permission, Some(Permission::ManageCompany));
        assert!(!entry.granted);
        assert_eq!(entry.reason.as_deref(), Some("missing manage_company"));
        assert!(entry.resource_type.is_none());
    }

    #[test]
    fn test_audit_entry_builder_with_resource() {
        let entry = AuditEntry::builder(&user(), AuditCheck::ResourceAccess)
            .action("read")
            .resource("journal", Some("j-42"))
            .granted(true)
            .context(serde_json::json!({"user": {"role": "COMPANY_USER"}}))
            .build();

        assert_eq!(entry.resource_type.as_deref(), Some("journal"));
        assert_eq!(entry.resource_id.as_deref(), Some("j-42"));
        assert_eq!(entry.action.as_deref(), Some("read"));
        assert!(entry.context.is_some());
    }

    #[test]
    fn test_audit_entry_serialization() {
        let entry = AuditEntry::builder(&user(), AuditCheck::Role)
            .granted(true)
            .build();

        let json = serde_json::to_string(&entry).unwrap();
        let back: AuditEntry = serde_json::from_str(&json).unwrap();

        assert_eq!(back.id, entry.id);
        assert_eq!(back.check, AuditCheck::Role);
        assert!(back.granted);
    }

    #[test]
    fn test_audit_entry_timestamp_is_recent() {
        let before = Utc::now();
        let entry = AuditEntry::builder(&user(), AuditCheck::ActiveUser).build();
        let after = Utc::now();

        assert!(entry.timestamp >= before);
        assert!(entry.timestamp <= after);
    }

    #[test]
    fn test_audit_log_id_is_v7() {
        let id = AuditLogId::new();
        assert_eq!(id.0.get_version_num(), 7);
        assert_ne!(AuditLogId::default(), AuditLogId::default());
    }

    #[test]
    fn test_filter_matches() {
        let entry = AuditEntry::builder(&user(), AuditCheck::Permission)
            .permission(Permission::CreateJournal)
            .granted(true)
            .build();

        assert!(AuditLogFilter::new().matches(&entry));
        assert!(AuditLogFilter::new().user_id(user()).matches(&entry));
        assert!(!AuditLogFilter::new()
            .user_id(UserId::from("other"))
            .matches(&entry));
        assert!(!AuditLogFilter::new().granted(false).matches(&entry));
        assert!(!AuditLogFilter::new()
            .permission(Permission::DeleteAccount)
            .matches(&entry));
        assert!(!AuditLogFilter::new()
            .resource_type("journal")
            .matches(&entry));
    }

    #[test]
    fn test_filter_time_window() {
        let entry = AuditEntry::builder(&user(), AuditCheck::Permission).build();
        let earlier = entry.timestamp - Duration::seconds(5);
        let later = entry.timestamp + Duration::seconds(5);

        assert!(AuditLogFilter::new().from(earlier).to(later).matches(&entry));
        assert!(AuditLogFilter::new().from(entry.timestamp).matches(&entry));
        assert!(!AuditLogFilter::new().to(entry.timestamp).matches(&entry));
        assert!(!AuditLogFilter::new().from(later).matches(&entry));
    }

    #[test]
    fn test_audit_log_error_display() {
        let err = AuditLogError::Storage("connection failed".to_string());
        assert!(err.to_string().contains("connection failed"));

        let err = AuditLogError::NotFound(AuditLogId::new());
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_audit_check_serde() {
        let json = serde_json::to_string(&AuditCheck::UserDataAccess).unwrap();
        assert_eq!(json, "\"user_data_access\"");
    }
}
