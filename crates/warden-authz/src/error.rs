//! Authorization failures.
//!
//! Boolean checks never fail; only the guard and the admin surface return
//! [`AuthzError`]. Each variant maps to a coarse [`ErrorKind`], a numeric
//! status-style `code()` and a stable machine-readable `error_code()`.

use thiserror::Error;
use warden_storage::{ParseError, Role, StoreError, SubscriptionTier};

/// Coarse classification callers branch on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidInput,
    Unauthenticated,
    InactiveActor,
    PermissionDenied,
    RoleDenied,
    ResourceAccessDenied,
    Internal,
}

#[derive(Debug, Error)]
pub enum AuthzError {
    /// Unknown role/permission/operator literal or malformed rule data.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unauthenticated")]
    Unauthenticated,

    #[error("user {user_id} is inactive")]
    InactiveActor { user_id: String },

    /// Generic RBAC/ABAC failure; `required` names the missing permission or action.
    #[error("permission denied: requires {required}")]
    PermissionDenied { required: String },

    #[error("role denied: requires {}, actual {actual}", format_roles(.required))]
    RoleDenied { required: Vec<Role>, actual: Role },

    #[error("subscription tier {required} required, actual {actual}")]
    SubscriptionRequired {
        required: SubscriptionTier,
        actual: SubscriptionTier,
    },

    #[error("email address is not verified")]
    EmailNotVerified,

    #[error("access denied to {resource_type}{}", format_resource_id(.resource_id))]
    ResourceAccessDenied {
        resource_type: String,
        resource_id: Option<String>,
    },

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

fn format_roles(roles: &[Role]) -> String {
    roles
        .iter()
        .map(Role::as_str)
        .collect::<Vec<_>>()
        .join(" | ")
}

fn format_resource_id(id: &Option<String>) -> String {
    id.as_ref().map(|id| format!(" {}", id)).unwrap_or_default()
}

impl AuthzError {
    pub fn permission(required: impl std::fmt::Display) -> Self {
        AuthzError::PermissionDenied {
            required: required.to_string(),
        }
    }

    pub fn resource(resource_type: impl Into<String>, resource_id: Option<String>) -> Self {
        AuthzError::ResourceAccessDenied {
            resource_type: resource_type.into(),
            resource_id,
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Unauthenticated => ErrorKind::Unauthenticated,
            Self::InactiveActor { .. } => ErrorKind::InactiveActor,
            Self::PermissionDenied { .. }
            | Self::SubscriptionRequired { .. }
            | Self::EmailNotVerified => ErrorKind::PermissionDenied,
            Self::RoleDenied { .. } => ErrorKind::RoleDenied,
            Self::ResourceAccessDenied { .. } => ErrorKind::ResourceAccessDenied,
            Self::Store(StoreError::NotFound) => ErrorKind::InvalidInput,
            Self::Store(_) => ErrorKind::Internal,
        }
    }

    /// HTTP-style status for the kind.
    #[must_use]
    pub fn code(&self) -> u16 {
        match self.kind() {
            ErrorKind::InvalidInput => 400,
            ErrorKind::Unauthenticated => 401,
            ErrorKind::InactiveActor
            | ErrorKind::PermissionDenied
            | ErrorKind::RoleDenied
            | ErrorKind::ResourceAccessDenied => 403,
            ErrorKind::Internal => 500,
        }
    }

    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::InactiveActor { .. } => "INACTIVE_USER",
            Self::PermissionDenied { .. } => "PERMISSION_DENIED",
            Self::RoleDenied { .. } => "ROLE_DENIED",
            Self::SubscriptionRequired { .. } => "SUBSCRIPTION_REQUIRED",
            Self::EmailNotVerified => "EMAIL_NOT_VERIFIED",
            Self::ResourceAccessDenied { .. } => "RESOURCE_ACCESS_DENIED",
            Self::Store(StoreError::NotFound) => "NOT_FOUND",
            Self::Store(_) => "INTERNAL",
        }
    }
}

impl From<ParseError> for AuthzError {
    fn from(e: ParseError) -> Self {
        AuthzError::InvalidInput(e.to_string())
    }
}
