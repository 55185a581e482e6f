//! Storage abstraction for warden.
//!
//! Holds the domain vocabulary (roles, permissions, rules, templates, actor
//! snapshots) and the collaborator traits the authorization engine consumes.
//! Backend crates (e.g., warden-store-memory) implement the traits so
//! `warden-authz` never depends on a specific database engine.

use thiserror::Error;

mod store;
mod types;

pub use store::*;
pub use types::*;

/// Uniform error type for all storage backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found")]
    NotFound,
    #[error("already exists")]
    AlreadyExists,
    #[error("conflict")]
    Conflict,
    #[error("backend error: {0}")]
    Backend(String),
}

/// Error returned when a vocabulary literal is outside its closed set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid role: {0}")]
    Role(String),
    #[error("invalid permission: {0}")]
    Permission(String),
    #[error("invalid subscription tier: {0}")]
    SubscriptionTier(String),
    #[error("invalid condition operator: {0}")]
    ConditionOperator(String),
    #[error("invalid logical operator: {0}")]
    LogicalOperator(String),
    #[error("invalid rule effect: {0}")]
    RuleEffect(String),
}
