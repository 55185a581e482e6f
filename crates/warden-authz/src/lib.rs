//! Role- and attribute-based authorization engine.
//!
//! The pure parts ([`RoleCatalog`], [`PermissionEvaluator`], [`RuleEngine`],
//! [`EffectivePermissionResolver`]) are synchronous and hold no mutable state.
//! [`AccessGuard`] turns their decisions into `Result`s and records each one in
//! an [`warden_audit::AuditLog`]. [`PolicyAdmin`] manages the rules and
//! templates the engine reads.
//!
//! ```ignore
//! let catalog = Arc::new(RoleCatalog::standard());
//! let evaluator = PermissionEvaluator::new(catalog);
//! let engine = RuleEngine::new(&config);
//! let policy = RuleBackedPolicy::new(rules, evaluator.clone(), engine.clone());
//! let guard = AccessGuard::new(evaluator, engine, Arc::new(policy), audit)
//!     .with_config(&config);
//!
//! guard.require_permission(&actor, Permission::ManageCompany).await?;
//! ```

mod admin;
mod catalog;
mod context;
mod error;
mod evaluator;
mod guard;
pub mod path;
mod policy;
mod resolver;
mod rules;

pub use admin::PolicyAdmin;
pub use catalog::{base_permissions, is_higher_role, role_level, RoleCatalog};
pub use context::{Environment, PermissionContext, RequestInfo, ResourceRef};
pub use error::{AuthzError, ErrorKind};
pub use evaluator::PermissionEvaluator;
pub use guard::{AccessGuard, Requirement};
pub use policy::{ResourcePolicy, RuleBackedPolicy};
pub use resolver::{EffectivePermissionResolver, PermissionSource};
pub use rules::RuleEngine;
