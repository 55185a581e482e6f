//! Effective permission sets and their provenance.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use warden_storage::{Actor, Permission};

use crate::catalog::RoleCatalog;

/// Which mechanism granted a permission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionSource {
    /// Explicit grant on the user record.
    Direct,
    /// Base permission of the user's role.
    Role,
    /// Supplied by the caller for this resolution only.
    Additional,
    None,
}

impl PermissionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionSource::Direct => "direct",
            PermissionSource::Role => "role",
            PermissionSource::Additional => "additional",
            PermissionSource::None => "none",
        }
    }
}

impl std::fmt::Display for PermissionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Default)]
pub struct EffectivePermissionResolver {
    catalog: Arc<RoleCatalog>,
}

impl EffectivePermissionResolver {
    pub fn new(catalog: Arc<RoleCatalog>) -> Self {
        Self { catalog }
    }

    /// Union of role, explicit and `additional` permissions.
    ///
    /// The actor's active flag is not consulted; this reports what the user
    /// would hold, not what a check would currently allow.
    pub fn effective_permissions(
        &self,
        actor: &Actor,
        additional: &[Permission],
    ) -> BTreeSet<Permission> {
        let mut set = self.catalog.role_permissions(actor.role);
        set.extend(actor.permissions.iter().copied());
        set.extend(additional.iter().copied());
        set
    }

    /// `Direct` wins over `Role` when both apply.
    pub fn permission_source(&self, actor: &Actor, permission: Permission) -> PermissionSource {
        if actor.permissions.contains(&permission) {
            PermissionSource::Direct
        } else if self.catalog.role_grants(actor.role, permission) {
            PermissionSource::Role
        } else {
            PermissionSource::None
        }
    }

    /// Every effective permission with the source that granted it.
    pub fn effective_grants(
        &self,
        actor: &Actor,
        additional: &[Permission],
    ) -> BTreeMap<Permission, PermissionSource> {
        self.effective_permissions(actor, additional)
            .into_iter()
            .map(|p| match self.permission_source(actor, p) {
                PermissionSource::None => (p, PermissionSource::Additional),
                source => (p, source),
            })
            .collect()
    }
}
