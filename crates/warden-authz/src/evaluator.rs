//! RBAC checks and tenant relationship predicates.
//!
//! Everything here is a pure function of its arguments and the injected
//! [`RoleCatalog`]. A failed check is `false`, never an error.

use std::sync::Arc;
use warden_storage::{Actor, CompanyId, Permission, Role};

use crate::catalog::RoleCatalog;

#[derive(Clone, Debug, Default)]
pub struct PermissionEvaluator {
    catalog: Arc<RoleCatalog>,
}

impl PermissionEvaluator {
    pub fn new(catalog: Arc<RoleCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &RoleCatalog {
        &self.catalog
    }

    /// Explicit grants first, then the role table. Inactive actors hold nothing.
    pub fn has_permission(&self, actor: &Actor, permission: Permission) -> bool {
        if !actor.active {
            return false;
        }
        actor.permissions.contains(&permission) || self.catalog.role_grants(actor.role, permission)
    }

    /// `false` for an empty list.
    pub fn has_any_permission(&self, actor: &Actor, permissions: &[Permission]) -> bool {
        permissions.iter().any(|p| self.has_permission(actor, *p))
    }

    /// `true` for an empty list.
    pub fn has_all_permissions(&self, actor: &Actor, permissions: &[Permission]) -> bool {
        permissions.iter().all(|p| self.has_permission(actor, *p))
    }

    pub fn can_access_company(&self, actor: &Actor, company_id: &CompanyId) -> bool {
        if !actor.active {
            return false;
        }
        if actor.role == Role::SuperAdmin {
            return true;
        }
        actor.company_id.as_ref() == Some(company_id)
    }

    pub fn can_manage_user(&self, manager: &Actor, target: &Actor) -> bool {
        if !manager.active || !target.active {
            return false;
        }
        if manager.role == Role::SuperAdmin {
            return true;
        }
        // Two actors without a company are not in the same tenant.
        if !manager.shares_company_with(target) {
            return false;
        }
        match manager.role {
            Role::CompanyAdmin => target.role != Role::SuperAdmin,
            Role::CompanyManager => target.role == Role::CompanyUser,
            Role::SuperAdmin | Role::CompanyUser | Role::IndividualUser => false,
        }
    }

    pub fn can_view_user_data(&self, viewer: &Actor, target: &Actor) -> bool {
        if viewer.id == target.id {
            return true;
        }
        match viewer.role {
            Role::SuperAdmin => true,
            Role::CompanyAdmin | Role::CompanyManager => {
                viewer.shares_company_with(target)
                    && self.has_permission(viewer, Permission::ViewCompanyData)
            }
            Role::CompanyUser | Role::IndividualUser => false,
        }
    }
}
