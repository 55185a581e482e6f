//! Role hierarchy and base permission table.
//!
//! Levels are a fixed property of [`Role`] and live in [`role_level`]. The
//! role to permission table is a value: [`RoleCatalog::standard`] builds the
//! production table, [`RoleCatalog::from_fn`] builds any other one for tests.

use std::collections::{BTreeMap, BTreeSet};
use warden_storage::{Actor, CompanyId, Permission, Role};

/// Hierarchy level of a role. Higher means more privilege.
pub const fn role_level(role: Role) -> u8 {
    match role {
        Role::SuperAdmin => 5,
        Role::CompanyAdmin => 4,
        Role::CompanyManager => 3,
        Role::CompanyUser => 2,
        Role::IndividualUser => 1,
    }
}

/// Strictly greater hierarchy level.
pub const fn is_higher_role(a: Role, b: Role) -> bool {
    role_level(a) > role_level(b)
}

/// Permission set each role starts with.
pub fn base_permissions(role: Role) -> &'static [Permission] {
    use Permission::*;

    match role {
        Role::SuperAdmin => &Permission::ALL,
        Role::CompanyAdmin => &[
            ManageCompany,
            ViewCompanyAnalytics,
            ManageCompanyUsers,
            ManageDepartments,
            ManageProfile,
            CreateJournal,
            ViewOwnData,
            DeleteAccount,
            ViewCompanyData,
        ],
        Role::CompanyManager => &[
            ViewCompanyAnalytics,
            ManageDepartments,
            ManageProfile,
            CreateJournal,
            ViewOwnData,
            DeleteAccount,
            ViewCompanyData,
        ],
        Role::CompanyUser => &[
            ManageProfile,
            CreateJournal,
            ViewOwnData,
            DeleteAccount,
            ViewCompanyData,
        ],
        Role::IndividualUser => &[ManageProfile, CreateJournal, ViewOwnData, DeleteAccount],
    }
}

/// Immutable role to permission table, built once and shared.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoleCatalog {
    permissions: BTreeMap<Role, BTreeSet<Permission>>,
}

impl Default for RoleCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl RoleCatalog {
    /// The production table.
    pub fn standard() -> Self {
        Self::from_fn(|role| base_permissions(role).iter().copied().collect())
    }

    /// Build a table by asking `f` for every role.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(Role) -> BTreeSet<Permission>,
    {
        Self {
            permissions: Role::ALL.into_iter().map(|role| (role, f(role))).collect(),
        }
    }

    pub fn role_level(&self, role: Role) -> u8 {
        role_level(role)
    }

    pub fn is_higher_role(&self, a: Role, b: Role) -> bool {
        is_higher_role(a, b)
    }

    /// Owned copy of the role's permissions; callers may mutate it freely.
    pub fn role_permissions(&self, role: Role) -> BTreeSet<Permission> {
        self.permissions.get(&role).cloned().unwrap_or_default()
    }

    /// Borrowing membership test used on the evaluation hot path.
    pub fn role_grants(&self, role: Role, permission: Permission) -> bool {
        self.permissions
            .get(&role)
            .is_some_and(|set| set.contains(&permission))
    }

    /// Roles an assigner of `role` may hand out, highest first.
    pub fn assignable_roles(&self, role: Role) -> Vec<Role> {
        match role {
            Role::SuperAdmin => Role::ALL.to_vec(),
            Role::CompanyAdmin => vec![Role::CompanyAdmin, Role::CompanyManager, Role::CompanyUser],
            Role::CompanyManager | Role::CompanyUser | Role::IndividualUser => Vec::new(),
        }
    }

    /// Whether `assigner` may give `target_role` to a user of `target_company`.
    pub fn can_assign_role(
        &self,
        assigner: &Actor,
        target_role: Role,
        target_company: Option<&CompanyId>,
    ) -> bool {
        if !assigner.active {
            return false;
        }
        match assigner.role {
            Role::SuperAdmin => true,
            Role::CompanyAdmin => {
                assigner.company_id.as_ref() == target_company
                    && matches!(
                        target_role,
                        Role::CompanyAdmin | Role::CompanyManager | Role::CompanyUser
                    )
            }
            Role::CompanyManager | Role::CompanyUser | Role::IndividualUser => false,
        }
    }
}
