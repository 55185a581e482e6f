//! Closed vocabularies: roles, permissions and subscription tiers.
//!
//! Every literal a caller can hand to the engine is parsed through `FromStr`
//! here. Parsing is case sensitive and anything outside the vocabulary is an
//! error, never a silent "no permission".

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::ParseError;

/// Platform role assigned to a user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    SuperAdmin,
    CompanyAdmin,
    CompanyManager,
    CompanyUser,
    IndividualUser,
}

impl FromStr for Role {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUPER_ADMIN" => Ok(Role::SuperAdmin),
            "COMPANY_ADMIN" => Ok(Role::CompanyAdmin),
            "COMPANY_MANAGER" => Ok(Role::CompanyManager),
            "COMPANY_USER" => Ok(Role::CompanyUser),
            "INDIVIDUAL_USER" => Ok(Role::IndividualUser),
            _ => Err(ParseError::Role(s.to_string())),
        }
    }
}

impl Role {
    /// All roles, highest privilege first.
    pub const ALL: [Role; 5] = [
        Role::SuperAdmin,
        Role::CompanyAdmin,
        Role::CompanyManager,
        Role::CompanyUser,
        Role::IndividualUser,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "SUPER_ADMIN",
            Role::CompanyAdmin => "COMPANY_ADMIN",
            Role::CompanyManager => "COMPANY_MANAGER",
            Role::CompanyUser => "COMPANY_USER",
            Role::IndividualUser => "INDIVIDUAL_USER",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Atomic capability. The vocabulary is fixed at 13 entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    // Platform
    ManagePlatform,
    ViewPlatformAnalytics,
    ManageCompanies,
    ManageSuperAdmins,

    // Company
    ManageCompany,
    ViewCompanyAnalytics,
    ManageCompanyUsers,
    ManageDepartments,

    // User
    ManageProfile,
    CreateJournal,
    ViewOwnData,
    DeleteAccount,
    ViewCompanyData,
}

impl FromStr for Permission {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manage_platform" => Ok(Permission::ManagePlatform),
            "view_platform_analytics" => Ok(Permission::ViewPlatformAnalytics),
            "manage_companies" => Ok(Permission::ManageCompanies),
            "manage_super_admins" => Ok(Permission::ManageSuperAdmins),
            "manage_company" => Ok(Permission::ManageCompany),
            "view_company_analytics" => Ok(Permission::ViewCompanyAnalytics),
            "manage_company_users" => Ok(Permission::ManageCompanyUsers),
            "manage_departments" => Ok(Permission::ManageDepartments),
            "manage_profile" => Ok(Permission::ManageProfile),
            "create_journal" => Ok(Permission::CreateJournal),
            "view_own_data" => Ok(Permission::ViewOwnData),
            "delete_account" => Ok(Permission::DeleteAccount),
            "view_company_data" => Ok(Permission::ViewCompanyData),
            _ => Err(ParseError::Permission(s.to_string())),
        }
    }
}

impl Permission {
    pub const ALL: [Permission; 13] = [
        Permission::ManagePlatform,
        Permission::ViewPlatformAnalytics,
        Permission::ManageCompanies,
        Permission::ManageSuperAdmins,
        Permission::ManageCompany,
        Permission::ViewCompanyAnalytics,
        Permission::ManageCompanyUsers,
        Permission::ManageDepartments,
        Permission::ManageProfile,
        Permission::CreateJournal,
        Permission::ViewOwnData,
        Permission::DeleteAccount,
        Permission::ViewCompanyData,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ManagePlatform => "manage_platform",
            Permission::ViewPlatformAnalytics => "view_platform_analytics",
            Permission::ManageCompanies => "manage_companies",
            Permission::ManageSuperAdmins => "manage_super_admins",
            Permission::ManageCompany => "manage_company",
            Permission::ViewCompanyAnalytics => "view_company_analytics",
            Permission::ManageCompanyUsers => "manage_company_users",
            Permission::ManageDepartments => "manage_departments",
            Permission::ManageProfile => "manage_profile",
            Permission::CreateJournal => "create_journal",
            Permission::ViewOwnData => "view_own_data",
            Permission::DeleteAccount => "delete_account",
            Permission::ViewCompanyData => "view_company_data",
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subscription tier. Declaration order is the ordinal: free < premium < enterprise.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionTier {
    #[default]
    Free,
    Premium,
    Enterprise,
}

impl FromStr for SubscriptionTier {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(SubscriptionTier::Free),
            "premium" => Ok(SubscriptionTier::Premium),
            "enterprise" => Ok(SubscriptionTier::Enterprise),
            _ => Err(ParseError::SubscriptionTier(s.to_string())),
        }
    }
}

impl SubscriptionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionTier::Free => "free",
            SubscriptionTier::Premium => "premium",
            SubscriptionTier::Enterprise => "enterprise",
        }
    }
}

impl std::fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!("SUPER_ADMIN".parse::<Role>().unwrap(), Role::SuperAdmin);
        assert_eq!("COMPANY_USER".parse::<Role>().unwrap(), Role::CompanyUser);
        assert_eq!(
            "INDIVIDUAL_USER".parse::<Role>().unwrap(),
            Role::IndividualUser
        );
    }

    #[test]
    fn test_role_parse_invalid() {
        assert!("company_admin".parse::<Role>().is_err()); // Case sensitive
        assert!("ADMIN".parse::<Role>().is_err());
        assert!("".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_roundtrip() {
        for role in Role::ALL {
            let parsed: Role = role.as_str().parse().unwrap();
            assert_eq!(role, parsed);
        }
    }

    #[test]
    fn test_role_serde_matches_as_str() {
        let json = serde_json::to_string(&Role::CompanyManager).unwrap();
        assert_eq!(json, "\"COMPANY_MANAGER\"");
    }

    #[test]
    fn test_permission_vocabulary_is_closed() {
        assert_eq!(Permission::ALL.len(), 13);
        for p in Permission::ALL {
            assert_eq!(p.as_str().parse::<Permission>().unwrap(), p);
            assert_eq!(
                serde_json::to_string(&p).unwrap(),
                format!("\"{}\"", p.as_str())
            );
        }
        assert!("manage_everything".parse::<Permission>().is_err());
        assert!("MANAGE_PLATFORM".parse::<Permission>().is_err());
    }

    #[test]
    fn test_permission_unknown_rejected_by_serde() {
        let result: Result<Permission, _> = serde_json::from_str("\"read_minds\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_errors_name_the_vocabulary() {
        assert_eq!(
            "boss".parse::<Role>().unwrap_err(),
            ParseError::Role("boss".into())
        );
        assert_eq!(
            "fly".parse::<Permission>().unwrap_err().to_string(),
            "invalid permission: fly"
        );
    }

    #[test]
    fn test_subscription_tier_ordering() {
        assert!(SubscriptionTier::Free < SubscriptionTier::Premium);
        assert!(SubscriptionTier::Premium < SubscriptionTier::Enterprise);
        assert_eq!(SubscriptionTier::default(), SubscriptionTier::Free);
    }

    #[test]
    fn test_subscription_tier_parse() {
        assert_eq!(
            "enterprise".parse::<SubscriptionTier>().unwrap(),
            SubscriptionTier::Enterprise
        );
        assert_eq!(
            "pro".parse::<SubscriptionTier>().unwrap_err(),
            ParseError::SubscriptionTier("pro".into())
        );
    }
}
