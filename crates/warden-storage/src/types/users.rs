//! User types as consumed by the engine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::{CompanyId, Permission, Role, SubscriptionTier, UserId};

/// Read-only snapshot of a user, owned by the user repository.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub id: UserId,
    #[serde(default)]
    pub email: String,
    pub active: bool,
    #[serde(default)]
    pub email_verified: bool,
    pub role: Role,
    /// Absent for individual users and super admins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<CompanyId>,
    /// Explicit grants on top of the role table. Additive only.
    #[serde(default)]
    pub permissions: BTreeSet<Permission>,
    #[serde(default)]
    pub subscription_tier: SubscriptionTier,
}

impl Actor {
    /// Active, verified actor with no company and no explicit permissions.
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: UserId(id.into()),
            email: String::new(),
            active: true,
            email_verified: true,
            role,
            company_id: None,
            permissions: BTreeSet::new(),
            subscription_tier: SubscriptionTier::Free,
        }
    }

    pub fn with_company(mut self, company_id: impl Into<String>) -> Self {
        self.company_id = Some(CompanyId(company_id.into()));
        self
    }

    pub fn with_permissions(mut self, permissions: impl IntoIterator<Item = Permission>) -> Self {
        self.permissions.extend(permissions);
        self
    }

    pub fn with_tier(mut self, tier: SubscriptionTier) -> Self {
        self.subscription_tier = tier;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// True when both actors belong to the same (present) company.
    pub fn shares_company_with(&self, other: &Actor) -> bool {
        matches!((&self.company_id, &other.company_id), (Some(a), Some(b)) if a == b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actor_serializes_camel_case() {
        let actor = Actor::new("u-1", Role::CompanyAdmin)
            .with_company("C1")
            .with_permissions([Permission::CreateJournal]);
        let json = serde_json::to_value(&actor).unwrap();

        assert_eq!(json["role"], "COMPANY_ADMIN");
        assert_eq!(json["companyId"], "C1");
        assert_eq!(json["permissions"][0], "create_journal");
        assert_eq!(json["subscriptionTier"], "free");
    }

    #[test]
    fn test_actor_omits_missing_company() {
        let actor = Actor::new("u-1", Role::IndividualUser);
        let json = serde_json::to_value(&actor).unwrap();
        assert!(json.get("companyId").is_none());
    }

    #[test]
    fn test_actor_deserialize_defaults() {
        let actor: Actor =
            serde_json::from_str(r#"{"id":"u-9","active":true,"role":"COMPANY_USER"}"#).unwrap();
        assert!(actor.permissions.is_empty());
        assert_eq!(actor.subscription_tier, SubscriptionTier::Free);
        assert!(actor.company_id.is_none());
        assert!(!actor.email_verified);
    }

    #[test]
    fn test_actor_rejects_unknown_permission() {
        let result: Result<Actor, _> = serde_json::from_str(
            r#"{"id":"u-9","active":true,"role":"COMPANY_USER","permissions":["root"]}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_shares_company_with() {
        let a = Actor::new("a", Role::CompanyUser).with_company("C1");
        let b = Actor::new("b", Role::CompanyUser).with_company("C1");
        let c = Actor::new("c", Role::CompanyUser).with_company("C2");
        let none1 = Actor::new("d", Role::IndividualUser);
        let none2 = Actor::new("e", Role::IndividualUser);

        assert!(a.shares_company_with(&b));
        assert!(!a.shares_company_with(&c));
        assert!(!none1.shares_company_with(&none2));
    }
}
