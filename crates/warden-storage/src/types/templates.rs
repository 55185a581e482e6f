//! Permission template types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::{Permission, TemplateId, UserId};

/// Named, reusable bundle of permissions
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionTemplate {
    pub id: TemplateId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub permissions: BTreeSet<Permission>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

impl PermissionTemplate {
    /// Union this template's permissions into `target`. Returns the newly added ones.
    pub fn apply_to(&self, target: &mut BTreeSet<Permission>) -> Vec<Permission> {
        self.permissions
            .iter()
            .filter(|p| target.insert(**p))
            .copied()
            .collect()
    }
}

/// Parameters for creating a template
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTemplateParams {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub permissions: BTreeSet<Permission>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_is_union_not_replace() {
        let template = PermissionTemplate {
            id: TemplateId::new(),
            name: "analyst".into(),
            description: None,
            permissions: [Permission::ViewCompanyAnalytics, Permission::ViewOwnData]
                .into_iter()
                .collect(),
            created_by: UserId::from("admin"),
            created_at: Utc::now(),
        };

        let mut existing: BTreeSet<Permission> =
            [Permission::CreateJournal, Permission::ViewOwnData]
                .into_iter()
                .collect();
        let added = template.apply_to(&mut existing);

        assert_eq!(added, vec![Permission::ViewCompanyAnalytics]);
        assert_eq!(existing.len(), 3);
        assert!(existing.contains(&Permission::CreateJournal));
    }
}
