//! Rule and template administration.
//!
//! Every call requires the acting admin to hold `manage_platform`. Rule data is
//! validated before it reaches the store, and the admin's id is passed through
//! as `created_by`/`updated_by`.

use std::sync::Arc;
use warden_audit::{AuditCheck, AuditEntry};
use warden_storage::{
    Actor, CreateRuleParams, CreateTemplateParams, Permission, PermissionRule,
    PermissionTemplate, RuleFilter, RuleId, RuleStore, TemplateId, TemplateStore,
    UpdateRuleParams, UserId,
};

use crate::error::AuthzError;
use crate::guard::AccessGuard;

pub struct PolicyAdmin {
    guard: AccessGuard,
    rules: Arc<dyn RuleStore>,
    templates: Arc<dyn TemplateStore>,
}

impl PolicyAdmin {
    pub fn new(
        guard: AccessGuard,
        rules: Arc<dyn RuleStore>,
        templates: Arc<dyn TemplateStore>,
    ) -> Self {
        Self {
            guard,
            rules,
            templates,
        }
    }

    async fn authorize(&self, admin: &Actor) -> Result<(), AuthzError> {
        self.guard
            .require_permission(admin, Permission::ManagePlatform)
            .await
    }

    pub async fn create_rule(
        &self,
        admin: &Actor,
        params: &CreateRuleParams,
    ) -> Result<PermissionRule, AuthzError> {
        self.authorize(admin).await?;
        require_non_empty("name", &params.name)?;
        require_non_empty("resourceType", &params.resource_type)?;
        require_non_empty("action", &params.action)?;
        self.guard.engine().validate_conditions(&params.conditions)?;

        let rule = self.rules.create_rule(params, &admin.id).await?;

        tracing::info!(rule_id = %rule.id, admin = %admin.id, "Permission rule created");
        self.guard
            .record(
                AuditEntry::builder(&admin.id, AuditCheck::RuleCreate)
                    .action(rule.action.as_str())
                    .resource(rule.resource_type.as_str(), Some(rule.id.to_string()))
                    .granted(true)
                    .build(),
            )
            .await;
        Ok(rule)
    }

    pub async fn update_rule(
        &self,
        admin: &Actor,
        rule_id: &RuleId,
        params: &UpdateRuleParams,
    ) -> Result<PermissionRule, AuthzError> {
        self.authorize(admin).await?;
        if let Some(name) = &params.name {
            require_non_empty("name", name)?;
        }
        if let Some(conditions) = &params.conditions {
            self.guard.engine().validate_conditions(conditions)?;
        }

        let rule = self.rules.update_rule(rule_id, params, &admin.id).await?;

        tracing::info!(rule_id = %rule.id, admin = %admin.id, "Permission rule updated");
        self.guard
            .record(
                AuditEntry::builder(&admin.id, AuditCheck::RuleUpdate)
                    .resource(rule.resource_type.as_str(), Some(rule.id.to_string()))
                    .granted(true)
                    .build(),
            )
            .await;
        Ok(rule)
    }

    pub async fn delete_rule(&self, admin: &Actor, rule_id: &RuleId) -> Result<(), AuthzError> {
        self.authorize(admin).await?;
        self.rules.delete_rule(rule_id, &admin.id).await?;

        tracing::info!(rule_id = %rule_id, admin = %admin.id, "Permission rule deleted");
        self.guard
            .record(
                AuditEntry::builder(&admin.id, AuditCheck::RuleDelete)
                    .resource("rule", Some(rule_id.to_string()))
                    .granted(true)
                    .build(),
            )
            .await;
        Ok(())
    }

    /// Rules matching `filter`, highest priority first.
    pub async fn list_rules(
        &self,
        admin: &Actor,
        filter: &RuleFilter,
    ) -> Result<Vec<PermissionRule>, AuthzError> {
        self.authorize(admin).await?;
        let mut rules = self.rules.list_rules(filter).await?;
        rules.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.name.cmp(&b.name)));
        Ok(rules)
    }

    pub async fn create_template(
        &self,
        admin: &Actor,
        params: &CreateTemplateParams,
    ) -> Result<PermissionTemplate, AuthzError> {
        self.authorize(admin).await?;
        require_non_empty("name", &params.name)?;

        let template = self.templates.create_template(params, &admin.id).await?;

        tracing::info!(
            template_id = %template.id,
            admin = %admin.id,
            "Permission template created"
        );
        self.guard
            .record(
                AuditEntry::builder(&admin.id, AuditCheck::TemplateCreate)
                    .resource("template", Some(template.id.to_string()))
                    .granted(true)
                    .build(),
            )
            .await;
        Ok(template)
    }

    pub async fn get_template(
        &self,
        admin: &Actor,
        template_id: &TemplateId,
    ) -> Result<PermissionTemplate, AuthzError> {
        self.authorize(admin).await?;
        Ok(self.templates.get_template(template_id).await?)
    }

    pub async fn list_templates(
        &self,
        admin: &Actor,
    ) -> Result<Vec<PermissionTemplate>, AuthzError> {
        self.authorize(admin).await?;
        Ok(self.templates.list_templates().await?)
    }

    /// Union the template's permissions into the user's explicit grants.
    pub async fn apply_template(
        &self,
        admin: &Actor,
        user_id: &UserId,
        template_id: &TemplateId,
    ) -> Result<Actor, AuthzError> {
        self.authorize(admin).await?;
        let user = self
            .templates
            .apply_template(user_id, template_id, &admin.id)
            .await?;

        tracing::info!(
            user_id = %user_id,
            template_id = %template_id,
            admin = %admin.id,
            "Permission template applied"
        );
        self.guard
            .record(
                AuditEntry::builder(&admin.id, AuditCheck::TemplateApply)
                    .resource("user", Some(user_id.as_str()))
                    .reason(format!("template {}", template_id))
                    .granted(true)
                    .build(),
            )
            .await;
        Ok(user)
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<(), AuthzError> {
    if value.trim().is_empty() {
        return Err(AuthzError::InvalidInput(format!("{} must not be empty", field)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::evaluator::PermissionEvaluator;
    use crate::policy::RuleBackedPolicy;
    use crate::rules::RuleEngine;
    use serde_json::json;
    use warden_audit::{AuditLog, AuditLogFilter};
    use warden_audit_memory::MemoryAuditLog;
    use warden_storage::{ConditionOperator, PermissionCondition, Role, RuleEffect, StoreError};
    use warden_store_memory::MemoryStore;

    fn setup() -> (PolicyAdmin, MemoryStore, MemoryAuditLog) {
        let store = MemoryStore::new();
        let log = MemoryAuditLog::new();
        let evaluator = PermissionEvaluator::default();
        let engine = RuleEngine::default();
        let policy = RuleBackedPolicy::new(
            Arc::new(store.clone()),
            evaluator.clone(),
            engine.clone(),
        );
        let guard = AccessGuard::new(evaluator, engine, Arc::new(policy), Arc::new(log.clone()));
        let admin = PolicyAdmin::new(guard, Arc::new(store.clone()), Arc::new(store.clone()));
        (admin, store, log)
    }

    fn params(conditions: Vec<PermissionCondition>) -> CreateRuleParams {
        CreateRuleParams {
            name: "tenant readers".into(),
            description: None,
            resource_type: "journal".into(),
            action: "read".into(),
            conditions,
            effect: RuleEffect::Allow,
            priority: 1,
            active: true,
        }
    }

    #[tokio::test]
    async fn test_create_rule_requires_manage_platform() {
        let (admin, _store, _log) = setup();
        let company_admin = Actor::new("ca", Role::CompanyAdmin).with_company("C1");

        let err = admin
            .create_rule(&company_admin, &params(vec![]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    }

    #[tokio::test]
    async fn test_create_rule_records_creator() {
        let (admin, store, log) = setup();
        let root = Actor::new("root", Role::SuperAdmin);

        let rule = admin
            .create_rule(
                &root,
                &params(vec![PermissionCondition::new(
                    "user.role",
                    ConditionOperator::In,
                    json!(["COMPANY_ADMIN", "COMPANY_USER"]),
                )]),
            )
            .await
            .unwrap();

        assert_eq!(rule.created_by, UserId::from("root"));
        assert_eq!(store.get_rule(&rule.id).await.unwrap().name, "tenant readers");
        let created = log
            .query(AuditLogFilter::new().check(AuditCheck::RuleCreate))
            .await
            .unwrap();
        assert_eq!(created.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_rules_are_rejected() {
        let (admin, store, _log) = setup();
        let root = Actor::new("root", Role::SuperAdmin);

        let bad_in = params(vec![PermissionCondition::new(
            "user.role",
            ConditionOperator::In,
            json!("COMPANY_ADMIN"),
        )]);
        let unknown: PermissionCondition = serde_json::from_value(json!({
            "field": "user.role",
            "operator": "starts_with",
            "value": "COMPANY"
        }))
        .unwrap();
        let mut blank = params(vec![]);
        blank.action = " ".into();

        for p in [bad_in, params(vec![unknown]), blank] {
            let err = admin.create_rule(&root, &p).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput, "{err}");
        }
        assert!(store.list_rules(&RuleFilter::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_and_delete_rule() {
        let (admin, _store, _log) = setup();
        let root = Actor::new("root", Role::SuperAdmin);
        let other = Actor::new("root-2", Role::SuperAdmin);
        let rule = admin.create_rule(&root, &params(vec![])).await.unwrap();

        let updated = admin
            .update_rule(
                &other,
                &rule.id,
                &UpdateRuleParams {
                    effect: Some(RuleEffect::Deny),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.effect, RuleEffect::Deny);
        assert_eq!(updated.updated_by, Some(UserId::from("root-2")));

        let bad = UpdateRuleParams {
            conditions: Some(vec![PermissionCondition::new(
                "user.email",
                ConditionOperator::Regex,
                json!("(["),
            )]),
            ..Default::default()
        };
        assert!(admin.update_rule(&root, &rule.id, &bad).await.is_err());

        admin.delete_rule(&root, &rule.id).await.unwrap();
        let err = admin.delete_rule(&root, &rule.id).await.unwrap_err();
        assert!(matches!(err, AuthzError::Store(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn test_list_rules_orders_by_priority() {
        let (admin, _store, _log) = setup();
        let root = Actor::new("root", Role::SuperAdmin);
        for priority in [3, 10, -1] {
            let mut p = params(vec![]);
            p.priority = priority;
            admin.create_rule(&root, &p).await.unwrap();
        }

        let rules = admin.list_rules(&root, &RuleFilter::new()).await.unwrap();
        let priorities: Vec<i32> = rules.iter().map(|r| r.priority).collect();
        assert_eq!(priorities, vec![10, 3, -1]);
    }

    #[tokio::test]
    async fn test_templates_apply_additively() {
        let (admin, store, _log) = setup();
        let root = Actor::new("root", Role::SuperAdmin);
        store.put_user(
            Actor::new("u-1", Role::CompanyUser)
                .with_company("C1")
                .with_permissions([Permission::ManageDepartments]),
        );

        let template = admin
            .create_template(
                &root,
                &CreateTemplateParams {
                    name: "analyst".into(),
                    description: Some("read-only analytics".into()),
                    permissions: [Permission::ViewCompanyAnalytics].into_iter().collect(),
                },
            )
            .await
            .unwrap();

        assert_eq!(admin.list_templates(&root).await.unwrap().len(), 1);
        assert_eq!(
            admin.get_template(&root, &template.id).await.unwrap().name,
            "analyst"
        );

        let user = admin
            .apply_template(&root, &UserId::from("u-1"), &template.id)
            .await
            .unwrap();
        assert!(user.permissions.contains(&Permission::ManageDepartments));
        assert!(user.permissions.contains(&Permission::ViewCompanyAnalytics));

        let missing = admin
            .apply_template(&root, &UserId::from("ghost"), &template.id)
            .await
            .unwrap_err();
        assert_eq!(missing.error_code(), "NOT_FOUND");
    }
}
