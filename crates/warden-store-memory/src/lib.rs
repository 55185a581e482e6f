//! In-memory collaborator stores.
//!
//! Implements [`UserLookup`], [`RuleStore`] and [`TemplateStore`] over
//! concurrent maps. Suitable for tests, demos and the CLI; nothing survives a
//! restart.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use warden_storage::{
    Actor, CreateRuleParams, CreateTemplateParams, PermissionRule, PermissionTemplate, RuleFilter,
    RuleId, RuleStore, StoreError, TemplateId, TemplateStore, UpdateRuleParams, UserId,
    UserLookup,
};

/// In-memory store for users, rules and templates.
#[derive(Clone, Default)]
pub struct MemoryStore {
    users: Arc<DashMap<UserId, Actor>>,
    rules: Arc<DashMap<RuleId, PermissionRule>>,
    templates: Arc<DashMap<TemplateId, PermissionTemplate>>,
    template_names: Arc<DashMap<String, TemplateId>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a user snapshot.
    pub fn put_user(&self, actor: Actor) {
        self.users.insert(actor.id.clone(), actor);
    }
}

#[async_trait]
impl UserLookup for MemoryStore {
    async fn get_by_id(&self, user_id: &UserId) -> Result<Actor, StoreError> {
        self.users
            .get(user_id)
            .map(|u| u.value().clone())
            .ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl RuleStore for MemoryStore {
    async fn list_rules(&self, filter: &RuleFilter) -> Result<Vec<PermissionRule>, StoreError> {
        Ok(self
            .rules
            .iter()
            .filter(|r| filter.matches(r.value()))
            .map(|r| r.value().clone())
            .collect())
    }

    async fn get_rule(&self, rule_id: &RuleId) -> Result<PermissionRule, StoreError> {
        self.rules
            .get(rule_id)
            .map(|r| r.value().clone())
            .ok_or(StoreError::NotFound)
    }

    async fn create_rule(
        &self,
        params: &CreateRuleParams,
        created_by: &UserId,
    ) -> Result<PermissionRule, StoreError> {
        let now = Utc::now();
        let rule = PermissionRule {
            id: RuleId::new(),
            name: params.name.clone(),
            description: params.description.clone(),
            resource_type: params.resource_type.clone(),
            action: params.action.clone(),
            conditions: params.conditions.clone(),
            effect: params.effect,
            priority: params.priority,
            active: params.active,
            created_by: created_by.clone(),
            updated_by: None,
            created_at: now,
            updated_at: now,
        };
        self.rules.insert(rule.id, rule.clone());

        tracing::debug!(rule_id = %rule.id, created_by = %created_by, "Rule created");
        Ok(rule)
    }

    async fn update_rule(
        &self,
        rule_id: &RuleId,
        params: &UpdateRuleParams,
        updated_by: &UserId,
    ) -> Result<PermissionRule, StoreError> {
        let mut rule = self.rules.get_mut(rule_id).ok_or(StoreError::NotFound)?;

        if let Some(name) = &params.name {
            rule.name = name.clone();
        }
        if let Some(description) = &params.description {
            rule.description = Some(description.clone());
        }
        if let Some(conditions) = &params.conditions {
            rule.conditions = conditions.clone();
        }
        if let Some(effect) = params.effect {
            rule.effect = effect;
        }
        if let Some(priority) = params.priority {
            rule.priority = priority;
        }
        if let Some(active) = params.active {
            rule.active = active;
        }
        rule.updated_by = Some(updated_by.clone());
        rule.updated_at = Utc::now();

        tracing::debug!(rule_id = %rule_id, updated_by = %updated_by, "Rule updated");
        Ok(rule.clone())
    }

    async fn delete_rule(&self, rule_id: &RuleId, deleted_by: &UserId) -> Result<(), StoreError> {
        self.rules.remove(rule_id).ok_or(StoreError::NotFound)?;
        tracing::debug!(rule_id = %rule_id, deleted_by = %deleted_by, "Rule deleted");
        Ok(())
    }
}

#[async_trait]
impl TemplateStore for MemoryStore {
    async fn create_template(
        &self,
        params: &CreateTemplateParams,
        created_by: &UserId,
    ) -> Result<PermissionTemplate, StoreError> {
        // The name entry stays locked until the template is stored.
        let slot = match self.template_names.entry(params.name.clone()) {
            Entry::Occupied(_) => return Err(StoreError::AlreadyExists),
            Entry::Vacant(slot) => slot,
        };
        let template = PermissionTemplate {
            id: TemplateId::new(),
            name: params.name.clone(),
            description: params.description.clone(),
            permissions: params.permissions.clone(),
            created_by: created_by.clone(),
            created_at: Utc::now(),
        };
        self.templates.insert(template.id, template.clone());
        slot.insert(template.id);
        Ok(template)
    }

    async fn get_template(
        &self,
        template_id: &TemplateId,
    ) -> Result<PermissionTemplate, StoreError> {
        self.templates
            .get(template_id)
            .map(|t| t.value().clone())
            .ok_or(StoreError::NotFound)
    }

    async fn list_templates(&self) -> Result<Vec<PermissionTemplate>, StoreError> {
        let mut templates: Vec<_> = self.templates.iter().map(|t| t.value().clone()).collect();
        templates.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(templates)
    }

    async fn apply_template(
        &self,
        user_id: &UserId,
        template_id: &TemplateId,
        applied_by: &UserId,
    ) -> Result<Actor, StoreError> {
        let template = self.get_template(template_id).await?;
        let mut user = self.users.get_mut(user_id).ok_or(StoreError::NotFound)?;

        let added = template.apply_to(&mut user.permissions);
        tracing::debug!(
            user_id = %user_id,
            template_id = %template_id,
            applied_by = %applied_by,
            added = added.len(),
            "Template applied"
        );
        Ok(user.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_storage::{Permission, RuleEffect, Role};

    fn rule_params(resource_type: &str, action: &str) -> CreateRuleParams {
        CreateRuleParams {
            name: format!("{}:{}", resource_type, action),
            description: None,
            resource_type: resource_type.into(),
            action: action.into(),
            conditions: vec![],
            effect: RuleEffect::Allow,
            priority: 0,
            active: true,
        }
    }

    #[tokio::test]
    async fn user_lookup_not_found() {
        let store = MemoryStore::new();
        let result = store.get_by_id(&UserId::from("nobody")).await;
        assert!(matches!(result, Err(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn update_rule_records_updater() {
        let store = MemoryStore::new();
        let admin = UserId::from("admin");
        let other = UserId::from("admin-2");
        let rule = store
            .create_rule(&rule_params("journal", "read"), &admin)
            .await
            .unwrap();

        let updated = store
            .update_rule(
                &rule.id,
                &UpdateRuleParams {
                    priority: Some(10),
                    active: Some(false),
                    ..Default::default()
                },
                &other,
            )
            .await
            .unwrap();

        assert_eq!(updated.priority, 10);
        assert!(!updated.active);
        assert_eq!(updated.created_by, admin);
        assert_eq!(updated.updated_by, Some(other));
        assert_eq!(updated.name, "journal:read");
    }

    #[tokio::test]
    async fn update_missing_rule_is_not_found() {
        let store = MemoryStore::new();
        let result = store
            .update_rule(
                &RuleId::new(),
                &UpdateRuleParams::default(),
                &UserId::from("admin"),
            )
            .await;
        assert!(matches!(result, Err(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn duplicate_template_name_conflicts() {
        let store = MemoryStore::new();
        let params = CreateTemplateParams {
            name: "analyst".into(),
            description: None,
            permissions: [Permission::ViewCompanyAnalytics].into_iter().collect(),
        };
        store
            .create_template(&params, &UserId::from("admin"))
            .await
            .unwrap();
        let again = store.create_template(&params, &UserId::from("admin")).await;
        assert!(matches!(again, Err(StoreError::AlreadyExists)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_template_creates_keep_names_unique() {
        let store = MemoryStore::new();
        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    let params = CreateTemplateParams {
                        name: "auditor".into(),
                        description: None,
                        permissions: Default::default(),
                    };
                    store
                        .create_template(&params, &UserId::from("admin"))
                        .await
                        .is_ok()
                })
            })
            .collect();

        let mut created = 0;
        for task in tasks {
            if task.await.unwrap() {
                created += 1;
            }
        }
        assert_eq!(created, 1);
        assert_eq!(store.list_templates().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn apply_template_to_missing_user() {
        let store = MemoryStore::new();
        let template = store
            .create_template(
                &CreateTemplateParams {
                    name: "t".into(),
                    description: None,
                    permissions: Default::default(),
                },
                &UserId::from("admin"),
            )
            .await
            .unwrap();

        let result = store
            .apply_template(&UserId::from("ghost"), &template.id, &UserId::from("admin"))
            .await;
        assert!(matches!(result, Err(StoreError::NotFound)));
        store.put_user(Actor::new("ghost", Role::IndividualUser));
        assert!(store
            .apply_template(&UserId::from("ghost"), &template.id, &UserId::from("admin"))
            .await
            .is_ok());
    }
}
