use serde_json::json;
use warden_storage::{
    Actor, ConditionOperator, CreateRuleParams, CreateTemplateParams, Permission,
    PermissionCondition, Role, RuleEffect, RuleFilter, RuleStore, StoreError, TemplateStore,
    UserId, UserLookup,
};
use warden_store_memory::MemoryStore;

#[tokio::test]
async fn rule_lifecycle_and_filtering() {
    let store = MemoryStore::new();
    let admin = UserId::from("root");

    let read = store
        .create_rule(
            &CreateRuleParams {
                name: "same company readers".into(),
                description: Some("journal reads stay in-tenant".into()),
                resource_type: "journal".into(),
                action: "read".into(),
                conditions: vec![PermissionCondition::new(
                    "resource.attributes.companyId",
                    ConditionOperator::Equals,
                    json!("C1"),
                )],
                effect: RuleEffect::Allow,
                priority: 5,
                active: true,
            },
            &admin,
        )
        .await
        .unwrap();

    store
        .create_rule(
            &CreateRuleParams {
                name: "disabled writer".into(),
                description: None,
                resource_type: "journal".into(),
                action: "write".into(),
                conditions: vec![],
                effect: RuleEffect::Deny,
                priority: 0,
                active: false,
            },
            &admin,
        )
        .await
        .unwrap();

    let journal = store
        .list_rules(&RuleFilter::new().resource_type("journal"))
        .await
        .unwrap();
    assert_eq!(journal.len(), 2);

    let active = store
        .list_rules(&RuleFilter::new().resource_type("journal").active_only())
        .await
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, read.id);

    let reads = store
        .list_rules(&RuleFilter::new().action("read"))
        .await
        .unwrap();
    assert_eq!(reads[0].conditions.len(), 1);

    store.delete_rule(&read.id, &admin).await.unwrap();
    assert!(matches!(
        store.get_rule(&read.id).await,
        Err(StoreError::NotFound)
    ));
    assert!(matches!(
        store.delete_rule(&read.id, &admin).await,
        Err(StoreError::NotFound)
    ));
}

#[tokio::test]
async fn template_application_is_additive() {
    let store = MemoryStore::new();
    let admin = UserId::from("root");
    store.put_user(
        Actor::new("u-1", Role::CompanyUser)
            .with_company("C1")
            .with_permissions([Permission::CreateJournal]),
    );

    let template = store
        .create_template(
            &CreateTemplateParams {
                name: "reporting".into(),
                description: None,
                permissions: [Permission::ViewCompanyAnalytics, Permission::CreateJournal]
                    .into_iter()
                    .collect(),
            },
            &admin,
        )
        .await
        .unwrap();

    let updated = store
        .apply_template(&UserId::from("u-1"), &template.id, &admin)
        .await
        .unwrap();

    assert_eq!(updated.permissions.len(), 2);
    assert!(updated.permissions.contains(&Permission::CreateJournal));
    assert!(updated
        .permissions
        .contains(&Permission::ViewCompanyAnalytics));

    let reloaded = store.get_by_id(&UserId::from("u-1")).await.unwrap();
    assert_eq!(reloaded.permissions, updated.permissions);

    let templates = store.list_templates().await.unwrap();
    assert_eq!(templates.len(), 1);
    assert_eq!(templates[0].name, "reporting");
}
