//! Subcommand implementations.
//!
//! Each command loads its JSON snapshots, runs one engine call and returns the
//! lines to print plus whether the decision was a grant.

use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use warden_audit_memory::MemoryAuditLog;
use warden_authz::{
    AccessGuard, AuthzError, EffectivePermissionResolver, PermissionContext, PermissionEvaluator,
    PermissionSource, RoleCatalog, RuleBackedPolicy, RuleEngine,
};
use warden_config::EngineConfig;
use warden_storage::{
    Actor, CompanyId, CreateRuleParams, Permission, Role, RuleFilter, RuleStore, StoreError,
    UserId,
};
use warden_store_memory::MemoryStore;

use crate::error::CliError;

/// Author recorded on rules loaded from files.
const CLI_USER: &str = "warden-cli";

#[derive(Debug)]
pub struct Outcome {
    pub lines: Vec<String>,
    pub allowed: bool,
}

impl Outcome {
    fn allowed(lines: Vec<String>) -> Self {
        Self {
            lines,
            allowed: true,
        }
    }

    fn denied(lines: Vec<String>) -> Self {
        Self {
            lines,
            allowed: false,
        }
    }

    /// Map a guard result: denials become output, anything else is an error.
    fn from_decision(result: Result<(), AuthzError>) -> Result<Self, CliError> {
        match result {
            Ok(()) => Ok(Self::allowed(vec!["granted".to_string()])),
            Err(e) if e.code() == 403 => Ok(Self::denied(vec![format!(
                "denied [{}]: {}",
                e.error_code(),
                e
            )])),
            Err(e) => Err(e.into()),
        }
    }
}

/// Engine wired against in-memory collaborators.
pub struct Engine {
    pub guard: AccessGuard,
    pub resolver: EffectivePermissionResolver,
    pub catalog: Arc<RoleCatalog>,
    pub store: MemoryStore,
    pub audit: MemoryAuditLog,
}

impl Engine {
    pub fn new(config: &EngineConfig) -> Self {
        let catalog = Arc::new(RoleCatalog::standard());
        let evaluator = PermissionEvaluator::new(catalog.clone());
        let engine = RuleEngine::new(config);
        let store = MemoryStore::new();
        let audit = MemoryAuditLog::new();

        let policy =
            RuleBackedPolicy::new(Arc::new(store.clone()), evaluator.clone(), engine.clone());
        let guard = AccessGuard::new(evaluator, engine, Arc::new(policy), Arc::new(audit.clone()))
            .with_config(config);

        Self {
            guard,
            resolver: EffectivePermissionResolver::new(catalog.clone()),
            catalog,
            store,
            audit,
        }
    }

    /// Validate and store rule definitions, returning how many were loaded.
    async fn load_rules(&self, rules: &[CreateRuleParams]) -> Result<usize, CliError> {
        let author = UserId::from(CLI_USER);
        for params in rules {
            self.guard.engine().validate_conditions(&params.conditions)?;
            self.store.create_rule(params, &author).await?;
        }
        Ok(rules.len())
    }
}

pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let contents = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| CliError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub async fn cmd_check(
    engine: &Engine,
    actor: &Actor,
    permissions: &[Permission],
    any: bool,
) -> Result<Outcome, CliError> {
    let result = if any {
        engine.guard.require_any_permission(actor, permissions).await
    } else {
        engine.guard.require_all_permissions(actor, permissions).await
    };
    Outcome::from_decision(result)
}

pub fn cmd_effective(
    engine: &Engine,
    actor: &Actor,
    additional: &[Permission],
    json: bool,
) -> Result<Outcome, CliError> {
    let grants = engine.resolver.effective_grants(actor, additional);

    let lines = if json {
        vec![serde_json::to_string_pretty(&grants)?]
    } else {
        grants
            .iter()
            .map(|(permission, source)| format!("{:<24} {}", permission.as_str(), source))
            .collect()
    };
    Ok(Outcome::allowed(lines))
}

pub fn cmd_source(engine: &Engine, actor: &Actor, permission: Permission) -> Outcome {
    let source = engine.resolver.permission_source(actor, permission);
    let line = format!("{} {}", permission, source);
    match source {
        PermissionSource::None => Outcome::denied(vec![line]),
        _ => Outcome::allowed(vec![line]),
    }
}

pub async fn cmd_eval_rule(
    engine: &Engine,
    rule: &CreateRuleParams,
    ctx: &PermissionContext,
) -> Result<Outcome, CliError> {
    engine.load_rules(std::slice::from_ref(rule)).await?;
    let stored = engine
        .store
        .list_rules(&RuleFilter::new())
        .await?
        .into_iter()
        .next()
        .ok_or(StoreError::NotFound)?;

    let decision = engine.guard.engine().evaluate_rule(&stored, ctx);
    let line = format!(
        "{} ({} {} on {})",
        decision,
        stored.effect.as_str(),
        stored.action,
        stored.resource_type
    );
    Ok(if decision {
        Outcome::allowed(vec![line])
    } else {
        Outcome::denied(vec![line])
    })
}

pub fn cmd_can_assign(
    engine: &Engine,
    actor: &Actor,
    role: Role,
    company: Option<&str>,
) -> Outcome {
    let company = company.map(|c| CompanyId(c.to_string()));
    let allowed = engine.catalog.can_assign_role(actor, role, company.as_ref());
    let assignable: Vec<&str> = engine
        .catalog
        .assignable_roles(actor.role)
        .iter()
        .map(Role::as_str)
        .collect();

    let lines = vec![
        format!("{}: {}", role, if allowed { "yes" } else { "no" }),
        format!("assignable by {}: [{}]", actor.role, assignable.join(", ")),
    ];
    if allowed {
        Outcome::allowed(lines)
    } else {
        Outcome::denied(lines)
    }
}

pub async fn cmd_access(
    engine: &Engine,
    ctx: &PermissionContext,
    resource_type: &str,
    action: &str,
    rules: &[CreateRuleParams],
    show_audit: bool,
) -> Result<Outcome, CliError> {
    let loaded = engine.load_rules(rules).await?;
    tracing::debug!(loaded, resource_type, action, "Rules loaded");

    let mut outcome = Outcome::from_decision(
        engine
            .guard
            .require_resource_access(ctx, resource_type, action)
            .await,
    )?;

    if show_audit {
        for entry in engine.audit.entries().await {
            outcome.lines.push(serde_json::to_string(&entry)?);
        }
    }
    Ok(outcome)
}
