use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use warden_authz::PermissionContext;
use warden_config::EngineConfig;
use warden_storage::{Actor, CreateRuleParams};

mod cli;
mod commands;
mod error;

use cli::{Cli, Command};
use commands::{load_json, Engine, Outcome};
use error::CliError;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(outcome) => {
            for line in &outcome.lines {
                println!("{}", line);
            }
            if outcome.allowed {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> Result<Outcome, CliError> {
    let config = match &cli.config {
        Some(path) => EngineConfig::load_from(path)?,
        None => EngineConfig::from_env()?,
    };
    let engine = Engine::new(&config);

    match cli.command {
        Command::Check {
            actor,
            permissions,
            any,
        } => {
            let actor: Actor = load_json(&actor)?;
            commands::cmd_check(&engine, &actor, &permissions, any).await
        }
        Command::Effective {
            actor,
            additional,
            json,
        } => {
            let actor: Actor = load_json(&actor)?;
            commands::cmd_effective(&engine, &actor, &additional, json)
        }
        Command::Source { actor, permission } => {
            let actor: Actor = load_json(&actor)?;
            Ok(commands::cmd_source(&engine, &actor, permission))
        }
        Command::EvalRule { rule, context } => {
            let rule: CreateRuleParams = load_json(&rule)?;
            let ctx: PermissionContext = load_json(&context)?;
            commands::cmd_eval_rule(&engine, &rule, &ctx).await
        }
        Command::CanAssign {
            actor,
            role,
            company,
        } => {
            let actor: Actor = load_json(&actor)?;
            Ok(commands::cmd_can_assign(
                &engine,
                &actor,
                role,
                company.as_deref(),
            ))
        }
        Command::Access {
            context,
            resource_type,
            action,
            rules,
            audit,
        } => {
            let ctx: PermissionContext = load_json(&context)?;
            let rules: Vec<CreateRuleParams> = match rules {
                Some(path) => load_json(&path)?,
                None => Vec::new(),
            };
            commands::cmd_access(&engine, &ctx, &resource_type, &action, &rules, audit).await
        }
    }
}
