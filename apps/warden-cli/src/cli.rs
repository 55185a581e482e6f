use clap::{Parser, Subcommand};
use std::path::PathBuf;
use warden_storage::{Permission, Role};

#[derive(Parser)]
#[command(name = "warden")]
#[command(about = "Inspect warden authorization decisions from JSON snapshots")]
pub struct Cli {
    /// Engine configuration file (JSON). Environment variables override it.
    #[arg(long, env = "WARDEN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log decisions at debug level (otherwise RUST_LOG, default "warn")
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Check that an actor holds permissions
    Check {
        /// Actor snapshot (JSON)
        #[arg(long)]
        actor: PathBuf,

        /// Permission to require (repeatable)
        #[arg(long = "permission", short = 'p', required = true)]
        permissions: Vec<Permission>,

        /// Pass when any one permission is held instead of all
        #[arg(long)]
        any: bool,
    },
    /// List an actor's effective permissions with their source
    Effective {
        /// Actor snapshot (JSON)
        #[arg(long)]
        actor: PathBuf,

        /// Extra permission to include (repeatable)
        #[arg(long = "additional")]
        additional: Vec<Permission>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Report where one permission comes from
    Source {
        /// Actor snapshot (JSON)
        #[arg(long)]
        actor: PathBuf,

        /// Permission to trace
        #[arg(long)]
        permission: Permission,
    },
    /// Evaluate one rule against a context
    EvalRule {
        /// Rule definition (JSON, same shape as rule creation)
        #[arg(long)]
        rule: PathBuf,

        /// Permission context (JSON)
        #[arg(long)]
        context: PathBuf,
    },
    /// Check whether an actor may assign a role
    CanAssign {
        /// Assigning actor snapshot (JSON)
        #[arg(long)]
        actor: PathBuf,

        /// Role to assign
        #[arg(long)]
        role: Role,

        /// Company of the user receiving the role
        #[arg(long)]
        company: Option<String>,
    },
    /// Check resource access through the rule-backed policy
    Access {
        /// Permission context (JSON)
        #[arg(long)]
        context: PathBuf,

        /// Resource type, e.g. journal
        #[arg(long)]
        resource_type: String,

        /// Action, e.g. read
        #[arg(long)]
        action: String,

        /// Rule definitions (JSON array) to load before checking
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Print the recorded audit entries
        #[arg(long)]
        audit: bool,
    },
}
