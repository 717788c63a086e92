//! # sg-cli
//!
//! Command-line interface for SemGate.
//!
//! Validates proposed actions against a knowledge base of permission
//! rules and explains denials:
//! - `semgate validate` — check one action, exit non-zero on denial
//! - `semgate actions` — list what an entity type permits
//! - `semgate explain` — explain a named rule
//! - `semgate info` — knowledge base summary
//! - `semgate serve` — start MCP server on stdio

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// SemGate CLI — validate agent actions against policy knowledge bases.
#[derive(Parser)]
#[command(name = "semgate", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate an action against a knowledge base.
    ///
    /// Exits 0 when allowed, 1 when denied.
    Validate {
        /// Path to the knowledge base file (.ttl, .owl, .rdf, .nt).
        ontology: PathBuf,
        /// The action to validate (e.g., "delete user").
        action: String,
        /// The entity type (e.g., "User").
        entity: String,
        /// Identifier of the entity instance.
        #[arg(long, default_value = "")]
        entity_id: String,
        /// Requesting role (shorthand for a "role" context key).
        #[arg(long)]
        role: Option<String>,
        /// Additional context as a JSON object.
        #[arg(long)]
        context: Option<String>,
        /// Show the full result metadata.
        #[arg(short, long)]
        verbose: bool,
    },
    /// List the actions allowed for an entity type.
    Actions {
        /// Path to the knowledge base file.
        ontology: PathBuf,
        /// The entity type to query.
        entity: String,
        /// Requesting role.
        #[arg(long)]
        role: Option<String>,
    },
    /// Explain a named rule and its constraints.
    Explain {
        /// Path to the knowledge base file.
        ontology: PathBuf,
        /// Rule, action, or class name (partial match allowed).
        rule_name: String,
    },
    /// Show knowledge base summary information.
    Info {
        /// Path to the knowledge base file.
        ontology: PathBuf,
        /// List every rule, entity type, and verb.
        #[arg(long)]
        detailed: bool,
    },
    /// Start the MCP server on stdio.
    Serve {
        /// Path to the gateway config file (defaults to SEMGATE_CONFIG,
        /// then ./semgate.yaml).
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

/// Install the stderr logger. `RUST_LOG` overrides `default_level`.
///
/// Logs go to stderr so they never interfere with MCP traffic on stdout.
pub(crate) fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    // `serve` defers logger setup until its config (and its log_level
    // setting) has been loaded.
    if !matches!(cli.command, Commands::Serve { .. }) {
        init_tracing("info");
    }
    match &cli.command {
        Commands::Validate {
            ontology,
            action,
            entity,
            entity_id,
            role,
            context,
            verbose,
        } => commands::validate::execute(
            ontology,
            action,
            entity,
            entity_id,
            role.as_deref(),
            context.as_deref(),
            *verbose,
        ),
        Commands::Actions {
            ontology,
            entity,
            role,
        } => commands::actions::execute(ontology, entity, role.as_deref()),
        Commands::Explain {
            ontology,
            rule_name,
        } => commands::explain::execute(ontology, rule_name),
        Commands::Info { ontology, detailed } => commands::info::execute(ontology, *detailed),
        Commands::Serve { config } => commands::serve::execute(config.as_deref()),
    }
}
