// validate.rs — Validate one action and report the decision.

use std::path::Path;

use anyhow::Context as _;
use sg_policy::{Context, PolicyValidator};

#[allow(clippy::too_many_arguments)]
pub fn execute(
    ontology: &Path,
    action: &str,
    entity: &str,
    entity_id: &str,
    role: Option<&str>,
    context_json: Option<&str>,
    verbose: bool,
) -> anyhow::Result<()> {
    let validator = PolicyValidator::from_path(ontology)?;
    let stats = validator.stats()?;
    println!(
        "Loaded {} triples ({} rules) from {}",
        stats.triples,
        stats.rules,
        ontology.display()
    );

    let mut context: Context = match context_json {
        Some(raw) => serde_json::from_str(raw).context("invalid JSON in --context")?,
        None => Context::new(),
    };
    if let Some(role) = role {
        context.insert("role".into(), role.into());
    }

    println!(
        "Validating: {} on {} (ID: {})",
        action,
        entity,
        if entity_id.is_empty() { "N/A" } else { entity_id }
    );
    let result = validator.validate(action, entity, entity_id, &context)?;

    if result.allowed {
        println!("ALLOWED: {}", result.reason);
    } else {
        println!("DENIED: {}", result.reason);
        if !result.suggested_actions.is_empty() {
            println!("Suggested alternatives:");
            for suggestion in &result.suggested_actions {
                println!("  - {suggestion}");
            }
        }
        if verbose {
            println!();
            println!("{}", validator.explain_denial(action, entity, &context)?);
        }
    }
    if verbose {
        println!(
            "Metadata: {}",
            serde_json::to_string_pretty(&result.metadata)?
        );
    }

    if !result.allowed {
        std::process::exit(1);
    }
    Ok(())
}
