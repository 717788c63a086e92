// actions.rs — List the actions a knowledge base permits for an entity.

use std::path::Path;

use sg_policy::{Context, PolicyValidator};

pub fn execute(ontology: &Path, entity: &str, role: Option<&str>) -> anyhow::Result<()> {
    let validator = PolicyValidator::from_path(ontology)?;
    let mut context = Context::new();
    if let Some(role) = role {
        context.insert("role".into(), role.into());
    }

    let actions = validator.get_allowed_actions(entity, &context)?;
    if actions.is_empty() {
        println!("No actions found for entity type '{entity}'.");
        return Ok(());
    }
    println!("Actions for entity type '{entity}':");
    for action in &actions {
        println!("  - {action}");
    }
    Ok(())
}
