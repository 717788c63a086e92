// explain.rs — Explain a named rule.

use std::path::Path;

use sg_policy::PolicyValidator;

pub fn execute(ontology: &Path, rule_name: &str) -> anyhow::Result<()> {
    let validator = PolicyValidator::from_path(ontology)?;
    let explanation = validator.explain_rule(rule_name)?;

    println!("{}", explanation.explanation);
    if !explanation.constraints.is_empty() {
        println!("Constraints:");
        for constraint in &explanation.constraints {
            println!("  - {constraint}");
        }
    }
    if !explanation.applies_to.is_empty() {
        println!("Applies to: {}", explanation.applies_to.join(", "));
    }
    if !explanation.found {
        std::process::exit(1);
    }
    Ok(())
}
