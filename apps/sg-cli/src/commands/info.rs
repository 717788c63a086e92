// info.rs — Knowledge base summary.

use std::path::Path;

use sg_policy::PolicyValidator;

pub fn execute(ontology: &Path, detailed: bool) -> anyhow::Result<()> {
    let validator = PolicyValidator::from_path(ontology)?;
    let stats = validator.stats()?;

    println!("Knowledge base: {}", ontology.display());
    println!("  Triples:             {}", stats.triples);
    println!("  Classes:             {}", stats.classes);
    println!("  Object properties:   {}", stats.object_properties);
    println!("  Datatype properties: {}", stats.datatype_properties);
    println!("  Individuals:         {}", stats.individuals);
    println!("  Rules:               {}", stats.rules);
    println!("  Entity types:        {}", stats.known_entities);
    println!("  Verbs:               {}", stats.known_verbs);

    if detailed {
        println!("\nRules:");
        for rule in validator.rules()? {
            let role = rule.effective_role().unwrap_or("any");
            let verb = rule.verb.as_deref().unwrap_or("any");
            let entity = rule.effective_entity().unwrap_or("any");
            let ownership = if rule.requires_ownership {
                " [ownership]"
            } else {
                ""
            };
            println!("  - {} (role={role}, verb={verb}, entity={entity}){ownership}", rule.raw_name);
        }
        println!("\nEntity types:");
        for entity in validator.known_entities()? {
            println!("  - {entity}");
        }
        println!("\nVerbs:");
        for verb in validator.known_verbs()? {
            println!("  - {verb}");
        }
    }
    Ok(())
}
