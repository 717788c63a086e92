// engine.rs — Policy evaluation engine.
//
// The validator is a two-phase object: unloaded instances error on every
// query; loading a knowledge base runs the extraction pass exactly once
// and freezes the result. All query methods take &self and touch only
// immutable state, so a loaded validator can be shared across threads
// behind an Arc without locking.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use sg_ontology::{local_name, vocab as rdf, Graph};

use crate::error::ValidatorError;
use crate::extract::{extract, Catalog, RuleIndex};
use crate::result::{ConstraintType, Context, ValidationResult};
use crate::rule::{entity_compatible, Rule};
use crate::vocab::{canonical_verb, normalize_role, OWNER_CONTEXT_KEYS};

/// Everything built at load time. Never mutated afterwards.
struct LoadedKnowledge {
    graph: Graph,
    index: RuleIndex,
    catalog: Catalog,
    source: Option<PathBuf>,
}

/// A loaded knowledge base plus the decision procedure over it.
pub struct PolicyValidator {
    state: Option<LoadedKnowledge>,
}

/// Explanation of a single named rule, for the explain-rule query.
#[derive(Debug, Clone, Serialize)]
pub struct RuleExplanation {
    pub rule_name: String,
    pub explanation: String,
    pub constraints: Vec<String>,
    pub applies_to: Vec<String>,
    pub found: bool,
}

/// Load-time summary counters.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ValidatorStats {
    pub triples: usize,
    pub classes: usize,
    pub object_properties: usize,
    pub datatype_properties: usize,
    pub individuals: usize,
    pub rules: usize,
    pub known_entities: usize,
    pub known_verbs: usize,
}

/// The explainer's verdict for a closed-world denial.
struct DenialParts {
    reason: String,
    constraint: ConstraintType,
    detail: Context,
    suggestions: Vec<String>,
}

impl Default for PolicyValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyValidator {
    /// Create an unloaded validator. Every query errors until [`load`]
    /// succeeds.
    ///
    /// [`load`]: PolicyValidator::load
    pub fn new() -> Self {
        Self { state: None }
    }

    /// Load a knowledge base file and run the extraction pass.
    ///
    /// Errors if the file is missing or malformed, or if this instance is
    /// already loaded. To hot-reload, construct a fresh validator and
    /// swap the reference.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<(), ValidatorError> {
        if self.state.is_some() {
            return Err(ValidatorError::AlreadyLoaded);
        }
        let path = path.as_ref();
        tracing::info!(path = %path.display(), "loading knowledge base");
        let graph = sg_ontology::load_path(path)?;
        let (index, catalog) = extract(&graph);
        self.state = Some(LoadedKnowledge {
            graph,
            index,
            catalog,
            source: Some(path.to_path_buf()),
        });
        Ok(())
    }

    /// Construct and load in one step.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ValidatorError> {
        let mut validator = Self::new();
        validator.load(path)?;
        Ok(validator)
    }

    /// Build a validator directly from an in-memory graph.
    pub fn from_graph(graph: Graph) -> Self {
        let (index, catalog) = extract(&graph);
        Self {
            state: Some(LoadedKnowledge {
                graph,
                index,
                catalog,
                source: None,
            }),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.state.is_some()
    }

    /// Path of the loaded knowledge base file, if loaded from disk.
    pub fn source(&self) -> Option<&Path> {
        self.state
            .as_ref()
            .and_then(|k| k.source.as_deref())
    }

    fn knowledge(&self) -> Result<&LoadedKnowledge, ValidatorError> {
        self.state.as_ref().ok_or(ValidatorError::NotInitialized)
    }

    /// Validate one request: may `role`-bearing `context` perform `action`
    /// on the `entity` instance named by `entity_id`?
    ///
    /// Denials are ordinary `allowed=false` results; the only error is
    /// querying an unloaded validator.
    pub fn validate(
        &self,
        action: &str,
        entity: &str,
        entity_id: &str,
        context: &Context,
    ) -> Result<ValidationResult, ValidatorError> {
        let knowledge = self.knowledge()?;
        tracing::info!(action, entity, entity_id, "validating action");
        tracing::debug!(?context);

        let verb = canonical_verb(action);
        let entity_lower = entity.trim().to_lowercase();
        let role = context
            .get("role")
            .and_then(Value::as_str)
            .unwrap_or("")
            .trim()
            .to_lowercase();

        let mut metadata = Context::new();
        metadata.insert("action".into(), action.into());
        metadata.insert("entity".into(), entity.into());
        metadata.insert("entity_id".into(), entity_id.into());
        metadata.insert("context".into(), Value::Object(context.clone()));

        // Existence gate: the verb must be known at all.
        if !self.action_exists(&verb) {
            let reason = format!("Action '{action}' is not defined in the knowledge base");
            tracing::warn!("{reason}");
            metadata.insert(
                "constraint_type".into(),
                ConstraintType::ActionNotDefined.as_str().into(),
            );
            return Ok(ValidationResult {
                allowed: false,
                reason,
                suggested_actions: self.suggest_similar_verbs(&verb),
                metadata,
            });
        }

        // Existence gate: the entity type must be known at all.
        if !self.entity_exists(&entity_lower) {
            let reason = format!("Entity type '{entity}' is not defined in the knowledge base");
            tracing::warn!("{reason}");
            metadata.insert(
                "constraint_type".into(),
                ConstraintType::EntityNotDefined.as_str().into(),
            );
            return Ok(ValidationResult {
                allowed: false,
                reason,
                suggested_actions: Vec::new(),
                metadata,
            });
        }

        let matching = self.find_matching_rules(&verb, &entity_lower, &role);
        if let Some(best_rule) = matching.first() {
            if best_rule.requires_ownership && normalize_role(&role) != "admin" {
                let entity_id_provided = !entity_id.is_empty() && entity_id != "unknown";
                let owner_id_provided = OWNER_CONTEXT_KEYS
                    .iter()
                    .any(|key| context.get(*key).is_some_and(value_is_set));
                if !(entity_id_provided && owner_id_provided) {
                    let reason = format!(
                        "Action '{action}' on '{entity}' requires ownership verification. \
                         Provide entity_id and patient_id/owner_id to verify ownership."
                    );
                    tracing::info!("denied: {reason}");
                    metadata.insert("validation_passed".into(), false.into());
                    metadata.insert(
                        "constraint_type".into(),
                        ConstraintType::OwnershipRequired.as_str().into(),
                    );
                    metadata.insert("matched_rule".into(), best_rule.raw_name.clone().into());
                    metadata.insert("matched_rule_id".into(), best_rule.id.clone().into());
                    return Ok(ValidationResult {
                        allowed: false,
                        reason,
                        suggested_actions: vec![format!(
                            "Provide entity_id and patient_id to verify ownership of {entity}"
                        )],
                        metadata,
                    });
                }
            }

            let reason = format!("Action '{action}' is allowed for entity type '{entity}'");
            tracing::info!("{reason}");
            metadata.insert("validation_passed".into(), true.into());
            metadata.insert("matched_rule".into(), best_rule.raw_name.clone().into());
            metadata.insert("matched_rule_id".into(), best_rule.id.clone().into());
            return Ok(ValidationResult {
                allowed: true,
                reason,
                suggested_actions: Vec::new(),
                metadata,
            });
        }

        // Closed world: no rule explicitly permits this, so deny. The
        // knowledge base is an access-control whitelist; absence of a
        // permission is a refusal, not an unknown.
        let parts = self.explain_denial_parts(knowledge, &verb, &entity_lower, &role);
        metadata.insert(
            "constraint_type".into(),
            parts.constraint.as_str().into(),
        );
        metadata.extend(parts.detail);
        Ok(ValidationResult {
            allowed: false,
            reason: parts.reason,
            suggested_actions: parts.suggestions,
            metadata,
        })
    }

    /// All rules matching (verb, entity, role), most specific first.
    ///
    /// Inputs must be lowercased and trimmed. The sort key is (exact
    /// entity match, exact role match) descending; the sort is stable, so
    /// equally specific rules keep extraction order.
    pub fn find_matching_rules(&self, verb: &str, entity: &str, role: &str) -> Vec<&Rule> {
        let Ok(knowledge) = self.knowledge() else {
            return Vec::new();
        };
        let role = normalize_role(role);
        let mut matching: Vec<&Rule> = knowledge
            .index
            .rules_for_verb(verb)
            .into_iter()
            .filter(|rule| rule.matches(verb, entity, &role))
            .collect();
        matching.sort_by_key(|rule| {
            std::cmp::Reverse((
                rule.effective_entity() == Some(entity),
                rule.effective_role().map(normalize_role).as_deref() == Some(role.as_str()),
            ))
        });
        matching
    }

    /// Rule names applicable to an entity type, in extraction order.
    pub fn get_allowed_actions(
        &self,
        entity: &str,
        _context: &Context,
    ) -> Result<Vec<String>, ValidatorError> {
        let knowledge = self.knowledge()?;
        let entity_lower = entity.trim().to_lowercase();
        let actions = self.allowed_action_names(knowledge, &entity_lower);
        tracing::info!(entity, count = actions.len(), "queried allowed actions");
        Ok(actions)
    }

    /// Thin wrapper: does any rule permit (role, verb, entity)?
    ///
    /// Errors when unloaded rather than answering; an uninitialized
    /// permission check must never read as a grant.
    pub fn check_permissions(
        &self,
        role: &str,
        action: &str,
        entity: &str,
    ) -> Result<bool, ValidatorError> {
        self.knowledge()?;
        let verb = canonical_verb(action);
        let entity_lower = entity.trim().to_lowercase();
        let role_lower = role.trim().to_lowercase();
        Ok(!self
            .find_matching_rules(&verb, &entity_lower, &role_lower)
            .is_empty())
    }

    /// Multi-line human-readable account of why (action, entity, context)
    /// is denied: failed checks, context echo, and alternatives.
    pub fn explain_denial(
        &self,
        action: &str,
        entity: &str,
        context: &Context,
    ) -> Result<String, ValidatorError> {
        let knowledge = self.knowledge()?;
        let verb = canonical_verb(action);
        let entity_lower = entity.trim().to_lowercase();
        let role = context
            .get("role")
            .and_then(Value::as_str)
            .unwrap_or("")
            .trim()
            .to_lowercase();

        let mut lines: Vec<String> = Vec::new();
        let action_known = self.action_exists(&verb);
        let entity_known = self.entity_exists(&entity_lower);
        if !action_known {
            lines.push(format!(
                "Action '{action}' is not recognized in the knowledge base."
            ));
        }
        if !entity_known {
            lines.push(format!(
                "Entity type '{entity}' is not recognized in the knowledge base."
            ));
        }
        if action_known && entity_known {
            let parts = self.explain_denial_parts(knowledge, &verb, &entity_lower, &role);
            lines.push(parts.reason);
        }

        if !context.is_empty() {
            lines.push("Context information:".to_string());
            for (key, value) in context {
                lines.push(format!("  - {key}: {value}"));
            }
        }

        let alternatives = self.allowed_action_names(knowledge, &entity_lower);
        if !alternatives.is_empty() {
            lines.push("Suggested alternatives:".to_string());
            for name in alternatives.iter().take(5) {
                lines.push(format!("  - {name}"));
            }
        }

        if lines.is_empty() {
            return Ok(format!("Action '{action}' on entity '{entity}' was denied."));
        }
        Ok(lines.join("\n"))
    }

    /// Explain one named rule: its constraints if it is an extracted
    /// rule, else whatever the graph records about a matching node.
    pub fn explain_rule(&self, rule_name: &str) -> Result<RuleExplanation, ValidatorError> {
        let knowledge = self.knowledge()?;
        let query = rule_name.trim().to_lowercase();
        tracing::info!(rule_name, "explaining rule");

        let mut parts: Vec<String> = Vec::new();
        let mut constraints: Vec<String> = Vec::new();
        let mut applies_to: Vec<String> = Vec::new();
        let mut found = false;

        // Extracted rules first: they carry the decoded constraints.
        for rule in knowledge.index.rules() {
            if !(query == rule.raw_name
                || rule.raw_name.contains(&query)
                || query.contains(&rule.raw_name))
            {
                continue;
            }
            found = true;
            parts.push(format!("Action: {}", rule.raw_name));
            if let Some(role) = rule.effective_role() {
                constraints.push(format!("Requires role: {}", title(role)));
            }
            if let Some(approver) = rule.declared_approval_role.as_deref() {
                constraints.push(format!("Requires approval from: {}", title(approver)));
            }
            if let Some(entity) = rule.effective_entity() {
                applies_to.push(title(entity));
                parts.push(format!("Applies to: {}", title(entity)));
            }
            parts.push(format!("Identifier: {}", rule.id));
            break;
        }

        // Fall back to a graph scan over node identifiers.
        if !found {
            for triple in knowledge.graph.triples() {
                let Some(iri) = triple.subject.as_iri() else {
                    continue;
                };
                let fragment = local_name(iri);
                let fragment_lower = fragment.to_lowercase();
                if !(fragment_lower.contains(&query) || query.contains(&fragment_lower)) {
                    continue;
                }
                found = true;
                parts.push(format!("Found: {fragment}"));
                parts.push(format!("Identifier: {iri}"));
                if let Some(comment) = knowledge.graph.comment(&triple.subject) {
                    parts.push(format!("Description: {comment}"));
                }
                for object in knowledge.graph.objects(&triple.subject, rdf::RDFS_LABEL) {
                    if let Some(label) = object.as_literal() {
                        parts.push(format!("Label: {label}"));
                    }
                }
                for object in knowledge.graph.objects(&triple.subject, rdf::RDF_TYPE) {
                    if let Some(type_iri) = object.as_iri() {
                        let type_name = local_name(type_iri);
                        if type_name != "Class" && type_name != "NamedIndividual" {
                            parts.push(format!("Type: {type_name}"));
                        }
                    }
                }
                break;
            }
        }

        if !found {
            parts.push(format!(
                "Rule '{rule_name}' was not found in the knowledge base. \
                 Try searching with different terms like 'delete', 'user', 'refund', etc."
            ));
            if !knowledge.catalog.known_verbs.is_empty() {
                let verbs: Vec<&str> = knowledge
                    .catalog
                    .known_verbs
                    .iter()
                    .map(String::as_str)
                    .collect();
                parts.push(format!("Available actions: {}", verbs.join(", ")));
            }
        }

        Ok(RuleExplanation {
            rule_name: rule_name.to_string(),
            explanation: if parts.is_empty() {
                "No explanation available.".to_string()
            } else {
                parts.join("\n")
            },
            constraints,
            applies_to,
            found,
        })
    }

    /// Extracted rules, in extraction order.
    pub fn rules(&self) -> Result<&[Rule], ValidatorError> {
        Ok(self.knowledge()?.index.rules())
    }

    /// Entity-type names known to the catalog, sorted.
    pub fn known_entities(&self) -> Result<Vec<String>, ValidatorError> {
        Ok(self.knowledge()?.catalog.known_entities.iter().cloned().collect())
    }

    /// Action verbs known to the catalog, sorted.
    pub fn known_verbs(&self) -> Result<Vec<String>, ValidatorError> {
        Ok(self.knowledge()?.catalog.known_verbs.iter().cloned().collect())
    }

    /// Load-time counters, for the info command and service diagnostics.
    pub fn stats(&self) -> Result<ValidatorStats, ValidatorError> {
        let knowledge = self.knowledge()?;
        let graph = &knowledge.graph;
        Ok(ValidatorStats {
            triples: graph.len(),
            classes: graph.subjects_of_type(rdf::OWL_CLASS).len(),
            object_properties: graph.subjects_of_type(rdf::OWL_OBJECT_PROPERTY).len(),
            datatype_properties: graph.subjects_of_type(rdf::OWL_DATATYPE_PROPERTY).len(),
            individuals: graph.subjects_of_type(rdf::OWL_NAMED_INDIVIDUAL).len(),
            rules: knowledge.index.len(),
            known_entities: knowledge.catalog.known_entities.len(),
            known_verbs: knowledge.catalog.known_verbs.len(),
        })
    }

    fn action_exists(&self, verb: &str) -> bool {
        self.state
            .as_ref()
            .is_some_and(|k| k.index.has_verb(verb) || k.catalog.knows_verb(verb))
    }

    fn entity_exists(&self, entity: &str) -> bool {
        self.state
            .as_ref()
            .is_some_and(|k| k.index.has_entity(entity) || k.catalog.knows_entity(entity))
    }

    /// Up to five known verbs that contain the query verb as a substring,
    /// or vice versa.
    fn suggest_similar_verbs(&self, verb: &str) -> Vec<String> {
        let Ok(knowledge) = self.knowledge() else {
            return Vec::new();
        };
        knowledge
            .catalog
            .known_verbs
            .iter()
            .filter(|known| known.contains(verb) || verb.contains(known.as_str()))
            .take(5)
            .cloned()
            .collect()
    }

    /// The counterfactual fallback chain: role mismatch, then entity
    /// mismatch, then wrong-verb-for-role, then generic no-rule. The
    /// first non-empty bucket wins.
    fn explain_denial_parts(
        &self,
        knowledge: &LoadedKnowledge,
        verb: &str,
        entity: &str,
        role: &str,
    ) -> DenialParts {
        let verb_rules = knowledge.index.rules_for_verb(verb);

        // Other roles may do this verb on a compatible entity.
        let allowed_roles = distinct(
            verb_rules
                .iter()
                .filter(|rule| {
                    rule.effective_entity()
                        .is_some_and(|e| entity_compatible(e, entity))
                })
                .filter_map(|rule| rule.effective_role().map(String::from)),
        );
        if !allowed_roles.is_empty() {
            let mut detail = Context::new();
            detail.insert("allowed_roles".into(), allowed_roles.clone().into());
            detail.insert("user_role".into(), role.into());
            return DenialParts {
                reason: format!(
                    "Action '{verb}' on '{entity}' requires role(s): {}. User has role '{}'",
                    join_titled(&allowed_roles),
                    title_or_none(role),
                ),
                constraint: ConstraintType::RoleMismatch,
                detail,
                suggestions: allowed_roles
                    .iter()
                    .take(3)
                    .map(|r| format!("{r}{verb}{entity}"))
                    .collect(),
            };
        }

        // This role may do this verb, on other entities.
        let allowed_entities = distinct(
            verb_rules
                .iter()
                .filter(|rule| rule.effective_role() == Some(role) && !role.is_empty())
                .filter_map(|rule| rule.effective_entity().map(String::from)),
        );
        if !allowed_entities.is_empty() {
            let mut detail = Context::new();
            detail.insert("allowed_entities".into(), allowed_entities.clone().into());
            detail.insert("requested_entity".into(), entity.into());
            return DenialParts {
                reason: format!(
                    "Role '{}' can '{verb}' these entities: {}. Not '{entity}'",
                    title(role),
                    join_titled(&allowed_entities[..allowed_entities.len().min(5)]),
                ),
                constraint: ConstraintType::EntityMismatch,
                detail,
                suggestions: allowed_entities
                    .iter()
                    .take(3)
                    .map(|e| format!("{role}{verb}{e}"))
                    .collect(),
            };
        }

        // This role exists in the rule table, with other verbs.
        let role_rules = knowledge.index.rules_for_role(role);
        if !role_rules.is_empty() {
            let allowed_verbs = distinct(
                role_rules
                    .iter()
                    .filter_map(|rule| rule.verb.clone()),
            );
            let mut detail = Context::new();
            detail.insert("allowed_actions".into(), allowed_verbs.clone().into());
            return DenialParts {
                reason: format!(
                    "Role '{}' cannot '{verb}' '{entity}'. Allowed actions: {}",
                    title(role),
                    allowed_verbs[..allowed_verbs.len().min(5)].join(", "),
                ),
                constraint: ConstraintType::ActionNotAllowed,
                detail,
                suggestions: allowed_verbs
                    .iter()
                    .take(3)
                    .map(|v| format!("{role}{v}{entity}"))
                    .collect(),
            };
        }

        DenialParts {
            reason: format!(
                "No rule found allowing role '{}' to '{verb}' '{entity}'",
                title_or_none(role),
            ),
            constraint: ConstraintType::NoMatchingRule,
            detail: Context::new(),
            suggestions: self.allowed_action_names(knowledge, entity),
        }
    }

    /// Rule names applicable to `entity`: indexed rules first, then rules
    /// whose applicability is unset or substring-compatible, then the
    /// bare verb list as a last resort.
    fn allowed_action_names(&self, knowledge: &LoadedKnowledge, entity: &str) -> Vec<String> {
        let indexed: Vec<String> = knowledge
            .index
            .rules_for_entity(entity)
            .iter()
            .map(|rule| rule.raw_name.clone())
            .collect();
        if !indexed.is_empty() {
            return indexed;
        }

        let compatible: Vec<String> = knowledge
            .index
            .rules()
            .iter()
            .filter(|rule| {
                rule.effective_entity()
                    .map_or(true, |e| entity_compatible(e, entity))
            })
            .map(|rule| rule.raw_name.clone())
            .collect();
        if !compatible.is_empty() {
            return compatible;
        }

        knowledge.catalog.known_verbs.iter().cloned().collect()
    }
}

/// Truthiness of a context value: present, non-null, non-empty string.
fn value_is_set(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// Deduplicate preserving first-seen order.
fn distinct(values: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for value in values {
        if !seen.contains(&value) {
            seen.push(value);
        }
    }
    seen
}

/// Capitalize the first character, for display.
fn title(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn title_or_none(role: &str) -> String {
    if role.is_empty() {
        "none".to_string()
    } else {
        title(role)
    }
}

fn join_titled(values: &[String]) -> String {
    values
        .iter()
        .map(|v| title(v))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use sg_ontology::Term;

    const NS: &str = "http://example.org/policy#";

    fn iri(name: &str) -> Term {
        Term::Iri(format!("{NS}{name}"))
    }

    fn class(g: &mut Graph, name: &str) {
        g.insert(iri(name), rdf::RDF_TYPE, Term::Iri(rdf::OWL_CLASS.into()));
        g.insert(iri(name), rdf::RDFS_LABEL, Term::Literal(name.to_string()));
    }

    fn action(g: &mut Graph, node: &str, label: &str, action_class: &str) {
        g.insert(
            iri(node),
            rdf::RDF_TYPE,
            Term::Iri(rdf::OWL_NAMED_INDIVIDUAL.into()),
        );
        g.insert(iri(node), rdf::RDF_TYPE, iri(action_class));
        g.insert(iri(node), rdf::RDFS_LABEL, Term::Literal(label.to_string()));
    }

    fn sample_validator() -> PolicyValidator {
        let mut g = Graph::new();
        for name in ["User", "Order", "Refund", "MedicalRecord", "Account"] {
            class(&mut g, name);
        }
        action(&mut g, "DeleteUser", "AdminDeleteUser", "DeleteAction");
        action(&mut g, "DeleteAccount", "AdminDeleteAccount", "DeleteAction");
        action(&mut g, "CreateOrder", "CustomerCreateOrder", "CreateAction");
        action(&mut g, "CancelOrder", "CustomerCancelOrder", "CancelAction");
        action(&mut g, "ReadRecord", "PatientReadOwnMedicalRecord", "ReadAction");
        action(&mut g, "ProcessRefund", "ManagerProcessRefund", "ProcessAction");
        g.insert(iri("ProcessRefund"), format!("{NS}requiresRole"), iri("Manager"));
        g.insert(iri("ProcessRefund"), format!("{NS}appliesTo"), iri("Refund"));
        // A class with no rule of its own, reachable only via graph scan.
        class(&mut g, "Invoice");
        g.insert(
            iri("Invoice"),
            rdf::RDFS_COMMENT,
            Term::Literal("Billing record issued to a customer.".to_string()),
        );
        PolicyValidator::from_graph(g)
    }

    fn ctx(pairs: &[(&str, &str)]) -> Context {
        let mut context = Context::new();
        for (key, value) in pairs {
            context.insert((*key).to_string(), Value::String((*value).to_string()));
        }
        context
    }

    fn constraint_of(result: &ValidationResult) -> Option<&str> {
        result
            .metadata
            .get("constraint_type")
            .and_then(Value::as_str)
    }

    #[test]
    fn unloaded_validator_errors_on_every_query() {
        let v = PolicyValidator::new();
        assert!(!v.is_loaded());
        assert!(matches!(
            v.validate("read", "User", "u1", &Context::new()),
            Err(ValidatorError::NotInitialized)
        ));
        assert!(matches!(
            v.get_allowed_actions("User", &Context::new()),
            Err(ValidatorError::NotInitialized)
        ));
        assert!(matches!(
            v.explain_denial("read", "User", &Context::new()),
            Err(ValidatorError::NotInitialized)
        ));
        assert!(matches!(
            v.check_permissions("admin", "read", "User"),
            Err(ValidatorError::NotInitialized)
        ));
        assert!(matches!(v.stats(), Err(ValidatorError::NotInitialized)));
    }

    #[test]
    fn admin_may_delete_user_with_phrase_action() {
        let v = sample_validator();
        let result = v
            .validate("delete user", "User", "u1", &ctx(&[("role", "Admin")]))
            .unwrap();
        assert!(result.allowed, "{}", result.reason);
        assert_eq!(
            result.metadata.get("matched_rule").and_then(Value::as_str),
            Some("admindeleteuser")
        );
        assert_eq!(
            result.metadata.get("validation_passed"),
            Some(&Value::Bool(true))
        );
    }

    #[test]
    fn customer_may_not_delete_user() {
        let v = sample_validator();
        let result = v
            .validate("delete user", "User", "u1", &ctx(&[("role", "Customer")]))
            .unwrap();
        assert!(!result.allowed);
        let constraint = constraint_of(&result).unwrap();
        assert!(
            constraint == "role_mismatch" || constraint == "no_matching_rule",
            "unexpected constraint {constraint}"
        );
    }

    #[test]
    fn role_mismatch_reports_the_required_roles() {
        let v = sample_validator();
        let result = v
            .validate("delete", "User", "u1", &ctx(&[("role", "Customer")]))
            .unwrap();
        assert!(!result.allowed);
        assert_eq!(constraint_of(&result), Some("role_mismatch"));
        assert!(result.reason.contains("requires role(s): Admin"));
        assert!(result.reason.contains("User has role 'Customer'"));
        assert_eq!(result.suggested_actions, vec!["admindeleteuser".to_string()]);
    }

    #[test]
    fn entity_mismatch_lists_permitted_entities() {
        let v = sample_validator();
        let result = v
            .validate("create", "User", "u1", &ctx(&[("role", "Customer")]))
            .unwrap();
        assert!(!result.allowed);
        assert_eq!(constraint_of(&result), Some("entity_mismatch"));
        assert!(result.reason.contains("can 'create' these entities: Order"));
    }

    #[test]
    fn wrong_verb_for_role_reports_allowed_verbs() {
        let v = sample_validator();
        let result = v
            .validate("delete", "Refund", "r1", &ctx(&[("role", "Manager")]))
            .unwrap();
        assert!(!result.allowed);
        assert_eq!(constraint_of(&result), Some("action_not_allowed"));
        assert!(result.reason.contains("Allowed actions: process"));
    }

    #[test]
    fn unknown_verb_denies_with_suggestions() {
        let v = sample_validator();
        let result = v
            .validate("teleport", "User", "u1", &ctx(&[("role", "Admin")]))
            .unwrap();
        assert!(!result.allowed);
        assert_eq!(constraint_of(&result), Some("action_not_defined"));
        assert!(result.reason.contains("'teleport' is not defined"));
    }

    #[test]
    fn unknown_entity_denies_without_suggestions() {
        let v = sample_validator();
        let result = v
            .validate("delete", "Spaceship", "s1", &ctx(&[("role", "Admin")]))
            .unwrap();
        assert!(!result.allowed);
        assert_eq!(constraint_of(&result), Some("entity_not_defined"));
        assert!(result.suggested_actions.is_empty());
    }

    #[test]
    fn admin_override_matches_any_rule_for_the_verb() {
        let v = sample_validator();
        assert!(v.check_permissions("admin", "create", "Order").unwrap());
        assert!(v.check_permissions("admin", "process", "Refund").unwrap());
        assert!(v.check_permissions("admin", "read", "MedicalRecord").unwrap());
    }

    #[test]
    fn validate_is_idempotent() {
        let v = sample_validator();
        let context = ctx(&[("role", "Customer")]);
        let first = v.validate("create", "Order", "o1", &context).unwrap();
        let second = v.validate("create", "Order", "o1", &context).unwrap();
        assert_eq!(first.allowed, second.allowed);
        assert_eq!(first.reason, second.reason);
        assert!(first.allowed);
    }

    #[test]
    fn ownership_rule_denies_without_owner_context() {
        let v = sample_validator();
        let result = v
            .validate("read", "MedicalRecord", "", &ctx(&[("role", "Patient")]))
            .unwrap();
        assert!(!result.allowed);
        assert_eq!(constraint_of(&result), Some("ownership_required"));
    }

    #[test]
    fn ownership_rule_allows_with_entity_and_owner_ids() {
        let v = sample_validator();
        let result = v
            .validate(
                "read",
                "MedicalRecord",
                "rec-42",
                &ctx(&[("role", "Patient"), ("patient_id", "p-7")]),
            )
            .unwrap();
        assert!(result.allowed, "{}", result.reason);
    }

    #[test]
    fn placeholder_entity_id_does_not_satisfy_ownership() {
        let v = sample_validator();
        let result = v
            .validate(
                "read",
                "MedicalRecord",
                "unknown",
                &ctx(&[("role", "Patient"), ("patient_id", "p-7")]),
            )
            .unwrap();
        assert!(!result.allowed);
        assert_eq!(constraint_of(&result), Some("ownership_required"));
    }

    #[test]
    fn admin_bypasses_ownership_verification() {
        let v = sample_validator();
        let result = v
            .validate("read", "MedicalRecord", "", &ctx(&[("role", "Admin")]))
            .unwrap();
        assert!(result.allowed, "{}", result.reason);
    }

    #[test]
    fn required_role_context_key_is_inert() {
        let v = sample_validator();
        let result = v
            .validate(
                "process refund",
                "Refund",
                "r1",
                &ctx(&[("role", "Customer"), ("required_role", "Manager")]),
            )
            .unwrap();
        assert!(!result.allowed);
    }

    #[test]
    fn declared_relations_grant_the_manager() {
        let v = sample_validator();
        let result = v
            .validate("process refund", "Refund", "r1", &ctx(&[("role", "Manager")]))
            .unwrap();
        assert!(result.allowed, "{}", result.reason);
    }

    #[test]
    fn exact_entity_match_outranks_substring_match() {
        let mut g = Graph::new();
        class(&mut g, "Order");
        // Substring-compatible rule extracted first; the exact match must
        // still sort ahead of it.
        action(&mut g, "CreateItem", "CustomerCreateOrderItem", "CreateAction");
        action(&mut g, "CreateOrder", "CustomerCreateOrder", "CreateAction");
        let v = PolicyValidator::from_graph(g);
        let matches = v.find_matching_rules("create", "order", "customer");
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].raw_name, "customercreateorder");
    }

    #[test]
    fn allowed_actions_for_order_lists_both_order_rules() {
        let v = sample_validator();
        let actions = v.get_allowed_actions("Order", &Context::new()).unwrap();
        assert_eq!(
            actions,
            vec![
                "customercreateorder".to_string(),
                "customercancelorder".to_string()
            ]
        );
    }

    #[test]
    fn explain_denial_echoes_context_and_alternatives() {
        let v = sample_validator();
        let text = v
            .explain_denial("delete", "Order", &ctx(&[("role", "Customer")]))
            .unwrap();
        assert!(text.contains("Context information:"));
        assert!(text.contains("role: \"Customer\""));
        assert!(text.contains("Suggested alternatives:"));
        assert!(text.contains("customercreateorder"));
    }

    #[test]
    fn explain_rule_reports_declared_constraints() {
        let v = sample_validator();
        let explanation = v.explain_rule("ManagerProcessRefund").unwrap();
        assert!(explanation.found);
        assert!(explanation.constraints.contains(&"Requires role: Manager".to_string()));
        assert_eq!(explanation.applies_to, vec!["Refund".to_string()]);
    }

    #[test]
    fn explain_rule_falls_back_to_graph_scan() {
        let v = sample_validator();
        // "Invoice" is a class, not an extracted rule.
        let explanation = v.explain_rule("Invoice").unwrap();
        assert!(explanation.found);
        assert!(explanation.explanation.contains("Found: Invoice"));
        assert!(explanation.explanation.contains("Description: Billing record"));
    }

    #[test]
    fn explain_rule_reports_missing_rules() {
        let v = sample_validator();
        let explanation = v.explain_rule("Nonexistent12345").unwrap();
        assert!(!explanation.found);
        assert!(explanation.explanation.contains("was not found"));
        assert!(explanation.explanation.contains("Available actions:"));
    }

    #[test]
    fn load_twice_is_rejected() {
        let mut v = sample_validator();
        assert!(matches!(
            v.load("anywhere.ttl"),
            Err(ValidatorError::AlreadyLoaded)
        ));
    }

    #[test]
    fn stats_reflect_the_extraction() {
        let v = sample_validator();
        let stats = v.stats().unwrap();
        assert_eq!(stats.rules, 6);
        assert_eq!(stats.classes, 6);
        assert_eq!(stats.individuals, 6);
        assert!(stats.known_entities >= 5);
        assert!(stats.known_verbs >= 5);
        assert!(stats.triples > 0);
    }

    #[test]
    fn closed_world_denies_when_no_rule_bucket_applies() {
        let v = sample_validator();
        let result = v
            .validate("cancel", "MedicalRecord", "m1", &ctx(&[("role", "Guest")]))
            .unwrap();
        assert!(!result.allowed);
        assert_eq!(constraint_of(&result), Some("no_matching_rule"));
        assert!(result.reason.contains("No rule found allowing role 'Guest'"));
    }
}
