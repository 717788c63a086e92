// extract.rs — One-time extraction pass: graph → rule table + indexes.
//
// Runs once at load time. Candidate nodes are found two ways: subjects
// carrying a "requires role" / "applies to" relation, and nodes typed as
// an action-like class. Each candidate becomes at most one Rule; the three
// secondary indexes hold positions into the single backing Vec so rules
// have exactly one owner.

use std::collections::{BTreeSet, HashMap};

use sg_ontology::{local_name, vocab as rdf, Graph, Term};

use crate::rule::{entity_compatible, Rule};
use crate::vocab::{strip_ownership, tokenize};

/// Substrings of a class local name that mark its instances as actions.
const ACTION_CLASS_HINTS: &[&str] = &["Action", "Create", "Delete", "Modify", "Process", "Cancel"];

/// Local names of the three relationship properties, resolved
/// case-insensitively against whatever namespace the graph uses.
const REQUIRES_ROLE: &str = "requiresRole";
const REQUIRES_APPROVAL: &str = "requiresApproval";
const APPLIES_TO: &str = "appliesTo";

/// The extracted rule collection with its three lookup indexes.
///
/// Indexes map normalized (lowercased, trimmed) tokens to positions in
/// `rules`, in insertion order, duplicates retained. Immutable after
/// extraction.
#[derive(Debug, Clone, Default)]
pub struct RuleIndex {
    rules: Vec<Rule>,
    by_verb: HashMap<String, Vec<usize>>,
    by_entity: HashMap<String, Vec<usize>>,
    by_role: HashMap<String, Vec<usize>>,
}

impl RuleIndex {
    /// Number of extracted rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// All rules, in extraction order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Rules whose verb component equals `verb`.
    pub fn rules_for_verb(&self, verb: &str) -> Vec<&Rule> {
        self.lookup(&self.by_verb, verb)
    }

    /// Rules whose entity component (ownership qualifier stripped)
    /// equals `entity`.
    pub fn rules_for_entity(&self, entity: &str) -> Vec<&Rule> {
        self.lookup(&self.by_entity, entity)
    }

    /// Rules whose role component equals `role`.
    pub fn rules_for_role(&self, role: &str) -> Vec<&Rule> {
        self.lookup(&self.by_role, role)
    }

    pub fn has_verb(&self, verb: &str) -> bool {
        self.by_verb.contains_key(verb)
    }

    pub fn has_entity(&self, entity: &str) -> bool {
        self.by_entity.contains_key(entity)
    }

    fn lookup(&self, index: &HashMap<String, Vec<usize>>, key: &str) -> Vec<&Rule> {
        index
            .get(key)
            .map(|positions| positions.iter().map(|&i| &self.rules[i]).collect())
            .unwrap_or_default()
    }

    fn insert(&mut self, rule: Rule) {
        let position = self.rules.len();
        if let Some(verb) = rule.verb.clone() {
            self.by_verb.entry(verb).or_default().push(position);
        }
        if let Some(entity) = rule.effective_entity() {
            self.by_entity
                .entry(strip_ownership(entity))
                .or_default()
                .push(position);
        }
        if let Some(role) = rule.effective_role() {
            self.by_role
                .entry(role.to_string())
                .or_default()
                .push(position);
        }
        self.rules.push(rule);
    }
}

/// The known-name sets used for existence pre-checks. Not consulted
/// during matching.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    /// Labels and identifier fragments of every class-typed node,
    /// lowercased.
    pub known_entities: BTreeSet<String>,
    /// Verb components of every extracted rule.
    pub known_verbs: BTreeSet<String>,
}

impl Catalog {
    /// Exact or substring-compatible membership check for an entity type.
    pub fn knows_entity(&self, entity: &str) -> bool {
        self.known_entities.contains(entity)
            || self
                .known_entities
                .iter()
                .any(|known| entity_compatible(known, entity))
    }

    pub fn knows_verb(&self, verb: &str) -> bool {
        self.known_verbs.contains(verb)
    }
}

/// Scan the graph and build the rule index and catalog.
///
/// Never fails: a graph yielding zero rules is a valid (deny-everything)
/// policy under the closed-world default.
pub fn extract(graph: &Graph) -> (RuleIndex, Catalog) {
    let requires_role = resolve_property(graph, REQUIRES_ROLE);
    let requires_approval = resolve_property(graph, REQUIRES_APPROVAL);
    let applies_to = resolve_property(graph, APPLIES_TO);
    tracing::debug!(
        requires_role = ?requires_role,
        requires_approval = ?requires_approval,
        applies_to = ?applies_to,
        "resolved relation properties"
    );

    let mut index = RuleIndex::default();
    for subject in candidate_nodes(graph, requires_role.as_deref(), applies_to.as_deref()) {
        let Some(raw_name) = graph.label(subject).map(|name| name.to_lowercase()) else {
            continue;
        };
        if raw_name.is_empty() {
            continue;
        }

        let declared_role = declared_value(graph, subject, requires_role.as_deref());
        let declared_approval_role = declared_value(graph, subject, requires_approval.as_deref());
        let declared_applies_to = declared_value(graph, subject, applies_to.as_deref());

        let parsed = tokenize(&raw_name);
        let id = match subject {
            Term::Iri(iri) => iri.clone(),
            Term::Blank(id) => id.clone(),
            Term::Literal(_) => continue,
        };

        let effective_entity = declared_applies_to.as_deref().or(parsed.entity.as_deref());
        let requires_ownership = effective_entity.is_some_and(|e| e.contains("own"));
        let rule = Rule {
            id,
            raw_name,
            role: parsed.role,
            verb: parsed.verb,
            entity: parsed.entity,
            declared_role,
            declared_approval_role,
            declared_applies_to,
            requires_ownership,
        };

        // Rules with no role, verb, or entity carry no decision
        // information and are discarded.
        if rule.effective_role().is_none()
            && rule.verb.is_none()
            && rule.effective_entity().is_none()
        {
            tracing::debug!(name = %rule.raw_name, "discarding component-less candidate");
            continue;
        }

        tracing::debug!(
            name = %rule.raw_name,
            role = ?rule.effective_role(),
            verb = ?rule.verb,
            entity = ?rule.effective_entity(),
            "extracted rule"
        );
        index.insert(rule);
    }

    let mut catalog = Catalog::default();
    for class in graph.subjects_of_type(rdf::OWL_CLASS) {
        if let Some(label) = graph.label(class) {
            catalog.known_entities.insert(label.to_lowercase());
        }
        if let Some(iri) = class.as_iri() {
            catalog.known_entities.insert(local_name(iri).to_lowercase());
        }
    }
    for rule in index.rules() {
        if let Some(verb) = &rule.verb {
            catalog.known_verbs.insert(verb.clone());
        }
    }

    tracing::info!(
        rules = index.len(),
        entities = catalog.known_entities.len(),
        verbs = catalog.known_verbs.len(),
        "extracted policy rules"
    );
    (index, catalog)
}

/// Resolve a relation by case-insensitive local-name match over all
/// predicates in the graph. Returns the full IRI, or None if the graph
/// does not use the relation.
fn resolve_property(graph: &Graph, local: &str) -> Option<String> {
    graph
        .predicates()
        .into_iter()
        .find(|p| local_name(p).eq_ignore_ascii_case(local))
        .map(String::from)
}

/// Candidate rule nodes: subjects carrying a role/applicability relation,
/// plus instances of action-like classes. Deduplicated, first-seen order.
fn candidate_nodes<'a>(
    graph: &'a Graph,
    requires_role: Option<&str>,
    applies_to: Option<&str>,
) -> Vec<&'a Term> {
    let mut candidates: Vec<&Term> = Vec::new();
    let mut push = |subject: &'a Term| {
        if !candidates.contains(&subject) {
            candidates.push(subject);
        }
    };

    for triple in graph.triples() {
        let is_marker = [requires_role, applies_to]
            .iter()
            .flatten()
            .any(|p| triple.predicate == *p);
        if is_marker {
            push(&triple.subject);
        }
    }

    for triple in graph.triples() {
        if triple.predicate != rdf::RDF_TYPE {
            continue;
        }
        if let Some(class_iri) = triple.object.as_iri() {
            let class_name = local_name(class_iri);
            if ACTION_CLASS_HINTS.iter().any(|hint| class_name.contains(hint)) {
                push(&triple.subject);
            }
        }
    }

    candidates
}

/// Read the declared value of a relation on a node: the local name of the
/// last object, lowercased. Multiple objects overwrite silently in the
/// source format; we keep last-wins but make the overwrite observable.
fn declared_value(graph: &Graph, subject: &Term, predicate: Option<&str>) -> Option<String> {
    let predicate = predicate?;
    let mut value: Option<String> = None;
    for object in graph.objects(subject, predicate) {
        if let Some(iri) = object.as_iri() {
            let name = local_name(iri).to_lowercase();
            if let Some(previous) = &value {
                tracing::warn!(
                    subject = ?subject,
                    predicate,
                    previous = %previous,
                    next = %name,
                    "multiple declared values; keeping the last"
                );
            }
            value = Some(name);
        }
    }
    value
}
