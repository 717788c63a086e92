// vocab.rs — Fixed vocabularies and the compound-name tokenizer.
//
// Rule names in the knowledge base are compound identifiers like
// "DoctorReadMedicalRecord". Tokenization splits them into a
// (role, verb, entity) triple by longest-prefix matching against two
// fixed word lists. Longest-first ordering matters: "insuranceagent"
// must win over "insurance" when both prefix the name.

/// Action verbs recognized in compound rule names.
pub const ACTION_VERBS: &[&str] = &[
    "read", "create", "update", "delete", "write", "modify", "view", "list", "search", "export",
    "import", "execute", "prescribe", "dispense", "schedule", "cancel", "approve", "discharge",
    "transfer", "assign", "manage", "process", "block", "enroll", "grade",
];

/// Role names recognized in compound rule names.
pub const ROLE_NAMES: &[&str] = &[
    "individualcustomer",
    "corporatecustomer",
    "complianceofficer",
    "labtechnician",
    "insuranceagent",
    "receptionist",
    "pharmacist",
    "supervisor",
    "insurance",
    "librarian",
    "professor",
    "principal",
    "operator",
    "customer",
    "manager",
    "teacher",
    "student",
    "patient",
    "labtech",
    "doctor",
    "analyst",
    "auditor",
    "teller",
    "parent",
    "admin",
    "nurse",
    "pupil",
    "guest",
    "dean",
    "user",
];

/// Suffix words stripped from the end of a rule name before tokenizing.
pub const RULE_SUFFIXES: &[&str] = &["action", "rule", "permission"];

/// Context keys that identify the owner of an entity instance.
pub const OWNER_CONTEXT_KEYS: &[&str] = &["patient_id", "user_id", "owner_id"];

/// The components parsed out of a compound rule name. Any stage that finds
/// no match leaves its component `None`; tokenization never fails.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenizedName {
    pub role: Option<String>,
    pub verb: Option<String>,
    pub entity: Option<String>,
}

/// Split a compound rule name into (role, verb, entity) components.
///
/// `tokenize("DoctorReadMedicalRecord")` → (doctor, read, medicalrecord).
/// `tokenize("PatientReadOwnMedicalRecord")` → (patient, read,
/// ownmedicalrecord) — the "own" prefix is kept verbatim and interpreted
/// as an ownership qualifier later, not here.
pub fn tokenize(name: &str) -> TokenizedName {
    let mut rest = name.trim().to_lowercase();

    for suffix in RULE_SUFFIXES {
        if let Some(stripped) = rest.strip_suffix(suffix) {
            rest = stripped.to_string();
        }
    }

    let mut parsed = TokenizedName::default();

    if let Some(role) = longest_prefix(&rest, ROLE_NAMES) {
        parsed.role = Some(role.to_string());
        rest = rest[role.len()..].to_string();
    }

    if let Some(verb) = longest_prefix(&rest, ACTION_VERBS) {
        parsed.verb = Some(verb.to_string());
        rest = rest[verb.len()..].to_string();
    }

    if !rest.is_empty() {
        parsed.entity = Some(rest);
    }

    parsed
}

/// The longest vocabulary entry that prefixes `s`, if any.
fn longest_prefix<'a>(s: &str, words: &[&'a str]) -> Option<&'a str> {
    let mut sorted: Vec<&str> = words.to_vec();
    sorted.sort_by_key(|w| std::cmp::Reverse(w.len()));
    sorted.into_iter().find(|w| s.starts_with(w))
}

/// Canonicalize a role for comparison: lowercase, trim, and collapse
/// informal aliases to their canonical spelling.
pub fn normalize_role(role: &str) -> String {
    let role = role.trim().to_lowercase();
    match role.as_str() {
        "labtech" => "labtechnician".to_string(),
        "insuranceagent" => "insurance".to_string(),
        _ => role,
    }
}

/// Canonicalize a requested action into the verb used for index lookup.
///
/// Callers pass actions in either compound form ("delete") or phrase form
/// ("delete user"). Whitespace is collapsed and the longest known verb
/// prefix is taken; a request with no recognizable verb keeps the collapsed
/// string, which the existence gate will then reject.
pub fn canonical_verb(action: &str) -> String {
    let collapsed: String = action.to_lowercase().split_whitespace().collect();
    match longest_prefix(&collapsed, ACTION_VERBS) {
        Some(verb) => verb.to_string(),
        None => collapsed,
    }
}

/// Remove the ownership qualifier from an entity token
/// ("ownmedicalrecord" → "medicalrecord").
pub fn strip_ownership(entity: &str) -> String {
    entity.replace("own", "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_role_verb_entity() {
        let t = tokenize("DoctorReadMedicalRecord");
        assert_eq!(t.role.as_deref(), Some("doctor"));
        assert_eq!(t.verb.as_deref(), Some("read"));
        assert_eq!(t.entity.as_deref(), Some("medicalrecord"));
    }

    #[test]
    fn keeps_ownership_prefix_verbatim() {
        let t = tokenize("PatientReadOwnMedicalRecord");
        assert_eq!(t.role.as_deref(), Some("patient"));
        assert_eq!(t.verb.as_deref(), Some("read"));
        assert_eq!(t.entity.as_deref(), Some("ownmedicalrecord"));
    }

    #[test]
    fn strips_trailing_suffix_words() {
        let t = tokenize("AdminDeleteUserAction");
        assert_eq!(t.role.as_deref(), Some("admin"));
        assert_eq!(t.verb.as_deref(), Some("delete"));
        assert_eq!(t.entity.as_deref(), Some("user"));

        let t = tokenize("CustomerCreateOrderRule");
        assert_eq!(t.entity.as_deref(), Some("order"));
    }

    #[test]
    fn longest_role_wins_over_shared_prefix() {
        let t = tokenize("InsuranceAgentViewClaim");
        assert_eq!(t.role.as_deref(), Some("insuranceagent"));
        assert_eq!(t.verb.as_deref(), Some("view"));
        assert_eq!(t.entity.as_deref(), Some("claim"));
    }

    #[test]
    fn unrecognized_name_becomes_entity() {
        let t = tokenize("xyzzy");
        assert_eq!(t.role, None);
        assert_eq!(t.verb, None);
        // Unrecognized remainder still becomes the entity component.
        assert_eq!(t.entity.as_deref(), Some("xyzzy"));
    }

    #[test]
    fn empty_name_yields_all_none() {
        assert_eq!(tokenize(""), TokenizedName::default());
        assert_eq!(tokenize("rule"), TokenizedName::default());
    }

    #[test]
    fn round_trips_synthetic_names() {
        // Every role+verb pair with an arbitrary non-vocabulary suffix
        // must tokenize back to its components.
        for role in ROLE_NAMES {
            for verb in ACTION_VERBS {
                let name = format!("{role}{verb}widget");
                let t = tokenize(&name);
                assert_eq!(t.role.as_deref(), Some(*role), "name={name}");
                assert_eq!(t.verb.as_deref(), Some(*verb), "name={name}");
                assert_eq!(t.entity.as_deref(), Some("widget"), "name={name}");
            }
        }
    }

    #[test]
    fn role_aliases_collapse_to_canonical() {
        assert_eq!(normalize_role("LabTech"), "labtechnician");
        assert_eq!(normalize_role("labtechnician"), "labtechnician");
        assert_eq!(normalize_role("InsuranceAgent"), "insurance");
        assert_eq!(normalize_role(" Admin "), "admin");
    }

    #[test]
    fn canonical_verb_handles_phrase_form() {
        assert_eq!(canonical_verb("delete user"), "delete");
        assert_eq!(canonical_verb("Process Refund"), "process");
        assert_eq!(canonical_verb("read"), "read");
        assert_eq!(canonical_verb("frobnicate"), "frobnicate");
    }

    #[test]
    fn ownership_qualifier_is_stripped() {
        assert_eq!(strip_ownership("ownmedicalrecord"), "medicalrecord");
        assert_eq!(strip_ownership("order"), "order");
    }
}
