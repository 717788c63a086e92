// result.rs — The structured outcome of a validation call.

use serde::{Deserialize, Serialize};

/// Arbitrary request context: string keys to JSON values, of which "role"
/// is the distinguished one.
pub type Context = serde_json::Map<String, serde_json::Value>;

/// Why a request was denied. Tagged into result metadata as
/// `constraint_type` so callers can branch without parsing the reason text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintType {
    /// The requested verb is not defined in the knowledge base.
    ActionNotDefined,
    /// The requested entity type is not defined in the knowledge base.
    EntityNotDefined,
    /// Rules exist for this verb+entity, but for other roles.
    RoleMismatch,
    /// Rules exist for this verb+role, but for other entities.
    EntityMismatch,
    /// The role has rules, but none for this verb.
    ActionNotAllowed,
    /// A rule matched but its ownership requirement was not satisfiable.
    OwnershipRequired,
    /// No rule bucket applies at all (closed-world default).
    NoMatchingRule,
    /// The request itself was malformed; converted to a denial by the
    /// orchestration layer instead of crashing a long-lived service.
    RequestError,
}

impl ConstraintType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConstraintType::ActionNotDefined => "action_not_defined",
            ConstraintType::EntityNotDefined => "entity_not_defined",
            ConstraintType::RoleMismatch => "role_mismatch",
            ConstraintType::EntityMismatch => "entity_mismatch",
            ConstraintType::ActionNotAllowed => "action_not_allowed",
            ConstraintType::OwnershipRequired => "ownership_required",
            ConstraintType::NoMatchingRule => "no_matching_rule",
            ConstraintType::RequestError => "request_error",
        }
    }
}

impl std::fmt::Display for ConstraintType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The result of validating one request. Immutable once constructed;
/// holds no references into the rule index beyond the matched rule's id
/// in metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Whether the action is allowed.
    pub allowed: bool,
    /// Human-readable explanation, always non-empty.
    pub reason: String,
    /// Alternative rule names or role+verb+entity combinations the
    /// requester could try; empty when no useful suggestion exists.
    #[serde(default)]
    pub suggested_actions: Vec<String>,
    /// Echoed request fields plus denial detail (constraint tag, allowed
    /// roles/entities/verbs) or, on success, the matched rule.
    #[serde(default)]
    pub metadata: Context,
}
