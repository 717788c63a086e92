// rule.rs — The normalized permission record and its matching predicate.

use serde::{Deserialize, Serialize};

use crate::vocab::{normalize_role, strip_ownership};

/// A normalized (role, verb, entity) permission record extracted from the
/// knowledge base.
///
/// `role`/`verb`/`entity` are parsed out of the compound rule name;
/// `declared_*` come from explicit relations on the node and override the
/// parsed token when present. At least one of the effective components is
/// always non-null — all-null candidates are discarded at extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Identifier of the source node (IRI or blank-node label), stable
    /// across lookups.
    pub id: String,
    /// Full lowercase compound identifier the rule was derived from.
    pub raw_name: String,
    /// Role token parsed from the name.
    pub role: Option<String>,
    /// Action-verb token parsed from the name.
    pub verb: Option<String>,
    /// Entity-type token parsed from the name; may carry the "own"
    /// ownership qualifier.
    pub entity: Option<String>,
    /// Explicit "requires role" relation value, if declared.
    pub declared_role: Option<String>,
    /// Explicit "requires approval" relation value, if declared.
    pub declared_approval_role: Option<String>,
    /// Explicit "applies to" relation value, if declared.
    pub declared_applies_to: Option<String>,
    /// True iff the effective entity carries the ownership qualifier:
    /// the rule only grants access when the requester owns the instance.
    pub requires_ownership: bool,
}

impl Rule {
    /// The role this rule requires: the declared value wins over the
    /// parsed token.
    pub fn effective_role(&self) -> Option<&str> {
        self.declared_role.as_deref().or(self.role.as_deref())
    }

    /// The entity type this rule applies to: declared wins over parsed.
    pub fn effective_entity(&self) -> Option<&str> {
        self.declared_applies_to
            .as_deref()
            .or(self.entity.as_deref())
    }

    /// Check whether this rule permits (verb, entity, role).
    ///
    /// All inputs must be lowercased and trimmed; `role` must already be
    /// alias-normalized. The admin override bypasses the role check only —
    /// an admin request still has to target a compatible entity.
    pub fn matches(&self, verb: &str, entity: &str, role: &str) -> bool {
        if let Some(rule_verb) = self.verb.as_deref() {
            if rule_verb != verb {
                return false;
            }
        }

        if let Some(rule_entity) = self.effective_entity() {
            let compatible = rule_entity == entity
                || strip_ownership(rule_entity) == entity
                || entity_compatible(rule_entity, entity);
            if !compatible {
                return false;
            }
        }

        if role == "admin" {
            return true;
        }

        match self.effective_role() {
            Some(rule_role) => normalize_role(rule_role) == role,
            None => true,
        }
    }
}

/// The substring-compatibility predicate used for entity and name
/// matching: equal, or either string contains the other.
///
/// This tolerates plural/compound naming ("order" vs "orders",
/// "medicalrecord" vs "record") but can also produce surprising matches
/// ("user" vs "superuser"). It is kept behaviour-compatible with the
/// knowledge bases in the field; tighten it here, in one place, if that
/// ever changes.
pub fn entity_compatible(a: &str, b: &str) -> bool {
    a == b || a.contains(b) || b.contains(a)
}
