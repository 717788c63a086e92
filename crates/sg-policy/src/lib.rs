//! # sg-policy
//!
//! Policy-decision engine for SemGate.
//!
//! At load time, a single extraction pass turns the knowledge graph into a
//! normalized rule table with three lookup indexes (by verb, by entity, by
//! role). Per request, the [`PolicyValidator`] resolves (verb, entity, role)
//! against those indexes and returns an ALLOW or DENY decision with a
//! human-readable reason and, on denial, a counterfactual explanation.
//!
//! ## Key invariants
//!
//! - **Closed world, default deny**: if no rule explicitly permits an
//!   action, it is denied. The knowledge base is a whitelist; its formal
//!   open-world semantics are deliberately not honored here.
//! - **Immutable after load**: the rule index and catalog are built once
//!   and never mutated by validation calls, so concurrent read-only use
//!   is safe by construction.
//! - **Denials are results, not errors**: every decision-time refusal is
//!   an ordinary `allowed=false` result carrying a constraint tag; only
//!   load failures and unloaded-instance queries surface as errors.

pub mod engine;
pub mod error;
pub mod extract;
pub mod result;
pub mod rule;
pub mod vocab;

pub use engine::{PolicyValidator, RuleExplanation, ValidatorStats};
pub use error::ValidatorError;
pub use extract::{extract, Catalog, RuleIndex};
pub use result::{Context, ConstraintType, ValidationResult};
pub use rule::{entity_compatible, Rule};
pub use vocab::{canonical_verb, normalize_role, strip_ownership, tokenize, TokenizedName};
