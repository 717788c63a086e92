// server.rs — MCP gateway server for SemGate.
//
// SgGatewayServer implements the rmcp ServerHandler trait, exposing the
// policy validator as MCP tools. An agent framework asks before acting:
// every proposed action is resolved against the knowledge base and the
// answer is an ALLOW or an explained DENY, never an exception.
//
// Tools (prefixed `sg_` for namespacing):
//   sg_validate_action    — full validation of (action, entity, id, context)
//   sg_allowed_actions    — list rule names applicable to an entity type
//   sg_explain_rule       — explain one named rule and its constraints
//   sg_check_permissions  — role-centric yes/no permission probe

use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::*;
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use sg_policy::{Context, PolicyValidator};

use crate::config::GatewayConfig;
use crate::error::GatewayError;

// ── Tool parameter types ─────────────────────────────────────────

/// Parameters for `sg_validate_action`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ValidateActionParams {
    /// The action to validate (e.g., "delete user", "process refund").
    pub action: String,
    /// The entity type (e.g., "User", "Order", "Refund").
    pub entity: String,
    /// Identifier of the specific entity instance.
    #[serde(default)]
    pub entity_id: String,
    /// Request context. The "role" key drives role matching; owner keys
    /// like "patient_id" satisfy ownership checks.
    #[serde(default)]
    pub context: Context,
}

/// Parameters for `sg_allowed_actions`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct AllowedActionsParams {
    /// The entity type to query (e.g., "Order").
    pub entity: String,
    /// Request context, echoed back in the response.
    #[serde(default)]
    pub context: Context,
}

/// Parameters for `sg_explain_rule`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ExplainRuleParams {
    /// Name of the rule, action, or class to explain
    /// (e.g., "ManagerProcessRefund", "User").
    pub rule_name: String,
}

/// Parameters for `sg_check_permissions`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CheckPermissionsParams {
    /// The role to check (e.g., "Admin", "Customer").
    pub user_role: String,
    /// The action to check.
    pub action: String,
    /// The entity type to check against.
    pub entity: String,
}

// ── MCP Server ───────────────────────────────────────────────────

/// The MCP gateway server. Holds the loaded validator and the tool router.
pub struct SgGatewayServer {
    validator: Arc<PolicyValidator>,
    tool_router: ToolRouter<Self>,
}

// Tool definitions. Each `#[tool]` method becomes an MCP tool an agent
// client can call.
#[tool_router]
impl SgGatewayServer {
    /// Create a server from config: loads the knowledge base eagerly so
    /// startup fails loudly instead of denying every later request.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let validator = PolicyValidator::from_path(&config.ontology_path)?;
        Ok(Self::with_validator(Arc::new(validator)))
    }

    /// Wrap an already-loaded validator.
    pub fn with_validator(validator: Arc<PolicyValidator>) -> Self {
        Self {
            validator,
            tool_router: Self::tool_router(),
        }
    }

    /// The shared validator (for testing and the CLI serve path).
    pub fn validator(&self) -> &Arc<PolicyValidator> {
        &self.validator
    }

    #[tool(
        description = "Validate whether an action on an entity is permitted by the loaded policy rules. Returns allowed, a human-readable reason, suggested alternatives, and metadata including the constraint that caused a denial."
    )]
    fn sg_validate_action(
        &self,
        Parameters(params): Parameters<ValidateActionParams>,
    ) -> Result<CallToolResult, McpError> {
        let response = match self.validator.validate(
            &params.action,
            &params.entity,
            &params.entity_id,
            &params.context,
        ) {
            Ok(result) => serde_json::json!({
                "allowed": result.allowed,
                "reason": result.reason,
                "suggested_actions": result.suggested_actions,
                "metadata": result.metadata,
            }),
            // A request-level failure is a denial, not a crash.
            Err(e) => {
                tracing::error!(error = %e, "validation request failed");
                serde_json::json!({
                    "allowed": false,
                    "reason": e.to_string(),
                    "suggested_actions": [],
                    "metadata": { "constraint_type": "request_error" },
                })
            }
        };
        json_result(response)
    }

    #[tool(
        description = "List the rule names applicable to an entity type, so an agent can discover what it is permitted to do before attempting an action."
    )]
    fn sg_allowed_actions(
        &self,
        Parameters(params): Parameters<AllowedActionsParams>,
    ) -> Result<CallToolResult, McpError> {
        let response = match self.validator.get_allowed_actions(&params.entity, &params.context)
        {
            Ok(actions) => serde_json::json!({
                "allowed_actions": actions,
                "entity": params.entity,
                "context": params.context,
                "count": actions.len(),
            }),
            Err(e) => {
                tracing::error!(error = %e, "allowed-actions request failed");
                serde_json::json!({
                    "allowed_actions": [],
                    "entity": params.entity,
                    "context": params.context,
                    "count": 0,
                    "error": e.to_string(),
                })
            }
        };
        json_result(response)
    }

    #[tool(
        description = "Explain a named rule: the role it requires, any approval it needs, and the entity types it applies to. Accepts rule names, action names, or class names, with partial matching."
    )]
    fn sg_explain_rule(
        &self,
        Parameters(params): Parameters<ExplainRuleParams>,
    ) -> Result<CallToolResult, McpError> {
        let response = match self.validator.explain_rule(&params.rule_name) {
            Ok(explanation) => serde_json::to_value(&explanation)
                .map_err(|e| McpError::internal_error(e.to_string(), None))?,
            Err(e) => {
                tracing::error!(error = %e, "explain-rule request failed");
                serde_json::json!({
                    "rule_name": params.rule_name,
                    "explanation": e.to_string(),
                    "constraints": [],
                    "applies_to": [],
                    "found": false,
                    "error": e.to_string(),
                })
            }
        };
        json_result(response)
    }

    #[tool(
        description = "Check whether a user role has permission for an action on an entity type. Returns has_permission plus the reason and, on denial, the roles that would be required."
    )]
    fn sg_check_permissions(
        &self,
        Parameters(params): Parameters<CheckPermissionsParams>,
    ) -> Result<CallToolResult, McpError> {
        let mut context = Context::new();
        context.insert("role".into(), params.user_role.clone().into());
        let response = match self.validator.validate(
            &params.action,
            &params.entity,
            "permission_check",
            &context,
        ) {
            Ok(result) => {
                let required_roles = result
                    .metadata
                    .get("allowed_roles")
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default();
                serde_json::json!({
                    "has_permission": result.allowed,
                    "role": params.user_role,
                    "action": params.action,
                    "entity": params.entity,
                    "reason": result.reason,
                    "required_roles": required_roles,
                })
            }
            Err(e) => {
                tracing::error!(error = %e, "permission check failed");
                serde_json::json!({
                    "has_permission": false,
                    "role": params.user_role,
                    "action": params.action,
                    "entity": params.entity,
                    "reason": e.to_string(),
                    "required_roles": [],
                    "error": e.to_string(),
                })
            }
        };
        json_result(response)
    }
}

// ── ServerHandler implementation ─────────────────────────────────

#[tool_handler]
impl ServerHandler for SgGatewayServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "semgate".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: Some("SemGate".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "SemGate policy gateway. Call sg_validate_action before \
                 performing any action; use sg_allowed_actions to discover \
                 what an entity type permits, and sg_explain_rule to \
                 understand why a rule exists. Denials include the failed \
                 constraint and suggested alternatives."
                    .into(),
            ),
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────

/// Wrap a JSON value as a successful tool result.
fn json_result(value: serde_json::Value) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::success(vec![Content::json(value)
        .map_err(|e| McpError::internal_error(e.to_string(), None))?]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sg_ontology::{vocab as rdf, Graph, Term};

    const NS: &str = "http://example.org/policy#";

    fn iri(name: &str) -> Term {
        Term::Iri(format!("{NS}{name}"))
    }

    fn test_server() -> SgGatewayServer {
        let mut g = Graph::new();
        for class in ["User", "Order"] {
            g.insert(iri(class), rdf::RDF_TYPE, Term::Iri(rdf::OWL_CLASS.into()));
            g.insert(iri(class), rdf::RDFS_LABEL, Term::Literal(class.to_string()));
        }
        for (node, label, class) in [
            ("DeleteUser", "AdminDeleteUser", "DeleteAction"),
            ("CreateOrder", "CustomerCreateOrder", "CreateAction"),
        ] {
            g.insert(iri(node), rdf::RDF_TYPE, iri(class));
            g.insert(iri(node), rdf::RDFS_LABEL, Term::Literal(label.to_string()));
        }
        SgGatewayServer::with_validator(Arc::new(PolicyValidator::from_graph(g)))
    }

    fn response_json(result: &CallToolResult) -> serde_json::Value {
        let wire = serde_json::to_value(result).expect("serializable result");
        let text = wire["content"][0]["text"]
            .as_str()
            .expect("text content item");
        serde_json::from_str(text).expect("valid JSON payload")
    }

    #[test]
    fn tool_count_matches_expected() {
        let server = test_server();
        let tools = server.tool_router.list_all();
        let names: Vec<String> = tools.iter().map(|t| t.name.to_string()).collect();
        assert_eq!(tools.len(), 4, "expected 4 tools, got: {:?}", names);
    }

    #[test]
    fn tool_names_are_prefixed() {
        let server = test_server();
        for tool in server.tool_router.list_all() {
            assert!(
                tool.name.starts_with("sg_"),
                "tool '{}' should be prefixed with 'sg_'",
                tool.name
            );
        }
    }

    #[test]
    fn validate_action_allows_admin_delete() {
        let server = test_server();
        let mut context = Context::new();
        context.insert("role".into(), "Admin".into());
        let result = server
            .sg_validate_action(Parameters(ValidateActionParams {
                action: "delete user".into(),
                entity: "User".into(),
                entity_id: "u1".into(),
                context,
            }))
            .unwrap();
        let json = response_json(&result);
        assert_eq!(json["allowed"], true);
        assert_eq!(json["metadata"]["matched_rule"], "admindeleteuser");
    }

    #[test]
    fn validate_action_denies_with_constraint_tag() {
        let server = test_server();
        let mut context = Context::new();
        context.insert("role".into(), "Customer".into());
        let result = server
            .sg_validate_action(Parameters(ValidateActionParams {
                action: "delete".into(),
                entity: "User".into(),
                entity_id: "u1".into(),
                context,
            }))
            .unwrap();
        let json = response_json(&result);
        assert_eq!(json["allowed"], false);
        assert_eq!(json["metadata"]["constraint_type"], "role_mismatch");
    }

    #[test]
    fn allowed_actions_lists_order_rules() {
        let server = test_server();
        let result = server
            .sg_allowed_actions(Parameters(AllowedActionsParams {
                entity: "Order".into(),
                context: Context::new(),
            }))
            .unwrap();
        let json = response_json(&result);
        assert_eq!(json["count"], 1);
        assert_eq!(json["allowed_actions"][0], "customercreateorder");
    }

    #[test]
    fn explain_rule_round_trips() {
        let server = test_server();
        let result = server
            .sg_explain_rule(Parameters(ExplainRuleParams {
                rule_name: "AdminDeleteUser".into(),
            }))
            .unwrap();
        let json = response_json(&result);
        assert_eq!(json["found"], true);
        assert_eq!(json["rule_name"], "AdminDeleteUser");
    }

    #[test]
    fn check_permissions_reports_required_roles() {
        let server = test_server();
        let result = server
            .sg_check_permissions(Parameters(CheckPermissionsParams {
                user_role: "Customer".into(),
                action: "delete".into(),
                entity: "User".into(),
            }))
            .unwrap();
        let json = response_json(&result);
        assert_eq!(json["has_permission"], false);
        assert_eq!(json["required_roles"][0], "admin");
    }
}
