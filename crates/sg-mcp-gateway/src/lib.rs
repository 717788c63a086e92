//! # sg-mcp-gateway
//!
//! MCP (Model Context Protocol) gateway for SemGate.
//!
//! Wraps a loaded [`sg_policy::PolicyValidator`] and exposes it over MCP
//! stdio so agent frameworks can ask for permission before acting. The
//! validator is immutable after load, so the server shares it across
//! requests behind an `Arc` with no locking.

pub mod config;
pub mod error;
pub mod server;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use server::SgGatewayServer;
