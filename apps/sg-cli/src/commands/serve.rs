// serve.rs — Start the MCP server on stdio.

use std::path::Path;

use rmcp::ServiceExt;
use sg_mcp_gateway::{GatewayConfig, SgGatewayServer};

pub fn execute(config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = GatewayConfig::load(config_path)?;
    crate::init_tracing(config.log_level.as_deref().unwrap_or("info"));
    tracing::info!(
        ontology = %config.ontology_path.display(),
        "starting SemGate MCP server"
    );
    let server = SgGatewayServer::new(config)?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let transport = rmcp::transport::stdio();
        let server_handle = server
            .serve(transport)
            .await
            .map_err(|e| anyhow::anyhow!("MCP server error: {}", e))?;
        let _ = server_handle.waiting().await;
        Ok::<(), anyhow::Error>(())
    })
}
