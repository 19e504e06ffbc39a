//! JSON-RPC API handlers for the daemon.

use anyhow::{Context, Result};
use jsonrpsee::core::RpcResult;
use jsonrpsee::proc_macros::rpc;
use postforge_core::{
    ApiClient, ApiConfig, SecretStore, ToolContext, ToolResult, create_store, descriptors,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

use super::types::{InitializeResult, PingResult, ToolsListResult};
use crate::config::DaemonConfig;

/// State shared across RPC handlers.
pub struct ApiState {
    /// Secret store and LinkedIn client every tool runs against.
    pub tools: ToolContext,
}

impl ApiState {
    /// Build state from daemon configuration.
    pub fn new(config: &DaemonConfig) -> Result<Self> {
        let store: Arc<dyn SecretStore> =
            Arc::from(create_store(config.secret_backend, &config.env_prefix));
        Self::with_store(store, config.api_config())
    }

    /// Build state around an explicit secret store (useful for tests).
    pub fn with_store(store: Arc<dyn SecretStore>, api: ApiConfig) -> Result<Self> {
        let client = ApiClient::new(api).context("Failed to build LinkedIn API client")?;
        Ok(Self {
            tools: ToolContext::new(store, client),
        })
    }
}

/// JSON-RPC API trait definition.
#[rpc(server)]
pub trait PostforgeApi {
    /// Handshake. Reports protocol version, capabilities and server info.
    #[method(name = "initialize")]
    async fn initialize(&self) -> RpcResult<InitializeResult>;

    /// Liveness check.
    #[method(name = "ping")]
    async fn ping(&self) -> RpcResult<PingResult>;

    /// List every tool with its description and input schema.
    #[method(name = "tools/list")]
    async fn tools_list(&self) -> RpcResult<ToolsListResult>;

    /// Invoke a tool.
    ///
    /// # Parameters
    ///
    /// - `name`: Tool name (e.g., "linkedin_post")
    /// - `arguments`: Tool arguments object
    ///
    /// # Returns
    ///
    /// The tool result. Tool failures are results with `isError: true`,
    /// never JSON-RPC errors.
    #[method(name = "tools/call")]
    async fn tools_call(&self, name: String, arguments: Option<Value>) -> RpcResult<ToolResult>;
}

/// Implementation of the Postforge API.
pub struct PostforgeApiImpl {
    state: ApiState,
}

impl PostforgeApiImpl {
    /// Create a new API implementation with the given state.
    pub fn new(state: ApiState) -> Self {
        Self { state }
    }
}

#[async_trait::async_trait]
impl PostforgeApiServer for PostforgeApiImpl {
    async fn initialize(&self) -> RpcResult<InitializeResult> {
        info!("RPC: initialize");
        Ok(InitializeResult::default())
    }

    async fn ping(&self) -> RpcResult<PingResult> {
        debug!("RPC: ping");
        Ok(PingResult::default())
    }

    async fn tools_list(&self) -> RpcResult<ToolsListResult> {
        debug!("RPC: tools/list");
        Ok(ToolsListResult {
            tools: descriptors(),
        })
    }

    async fn tools_call(&self, name: String, arguments: Option<Value>) -> RpcResult<ToolResult> {
        info!("RPC: tools/call({})", name);
        Ok(self
            .state
            .tools
            .call(&name, arguments.unwrap_or(Value::Null))
            .await)
    }
}
