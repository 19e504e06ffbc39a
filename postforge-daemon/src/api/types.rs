//! Request/response types for the daemon JSON-RPC interface.

use postforge_core::ToolDescriptor;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Protocol revision reported by `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Name reported in `serverInfo`.
pub const SERVER_NAME: &str = "postforge";

/// Result of `initialize`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: String,
    pub capabilities: Capabilities,
    pub server_info: ServerInfo,
}

impl Default for InitializeResult {
    fn default() -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: Capabilities {
                tools: ToolsCapability { list_changed: false },
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capabilities {
    pub tools: ToolsCapability,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsCapability {
    pub list_changed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

/// Result of `tools/list`.
#[derive(Debug, Clone, Serialize)]
pub struct ToolsListResult {
    pub tools: Vec<ToolDescriptor>,
}

/// Parameters of `tools/call`.
///
/// Accepted either by name (`{"name": .., "arguments": {..}}`) or by
/// position (`[name, arguments]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

impl ToolCallParams {
    /// Extract call parameters from a raw `params` value.
    pub fn from_params(params: &Value) -> Option<Self> {
        match params {
            Value::Object(_) => serde_json::from_value(params.clone()).ok(),
            Value::Array(items) => {
                let name = items.first()?.as_str()?.to_string();
                let arguments = items.get(1).cloned().unwrap_or(Value::Null);
                Some(Self { name, arguments })
            }
            _ => None,
        }
    }
}

/// Empty result of `ping`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PingResult {}
