//! Daemon client for communicating with postforged.
//!
//! This module provides a client for connecting to the Postforge daemon
//! over a Unix socket using newline-delimited JSON-RPC.

use anyhow::Result;
use directories::ProjectDirs;
use postforge_core::ToolResult;
use serde::Deserialize;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tracing::{debug, warn};

/// A tool as reported by `tools/list`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub input_schema: Value,
}

#[derive(Debug, Clone, Deserialize)]
struct ToolsListResponse {
    tools: Vec<ToolInfo>,
}

/// Client for communicating with the Postforge daemon.
pub struct DaemonClient {
    stream: Option<UnixStream>,
    socket_path: PathBuf,
    next_id: u64,
}

impl DaemonClient {
    /// Attempt to connect to the daemon at the given socket path.
    ///
    /// A missing or refusing socket yields a disconnected client rather
    /// than an error; check [`is_connected`](Self::is_connected).
    pub async fn connect(socket_path: &Path) -> Result<Self> {
        debug!("Attempting to connect to daemon at {:?}", socket_path);

        let stream = if !socket_path.exists() {
            debug!("Socket does not exist at {:?}", socket_path);
            None
        } else {
            match UnixStream::connect(socket_path).await {
                Ok(stream) => {
                    debug!("Successfully connected to daemon");
                    Some(stream)
                }
                Err(e) => {
                    warn!("Failed to connect to daemon: {}", e);
                    None
                }
            }
        };

        Ok(Self {
            stream,
            socket_path: socket_path.to_path_buf(),
            next_id: 1,
        })
    }

    /// Check if the client is connected to the daemon.
    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Send a JSON-RPC request and receive a response.
    async fn send_request<T: for<'de> Deserialize<'de>>(
        &mut self,
        method: &str,
        params: Value,
    ) -> Result<T> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| anyhow::anyhow!("Not connected to daemon"))?;

        let id = self.next_id;
        self.next_id += 1;

        let request = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": id,
        });

        let request_str = serde_json::to_string(&request)?;
        debug!("Sending {} request (id {})", method, id);

        stream.write_all(request_str.as_bytes()).await?;
        stream.write_all(b"\n").await?;
        stream.flush().await?;

        let mut reader = BufReader::new(stream);
        let mut response_str = String::new();
        reader.read_line(&mut response_str).await?;

        debug!("Received response: {} bytes", response_str.len());

        if response_str.is_empty() {
            anyhow::bail!("Daemon closed the connection");
        }

        let response: Value = serde_json::from_str(&response_str)?;

        if let Some(error) = response.get("error") {
            anyhow::bail!("RPC error: {}", error);
        }

        let result = response
            .get("result")
            .ok_or_else(|| anyhow::anyhow!("No result in response"))?;

        Ok(serde_json::from_value(result.clone())?)
    }

    /// List the tools the daemon exposes.
    pub async fn list_tools(&mut self) -> Result<Vec<ToolInfo>> {
        let response: ToolsListResponse = self.send_request("tools/list", json!({})).await?;
        Ok(response.tools)
    }

    /// Invoke a tool. Tool failures come back as a result with `is_error` set.
    pub async fn call_tool(&mut self, name: &str, arguments: Value) -> Result<ToolResult> {
        self.send_request("tools/call", json!({"name": name, "arguments": arguments}))
            .await
    }
}

/// Get the default socket path for the daemon.
///
/// `POSTFORGE_SOCKET` wins over the platform runtime directory.
pub fn default_socket_path() -> PathBuf {
    if let Some(path) = std::env::var_os("POSTFORGE_SOCKET").filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }

    ProjectDirs::from("com", "raibid-labs", "postforge")
        .as_ref()
        .and_then(|d| d.runtime_dir().map(|dir| dir.join("postforge.sock")))
        .unwrap_or_else(|| PathBuf::from("/tmp/postforge.sock"))
}
