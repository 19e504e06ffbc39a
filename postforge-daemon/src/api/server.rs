//! JSON-RPC server implementation with Unix socket support.
//!
//! Framing is one JSON-RPC 2.0 message per line in each direction. Requests
//! on a connection are answered in order.

use super::handlers::{ApiState, PostforgeApiImpl, PostforgeApiServer};
use super::types::ToolCallParams;
use anyhow::{Context, Result};
use jsonrpsee::types::{ErrorCode, ErrorObject};
use serde::Serialize;
use serde_json::{Value, json};
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Handle to a running RPC server
pub struct ServerHandle {
    shutdown: Arc<Mutex<Option<tokio::sync::mpsc::Sender<()>>>>,
    join_handle: Arc<Mutex<Option<JoinHandle<()>>>>,
}

/// Start the JSON-RPC server on a Unix socket.
///
/// # Parameters
///
/// - `socket_path`: Path to the Unix socket file
/// - `state`: API state shared across handlers
///
/// # Returns
///
/// A handle to the running server that can be used to stop it.
pub async fn start_server(socket_path: &Path, state: ApiState) -> Result<ServerHandle> {
    // Remove existing socket if present
    if socket_path.exists() {
        warn!("Removing existing socket at {:?}", socket_path);
        std::fs::remove_file(socket_path)
            .with_context(|| format!("Failed to remove existing socket at {:?}", socket_path))?;
    }

    if let Some(parent) = socket_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create socket directory {:?}", parent))?;
    }

    info!("Starting JSON-RPC server on {:?}", socket_path);

    let listener = UnixListener::bind(socket_path)
        .with_context(|| format!("Failed to bind Unix socket at {:?}", socket_path))?;

    let api = Arc::new(PostforgeApiImpl::new(state));

    let (tx, mut rx) = tokio::sync::mpsc::channel::<()>(1);

    let server_task: JoinHandle<()> = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = rx.recv() => {
                    debug!("Server shutdown signal received");
                    break;
                }
                result = listener.accept() => {
                    match result {
                        Ok((stream, _addr)) => {
                            let api = api.clone();
                            tokio::spawn(async move {
                                if let Err(e) = handle_connection(stream, api).await {
                                    warn!("Connection handler error: {}", e);
                                }
                            });
                        }
                        Err(e) => {
                            warn!("Failed to accept connection: {}", e);
                        }
                    }
                }
            }
        }
    });

    info!("JSON-RPC server started and listening");

    Ok(ServerHandle {
        shutdown: Arc::new(Mutex::new(Some(tx))),
        join_handle: Arc::new(Mutex::new(Some(server_task))),
    })
}

/// Handle a single connection
async fn handle_connection(mut stream: UnixStream, api: Arc<PostforgeApiImpl>) -> Result<()> {
    let (reader, mut writer) = stream.split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();
        let n = reader.read_line(&mut line).await?;

        if n == 0 {
            // Connection closed
            break;
        }
        if line.trim().is_empty() {
            continue;
        }

        debug!("Received request: {} bytes", line.len());

        let response = match serde_json::from_str::<Value>(&line) {
            Ok(request) => process_request(request, &api).await,
            Err(e) => Some(error_response(
                Value::Null,
                ErrorObject::owned(
                    ErrorCode::ParseError.code(),
                    format!("Parse error: {}", e),
                    None::<()>,
                ),
            )),
        };

        if let Some(response) = response {
            writer.write_all(response.to_string().as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }
    }

    Ok(())
}

/// Process a JSON-RPC request.
///
/// Returns `None` for notifications (any message without an id). They are
/// still dispatched, but the outcome is dropped.
async fn process_request(request: Value, api: &Arc<PostforgeApiImpl>) -> Option<Value> {
    let id = request.get("id").cloned();
    let method = match request.get("method").and_then(Value::as_str) {
        Some(m) => m,
        None => {
            return Some(error_response(
                id.unwrap_or(Value::Null),
                ErrorObject::owned(
                    ErrorCode::InvalidRequest.code(),
                    "Invalid Request: missing method",
                    None::<()>,
                ),
            ));
        }
    };

    let params = request.get("params").cloned().unwrap_or(Value::Null);

    let Some(id) = id else {
        debug!("Notification: {}", method);
        if method.starts_with("notifications/") {
            return None;
        }
        if let Err(e) = dispatch(method, &params, api).await {
            debug!("Notification {} failed: {}", method, e.message());
        }
        return None;
    };

    Some(match dispatch(method, &params, api).await {
        Ok(value) => json!({
            "jsonrpc": "2.0",
            "result": value,
            "id": id
        }),
        Err(error) => error_response(id, error),
    })
}

async fn dispatch(
    method: &str,
    params: &Value,
    api: &Arc<PostforgeApiImpl>,
) -> Result<Value, ErrorObject<'static>> {
    match method {
        "initialize" => api.initialize().await.and_then(to_value),
        "ping" => api.ping().await.and_then(to_value),
        "tools/list" => api.tools_list().await.and_then(to_value),
        "tools/call" => match ToolCallParams::from_params(params) {
            Some(call) => {
                let arguments = Some(call.arguments).filter(|a| !a.is_null());
                api.tools_call(call.name, arguments).await.and_then(to_value)
            }
            None => Err(ErrorObject::owned(
                ErrorCode::InvalidParams.code(),
                "Invalid params: expected {\"name\": string, \"arguments\": object}",
                None::<()>,
            )),
        },
        _ => Err(ErrorObject::owned(
            ErrorCode::MethodNotFound.code(),
            format!("Method not found: {}", method),
            None::<()>,
        )),
    }
}

fn to_value<T: Serialize>(value: T) -> Result<Value, ErrorObject<'static>> {
    serde_json::to_value(value).map_err(|e| {
        ErrorObject::owned(
            ErrorCode::InternalError.code(),
            format!("Failed to encode result: {}", e),
            None::<()>,
        )
    })
}

fn error_response(id: Value, error: ErrorObject<'_>) -> Value {
    json!({
        "jsonrpc": "2.0",
        "error": {
            "code": error.code(),
            "message": error.message()
        },
        "id": id
    })
}

impl ServerHandle {
    /// Stop the server
    pub async fn stop(&self) -> Result<()> {
        if let Some(tx) = self.shutdown.lock().await.take() {
            let _ = tx.send(()).await;
        }

        if let Some(handle) = self.join_handle.lock().await.take() {
            // If the task panicked, surface the error
            handle.await?;
        }

        Ok(())
    }

    /// Wait for the server to stop
    pub async fn stopped(&self) {
        // No-op: stop() already awaits the join handle.
    }
}
