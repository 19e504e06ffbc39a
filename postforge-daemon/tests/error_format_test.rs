//! Test to verify JSON-RPC 2.0 error response format compliance.
//!
//! This test checks that error responses follow the JSON-RPC 2.0 specification:
//! - Must have `"jsonrpc": "2.0"`
//! - Must have `error` object with `code` (integer) and `message` (string)
//! - Must echo the `id` from the request

use serde_json::json;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::time::{Duration, sleep};

use postforge_core::{ApiConfig, MemoryStore};
use postforge_daemon::api::{ApiState, start_server};

/// Detect whether the sandbox allows binding Unix sockets. Skip tests if not.
fn can_bind_unix_socket() -> bool {
    let path = std::env::temp_dir().join("postforge-socket-permission-check.sock");
    let _ = fs::remove_file(&path);
    let result = std::os::unix::net::UnixListener::bind(&path);
    let ok = result.is_ok();
    let _ = fs::remove_file(&path);
    ok
}

/// Helper to send raw JSON-RPC request and get raw response
/// Creates a fresh connection for each request to avoid stream state issues.
async fn send_raw_request(
    socket_path: &Path,
    request: &str,
) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let mut stream = UnixStream::connect(socket_path).await?;
    stream.write_all(request.as_bytes()).await?;
    stream.write_all(b"\n").await?;
    stream.flush().await?;

    let (reader, _writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut response_str = String::new();
    reader.read_line(&mut response_str).await?;

    Ok(serde_json::from_str(&response_str)?)
}

fn assert_error(response: &serde_json::Value, id: serde_json::Value, code: i64) {
    assert_eq!(response.get("jsonrpc"), Some(&json!("2.0")),
        "Must have 'jsonrpc': '2.0' field");
    assert!(response.get("result").is_none(), "Error responses carry no result");
    assert_eq!(response.get("id"), Some(&id), "Must echo the request id");

    let error = response.get("error").expect("Must have 'error' field");
    assert!(error.get("message").and_then(|m| m.as_str()).is_some(),
        "Error must have a string 'message' field");
    assert_eq!(error.get("code").and_then(|c| c.as_i64()), Some(code));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_jsonrpc_error_format_compliance() {
    if !can_bind_unix_socket() {
        eprintln!("Skipping test_jsonrpc_error_format_compliance: Unix sockets not permitted");
        return;
    }

    let temp_dir = TempDir::new().unwrap();
    let socket_path = temp_dir.path().join("error-format.sock");

    // Upstream is never reached by any request below.
    let state = ApiState::with_store(
        Arc::new(MemoryStore::new()),
        ApiConfig::default().with_base_url("http://127.0.0.1:1"),
    )
    .unwrap();
    let handle = start_server(&socket_path, state).await.unwrap();

    // Wait for socket file to appear (up to 2 seconds)
    let mut attempts = 0;
    while !socket_path.exists() && attempts < 20 {
        sleep(Duration::from_millis(100)).await;
        attempts += 1;
    }
    assert!(socket_path.exists(), "Socket file was not created at {:?}", socket_path);

    // Parse error (invalid JSON)
    let response = send_raw_request(&socket_path, "{invalid json}")
        .await
        .expect("Failed to get response");
    assert_error(&response, json!(null), -32700);

    // Invalid request (missing method)
    let request = json!({"jsonrpc": "2.0", "params": {}, "id": 42});
    let response = send_raw_request(&socket_path, &request.to_string())
        .await
        .expect("Failed to get response");
    assert_error(&response, json!(42), -32600);

    // Method not found
    let request = json!({"jsonrpc": "2.0", "method": "resources/list", "params": {}, "id": 100});
    let response = send_raw_request(&socket_path, &request.to_string())
        .await
        .expect("Failed to get response");
    assert_error(&response, json!(100), -32601);

    // Invalid params: tools/call without a tool name
    let request = json!({"jsonrpc": "2.0", "method": "tools/call", "params": {"arguments": {}}, "id": 200});
    let response = send_raw_request(&socket_path, &request.to_string())
        .await
        .expect("Failed to get response");
    assert_error(&response, json!(200), -32602);

    // String ids are echoed verbatim
    let request = json!({"jsonrpc": "2.0", "method": "tools/call", "params": 5, "id": "abc"});
    let response = send_raw_request(&socket_path, &request.to_string())
        .await
        .expect("Failed to get response");
    assert_error(&response, json!("abc"), -32602);

    // Tool-level failure is a successful RPC response with isError set
    let request = json!({
        "jsonrpc": "2.0",
        "method": "tools/call",
        "params": {"name": "linkedin_post", "arguments": {"content": "x".repeat(3001)}},
        "id": 300
    });
    let response = send_raw_request(&socket_path, &request.to_string())
        .await
        .expect("Failed to get response");
    assert!(response.get("error").is_none());
    assert_eq!(response["id"], json!(300));
    assert_eq!(response["result"]["isError"], json!(true));
    assert!(response["result"]["content"][0]["text"]
        .as_str()
        .unwrap()
        .contains("3000"));

    handle.stop().await.unwrap();
}
