//! JSON-RPC API for daemon IPC.
//!
//! This module provides a JSON-RPC interface for communication between
//! tool callers (the postforge CLI, agent hosts) and the postforged daemon.

pub mod handlers;
pub mod server;
pub mod types;

pub use handlers::{ApiState, PostforgeApiImpl, PostforgeApiServer};
pub use server::{ServerHandle, start_server};
pub use types::*;
