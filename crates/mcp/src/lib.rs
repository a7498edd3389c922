//! MCP (Model Context Protocol) server library.
//!
//! This crate serves tools to an MCP client over newline-delimited JSON-RPC
//! 2.0, normally on stdin/stdout.
//!
//! # Example
//!
//! ```no_run
//! use mcp::{CallToolResult, InputSchema, Server, ServerInfo, Tool, ToolHandler};
//! use serde_json::{Map, Value};
//!
//! struct Hello;
//!
//! impl ToolHandler for Hello {
//!     fn info(&self) -> ServerInfo {
//!         ServerInfo { name: "hello".into(), version: "0.1.0".into() }
//!     }
//!
//!     fn tools(&self) -> Vec<Tool> {
//!         vec![Tool::new("hello", "Say hello", InputSchema::new())]
//!     }
//!
//!     async fn call_tool(&self, _name: String, _args: Map<String, Value>) -> CallToolResult {
//!         CallToolResult::text("hello")
//!     }
//! }
//!
//! # async fn example() -> mcp::Result<()> {
//! Server::new(Hello).serve_stdio().await
//! # }
//! ```

mod error;
mod protocol;
mod schema;
mod server;

pub use error::{
    Error, INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR, Result,
};
pub use protocol::{
    CallToolParams, CallToolResult, InitializeResult, JsonRpcError, JsonRpcRequest,
    JsonRpcResponse, ListToolsResult, PROTOCOL_VERSION, RequestId, ServerCapabilities, ServerInfo,
    Tool, ToolContent,
};
pub use schema::InputSchema;
pub use server::{MAX_LINE_SIZE, Server, ToolHandler};
