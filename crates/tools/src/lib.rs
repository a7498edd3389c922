//! Asgardeo management tools.
//!
//! This crate turns MCP tool calls into management API calls:
//!
//! - [`Arguments`] binds the untyped argument map to typed values;
//! - [`ClientAccessor`] builds the shared management client once, on first use;
//! - [`Poller`] drives submit, poll and fetch workflows such as login flow
//!   generation;
//! - [`AsgardeoTools`] is the catalogue, served by [`mcp::Server`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use asgardeo::{ClientConfig, ManagementClient, ProductMode};
//! use tools::{AsgardeoTools, ClientAccessor, ConfigurationError, PollConfig};
//!
//! # async fn example() -> mcp::Result<()> {
//! let accessor = Arc::new(ClientAccessor::new(|| {
//!     let config = ClientConfig::new("https://api.asgardeo.io/t/acme", "id", "secret");
//!     ManagementClient::new(&config).map_err(ConfigurationError::from)
//! }));
//! let tools = AsgardeoTools::new(accessor, ProductMode::Asgardeo, PollConfig::default());
//! mcp::Server::new(tools).serve_stdio().await
//! # }
//! ```

mod accessor;
mod api_resources;
mod applications;
mod args;
mod claims;
mod error;
mod login_flow;
pub mod poller;
mod registry;
mod users;

#[cfg(test)]
mod testing;

pub use accessor::ClientAccessor;
pub use args::{Arguments, FromArgument, FromElement};
pub use error::{ConfigurationError, PollError, Result, ToolError};
pub use login_flow::{LoginFlowOperation, authentication_sequence};
pub use poller::{
    Clock, Completed, DEFAULT_INTERVAL, Operation, OperationStatus, PollConfig, PollState, Poller,
    TokioClock,
};
pub use registry::{AsgardeoTools, TOOL_NAMES};

/// Pretty-printed JSON, the text format of every structured tool result.
pub(crate) fn pretty<T: serde::Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
