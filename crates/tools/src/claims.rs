//! Claim tools.

use asgardeo::ManagementApi;
use mcp::{InputSchema, Tool};

use crate::error::Result;
use crate::pretty;

pub(crate) fn tools(product: &str) -> Vec<Tool> {
    vec![Tool::new(
        "list_claims",
        format!("List all claims in {product}"),
        InputSchema::new(),
    )]
}

/// Local claims, with hidden ones left out.
pub(crate) async fn list<C: ManagementApi>(client: &C) -> Result<String> {
    pretty(&client.list_local_claims(true).await?)
}
