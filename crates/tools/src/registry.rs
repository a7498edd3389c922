//! The tool catalogue served over MCP.

use std::sync::Arc;

use asgardeo::{ApplicationKind, ManagementApi, ProductMode};
use mcp::{CallToolResult, ServerInfo, Tool, ToolHandler};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::accessor::ClientAccessor;
use crate::args::Arguments;
use crate::error::{ConfigurationError, Result, ToolError};
use crate::poller::{Clock, PollConfig, Poller, TokioClock};
use crate::{api_resources, applications, claims, login_flow, users};

/// Names of every tool in [`AsgardeoTools::catalogue`].
pub const TOOL_NAMES: &[&str] = &[
    "list_applications",
    "create_single_page_app",
    "create_webapp_with_ssr",
    "create_mobile_app",
    "create_m2m_app",
    "get_application_by_name",
    "get_application_by_client_id",
    "update_application_basic_info",
    "update_application_oauth_config",
    "update_application_claim_config",
    "authorize_api",
    "list_authorized_api",
    "update_login_flow",
    "list_api_resources",
    "search_api_resources_by_name",
    "get_api_resource_by_identifier",
    "create_api_resource",
    "list_claims",
    "create_user",
];

/// Every management tool, bound to one shared client.
pub struct AsgardeoTools<C, K = TokioClock> {
    accessor: Arc<ClientAccessor<C>>,
    product: ProductMode,
    poller: Poller<K>,
}

impl<C: ManagementApi> AsgardeoTools<C> {
    pub fn new(accessor: Arc<ClientAccessor<C>>, product: ProductMode, poll: PollConfig) -> Self {
        Self::with_poller(accessor, product, Poller::new(poll))
    }
}

impl<C: ManagementApi, K: Clock + 'static> AsgardeoTools<C, K> {
    pub fn with_poller(
        accessor: Arc<ClientAccessor<C>>,
        product: ProductMode,
        poller: Poller<K>,
    ) -> Self {
        Self {
            accessor,
            product,
            poller,
        }
    }

    pub fn catalogue(&self) -> Vec<Tool> {
        let product = self.product.product_name();
        let mut tools = applications::tools(product);
        tools.extend(login_flow::tools(product));
        tools.extend(api_resources::tools(product));
        tools.extend(claims::tools(product));
        tools.extend(users::tools(product));
        tools
    }

    /// Run one tool and return its text output.
    pub async fn call(&self, name: &str, args: &Arguments) -> Result<String> {
        if !TOOL_NAMES.contains(&name) {
            return Err(ToolError::UnknownTool(name.to_string()));
        }
        let client = self.client().await?;
        let client = client.as_ref();

        match name {
            "list_applications" => applications::list_applications(client, args).await,
            "create_single_page_app" => {
                applications::create_application(client, ApplicationKind::SinglePage, args).await
            }
            "create_webapp_with_ssr" => {
                applications::create_application(client, ApplicationKind::ServerSideWeb, args)
                    .await
            }
            "create_mobile_app" => {
                applications::create_application(client, ApplicationKind::Mobile, args).await
            }
            "create_m2m_app" => {
                applications::create_application(client, ApplicationKind::MachineToMachine, args)
                    .await
            }
            "get_application_by_name" => applications::get_application_by_name(client, args).await,
            "get_application_by_client_id" => {
                applications::get_application_by_client_id(client, args).await
            }
            "update_application_basic_info" => applications::update_basic_info(client, args).await,
            "update_application_oauth_config" => {
                applications::update_oauth_config(client, args).await
            }
            "update_application_claim_config" => {
                applications::update_claim_config(client, args).await
            }
            "authorize_api" => applications::authorize_api(client, args).await,
            "list_authorized_api" => applications::list_authorized_apis(client, args).await,
            "update_login_flow" => login_flow::update_login_flow(client, &self.poller, args).await,
            "list_api_resources" => api_resources::list(client, args).await,
            "search_api_resources_by_name" => api_resources::search_by_name(client, args).await,
            "get_api_resource_by_identifier" => {
                api_resources::get_by_identifier(client, args).await
            }
            "create_api_resource" => api_resources::create(client, args).await,
            "list_claims" => claims::list(client).await,
            "create_user" => users::create(client, args).await,
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }

    /// The shared client. The first construction reads the certificate from
    /// disk, so it runs on the blocking pool.
    async fn client(&self) -> Result<Arc<C>> {
        if self.accessor.is_initialised() {
            return Ok(self.accessor.get()?);
        }
        let accessor = Arc::clone(&self.accessor);
        let client = tokio::task::spawn_blocking(move || accessor.get())
            .await
            .map_err(|e| ConfigurationError(format!("client construction aborted: {e}")))??;
        Ok(client)
    }
}

impl<C: ManagementApi, K: Clock + 'static> ToolHandler for AsgardeoTools<C, K> {
    fn info(&self) -> ServerInfo {
        ServerInfo {
            name: "asgardeo-mcp".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    fn instructions(&self) -> Option<String> {
        Some(format!(
            "Manage {} applications, API resources, claims and users.",
            self.product.product_name()
        ))
    }

    fn tools(&self) -> Vec<Tool> {
        self.catalogue()
    }

    async fn call_tool(&self, name: String, arguments: Map<String, Value>) -> CallToolResult {
        debug!(tool = %name, "dispatching");
        match self.call(&name, &Arguments::new(arguments)).await {
            Ok(text) => CallToolResult::text(text),
            Err(e) => {
                warn!(tool = %name, error = %e, "tool call failed");
                CallToolResult::error(e.to_string())
            }
        }
    }
}
