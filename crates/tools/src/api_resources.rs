//! API resource tools.

use asgardeo::{ApiResource, ApiResourceQuery, Error, ManagementApi, NewApiResource, ScopeCreate};
use mcp::{InputSchema, Tool};
use serde::Serialize;

use crate::args::Arguments;
use crate::error::Result;
use crate::pretty;

/// The fields of an API resource shown in listings.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResourceView<'a> {
    id: &'a str,
    name: &'a str,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    kind: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    requires_authorization: Option<bool>,
}

impl<'a> From<&'a ApiResource> for ResourceView<'a> {
    fn from(resource: &'a ApiResource) -> Self {
        Self {
            id: &resource.id,
            name: &resource.name,
            kind: resource.kind.as_deref(),
            requires_authorization: resource.requires_authorization,
        }
    }
}

fn views(resources: &[ApiResource]) -> Vec<ResourceView<'_>> {
    resources.iter().map(ResourceView::from).collect()
}

pub(crate) fn tools(product: &str) -> Vec<Tool> {
    vec![
        Tool::new(
            "list_api_resources",
            format!("List API Resources registered in {product}"),
            InputSchema::new()
                .string(
                    "filter",
                    "Filter expression to apply, e.g., name eq Payments API, identifier eq \
                     payments_api. Supports 'sw', 'co', 'ew' and 'eq' operations.",
                )
                .string("before", "Base64 encoded cursor value for backward pagination.")
                .string("after", "Base64 encoded cursor value for forward pagination.")
                .number(
                    "limit",
                    "The maximum number of results to return. It is recommended to set this \
                     value to 100 or less.",
                ),
        ),
        Tool::new(
            "search_api_resources_by_name",
            format!("Search API Resources registered in {product} by name"),
            InputSchema::new()
                .string("name", "This is the name of the API resource.")
                .required("name"),
        ),
        Tool::new(
            "get_api_resource_by_identifier",
            format!("Get API Resource registered in {product} by identifier"),
            InputSchema::new()
                .string("identifier", "This is the identifier of the API resource.")
                .required("identifier"),
        ),
        Tool::new(
            "create_api_resource",
            format!("Create an API Resource in {product}"),
            InputSchema::new()
                .string("identifier", "This is the identifier for the API resource.")
                .string("name", "This is the name of the API resource.")
                .boolean_with_default(
                    "requiresAuthorization",
                    "This indicates whether the API resource requires authorization.",
                    true,
                )
                .array(
                    "scopes",
                    "This is the list of scopes for the API resource. Each scope is a name or \
                     an object. Eg: [\"read\", {\"name\": \"write\", \"displayName\": \"Write\", \
                     \"description\": \"Write access\"}]",
                )
                .required("identifier")
                .required("name"),
        ),
    ]
}

pub(crate) async fn list<C: ManagementApi>(client: &C, args: &Arguments) -> Result<String> {
    let query = ApiResourceQuery {
        filter: args.optional("filter"),
        before: args.optional("before"),
        after: args.optional("after"),
        limit: args.optional("limit"),
    };
    let resources = client.list_api_resources(&query).await?;
    pretty(&views(&resources))
}

pub(crate) async fn search_by_name<C: ManagementApi>(
    client: &C,
    args: &Arguments,
) -> Result<String> {
    let name: String = args.required("name")?;
    let resources = client
        .list_api_resources(&ApiResourceQuery::filtered(format!("name eq {name}")))
        .await?;
    pretty(&views(&resources))
}

pub(crate) async fn get_by_identifier<C: ManagementApi>(
    client: &C,
    args: &Arguments,
) -> Result<String> {
    let identifier: String = args.required("identifier")?;
    let resources = client
        .list_api_resources(&ApiResourceQuery::filtered(format!(
            "identifier eq {identifier}"
        )))
        .await?;

    let resource = resources
        .first()
        .ok_or_else(|| Error::NotFound(format!("API resource with identifier {identifier}")))?;
    pretty(&ResourceView::from(resource))
}

pub(crate) async fn create<C: ManagementApi>(client: &C, args: &Arguments) -> Result<String> {
    let resource = NewApiResource {
        identifier: args.required("identifier")?,
        name: args.required("name")?,
        requires_authorization: args.optional_or("requiresAuthorization", true),
        scopes: args.records::<ScopeCreate>("scopes")?,
    };

    let created = client.create_api_resource(&resource).await?;
    pretty(&created)
}
