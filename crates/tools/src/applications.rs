//! Application management tools.

use asgardeo::{
    ApplicationDetails, ApplicationKind, ApplicationPatch, AuthorizedApiRequest, ManagementApi,
    NewApplication, types::INTERACTIVE_SCOPES,
};
use mcp::{InputSchema, Tool};
use serde_json::{Map, Value, json};
use tracing::info;

use crate::args::Arguments;
use crate::error::Result;
use crate::pretty;

pub(crate) fn tools(product: &str) -> Vec<Tool> {
    let name_and_redirect = || {
        InputSchema::new()
            .string("application_name", "Name of the application")
            .string("redirect_url", "Redirect URL of the application")
            .required("application_name")
            .required("redirect_url")
    };

    vec![
        Tool::new(
            "list_applications",
            format!("List applications in {product}"),
            InputSchema::new()
                .integer_with_default("limit", "Maximum number of applications to return", 10)
                .integer_with_default("offset", "Number of applications to skip", 0),
        ),
        Tool::new(
            "create_single_page_app",
            format!("Create a new Single Page Application in {product}"),
            name_and_redirect(),
        ),
        Tool::new(
            "create_webapp_with_ssr",
            format!("Create a new web application with server-side rendering in {product}"),
            name_and_redirect(),
        ),
        Tool::new(
            "create_mobile_app",
            format!("Create a new Mobile Application in {product}"),
            name_and_redirect(),
        ),
        Tool::new(
            "create_m2m_app",
            format!("Create a new M2M Application in {product}"),
            InputSchema::new()
                .string("application_name", "Name of the application")
                .required("application_name"),
        ),
        Tool::new(
            "get_application_by_name",
            "Get details of an application by name",
            InputSchema::new()
                .string("application_name", "Name of the application")
                .required("application_name"),
        ),
        Tool::new(
            "get_application_by_client_id",
            "Get details of an application by client ID",
            InputSchema::new()
                .string("client_id", "Client ID of the application")
                .required("client_id"),
        ),
        Tool::new(
            "update_application_basic_info",
            "Update the basic information of an application",
            InputSchema::new()
                .string("id", "ID of the application")
                .string("name", "New name of the application")
                .string("description", "Description of the application")
                .string("image_url", "URL of the application logo")
                .string("access_url", "Home page URL of the application")
                .string("logout_return_url", "URL to return to after logout")
                .required("id"),
        ),
        Tool::new(
            "update_application_oauth_config",
            "Update the OAuth/OIDC configuration of an application",
            InputSchema::new()
                .string("id", "ID of the application")
                .string_array("redirect_urls", "Allowed redirect URLs")
                .string_array("allowed_origins", "Allowed CORS origins")
                .number("user_access_token_expiry_time", "User access token expiry in seconds")
                .number(
                    "application_access_token_expiry_time",
                    "Application access token expiry in seconds",
                )
                .number("refresh_token_expiry_time", "Refresh token expiry in seconds")
                .boolean(
                    "revoke_tokens_when_idp_session_terminated",
                    "Revoke tokens when the IdP session is terminated",
                )
                .string(
                    "access_token_binding_type",
                    "Access token binding type, e.g. None, cookie, sso-session",
                )
                .required("id"),
        ),
        Tool::new(
            "update_application_claim_config",
            "Set the user attributes (claims) requested by an application",
            InputSchema::new()
                .string("id", "ID of the application")
                .string_array(
                    "claims",
                    "Local claim URIs, e.g. http://wso2.org/claims/emailaddress",
                )
                .required("id")
                .required("claims"),
        ),
        Tool::new(
            "authorize_api",
            format!("Authorize an application to access an API resource in {product}"),
            InputSchema::new()
                .string("appId", "This is the id of the application.")
                .string("id", "This is the id of the API resource to be authorized.")
                .string_with_default(
                    "policyIdentifier",
                    "This indicates the authorization policy of the API authorization.",
                    "RBAC",
                )
                .string_array("scopes", "This is the list of scope names for the API resource.")
                .required("appId")
                .required("id"),
        ),
        Tool::new(
            "list_authorized_api",
            "List the API resources an application is authorized to access",
            InputSchema::new()
                .string("app_id", "ID of the application")
                .required("app_id"),
        ),
    ]
}

fn oauth_endpoints(base_url: &str, interactive: bool) -> Value {
    let mut endpoints = Map::new();
    if interactive {
        endpoints.insert("base_url".into(), json!(base_url));
        endpoints.insert(
            "authorize_url".into(),
            json!(format!("{base_url}/oauth2/authorize")),
        );
    }
    for (key, path) in [
        ("token_url", "token"),
        ("jwks_url", "jwks"),
        ("userinfo_url", "userinfo"),
    ] {
        endpoints.insert(key.into(), json!(format!("{base_url}/oauth2/{path}")));
    }
    Value::Object(endpoints)
}

/// Creation summary shown to the caller.
fn created(base_url: &str, kind: ApplicationKind, app: &ApplicationDetails) -> Value {
    let mut config = json!({
        "name": app.name,
        "id": app.id,
        "client_id": app.client_id,
    });

    match kind {
        ApplicationKind::MachineToMachine => {
            config["client_secret"] = json!(app.client_secret);
        }
        ApplicationKind::ServerSideWeb => {
            config["client_secret"] = json!(app.client_secret);
            config["redirect_url"] = json!(app.redirect_urls.first());
            config["scope"] = json!(INTERACTIVE_SCOPES);
        }
        ApplicationKind::SinglePage | ApplicationKind::Mobile => {
            config["redirect_url"] = json!(app.redirect_urls.first());
            config["scope"] = json!(INTERACTIVE_SCOPES);
        }
    }
    if kind == ApplicationKind::SinglePage {
        config["response_type"] = json!("code");
    }

    json!({
        "application_configurations": config,
        "oauth_endpoints": oauth_endpoints(base_url, kind != ApplicationKind::MachineToMachine),
    })
}

fn credentials(app: &ApplicationDetails) -> Value {
    json!({
        "application_configurations": {
            "name": app.name,
            "id": app.id,
            "client_id": app.client_id,
            "client_secret": app.client_secret,
        }
    })
}

pub(crate) async fn list_applications<C: ManagementApi>(
    client: &C,
    args: &Arguments,
) -> Result<String> {
    let limit = args.optional_or("limit", 10u32);
    let offset = args.optional_or("offset", 0u32);

    let apps = client.list_applications(limit, offset).await?;
    let listed: Vec<Value> = apps
        .iter()
        .map(|app| json!({"name": app.name, "id": app.id}))
        .collect();
    pretty(&listed)
}

pub(crate) async fn create_application<C: ManagementApi>(
    client: &C,
    kind: ApplicationKind,
    args: &Arguments,
) -> Result<String> {
    let name: String = args.required("application_name")?;
    let mut app = NewApplication::new(name, kind);
    if kind != ApplicationKind::MachineToMachine {
        app = app.with_redirect_url(args.required::<String>("redirect_url")?);
    }

    let details = client.create_application(&app).await?;
    info!(id = %details.id, ?kind, "application created");
    pretty(&created(client.base_url(), kind, &details))
}

pub(crate) async fn get_application_by_name<C: ManagementApi>(
    client: &C,
    args: &Arguments,
) -> Result<String> {
    let name: String = args.required("application_name")?;
    let app = client.application_by_name(&name).await?;
    pretty(&credentials(&app))
}

pub(crate) async fn get_application_by_client_id<C: ManagementApi>(
    client: &C,
    args: &Arguments,
) -> Result<String> {
    let client_id: String = args.required("client_id")?;
    let app = client.application_by_client_id(&client_id).await?;
    pretty(&credentials(&app))
}

pub(crate) async fn update_basic_info<C: ManagementApi>(
    client: &C,
    args: &Arguments,
) -> Result<String> {
    let id: String = args.required("id")?;
    let patch = ApplicationPatch {
        name: args.optional("name"),
        description: args.optional("description"),
        image_url: args.optional("image_url"),
        access_url: args.optional("access_url"),
        logout_return_url: args.optional("logout_return_url"),
        ..ApplicationPatch::default()
    };
    if patch.is_empty() {
        return Ok(format!("Nothing to update for application {id}."));
    }

    client.update_application(&id, &patch).await?;
    Ok(format!("Application {id} basic information updated successfully."))
}

pub(crate) async fn update_oauth_config<C: ManagementApi>(
    client: &C,
    args: &Arguments,
) -> Result<String> {
    let id: String = args.required("id")?;
    let mut oidc = client.oidc_config(&id).await?;

    if let Some(urls) = args.optional_string_list("redirect_urls") {
        oidc.callback_urls = urls;
    }
    if let Some(origins) = args.optional_string_list("allowed_origins") {
        oidc.allowed_origins = origins;
    }
    let mut set = |section: &str, key: &str, value: Value| {
        let target = if section == "refreshToken" {
            &mut oidc.refresh_token
        } else {
            &mut oidc.access_token
        };
        target.insert(key.to_string(), value);
    };
    if let Some(secs) = args.optional::<i64>("user_access_token_expiry_time") {
        set("accessToken", "userAccessTokenExpiryInSeconds", json!(secs));
    }
    if let Some(secs) = args.optional::<i64>("application_access_token_expiry_time") {
        set("accessToken", "applicationAccessTokenExpiryInSeconds", json!(secs));
    }
    if let Some(secs) = args.optional::<i64>("refresh_token_expiry_time") {
        set("refreshToken", "expiryInSeconds", json!(secs));
    }
    if let Some(revoke) = args.optional::<bool>("revoke_tokens_when_idp_session_terminated") {
        set("accessToken", "revokeTokensWhenIDPSessionTerminated", json!(revoke));
    }
    if let Some(binding) = args.optional::<String>("access_token_binding_type") {
        set("accessToken", "bindingType", json!(binding));
    }

    client.replace_oidc_config(&id, &oidc).await?;
    Ok(format!("Application {id} OAuth configuration updated successfully."))
}

pub(crate) async fn update_claim_config<C: ManagementApi>(
    client: &C,
    args: &Arguments,
) -> Result<String> {
    let id: String = args.required("id")?;
    args.required::<Vec<Value>>("claims")?;
    let claims = args.string_list("claims");

    client
        .update_application(&id, &ApplicationPatch::requested_claims(&claims))
        .await?;
    Ok(format!("Application {id} claim configuration updated successfully."))
}

pub(crate) async fn authorize_api<C: ManagementApi>(
    client: &C,
    args: &Arguments,
) -> Result<String> {
    let app_id: String = args.required("appId")?;
    let request = AuthorizedApiRequest {
        id: args.required("id")?,
        policy_identifier: args.optional_or("policyIdentifier", "RBAC".to_string()),
        scopes: args.string_list("scopes"),
    };

    client.authorize_api(&app_id, &request).await?;
    Ok("API authorization successful.".to_string())
}

pub(crate) async fn list_authorized_apis<C: ManagementApi>(
    client: &C,
    args: &Arguments,
) -> Result<String> {
    let app_id: String = args.required("app_id")?;
    pretty(&client.authorized_apis(&app_id).await?)
}
