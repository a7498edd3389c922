//! HTTP implementation of [`ManagementApi`].

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, LOCATION};
use reqwest::{Certificate, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::api::ManagementApi;
use crate::auth::TokenSource;
use crate::config::ClientConfig;
use crate::types::{
    ApiResource, ApiResourceList, ApiResourceQuery, ApplicationDetails, ApplicationList,
    ApplicationPatch, ApplicationSummary, AuthorizedApiRequest, LoginFlowGeneration,
    LoginFlowRequest, LoginFlowStatus, NewApiResource, NewApplication, NewUser, OidcConfig,
};
use crate::{Error, Result};

const APPLICATIONS: &str = "/api/server/v1/applications";
const API_RESOURCES: &str = "/api/server/v1/api-resources";
const LOCAL_CLAIMS: &str = "/api/server/v1/claim-dialects/local/claims";
const LOGIN_FLOW: &str = "/api/server/v1/ai/loginflow";
const SCIM_USERS: &str = "/scim2/Users";

/// Management API client authenticated with client credentials.
pub struct ManagementClient {
    http: reqwest::Client,
    base_url: String,
    tokens: TokenSource,
}

impl ManagementClient {
    /// Build a client from validated configuration.
    ///
    /// No network traffic happens here; the first token is fetched lazily.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = reqwest::Client::builder().timeout(config.timeout);
        if let Some(path) = &config.cert_path {
            let pem = std::fs::read(path)
                .map_err(|e| Error::Certificate(format!("{}: {e}", path.display())))?;
            let cert = Certificate::from_pem(&pem)
                .map_err(|e| Error::Certificate(format!("{}: {e}", path.display())))?;
            builder = builder.add_root_certificate(cert);
        }
        let http = builder
            .build()
            .map_err(|e| Error::Config(format!("http client: {e}")))?;

        info!(
            base_url = %config.base_url,
            client_id = %config.client_id,
            "management client created"
        );

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            tokens: TokenSource::new(
                &config.base_url,
                &config.client_id,
                &config.client_secret,
                &config.scopes,
            ),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Authenticate and send, mapping non-2xx statuses to `Error::Api`.
    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let token = self.tokens.access_token(&self.http).await?;
        let response = request
            .bearer_auth(token)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "management api error");
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        self.send(request)
            .await?
            .json()
            .await
            .map_err(|e| Error::InvalidResponse(e.to_string()))
    }

    /// First application matching a SCIM-style filter, with its credentials.
    async fn find_application(&self, filter: String) -> Result<ApplicationDetails> {
        debug!(%filter, "looking up application");
        let list: ApplicationList = self
            .send_json(
                self.http
                    .get(self.url(APPLICATIONS))
                    .query(&[("filter", filter.as_str())]),
            )
            .await?;

        let summary = list
            .applications
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(format!("application with {filter}")))?;
        let oidc = self.oidc_config(&summary.id).await?;
        Ok(ApplicationDetails::from_parts(summary, oidc))
    }
}

impl std::fmt::Display for ManagementClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "asgardeo({})", self.base_url)
    }
}

/// The resource id is the last path segment of the `Location` header.
fn id_from_location(headers: &HeaderMap) -> Result<String> {
    let location = headers
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| Error::InvalidResponse("missing Location header".into()))?;

    location
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| Error::InvalidResponse(format!("no id in Location: {location}")))
}

impl ManagementApi for ManagementClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn list_applications(&self, limit: u32, offset: u32) -> Result<Vec<ApplicationSummary>> {
        let list: ApplicationList = self
            .send_json(
                self.http
                    .get(self.url(APPLICATIONS))
                    .query(&[("limit", limit), ("offset", offset)]),
            )
            .await?;
        Ok(list.applications)
    }

    async fn create_application(&self, app: &NewApplication) -> Result<ApplicationDetails> {
        let response = self
            .send(
                self.http
                    .post(self.url(APPLICATIONS))
                    .json(&app.to_request_body()),
            )
            .await?;
        let id = id_from_location(response.headers())?;
        info!(%id, name = %app.name, "application created");

        let oidc = self.oidc_config(&id).await?;
        let summary = ApplicationSummary {
            id,
            name: app.name.clone(),
        };
        Ok(ApplicationDetails::from_parts(summary, oidc))
    }

    async fn application_by_name(&self, name: &str) -> Result<ApplicationDetails> {
        self.find_application(format!("name eq {name}")).await
    }

    async fn application_by_client_id(&self, client_id: &str) -> Result<ApplicationDetails> {
        self.find_application(format!("clientId eq {client_id}"))
            .await
    }

    async fn update_application(&self, id: &str, patch: &ApplicationPatch) -> Result<()> {
        self.send(
            self.http
                .patch(self.url(&format!("{APPLICATIONS}/{id}")))
                .json(patch),
        )
        .await?;
        Ok(())
    }

    async fn oidc_config(&self, id: &str) -> Result<OidcConfig> {
        self.send_json(
            self.http
                .get(self.url(&format!("{APPLICATIONS}/{id}/inbound-protocols/oidc"))),
        )
        .await
    }

    async fn replace_oidc_config(&self, id: &str, config: &OidcConfig) -> Result<()> {
        self.send(
            self.http
                .put(self.url(&format!("{APPLICATIONS}/{id}/inbound-protocols/oidc")))
                .json(config),
        )
        .await?;
        Ok(())
    }

    async fn authorize_api(&self, app_id: &str, request: &AuthorizedApiRequest) -> Result<()> {
        self.send(
            self.http
                .post(self.url(&format!("{APPLICATIONS}/{app_id}/authorized-apis")))
                .json(request),
        )
        .await?;
        Ok(())
    }

    async fn authorized_apis(&self, app_id: &str) -> Result<Value> {
        self.send_json(
            self.http
                .get(self.url(&format!("{APPLICATIONS}/{app_id}/authorized-apis"))),
        )
        .await
    }

    async fn generate_login_flow(&self, request: &LoginFlowRequest) -> Result<LoginFlowGeneration> {
        self.send_json(
            self.http
                .post(self.url(&format!("{LOGIN_FLOW}/generate")))
                .json(request),
        )
        .await
    }

    async fn login_flow_status(&self, operation_id: &str) -> Result<LoginFlowStatus> {
        self.send_json(
            self.http
                .get(self.url(&format!("{LOGIN_FLOW}/status/{operation_id}"))),
        )
        .await
    }

    async fn login_flow_result(&self, operation_id: &str) -> Result<Value> {
        self.send_json(
            self.http
                .get(self.url(&format!("{LOGIN_FLOW}/result/{operation_id}"))),
        )
        .await
    }

    async fn list_api_resources(&self, query: &ApiResourceQuery) -> Result<Vec<ApiResource>> {
        let list: ApiResourceList = self
            .send_json(self.http.get(self.url(API_RESOURCES)).query(query))
            .await?;
        Ok(list.api_resources)
    }

    async fn create_api_resource(&self, resource: &NewApiResource) -> Result<ApiResource> {
        self.send_json(self.http.post(self.url(API_RESOURCES)).json(resource))
            .await
    }

    async fn list_local_claims(&self, exclude_hidden: bool) -> Result<Value> {
        self.send_json(
            self.http
                .get(self.url(LOCAL_CLAIMS))
                .query(&[("exclude-hidden-claims", exclude_hidden)]),
        )
        .await
    }

    async fn create_user(&self, user: &NewUser) -> Result<Value> {
        let body = serde_json::to_vec(&user.to_scim())
            .map_err(|e| Error::InvalidResponse(e.to_string()))?;
        self.send_json(
            self.http
                .post(self.url(SCIM_USERS))
                .header(CONTENT_TYPE, "application/scim+json")
                .body(body),
        )
        .await
    }
}
