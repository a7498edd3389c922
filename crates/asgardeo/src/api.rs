//! The management operations the tools depend on.

use std::future::Future;

use serde_json::Value;

use crate::Result;
use crate::types::{
    ApiResource, ApiResourceQuery, ApplicationDetails, ApplicationPatch, ApplicationSummary,
    AuthorizedApiRequest, LoginFlowGeneration, LoginFlowRequest, LoginFlowStatus, NewApiResource,
    NewApplication, NewUser, OidcConfig,
};

/// Identity platform management API.
///
/// `ManagementClient` is the HTTP implementation. Tests substitute an
/// in-memory fake.
pub trait ManagementApi: Send + Sync + 'static {
    /// Tenant base URL, used to derive OAuth endpoint URLs.
    fn base_url(&self) -> &str;

    fn list_applications(
        &self,
        limit: u32,
        offset: u32,
    ) -> impl Future<Output = Result<Vec<ApplicationSummary>>> + Send;

    /// Create an application and read back its credentials.
    fn create_application(
        &self,
        app: &NewApplication,
    ) -> impl Future<Output = Result<ApplicationDetails>> + Send;

    /// Fails with `Error::NotFound` when no application has this name.
    fn application_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<ApplicationDetails>> + Send;

    /// Fails with `Error::NotFound` when no application has this client ID.
    fn application_by_client_id(
        &self,
        client_id: &str,
    ) -> impl Future<Output = Result<ApplicationDetails>> + Send;

    fn update_application(
        &self,
        id: &str,
        patch: &ApplicationPatch,
    ) -> impl Future<Output = Result<()>> + Send;

    fn oidc_config(&self, id: &str) -> impl Future<Output = Result<OidcConfig>> + Send;

    fn replace_oidc_config(
        &self,
        id: &str,
        config: &OidcConfig,
    ) -> impl Future<Output = Result<()>> + Send;

    fn authorize_api(
        &self,
        app_id: &str,
        request: &AuthorizedApiRequest,
    ) -> impl Future<Output = Result<()>> + Send;

    fn authorized_apis(&self, app_id: &str) -> impl Future<Output = Result<Value>> + Send;

    /// Start an AI login flow generation.
    fn generate_login_flow(
        &self,
        request: &LoginFlowRequest,
    ) -> impl Future<Output = Result<LoginFlowGeneration>> + Send;

    fn login_flow_status(
        &self,
        operation_id: &str,
    ) -> impl Future<Output = Result<LoginFlowStatus>> + Send;

    fn login_flow_result(&self, operation_id: &str) -> impl Future<Output = Result<Value>> + Send;

    fn list_api_resources(
        &self,
        query: &ApiResourceQuery,
    ) -> impl Future<Output = Result<Vec<ApiResource>>> + Send;

    fn create_api_resource(
        &self,
        resource: &NewApiResource,
    ) -> impl Future<Output = Result<ApiResource>> + Send;

    fn list_local_claims(&self, exclude_hidden: bool) -> impl Future<Output = Result<Value>> + Send;

    fn create_user(&self, user: &NewUser) -> impl Future<Output = Result<Value>> + Send;
}
