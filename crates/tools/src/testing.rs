//! Test doubles shared by the unit tests in this crate.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use asgardeo::types::ApplicationSummary;
use asgardeo::{
    ApiResource, ApiResourceQuery, ApplicationDetails, ApplicationPatch, AuthorizedApiRequest,
    Error, LoginFlowGeneration, LoginFlowRequest, LoginFlowStatus, ManagementApi, NewApiResource,
    NewApplication, NewUser, OidcConfig, Result,
};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

use crate::poller::{Clock, Operation, OperationStatus};

pub(crate) const BASE_URL: &str = "https://api.asgardeo.io/t/acme";

// ─────────────────────────────────────────────────────────────────────────────
// Clock
// ─────────────────────────────────────────────────────────────────────────────

struct ClockState {
    elapsed: Duration,
    sleeps: Vec<Duration>,
}

/// A clock that only moves when slept on. Sleeps return immediately.
#[derive(Clone)]
pub(crate) struct ManualClock {
    origin: Instant,
    state: Arc<Mutex<ClockState>>,
}

impl ManualClock {
    pub(crate) fn new() -> Self {
        Self {
            origin: Instant::now(),
            state: Arc::new(Mutex::new(ClockState {
                elapsed: Duration::ZERO,
                sleeps: Vec::new(),
            })),
        }
    }

    pub(crate) fn sleeps(&self) -> Vec<Duration> {
        self.state.lock().unwrap().sleeps.clone()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.state.lock().unwrap().elapsed
    }

    async fn sleep(&self, duration: Duration) {
        let mut state = self.state.lock().unwrap();
        state.elapsed += duration;
        state.sleeps.push(duration);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Operation
// ─────────────────────────────────────────────────────────────────────────────

/// An operation whose status answers are scripted in advance. Once the
/// script runs out every status is incomplete.
pub(crate) struct ScriptedOperation {
    id: Option<String>,
    statuses: Mutex<VecDeque<std::result::Result<Option<OperationStatus>, String>>>,
    fetch_error: Option<String>,
    cancel: Option<(u32, CancellationToken)>,
    status_calls: AtomicU32,
    fetch_calls: AtomicU32,
}

impl ScriptedOperation {
    pub(crate) fn new(
        id: Option<&str>,
        statuses: Vec<std::result::Result<Option<OperationStatus>, String>>,
    ) -> Self {
        Self {
            id: id.map(str::to_string),
            statuses: Mutex::new(statuses.into()),
            fetch_error: None,
            cancel: None,
            status_calls: AtomicU32::new(0),
            fetch_calls: AtomicU32::new(0),
        }
    }

    pub(crate) fn never_completing(id: &str) -> Self {
        Self::new(Some(id), Vec::new())
    }

    pub(crate) fn failing_fetch(mut self, reason: &str) -> Self {
        self.fetch_error = Some(reason.to_string());
        self
    }

    /// Cancel `token` while answering status query number `query`.
    pub(crate) fn cancel_after(mut self, query: u32, token: CancellationToken) -> Self {
        self.cancel = Some((query, token));
        self
    }

    pub(crate) fn status_calls(&self) -> u32 {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn fetch_calls(&self) -> u32 {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

impl Operation for ScriptedOperation {
    type Output = String;
    type Error = String;

    async fn submit(&self) -> std::result::Result<Option<String>, String> {
        Ok(self.id.clone())
    }

    async fn status(
        &self,
        _operation_id: &str,
    ) -> std::result::Result<Option<OperationStatus>, String> {
        let call = self.status_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((at, token)) = &self.cancel {
            if *at == call {
                token.cancel();
            }
        }
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Some([("step".to_string(), false)].into())))
    }

    async fn result(&self, operation_id: &str) -> std::result::Result<String, String> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        match &self.fetch_error {
            Some(reason) => Err(reason.clone()),
            None => Ok(format!("result of {operation_id}")),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Management API
// ─────────────────────────────────────────────────────────────────────────────

/// In-memory management API that records every call it receives.
#[derive(Default)]
pub(crate) struct FakeApi {
    calls: Mutex<Vec<String>>,
    pub(crate) login_statuses: Mutex<VecDeque<LoginFlowStatus>>,
    pub(crate) login_result: Mutex<Option<Value>>,
    pub(crate) patches: Mutex<Vec<(String, ApplicationPatch)>>,
    pub(crate) oidc: Mutex<OidcConfig>,
    pub(crate) authorized: Mutex<Vec<(String, AuthorizedApiRequest)>>,
    pub(crate) api_resources: Vec<ApiResource>,
    pub(crate) created_resources: Mutex<Vec<NewApiResource>>,
    pub(crate) users: Mutex<Vec<NewUser>>,
}

impl FakeApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_api_resources(mut self, resources: Vec<ApiResource>) -> Self {
        self.api_resources = resources;
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn shop() -> ApplicationDetails {
        ApplicationDetails {
            id: "app-1".into(),
            name: "shop".into(),
            client_id: Some("cid-1".into()),
            client_secret: Some("secret-1".into()),
            redirect_urls: vec!["https://shop.example.com/callback".into()],
        }
    }
}

pub(crate) fn api_resource(id: &str, name: &str, identifier: &str) -> ApiResource {
    ApiResource {
        id: id.into(),
        name: name.into(),
        identifier: Some(identifier.into()),
        kind: Some("BUSINESS".into()),
        requires_authorization: Some(true),
        scopes: Vec::new(),
    }
}

impl ManagementApi for FakeApi {
    fn base_url(&self) -> &str {
        BASE_URL
    }

    async fn list_applications(&self, limit: u32, offset: u32) -> Result<Vec<ApplicationSummary>> {
        self.record(format!("list_applications {limit} {offset}"));
        let shop = Self::shop();
        Ok(vec![ApplicationSummary {
            id: shop.id,
            name: shop.name,
        }])
    }

    async fn create_application(&self, app: &NewApplication) -> Result<ApplicationDetails> {
        self.record(format!("create_application {} {:?}", app.name, app.kind));
        Ok(ApplicationDetails {
            id: "app-new".into(),
            name: app.name.clone(),
            client_id: Some("cid-new".into()),
            client_secret: Some("secret-new".into()),
            redirect_urls: app.redirect_url.iter().cloned().collect(),
        })
    }

    async fn application_by_name(&self, name: &str) -> Result<ApplicationDetails> {
        self.record(format!("application_by_name {name}"));
        match name {
            "shop" => Ok(Self::shop()),
            _ => Err(Error::NotFound(format!("application with name eq {name}"))),
        }
    }

    async fn application_by_client_id(&self, client_id: &str) -> Result<ApplicationDetails> {
        self.record(format!("application_by_client_id {client_id}"));
        match client_id {
            "cid-1" => Ok(Self::shop()),
            _ => Err(Error::NotFound(format!("application with clientId eq {client_id}"))),
        }
    }

    async fn update_application(&self, id: &str, patch: &ApplicationPatch) -> Result<()> {
        self.record(format!("update_application {id}"));
        self.patches
            .lock()
            .unwrap()
            .push((id.to_string(), patch.clone()));
        Ok(())
    }

    async fn oidc_config(&self, id: &str) -> Result<OidcConfig> {
        self.record(format!("oidc_config {id}"));
        Ok(self.oidc.lock().unwrap().clone())
    }

    async fn replace_oidc_config(&self, id: &str, config: &OidcConfig) -> Result<()> {
        self.record(format!("replace_oidc_config {id}"));
        *self.oidc.lock().unwrap() = config.clone();
        Ok(())
    }

    async fn authorize_api(&self, app_id: &str, request: &AuthorizedApiRequest) -> Result<()> {
        self.record(format!("authorize_api {app_id} {}", request.id));
        self.authorized
            .lock()
            .unwrap()
            .push((app_id.to_string(), request.clone()));
        Ok(())
    }

    async fn authorized_apis(&self, app_id: &str) -> Result<Value> {
        self.record(format!("authorized_apis {app_id}"));
        Ok(json!([{"id": "api-1", "identifier": "orders_api", "policyId": "RBAC"}]))
    }

    async fn generate_login_flow(&self, request: &LoginFlowRequest) -> Result<LoginFlowGeneration> {
        self.record(format!("generate_login_flow {}", request.user_query));
        Ok(LoginFlowGeneration {
            operation_id: Some("flow-1".into()),
        })
    }

    async fn login_flow_status(&self, operation_id: &str) -> Result<LoginFlowStatus> {
        self.record(format!("login_flow_status {operation_id}"));
        let next = self.login_statuses.lock().unwrap().pop_front();
        Ok(next.unwrap_or_else(|| LoginFlowStatus {
            operation_id: Some(operation_id.to_string()),
            status: Some([("steps".to_string(), true)].into()),
        }))
    }

    async fn login_flow_result(&self, operation_id: &str) -> Result<Value> {
        self.record(format!("login_flow_result {operation_id}"));
        let scripted = self.login_result.lock().unwrap().clone();
        Ok(scripted.unwrap_or_else(|| {
            let step = |id: u32, authenticator: &str| {
                json!({"id": id, "options": [{"idp": "LOCAL", "authenticator": authenticator}]})
            };
            json!({
                "status": "COMPLETED",
                "data": {
                    "steps": [
                        step(1, "BasicAuthenticator"),
                        step(2, "email-otp-authenticator"),
                    ]
                }
            })
        }))
    }

    async fn list_api_resources(&self, query: &ApiResourceQuery) -> Result<Vec<ApiResource>> {
        self.record(format!("list_api_resources {:?}", query.filter));
        let matches = |r: &&ApiResource| match query.filter.as_deref() {
            Some(filter) => match filter.split_once(" eq ") {
                Some(("name", name)) => r.name == name,
                Some(("identifier", id)) => r.identifier.as_deref() == Some(id),
                _ => true,
            },
            None => true,
        };
        Ok(self.api_resources.iter().filter(matches).cloned().collect())
    }

    async fn create_api_resource(&self, resource: &NewApiResource) -> Result<ApiResource> {
        self.record(format!("create_api_resource {}", resource.identifier));
        self.created_resources.lock().unwrap().push(resource.clone());
        Ok(ApiResource {
            requires_authorization: Some(resource.requires_authorization),
            ..api_resource("res-new", &resource.name, &resource.identifier)
        })
    }

    async fn list_local_claims(&self, exclude_hidden: bool) -> Result<Value> {
        self.record(format!("list_local_claims {exclude_hidden}"));
        Ok(json!([{"claimURI": "http://wso2.org/claims/emailaddress", "displayName": "Email"}]))
    }

    async fn create_user(&self, user: &NewUser) -> Result<Value> {
        self.record(format!("create_user {}", user.username));
        self.users.lock().unwrap().push(user.clone());
        Ok(json!({"id": "user-1", "userName": user.username}))
    }
}
