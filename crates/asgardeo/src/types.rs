//! Request and response models for the management API.
//!
//! Only the fields the tools read or write are modelled. Objects that are
//! fetched, edited and written back keep unknown fields in a flattened map so
//! a `GET` followed by a `PUT` does not drop server-side settings.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Scopes requested by interactive (browser or mobile) applications.
pub const INTERACTIVE_SCOPES: &str = "openid profile";

// ─────────────────────────────────────────────────────────────────────────────
// Applications
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationSummary {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApplicationList {
    #[serde(default)]
    pub applications: Vec<ApplicationSummary>,
}

/// The application templates the tools can create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationKind {
    SinglePage,
    ServerSideWeb,
    Mobile,
    MachineToMachine,
}

impl ApplicationKind {
    pub fn template_id(self) -> &'static str {
        match self {
            Self::SinglePage => "6a90e4b0-fbff-42d7-bfde-1efd98f07cd7",
            Self::ServerSideWeb => "b9c5e11e-fc78-484b-9bec-015d247561b8",
            Self::Mobile => "mobile-application",
            Self::MachineToMachine => "m2m-application",
        }
    }

    fn grant_types(self) -> &'static [&'static str] {
        match self {
            Self::MachineToMachine => &["client_credentials"],
            _ => &["authorization_code", "refresh_token"],
        }
    }

    fn is_public_client(self) -> bool {
        matches!(self, Self::SinglePage | Self::Mobile)
    }
}

/// Input for `create_application`.
#[derive(Debug, Clone)]
pub struct NewApplication {
    pub name: String,
    pub kind: ApplicationKind,
    /// Ignored for machine-to-machine applications.
    pub redirect_url: Option<String>,
}

impl NewApplication {
    pub fn new(name: impl Into<String>, kind: ApplicationKind) -> Self {
        Self {
            name: name.into(),
            kind,
            redirect_url: None,
        }
    }

    pub fn with_redirect_url(mut self, url: impl Into<String>) -> Self {
        self.redirect_url = Some(url.into());
        self
    }

    /// Body for `POST /applications`.
    pub fn to_request_body(&self) -> Value {
        let mut oidc = json!({
            "grantTypes": self.kind.grant_types(),
            "publicClient": self.kind.is_public_client(),
        });

        if self.kind != ApplicationKind::MachineToMachine {
            let callbacks: Vec<&str> = self.redirect_url.as_deref().into_iter().collect();
            oidc["callbackURLs"] = json!(callbacks);
            if self.kind == ApplicationKind::SinglePage {
                let origins: Vec<String> = self
                    .redirect_url
                    .as_deref()
                    .and_then(origin_of)
                    .into_iter()
                    .collect();
                oidc["allowedOrigins"] = json!(origins);
                oidc["pkce"] = json!({"mandatory": true, "supportPlainTransformAlgorithm": false});
            }
        }

        json!({
            "name": self.name,
            "templateId": self.kind.template_id(),
            "inboundProtocolConfiguration": { "oidc": oidc },
            "advancedConfigurations": {
                "skipLoginConsent": true,
                "skipLogoutConsent": true
            }
        })
    }
}

/// Scheme and authority of a URL, e.g. `https://app.example.com:3000`.
fn origin_of(url: &str) -> Option<String> {
    let (scheme, rest) = url.split_once("://")?;
    let authority = rest.split(['/', '?', '#']).next()?;
    if authority.is_empty() {
        return None;
    }
    Some(format!("{scheme}://{authority}"))
}

/// An application together with its OAuth credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationDetails {
    pub id: String,
    pub name: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_urls: Vec<String>,
}

impl ApplicationDetails {
    pub(crate) fn from_parts(summary: ApplicationSummary, oidc: OidcConfig) -> Self {
        Self {
            id: summary.id,
            name: summary.name,
            client_id: oidc.client_id,
            client_secret: oidc.client_secret,
            redirect_urls: oidc.callback_urls,
        }
    }
}

/// Partial update for `PATCH /applications/{id}`. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logout_return_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claim_configuration: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authentication_sequence: Option<Value>,
}

impl ApplicationPatch {
    /// Request each local claim URI from the user, none of them mandatory.
    pub fn requested_claims<S: AsRef<str>>(claims: &[S]) -> Self {
        let requested: Vec<Value> = claims
            .iter()
            .map(|uri| json!({"claim": {"uri": uri.as_ref()}, "mandatory": false}))
            .collect();
        Self {
            claim_configuration: Some(json!({
                "dialect": "LOCAL",
                "requestedClaims": requested
            })),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// OIDC inbound protocol settings of one application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OidcConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(default, rename = "callbackURLs")]
    pub callback_urls: Vec<String>,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub access_token: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub refresh_token: Map<String, Value>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// Body for `POST /applications/{id}/authorized-apis`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizedApiRequest {
    pub id: String,
    pub policy_identifier: String,
    pub scopes: Vec<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// AI login flow generation
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginFlowRequest {
    pub user_query: String,
}

/// Response to a generation request. The id may be missing on a bad response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginFlowGeneration {
    #[serde(default)]
    pub operation_id: Option<String>,
}

/// Progress of a generation. `status` maps each sub-task to its done flag.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginFlowStatus {
    #[serde(default)]
    pub operation_id: Option<String>,
    #[serde(default)]
    pub status: Option<BTreeMap<String, bool>>,
}

// ─────────────────────────────────────────────────────────────────────────────
// API resources
// ─────────────────────────────────────────────────────────────────────────────

/// Query parameters for `GET /api-resources`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApiResourceQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl ApiResourceQuery {
    pub fn filtered(filter: impl Into<String>) -> Self {
        Self {
            filter: Some(filter.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResource {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_authorization: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiResourceList {
    #[serde(default)]
    pub api_resources: Vec<ApiResource>,
}

/// One scope of a new API resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeCreate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ScopeCreate {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: None,
            description: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewApiResource {
    pub identifier: String,
    pub name: String,
    pub requires_authorization: bool,
    pub scopes: Vec<ScopeCreate>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Users
// ─────────────────────────────────────────────────────────────────────────────

const SCIM_USER_SCHEMA: &str = "urn:ietf:params:scim:schemas:core:2.0:User";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Qualified name, `DOMAIN/username`.
    pub username: String,
    pub password: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl NewUser {
    /// SCIM 2.0 body for `POST /scim2/Users`.
    pub fn to_scim(&self) -> Value {
        json!({
            "schemas": [SCIM_USER_SCHEMA],
            "userName": self.username,
            "password": self.password,
            "name": {
                "givenName": self.first_name,
                "familyName": self.last_name
            },
            "emails": [{ "value": self.email, "primary": true }]
        })
    }
}
