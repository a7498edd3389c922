//! Client configuration.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::{Error, Result};

/// Request timeout applied to every management call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Scopes requested for the management token.
pub const DEFAULT_SCOPES: &[&str] = &[
    "internal_application_mgt_create",
    "internal_application_mgt_delete",
    "internal_application_mgt_update",
    "internal_application_mgt_view",
    "internal_api_resource_create",
    "internal_api_resource_view",
    "internal_claim_meta_view",
    "internal_user_mgt_create",
    "internal_user_mgt_list",
    "internal_login_flow_ai_generate",
    "internal_login_flow_ai_view",
];

/// Connection settings for the management API.
#[derive(Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
    /// PEM file added to the trusted roots (self-hosted deployments).
    pub cert_path: Option<PathBuf>,
    pub timeout: Duration,
    pub scopes: Vec<String>,
}

impl ClientConfig {
    pub fn new(
        base_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            cert_path: None,
            timeout: DEFAULT_TIMEOUT,
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn with_cert_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cert_path = Some(path.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Check that every required value is present.
    pub fn validate(&self) -> Result<()> {
        let missing: Vec<&str> = [
            ("base URL", &self.base_url),
            ("client ID", &self.client_id),
            ("client secret", &self.client_secret),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::Config(format!("missing {}", missing.join(", "))))
        }
    }
}

// Keeps the secret out of logs.
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("cert_path", &self.cert_path)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Which product the server is talking to. Only affects wording.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductMode {
    #[default]
    Asgardeo,
    Wso2is,
}

impl ProductMode {
    pub fn product_name(self) -> &'static str {
        match self {
            Self::Asgardeo => "Asgardeo",
            Self::Wso2is => "WSO2 Identity Server",
        }
    }
}

impl FromStr for ProductMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "asgardeo" => Ok(Self::Asgardeo),
            "wso2is" => Ok(Self::Wso2is),
            other => Err(Error::Config(format!("unknown product mode: {other}"))),
        }
    }
}
