//! Configuration loading from asgardeo-mcp.toml and the environment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use asgardeo::{ClientConfig, ProductMode};
use serde::Deserialize;
use tools::PollConfig;

/// File read when `--config` is not given. Optional.
pub const DEFAULT_CONFIG_FILE: &str = "asgardeo-mcp.toml";

/// Top-level configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub asgardeo: AsgardeoSection,
    pub poller: PollerSection,
    pub logging: LoggingSection,
}

/// Tenant connection settings.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AsgardeoSection {
    pub base_url: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// PEM certificate trusted in addition to the system roots.
    pub cert_path: Option<PathBuf>,
    pub product_mode: Option<String>,
}

/// Bounds for long-running operations such as login flow generation.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PollerSection {
    pub interval_secs: Option<u64>,
    pub max_attempts: Option<u32>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSection {
    pub format: Option<LogFormat>,
    /// Filter used when `RUST_LOG` is unset.
    pub level: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl FileConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load `explicit` if given, otherwise the default file if it exists.
    pub fn locate(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::load(DEFAULT_CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }
}

/// Effective settings after applying environment overrides.
#[derive(Debug, Clone)]
pub struct Settings {
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub cert_path: Option<PathBuf>,
    pub product: ProductMode,
    pub poll: PollConfig,
    pub log_format: LogFormat,
    pub log_level: String,
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::Invalid(message.to_string())
}

/// First non-empty value among `keys`.
fn first_set(env: &impl Fn(&str) -> Option<String>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|&key| env(key))
        .find(|value| !value.trim().is_empty())
}

impl Settings {
    /// Layer environment variables over the file.
    ///
    /// Credentials are not validated here; a server with missing credentials
    /// still starts and reports the problem on each tool call.
    pub fn resolve(
        file: FileConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let FileConfig {
            asgardeo,
            poller,
            logging,
        } = file;

        let product = match first_set(&env, &["PRODUCT_MODE"]).or(asgardeo.product_mode) {
            Some(mode) => mode
                .parse()
                .map_err(|e: asgardeo::Error| ConfigError::Invalid(e.to_string()))?,
            None => ProductMode::default(),
        };

        let log_format = match first_set(&env, &["ASGARDEO_MCP_LOG_FORMAT"]) {
            Some(format) if format.eq_ignore_ascii_case("json") => LogFormat::Json,
            Some(format) if format.eq_ignore_ascii_case("compact") => LogFormat::Compact,
            Some(other) => {
                return Err(ConfigError::Invalid(format!("unknown log format: {other}")));
            }
            None => logging.format.unwrap_or_default(),
        };

        let mut poll = PollConfig::default();
        if let Some(secs) = poller.interval_secs {
            if secs == 0 {
                return Err(invalid("poller.interval_secs must be at least 1"));
            }
            poll = poll.with_interval(Duration::from_secs(secs));
        }
        if let Some(max) = poller.max_attempts {
            if max == 0 {
                return Err(invalid("poller.max_attempts must be at least 1"));
            }
            poll = poll.with_max_attempts(max);
        }
        if let Some(secs) = poller.timeout_secs {
            poll = poll.with_timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            base_url: first_set(&env, &["BASE_URL", "ASGARDEO_BASE_URL"])
                .or(asgardeo.base_url)
                .unwrap_or_default(),
            client_id: first_set(&env, &["CLIENT_ID", "ASGARDEO_CLIENT_ID"])
                .or(asgardeo.client_id)
                .unwrap_or_default(),
            client_secret: first_set(&env, &["CLIENT_SECRET", "ASGARDEO_CLIENT_SECRET"])
                .or(asgardeo.client_secret)
                .unwrap_or_default(),
            cert_path: first_set(&env, &["CERT_PATH"])
                .map(PathBuf::from)
                .or(asgardeo.cert_path),
            product,
            poll,
            log_format,
            log_level: logging.level.unwrap_or_else(|| "info".to_string()),
        })
    }

    pub fn client_config(&self) -> ClientConfig {
        let config = ClientConfig::new(&self.base_url, &self.client_id, &self.client_secret);
        match &self.cert_path {
            Some(path) => config.with_cert_path(path),
            None => config,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}
