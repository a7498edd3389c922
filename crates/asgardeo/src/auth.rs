//! OAuth2 client-credentials token handling.

use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::{Error, Result};

/// Tokens this close to expiry are treated as expired.
const REFRESH_MARGIN: Duration = Duration::from_secs(30);

/// Lifetime assumed when the token endpoint omits `expires_in`.
const DEFAULT_LIFETIME: Duration = Duration::from_secs(3600);

/// Upper bound on an advertised `expires_in`.
const MAX_LIFETIME: Duration = Duration::from_secs(24 * 3600);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn from_response(token: TokenResponse, now: Instant) -> Self {
        let lifetime = token
            .expires_in
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_LIFETIME)
            .min(MAX_LIFETIME);

        Self {
            access_token: token.access_token,
            expires_at: now.checked_add(lifetime).unwrap_or(now),
        }
    }

    fn is_fresh(&self, now: Instant) -> bool {
        now + REFRESH_MARGIN < self.expires_at
    }
}

/// Fetches and caches the management access token.
pub(crate) struct TokenSource {
    token_url: String,
    client_id: String,
    client_secret: String,
    scope: String,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenSource {
    pub(crate) fn new(
        base_url: &str,
        client_id: &str,
        client_secret: &str,
        scopes: &[String],
    ) -> Self {
        Self {
            token_url: format!("{base_url}/oauth2/token"),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            scope: scopes.join(" "),
            cached: Mutex::new(None),
        }
    }

    /// A valid access token, fetching a new one if the cached one is stale.
    ///
    /// The lock is held across the fetch so concurrent callers share one
    /// token request.
    pub(crate) async fn access_token(&self, http: &reqwest::Client) -> Result<String> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(Instant::now())) {
            return Ok(token.access_token.clone());
        }

        let token = self.fetch(http).await?;
        let access_token = token.access_token.clone();
        *cached = Some(token);
        Ok(access_token)
    }

    async fn fetch(&self, http: &reqwest::Client) -> Result<CachedToken> {
        debug!(url = %self.token_url, "requesting access token");
        let response = http
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[
                ("grant_type", "client_credentials"),
                ("scope", self.scope.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(if status.is_client_error() {
                Error::Auth(format!("{status}: {body}"))
            } else {
                Error::Api {
                    status: status.as_u16(),
                    body,
                }
            });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::InvalidResponse(format!("token response: {e}")))?;

        Ok(CachedToken::from_response(token, Instant::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_expiring_in(secs: u64) -> (CachedToken, Instant) {
        let now = Instant::now();
        let token = CachedToken {
            access_token: "t".into(),
            expires_at: now + Duration::from_secs(secs),
        };
        (token, now)
    }

    #[test]
    fn token_is_refreshed_inside_margin() {
        let (token, now) = token_expiring_in(3600);
        assert!(token.is_fresh(now));

        let (token, now) = token_expiring_in(30);
        assert!(!token.is_fresh(now));

        let (token, now) = token_expiring_in(10);
        assert!(!token.is_fresh(now));
    }

    #[test]
    fn token_url_and_scope_are_derived() {
        let source = TokenSource::new(
            "https://api.asgardeo.io/t/acme",
            "id",
            "secret",
            &["a".to_string(), "b".to_string()],
        );
        assert_eq!(source.token_url, "https://api.asgardeo.io/t/acme/oauth2/token");
        assert_eq!(source.scope, "a b");
    }

    #[test]
    fn token_response_without_expiry_parses() {
        let token: TokenResponse = serde_json::from_str(r#"{"access_token":"abc"}"#).unwrap();
        assert_eq!(token.access_token, "abc");
        assert!(token.expires_in.is_none());
    }

    #[test]
    fn lifetime_comes_from_expires_in() {
        let now = Instant::now();
        let response = |expires_in| TokenResponse {
            access_token: "t".into(),
            expires_in,
        };

        let token = CachedToken::from_response(response(Some(600)), now);
        assert_eq!(token.expires_at, now + Duration::from_secs(600));

        let token = CachedToken::from_response(response(None), now);
        assert_eq!(token.expires_at, now + DEFAULT_LIFETIME);
    }

    #[test]
    fn huge_expires_in_is_clamped() {
        let now = Instant::now();
        let token: TokenResponse =
            serde_json::from_str(r#"{"access_token":"t","expires_in":18446744073709551615}"#)
                .unwrap();

        let token = CachedToken::from_response(token, now);
        assert_eq!(token.expires_at, now + MAX_LIFETIME);
        assert!(token.is_fresh(now));
    }
}
