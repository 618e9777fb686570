use crate::error::CredentialError;
use crate::types::TokenResponse;
use chrono::{DateTime, TimeDelta, Utc};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

/// Tokens are treated as expired this long before their declared expiry.
const EXPIRY_MARGIN_SECS: i64 = 30;
/// Lifetime assumed when the token endpoint does not declare one.
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 600;

/// Where bearer tokens for the generator come from.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// A fixed token used as-is; it cannot be refreshed.
    Static(String),
    /// Long-lived authorization key exchanged for short-lived access tokens.
    OAuth {
        auth_url: String,
        /// Pre-encoded `Basic` authorization key.
        auth_key: String,
        scope: String,
    },
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + TimeDelta::seconds(EXPIRY_MARGIN_SECS) < self.expires_at
    }
}

/// Bearer token cache shared by every call through one generator client.
///
/// Acquisition is serialized behind the lock so concurrent callers reuse a
/// single refresh. Invalidation only drops the token that was rejected.
pub struct CredentialCache {
    credentials: Credentials,
    http: reqwest::Client,
    cached: Mutex<Option<AccessToken>>,
}

impl CredentialCache {
    pub fn new(credentials: Credentials, timeout: Duration) -> Result<Self, CredentialError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            credentials,
            http,
            cached: Mutex::new(None),
        })
    }

    /// Cache over a fixed token.
    pub fn fixed(token: impl Into<String>) -> Self {
        Self {
            credentials: Credentials::Static(token.into()),
            http: reqwest::Client::new(),
            cached: Mutex::new(None),
        }
    }

    /// Current bearer token, fetching a new one when the cached one is stale.
    pub async fn bearer(&self) -> Result<String, CredentialError> {
        let (auth_url, auth_key, scope) = match &self.credentials {
            Credentials::Static(token) => return Ok(token.clone()),
            Credentials::OAuth {
                auth_url,
                auth_key,
                scope,
            } => (auth_url, auth_key, scope),
        };

        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(Utc::now())) {
            return Ok(token.value.clone());
        }

        let token = self.fetch(auth_url, auth_key, scope).await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    /// Drop `rejected` from the cache if it is still the cached token.
    /// Returns whether anything was dropped.
    pub async fn invalidate(&self, rejected: &str) -> bool {
        if matches!(self.credentials, Credentials::Static(_)) {
            return false;
        }
        let mut cached = self.cached.lock().await;
        if cached.as_ref().is_some_and(|t| t.value == rejected) {
            *cached = None;
            info!("generator_credential_invalidated");
            return true;
        }
        false
    }

    async fn fetch(
        &self,
        auth_url: &str,
        auth_key: &str,
        scope: &str,
    ) -> Result<AccessToken, CredentialError> {
        debug!("Requesting access token from {}", auth_url);

        let response = self
            .http
            .post(auth_url)
            .header(reqwest::header::AUTHORIZATION, format!("Basic {}", auth_key))
            .header(reqwest::header::ACCEPT, "application/json")
            .header("RqUID", Uuid::new_v4().to_string())
            .form(&[("scope", scope)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CredentialError::Status { status, body });
        }

        let body = response.text().await?;
        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| CredentialError::Envelope(e.to_string()))?;

        Ok(AccessToken {
            expires_at: expiry_of(&token, Utc::now()),
            value: token.access_token,
        })
    }
}

fn expiry_of(token: &TokenResponse, now: DateTime<Utc>) -> DateTime<Utc> {
    if let Some(at) = token.expires_at.and_then(DateTime::<Utc>::from_timestamp_millis) {
        return at;
    }
    if let Some(secs) = token.expires_in {
        return now + TimeDelta::seconds(secs);
    }
    now + TimeDelta::seconds(DEFAULT_TOKEN_LIFETIME_SECS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use std::sync::Arc;

    fn oauth(url: String) -> Credentials {
        Credentials::OAuth {
            auth_url: url,
            auth_key: "bG9uZy1saXZlZA==".to_string(),
            scope: "GIGACHAT_API_PERS".to_string(),
        }
    }

    fn token_body(token: &str, expires_at: Option<i64>) -> String {
        match expires_at {
            Some(at) => serde_json::json!({"access_token": token, "expires_at": at}).to_string(),
            None => serde_json::json!({"access_token": token}).to_string(),
        }
    }

    #[test]
    fn missing_expiry_gets_default_lifetime() {
        let now = Utc::now();
        let token = TokenResponse {
            access_token: "t".into(),
            expires_at: None,
            expires_in: None,
        };
        assert_eq!(
            expiry_of(&token, now),
            now + TimeDelta::seconds(DEFAULT_TOKEN_LIFETIME_SECS)
        );
    }

    #[test]
    fn token_inside_safety_margin_is_stale() {
        let now = Utc::now();
        let token = AccessToken {
            value: "t".into(),
            expires_at: now + TimeDelta::seconds(EXPIRY_MARGIN_SECS - 1),
        };
        assert!(!token.is_fresh(now));

        let token = AccessToken {
            value: "t".into(),
            expires_at: now + TimeDelta::seconds(EXPIRY_MARGIN_SECS + 60),
        };
        assert!(token.is_fresh(now));
    }

    #[tokio::test]
    async fn fixed_token_is_returned_without_network() {
        let cache = CredentialCache::fixed("static-token");
        assert_eq!(cache.bearer().await.unwrap(), "static-token");
        assert!(!cache.invalidate("static-token").await);
    }

    #[tokio::test]
    async fn unexpired_token_is_reused() {
        let mut server = Server::new_async().await;
        let expires_at = (Utc::now() + TimeDelta::minutes(30)).timestamp_millis();
        let mock = server
            .mock("POST", "/oauth")
            .match_header("authorization", "Basic bG9uZy1saXZlZA==")
            .match_header("rquid", Matcher::Any)
            .match_body(Matcher::UrlEncoded(
                "scope".into(),
                "GIGACHAT_API_PERS".into(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(token_body("tok-1", Some(expires_at)))
            .expect(1)
            .create_async()
            .await;

        let cache =
            CredentialCache::new(oauth(format!("{}/oauth", server.url())), Duration::from_secs(5))
                .unwrap();
        assert_eq!(cache.bearer().await.unwrap(), "tok-1");
        assert_eq!(cache.bearer().await.unwrap(), "tok-1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_fetch() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/oauth")
            .with_status(200)
            .with_body(token_body("tok-shared", None))
            .expect(1)
            .create_async()
            .await;

        let cache = Arc::new(
            CredentialCache::new(oauth(format!("{}/oauth", server.url())), Duration::from_secs(5))
                .unwrap(),
        );
        let (a, b, c, d) = tokio::join!(cache.bearer(), cache.bearer(), cache.bearer(), cache.bearer());
        for token in [a, b, c, d] {
            assert_eq!(token.unwrap(), "tok-shared");
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn expired_token_is_fetched_again() {
        let mut server = Server::new_async().await;
        let expired = (Utc::now() - TimeDelta::minutes(1)).timestamp_millis();
        let mock = server
            .mock("POST", "/oauth")
            .with_status(200)
            .with_body(token_body("tok-old", Some(expired)))
            .expect(2)
            .create_async()
            .await;

        let cache =
            CredentialCache::new(oauth(format!("{}/oauth", server.url())), Duration::from_secs(5))
                .unwrap();
        cache.bearer().await.unwrap();
        cache.bearer().await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn invalidate_only_drops_the_rejected_token() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/oauth")
            .with_status(200)
            .with_body(token_body("tok-1", None))
            .expect(2)
            .create_async()
            .await;

        let cache =
            CredentialCache::new(oauth(format!("{}/oauth", server.url())), Duration::from_secs(5))
                .unwrap();
        cache.bearer().await.unwrap();

        assert!(!cache.invalidate("some-other-token").await);
        assert!(cache.invalidate("tok-1").await);
        assert!(!cache.invalidate("tok-1").await);

        cache.bearer().await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn token_endpoint_error_is_reported() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/oauth")
            .with_status(401)
            .with_body("bad key")
            .create_async()
            .await;

        let cache =
            CredentialCache::new(oauth(format!("{}/oauth", server.url())), Duration::from_secs(5))
                .unwrap();
        let err = cache.bearer().await.unwrap_err();
        assert!(matches!(err, CredentialError::Status { .. }));
    }
}
