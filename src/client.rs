//! Typed HTTP client for the authorization backend.
//! One request per call, no retries: failures are reported to the caller as-is.

use reqwest::header::HeaderMap;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::config::Config;
use crate::errors::{extract_error_message, ClientError};
use crate::models::token::{TokenList, TokenRecord, TokenStats, TokenStatsEnvelope};
use crate::models::user::{
    NotificationPreferences, PasswordChange, PreferencesEnvelope, ProfileEnvelope, ProfileUpdate,
    UserProfile,
};

pub const TOKENS_PATH: &str = "api/admin/tokens";
pub const TOKEN_STATS_PATH: &str = "oauth/token-stats";
pub const REVOKE_PATH: &str = "oauth/revoke";
pub const INTROSPECT_PATH: &str = "oauth/introspect";
pub const CLEANUP_CACHE_PATH: &str = "oauth/cleanup-cache";
pub const ME_PATH: &str = "api/auth/me";
pub const USERS_PATH: &str = "api/v1/users";
pub const CHANGE_PASSWORD_PATH: &str = "api/v1/change-password";
pub const PREFERENCES_PATH: &str = "api/v1/preferences";

/// Whether a request carries the caller-supplied auth headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Auth {
    Attach,
    Omit,
}

/// Whether a non-2xx body is inspected for a server-provided message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ErrorBody {
    Parse,
    Ignore,
}

#[derive(Clone)]
pub struct AuthClient {
    http: reqwest::Client,
    base_url: Url,
    auth_headers: HeaderMap,
    client_id: Option<String>,
    client_secret: Option<String>,
}

impl AuthClient {
    pub fn new(cfg: &Config) -> Result<Self, ClientError> {
        let auth_headers = cfg
            .auth_headers()
            .map_err(|e| ClientError::Config(format!("{:#}", e)))?;

        let http = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(cfg.request_timeout)
            .user_agent(concat!("authconsole/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: cfg.base_url.clone(),
            auth_headers,
            client_id: cfg.client_id.clone(),
            client_secret: cfg.client_secret.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|e| ClientError::Config(format!("cannot build url for '{}': {}", path, e)))
    }

    fn request(&self, method: Method, path: &str, auth: Auth) -> Result<RequestBuilder, ClientError> {
        let mut req = self
            .http
            .request(method, self.url(path)?)
            .header("x-request-id", uuid::Uuid::new_v4().to_string());
        if auth == Auth::Attach {
            req = req.headers(self.auth_headers.clone());
        }
        Ok(req)
    }

    async fn send(
        &self,
        req: RequestBuilder,
        op: &'static str,
        error_body: ErrorBody,
    ) -> Result<Response, ClientError> {
        let resp = req.send().await.map_err(|e| {
            tracing::warn!(op, error = %e, "request to auth backend failed");
            ClientError::Transport(e)
        })?;

        let status = resp.status();
        tracing::debug!(op, status = %status, url = %resp.url(), "auth backend responded");
        if status.is_success() {
            return Ok(resp);
        }

        let message = match error_body {
            ErrorBody::Parse => {
                let body = resp.text().await.unwrap_or_default();
                extract_error_message(&body)
            }
            ErrorBody::Ignore => None,
        };
        tracing::warn!(op, status = %status, message = ?message, "auth backend returned error");
        Err(ClientError::Status { status, message })
    }

    async fn decode<T: DeserializeOwned>(resp: Response, op: &'static str) -> Result<T, ClientError> {
        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::warn!(op, error = %e, "could not decode auth backend response");
            ClientError::Decode(format!("{}: {}", op, e))
        })
    }

    // ── Token dashboard ──────────────────────────────────────

    pub async fn list_tokens(&self) -> Result<Vec<TokenRecord>, ClientError> {
        let req = self.request(Method::GET, TOKENS_PATH, Auth::Omit)?;
        let resp = self.send(req, "list_tokens", ErrorBody::Ignore).await?;
        let list: TokenList = Self::decode(resp, "list_tokens").await?;
        Ok(list.tokens)
    }

    pub async fn token_stats(&self) -> Result<TokenStats, ClientError> {
        let req = self.request(Method::GET, TOKEN_STATS_PATH, Auth::Attach)?;
        let resp = self.send(req, "token_stats", ErrorBody::Ignore).await?;
        let env: TokenStatsEnvelope = Self::decode(resp, "token_stats").await?;
        Ok(env.data)
    }

    /// Revokes by key id or raw token value, sent as the `token` form field.
    pub async fn revoke_token(&self, token: &str) -> Result<(), ClientError> {
        let req = self
            .request(Method::POST, REVOKE_PATH, Auth::Attach)?
            .form(&[("token", token)]);
        self.send(req, "revoke_token", ErrorBody::Ignore).await?;
        Ok(())
    }

    /// Returns the backend's introspection result verbatim.
    ///
    /// `client_id`/`client_secret` override the configured credentials.
    pub async fn introspect_token(
        &self,
        token: &str,
        client_id: Option<&str>,
        client_secret: Option<&str>,
    ) -> Result<Value, ClientError> {
        let client_id = client_id.or(self.client_id.as_deref()).unwrap_or_default();
        let client_secret = client_secret
            .or(self.client_secret.as_deref())
            .unwrap_or_default();

        let req = self
            .request(Method::POST, INTROSPECT_PATH, Auth::Omit)?
            .form(&[
                ("token", token),
                ("client_id", client_id),
                ("client_secret", client_secret),
            ]);
        let resp = self.send(req, "introspect_token", ErrorBody::Ignore).await?;
        Self::decode(resp, "introspect_token").await
    }

    pub async fn cleanup_cache(&self) -> Result<(), ClientError> {
        let req = self.request(Method::POST, CLEANUP_CACHE_PATH, Auth::Attach)?;
        self.send(req, "cleanup_cache", ErrorBody::Ignore).await?;
        Ok(())
    }

    // ── Profile page ─────────────────────────────────────────

    pub async fn fetch_profile(&self) -> Result<UserProfile, ClientError> {
        let req = self.request(Method::GET, ME_PATH, Auth::Attach)?;
        let resp = self.send(req, "fetch_profile", ErrorBody::Ignore).await?;
        let env: ProfileEnvelope = Self::decode(resp, "fetch_profile").await?;
        Ok(env.into_profile())
    }

    pub async fn update_profile(&self, user_id: &str, update: &ProfileUpdate) -> Result<(), ClientError> {
        let path = format!("{}/{}", USERS_PATH, urlencoding::encode(user_id));
        let req = self.request(Method::PUT, &path, Auth::Attach)?.json(update);
        self.send(req, "update_profile", ErrorBody::Parse).await?;
        Ok(())
    }

    pub async fn change_password(&self, change: &PasswordChange) -> Result<(), ClientError> {
        let req = self
            .request(Method::POST, CHANGE_PASSWORD_PATH, Auth::Attach)?
            .json(change);
        self.send(req, "change_password", ErrorBody::Parse).await?;
        Ok(())
    }

    /// Current preferences; a backend without the endpoint yields the defaults.
    pub async fn fetch_preferences(&self) -> Result<NotificationPreferences, ClientError> {
        let req = self.request(Method::GET, PREFERENCES_PATH, Auth::Attach)?;
        match self.send(req, "fetch_preferences", ErrorBody::Ignore).await {
            Ok(resp) => {
                let env: PreferencesEnvelope = Self::decode(resp, "fetch_preferences").await?;
                Ok(env.into_preferences())
            }
            Err(ClientError::Status { status, .. }) if status == StatusCode::NOT_FOUND => {
                tracing::debug!("preferences endpoint not found, using defaults");
                Ok(NotificationPreferences::default())
            }
            Err(e) => Err(e),
        }
    }

    pub async fn update_preferences(&self, prefs: &NotificationPreferences) -> Result<(), ClientError> {
        let req = self
            .request(Method::PUT, PREFERENCES_PATH, Auth::Attach)?
            .json(prefs);
        self.send(req, "update_preferences", ErrorBody::Ignore).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_join_under_base_prefix() {
        let cfg = Config::with_base_url("https://auth.example.com/tenant-a").unwrap();
        let client = AuthClient::new(&cfg).unwrap();
        assert_eq!(
            client.url(TOKEN_STATS_PATH).unwrap().as_str(),
            "https://auth.example.com/tenant-a/oauth/token-stats"
        );
        let user_path = format!("{}/{}", USERS_PATH, urlencoding::encode("a b/c"));
        assert_eq!(
            client.url(&user_path).unwrap().as_str(),
            "https://auth.example.com/tenant-a/api/v1/users/a%20b%2Fc"
        );
    }

    #[test]
    fn test_invalid_auth_header_is_config_error() {
        let cfg = Config {
            access_token: Some("bad\ntoken".into()),
            ..Config::default()
        };
        assert!(matches!(AuthClient::new(&cfg), Err(ClientError::Config(_))));
    }

    #[test]
    fn test_unreachable_backend_is_transport_error() {
        let cfg = Config::with_base_url("http://127.0.0.1:1").unwrap();
        let client = AuthClient::new(&cfg).unwrap();
        let err = tokio_test::block_on(client.cleanup_cache()).unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
        assert_eq!(err.user_message("Failed to clean up token cache"), "Failed to clean up token cache");
    }
}
