use std::time::Duration;

use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_NOTICE_SECS: u64 = 5;

#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: Url,
    /// Bearer token sent as `Authorization` on authenticated endpoints.
    pub access_token: Option<String>,
    /// Additional caller-supplied auth headers, e.g. a session or CSRF header.
    pub extra_headers: Vec<(String, String)>,
    /// Client credentials used for token introspection.
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub request_timeout: Duration,
    /// How long a notice stays visible before it is auto-dismissed.
    pub notice_ttl: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base url is valid"),
            access_token: None,
            extra_headers: Vec::new(),
            client_id: None,
            client_secret: None,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            notice_ttl: Duration::from_secs(DEFAULT_NOTICE_SECS),
        }
    }
}

impl Config {
    /// Config pointing at `base_url` with everything else defaulted.
    pub fn with_base_url(base_url: &str) -> anyhow::Result<Self> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            ..Self::default()
        })
    }

    /// Builds the header set attached to authenticated requests.
    pub fn auth_headers(&self) -> anyhow::Result<HeaderMap> {
        let mut headers = HeaderMap::new();

        if let Some(token) = &self.access_token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .context("access token contains invalid header characters")?;
            headers.insert(AUTHORIZATION, value);
        }

        for (name, value) in &self.extra_headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .with_context(|| format!("invalid header name '{}'", name))?;
            let value = HeaderValue::from_str(value)
                .with_context(|| format!("invalid value for header '{}'", name))?;
            headers.insert(name, value);
        }

        Ok(headers)
    }
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();

    let base_url = std::env::var("AUTHCONSOLE_BASE_URL")
        .unwrap_or_else(|_| DEFAULT_BASE_URL.into());

    Ok(Config {
        base_url: parse_base_url(&base_url)?,
        access_token: non_empty_var("AUTHCONSOLE_ACCESS_TOKEN"),
        extra_headers: parse_extra_headers(
            &std::env::var("AUTHCONSOLE_EXTRA_HEADERS").unwrap_or_default(),
        )?,
        client_id: non_empty_var("AUTHCONSOLE_CLIENT_ID"),
        client_secret: non_empty_var("AUTHCONSOLE_CLIENT_SECRET"),
        request_timeout: Duration::from_secs(
            std::env::var("AUTHCONSOLE_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        ),
        notice_ttl: Duration::from_secs(
            std::env::var("AUTHCONSOLE_NOTICE_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_NOTICE_SECS),
        ),
    })
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn parse_base_url(raw: &str) -> anyhow::Result<Url> {
    let mut url = Url::parse(raw.trim()).with_context(|| format!("invalid base url '{}'", raw))?;
    if url.cannot_be_a_base() {
        anyhow::bail!("base url '{}' cannot carry a path", raw);
    }
    // Url::join drops the last segment unless the path ends with '/'.
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Parses `Name: value;Other: value` into header pairs.
pub fn parse_extra_headers(raw: &str) -> anyhow::Result<Vec<(String, String)>> {
    raw.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|pair| -> anyhow::Result<(String, String)> {
            let (name, value) = pair
                .split_once(':')
                .with_context(|| format!("header '{}' is missing ':'", pair))?;
            let name = name.trim();
            if name.is_empty() {
                anyhow::bail!("header '{}' has an empty name", pair);
            }
            Ok((name.to_string(), value.trim().to_string()))
        })
        .collect()
}
