//! Client for the Threadline REST backend.
//!
//! # Architecture
//!
//! - JSON over HTTP via `reqwest`, one shared connection pool
//! - The backend is the source of truth; catalog reads are cached via `moka`
//!   (5 minute TTL)
//! - Responses may be bare JSON or wrapped as `{"data": ...}`; both decode
//!
//! # Authentication
//!
//! Customer endpoints take the shopper's [`TokenSet`]. A token past its
//! client-side expiry is refreshed before the call. A `401` carrying the
//! `TOKEN_EXPIRED` code triggers one refresh and one retry. Refreshes are
//! single-flight per refresh token: concurrent callers share one
//! `POST /auth/refresh`.
//!
//! # Example
//!
//! ```rust,ignore
//! use threadline_storefront::api::ApiClient;
//!
//! let client = ApiClient::new(&config.api)?;
//! let zones = client.delivery_zones().await?;
//! let addresses = client.addresses(&mut tokens).await?;
//! ```

mod cache;
mod catalog;
mod customer;
mod locations;
mod token;
pub mod types;

pub use token::{TOKEN_EXPIRED_CODE, TOKEN_LIFETIME_HOURS, TokenSet};
pub use types::*;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::instrument;
use url::Url;

use crate::config::ApiConfig;

use cache::CacheValue;

/// How long a completed refresh is reused by late arrivals holding the same
/// refresh token.
const REFRESH_REUSE_TTL: Duration = Duration::from_secs(30);

/// How long catalog reads are cached.
const CATALOG_TTL: Duration = Duration::from_secs(300);

/// Errors that can occur when calling the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connection, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Non-success status not covered by a more specific variant.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend rejected the bearer token.
    #[error("Unauthorized ({})", .code.as_deref().unwrap_or("no code"))]
    Unauthorized { code: Option<String> },

    /// The refresh token was rejected; the shopper must sign in again.
    #[error("Session expired: {0}")]
    SessionExpired(String),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),
}

impl ApiError {
    /// Whether this is a 401 carrying the token-expired code.
    #[must_use]
    pub fn is_token_expired(&self) -> bool {
        matches!(self, Self::Unauthorized { code: Some(code) } if code == TOKEN_EXPIRED_CODE)
    }
}

/// Client for the Threadline REST backend.
///
/// Cheap to clone; clones share the connection pool and caches.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    catalog: Cache<String, CacheValue>,
    refreshes: Cache<String, TokenSet>,
}

impl ApiClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("threadline-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let catalog = Cache::builder()
            .max_capacity(1000)
            .time_to_live(CATALOG_TTL)
            .build();

        let refreshes = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(REFRESH_REUSE_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.clone(),
                catalog,
                refreshes,
            }),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.base_url.join(path.trim_start_matches('/'))?)
    }

    /// Send a request and decode the (possibly enveloped) JSON response.
    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
        bearer: Option<&SecretString>,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        let mut request = self.inner.client.request(method, url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        if let Some(token) = bearer {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        let text = response.text().await?;

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized {
                code: error_code(&text),
            });
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(path.to_owned()));
        }
        if !status.is_success() {
            tracing::error!(
                status = %status,
                path,
                body = %truncate(&text, 500),
                "Backend returned non-success status"
            );
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: error_message(&text).unwrap_or_else(|| truncate(&text, 200)),
            });
        }

        decode(&text).inspect_err(|e| {
            tracing::error!(
                error = %e,
                path,
                body = %truncate(&text, 500),
                "Failed to parse backend response"
            );
        })
    }

    /// Unauthenticated GET.
    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        self.execute(Method::GET, path, query, None, None).await
    }

    /// Call a customer endpoint with the shopper's tokens.
    ///
    /// `tokens` is updated in place when a refresh happens; callers persist
    /// it if [`TokenSet::expires_at`] changed.
    #[instrument(skip(self, tokens, body))]
    pub async fn authorized<T: DeserializeOwned>(
        &self,
        tokens: &mut TokenSet,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T, ApiError> {
        if tokens.is_expired() {
            tracing::debug!("Access token past client-side expiry, refreshing first");
            *tokens = self.refresh(tokens).await?;
        }

        match self
            .execute(method.clone(), path, &[], body, Some(&tokens.access_token))
            .await
        {
            Err(e) if e.is_token_expired() => {
                tracing::info!("Backend reported expired token, refreshing");
                *tokens = self.refresh(tokens).await?;
                self.execute(method, path, &[], body, Some(&tokens.access_token))
                    .await
            }
            other => other,
        }
    }

    /// Exchange the refresh token for a new token set.
    ///
    /// Concurrent calls with the same refresh token share one request. Any
    /// failure is reported as `ApiError::SessionExpired`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::SessionExpired` if the backend rejects the refresh.
    pub async fn refresh(&self, tokens: &TokenSet) -> Result<TokenSet, ApiError> {
        let key = tokens.refresh_token.expose_secret().to_owned();
        let refresh_token = tokens.refresh_token.clone();

        self.inner
            .refreshes
            .try_get_with(key, self.request_refresh(refresh_token))
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Token refresh failed");
                ApiError::SessionExpired(e.to_string())
            })
    }

    #[instrument(skip(self, refresh_token))]
    async fn request_refresh(&self, refresh_token: SecretString) -> Result<TokenSet, ApiError> {
        let body = serde_json::json!({ "refreshToken": refresh_token.expose_secret() });
        let response: token::RefreshResponse = self
            .execute(Method::POST, "auth/refresh", &[], Some(&body), None)
            .await?;
        Ok(response.into_token_set(refresh_token, chrono::Utc::now()))
    }
}

/// Decode a response body, accepting both bare and `{"data": ...}` shapes.
/// An empty body decodes as JSON `null` (e.g. `204 No Content` into `()`).
fn decode<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
    if text.trim().is_empty() {
        return Ok(serde_json::from_value(Value::Null)?);
    }
    let value: Value = serde_json::from_str(text)?;
    Ok(serde_json::from_value(unwrap_envelope(value))?)
}

fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut map) => match map.remove("data") {
            Some(data) => data,
            None => Value::Object(map),
        },
        other => other,
    }
}

/// Error code from a backend error body: `code`, `errorCode`, or `error.code`.
fn error_code(text: &str) -> Option<String> {
    let value: Value = serde_json::from_str(text).ok()?;
    ["/code", "/errorCode", "/error/code"]
        .iter()
        .find_map(|pointer| value.pointer(pointer).and_then(Value::as_str))
        .map(str::to_owned)
}

/// Human-readable message from a backend error body.
fn error_message(text: &str) -> Option<String> {
    let value: Value = serde_json::from_str(text).ok()?;
    ["/message", "/error/message", "/error"]
        .iter()
        .find_map(|pointer| value.pointer(pointer).and_then(Value::as_str))
        .map(str::to_owned)
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
