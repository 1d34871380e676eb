//! Shopper bearer tokens.

use chrono::{DateTime, Duration, Utc};
use secrecy::SecretString;
use serde::Deserialize;

/// Error code the backend puts on a `401` when the access token has expired.
pub const TOKEN_EXPIRED_CODE: &str = "TOKEN_EXPIRED";

/// Lifetime assigned to a freshly issued access token.
pub const TOKEN_LIFETIME_HOURS: i64 = 24;

/// Tokens are treated as expired this many seconds early.
const EXPIRY_MARGIN_SECONDS: i64 = 60;

/// A shopper's access and refresh tokens.
///
/// The expiry is computed client-side at issue time.
#[derive(Debug, Clone)]
pub struct TokenSet {
    pub access_token: SecretString,
    pub refresh_token: SecretString,
    pub expires_at: DateTime<Utc>,
}

impl TokenSet {
    /// Tokens issued at `now`, valid for [`TOKEN_LIFETIME_HOURS`].
    #[must_use]
    pub fn issue(access_token: SecretString, refresh_token: SecretString, now: DateTime<Utc>) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_at: now + Duration::hours(TOKEN_LIFETIME_HOURS),
        }
    }

    /// Check if the access token has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Check expiry against a given instant, with a 60 second margin.
    ///
    /// The margin is added to `now` so an expiry at the minimum representable
    /// instant cannot overflow.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.checked_add_signed(Duration::seconds(EXPIRY_MARGIN_SECONDS))
            .is_none_or(|deadline| deadline >= self.expires_at)
    }
}

/// Body of a successful `POST /auth/refresh`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RefreshResponse {
    #[serde(alias = "token", alias = "authToken")]
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

impl RefreshResponse {
    /// Build the new token set. The backend may omit the refresh token, in
    /// which case the previous one stays in use.
    pub(super) fn into_token_set(self, previous_refresh: SecretString, now: DateTime<Utc>) -> TokenSet {
        let refresh_token = self
            .refresh_token
            .map_or(previous_refresh, SecretString::from);
        TokenSet::issue(SecretString::from(self.access_token), refresh_token, now)
    }
}
