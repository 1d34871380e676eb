//! Shopper bearer tokens, stored as three plain session keys.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use tower_sessions::Session;

use crate::api::TokenSet;
use crate::models::session_keys;

type SessionResult<T> = Result<T, tower_sessions::session::Error>;

/// Load the shopper's tokens. A missing expiry reads as already expired, so
/// the next call refreshes first.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn load_tokens(session: &Session) -> SessionResult<Option<TokenSet>> {
    let access = session.get::<String>(session_keys::AUTH_TOKEN).await?;
    let refresh = session.get::<String>(session_keys::REFRESH_TOKEN).await?;
    let expires_at = session
        .get::<i64>(session_keys::TOKEN_EXPIRES_AT)
        .await?
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .unwrap_or(DateTime::<Utc>::MIN_UTC);

    Ok(match (access, refresh) {
        (Some(access), Some(refresh)) => Some(TokenSet {
            access_token: SecretString::from(access),
            refresh_token: SecretString::from(refresh),
            expires_at,
        }),
        _ => None,
    })
}

/// Persist the shopper's tokens.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn save_tokens(session: &Session, tokens: &TokenSet) -> SessionResult<()> {
    session
        .insert(session_keys::AUTH_TOKEN, tokens.access_token.expose_secret())
        .await?;
    session
        .insert(
            session_keys::REFRESH_TOKEN,
            tokens.refresh_token.expose_secret(),
        )
        .await?;
    session
        .insert(
            session_keys::TOKEN_EXPIRES_AT,
            tokens.expires_at.timestamp_millis(),
        )
        .await
}

/// Remove all token keys.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn clear_tokens(session: &Session) -> SessionResult<()> {
    for key in [
        session_keys::AUTH_TOKEN,
        session_keys::REFRESH_TOKEN,
        session_keys::TOKEN_EXPIRES_AT,
    ] {
        session.remove_value(key).await?;
    }
    Ok(())
}
