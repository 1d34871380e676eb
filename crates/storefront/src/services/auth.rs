//! Demo credential check.
//!
//! The storefront has a single configured account. A successful login issues
//! the configured backend tokens as the shopper's token set.

use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use thiserror::Error;
use threadline_core::{Email, EmailError};

use crate::api::TokenSet;
use crate::config::{ApiConfig, DemoLogin};

/// Errors that can occur during login.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Wrong email or password.
    #[error("invalid credentials")]
    InvalidCredentials,
}

/// Check submitted credentials against the configured account.
///
/// Email comparison is case-insensitive (emails are normalized on parse).
///
/// # Errors
///
/// Returns `AuthError::InvalidEmail` for malformed emails and
/// `AuthError::InvalidCredentials` for any mismatch.
pub fn verify_credentials(
    login: &DemoLogin,
    email: &str,
    password: &str,
) -> Result<Email, AuthError> {
    let email = Email::parse(email)?;
    if email != login.email || password != login.password.expose_secret() {
        return Err(AuthError::InvalidCredentials);
    }
    Ok(email)
}

/// Tokens handed to a shopper who just signed in.
#[must_use]
pub fn issue_tokens(api: &ApiConfig, now: DateTime<Utc>) -> TokenSet {
    TokenSet::issue(api.access_token.clone(), api.refresh_token.clone(), now)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use secrecy::SecretString;
    use url::Url;

    use super::*;

    fn demo() -> DemoLogin {
        DemoLogin {
            email: Email::parse("shopper@threadline.test").unwrap(),
            password: SecretString::from("kente-4-life"),
        }
    }

    #[test]
    fn test_valid_credentials() {
        let email = verify_credentials(&demo(), "Shopper@Threadline.test", "kente-4-life").unwrap();
        assert_eq!(email.as_str(), "shopper@threadline.test");
    }

    #[test]
    fn test_wrong_password() {
        assert!(matches!(
            verify_credentials(&demo(), "shopper@threadline.test", "kente"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_malformed_email() {
        assert!(matches!(
            verify_credentials(&demo(), "not-an-email", "kente-4-life"),
            Err(AuthError::InvalidEmail(_))
        ));
    }

    #[test]
    fn test_issued_tokens_expire_in_a_day() {
        let api = ApiConfig {
            base_url: Url::parse("http://localhost:4000/api/").unwrap(),
            timeout: Duration::from_secs(30),
            access_token: SecretString::from("a1"),
            refresh_token: SecretString::from("r1"),
        };
        let now = Utc::now();
        let tokens = issue_tokens(&api, now);
        assert_eq!(tokens.expires_at, now + chrono::Duration::hours(24));
        assert_eq!(tokens.access_token.expose_secret(), "a1");
    }
}
