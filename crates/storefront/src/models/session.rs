//! Session-related types.
//!
//! Types stored in the session for the signed-in shopper.

use serde::{Deserialize, Serialize};

use threadline_core::Email;

/// Session-stored shopper identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentCustomer {
    pub email: Email,
    /// Display name, derived from the email's local part at login.
    pub name: String,
}

impl CurrentCustomer {
    #[must_use]
    pub fn from_email(email: Email) -> Self {
        let name = email.local_part().to_owned();
        Self { email, name }
    }
}

/// Session keys. Each key has exactly one writer module.
pub mod keys {
    /// The signed-in shopper (`middleware::auth`).
    pub const CURRENT_CUSTOMER: &str = "customer";

    /// Bearer access token (`stores::tokens`).
    pub const AUTH_TOKEN: &str = "authToken";

    /// Refresh token (`stores::tokens`).
    pub const REFRESH_TOKEN: &str = "refreshToken";

    /// Client-computed access token expiry, epoch milliseconds (`stores::tokens`).
    pub const TOKEN_EXPIRES_AT: &str = "tokenExpiresAt";

    /// Plain URL of the pending post-login redirect (`stores::redirect`).
    pub const REDIRECT_URL: &str = "redirectUrl";

    /// Versioned JSON of the pending post-login redirect (`stores::redirect`).
    pub const REDIRECT_CONTEXT: &str = "redirectContext";

    /// The shopper's cart (`stores::cart`).
    pub const CART: &str = "cart";

    /// Checkout address selection snapshot (`stores::selection`).
    pub const ADDRESS_SELECTION: &str = "addressSelection";
}
