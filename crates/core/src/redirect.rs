//! Post-login redirect protocol.
//!
//! When a shopper attempts a protected action without being signed in, the
//! storefront records where they were headed and why, sends them to the login
//! page, and after a successful login routes them according to a fixed table:
//!
//! | context          | destination              |
//! |------------------|--------------------------|
//! | `checkout`       | `/checkout`              |
//! | `cart`           | the recorded URL         |
//! | `account`        | `/profile`               |
//! | `protected-page` | the recorded URL         |
//! | `generic`/none   | `/`                      |
//!
//! The context is stored as versioned JSON alongside the plain URL. If the
//! JSON cannot be read, the plain URL is used, and failing that, the home
//! page. Reading a pending redirect can therefore never fail a login.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Home page path, the fallback destination.
pub const HOME_PATH: &str = "/";
/// Checkout page path.
pub const CHECKOUT_PATH: &str = "/checkout";
/// Profile page path, where account redirects land.
pub const PROFILE_PATH: &str = "/profile";
/// Cart page path.
pub const CART_PATH: &str = "/cart";

/// Version written into every stored context.
pub const REDIRECT_FORMAT_VERSION: u32 = 1;

/// Why the shopper was sent to the login page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RedirectKind {
    #[default]
    Generic,
    Checkout,
    Cart,
    Account,
    ProtectedPage,
}

impl RedirectKind {
    /// Classify a denied request path.
    #[must_use]
    pub fn for_path(path: &str) -> Self {
        let starts = |prefix: &str| {
            path == prefix
                || path
                    .strip_prefix(prefix)
                    .is_some_and(|rest| rest.starts_with('/') || rest.starts_with('?'))
        };

        if starts(CHECKOUT_PATH) {
            Self::Checkout
        } else if starts(CART_PATH) {
            Self::Cart
        } else if starts(PROFILE_PATH) || starts("/account") {
            Self::Account
        } else {
            Self::ProtectedPage
        }
    }

    /// A page that can be fetched with `GET` for this context, used when the
    /// denied request was a form post with nowhere else to return to.
    #[must_use]
    pub const fn landing_page(&self) -> &'static str {
        match self {
            Self::Checkout => CHECKOUT_PATH,
            Self::Cart => CART_PATH,
            Self::Account => PROFILE_PATH,
            Self::ProtectedPage | Self::Generic => HOME_PATH,
        }
    }

    /// The label stored in the session and shown on the login page.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::Checkout => "checkout",
            Self::Cart => "cart",
            Self::Account => "account",
            Self::ProtectedPage => "protected-page",
        }
    }

    /// Short explanation for the login page.
    #[must_use]
    pub const fn login_prompt(&self) -> Option<&'static str> {
        match self {
            Self::Checkout => Some("Sign in to complete your checkout."),
            Self::Cart => Some("Sign in to add items to your cart."),
            Self::Account => Some("Sign in to view your account."),
            Self::ProtectedPage => Some("Sign in to continue."),
            Self::Generic => None,
        }
    }
}

/// A pending post-login redirect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectContext {
    pub url: String,
    pub context: RedirectKind,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

/// Errors reading a stored redirect context.
#[derive(Debug, Error)]
pub enum RedirectDecodeError {
    #[error("malformed redirect context: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("unsupported redirect context version {0}")]
    UnsupportedVersion(u32),
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    version: u32,
    #[serde(flatten)]
    context: RedirectContext,
}

impl RedirectContext {
    /// Record a redirect to `url` made at `now`.
    #[must_use]
    pub fn new(url: impl Into<String>, context: RedirectKind, now: DateTime<Utc>) -> Self {
        Self {
            url: url.into(),
            context,
            timestamp: now.timestamp_millis(),
        }
    }

    /// Serialize with the current format version.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails, which cannot happen for
    /// this type in practice.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&Envelope {
            version: REDIRECT_FORMAT_VERSION,
            context: self.clone(),
        })
    }

    /// Parse a stored context.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or written by an unknown
    /// format version.
    pub fn decode(raw: &str) -> Result<Self, RedirectDecodeError> {
        let envelope: Envelope = serde_json::from_str(raw)?;
        if envelope.version != REDIRECT_FORMAT_VERSION {
            return Err(RedirectDecodeError::UnsupportedVersion(envelope.version));
        }
        Ok(envelope.context)
    }

    /// Where this context sends the shopper after login.
    #[must_use]
    pub fn destination(&self) -> String {
        match self.context {
            RedirectKind::Checkout => CHECKOUT_PATH.to_owned(),
            RedirectKind::Account => PROFILE_PATH.to_owned(),
            RedirectKind::Cart | RedirectKind::ProtectedPage => {
                safe_local_path(&self.url).unwrap_or(HOME_PATH).to_owned()
            }
            RedirectKind::Generic => HOME_PATH.to_owned(),
        }
    }
}

/// Post-login destination, with the reason a stored context was ignored.
#[derive(Debug)]
pub struct Destination {
    pub path: String,
    pub decode_error: Option<RedirectDecodeError>,
}

/// Decide the post-login destination from whatever is stored.
///
/// `raw_context` is the stored JSON and `stored_url` the plain URL kept next
/// to it. An unreadable context falls back to the plain URL, then home.
#[must_use]
pub fn resolve_destination(raw_context: Option<&str>, stored_url: Option<&str>) -> Destination {
    let fallback = || {
        stored_url
            .and_then(safe_local_path)
            .unwrap_or(HOME_PATH)
            .to_owned()
    };

    match raw_context.map(RedirectContext::decode) {
        Some(Ok(context)) => Destination {
            path: context.destination(),
            decode_error: None,
        },
        Some(Err(e)) => Destination {
            path: fallback(),
            decode_error: Some(e),
        },
        None => Destination {
            path: fallback(),
            decode_error: None,
        },
    }
}

/// Accept only same-site absolute paths, rejecting scheme-relative (`//`)
/// and backslash tricks that browsers treat as another origin.
#[must_use]
pub fn safe_local_path(url: &str) -> Option<&str> {
    let url = url.trim();
    let mut chars = url.chars();
    match (chars.next(), chars.next()) {
        (Some('/'), Some('/' | '\\')) => None,
        (Some('/'), _) if !url.contains(['\r', '\n']) => Some(url),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_destination_table() {
        let cases = [
            (RedirectKind::Checkout, "/cart", "/checkout"),
            (RedirectKind::Cart, "/products/p-12", "/products/p-12"),
            (RedirectKind::Account, "/profile/addresses", "/profile"),
            (RedirectKind::ProtectedPage, "/orders/991", "/orders/991"),
            (RedirectKind::Generic, "/products", "/"),
        ];
        for (kind, url, expected) in cases {
            let context = RedirectContext::new(url, kind, at());
            assert_eq!(context.destination(), expected, "{kind:?}");
        }
    }

    #[test]
    fn test_encode_decode_carries_version() {
        let context = RedirectContext::new("/checkout", RedirectKind::Checkout, at());
        let raw = context.encode().unwrap();

        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["version"], 1);
        assert_eq!(json["context"], "checkout");
        assert_eq!(json["timestamp"], at().timestamp_millis());

        assert_eq!(RedirectContext::decode(&raw).unwrap(), context);
    }

    #[test]
    fn test_unknown_version_is_rejected() {
        let raw = r#"{"version":7,"url":"/cart","context":"cart","timestamp":1}"#;
        assert!(matches!(
            RedirectContext::decode(raw),
            Err(RedirectDecodeError::UnsupportedVersion(7))
        ));
    }

    #[test]
    fn test_malformed_context_falls_back_to_stored_url() {
        let resolved = resolve_destination(Some("{not json"), Some("/products/p-3"));
        assert_eq!(resolved.path, "/products/p-3");
        assert!(matches!(
            resolved.decode_error,
            Some(RedirectDecodeError::Malformed(_))
        ));
        assert_eq!(resolve_destination(Some("{not json"), None).path, "/");
    }

    #[test]
    fn test_missing_context() {
        assert_eq!(resolve_destination(None, None).path, "/");
        assert_eq!(resolve_destination(None, Some("/cart")).path, "/cart");
    }

    #[test]
    fn test_well_formed_context_wins_over_stored_url() {
        let raw = RedirectContext::new("/cart", RedirectKind::Checkout, at())
            .encode()
            .unwrap();
        let resolved = resolve_destination(Some(&raw), Some("/cart"));
        assert_eq!(resolved.path, "/checkout");
        assert!(resolved.decode_error.is_none());
    }

    #[test]
    fn test_offsite_urls_are_replaced_by_home() {
        for url in ["https://evil.example", "//evil.example", "/\\evil.example", "cart"] {
            let context = RedirectContext::new(url, RedirectKind::ProtectedPage, at());
            assert_eq!(context.destination(), "/", "{url}");
        }
    }

    #[test]
    fn test_kind_for_path() {
        assert_eq!(RedirectKind::for_path("/checkout"), RedirectKind::Checkout);
        assert_eq!(RedirectKind::for_path("/cart/add"), RedirectKind::Cart);
        assert_eq!(RedirectKind::for_path("/profile"), RedirectKind::Account);
        assert_eq!(
            RedirectKind::for_path("/profile/addresses"),
            RedirectKind::Account
        );
        assert_eq!(RedirectKind::for_path("/account"), RedirectKind::Account);
        assert_eq!(
            RedirectKind::for_path("/cartography"),
            RedirectKind::ProtectedPage
        );
        assert_eq!(
            RedirectKind::for_path("/orders/1"),
            RedirectKind::ProtectedPage
        );
    }

    #[test]
    fn test_landing_pages() {
        assert_eq!(RedirectKind::for_path("/cart/add").landing_page(), "/cart");
        assert_eq!(
            RedirectKind::for_path("/checkout/address/new").landing_page(),
            "/checkout"
        );
        assert_eq!(
            RedirectKind::for_path("/profile/addresses/a-1/delete").landing_page(),
            "/profile"
        );
        assert_eq!(RedirectKind::for_path("/orders/1").landing_page(), "/");
    }

    #[test]
    fn test_kind_serializes_kebab_case() {
        let json = serde_json::to_string(&RedirectKind::ProtectedPage).unwrap();
        assert_eq!(json, "\"protected-page\"");
        assert_eq!(RedirectKind::ProtectedPage.as_str(), "protected-page");
    }
}
