//! Authentication extractors.
//!
//! A page request from a visitor who is not signed in records a pending
//! redirect before being sent to `/login`, so the login handler can return
//! them to what they were doing.

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::{Method, StatusCode, Uri, header::REFERER, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use threadline_core::redirect::{RedirectKind, safe_local_path};
use tower_sessions::Session;

use crate::models::{CurrentCustomer, session_keys};
use crate::stores::RedirectStore;

/// Login page path.
pub const LOGIN_PATH: &str = "/login";

/// Extractor that requires a signed-in shopper.
///
/// If the shopper is not logged in, page requests are redirected to the login
/// page and `/api/` requests get `401`.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(customer): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", customer.name)
/// }
/// ```
pub struct RequireAuth(pub CurrentCustomer);

/// Error returned when authentication is required but the shopper is not logged in.
pub enum AuthRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin,
    /// Unauthorized response (for API requests).
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::Unauthorized)?;

        if let Some(customer) = session
            .get::<CurrentCustomer>(session_keys::CURRENT_CUSTOMER)
            .await
            .ok()
            .flatten()
        {
            return Ok(Self(customer));
        }

        let path = request_uri(parts).path();
        if path.starts_with("/api/") {
            return Err(AuthRejection::Unauthorized);
        }

        let kind = RedirectKind::for_path(path);
        let return_to = return_url(parts, kind);
        tracing::debug!(%return_to, context = kind.as_str(), "Login required");
        if let Err(e) = RedirectStore::new(session)
            .set_redirect_url(&return_to, kind)
            .await
        {
            tracing::warn!(error = %e, "Failed to record pending redirect");
        }

        Err(AuthRejection::RedirectToLogin)
    }
}

/// The URL to come back to after login.
///
/// A `GET` returns to itself. A form post cannot be replayed, so it returns
/// to the same-site page the form was submitted from, or to the context's
/// landing page when there is no usable referer.
fn return_url(parts: &Parts, kind: RedirectKind) -> String {
    if parts.method == Method::GET {
        let uri = request_uri(parts);
        return uri
            .path_and_query()
            .map_or_else(|| uri.path().to_owned(), |pq| pq.as_str().to_owned());
    }

    parts
        .headers
        .get(REFERER)
        .and_then(|v| v.to_str().ok())
        .and_then(referer_path)
        .unwrap_or_else(|| kind.landing_page().to_owned())
}

/// The URI as the client sent it, before any router nesting stripped a prefix.
fn request_uri(parts: &Parts) -> &Uri {
    parts
        .extensions
        .get::<OriginalUri>()
        .map_or(&parts.uri, |OriginalUri(uri)| uri)
}

/// Path and query of a referer, accepting absolute URLs and bare paths.
fn referer_path(referer: &str) -> Option<String> {
    if let Some(path) = safe_local_path(referer) {
        return Some(path.to_owned());
    }
    let url = url::Url::parse(referer).ok()?;
    let path = match url.query() {
        Some(query) => format!("{}?{query}", url.path()),
        None => url.path().to_owned(),
    };
    Some(path)
}

/// Extractor that optionally gets the current shopper.
///
/// Unlike `RequireAuth`, this does not reject the request if the shopper is not logged in.
pub struct OptionalAuth(pub Option<CurrentCustomer>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let customer = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentCustomer>(session_keys::CURRENT_CUSTOMER)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(customer))
    }
}

/// Helper to set the current shopper in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_customer(
    session: &Session,
    customer: &CurrentCustomer,
) -> Result<(), tower_sessions::session::Error> {
    session
        .insert(session_keys::CURRENT_CUSTOMER, customer)
        .await
}

/// Helper to clear the current shopper from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_customer(
    session: &Session,
) -> Result<(), tower_sessions::session::Error> {
    session
        .remove_value(session_keys::CURRENT_CUSTOMER)
        .await?;
    Ok(())
}
