//! Authentication route handlers.
//!
//! Login checks the configured demo account. On success the shopper is sent
//! wherever the pending redirect says, or home.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAuth, set_current_customer};
use crate::models::CurrentCustomer;
use crate::routes::PageContext;
use crate::services::auth::{issue_tokens, verify_credentials};
use crate::state::AppState;
use crate::stores::tokens::save_tokens;
use crate::stores::{RedirectStore, clear_shopper};

/// Login form data.
#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Query parameters for error display.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub page: PageContext,
    pub error: Option<String>,
    pub prompt: Option<&'static str>,
}

/// Display the login page.
///
/// A pending redirect adds a line explaining why login is needed.
#[instrument(skip(session, customer))]
pub async fn login_page(
    session: Session,
    OptionalAuth(customer): OptionalAuth,
    Query(query): Query<MessageQuery>,
) -> Response {
    if customer.is_some() {
        return Redirect::to("/").into_response();
    }

    let prompt = match RedirectStore::new(&session).get_redirect_context().await {
        Ok(context) => context.and_then(|c| c.context.login_prompt()),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read pending redirect");
            None
        }
    };

    let error = query.error.as_deref().map(|code| {
        match code {
            "credentials" => "Invalid email or password.",
            "session_expired" => "Your session has expired. Please sign in again.",
            _ => "Sign in failed. Please try again.",
        }
        .to_string()
    });

    LoginTemplate {
        page: PageContext::load(&session, None).await,
        error,
        prompt,
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let email = match verify_credentials(&state.config().demo_login, &form.email, &form.password) {
        Ok(email) => email,
        Err(e) => {
            tracing::info!(error = %e, email = %form.email, "Login rejected");
            return Ok(Redirect::to("/login?error=credentials").into_response());
        }
    };

    // New session id on privilege change
    session.cycle_id().await?;

    let customer = CurrentCustomer::from_email(email);
    set_current_customer(&session, &customer).await?;
    save_tokens(&session, &issue_tokens(&state.config().api, Utc::now())).await?;
    set_sentry_user(customer.email.as_str());

    let destination = RedirectStore::new(&session).take_destination().await;
    tracing::info!(%destination, "Shopper signed in");

    Ok(Redirect::to(&destination).into_response())
}

/// Handle logout.
///
/// The cart is kept; identity, tokens, checkout selection and any pending
/// redirect are dropped.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Redirect> {
    clear_shopper(&session).await?;
    RedirectStore::new(&session).clear_redirect_url().await?;
    clear_sentry_user();

    Ok(Redirect::to("/"))
}
