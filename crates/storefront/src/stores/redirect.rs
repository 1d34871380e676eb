//! Pending post-login redirect.
//!
//! Written when an unauthenticated visitor hits a protected action, consumed
//! once after a successful login, and cleared on logout. Two keys are kept:
//! the versioned context JSON and the plain URL, so an unreadable context can
//! still fall back to the URL.

use chrono::Utc;
use serde_json::Value;
use threadline_core::redirect::{
    HOME_PATH, RedirectContext, RedirectKind, resolve_destination, safe_local_path,
};
use tower_sessions::Session;
use tracing::instrument;

use crate::models::session_keys;

type SessionResult<T> = Result<T, tower_sessions::session::Error>;

/// Reads and writes the pending redirect in a visitor session.
pub struct RedirectStore<'a> {
    session: &'a Session,
}

impl<'a> RedirectStore<'a> {
    #[must_use]
    pub const fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Record where the visitor was headed, replacing any earlier redirect.
    ///
    /// URLs that are not same-site paths are stored as `/`.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    #[instrument(skip(self))]
    pub async fn set_redirect_url(&self, url: &str, kind: RedirectKind) -> SessionResult<()> {
        let url = safe_local_path(url).unwrap_or(HOME_PATH);
        let context = RedirectContext::new(url, kind, Utc::now());

        match context.encode() {
            Ok(raw) => {
                self.session
                    .insert(session_keys::REDIRECT_CONTEXT, raw)
                    .await?;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not encode redirect context, keeping URL only");
                self.session
                    .remove_value(session_keys::REDIRECT_CONTEXT)
                    .await?;
            }
        }
        self.session.insert(session_keys::REDIRECT_URL, url).await
    }

    /// The stored plain URL, without clearing it.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn get_redirect_url(&self) -> SessionResult<Option<String>> {
        self.session.get::<String>(session_keys::REDIRECT_URL).await
    }

    /// The stored context, without clearing it. An unreadable context reads
    /// as `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn get_redirect_context(&self) -> SessionResult<Option<RedirectContext>> {
        let Some(raw) = self.raw_context().await? else {
            return Ok(None);
        };
        Ok(RedirectContext::decode(&raw)
            .inspect_err(|e| tracing::warn!(error = %e, "Ignoring stored redirect context"))
            .ok())
    }

    /// Remove the pending redirect.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn clear_redirect_url(&self) -> SessionResult<()> {
        self.session
            .remove_value(session_keys::REDIRECT_CONTEXT)
            .await?;
        self.session.remove_value(session_keys::REDIRECT_URL).await?;
        Ok(())
    }

    /// Consume the pending redirect and return where to send the shopper.
    ///
    /// Never fails: store errors and unreadable contexts are logged and the
    /// fallback chain (plain URL, then `/`) applies.
    #[instrument(skip(self))]
    pub async fn take_destination(&self) -> String {
        let raw = self.raw_context().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to read redirect context");
            None
        });
        let stored_url = self.get_redirect_url().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to read redirect URL");
            None
        });

        let destination = resolve_destination(raw.as_deref(), stored_url.as_deref());
        if let Some(e) = &destination.decode_error {
            tracing::warn!(error = %e, fallback = %destination.path, "Redirect context unreadable");
        }

        if let Err(e) = self.clear_redirect_url().await {
            tracing::warn!(error = %e, "Failed to clear consumed redirect");
        }

        tracing::debug!(destination = %destination.path, "Post-login redirect");
        destination.path
    }

    /// The context as text. Older writers may have stored an object rather
    /// than a string; both are accepted.
    async fn raw_context(&self) -> SessionResult<Option<String>> {
        Ok(self
            .session
            .get_value(session_keys::REDIRECT_CONTEXT)
            .await?
            .map(|value| match value {
                Value::String(text) => text,
                other => other.to_string(),
            }))
    }
}
