//! Typed accessors over the visitor session.
//!
//! Every session key has one writer, listed in [`crate::models::session_keys`].
//! Handlers go through these accessors instead of touching keys directly.

pub mod cart;
pub mod redirect;
pub mod selection;
pub mod tokens;

pub use redirect::RedirectStore;

use tower_sessions::Session;

use crate::middleware::clear_current_customer;

/// Forget the signed-in shopper: identity, tokens, and checkout selection.
///
/// The cart and any pending redirect are kept.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn clear_shopper(session: &Session) -> Result<(), tower_sessions::session::Error> {
    clear_current_customer(session).await?;
    tokens::clear_tokens(session).await?;
    selection::clear_selection(session).await
}

#[cfg(test)]
pub(crate) fn test_session() -> Session {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    Session::new(None, Arc::new(MemoryStore::default()), None)
}
