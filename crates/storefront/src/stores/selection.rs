//! Checkout address selection snapshot.

use threadline_core::selection::SelectionSnapshot;
use tower_sessions::Session;

use crate::models::session_keys;

type SessionResult<T> = Result<T, tower_sessions::session::Error>;

/// Load the snapshot; missing or unreadable reads as no selection.
pub async fn load_selection(session: &Session) -> SelectionSnapshot {
    session
        .get::<SelectionSnapshot>(session_keys::ADDRESS_SELECTION)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Discarding unreadable address selection");
            None
        })
        .unwrap_or_default()
}

/// Persist the snapshot.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn save_selection(session: &Session, snapshot: &SelectionSnapshot) -> SessionResult<()> {
    session
        .insert(session_keys::ADDRESS_SELECTION, snapshot)
        .await
}

/// Drop the snapshot, including any session-only address.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn clear_selection(session: &Session) -> SessionResult<()> {
    session
        .remove_value(session_keys::ADDRESS_SELECTION)
        .await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use threadline_core::AddressId;
    use threadline_core::selection::SelectionState;

    use super::*;
    use crate::stores::test_session;

    #[tokio::test]
    async fn test_selection_snapshot_persists() {
        let session = test_session();
        let snapshot = SelectionSnapshot {
            state: SelectionState::SavedAddressChosen,
            selected: Some(AddressId::new("a-1")),
            ..SelectionSnapshot::default()
        };

        save_selection(&session, &snapshot).await.unwrap();
        assert_eq!(load_selection(&session).await, snapshot);

        clear_selection(&session).await.unwrap();
        assert_eq!(load_selection(&session).await, SelectionSnapshot::default());
    }
}
