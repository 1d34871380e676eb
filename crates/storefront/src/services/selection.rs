//! Checkout address selection for one request.
//!
//! [`SelectionFlow`] rebuilds the [`AddressSelector`] from the shopper's
//! saved addresses, the zone catalog, and the session snapshot, applies one
//! transition, and writes the snapshot back. Saving a new address goes
//! through the customer API before the selector records it.

use serde::Serialize;
use threadline_core::AddressId;
use threadline_core::delivery::ValidationResult;
use threadline_core::location::AddressDraft;
use threadline_core::selection::{
    AddressSelector, DraftOutcome, SelectionReport, SubmitOptions,
};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::AppError;
use crate::services::CustomerSession;
use crate::state::AppState;
use crate::stores::selection::{load_selection, save_selection};

/// Result of submitting a new address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum SubmitOutcome {
    /// No zone covers the address; submit again with `confirmed` to use it.
    #[serde(rename_all = "camelCase")]
    NeedsConfirmation { validation_result: ValidationResult },
    /// The address is now the selection.
    Selected(SelectionReport),
}

pub struct SelectionFlow {
    customer: CustomerSession,
    selector: AddressSelector,
    session: Session,
}

impl SelectionFlow {
    /// Build the selector for the signed-in shopper.
    ///
    /// # Errors
    ///
    /// Returns an error if the saved addresses cannot be fetched.
    #[instrument(skip_all)]
    pub async fn load(state: &AppState, session: Session) -> Result<Self, AppError> {
        let mut customer = CustomerSession::load(state.api().clone(), session.clone()).await?;
        let addresses = customer.addresses().await?;
        let catalog = state.zones().catalog().await;
        let cities = state.zones().cities().await;
        let snapshot = load_selection(&session).await;

        let selector = AddressSelector::new(addresses, catalog, cities).restore(snapshot);
        Ok(Self {
            customer,
            selector,
            session,
        })
    }

    #[must_use]
    pub const fn selector(&self) -> &AddressSelector {
        &self.selector
    }

    /// The current selection, choosing the default address if nothing is
    /// selected yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn current(&mut self) -> Result<Option<SelectionReport>, AppError> {
        let report = self.selector.auto_select();
        self.save().await?;
        Ok(report)
    }

    /// # Errors
    ///
    /// Returns `SelectionError::UnknownAddress` for ids the shopper does not own.
    #[instrument(skip(self))]
    pub async fn select(&mut self, id: &AddressId) -> Result<SelectionReport, AppError> {
        let report = self.selector.select(id)?;
        self.save().await?;
        Ok(report)
    }

    /// Open the new-address form.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn begin_create(&mut self) -> Result<(), AppError> {
        self.selector.begin_create();
        self.save().await
    }

    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn cancel_create(&mut self) -> Result<(), AppError> {
        self.selector.cancel_create();
        self.save().await
    }

    /// Submit a new address, saving it to the account when `persist` is set.
    ///
    /// # Errors
    ///
    /// Returns `SelectionError::MissingRegionOrCity` for incomplete drafts and
    /// backend errors from saving the address.
    #[instrument(skip(self, draft))]
    pub async fn submit(
        &mut self,
        draft: AddressDraft,
        options: SubmitOptions,
    ) -> Result<SubmitOutcome, AppError> {
        let outcome = match self.selector.submit_draft(draft, options)? {
            DraftOutcome::NeedsConfirmation(validation_result) => {
                tracing::info!(message = %validation_result.message, "Address needs confirmation");
                SubmitOutcome::NeedsConfirmation { validation_result }
            }
            DraftOutcome::PersistRequested { draft, .. } => {
                let created = self.customer.create_address(&draft).await?;
                tracing::info!(address_id = %created.id, "Saved new address");
                SubmitOutcome::Selected(self.selector.complete_saved_create(created))
            }
            DraftOutcome::Selected(report) => SubmitOutcome::Selected(report),
        };
        self.save().await?;
        Ok(outcome)
    }

    async fn save(&self) -> Result<(), AppError> {
        save_selection(&self.session, &self.selector.snapshot()).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use httpmock::prelude::*;
    use secrecy::SecretString;
    use serde_json::json;
    use threadline_core::delivery::MSG_OUT_OF_ZONE;
    use threadline_core::selection::{SelectionError, SelectionState};
    use threadline_core::{CityId, RegionId, ZoneId};

    use super::*;
    use crate::api::TokenSet;
    use crate::state::tests::state_for;
    use crate::stores::test_session;
    use crate::stores::tokens::save_tokens;

    async fn signed_in_session() -> Session {
        let session = test_session();
        let tokens = TokenSet::issue(SecretString::from("a1"), SecretString::from("r1"), Utc::now());
        save_tokens(&session, &tokens).await.unwrap();
        session
    }

    async fn mock_directory(server: &MockServer) {
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/delivery-zones");
                then.status(200).json_body(json!({"data": [{
                    "id": "z1",
                    "name": "Accra Central",
                    "deliveryFee": 15,
                    "isActive": true,
                    "structuredAreas": [{"regionId": 1, "cityId": 5}]
                }]}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/ghana/cities");
                then.status(200)
                    .json_body(json!([{"id": 5, "regionId": 1, "name": "Accra"}]));
            })
            .await;
    }

    fn draft(region: i32, city: i32, area: &str) -> AddressDraft {
        AddressDraft {
            region_id: Some(RegionId::new(region)),
            city_id: Some(CityId::new(city)),
            area_name: area.to_string(),
            ..AddressDraft::default()
        }
    }

    #[tokio::test]
    async fn test_saved_draft_replaces_temp_address() {
        let server = MockServer::start_async().await;
        mock_directory(&server).await;
        let mut listing = server
            .mock_async(|when, then| {
                when.method(GET).path("/api/customer-addresses");
                then.status(200).json_body(json!({"data": []}));
            })
            .await;
        let create = server
            .mock_async(|when, then| {
                when.method(POST).path("/api/customer-addresses");
                then.status(200).json_body(json!({"data": {
                    "id": "a-9",
                    "regionId": 1,
                    "cityId": 5,
                    "areaName": "Osu"
                }}));
            })
            .await;
        let state = state_for(&server);
        let session = signed_in_session().await;

        let mut flow = SelectionFlow::load(&state, session.clone()).await.unwrap();
        let held = flow
            .submit(draft(1, 5, "Osu"), SubmitOptions::default())
            .await
            .unwrap();
        let SubmitOutcome::Selected(held) = held else {
            panic!("expected a selection, got {held:?}");
        };
        assert!(held.address_data.is_temp());
        assert_eq!(flow.selector().state(), SelectionState::TempAddressHeld);
        create.assert_hits_async(0).await;

        let saved = flow
            .submit(
                draft(1, 5, "Osu"),
                SubmitOptions {
                    persist: true,
                    confirmed: false,
                },
            )
            .await
            .unwrap();
        let SubmitOutcome::Selected(saved) = saved else {
            panic!("expected a selection, got {saved:?}");
        };
        create.assert_hits_async(1).await;
        assert_eq!(saved.address_data.id, AddressId::new("a-9"));
        assert!(saved.validation_result.is_valid);
        assert_eq!(saved.validation_result.delivery_zone_id, Some(ZoneId::new("z1")));
        assert_eq!(saved.validation_result.message, "Delivery available in Accra");
        assert!(flow.selector().temp_address().is_none());
        assert_eq!(flow.selector().state(), SelectionState::SavedAfterCreate);

        // Next request: the backend now lists the new address
        listing.delete_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/customer-addresses");
                then.status(200).json_body(json!({"data": [{
                    "id": "a-9",
                    "regionId": 1,
                    "cityId": 5,
                    "areaName": "Osu"
                }]}));
            })
            .await;
        let mut flow = SelectionFlow::load(&state, session).await.unwrap();
        let current = flow.current().await.unwrap().unwrap();
        assert_eq!(current.address_data.id, AddressId::new("a-9"));
        assert!(flow.selector().temp_address().is_none());
    }

    #[tokio::test]
    async fn test_out_of_zone_draft_needs_confirmation() {
        let server = MockServer::start_async().await;
        mock_directory(&server).await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/customer-addresses");
                then.status(200).json_body(json!([]));
            })
            .await;
        let create = server
            .mock_async(|when, then| {
                when.method(POST).path("/api/customer-addresses");
                then.status(200).json_body(json!({}));
            })
            .await;
        let state = state_for(&server);
        let session = signed_in_session().await;

        let mut flow = SelectionFlow::load(&state, session.clone()).await.unwrap();
        let outcome = flow
            .submit(draft(2, 9, "Kumasi Central"), SubmitOptions::default())
            .await
            .unwrap();
        let SubmitOutcome::NeedsConfirmation { validation_result } = outcome else {
            panic!("expected a confirmation prompt, got {outcome:?}");
        };
        assert_eq!(validation_result.message, MSG_OUT_OF_ZONE);
        assert!(flow.selector().current().is_none());

        // The prompt survives into the next request
        let mut flow = SelectionFlow::load(&state, session).await.unwrap();
        assert_eq!(flow.selector().state(), SelectionState::CreatingNew);

        let outcome = flow
            .submit(
                draft(2, 9, "Kumasi Central"),
                SubmitOptions {
                    persist: false,
                    confirmed: true,
                },
            )
            .await
            .unwrap();
        let SubmitOutcome::Selected(report) = outcome else {
            panic!("expected a selection, got {outcome:?}");
        };
        assert!(report.address_data.is_temp());
        assert!(!report.validation_result.is_valid);
        create.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn test_open_and_cancel_new_address_form() {
        let server = MockServer::start_async().await;
        mock_directory(&server).await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/customer-addresses");
                then.status(200).json_body(json!({"data": [{
                    "id": "a-1",
                    "regionId": 1,
                    "cityId": 5,
                    "areaName": "Osu",
                    "isDefault": true
                }]}));
            })
            .await;
        let state = state_for(&server);
        let session = signed_in_session().await;

        let mut flow = SelectionFlow::load(&state, session.clone()).await.unwrap();
        flow.current().await.unwrap();
        flow.begin_create().await.unwrap();

        let mut flow = SelectionFlow::load(&state, session.clone()).await.unwrap();
        assert_eq!(flow.selector().state(), SelectionState::CreatingNew);
        flow.cancel_create().await.unwrap();

        let flow = SelectionFlow::load(&state, session).await.unwrap();
        assert_eq!(flow.selector().state(), SelectionState::SavedAddressChosen);
        assert_eq!(
            flow.selector().current().unwrap().address_data.id,
            AddressId::new("a-1")
        );
    }

    #[tokio::test]
    async fn test_select_unknown_address_is_rejected() {
        let server = MockServer::start_async().await;
        mock_directory(&server).await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/customer-addresses");
                then.status(200).json_body(json!([]));
            })
            .await;
        let state = state_for(&server);

        let mut flow = SelectionFlow::load(&state, signed_in_session().await)
            .await
            .unwrap();
        let result = flow.select(&AddressId::new("zz")).await;
        assert!(matches!(
            result,
            Err(AppError::Selection(SelectionError::UnknownAddress(_)))
        ));
    }
}
