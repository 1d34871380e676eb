//! Address selection JSON endpoints for the checkout page.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use threadline_core::AddressId;
use threadline_core::delivery::ValidationResult;
use threadline_core::location::{Address, AddressDraft};
use threadline_core::selection::{SelectionReport, SelectionState, SubmitOptions};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::services::{SelectionFlow, SubmitOutcome};
use crate::state::AppState;

/// An address with its cached validation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressOption {
    pub address: Address,
    pub validation_result: Option<ValidationResult>,
}

/// The whole selection as the checkout page sees it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionView {
    pub state: SelectionState,
    pub selected: Option<SelectionReport>,
    pub addresses: Vec<AddressOption>,
}

impl SelectionView {
    fn new(flow: &SelectionFlow, selected: Option<SelectionReport>) -> Self {
        let selector = flow.selector();
        let addresses = selector
            .addresses()
            .iter()
            .chain(selector.temp_address())
            .map(|address| AddressOption {
                address: address.clone(),
                validation_result: selector.validation_for(&address.id).cloned(),
            })
            .collect();
        Self {
            state: selector.state(),
            selected,
            addresses,
        }
    }
}

/// Select request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectRequest {
    pub address_id: AddressId,
}

/// New address request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAddressRequest {
    pub address: AddressDraft,
    /// Save to the shopper's account.
    #[serde(default)]
    pub persist: bool,
    /// Use the address even though no zone covers it.
    #[serde(default)]
    pub confirmed: bool,
}

/// Current selection, choosing the default address on first call.
#[instrument(skip(state, session, _customer))]
pub async fn current(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(_customer): RequireAuth,
) -> Result<Json<SelectionView>> {
    let mut flow = SelectionFlow::load(&state, session).await?;
    let selected = flow.current().await?;
    Ok(Json(SelectionView::new(&flow, selected)))
}

/// Select an address by id.
#[instrument(skip(state, session, _customer))]
pub async fn select(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(_customer): RequireAuth,
    Json(request): Json<SelectRequest>,
) -> Result<Json<SelectionReport>> {
    let mut flow = SelectionFlow::load(&state, session).await?;
    Ok(Json(flow.select(&request.address_id).await?))
}

/// Submit a new address.
///
/// Out-of-zone addresses come back as `needs-confirmation` until sent again
/// with `confirmed: true`.
#[instrument(skip(state, session, _customer, request))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(_customer): RequireAuth,
    Json(request): Json<NewAddressRequest>,
) -> Result<Json<SubmitOutcome>> {
    let options = SubmitOptions {
        persist: request.persist,
        confirmed: request.confirmed,
    };
    let mut flow = SelectionFlow::load(&state, session).await?;
    Ok(Json(flow.submit(request.address, options).await?))
}

/// Open the new-address form.
#[instrument(skip(state, session, _customer))]
pub async fn begin(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(_customer): RequireAuth,
) -> Result<Json<SelectionView>> {
    let mut flow = SelectionFlow::load(&state, session).await?;
    flow.begin_create().await?;
    let selected = flow.selector().current();
    Ok(Json(SelectionView::new(&flow, selected)))
}

/// Leave the new-address form.
#[instrument(skip(state, session, _customer))]
pub async fn cancel(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(_customer): RequireAuth,
) -> Result<Json<SelectionView>> {
    let mut flow = SelectionFlow::load(&state, session).await?;
    flow.cancel_create().await?;
    let selected = flow.selector().current();
    Ok(Json(SelectionView::new(&flow, selected)))
}
