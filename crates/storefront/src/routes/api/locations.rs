//! Location and delivery JSON endpoints.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use threadline_core::delivery::{DeliveryZone, ValidationResult};
use threadline_core::location::{AddressDraft, City, PickupLocation, Region};
use threadline_core::{AddressId, RegionId};
use tracing::instrument;

use crate::error::Result;
use crate::state::AppState;

/// Active delivery zones. `loading` is set until the first fetch succeeds.
#[derive(Debug, Serialize)]
pub struct ZonesResponse {
    pub loading: bool,
    pub zones: Vec<DeliveryZone>,
}

#[instrument(skip(state))]
pub async fn delivery_zones(State(state): State<AppState>) -> Json<ZonesResponse> {
    let catalog = state.zones().catalog().await;
    Json(ZonesResponse {
        loading: catalog.is_loading(),
        zones: catalog.zones().to_vec(),
    })
}

#[instrument(skip(state))]
pub async fn regions(State(state): State<AppState>) -> Result<Json<Vec<Region>>> {
    Ok(Json(state.api().regions().await?))
}

#[instrument(skip(state))]
pub async fn cities(
    State(state): State<AppState>,
    Path(region_id): Path<RegionId>,
) -> Result<Json<Vec<City>>> {
    Ok(Json(state.api().cities(Some(region_id)).await?))
}

#[instrument(skip(state))]
pub async fn pickup_locations(State(state): State<AppState>) -> Result<Json<Vec<PickupLocation>>> {
    Ok(Json(state.api().pickup_locations().await?))
}

/// Check an address against the delivery zones.
///
/// Never an error: an address outside every zone is reported with
/// `isValid: false`.
#[instrument(skip(state, draft))]
pub async fn validate_address(
    State(state): State<AppState>,
    Json(draft): Json<AddressDraft>,
) -> Json<ValidationResult> {
    let address = draft.into_address(AddressId::temp());
    Json(state.zones().validate_address(&address).await)
}
