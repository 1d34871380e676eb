//! Delivery-zone directory.
//!
//! Holds the zone catalog for the whole process. It reads as
//! [`ZoneCatalog::Loading`] until the first successful fetch; after that the
//! zones are kept and every request resolves against the same list.

use threadline_core::delivery::{ValidationResult, ZoneCatalog, validate_address_locally};
use threadline_core::location::{Address, City};
use tokio::sync::RwLock;
use tracing::instrument;

use crate::api::ApiClient;

pub struct ZoneDirectory {
    api: ApiClient,
    catalog: RwLock<ZoneCatalog>,
}

impl ZoneDirectory {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            catalog: RwLock::new(ZoneCatalog::Loading),
        }
    }

    /// The current catalog. While still loading, one fetch is attempted.
    pub async fn catalog(&self) -> ZoneCatalog {
        {
            let catalog = self.catalog.read().await;
            if !catalog.is_loading() {
                return catalog.clone();
            }
        }
        self.load().await
    }

    /// Fetch the zone list. A failed fetch leaves the catalog as it was.
    #[instrument(skip(self))]
    pub async fn load(&self) -> ZoneCatalog {
        match self.api.delivery_zones().await {
            Ok(zones) => {
                let catalog = ZoneCatalog::ready(zones);
                tracing::info!(active = catalog.zones().len(), "Delivery zones loaded");
                *self.catalog.write().await = catalog.clone();
                catalog
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch delivery zones");
                self.catalog.read().await.clone()
            }
        }
    }

    /// All cities, for naming the city in validation messages. Empty when
    /// the directory cannot be fetched.
    pub async fn cities(&self) -> Vec<City> {
        self.api.cities(None).await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to fetch cities");
            Vec::new()
        })
    }

    /// Resolve an address against the cached zones only.
    pub async fn validate_locally(&self, address: &Address) -> ValidationResult {
        let catalog = self.catalog().await;
        let cities = self.cities().await;
        validate_address_locally(address, &catalog, cities.as_slice())
    }

    /// Ask the backend first; on any network or parse failure, resolve
    /// locally instead.
    #[instrument(skip(self, address), fields(address_id = %address.id))]
    pub async fn validate_address(&self, address: &Address) -> ValidationResult {
        match self.api.validate_address(address).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(error = %e, "Address validation API failed, resolving locally");
                self.validate_locally(address).await
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use httpmock::prelude::*;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use threadline_core::delivery::MSG_LOADING;
    use threadline_core::location::AddressDraft;
    use threadline_core::{AddressId, CityId, RegionId, ZoneId};

    use super::*;
    use crate::api::tests::client_for;

    fn osu() -> Address {
        AddressDraft {
            region_id: Some(RegionId::new(1)),
            city_id: Some(CityId::new(5)),
            area_name: "Osu".to_string(),
            ..AddressDraft::default()
        }
        .into_address(AddressId::temp())
    }

    async fn mock_zones(server: &MockServer) {
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/delivery-zones");
                then.status(200).json_body(json!([{
                    "id": "z1",
                    "name": "Accra Central",
                    "deliveryFee": 15,
                    "structuredAreas": [{"regionId": 1, "cityId": 5}],
                    "isActive": true
                }]));
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

    #[tokio::test]
    async fn test_catalog_stays_loading_until_fetch_succeeds() {
        let server = MockServer::start_async().await;
        let mut failing = server
            .mock_async(|when, then| {
                when.method(GET).path("/api/delivery-zones");
                then.status(503);
            })
            .await;

        let directory = ZoneDirectory::new(client_for(&server));
        assert!(directory.catalog().await.is_loading());
        let result = directory.validate_locally(&osu()).await;
        assert_eq!(result.message, MSG_LOADING);

        failing.delete_async().await;
        mock_zones(&server).await;

        let catalog = directory.catalog().await;
        assert_eq!(catalog.zones().len(), 1);
    }

    #[tokio::test]
    async fn test_validate_falls_back_to_local_resolution() {
        let server = MockServer::start_async().await;
        mock_zones(&server).await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/cart/validate-address");
                then.status(500);
            })
            .await;

        let directory = ZoneDirectory::new(client_for(&server));
        let result = directory.validate_address(&osu()).await;

        assert!(result.is_valid);
        assert_eq!(result.message, "Delivery available in Accra");
        assert_eq!(result.delivery_zone_id, Some(ZoneId::new("z1")));
        assert_eq!(result.delivery_zone_fee, Some(dec!(15)));
    }

    #[tokio::test]
    async fn test_validate_prefers_backend_answer() {
        let server = MockServer::start_async().await;
        let zones = server
            .mock_async(|when, then| {
                when.method(GET).path("/api/delivery-zones");
                then.status(200).json_body(json!([]));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/cart/validate-address");
                then.status(200).json_body(json!({
                    "isValid": false,
                    "message": "We don't deliver to this area yet."
                }));
            })
            .await;

        let directory = ZoneDirectory::new(client_for(&server));
        let result = directory.validate_address(&osu()).await;

        assert!(!result.is_valid);
        zones.assert_hits_async(0).await;
    }
}
