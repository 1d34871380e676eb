//! Ghana location directory, delivery zones, and pickup locations.

use reqwest::Method;
use threadline_core::delivery::{DeliveryZone, ValidationResult};
use threadline_core::location::{Address, City, PickupLocation, Region};
use threadline_core::RegionId;
use tracing::instrument;

use super::cache::CacheValue;
use super::{ApiClient, ApiError};

impl ApiClient {
    /// All delivery zones as the backend lists them, active or not.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn delivery_zones(&self) -> Result<Vec<DeliveryZone>, ApiError> {
        let cache_key = "delivery-zones".to_string();
        if let Some(CacheValue::Zones(zones)) = self.inner.catalog.get(&cache_key).await {
            return Ok(zones);
        }

        let zones: Vec<DeliveryZone> = self.get("delivery-zones", &[]).await?;
        tracing::debug!(count = zones.len(), "Fetched delivery zones");
        self.inner
            .catalog
            .insert(cache_key, CacheValue::Zones(zones.clone()))
            .await;
        Ok(zones)
    }

    /// Ghana's regions.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn regions(&self) -> Result<Vec<Region>, ApiError> {
        let cache_key = "regions".to_string();
        if let Some(CacheValue::Regions(regions)) = self.inner.catalog.get(&cache_key).await {
            return Ok(regions);
        }

        let regions: Vec<Region> = self.get("ghana/regions", &[]).await?;
        self.inner
            .catalog
            .insert(cache_key, CacheValue::Regions(regions.clone()))
            .await;
        Ok(regions)
    }

    /// Cities, either all of them or those of one region.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn cities(&self, region: Option<RegionId>) -> Result<Vec<City>, ApiError> {
        let (cache_key, path) = match region {
            Some(region) => (format!("cities:{region}"), format!("ghana/cities/{region}")),
            None => ("cities".to_string(), "ghana/cities".to_string()),
        };
        if let Some(CacheValue::Cities(cities)) = self.inner.catalog.get(&cache_key).await {
            return Ok(cities);
        }

        let cities: Vec<City> = self.get(&path, &[]).await?;
        self.inner
            .catalog
            .insert(cache_key, CacheValue::Cities(cities.clone()))
            .await;
        Ok(cities)
    }

    /// Active pickup locations.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn pickup_locations(&self) -> Result<Vec<PickupLocation>, ApiError> {
        let cache_key = "pickup-locations".to_string();
        if let Some(CacheValue::PickupLocations(locations)) =
            self.inner.catalog.get(&cache_key).await
        {
            return Ok(locations);
        }

        let listed: Vec<PickupLocation> = self.get("pickup-locations", &[]).await?;
        let locations: Vec<PickupLocation> = listed
            .into_iter()
            .filter(|location| location.is_active)
            .collect();
        self.inner
            .catalog
            .insert(cache_key, CacheValue::PickupLocations(locations.clone()))
            .await;
        Ok(locations)
    }

    /// Ask the backend which zone covers an address.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is not a
    /// validation result.
    #[instrument(skip(self, address), fields(address_id = %address.id))]
    pub async fn validate_address(&self, address: &Address) -> Result<ValidationResult, ApiError> {
        let body = serde_json::json!({
            "regionId": address.region_id,
            "cityId": address.city_id,
            "areaName": address.area_name,
        });
        self.execute(Method::POST, "cart/validate-address", &[], Some(&body), None)
            .await
    }
}
