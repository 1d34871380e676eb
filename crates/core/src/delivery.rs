//! Delivery-zone resolution.
//!
//! A zone covers an address when one of its structured areas names the same
//! region and city. Area names are shown to the rider but never matched.
//!
//! When several active zones cover the same city, the winner is chosen by
//! [`DeliveryZone::precedence`]: explicit `priority` first (lower wins, absent
//! sorts last), then the cheaper fee, then the zone id. The backend's list
//! order never affects the result.

use std::cmp::Ordering;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::location::{Address, CityNames};
use crate::types::{CityId, RegionId, ZoneId};

/// Shown while the zone list has not been fetched yet.
pub const MSG_LOADING: &str = "Loading delivery zones...";
/// Shown when region, city or area is missing.
pub const MSG_INCOMPLETE: &str = "Incomplete address information";
/// Shown when no active zone covers the address.
pub const MSG_OUT_OF_ZONE: &str =
    "We don't deliver to this area yet. Please choose a different address or select pickup instead.";

/// A (region, city) pair covered by a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredArea {
    pub region_id: RegionId,
    pub city_id: CityId,
}

/// A named delivery coverage area with a flat fee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryZone {
    pub id: ZoneId,
    pub name: String,
    pub delivery_fee: Decimal,
    #[serde(default)]
    pub structured_areas: Vec<StructuredArea>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub priority: Option<i32>,
}

impl DeliveryZone {
    /// Whether any structured area matches the region and city.
    #[must_use]
    pub fn covers(&self, region_id: RegionId, city_id: CityId) -> bool {
        self.structured_areas
            .iter()
            .any(|area| area.region_id == region_id && area.city_id == city_id)
    }

    /// Ordering between two zones covering the same city. `Less` wins.
    #[must_use]
    pub fn precedence(&self, other: &Self) -> Ordering {
        let rank = |zone: &Self| zone.priority.unwrap_or(i32::MAX);
        rank(self)
            .cmp(&rank(other))
            .then_with(|| self.delivery_fee.cmp(&other.delivery_fee))
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// The zone list as currently known to the storefront.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ZoneCatalog {
    /// The first fetch has not completed; callers should retry later.
    #[default]
    Loading,
    /// Active zones only.
    Ready(Vec<DeliveryZone>),
}

impl ZoneCatalog {
    /// Build a catalog from the backend's list, keeping active zones only.
    #[must_use]
    pub fn ready(zones: impl IntoIterator<Item = DeliveryZone>) -> Self {
        Self::Ready(zones.into_iter().filter(|zone| zone.is_active).collect())
    }

    /// Active zones, empty while loading.
    #[must_use]
    pub fn zones(&self) -> &[DeliveryZone] {
        match self {
            Self::Loading => &[],
            Self::Ready(zones) => zones,
        }
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Look up an active zone by id.
    #[must_use]
    pub fn find(&self, id: &ZoneId) -> Option<&DeliveryZone> {
        self.zones().iter().find(|zone| &zone.id == id)
    }

    /// The zone that delivers to the given city, honoring precedence.
    #[must_use]
    pub fn zone_for(&self, region_id: RegionId, city_id: CityId) -> Option<&DeliveryZone> {
        self.zones()
            .iter()
            .filter(|zone| zone.covers(region_id, city_id))
            .min_by(|a, b| a.precedence(b))
    }
}

/// Outcome of checking an address against the delivery zones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_zone_id: Option<ZoneId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_zone_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_zone_fee: Option<Decimal>,
}

impl ValidationResult {
    fn rejected(message: &str) -> Self {
        Self {
            is_valid: false,
            message: message.to_owned(),
            delivery_zone_id: None,
            delivery_zone_name: None,
            delivery_zone_fee: None,
        }
    }

    #[must_use]
    pub fn loading() -> Self {
        Self::rejected(MSG_LOADING)
    }

    #[must_use]
    pub fn incomplete() -> Self {
        Self::rejected(MSG_INCOMPLETE)
    }

    #[must_use]
    pub fn out_of_zone() -> Self {
        Self::rejected(MSG_OUT_OF_ZONE)
    }

    /// Delivery is available through `zone`.
    #[must_use]
    pub fn covered(zone: &DeliveryZone, place: &str) -> Self {
        Self {
            is_valid: true,
            message: format!("Delivery available in {place}"),
            delivery_zone_id: Some(zone.id.clone()),
            delivery_zone_name: Some(zone.name.clone()),
            delivery_zone_fee: Some(zone.delivery_fee),
        }
    }

    /// Whether the result only reflects that zones were not yet available.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        !self.is_valid && self.message == MSG_LOADING
    }
}

/// Classify an address against the zone catalog without calling the backend.
///
/// The success message names the city when `cities` knows it, and falls back
/// to the address's area name otherwise.
#[must_use]
pub fn validate_address_locally<C>(
    address: &Address,
    catalog: &ZoneCatalog,
    cities: &C,
) -> ValidationResult
where
    C: CityNames + ?Sized,
{
    if catalog.is_loading() {
        return ValidationResult::loading();
    }

    let Some((region_id, city_id, area_name)) = address.locality() else {
        return ValidationResult::incomplete();
    };

    match catalog.zone_for(region_id, city_id) {
        Some(zone) => {
            let place = cities.city_name(city_id).unwrap_or(area_name);
            ValidationResult::covered(zone, place)
        }
        None => ValidationResult::out_of_zone(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::location::{AddressDraft, City};
    use crate::types::AddressId;

    fn zone(id: &str, fee: Decimal, areas: &[(i32, i32)]) -> DeliveryZone {
        DeliveryZone {
            id: ZoneId::new(id),
            name: format!("Zone {id}"),
            delivery_fee: fee,
            structured_areas: areas
                .iter()
                .map(|&(region, city)| StructuredArea {
                    region_id: RegionId::new(region),
                    city_id: CityId::new(city),
                })
                .collect(),
            is_active: true,
            priority: None,
        }
    }

    fn address(region: i32, city: i32, area: &str) -> Address {
        AddressDraft {
            region_id: Some(RegionId::new(region)),
            city_id: Some(CityId::new(city)),
            area_name: area.to_string(),
            ..AddressDraft::default()
        }
        .into_address(AddressId::new("a-1"))
    }

    fn no_cities() -> Vec<City> {
        Vec::new()
    }

    #[test]
    fn test_matching_city_is_valid_with_zone_fee() {
        let catalog = ZoneCatalog::ready([zone("z1", dec!(15), &[(1, 5)])]);
        let result = validate_address_locally(&address(1, 5, "Osu"), &catalog, &no_cities());

        assert!(result.is_valid);
        assert_eq!(result.delivery_zone_id, Some(ZoneId::new("z1")));
        assert_eq!(result.delivery_zone_name.as_deref(), Some("Zone z1"));
        assert_eq!(result.delivery_zone_fee, Some(dec!(15)));
    }

    #[test]
    fn test_unmatched_city_is_out_of_zone() {
        let catalog = ZoneCatalog::ready([zone("z1", dec!(15), &[(1, 5)])]);
        let result =
            validate_address_locally(&address(2, 9, "Kumasi Central"), &catalog, &no_cities());

        assert!(!result.is_valid);
        assert_eq!(result.message, MSG_OUT_OF_ZONE);
        assert!(result.delivery_zone_id.is_none());
    }

    #[test]
    fn test_region_must_match_as_well_as_city() {
        let catalog = ZoneCatalog::ready([zone("z1", dec!(15), &[(1, 5)])]);
        let result = validate_address_locally(&address(3, 5, "Osu"), &catalog, &no_cities());
        assert!(!result.is_valid);
    }

    #[test]
    fn test_loading_catalog() {
        let result =
            validate_address_locally(&address(1, 5, "Osu"), &ZoneCatalog::Loading, &no_cities());
        assert!(!result.is_valid);
        assert_eq!(result.message, MSG_LOADING);
        assert!(result.is_pending());
    }

    #[test]
    fn test_incomplete_address() {
        let catalog = ZoneCatalog::ready([zone("z1", dec!(15), &[(1, 5)])]);
        let mut missing_city = address(1, 5, "Osu");
        missing_city.city_id = None;
        let blank_area = address(1, 5, " ");

        for addr in [missing_city, blank_area] {
            let result = validate_address_locally(&addr, &catalog, &no_cities());
            assert_eq!(result.message, MSG_INCOMPLETE);
            assert!(!result.is_valid);
        }
    }

    #[test]
    fn test_message_uses_city_name_when_known() {
        let catalog = ZoneCatalog::ready([zone("z1", dec!(15), &[(1, 5)])]);
        let cities = vec![City {
            id: CityId::new(5),
            region_id: RegionId::new(1),
            name: "Accra".to_string(),
        }];

        let named = validate_address_locally(&address(1, 5, "Osu"), &catalog, &cities);
        assert_eq!(named.message, "Delivery available in Accra");

        let fallback = validate_address_locally(&address(1, 5, "Osu"), &catalog, &no_cities());
        assert_eq!(fallback.message, "Delivery available in Osu");
    }

    #[test]
    fn test_inactive_zones_are_ignored() {
        let mut inactive = zone("z1", dec!(15), &[(1, 5)]);
        inactive.is_active = false;
        let catalog = ZoneCatalog::ready([inactive]);

        assert!(catalog.zones().is_empty());
        let result = validate_address_locally(&address(1, 5, "Osu"), &catalog, &no_cities());
        assert!(!result.is_valid);
    }

    #[test]
    fn test_overlap_prefers_cheaper_zone_regardless_of_order() {
        let expensive = zone("z-exp", dec!(20), &[(1, 5)]);
        let cheap = zone("z-cheap", dec!(12), &[(1, 5), (1, 6)]);

        for zones in [
            vec![expensive.clone(), cheap.clone()],
            vec![cheap.clone(), expensive.clone()],
        ] {
            let catalog = ZoneCatalog::ready(zones);
            let result = validate_address_locally(&address(1, 5, "Osu"), &catalog, &no_cities());
            assert_eq!(result.delivery_zone_id, Some(ZoneId::new("z-cheap")));
        }
    }

    #[test]
    fn test_overlap_explicit_priority_beats_fee() {
        let mut preferred = zone("z-pref", dec!(30), &[(1, 5)]);
        preferred.priority = Some(1);
        let cheap = zone("z-cheap", dec!(5), &[(1, 5)]);

        let catalog = ZoneCatalog::ready([cheap, preferred]);
        let chosen = catalog.zone_for(RegionId::new(1), CityId::new(5)).unwrap();
        assert_eq!(chosen.id, ZoneId::new("z-pref"));
    }

    #[test]
    fn test_overlap_equal_fee_falls_back_to_id() {
        let catalog = ZoneCatalog::ready([
            zone("z-b", dec!(10), &[(1, 5)]),
            zone("z-a", dec!(10), &[(1, 5)]),
        ]);
        let chosen = catalog.zone_for(RegionId::new(1), CityId::new(5)).unwrap();
        assert_eq!(chosen.id, ZoneId::new("z-a"));
    }

    #[test]
    fn test_every_listed_area_is_covered() {
        let zones = vec![
            zone("z1", dec!(15), &[(1, 5), (1, 6)]),
            zone("z2", dec!(25), &[(2, 9), (3, 14)]),
        ];
        let catalog = ZoneCatalog::ready(zones.clone());

        for z in &zones {
            for area in &z.structured_areas {
                let addr = address(area.region_id.as_i32(), area.city_id.as_i32(), "Area");
                let result = validate_address_locally(&addr, &catalog, &no_cities());
                assert!(result.is_valid);
                assert_eq!(result.delivery_zone_id.as_ref(), Some(&z.id));
                assert_eq!(result.delivery_zone_fee, Some(z.delivery_fee));
            }
        }
        for (region, city) in [(1, 7), (2, 5), (4, 9)] {
            let result =
                validate_address_locally(&address(region, city, "Area"), &catalog, &no_cities());
            assert!(!result.is_valid);
        }
    }

    #[test]
    fn test_zone_deserializes_numeric_fee() {
        let json = r#"{
            "id": "z1",
            "name": "Accra Central",
            "deliveryFee": 15,
            "structuredAreas": [{"regionId": 1, "cityId": 5}],
            "isActive": true
        }"#;
        let zone: DeliveryZone = serde_json::from_str(json).unwrap();
        assert_eq!(zone.delivery_fee, dec!(15));
        assert!(zone.covers(RegionId::new(1), CityId::new(5)));
        assert!(zone.priority.is_none());
    }

    #[test]
    fn test_validation_result_json_shape() {
        let json = serde_json::to_value(ValidationResult::out_of_zone()).unwrap();
        assert_eq!(json["isValid"], false);
        assert!(json.get("deliveryZoneId").is_none());
    }
}
