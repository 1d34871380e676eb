//! Ghana location directory and customer addresses.
//!
//! Field names follow the backend's camelCase JSON.

use serde::{Deserialize, Serialize};

use crate::types::{AddressId, CityId, PickupLocationId, RegionId};

/// One of Ghana's administrative regions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub id: RegionId,
    pub name: String,
}

/// A city within a region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct City {
    pub id: CityId,
    pub region_id: RegionId,
    pub name: String,
}

/// Lookup of city names, used to phrase delivery messages.
pub trait CityNames {
    /// Name of the given city, if known.
    fn city_name(&self, city_id: CityId) -> Option<&str>;
}

impl CityNames for [City] {
    fn city_name(&self, city_id: CityId) -> Option<&str> {
        self.iter()
            .find(|city| city.id == city_id)
            .map(|city| city.name.as_str())
    }
}

impl CityNames for Vec<City> {
    fn city_name(&self, city_id: CityId) -> Option<&str> {
        self.as_slice().city_name(city_id)
    }
}

/// A delivery address, either saved on the backend or held in the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: AddressId,
    #[serde(default)]
    pub region_id: Option<RegionId>,
    #[serde(default)]
    pub city_id: Option<CityId>,
    #[serde(default)]
    pub area_name: String,
    #[serde(default)]
    pub landmark: Option<String>,
    #[serde(default)]
    pub additional_instructions: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub google_maps_link: String,
}

impl Address {
    /// Whether this is the unsaved, session-only address.
    #[must_use]
    pub fn is_temp(&self) -> bool {
        self.id.is_temp()
    }

    /// Region, city and a non-blank area name, when all three are present.
    #[must_use]
    pub fn locality(&self) -> Option<(RegionId, CityId, &str)> {
        let area = self.area_name.trim();
        match (self.region_id, self.city_id) {
            (Some(region), Some(city)) if !area.is_empty() => Some((region, city, area)),
            _ => None,
        }
    }
}

/// Address form input, before it has an id.
///
/// Serializes to the body the backend expects for
/// `POST /customer-addresses` and `PUT /customer-addresses/:id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressDraft {
    pub region_id: Option<RegionId>,
    pub city_id: Option<CityId>,
    #[serde(default)]
    pub area_name: String,
    #[serde(default)]
    pub landmark: Option<String>,
    #[serde(default)]
    pub additional_instructions: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub google_maps_link: String,
}

impl AddressDraft {
    /// Whether the fields the form marks as required (region and city) are set.
    #[must_use]
    pub const fn has_required_fields(&self) -> bool {
        self.region_id.is_some() && self.city_id.is_some()
    }

    /// Materialize the draft as an address with the given id.
    #[must_use]
    pub fn into_address(self, id: AddressId) -> Address {
        Address {
            id,
            region_id: self.region_id,
            city_id: self.city_id,
            area_name: self.area_name.trim().to_owned(),
            landmark: non_blank(self.landmark),
            additional_instructions: non_blank(self.additional_instructions),
            contact_phone: non_blank(self.contact_phone),
            is_default: self.is_default,
            google_maps_link: self.google_maps_link.trim().to_owned(),
        }
    }
}

impl From<&Address> for AddressDraft {
    fn from(address: &Address) -> Self {
        Self {
            region_id: address.region_id,
            city_id: address.city_id,
            area_name: address.area_name.clone(),
            landmark: address.landmark.clone(),
            additional_instructions: address.additional_instructions.clone(),
            contact_phone: address.contact_phone.clone(),
            is_default: address.is_default,
            google_maps_link: address.google_maps_link.clone(),
        }
    }
}

/// A store location where orders can be collected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickupLocation {
    pub id: PickupLocationId,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

const fn default_true() -> bool {
    true
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_address_deserializes_backend_json() {
        let json = r#"{
            "id": "a-17",
            "regionId": 1,
            "cityId": 5,
            "areaName": "Osu",
            "landmark": "Near the Oxford Street mall",
            "isDefault": true,
            "googleMapsLink": "https://maps.google.com/?q=5.55,-0.18"
        }"#;
        let address: Address = serde_json::from_str(json).unwrap();
        assert_eq!(address.id.as_str(), "a-17");
        assert_eq!(address.city_id, Some(CityId::new(5)));
        assert!(address.is_default);
        assert!(address.contact_phone.is_none());
    }

    #[test]
    fn test_locality_requires_all_parts() {
        let mut address = AddressDraft {
            region_id: Some(RegionId::new(1)),
            city_id: Some(CityId::new(5)),
            area_name: "  ".to_string(),
            ..AddressDraft::default()
        }
        .into_address(AddressId::temp());
        assert!(address.locality().is_none());

        address.area_name = "Osu".to_string();
        assert_eq!(
            address.locality(),
            Some((RegionId::new(1), CityId::new(5), "Osu"))
        );
    }

    #[test]
    fn test_draft_drops_blank_optionals() {
        let address = AddressDraft {
            region_id: Some(RegionId::new(2)),
            city_id: Some(CityId::new(9)),
            area_name: " Adum ".to_string(),
            landmark: Some("   ".to_string()),
            contact_phone: Some(" 0244000000 ".to_string()),
            ..AddressDraft::default()
        }
        .into_address(AddressId::temp());
        assert_eq!(address.area_name, "Adum");
        assert!(address.landmark.is_none());
        assert_eq!(address.contact_phone.as_deref(), Some("0244000000"));
    }

    #[test]
    fn test_city_names_lookup() {
        let cities = vec![City {
            id: CityId::new(5),
            region_id: RegionId::new(1),
            name: "Accra".to_string(),
        }];
        assert_eq!(cities.city_name(CityId::new(5)), Some("Accra"));
        assert_eq!(cities.city_name(CityId::new(6)), None);
    }
}
