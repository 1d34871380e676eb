//! Address forms and display data shared by the checkout and profile pages.

use serde::Deserialize;
use threadline_core::delivery::ValidationResult;
use threadline_core::location::{Address, AddressDraft, City, CityNames, Region};

use crate::state::AppState;

/// Address form fields as posted by the browser.
///
/// Select boxes post an empty string for "nothing chosen", so ids are kept
/// as text until [`AddressForm::to_draft`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressForm {
    #[serde(default)]
    pub region_id: String,
    #[serde(default)]
    pub city_id: String,
    #[serde(default)]
    pub area_name: String,
    #[serde(default)]
    pub landmark: String,
    #[serde(default)]
    pub additional_instructions: String,
    #[serde(default)]
    pub contact_phone: String,
    #[serde(default)]
    pub google_maps_link: String,
    /// Checkbox: present when ticked.
    #[serde(default)]
    pub is_default: Option<String>,
}

impl AddressForm {
    #[must_use]
    pub fn to_draft(&self) -> AddressDraft {
        AddressDraft {
            region_id: self.region_id.parse().ok(),
            city_id: self.city_id.parse().ok(),
            area_name: self.area_name.trim().to_owned(),
            landmark: non_blank(&self.landmark),
            additional_instructions: non_blank(&self.additional_instructions),
            contact_phone: non_blank(&self.contact_phone),
            is_default: self.is_default.is_some(),
            google_maps_link: self.google_maps_link.trim().to_owned(),
        }
    }

    #[must_use]
    pub fn is_default_checked(&self) -> bool {
        self.is_default.is_some()
    }
}

impl From<&Address> for AddressForm {
    fn from(address: &Address) -> Self {
        Self {
            region_id: address.region_id.map(|id| id.to_string()).unwrap_or_default(),
            city_id: address.city_id.map(|id| id.to_string()).unwrap_or_default(),
            area_name: address.area_name.clone(),
            landmark: address.landmark.clone().unwrap_or_default(),
            additional_instructions: address.additional_instructions.clone().unwrap_or_default(),
            contact_phone: address.contact_phone.clone().unwrap_or_default(),
            google_maps_link: address.google_maps_link.clone(),
            is_default: address.is_default.then(|| "on".to_string()),
        }
    }
}

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_owned())
}

/// A `<select>` option.
#[derive(Clone)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

/// Regions and cities, for address labels and the address form's selects.
#[derive(Clone, Default)]
pub struct LocationDirectory {
    pub regions: Vec<Region>,
    pub cities: Vec<City>,
}

impl LocationDirectory {
    /// Fetch regions and cities. Either list is empty if it cannot be fetched.
    pub async fn load(state: &AppState) -> Self {
        let regions = state.api().regions().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to fetch regions");
            Vec::new()
        });
        let cities = state.zones().cities().await;
        Self { regions, cities }
    }

    #[must_use]
    pub fn region_options(&self) -> Vec<SelectOption> {
        self.regions
            .iter()
            .map(|region| SelectOption {
                value: region.id.to_string(),
                label: region.name.clone(),
            })
            .collect()
    }

    /// Cities labelled with their region, e.g. "Kumasi (Ashanti)".
    #[must_use]
    pub fn city_options(&self) -> Vec<SelectOption> {
        self.cities
            .iter()
            .map(|city| {
                let label = match self.regions.iter().find(|r| r.id == city.region_id) {
                    Some(region) => format!("{} ({})", city.name, region.name),
                    None => city.name.clone(),
                };
                SelectOption {
                    value: city.id.to_string(),
                    label,
                }
            })
            .collect()
    }

    /// One-line summary, e.g. "Osu, Accra, Greater Accra".
    #[must_use]
    pub fn describe(&self, address: &Address) -> String {
        let city = address.city_id.and_then(|id| self.cities.city_name(id));
        let region = address
            .region_id
            .and_then(|id| self.regions.iter().find(|r| r.id == id))
            .map(|r| r.name.as_str());

        [Some(address.area_name.trim()), city, region]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// An address as listed on a page.
#[derive(Clone)]
pub struct AddressView {
    pub id: String,
    pub summary: String,
    pub landmark: Option<String>,
    pub contact_phone: Option<String>,
    pub is_default: bool,
    pub is_temp: bool,
    pub selected: bool,
    pub validation: Option<ValidationResult>,
    pub form: AddressForm,
}

impl AddressView {
    #[must_use]
    pub fn new(address: &Address, directory: &LocationDirectory) -> Self {
        Self {
            id: address.id.to_string(),
            summary: directory.describe(address),
            landmark: address.landmark.clone(),
            contact_phone: address.contact_phone.clone(),
            is_default: address.is_default,
            is_temp: address.is_temp(),
            selected: false,
            validation: None,
            form: AddressForm::from(address),
        }
    }

    /// Whether the address has a zone to deliver through.
    #[must_use]
    pub fn deliverable(&self) -> bool {
        self.validation.as_ref().is_some_and(|v| v.is_valid)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use threadline_core::{AddressId, CityId, RegionId};

    use super::*;

    fn directory() -> LocationDirectory {
        LocationDirectory {
            regions: vec![Region {
                id: RegionId::new(1),
                name: "Greater Accra".to_string(),
            }],
            cities: vec![City {
                id: CityId::new(5),
                region_id: RegionId::new(1),
                name: "Accra".to_string(),
            }],
        }
    }

    #[test]
    fn test_form_parses_ids_and_blanks() {
        let form = AddressForm {
            region_id: "1".to_string(),
            city_id: String::new(),
            area_name: " Osu ".to_string(),
            landmark: "  ".to_string(),
            contact_phone: "0244000000".to_string(),
            is_default: Some("on".to_string()),
            ..AddressForm::default()
        };
        let draft = form.to_draft();
        assert_eq!(draft.region_id, Some(RegionId::new(1)));
        assert_eq!(draft.city_id, None);
        assert_eq!(draft.area_name, "Osu");
        assert_eq!(draft.landmark, None);
        assert_eq!(draft.contact_phone.as_deref(), Some("0244000000"));
        assert!(draft.is_default);
        assert!(!draft.has_required_fields());
    }

    #[test]
    fn test_form_round_trips_an_address() {
        let address = AddressDraft {
            region_id: Some(RegionId::new(1)),
            city_id: Some(CityId::new(5)),
            area_name: "Osu".to_string(),
            landmark: Some("Oxford Street".to_string()),
            ..AddressDraft::default()
        }
        .into_address(AddressId::new("a-1"));
        let draft = AddressForm::from(&address).to_draft();
        assert_eq!(draft, AddressDraft::from(&address));
    }

    #[test]
    fn test_describe_and_options() {
        let directory = directory();
        let address = AddressDraft {
            region_id: Some(RegionId::new(1)),
            city_id: Some(CityId::new(5)),
            area_name: "Osu".to_string(),
            ..AddressDraft::default()
        }
        .into_address(AddressId::temp());
        assert_eq!(directory.describe(&address), "Osu, Accra, Greater Accra");
        assert_eq!(directory.city_options()[0].label, "Accra (Greater Accra)");
        assert_eq!(directory.region_options()[0].value, "1");
    }
}
