//! Address selection at checkout.
//!
//! The selector owns the shopper's saved addresses, an optional session-only
//! ("temp") address, and a cache holding one [`ValidationResult`] per
//! address. The cache is rebuilt whenever the address list or the zone
//! catalog changes, so selecting an address never re-runs zone resolution.
//!
//! ```text
//! NoSelection ──► SavedAddressChosen
//!      │
//!      └──► CreatingNew ──► TempAddressHeld
//!                      └──► SavedAfterCreate
//! ```
//!
//! Every transition that changes the selection returns a [`SelectionReport`]
//! carrying the address and its latest validation, produced by the same call
//! that updated the selection. Out-of-zone addresses are never blocked: the
//! shopper is warned and may confirm.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::delivery::{ValidationResult, ZoneCatalog, validate_address_locally};
use crate::location::{Address, AddressDraft, City};
use crate::types::AddressId;

/// Version written into stored selection snapshots.
pub const SELECTION_FORMAT_VERSION: u32 = 1;

/// Errors from selection transitions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("address {0} not found")]
    UnknownAddress(AddressId),
    #[error("region and city are required")]
    MissingRegionOrCity,
}

/// Where the selection flow currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionState {
    #[default]
    NoSelection,
    SavedAddressChosen,
    CreatingNew,
    TempAddressHeld,
    SavedAfterCreate,
}

/// What the checkout page is told whenever the selection changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionReport {
    pub address_data: Address,
    pub validation_result: ValidationResult,
}

/// How the shopper submitted the new-address form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitOptions {
    /// Save the address to the shopper's account.
    pub persist: bool,
    /// Proceed even though the address is outside every delivery zone.
    pub confirmed: bool,
}

/// Result of submitting a new-address draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftOutcome {
    /// The address is out of zone; ask the shopper to confirm or cancel.
    NeedsConfirmation(ValidationResult),
    /// The caller must create the address remotely, then call
    /// [`AddressSelector::complete_saved_create`].
    PersistRequested {
        draft: AddressDraft,
        validation: ValidationResult,
    },
    /// Held as the session-only address and selected.
    Selected(SelectionReport),
}

/// Session-storable selection state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionSnapshot {
    pub version: u32,
    pub state: SelectionState,
    pub selected: Option<AddressId>,
    pub temp: Option<Address>,
}

impl Default for SelectionSnapshot {
    fn default() -> Self {
        Self {
            version: SELECTION_FORMAT_VERSION,
            state: SelectionState::NoSelection,
            selected: None,
            temp: None,
        }
    }
}

/// Address selection state machine with a per-address validation cache.
#[derive(Debug, Clone)]
pub struct AddressSelector {
    addresses: Vec<Address>,
    temp: Option<Address>,
    catalog: ZoneCatalog,
    cities: Vec<City>,
    results: HashMap<AddressId, ValidationResult>,
    selected: Option<AddressId>,
    state: SelectionState,
}

impl AddressSelector {
    /// Create a selector over the shopper's saved addresses.
    #[must_use]
    pub fn new(addresses: Vec<Address>, catalog: ZoneCatalog, cities: Vec<City>) -> Self {
        let mut selector = Self {
            addresses,
            temp: None,
            catalog,
            cities,
            results: HashMap::new(),
            selected: None,
            state: SelectionState::NoSelection,
        };
        selector.recompute();
        selector
    }

    /// Resume from a stored snapshot.
    ///
    /// Snapshots written by another format version are ignored. A selection
    /// that points at an address which no longer exists is dropped.
    #[must_use]
    pub fn restore(mut self, snapshot: SelectionSnapshot) -> Self {
        if snapshot.version != SELECTION_FORMAT_VERSION {
            return self;
        }
        self.temp = snapshot.temp.filter(Address::is_temp);
        self.state = snapshot.state;
        self.selected = snapshot.selected.filter(|id| self.find(id).is_some());
        if self.selected.is_none() && self.state != SelectionState::CreatingNew {
            self.state = SelectionState::NoSelection;
        }
        self.recompute();
        self
    }

    #[must_use]
    pub fn snapshot(&self) -> SelectionSnapshot {
        SelectionSnapshot {
            version: SELECTION_FORMAT_VERSION,
            state: self.state,
            selected: self.selected.clone(),
            temp: self.temp.clone(),
        }
    }

    #[must_use]
    pub const fn state(&self) -> SelectionState {
        self.state
    }

    #[must_use]
    pub fn addresses(&self) -> &[Address] {
        &self.addresses
    }

    #[must_use]
    pub const fn temp_address(&self) -> Option<&Address> {
        self.temp.as_ref()
    }

    /// Cached validation for an address.
    #[must_use]
    pub fn validation_for(&self, id: &AddressId) -> Option<&ValidationResult> {
        self.results.get(id)
    }

    /// The current selection with its latest validation.
    #[must_use]
    pub fn current(&self) -> Option<SelectionReport> {
        let id = self.selected.as_ref()?;
        self.report(id)
    }

    /// Select the default saved address (or the first) when nothing is
    /// selected yet. Returns the current selection either way.
    pub fn auto_select(&mut self) -> Option<SelectionReport> {
        if self.selected.is_none() && self.state != SelectionState::CreatingNew {
            let pick = self
                .addresses
                .iter()
                .find(|address| address.is_default)
                .or_else(|| self.addresses.first())
                .map(|address| address.id.clone());
            if let Some(id) = pick {
                self.selected = Some(id);
                self.state = SelectionState::SavedAddressChosen;
            }
        }
        self.current()
    }

    /// Select an address by id. The temp address can be re-selected while
    /// it is held.
    ///
    /// # Errors
    ///
    /// Returns `SelectionError::UnknownAddress` if no address has that id.
    pub fn select(&mut self, id: &AddressId) -> Result<SelectionReport, SelectionError> {
        let report = self
            .report(id)
            .ok_or_else(|| SelectionError::UnknownAddress(id.clone()))?;
        self.state = if id.is_temp() {
            SelectionState::TempAddressHeld
        } else {
            SelectionState::SavedAddressChosen
        };
        self.selected = Some(id.clone());
        Ok(report)
    }

    /// Open the new-address form. The previous selection stays visible until
    /// a draft is accepted.
    pub const fn begin_create(&mut self) {
        self.state = SelectionState::CreatingNew;
    }

    /// Close the new-address form without changes.
    pub fn cancel_create(&mut self) {
        if self.state == SelectionState::CreatingNew {
            self.state = match &self.selected {
                Some(id) if id.is_temp() => SelectionState::TempAddressHeld,
                Some(_) => SelectionState::SavedAddressChosen,
                None => SelectionState::NoSelection,
            };
        }
    }

    /// Submit the new-address form.
    ///
    /// # Errors
    ///
    /// Returns `SelectionError::MissingRegionOrCity` if the draft lacks a
    /// region or city.
    pub fn submit_draft(
        &mut self,
        draft: AddressDraft,
        options: SubmitOptions,
    ) -> Result<DraftOutcome, SelectionError> {
        if !draft.has_required_fields() {
            return Err(SelectionError::MissingRegionOrCity);
        }
        self.state = SelectionState::CreatingNew;

        let candidate = draft.clone().into_address(AddressId::temp());
        let validation = self.validate(&candidate);

        if !validation.is_valid && !options.confirmed {
            return Ok(DraftOutcome::NeedsConfirmation(validation));
        }

        if options.persist {
            return Ok(DraftOutcome::PersistRequested { draft, validation });
        }

        let id = candidate.id.clone();
        self.results.insert(id.clone(), validation.clone());
        self.temp = Some(candidate.clone());
        self.selected = Some(id);
        self.state = SelectionState::TempAddressHeld;

        Ok(DraftOutcome::Selected(SelectionReport {
            address_data: candidate,
            validation_result: validation,
        }))
    }

    /// Record an address the backend just created and select it.
    ///
    /// A held temp address is discarded: the saved copy replaces it, so the
    /// `"temp"` id can no longer point at stale data.
    pub fn complete_saved_create(&mut self, created: Address) -> SelectionReport {
        if created.is_default {
            for address in &mut self.addresses {
                address.is_default = false;
            }
        }
        self.addresses.retain(|address| address.id != created.id);
        self.addresses.push(created.clone());
        self.temp = None;
        self.results.remove(&AddressId::temp());

        let validation = self.validate(&created);
        self.results.insert(created.id.clone(), validation.clone());
        self.selected = Some(created.id.clone());
        self.state = SelectionState::SavedAfterCreate;

        SelectionReport {
            address_data: created,
            validation_result: validation,
        }
    }

    fn validate(&self, address: &Address) -> ValidationResult {
        validate_address_locally(address, &self.catalog, self.cities.as_slice())
    }

    fn recompute(&mut self) {
        let results = self
            .addresses
            .iter()
            .chain(self.temp.iter())
            .map(|address| (address.id.clone(), self.validate(address)))
            .collect();
        self.results = results;
    }

    fn find(&self, id: &AddressId) -> Option<&Address> {
        if id.is_temp() {
            return self.temp.as_ref();
        }
        self.addresses.iter().find(|address| &address.id == id)
    }

    fn report(&self, id: &AddressId) -> Option<SelectionReport> {
        let address = self.find(id)?.clone();
        let validation = self
            .results
            .get(id)
            .cloned()
            .unwrap_or_else(|| self.validate(&address));
        Some(SelectionReport {
            address_data: address,
            validation_result: validation,
        })
    }
}
