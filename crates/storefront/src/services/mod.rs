//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Demo credential check and token issue at login
//! - `customer` - Customer API calls with token persistence
//! - `delivery` - Process-wide delivery-zone catalog and address validation
//! - `selection` - Checkout address selection backed by the session

pub mod auth;
pub mod customer;
pub mod delivery;
pub mod selection;

pub use customer::CustomerSession;
pub use delivery::ZoneDirectory;
pub use selection::{SelectionFlow, SubmitOutcome};
