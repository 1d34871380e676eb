//! JSON endpoints.
//!
//! Catalog and location data mirror the backend, served through the
//! storefront's caches. Address selection endpoints require a signed-in
//! shopper and answer `401` otherwise.

pub mod catalog;
pub mod locations;
pub mod selection;
