//! Cache types for catalog and directory responses.

use threadline_core::delivery::DeliveryZone;
use threadline_core::location::{City, PickupLocation, Region};

use super::types::{Brand, Category, Product};

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(Vec<Product>),
    Brands(Vec<Brand>),
    Categories(Vec<Category>),
    Zones(Vec<DeliveryZone>),
    Regions(Vec<Region>),
    Cities(Vec<City>),
    PickupLocations(Vec<PickupLocation>),
}
