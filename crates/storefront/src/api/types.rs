//! Catalog read models returned by the backend.
//!
//! Location, zone and address types live in `threadline-core`; these are the
//! product-side shapes only the storefront needs.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use threadline_core::{BrandId, CategoryId, Price, ProductId, VariantId};

/// A product as listed in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default, alias = "image")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub brand_id: Option<BrandId>,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Product {
    #[must_use]
    pub const fn display_price(&self) -> Price {
        Price::ghs(self.price)
    }
}

/// A size/color/stock combination of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariant {
    pub id: VariantId,
    pub product_id: ProductId,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    /// Overrides the product price when set.
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default, alias = "quantity")]
    pub stock: u32,
}

impl ProductVariant {
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Human label, e.g. "M / Navy".
    #[must_use]
    pub fn label(&self) -> String {
        match (&self.size, &self.color) {
            (Some(size), Some(color)) => format!("{size} / {color}"),
            (Some(only), None) | (None, Some(only)) => only.clone(),
            (None, None) => "Default".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Brand {
    pub id: BrandId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// Filters for the product listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize)]
pub struct ProductFilter {
    #[serde(default)]
    pub category: Option<CategoryId>,
    #[serde(default)]
    pub brand: Option<BrandId>,
}

impl ProductFilter {
    pub(crate) fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(category) = &self.category {
            query.push(("categoryId", category.to_string()));
        }
        if let Some(brand) = &self.brand {
            query.push(("brandId", brand.to_string()));
        }
        query
    }

    pub(crate) fn cache_key(&self) -> String {
        format!(
            "products:{}:{}",
            self.category.as_ref().map_or("", |c| c.as_str()),
            self.brand.as_ref().map_or("", |b| b.as_str())
        )
    }
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_product_from_backend_json() {
        let product: Product = serde_json::from_str(
            r#"{"id":"p-1","name":"Kente Shirt","price":"120.00","image":"/img/p-1.jpg","brandId":"b-2"}"#,
        )
        .unwrap();
        assert_eq!(product.price, dec!(120));
        assert_eq!(product.image_url.as_deref(), Some("/img/p-1.jpg"));
        assert!(product.is_active);
        assert_eq!(product.display_price().display(), "GH₵120.00");
    }

    #[test]
    fn test_variant_stock_and_label() {
        let variant: ProductVariant = serde_json::from_str(
            r#"{"id":"v-1","productId":"p-1","size":"M","color":"Navy","stock":0}"#,
        )
        .unwrap();
        assert!(!variant.in_stock());
        assert_eq!(variant.label(), "M / Navy");
    }

    #[test]
    fn test_filter_query_and_cache_key() {
        let filter = ProductFilter {
            category: Some(CategoryId::new("shirts")),
            brand: None,
        };
        assert_eq!(filter.query(), vec![("categoryId", "shirts".to_string())]);
        assert_eq!(filter.cache_key(), "products:shirts:");
        assert_eq!(ProductFilter::default().cache_key(), "products::");
    }
}
