//! Product catalog endpoints.

use threadline_core::ProductId;
use tracing::{debug, instrument};

use super::cache::CacheValue;
use super::types::{Brand, Category, Product, ProductFilter, ProductVariant};
use super::{ApiClient, ApiError};

impl ApiClient {
    /// List active products, optionally filtered by category or brand.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn products(&self, filter: &ProductFilter) -> Result<Vec<Product>, ApiError> {
        let cache_key = filter.cache_key();
        if let Some(CacheValue::Products(products)) = self.inner.catalog.get(&cache_key).await {
            debug!("Cache hit for {cache_key}");
            return Ok(products);
        }

        let listed: Vec<Product> = self.get("products", &filter.query()).await?;
        let products: Vec<Product> = listed
            .into_iter()
            .filter(|product| product.is_active)
            .collect();

        self.inner
            .catalog
            .insert(cache_key, CacheValue::Products(products.clone()))
            .await;
        Ok(products)
    }

    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the product does not exist.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: &ProductId) -> Result<Product, ApiError> {
        let cache_key = format!("product:{id}");
        if let Some(CacheValue::Product(product)) = self.inner.catalog.get(&cache_key).await {
            debug!("Cache hit for {cache_key}");
            return Ok(*product);
        }

        let product: Product = self
            .get(&format!("products/{}", urlencoding::encode(id.as_str())), &[])
            .await?;

        self.inner
            .catalog
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;
        Ok(product)
    }

    /// Variants (size, color, stock) of a product.
    ///
    /// Not cached: stock levels change as orders come in.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product_variants(&self, id: &ProductId) -> Result<Vec<ProductVariant>, ApiError> {
        self.get(
            &format!(
                "product-variants/product/{}",
                urlencoding::encode(id.as_str())
            ),
            &[],
        )
        .await
    }

    /// All brands.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn brands(&self) -> Result<Vec<Brand>, ApiError> {
        let cache_key = "brands".to_string();
        if let Some(CacheValue::Brands(brands)) = self.inner.catalog.get(&cache_key).await {
            return Ok(brands);
        }

        let brands: Vec<Brand> = self.get("brands", &[]).await?;
        self.inner
            .catalog
            .insert(cache_key, CacheValue::Brands(brands.clone()))
            .await;
        Ok(brands)
    }

    /// All categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        let cache_key = "categories".to_string();
        if let Some(CacheValue::Categories(categories)) = self.inner.catalog.get(&cache_key).await
        {
            return Ok(categories);
        }

        let categories: Vec<Category> = self.get("categories", &[]).await?;
        self.inner
            .catalog
            .insert(cache_key, CacheValue::Categories(categories.clone()))
            .await;
        Ok(categories)
    }
}
