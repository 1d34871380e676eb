//! Catalog JSON endpoints.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Serialize;
use threadline_core::ProductId;
use tracing::instrument;

use crate::api::{Brand, Category, Product, ProductFilter, ProductVariant};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// A product with its variants.
#[derive(Debug, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub variants: Vec<ProductVariant>,
}

/// List products, optionally filtered by `category` and `brand`.
#[instrument(skip(state))]
pub async fn products(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
) -> Result<Json<Vec<Product>>> {
    Ok(Json(state.api().products(&filter).await?))
}

/// A product and its variants.
#[instrument(skip(state), fields(product_id = %id))]
pub async fn product(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductDetail>> {
    let product = state.api().product(&id).await?;
    if !product.is_active {
        return Err(AppError::NotFound(format!("product {id}")));
    }
    let variants = state.api().product_variants(&id).await?;
    Ok(Json(ProductDetail { product, variants }))
}

#[instrument(skip(state))]
pub async fn brands(State(state): State<AppState>) -> Result<Json<Vec<Brand>>> {
    Ok(Json(state.api().brands().await?))
}

#[instrument(skip(state))]
pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    Ok(Json(state.api().categories().await?))
}
