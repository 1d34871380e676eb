//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use threadline_core::ProductId;
use tower_sessions::Session;
use tracing::instrument;

use crate::api::{Brand, Category, Product, ProductFilter, ProductVariant};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::routes::PageContext;
use crate::state::AppState;

/// Variant display data for templates.
#[derive(Clone)]
pub struct VariantView {
    pub id: String,
    pub label: String,
    pub price: Decimal,
    pub in_stock: bool,
}

impl VariantView {
    fn new(variant: &ProductVariant, product: &Product) -> Self {
        Self {
            id: variant.id.to_string(),
            label: variant.label(),
            price: variant.price.unwrap_or(product.price),
            in_stock: variant.in_stock(),
        }
    }
}

/// Query parameters for the product page.
#[derive(Debug, Deserialize)]
pub struct ProductQuery {
    pub error: Option<String>,
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub page: PageContext,
    pub products: Vec<Product>,
    pub brands: Vec<Brand>,
    pub categories: Vec<Category>,
    pub selected_brand: String,
    pub selected_category: String,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub page: PageContext,
    pub product: Product,
    pub variants: Vec<VariantView>,
    pub sold_out: bool,
    pub error: Option<String>,
}

/// Display product listing page.
///
/// An empty `category` or `brand` parameter means "all".
#[instrument(skip(state, session, customer))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(customer): OptionalAuth,
    Query(filter): Query<ProductFilter>,
) -> Result<impl IntoResponse> {
    let filter = ProductFilter {
        category: filter.category.filter(|c| !c.as_str().is_empty()),
        brand: filter.brand.filter(|b| !b.as_str().is_empty()),
    };

    let products = state.api().products(&filter).await?;
    let brands = state.api().brands().await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to fetch brands");
        Vec::new()
    });
    let categories = state.api().categories().await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to fetch categories");
        Vec::new()
    });

    Ok(ProductsIndexTemplate {
        page: PageContext::load(&session, customer).await,
        products,
        brands,
        categories,
        selected_brand: filter.brand.map(|b| b.to_string()).unwrap_or_default(),
        selected_category: filter.category.map(|c| c.to_string()).unwrap_or_default(),
    })
}

/// Display product detail page.
#[instrument(skip(state, session, customer, query), fields(product_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(customer): OptionalAuth,
    Path(id): Path<ProductId>,
    Query(query): Query<ProductQuery>,
) -> Result<impl IntoResponse> {
    let product = state.api().product(&id).await?;
    if !product.is_active {
        return Err(AppError::NotFound(format!("product {id}")));
    }

    let variants: Vec<VariantView> = state
        .api()
        .product_variants(&id)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to fetch variants");
            Vec::new()
        })
        .iter()
        .map(|variant| VariantView::new(variant, &product))
        .collect();
    let sold_out = !variants.is_empty() && variants.iter().all(|v| !v.in_stock);

    let error = query.error.as_deref().map(|code| {
        match code {
            "out_of_stock" => "That option is sold out.",
            "choose_variant" => "Please choose a size and color.",
            _ => "Something went wrong adding that to your cart.",
        }
        .to_string()
    });

    Ok(ProductShowTemplate {
        page: PageContext::load(&session, customer).await,
        product,
        variants,
        sold_out,
        error,
    })
}
