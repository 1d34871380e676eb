//! Cart route handlers.
//!
//! The cart lives in the visitor's session. Prices are read from the backend
//! when an item is added; the form only names the product and variant.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use threadline_core::cart::{Cart, CartItem, CartTotals, DeliveryMethod};
use threadline_core::delivery::DeliveryZone;
use threadline_core::location::PickupLocation;
use threadline_core::{PickupLocationId, ProductId, VariantId, ZoneId};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::routes::PageContext;
use crate::state::AppState;
use crate::stores::cart::{load_cart, save_cart};

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: ProductId,
    #[serde(default)]
    pub variant_id: Option<String>,
    pub quantity: Option<u32>,
}

/// A one-step quantity change from the +/- buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuantityStep {
    Increment,
    Decrement,
}

/// Update cart form data. A `step` wins over `quantity`.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub line_id: String,
    #[serde(default)]
    pub step: Option<QuantityStep>,
    #[serde(default)]
    pub quantity: Option<u32>,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub line_id: String,
}

/// How the shopper wants to receive the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryChoice {
    Pickup,
    Delivery,
}

/// Delivery method form data.
#[derive(Debug, Deserialize)]
pub struct DeliveryForm {
    pub method: DeliveryChoice,
    #[serde(default)]
    pub location_id: Option<String>,
    #[serde(default)]
    pub zone_id: Option<String>,
}

/// Query parameters for error display.
#[derive(Debug, Deserialize)]
pub struct CartQuery {
    pub error: Option<String>,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub page: PageContext,
    pub cart: Cart,
    pub totals: CartTotals,
    pub pickup_locations: Vec<PickupLocation>,
    pub zones: Vec<DeliveryZone>,
    pub selected_location: String,
    pub selected_zone: String,
    pub error: Option<String>,
}

/// Display cart page.
#[instrument(skip(state, session, customer))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(customer): OptionalAuth,
    Query(query): Query<CartQuery>,
) -> impl IntoResponse {
    let cart = load_cart(&session).await;
    let totals = cart.totals();

    let pickup_locations = state.api().pickup_locations().await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to fetch pickup locations");
        Vec::new()
    });
    let zones = state.zones().catalog().await.zones().to_vec();

    let (selected_location, selected_zone) = match &cart.delivery {
        DeliveryMethod::Pickup { location_id } => (
            location_id.as_ref().map(ToString::to_string).unwrap_or_default(),
            String::new(),
        ),
        DeliveryMethod::Delivery { zone_id, .. } => (String::new(), zone_id.to_string()),
    };

    let error = query.error.as_deref().map(|code| {
        match code {
            "zone" => "That delivery zone is not available. Choose another zone or pickup.",
            "location" => "That pickup location is not available.",
            _ => "Something went wrong updating your cart.",
        }
        .to_string()
    });

    CartShowTemplate {
        page: PageContext::load(&session, customer).await,
        cart,
        totals,
        pickup_locations,
        zones,
        selected_location,
        selected_zone,
        error,
    }
}

/// Add item to cart.
///
/// Requires a signed-in shopper; otherwise the visitor is sent to login and
/// returned to the product page afterwards.
#[instrument(skip(state, session, _customer))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(_customer): RequireAuth,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let product = state.api().product(&form.product_id).await?;
    if !product.is_active {
        return Err(AppError::NotFound(format!("product {}", product.id)));
    }
    let back = |code: &str| {
        Redirect::to(&format!(
            "/products/{}?error={code}",
            urlencoding::encode(product.id.as_str())
        ))
        .into_response()
    };

    let variants = state.api().product_variants(&product.id).await?;
    let variant_id = form
        .variant_id
        .filter(|id| !id.trim().is_empty())
        .map(VariantId::from);
    let variant = match variant_id {
        Some(id) => Some(
            variants
                .iter()
                .find(|v| v.id == id)
                .ok_or_else(|| AppError::BadRequest(format!("unknown variant {id}")))?,
        ),
        None if variants.is_empty() => None,
        None => return Ok(back("choose_variant")),
    };
    if variant.is_some_and(|v| !v.in_stock()) {
        tracing::info!(product_id = %product.id, "Rejected out-of-stock variant");
        return Ok(back("out_of_stock"));
    }

    let item = CartItem {
        product_id: product.id.clone(),
        variant_id: variant.map(|v| v.id.clone()),
        name: product.name.clone(),
        size: variant.and_then(|v| v.size.clone()),
        color: variant.and_then(|v| v.color.clone()),
        image_url: product.image_url.clone(),
        price: variant.and_then(|v| v.price).unwrap_or(product.price),
        quantity: form.quantity.unwrap_or(1).max(1),
    };

    let mut cart = load_cart(&session).await;
    cart.add(item)?;
    save_cart(&session, &cart).await?;
    add_breadcrumb(
        "cart",
        "Added item",
        Some(&[("product_id", product.id.as_str())]),
    );

    Ok(Redirect::to("/cart").into_response())
}

/// Change a line's quantity. Quantities below 1 are raised to 1; stepping
/// down from 1 removes the line.
#[instrument(skip(session))]
pub async fn update(session: Session, Form(form): Form<UpdateCartForm>) -> Result<Redirect> {
    let mut cart = load_cart(&session).await;
    match form.step {
        Some(QuantityStep::Increment) => cart.increment(&form.line_id)?,
        Some(QuantityStep::Decrement) => cart.decrement(&form.line_id)?,
        None => cart.set_quantity(&form.line_id, form.quantity.unwrap_or(1).max(1))?,
    }
    save_cart(&session, &cart).await?;
    Ok(Redirect::to("/cart"))
}

/// Remove a line from the cart.
#[instrument(skip(session))]
pub async fn remove(session: Session, Form(form): Form<RemoveFromCartForm>) -> Result<Redirect> {
    let mut cart = load_cart(&session).await;
    cart.remove(&form.line_id)?;
    save_cart(&session, &cart).await?;
    Ok(Redirect::to("/cart"))
}

/// Choose pickup (optionally at a location) or delivery through a zone.
#[instrument(skip(state, session))]
pub async fn delivery(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<DeliveryForm>,
) -> Result<Redirect> {
    let method = match form.method {
        DeliveryChoice::Pickup => match pickup_method(&state, form.location_id).await? {
            Some(method) => method,
            None => return Ok(Redirect::to("/cart?error=location")),
        },
        DeliveryChoice::Delivery => {
            let catalog = state.zones().catalog().await;
            let zone = form
                .zone_id
                .filter(|id| !id.is_empty())
                .and_then(|id| catalog.find(&ZoneId::from(id)).cloned());
            match zone {
                Some(zone) => DeliveryMethod::delivery(&zone),
                None => return Ok(Redirect::to("/cart?error=zone")),
            }
        }
    };

    let mut cart = load_cart(&session).await;
    cart.set_delivery(method);
    save_cart(&session, &cart).await?;
    Ok(Redirect::to("/cart"))
}

/// Pickup at the given location, or at no particular location when none is
/// named. `None` if the location is unknown or inactive.
///
/// # Errors
///
/// Returns an error if pickup locations cannot be fetched.
pub async fn pickup_method(
    state: &AppState,
    location_id: Option<String>,
) -> Result<Option<DeliveryMethod>> {
    let Some(location_id) = location_id.filter(|id| !id.is_empty()) else {
        return Ok(Some(DeliveryMethod::Pickup { location_id: None }));
    };
    let location_id = PickupLocationId::from(location_id);
    let locations = state.api().pickup_locations().await?;
    let known = locations
        .iter()
        .any(|location| location.id == location_id && location.is_active);

    Ok(known.then_some(DeliveryMethod::Pickup {
        location_id: Some(location_id),
    }))
}
