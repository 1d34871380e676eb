//! Checkout route handlers.
//!
//! The checkout page is where the shopper picks a delivery address (saved,
//! new and saved, or new for this order only) or chooses pickup. Placing the
//! order simulates payment and clears the cart.

use std::time::Duration;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use rand::Rng;
use rand::distr::Alphanumeric;
use serde::Deserialize;
use threadline_core::AddressId;
use threadline_core::cart::{Cart, CartTotals, DeliveryMethod};
use threadline_core::delivery::MSG_LOADING;
use threadline_core::location::PickupLocation;
use threadline_core::selection::{SelectionReport, SelectionState, SubmitOptions};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::CurrentCustomer;
use crate::routes::PageContext;
use crate::routes::cart::{DeliveryChoice, pickup_method};
use crate::routes::views::{AddressForm, AddressView, LocationDirectory, SelectOption};
use crate::services::{SelectionFlow, SubmitOutcome};
use crate::state::AppState;
use crate::stores::cart::{load_cart, save_cart};

/// Simulated payment processing time.
const PAYMENT_DELAY: Duration = Duration::from_secs(2);

/// Length of the random part of an order number.
const ORDER_NUMBER_LEN: usize = 8;

/// Query parameters for error display.
#[derive(Debug, Deserialize)]
pub struct CheckoutQuery {
    pub error: Option<String>,
}

/// Place order form data.
#[derive(Debug, Deserialize)]
pub struct PlaceOrderForm {
    pub method: DeliveryChoice,
    #[serde(default)]
    pub location_id: Option<String>,
}

/// Select address form data.
#[derive(Debug, Deserialize)]
pub struct SelectAddressForm {
    pub address_id: AddressId,
}

/// New address form data.
#[derive(Debug, Deserialize)]
pub struct NewAddressForm {
    #[serde(flatten)]
    pub address: AddressForm,
    /// Checkbox: save to the account.
    #[serde(default)]
    pub save: Option<String>,
    /// Set by the "use it anyway" button after an out-of-zone warning.
    #[serde(default)]
    pub confirmed: Option<String>,
}

/// A new address waiting for the shopper to confirm an out-of-zone warning.
#[derive(Clone)]
pub struct PendingAddress {
    pub form: AddressForm,
    pub save: bool,
    pub message: String,
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub page: PageContext,
    pub cart: Cart,
    pub pickup_totals: CartTotals,
    pub delivery_totals: Option<CartTotals>,
    pub delivery_zone_name: Option<String>,
    pub delivery_preferred: bool,
    pub addresses: Vec<AddressView>,
    pub selected_validation_message: Option<String>,
    pub creating: bool,
    pub pending: Option<PendingAddress>,
    pub blank_form: AddressForm,
    pub region_options: Vec<SelectOption>,
    pub city_options: Vec<SelectOption>,
    pub pickup_locations: Vec<PickupLocation>,
    pub selected_location: String,
    pub zones_loading: bool,
    pub loading_message: &'static str,
    pub error: Option<String>,
}

/// Order confirmation page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/complete.html")]
pub struct CheckoutCompleteTemplate {
    pub page: PageContext,
    pub order_number: String,
    pub cart: Cart,
    pub totals: CartTotals,
}

/// The delivery method a selection allows, if its address is in a zone.
fn delivery_for(report: &SelectionReport) -> Option<DeliveryMethod> {
    let validation = &report.validation_result;
    if !validation.is_valid {
        return None;
    }
    Some(DeliveryMethod::Delivery {
        zone_id: validation.delivery_zone_id.clone()?,
        zone_name: validation.delivery_zone_name.clone().unwrap_or_default(),
        fee: validation.delivery_zone_fee?,
    })
}

/// Error code for a delivery order that cannot go ahead.
fn undeliverable_code(report: Option<&SelectionReport>) -> &'static str {
    if report.is_some_and(|r| r.validation_result.is_pending()) {
        "zones_loading"
    } else {
        "delivery_unavailable"
    }
}

/// Order confirmation number, e.g. `TL-7K2Q9XAB`.
fn order_number() -> String {
    let suffix: String = rand::rng()
        .sample_iter(Alphanumeric)
        .take(ORDER_NUMBER_LEN)
        .map(char::from)
        .collect();
    format!("TL-{}", suffix.to_ascii_uppercase())
}

fn error_message(code: &str) -> String {
    match code {
        "delivery_unavailable" => {
            "We can't deliver to the selected address. Please choose a different address or select pickup instead."
        }
        "zones_loading" => "Delivery zones are still loading. Please try again in a moment.",
        "location" => "That pickup location is not available.",
        "address_incomplete" => "Please choose a region and city for the new address.",
        _ => "Something went wrong. Please try again.",
    }
    .to_string()
}

async fn render(
    state: &AppState,
    session: &Session,
    customer: CurrentCustomer,
    flow: &SelectionFlow,
    error: Option<String>,
    pending: Option<PendingAddress>,
) -> Result<Response> {
    let cart = load_cart(session).await;
    if cart.is_empty() {
        return Ok(Redirect::to("/cart").into_response());
    }

    let selector = flow.selector();
    let current = selector.current();
    let delivery = current.as_ref().and_then(delivery_for);
    let directory = LocationDirectory::load(state).await;

    let addresses = selector
        .addresses()
        .iter()
        .chain(selector.temp_address())
        .map(|address| {
            let mut view = AddressView::new(address, &directory);
            view.selected = current
                .as_ref()
                .is_some_and(|c| c.address_data.id == address.id);
            view.validation = selector.validation_for(&address.id).cloned();
            view
        })
        .collect();

    let pickup_locations = state.api().pickup_locations().await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to fetch pickup locations");
        Vec::new()
    });
    let selected_location = match &cart.delivery {
        DeliveryMethod::Pickup {
            location_id: Some(id),
        } => id.to_string(),
        _ => String::new(),
    };

    let template = CheckoutTemplate {
        page: PageContext::load(session, Some(customer)).await,
        pickup_totals: CartTotals::calculate(&cart.items, &DeliveryMethod::default()),
        delivery_totals: delivery
            .as_ref()
            .map(|method| CartTotals::calculate(&cart.items, method)),
        delivery_zone_name: current
            .as_ref()
            .and_then(|c| c.validation_result.delivery_zone_name.clone()),
        delivery_preferred: !cart.delivery.is_pickup() && delivery.is_some(),
        selected_validation_message: current.map(|c| c.validation_result.message),
        addresses,
        creating: selector.state() == SelectionState::CreatingNew,
        pending,
        blank_form: AddressForm::default(),
        region_options: directory.region_options(),
        city_options: directory.city_options(),
        pickup_locations,
        selected_location,
        zones_loading: state.zones().catalog().await.is_loading(),
        loading_message: MSG_LOADING,
        error,
        cart,
    };
    Ok(template.into_response())
}

/// Display the checkout page.
///
/// The default saved address is selected on first visit.
#[instrument(skip(state, session, customer))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(customer): RequireAuth,
    Query(query): Query<CheckoutQuery>,
) -> Result<Response> {
    if load_cart(&session).await.is_empty() {
        return Ok(Redirect::to("/cart").into_response());
    }

    let mut flow = SelectionFlow::load(&state, session.clone()).await?;
    if let Some(report) = flow.current().await?
        && !report.validation_result.is_valid
        && !report.validation_result.is_pending()
    {
        tracing::info!(
            address_id = %report.address_data.id,
            message = %report.validation_result.message,
            "Selected address has no delivery zone"
        );
    }

    let error = query.error.as_deref().map(error_message);
    render(&state, &session, customer, &flow, error, None).await
}

/// Select one of the listed addresses.
#[instrument(skip(state, session, _customer))]
pub async fn select_address(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(_customer): RequireAuth,
    Form(form): Form<SelectAddressForm>,
) -> Result<Redirect> {
    let mut flow = SelectionFlow::load(&state, session).await?;
    flow.select(&form.address_id).await?;
    Ok(Redirect::to("/checkout"))
}

/// Use a new address, optionally saving it to the account.
///
/// An address outside every zone is not rejected: the page asks the shopper
/// to confirm it or cancel.
#[instrument(skip(state, session, customer, form))]
pub async fn new_address(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(customer): RequireAuth,
    Form(form): Form<NewAddressForm>,
) -> Result<Response> {
    let draft = form.address.to_draft();
    if !draft.has_required_fields() {
        return Ok(Redirect::to("/checkout?error=address_incomplete").into_response());
    }

    let options = SubmitOptions {
        persist: form.save.is_some(),
        confirmed: form.confirmed.is_some(),
    };
    let mut flow = SelectionFlow::load(&state, session.clone()).await?;
    match flow.submit(draft, options).await? {
        SubmitOutcome::NeedsConfirmation { validation_result } => {
            let pending = PendingAddress {
                form: form.address,
                save: options.persist,
                message: validation_result.message,
            };
            render(&state, &session, customer, &flow, None, Some(pending)).await
        }
        SubmitOutcome::Selected(report) => {
            add_breadcrumb(
                "checkout",
                "New address selected",
                Some(&[("address_id", report.address_data.id.as_str())]),
            );
            Ok(Redirect::to("/checkout").into_response())
        }
    }
}

/// Open the new-address form.
#[instrument(skip(state, session, _customer))]
pub async fn open_new_address(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(_customer): RequireAuth,
) -> Result<Redirect> {
    let mut flow = SelectionFlow::load(&state, session).await?;
    flow.begin_create().await?;
    Ok(Redirect::to("/checkout"))
}

/// Close the new-address form.
#[instrument(skip(state, session, _customer))]
pub async fn cancel_new_address(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(_customer): RequireAuth,
) -> Result<Redirect> {
    let mut flow = SelectionFlow::load(&state, session).await?;
    flow.cancel_create().await?;
    Ok(Redirect::to("/checkout"))
}

/// Place the order.
///
/// Delivery needs a selected address inside a zone. Payment is simulated
/// and always succeeds.
#[instrument(skip(state, session, customer))]
pub async fn place_order(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(customer): RequireAuth,
    Form(form): Form<PlaceOrderForm>,
) -> Result<Response> {
    let mut cart = load_cart(&session).await;
    if cart.is_empty() {
        return Ok(Redirect::to("/cart").into_response());
    }

    let method = match form.method {
        DeliveryChoice::Pickup => match pickup_method(&state, form.location_id).await? {
            Some(method) => method,
            None => return Ok(Redirect::to("/checkout?error=location").into_response()),
        },
        DeliveryChoice::Delivery => {
            let mut flow = SelectionFlow::load(&state, session.clone()).await?;
            let report = flow.current().await?;
            if let Some(method) = report.as_ref().and_then(delivery_for) {
                method
            } else {
                let code = undeliverable_code(report.as_ref());
                tracing::info!(code, "Delivery requested without a deliverable address");
                return Ok(Redirect::to(&format!("/checkout?error={code}")).into_response());
            }
        }
    };
    cart.set_delivery(method);
    let totals = cart.totals();

    tracing::info!(total = %totals.total_price(), "Processing payment");
    tokio::time::sleep(PAYMENT_DELAY).await;

    let order_number = order_number();
    let placed = cart.clone();
    cart.clear();
    save_cart(&session, &cart).await?;

    tracing::info!(%order_number, "Order placed");
    add_breadcrumb(
        "checkout",
        "Order placed",
        Some(&[("order_number", order_number.as_str())]),
    );

    Ok(CheckoutCompleteTemplate {
        page: PageContext::load(&session, Some(customer)).await,
        order_number,
        cart: placed,
        totals,
    }
    .into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;
    use threadline_core::ZoneId;
    use threadline_core::delivery::ValidationResult;
    use threadline_core::location::AddressDraft;

    use super::*;

    fn report(validation_result: ValidationResult) -> SelectionReport {
        SelectionReport {
            address_data: AddressDraft::default().into_address(AddressId::temp()),
            validation_result,
        }
    }

    #[test]
    fn test_delivery_for_valid_selection() {
        let method = delivery_for(&report(ValidationResult {
            is_valid: true,
            message: "Delivery available in Accra".to_string(),
            delivery_zone_id: Some(ZoneId::new("z1")),
            delivery_zone_name: Some("Accra Central".to_string()),
            delivery_zone_fee: Some(dec!(15)),
        }))
        .unwrap();
        assert_eq!(method.shipping(), dec!(15));
        assert!(!method.is_pickup());
    }

    #[test]
    fn test_no_delivery_out_of_zone() {
        assert!(delivery_for(&report(ValidationResult::out_of_zone())).is_none());
    }

    #[test]
    fn test_undeliverable_code_distinguishes_loading_zones() {
        assert_eq!(
            undeliverable_code(Some(&report(ValidationResult::loading()))),
            "zones_loading"
        );
        assert_eq!(
            undeliverable_code(Some(&report(ValidationResult::out_of_zone()))),
            "delivery_unavailable"
        );
        assert_eq!(undeliverable_code(None), "delivery_unavailable");
    }

    #[test]
    fn test_order_number_shape() {
        let number = order_number();
        assert!(number.starts_with("TL-"));
        assert_eq!(number.len(), 3 + ORDER_NUMBER_LEN);
        assert!(
            number
                .chars()
                .skip(3)
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        );
    }
}
