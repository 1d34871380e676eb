//! Profile route handlers.
//!
//! All routes require a signed-in shopper. Address changes go straight to
//! the backend; the checkout selection picks them up on its next load.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use threadline_core::AddressId;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::CurrentCustomer;
use crate::routes::PageContext;
use crate::routes::views::{AddressForm, AddressView, LocationDirectory, SelectOption};
use crate::services::CustomerSession;
use crate::state::AppState;

const ADDRESSES_PATH: &str = "/profile/addresses";

/// Query parameters for notice/error display.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub notice: Option<String>,
    pub error: Option<String>,
}

/// Profile overview template.
#[derive(Template, WebTemplate)]
#[template(path = "profile/index.html")]
pub struct ProfileTemplate {
    pub page: PageContext,
    pub customer: CurrentCustomer,
    pub default_address: Option<AddressView>,
    pub address_count: usize,
}

/// Address book template.
#[derive(Template, WebTemplate)]
#[template(path = "profile/addresses.html")]
pub struct AddressesTemplate {
    pub page: PageContext,
    pub addresses: Vec<AddressView>,
    pub blank_form: AddressForm,
    pub region_options: Vec<SelectOption>,
    pub city_options: Vec<SelectOption>,
    pub notice: Option<String>,
    pub error: Option<String>,
}

/// Display the profile overview.
#[instrument(skip(state, session, customer))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(customer): RequireAuth,
) -> Result<impl IntoResponse> {
    let mut api = CustomerSession::load(state.api().clone(), session.clone()).await?;
    let addresses = api.addresses().await?;
    let directory = LocationDirectory::load(&state).await;

    let default_address = addresses
        .iter()
        .find(|address| address.is_default)
        .or_else(|| addresses.first())
        .map(|address| AddressView::new(address, &directory));

    Ok(ProfileTemplate {
        page: PageContext::load(&session, Some(customer.clone())).await,
        customer,
        default_address,
        address_count: addresses.len(),
    })
}

/// Display the address book.
#[instrument(skip(state, session, customer))]
pub async fn addresses(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(customer): RequireAuth,
    Query(query): Query<MessageQuery>,
) -> Result<impl IntoResponse> {
    let mut api = CustomerSession::load(state.api().clone(), session.clone()).await?;
    let directory = LocationDirectory::load(&state).await;
    let addresses = api
        .addresses()
        .await?
        .iter()
        .map(|address| AddressView::new(address, &directory))
        .collect();

    let notice = query.notice.as_deref().map(|code| {
        match code {
            "created" => "Address saved.",
            "updated" => "Address updated.",
            "deleted" => "Address deleted.",
            "default" => "Default address updated.",
            _ => "Done.",
        }
        .to_string()
    });
    let error = query.error.as_deref().map(|code| {
        match code {
            "incomplete" => "Please choose a region and city.",
            _ => "Something went wrong. Please try again.",
        }
        .to_string()
    });

    Ok(AddressesTemplate {
        page: PageContext::load(&session, Some(customer)).await,
        addresses,
        blank_form: AddressForm::default(),
        region_options: directory.region_options(),
        city_options: directory.city_options(),
        notice,
        error,
    })
}

fn back(query: &str) -> Redirect {
    Redirect::to(&format!("{ADDRESSES_PATH}?{query}"))
}

/// Create an address.
#[instrument(skip(state, session, _customer, form))]
pub async fn create_address(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(_customer): RequireAuth,
    Form(form): Form<AddressForm>,
) -> Result<Redirect> {
    let draft = form.to_draft();
    if !draft.has_required_fields() {
        return Ok(back("error=incomplete"));
    }

    let mut api = CustomerSession::load(state.api().clone(), session).await?;
    let created = api.create_address(&draft).await?;
    add_breadcrumb(
        "profile",
        "Address created",
        Some(&[("address_id", created.id.as_str())]),
    );
    Ok(back("notice=created"))
}

/// Update an address.
#[instrument(skip(state, session, _customer, form), fields(address_id = %id))]
pub async fn update_address(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(_customer): RequireAuth,
    Path(id): Path<AddressId>,
    Form(form): Form<AddressForm>,
) -> Result<Redirect> {
    let draft = form.to_draft();
    if !draft.has_required_fields() {
        return Ok(back("error=incomplete"));
    }

    let mut api = CustomerSession::load(state.api().clone(), session).await?;
    api.update_address(&id, &draft).await?;
    Ok(back("notice=updated"))
}

/// Delete an address.
#[instrument(skip(state, session, _customer), fields(address_id = %id))]
pub async fn delete_address(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(_customer): RequireAuth,
    Path(id): Path<AddressId>,
) -> Result<Redirect> {
    let mut api = CustomerSession::load(state.api().clone(), session).await?;
    api.delete_address(&id).await?;
    add_breadcrumb("profile", "Address deleted", Some(&[("address_id", id.as_str())]));
    Ok(back("notice=deleted"))
}

/// Make an address the default.
#[instrument(skip(state, session, _customer), fields(address_id = %id))]
pub async fn set_default_address(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(_customer): RequireAuth,
    Path(id): Path<AddressId>,
) -> Result<Redirect> {
    let mut api = CustomerSession::load(state.api().clone(), session).await?;
    api.set_default_address(&id).await?;
    Ok(back("notice=default"))
}
