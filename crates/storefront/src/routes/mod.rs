//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page
//! GET  /health                 - Health check (added in lib.rs)
//!
//! # Auth
//! GET  /login                  - Login page
//! POST /login                  - Login action (rate limited)
//! POST /logout                 - Logout action
//!
//! # Products
//! GET  /products               - Product listing (?category=&brand=)
//! GET  /products/{id}          - Product detail
//!
//! # Cart
//! GET  /cart                   - Cart page with totals
//! POST /cart/add               - Add to cart (requires auth)
//! POST /cart/update            - Change a line's quantity
//! POST /cart/remove            - Remove a line
//! POST /cart/delivery          - Choose pickup or a delivery zone
//!
//! # Checkout (requires auth)
//! GET  /checkout               - Address selection and order summary
//! POST /checkout               - Place the order
//! POST /checkout/address       - Select a saved address
//! POST /checkout/address/open  - Open the new-address form
//! POST /checkout/address/new   - Use a new address
//! POST /checkout/address/cancel - Leave the new-address form
//!
//! # Profile (requires auth)
//! GET  /profile                - Account overview
//! GET  /profile/addresses      - Address book
//! POST /profile/addresses      - Create address
//! POST /profile/addresses/{id} - Update address
//! POST /profile/addresses/{id}/delete  - Delete address
//! POST /profile/addresses/{id}/default - Make address the default
//!
//! # JSON API
//! GET  /api/products, /api/products/{id}, /api/brands, /api/categories
//! GET  /api/delivery-zones, /api/regions, /api/cities/{region_id}
//! GET  /api/pickup-locations
//! POST /api/delivery/validate
//! GET  /api/address-selection
//! POST /api/address-selection/select
//! POST /api/address-selection/begin
//! POST /api/address-selection/new
//! POST /api/address-selection/cancel
//! ```

pub mod api;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod home;
pub mod products;
pub mod profile;
pub mod views;

use axum::{
    Router,
    routing::{get, post},
};
use tower_sessions::Session;

use crate::middleware::login_rate_limiter;
use crate::models::CurrentCustomer;
use crate::state::AppState;
use crate::stores::cart::load_cart;

/// Header data every page needs.
#[derive(Clone)]
pub struct PageContext {
    pub customer: Option<CurrentCustomer>,
    pub cart_count: u32,
}

impl PageContext {
    /// Build the header data for the current visitor.
    pub async fn load(session: &Session, customer: Option<CurrentCustomer>) -> Self {
        let cart_count = load_cart(session).await.item_count();
        Self {
            customer,
            cart_count,
        }
    }
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page))
        .route("/login", post(auth::login).layer(login_rate_limiter()))
        .route("/logout", post(auth::logout))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/delivery", post(cart::delivery))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show).post(checkout::place_order))
        .route("/address", post(checkout::select_address))
        .route("/address/open", post(checkout::open_new_address))
        .route("/address/new", post(checkout::new_address))
        .route("/address/cancel", post(checkout::cancel_new_address))
}

/// Create the profile routes router.
pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(profile::index))
        .route(
            "/addresses",
            get(profile::addresses).post(profile::create_address),
        )
        .route("/addresses/{id}", post(profile::update_address))
        .route("/addresses/{id}/delete", post(profile::delete_address))
        .route("/addresses/{id}/default", post(profile::set_default_address))
}

/// Create the JSON API router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(api::catalog::products))
        .route("/products/{id}", get(api::catalog::product))
        .route("/brands", get(api::catalog::brands))
        .route("/categories", get(api::catalog::categories))
        .route("/delivery-zones", get(api::locations::delivery_zones))
        .route("/regions", get(api::locations::regions))
        .route("/cities/{region_id}", get(api::locations::cities))
        .route("/pickup-locations", get(api::locations::pickup_locations))
        .route("/delivery/validate", post(api::locations::validate_address))
        .route("/address-selection", get(api::selection::current))
        .route("/address-selection/select", post(api::selection::select))
        .route("/address-selection/begin", post(api::selection::begin))
        .route("/address-selection/new", post(api::selection::create))
        .route("/address-selection/cancel", post(api::selection::cancel))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Home page
        .route("/", get(home::home))
        // Login and logout
        .merge(auth_routes())
        // Catalog
        .nest("/products", product_routes())
        // Cart and checkout
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        // Account
        .nest("/profile", profile_routes())
        // JSON endpoints
        .nest("/api", api_routes())
}
