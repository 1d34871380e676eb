//! Integration tests for the Threadline storefront.
//!
//! Each test starts the storefront router on an ephemeral port, pointed at an
//! `httpmock` server standing in for the Threadline backend, and drives it
//! with a cookie-keeping `reqwest` client.
//!
//! ```bash
//! cargo test -p threadline-integration-tests
//! ```

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use httpmock::MockServer;
use reqwest::Client;
use reqwest::redirect::Policy;
use secrecy::SecretString;
use threadline_core::Email;
use threadline_storefront::config::{ApiConfig, DemoLogin, StorefrontConfig};
use threadline_storefront::state::AppState;
use url::Url;

/// Email accepted by the test storefront's login form.
pub const DEMO_EMAIL: &str = "shopper@threadline.test";

/// Password accepted by the test storefront's login form.
pub const DEMO_PASSWORD: &str = "kente-4-life";

/// Storefront configuration talking to `backend`.
///
/// # Panics
///
/// Panics if the mock server URL or the demo email cannot be parsed.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn test_config(backend: &MockServer) -> StorefrontConfig {
    StorefrontConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        base_url: "http://localhost".to_string(),
        session_secret: SecretString::from(
            "q8Vt2mZr5Lx9Nc4Wb7Hy1Kd6Pf3Js0Ga8Ue5Ro2Ti7Ye4Mw9Qx1Zn6Bv3Lc8Dh5Fk0",
        ),
        api: ApiConfig {
            base_url: Url::parse(&format!("{}/api/", backend.base_url())).unwrap(),
            timeout: Duration::from_secs(5),
            access_token: SecretString::from("access-1"),
            refresh_token: SecretString::from("refresh-1"),
        },
        demo_login: DemoLogin {
            email: Email::parse(DEMO_EMAIL).unwrap(),
            password: SecretString::from(DEMO_PASSWORD),
        },
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// A running storefront and a client that keeps its session cookie.
pub struct TestApp {
    pub address: SocketAddr,
    pub client: Client,
}

impl TestApp {
    /// Start the storefront against `backend`.
    ///
    /// # Panics
    ///
    /// Panics if the server cannot be started.
    #[allow(clippy::unwrap_used)]
    pub async fn spawn(backend: &MockServer) -> Self {
        let state = AppState::new(test_config(backend)).unwrap();
        let app = threadline_storefront::app(state).unwrap();

        let listener = tokio::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
            .await
            .unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .unwrap();
        });

        let client = Client::builder()
            .cookie_store(true)
            .redirect(Policy::none())
            .build()
            .unwrap();

        Self { address, client }
    }

    /// Absolute URL for a storefront path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.address)
    }

    /// Sign in with the demo account and return the redirect target.
    ///
    /// # Panics
    ///
    /// Panics if the request fails or the response is not a redirect.
    #[allow(clippy::unwrap_used)]
    pub async fn login(&self) -> String {
        let response = self
            .client
            .post(self.url("/login"))
            .form(&[("email", DEMO_EMAIL), ("password", DEMO_PASSWORD)])
            .send()
            .await
            .unwrap();
        assert!(response.status().is_redirection());
        location(&response)
    }
}

/// The `Location` header of a redirect.
///
/// # Panics
///
/// Panics if the header is missing.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn location(response: &reqwest::Response) -> String {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string()
}
