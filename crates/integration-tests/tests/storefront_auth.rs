//! Login, logout and the post-login redirect round trip.

use httpmock::MockServer;
use reqwest::StatusCode;
use threadline_integration_tests::{DEMO_EMAIL, TestApp, location};

#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn test_checkout_redirects_through_login_and_back() {
    let backend = MockServer::start_async().await;
    let app = TestApp::spawn(&backend).await;

    let response = app.client.get(app.url("/checkout")).send().await.unwrap();
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/login");

    let page = app
        .client
        .get(app.url("/login"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("Sign in to complete your checkout."));

    assert_eq!(app.login().await, "/checkout");

    // The pending redirect was consumed by the first login
    assert_eq!(app.login().await, "/");
}

#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn test_wrong_password_is_rejected() {
    let backend = MockServer::start_async().await;
    let app = TestApp::spawn(&backend).await;

    let response = app
        .client
        .post(app.url("/login"))
        .form(&[("email", DEMO_EMAIL), ("password", "not-the-password")])
        .send()
        .await
        .unwrap();
    assert_eq!(location(&response), "/login?error=credentials");

    let response = app.client.get(app.url("/profile")).send().await.unwrap();
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn test_api_requires_a_session() {
    let backend = MockServer::start_async().await;
    let app = TestApp::spawn(&backend).await;

    let response = app
        .client
        .get(app.url("/api/address-selection"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn test_logout_signs_out() {
    let backend = MockServer::start_async().await;
    let app = TestApp::spawn(&backend).await;

    assert_eq!(app.login().await, "/");
    let response = app.client.get(app.url("/login")).send().await.unwrap();
    assert_eq!(location(&response), "/");

    let response = app.client.post(app.url("/logout")).send().await.unwrap();
    assert_eq!(location(&response), "/");

    let response = app.client.get(app.url("/login")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
