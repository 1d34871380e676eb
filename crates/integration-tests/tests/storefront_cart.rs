//! Adding to the cart and the totals shown on the cart page.

use httpmock::prelude::*;
use reqwest::StatusCode;
use serde_json::json;
use threadline_integration_tests::{TestApp, location};

async fn mock_catalog(backend: &MockServer) {
    backend
        .mock_async(|when, then| {
            when.method(GET).path("/api/products/p-1");
            then.status(200).json_body(json!({"data": {
                "id": "p-1",
                "name": "Kente Shirt",
                "price": 120
            }}));
        })
        .await;
    backend
        .mock_async(|when, then| {
            when.method(GET).path("/api/product-variants/product/p-1");
            then.status(200).json_body(json!([
                {"id": "v-1", "productId": "p-1", "size": "M", "stock": 3},
                {"id": "v-2", "productId": "p-1", "size": "L", "stock": 0}
            ]));
        })
        .await;
}

#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn test_add_to_cart_requires_login() {
    let backend = MockServer::start_async().await;
    let app = TestApp::spawn(&backend).await;

    let response = app
        .client
        .post(app.url("/cart/add"))
        .form(&[("product_id", "p-1"), ("variant_id", "v-1")])
        .send()
        .await
        .unwrap();
    assert_eq!(location(&response), "/login");

    // A post cannot be replayed, and without a referer the cart page is next
    assert_eq!(app.login().await, "/cart");
}

#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn test_add_to_cart_returns_to_referring_product_after_login() {
    let backend = MockServer::start_async().await;
    let app = TestApp::spawn(&backend).await;

    let response = app
        .client
        .post(app.url("/cart/add"))
        .header(reqwest::header::REFERER, app.url("/products/p-1"))
        .form(&[("product_id", "p-1"), ("variant_id", "v-1")])
        .send()
        .await
        .unwrap();
    assert_eq!(location(&response), "/login");
    assert_eq!(app.login().await, "/products/p-1");
}

#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn test_cart_totals_include_tax() {
    let backend = MockServer::start_async().await;
    mock_catalog(&backend).await;
    let app = TestApp::spawn(&backend).await;
    app.login().await;

    let response = app
        .client
        .post(app.url("/cart/add"))
        .form(&[("product_id", "p-1"), ("variant_id", "v-1"), ("quantity", "2")])
        .send()
        .await
        .unwrap();
    assert_eq!(location(&response), "/cart");

    let response = app.client.get(app.url("/cart")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let page = response.text().await.unwrap();
    assert!(page.contains("Kente Shirt"));
    // 2 x 120 plus 10% tax, pickup is free
    assert!(page.contains("240.00"));
    assert!(page.contains("24.00"));
    assert!(page.contains("264.00"));
}

#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn test_out_of_stock_variant_is_refused() {
    let backend = MockServer::start_async().await;
    mock_catalog(&backend).await;
    let app = TestApp::spawn(&backend).await;
    app.login().await;

    let response = app
        .client
        .post(app.url("/cart/add"))
        .form(&[("product_id", "p-1"), ("variant_id", "v-2")])
        .send()
        .await
        .unwrap();
    assert_eq!(location(&response), "/products/p-1?error=out_of_stock");

    let response = app
        .client
        .post(app.url("/cart/add"))
        .form(&[("product_id", "p-1")])
        .send()
        .await
        .unwrap();
    assert_eq!(location(&response), "/products/p-1?error=choose_variant");
}
