//! Health and readiness endpoints.

use httpmock::prelude::*;
use reqwest::StatusCode;
use serde_json::json;
use threadline_integration_tests::TestApp;

#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn test_health_is_ok() {
    let backend = MockServer::start_async().await;
    let app = TestApp::spawn(&backend).await;

    let response = app.client.get(app.url("/health")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(response.text().await.unwrap(), "ok");
}

#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn test_ready_waits_for_delivery_zones() {
    let backend = MockServer::start_async().await;
    let app = TestApp::spawn(&backend).await;

    let mut failing = backend
        .mock_async(|when, then| {
            when.method(GET).path("/api/delivery-zones");
            then.status(503);
        })
        .await;
    let response = app.client.get(app.url("/health/ready")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    failing.delete_async().await;

    backend
        .mock_async(|when, then| {
            when.method(GET).path("/api/delivery-zones");
            then.status(200).json_body(json!({"data": [{
                "id": "z1",
                "name": "Accra Central",
                "deliveryFee": 15,
                "isActive": true,
                "priority": 1,
                "structuredAreas": [{"regionId": 1, "cityId": 5}]
            }]}));
        })
        .await;
    let response = app.client.get(app.url("/health/ready")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
