mod common;

use axum::http::StatusCode;
use crud_service::core::response::HealthResponse;

use common::test_server;

#[tokio::test]
async fn test_health_reports_connected_store() {
    let (server, _) = test_server();

    let response = server.get("/health").await;
    response.assert_status_ok();
    let body: HealthResponse = response.json();
    assert_eq!(body, HealthResponse::connected());
    assert_eq!(body.status, "OK");
    assert_eq!(body.database, "connected");
}

#[tokio::test]
async fn test_health_reports_unreachable_store_as_server_error() {
    let (server, store) = test_server();
    store.set_available(false);

    let response = server.get("/health").await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: HealthResponse = response.json();
    assert_eq!(body, HealthResponse::disconnected());
}

#[tokio::test]
async fn test_health_recovers_with_store() {
    let (server, store) = test_server();

    store.set_available(false);
    server
        .get("/health")
        .await
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR);

    store.set_available(true);
    server.get("/health").await.assert_status_ok();
}
