//! HTTP surface tests: the router runs on a random port in front of a fake
//! upstream.

mod common;

use std::net::SocketAddr;

use common::{gateway, mount_get, project_p1, resource};
use infra_gateway::server::build_router;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Start the gateway router on a random port.
async fn start_gateway(upstream: &MockServer) -> SocketAddr {
    let app = build_router(gateway(upstream));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    addr
}

#[tokio::test]
async fn test_health() {
    let upstream = MockServer::start().await;
    let addr = start_gateway(&upstream).await;

    let body: Value = reqwest::get(format!("http://{addr}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body, json!({ "status": "healthy" }));
}

#[tokio::test]
async fn test_project_resources_route() {
    let upstream = MockServer::start().await;
    mount_get(&upstream, "/projects/p1", 200, project_p1()).await;
    mount_get(
        &upstream,
        "/resources",
        200,
        json!([resource("a1", 10, "application"), resource("pg", 20, "postgresql")]),
    )
    .await;
    let addr = start_gateway(&upstream).await;

    let response = reqwest::get(format!(
        "http://{addr}/api/infrastructure/projects/p1/resources"
    ))
    .await
    .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["environments"][0]["applications"][0]["uuid"], "a1");
    assert_eq!(body["environments"][1]["databases"][0]["uuid"], "pg");
    assert_eq!(body["environments"][1]["applications"], json!([]));
}

#[tokio::test]
async fn test_upstream_failure_becomes_envelope() {
    let upstream = MockServer::start().await;
    mount_get(&upstream, "/servers", 503, json!({ "message": "maintenance" })).await;
    let addr = start_gateway(&upstream).await;

    let response = reqwest::get(format!("http://{addr}/api/infrastructure/servers"))
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 500);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Failed to fetch servers");
    assert!(body["details"].as_str().unwrap().contains("503"));
}

#[tokio::test]
async fn test_lifecycle_route_forwards_command() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/applications/a1/deploy"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "queued" })))
        .expect(1)
        .mount(&upstream)
        .await;
    let addr = start_gateway(&upstream).await;

    let response = reqwest::Client::new()
        .post(format!(
            "http://{addr}/api/infrastructure/applications/a1/deploy"
        ))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "message": "queued" }));
}

#[tokio::test]
async fn test_deploy_on_database_is_not_a_route() {
    let upstream = MockServer::start().await;
    let addr = start_gateway(&upstream).await;

    let response = reqwest::Client::new()
        .post(format!(
            "http://{addr}/api/infrastructure/databases/d1/deploy"
        ))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Unsupported action 'deploy' for database");
    assert!(upstream.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_application_action_is_not_a_route() {
    let upstream = MockServer::start().await;
    let addr = start_gateway(&upstream).await;

    let response = reqwest::Client::new()
        .post(format!(
            "http://{addr}/api/infrastructure/applications/a1/reboot"
        ))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Unsupported action 'reboot' for application");
    assert!(upstream.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_all_resources_route_with_failed_leg() {
    let upstream = MockServer::start().await;
    mount_get(&upstream, "/applications", 200, json!([{ "uuid": "a1" }])).await;
    mount_get(&upstream, "/databases", 200, json!([{ "uuid": "d1" }])).await;
    mount_get(&upstream, "/services", 500, json!({ "message": "boom" })).await;
    let addr = start_gateway(&upstream).await;

    let response = reqwest::get(format!("http://{addr}/api/infrastructure/resources/all"))
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["applications"].as_array().unwrap().len(), 1);
    assert_eq!(body["databases"].as_array().unwrap().len(), 1);
    assert_eq!(body["services"], json!([]));
}
