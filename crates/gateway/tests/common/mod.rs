//! Shared helpers for gateway integration tests.

#![allow(dead_code)]

use std::time::Duration;

use infra_gateway::{Gateway, GatewayConfig};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Token every test gateway authenticates with.
pub const TEST_TOKEN: &str = "test-token";

/// Base path the fake upstream serves its API under.
pub const API_PREFIX: &str = "/api/v1";

/// Gateway pointed at `server` with the given per-operation timeout.
pub fn gateway_with_timeout(server: &MockServer, timeout: Duration) -> Gateway {
    let config = GatewayConfig::new(&format!("{}{API_PREFIX}", server.uri()), TEST_TOKEN, timeout)
        .expect("valid test config");
    Gateway::from_config(config).expect("gateway")
}

/// Gateway pointed at `server` with a generous timeout.
pub fn gateway(server: &MockServer) -> Gateway {
    gateway_with_timeout(server, Duration::from_secs(5))
}

/// Mount a GET `endpoint` answering `status` with `body`.
pub async fn mount_get(server: &MockServer, endpoint: &str, status: u16, body: Value) {
    Mock::given(method("GET"))
        .and(path(format!("{API_PREFIX}{endpoint}")))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

/// Project `p1` with environments `e1` (id 10) and `e2` (id 20).
pub fn project_p1() -> Value {
    json!({
        "uuid": "p1",
        "name": "shop",
        "description": "Storefront",
        "environments": [
            { "id": 10, "uuid": "e1", "name": "production" },
            { "id": 20, "uuid": "e2", "name": "staging" }
        ]
    })
}

/// Flat resource entry.
pub fn resource(uuid: &str, environment_id: i64, resource_type: &str) -> Value {
    json!({
        "uuid": uuid,
        "name": format!("{uuid}-name"),
        "status": "running:healthy",
        "type": resource_type,
        "environment_id": environment_id
    })
}
