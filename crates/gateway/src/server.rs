//! HTTP surface for the gateway.

use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::facade::{FacadeError, FacadeResult, Gateway};
use crate::lifecycle::LifecycleCommand;
use crate::models::{
    AllResources, Application, Database, Deployment, Project, Resource, ResourceCategory, Server,
    Service,
};

/// Build the HTTP router over a gateway.
pub fn build_router(gateway: Gateway) -> Router {
    Router::new()
        .route("/health", get(health_check))
        // Projects
        .route("/api/infrastructure/projects", get(list_projects))
        .route("/api/infrastructure/projects/{uuid}", get(get_project))
        .route(
            "/api/infrastructure/projects/{uuid}/resources",
            get(get_project_with_resources),
        )
        // Servers
        .route("/api/infrastructure/servers", get(list_servers))
        .route("/api/infrastructure/servers/{uuid}", get(get_server))
        .route(
            "/api/infrastructure/servers/{uuid}/resources",
            get(get_server_resources),
        )
        // Resources
        .route("/api/infrastructure/resources", get(list_resources))
        .route("/api/infrastructure/resources/all", get(get_all_resources))
        .route("/api/infrastructure/applications", get(list_applications))
        .route(
            "/api/infrastructure/applications/{uuid}",
            get(get_application),
        )
        .route(
            "/api/infrastructure/applications/{uuid}/{action}",
            post(application_action),
        )
        .route("/api/infrastructure/databases", get(list_databases))
        .route("/api/infrastructure/databases/{uuid}", get(get_database))
        .route(
            "/api/infrastructure/databases/{uuid}/{action}",
            post(database_action),
        )
        .route("/api/infrastructure/services", get(list_services))
        .route("/api/infrastructure/services/{uuid}", get(get_service))
        .route(
            "/api/infrastructure/services/{uuid}/{action}",
            post(service_action),
        )
        // Deployments
        .route("/api/infrastructure/deployments", get(list_deployments))
        .route(
            "/api/infrastructure/deployments/{uuid}",
            get(get_deployment),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(gateway)
}

/// Health check endpoint.
async fn health_check() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

async fn list_projects(State(gateway): State<Gateway>) -> FacadeResult<Json<Vec<Project>>> {
    gateway.list_projects().await.map(Json)
}

async fn get_project(
    State(gateway): State<Gateway>,
    Path(uuid): Path<String>,
) -> FacadeResult<Json<Project>> {
    gateway.get_project(&uuid).await.map(Json)
}

async fn get_project_with_resources(
    State(gateway): State<Gateway>,
    Path(uuid): Path<String>,
) -> FacadeResult<Json<Project>> {
    gateway.get_project_with_resources(&uuid).await.map(Json)
}

async fn list_servers(State(gateway): State<Gateway>) -> FacadeResult<Json<Vec<Server>>> {
    gateway.list_servers().await.map(Json)
}

async fn get_server(
    State(gateway): State<Gateway>,
    Path(uuid): Path<String>,
) -> FacadeResult<Json<Server>> {
    gateway.get_server(&uuid).await.map(Json)
}

async fn get_server_resources(
    State(gateway): State<Gateway>,
    Path(uuid): Path<String>,
) -> FacadeResult<Json<Vec<Resource>>> {
    gateway.get_server_resources(&uuid).await.map(Json)
}

async fn list_resources(State(gateway): State<Gateway>) -> FacadeResult<Json<Vec<Resource>>> {
    gateway.list_resources().await.map(Json)
}

async fn get_all_resources(State(gateway): State<Gateway>) -> FacadeResult<Json<AllResources>> {
    gateway.get_all_resources().await.map(Json)
}

async fn list_applications(
    State(gateway): State<Gateway>,
) -> FacadeResult<Json<Vec<Application>>> {
    gateway.list_applications().await.map(Json)
}

async fn get_application(
    State(gateway): State<Gateway>,
    Path(uuid): Path<String>,
) -> FacadeResult<Json<Application>> {
    gateway.get_application(&uuid).await.map(Json)
}

async fn list_databases(State(gateway): State<Gateway>) -> FacadeResult<Json<Vec<Database>>> {
    gateway.list_databases().await.map(Json)
}

async fn get_database(
    State(gateway): State<Gateway>,
    Path(uuid): Path<String>,
) -> FacadeResult<Json<Database>> {
    gateway.get_database(&uuid).await.map(Json)
}

async fn list_services(State(gateway): State<Gateway>) -> FacadeResult<Json<Vec<Service>>> {
    gateway.list_services().await.map(Json)
}

async fn get_service(
    State(gateway): State<Gateway>,
    Path(uuid): Path<String>,
) -> FacadeResult<Json<Service>> {
    gateway.get_service(&uuid).await.map(Json)
}

async fn list_deployments(State(gateway): State<Gateway>) -> FacadeResult<Json<Vec<Deployment>>> {
    gateway.list_deployments().await.map(Json)
}

async fn get_deployment(
    State(gateway): State<Gateway>,
    Path(uuid): Path<String>,
) -> FacadeResult<Json<Deployment>> {
    gateway.get_deployment(&uuid).await.map(Json)
}

async fn application_action(
    State(gateway): State<Gateway>,
    Path((uuid, action)): Path<(String, String)>,
) -> FacadeResult<Json<Value>> {
    run_action(&gateway, ResourceCategory::Application, &uuid, &action).await
}

async fn database_action(
    State(gateway): State<Gateway>,
    Path((uuid, action)): Path<(String, String)>,
) -> FacadeResult<Json<Value>> {
    run_action(&gateway, ResourceCategory::Database, &uuid, &action).await
}

async fn service_action(
    State(gateway): State<Gateway>,
    Path((uuid, action)): Path<(String, String)>,
) -> FacadeResult<Json<Value>> {
    run_action(&gateway, ResourceCategory::Service, &uuid, &action).await
}

async fn run_action(
    gateway: &Gateway,
    kind: ResourceCategory,
    uuid: &str,
    action: &str,
) -> FacadeResult<Json<Value>> {
    let Some(command) = LifecycleCommand::parse(kind, action) else {
        debug!(%kind, action, "Unsupported lifecycle action");
        return Err(FacadeError::unsupported(format!(
            "Unsupported action '{action}' for {kind}"
        )));
    };

    gateway.run_lifecycle(command, uuid).await.map(Json)
}
