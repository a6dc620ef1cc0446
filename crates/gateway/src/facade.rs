//! Named gateway operations and their error envelope.
//!
//! This is the only layer that turns [`GatewayError`]s into user-facing
//! failures. Every operation gets its own deadline from the configured
//! request timeout.

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{error, instrument};

use crate::assembler::Assembler;
use crate::catalog::Catalog;
use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::lifecycle::{LifecycleCommand, LifecycleController, PowerAction};
use crate::models::{
    AllResources, Application, Database, Deployment, Project, Resource, ResourceCategory, Server,
    Service,
};
use crate::transport::{Deadline, HttpTransport, Transport};

/// Failure reported to gateway callers.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct FacadeError {
    /// HTTP status for the envelope.
    pub status: StatusCode,
    /// Operation-scoped message, e.g. "Failed to fetch project".
    pub message: String,
    /// Underlying error message, when there is one.
    pub details: Option<String>,
}

/// JSON body of a failed gateway response.
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    /// Operation-scoped message.
    pub error: String,
    /// Underlying error message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl FacadeError {
    /// Closure mapping a [`GatewayError`] to a 500 with `message`.
    fn wrap(message: &'static str) -> impl FnOnce(GatewayError) -> Self {
        move |e| {
            error!(error = %e, "{message}");
            Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: message.to_string(),
                details: Some(e.to_string()),
            }
        }
    }

    /// 404 for routes addressing a command that does not exist.
    #[must_use]
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
            details: None,
        }
    }
}

impl IntoResponse for FacadeError {
    fn into_response(self) -> Response {
        let body = ErrorEnvelope {
            error: self.message,
            details: self.details,
        };
        (self.status, Json(body)).into_response()
    }
}

/// Result of a gateway operation.
pub type FacadeResult<T> = Result<T, FacadeError>;

/// The gateway's callable surface.
#[derive(Clone)]
pub struct Gateway {
    catalog: Catalog,
    assembler: Assembler,
    lifecycle: LifecycleController,
    request_timeout: Duration,
}

impl Gateway {
    /// Create a gateway over any transport.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, request_timeout: Duration) -> Self {
        let catalog = Catalog::new(Arc::clone(&transport));
        Self {
            assembler: Assembler::new(catalog.clone()),
            lifecycle: LifecycleController::new(transport),
            catalog,
            request_timeout,
        }
    }

    /// Create a gateway talking HTTP to the configured upstream.
    ///
    /// # Errors
    /// Returns error if HTTP client cannot be created.
    pub fn from_config(config: GatewayConfig) -> Result<Self, GatewayError> {
        let request_timeout = config.request_timeout;
        let transport = HttpTransport::new(config)?;
        Ok(Self::new(Arc::new(transport), request_timeout))
    }

    fn deadline(&self) -> Deadline {
        Deadline::after(self.request_timeout)
    }

    // =========================================================================
    // Projects
    // =========================================================================

    /// List projects.
    ///
    /// # Errors
    /// 500 envelope on any upstream failure.
    #[instrument(skip(self))]
    pub async fn list_projects(&self) -> FacadeResult<Vec<Project>> {
        self.catalog
            .list_projects(self.deadline())
            .await
            .map_err(FacadeError::wrap("Failed to fetch projects"))
    }

    /// Get one project as returned upstream.
    ///
    /// # Errors
    /// 500 envelope on any upstream failure.
    #[instrument(skip(self))]
    pub async fn get_project(&self, uuid: &str) -> FacadeResult<Project> {
        self.catalog
            .get_project(uuid, self.deadline())
            .await
            .map_err(FacadeError::wrap("Failed to fetch project"))
    }

    /// Project with resources attached to each environment.
    ///
    /// # Errors
    /// 500 envelope when the project detail cannot be fetched.
    #[instrument(skip(self))]
    pub async fn get_project_with_resources(&self, uuid: &str) -> FacadeResult<Project> {
        self.assembler
            .get_project_with_resources(uuid, self.deadline())
            .await
            .map_err(FacadeError::wrap("Failed to fetch project resources"))
    }

    // =========================================================================
    // Servers
    // =========================================================================

    /// List servers.
    ///
    /// # Errors
    /// 500 envelope on any upstream failure.
    #[instrument(skip(self))]
    pub async fn list_servers(&self) -> FacadeResult<Vec<Server>> {
        self.catalog
            .list_servers(self.deadline())
            .await
            .map_err(FacadeError::wrap("Failed to fetch servers"))
    }

    /// Get one server.
    ///
    /// # Errors
    /// 500 envelope on any upstream failure.
    #[instrument(skip(self))]
    pub async fn get_server(&self, uuid: &str) -> FacadeResult<Server> {
        self.catalog
            .get_server(uuid, self.deadline())
            .await
            .map_err(FacadeError::wrap("Failed to fetch server"))
    }

    /// Resources deployed on one server.
    ///
    /// # Errors
    /// 500 envelope on any upstream failure.
    #[instrument(skip(self))]
    pub async fn get_server_resources(&self, uuid: &str) -> FacadeResult<Vec<Resource>> {
        self.catalog
            .get_server_resources(uuid, self.deadline())
            .await
            .map_err(FacadeError::wrap("Failed to fetch server resources"))
    }

    // =========================================================================
    // Resources
    // =========================================================================

    /// Flat resource collection.
    ///
    /// # Errors
    /// 500 envelope on any upstream failure.
    #[instrument(skip(self))]
    pub async fn list_resources(&self) -> FacadeResult<Vec<Resource>> {
        self.catalog
            .list_resources(self.deadline())
            .await
            .map_err(FacadeError::wrap("Failed to fetch resources"))
    }

    /// Applications, databases and services, each degraded independently.
    ///
    /// # Errors
    /// 500 envelope if a required leg fails.
    #[instrument(skip(self))]
    pub async fn get_all_resources(&self) -> FacadeResult<AllResources> {
        self.assembler
            .get_all_resources(self.deadline())
            .await
            .map_err(FacadeError::wrap("Failed to fetch all resources"))
    }

    // =========================================================================
    // Applications
    // =========================================================================

    /// List applications.
    ///
    /// # Errors
    /// 500 envelope on any upstream failure.
    #[instrument(skip(self))]
    pub async fn list_applications(&self) -> FacadeResult<Vec<Application>> {
        self.catalog
            .list_applications(self.deadline())
            .await
            .map_err(FacadeError::wrap("Failed to fetch applications"))
    }

    /// Get one application.
    ///
    /// # Errors
    /// 500 envelope on any upstream failure.
    #[instrument(skip(self))]
    pub async fn get_application(&self, uuid: &str) -> FacadeResult<Application> {
        self.catalog
            .get_application(uuid, self.deadline())
            .await
            .map_err(FacadeError::wrap("Failed to fetch application"))
    }

    /// Start an application.
    ///
    /// # Errors
    /// 500 envelope on any upstream failure.
    pub async fn start_application(&self, uuid: &str) -> FacadeResult<Value> {
        self.power(
            ResourceCategory::Application,
            PowerAction::Start,
            uuid,
            "Failed to start application",
        )
        .await
    }

    /// Stop an application.
    ///
    /// # Errors
    /// 500 envelope on any upstream failure.
    pub async fn stop_application(&self, uuid: &str) -> FacadeResult<Value> {
        self.power(
            ResourceCategory::Application,
            PowerAction::Stop,
            uuid,
            "Failed to stop application",
        )
        .await
    }

    /// Restart an application.
    ///
    /// # Errors
    /// 500 envelope on any upstream failure.
    pub async fn restart_application(&self, uuid: &str) -> FacadeResult<Value> {
        self.power(
            ResourceCategory::Application,
            PowerAction::Restart,
            uuid,
            "Failed to restart application",
        )
        .await
    }

    /// Deploy an application.
    ///
    /// # Errors
    /// 500 envelope on any upstream failure.
    #[instrument(skip(self))]
    pub async fn deploy_application(&self, uuid: &str) -> FacadeResult<Value> {
        self.lifecycle
            .deploy_application(uuid, self.deadline())
            .await
            .map_err(FacadeError::wrap("Failed to deploy application"))
    }

    // =========================================================================
    // Databases
    // =========================================================================

    /// List databases.
    ///
    /// # Errors
    /// 500 envelope on any upstream failure.
    #[instrument(skip(self))]
    pub async fn list_databases(&self) -> FacadeResult<Vec<Database>> {
        self.catalog
            .list_databases(self.deadline())
            .await
            .map_err(FacadeError::wrap("Failed to fetch databases"))
    }

    /// Get one database.
    ///
    /// # Errors
    /// 500 envelope on any upstream failure.
    #[instrument(skip(self))]
    pub async fn get_database(&self, uuid: &str) -> FacadeResult<Database> {
        self.catalog
            .get_database(uuid, self.deadline())
            .await
            .map_err(FacadeError::wrap("Failed to fetch database"))
    }

    /// Start a database.
    ///
    /// # Errors
    /// 500 envelope on any upstream failure.
    pub async fn start_database(&self, uuid: &str) -> FacadeResult<Value> {
        self.power(ResourceCategory::Database, PowerAction::Start, uuid, "Failed to start database")
            .await
    }

    /// Stop a database.
    ///
    /// # Errors
    /// 500 envelope on any upstream failure.
    pub async fn stop_database(&self, uuid: &str) -> FacadeResult<Value> {
        self.power(ResourceCategory::Database, PowerAction::Stop, uuid, "Failed to stop database")
            .await
    }

    /// Restart a database.
    ///
    /// # Errors
    /// 500 envelope on any upstream failure.
    pub async fn restart_database(&self, uuid: &str) -> FacadeResult<Value> {
        self.power(
            ResourceCategory::Database,
            PowerAction::Restart,
            uuid,
            "Failed to restart database",
        )
        .await
    }

    // =========================================================================
    // Services
    // =========================================================================

    /// List services.
    ///
    /// # Errors
    /// 500 envelope on any upstream failure.
    #[instrument(skip(self))]
    pub async fn list_services(&self) -> FacadeResult<Vec<Service>> {
        self.catalog
            .list_services(self.deadline())
            .await
            .map_err(FacadeError::wrap("Failed to fetch services"))
    }

    /// Get one service.
    ///
    /// # Errors
    /// 500 envelope on any upstream failure.
    #[instrument(skip(self))]
    pub async fn get_service(&self, uuid: &str) -> FacadeResult<Service> {
        self.catalog
            .get_service(uuid, self.deadline())
            .await
            .map_err(FacadeError::wrap("Failed to fetch service"))
    }

    /// Start a service.
    ///
    /// # Errors
    /// 500 envelope on any upstream failure.
    pub async fn start_service(&self, uuid: &str) -> FacadeResult<Value> {
        self.power(ResourceCategory::Service, PowerAction::Start, uuid, "Failed to start service")
            .await
    }

    /// Stop a service.
    ///
    /// # Errors
    /// 500 envelope on any upstream failure.
    pub async fn stop_service(&self, uuid: &str) -> FacadeResult<Value> {
        self.power(ResourceCategory::Service, PowerAction::Stop, uuid, "Failed to stop service")
            .await
    }

    /// Restart a service.
    ///
    /// # Errors
    /// 500 envelope on any upstream failure.
    pub async fn restart_service(&self, uuid: &str) -> FacadeResult<Value> {
        self.power(
            ResourceCategory::Service,
            PowerAction::Restart,
            uuid,
            "Failed to restart service",
        )
        .await
    }

    // =========================================================================
    // Deployments
    // =========================================================================

    /// List deployments.
    ///
    /// # Errors
    /// 500 envelope on any upstream failure.
    #[instrument(skip(self))]
    pub async fn list_deployments(&self) -> FacadeResult<Vec<Deployment>> {
        self.catalog
            .list_deployments(self.deadline())
            .await
            .map_err(FacadeError::wrap("Failed to fetch deployments"))
    }

    /// Get one deployment.
    ///
    /// # Errors
    /// 500 envelope on any upstream failure.
    #[instrument(skip(self))]
    pub async fn get_deployment(&self, uuid: &str) -> FacadeResult<Deployment> {
        self.catalog
            .get_deployment(uuid, self.deadline())
            .await
            .map_err(FacadeError::wrap("Failed to fetch deployment"))
    }

    // =========================================================================
    // Generic lifecycle dispatch
    // =========================================================================

    /// Run a parsed lifecycle command. Used by the HTTP surface and the CLI.
    ///
    /// # Errors
    /// 500 envelope on any upstream failure.
    pub async fn run_lifecycle(
        &self,
        command: LifecycleCommand,
        uuid: &str,
    ) -> FacadeResult<Value> {
        match command {
            LifecycleCommand::DeployApplication => self.deploy_application(uuid).await,
            LifecycleCommand::Power(kind, action) => match (kind, action) {
                (ResourceCategory::Application, PowerAction::Start) => {
                    self.start_application(uuid).await
                }
                (ResourceCategory::Application, PowerAction::Stop) => {
                    self.stop_application(uuid).await
                }
                (ResourceCategory::Application, PowerAction::Restart) => {
                    self.restart_application(uuid).await
                }
                (ResourceCategory::Database, PowerAction::Start) => self.start_database(uuid).await,
                (ResourceCategory::Database, PowerAction::Stop) => self.stop_database(uuid).await,
                (ResourceCategory::Database, PowerAction::Restart) => {
                    self.restart_database(uuid).await
                }
                (ResourceCategory::Service, PowerAction::Start) => self.start_service(uuid).await,
                (ResourceCategory::Service, PowerAction::Stop) => self.stop_service(uuid).await,
                (ResourceCategory::Service, PowerAction::Restart) => {
                    self.restart_service(uuid).await
                }
            },
        }
    }

    #[instrument(skip(self, message))]
    async fn power(
        &self,
        kind: ResourceCategory,
        action: PowerAction,
        uuid: &str,
        message: &'static str,
    ) -> FacadeResult<Value> {
        self.lifecycle
            .power(kind, action, uuid, self.deadline())
            .await
            .map_err(FacadeError::wrap(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_builds_500_with_details() {
        let err = FacadeError::wrap("Failed to fetch project")(GatewayError::UpstreamHttp {
            status: 404,
            body: "Project not found".to_string(),
        });
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "Failed to fetch project");
        assert_eq!(
            err.details.as_deref(),
            Some("Upstream returned 404: Project not found")
        );
    }

    #[test]
    fn test_envelope_shape() {
        let envelope = ErrorEnvelope {
            error: "Failed to fetch servers".to_string(),
            details: None,
        };
        let value = serde_json::to_value(envelope).unwrap();
        assert_eq!(value, serde_json::json!({ "error": "Failed to fetch servers" }));
    }
}
