//! Read operations, one per upstream collection.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::error::GatewayError;
use crate::models::{Application, Database, Deployment, Project, Resource, Server, Service};
use crate::transport::{Deadline, Transport, UpstreamCall};

/// Build `/{collection}/{uuid}[/{action}]`, rejecting identifiers that would
/// escape their path segment.
pub(crate) fn item_path(
    collection: &str,
    uuid: &str,
    action: Option<&str>,
) -> Result<String, GatewayError> {
    let valid = !uuid.is_empty()
        && uuid != "."
        && uuid != ".."
        && !uuid.contains(['/', '\\', '?', '#', '%'])
        && !uuid.chars().any(char::is_whitespace);
    if !valid {
        return Err(GatewayError::InvalidIdentifier(uuid.to_string()));
    }

    Ok(match action {
        Some(action) => format!("/{collection}/{uuid}/{action}"),
        None => format!("/{collection}/{uuid}"),
    })
}

/// Typed read access to the upstream collections.
#[derive(Clone)]
pub struct Catalog {
    transport: Arc<dyn Transport>,
}

impl Catalog {
    /// Create a catalog over the given transport.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// GET `path` and narrow the JSON into `T`.
    async fn fetch<T: DeserializeOwned>(
        &self,
        path: String,
        deadline: Deadline,
    ) -> Result<T, GatewayError> {
        let value = self
            .transport
            .request(UpstreamCall::get(path.clone(), deadline))
            .await?;

        serde_json::from_value(value).map_err(|e| {
            warn!(path = %path, error = %e, "Upstream payload did not match expected shape");
            GatewayError::Decode(e)
        })
    }

    /// GET a collection and narrow each entry into `T` on its own.
    ///
    /// Entries that do not narrow are logged and skipped; the rest survive.
    async fn fetch_list<T: DeserializeOwned>(
        &self,
        path: &str,
        deadline: Deadline,
    ) -> Result<Vec<T>, GatewayError> {
        let entries: Vec<Value> = self.fetch(path.to_string(), deadline).await?;
        let total = entries.len();

        let items: Vec<T> = entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| match serde_json::from_value(entry) {
                Ok(item) => Some(item),
                Err(e) => {
                    warn!(path, index, error = %e, "Skipping malformed collection entry");
                    None
                }
            })
            .collect();

        let skipped = total - items.len();
        if skipped > 0 {
            warn!(path, total, skipped, "Collection had malformed entries");
        }
        Ok(items)
    }

    // =========================================================================
    // Projects
    // =========================================================================

    /// List projects (without environments).
    ///
    /// # Errors
    /// Propagates transport, upstream and decode failures.
    pub async fn list_projects(&self, deadline: Deadline) -> Result<Vec<Project>, GatewayError> {
        self.fetch_list("/projects", deadline).await
    }

    /// Get one project with its declared environments.
    ///
    /// # Errors
    /// Propagates transport, upstream and decode failures.
    pub async fn get_project(
        &self,
        uuid: &str,
        deadline: Deadline,
    ) -> Result<Project, GatewayError> {
        self.fetch(item_path("projects", uuid, None)?, deadline).await
    }

    // =========================================================================
    // Servers
    // =========================================================================

    /// List servers.
    ///
    /// # Errors
    /// Propagates transport, upstream and decode failures.
    pub async fn list_servers(&self, deadline: Deadline) -> Result<Vec<Server>, GatewayError> {
        self.fetch_list("/servers", deadline).await
    }

    /// Get one server.
    ///
    /// # Errors
    /// Propagates transport, upstream and decode failures.
    pub async fn get_server(&self, uuid: &str, deadline: Deadline) -> Result<Server, GatewayError> {
        self.fetch(item_path("servers", uuid, None)?, deadline).await
    }

    /// Resources deployed on one server.
    ///
    /// # Errors
    /// Propagates transport, upstream and decode failures.
    pub async fn get_server_resources(
        &self,
        uuid: &str,
        deadline: Deadline,
    ) -> Result<Vec<Resource>, GatewayError> {
        let path = item_path("servers", uuid, Some("resources"))?;
        self.fetch_list(&path, deadline).await
    }

    // =========================================================================
    // Resources
    // =========================================================================

    /// Flat resource collection across all projects.
    ///
    /// # Errors
    /// Propagates transport, upstream and decode failures.
    pub async fn list_resources(&self, deadline: Deadline) -> Result<Vec<Resource>, GatewayError> {
        self.fetch_list("/resources", deadline).await
    }

    /// List applications.
    ///
    /// # Errors
    /// Propagates transport, upstream and decode failures.
    pub async fn list_applications(
        &self,
        deadline: Deadline,
    ) -> Result<Vec<Application>, GatewayError> {
        self.fetch_list("/applications", deadline).await
    }

    /// Get one application.
    ///
    /// # Errors
    /// Propagates transport, upstream and decode failures.
    pub async fn get_application(
        &self,
        uuid: &str,
        deadline: Deadline,
    ) -> Result<Application, GatewayError> {
        self.fetch(item_path("applications", uuid, None)?, deadline)
            .await
    }

    /// List databases.
    ///
    /// # Errors
    /// Propagates transport, upstream and decode failures.
    pub async fn list_databases(&self, deadline: Deadline) -> Result<Vec<Database>, GatewayError> {
        self.fetch_list("/databases", deadline).await
    }

    /// Get one database.
    ///
    /// # Errors
    /// Propagates transport, upstream and decode failures.
    pub async fn get_database(
        &self,
        uuid: &str,
        deadline: Deadline,
    ) -> Result<Database, GatewayError> {
        self.fetch(item_path("databases", uuid, None)?, deadline).await
    }

    /// List services.
    ///
    /// # Errors
    /// Propagates transport, upstream and decode failures.
    pub async fn list_services(&self, deadline: Deadline) -> Result<Vec<Service>, GatewayError> {
        self.fetch_list("/services", deadline).await
    }

    /// Get one service.
    ///
    /// # Errors
    /// Propagates transport, upstream and decode failures.
    pub async fn get_service(
        &self,
        uuid: &str,
        deadline: Deadline,
    ) -> Result<Service, GatewayError> {
        self.fetch(item_path("services", uuid, None)?, deadline).await
    }

    // =========================================================================
    // Deployments
    // =========================================================================

    /// List deployments.
    ///
    /// # Errors
    /// Propagates transport, upstream and decode failures.
    pub async fn list_deployments(
        &self,
        deadline: Deadline,
    ) -> Result<Vec<Deployment>, GatewayError> {
        self.fetch_list("/deployments", deadline).await
    }

    /// Get one deployment.
    ///
    /// # Errors
    /// Propagates transport, upstream and decode failures.
    pub async fn get_deployment(
        &self,
        uuid: &str,
        deadline: Deadline,
    ) -> Result<Deployment, GatewayError> {
        self.fetch(item_path("deployments", uuid, None)?, deadline)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_path() {
        assert_eq!(
            item_path("applications", "a1", Some("restart")).unwrap(),
            "/applications/a1/restart"
        );
        assert_eq!(item_path("projects", "p1", None).unwrap(), "/projects/p1");
    }

    #[test]
    fn test_item_path_rejects_segment_escapes() {
        for bad in ["", "..", "a/b", "a?x=1", "a#b", "a b", "%2e%2e"] {
            assert!(
                matches!(
                    item_path("projects", bad, None),
                    Err(GatewayError::InvalidIdentifier(_))
                ),
                "expected rejection for {bad:?}"
            );
        }
    }
}
