//! Fan-out reads that join several upstream collections into one view.

use std::collections::HashMap;
use std::future::Future;

use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::error::GatewayError;
use crate::models::{AllResources, Project, Resource, ResourceCategory};
use crate::transport::Deadline;

/// How a fan-out leg reacts to a failed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPolicy {
    /// Failure aborts the enclosing operation.
    Required,
    /// Failure is logged and replaced by an empty value.
    BestEffort,
}

impl FetchPolicy {
    /// Await one leg and apply this policy to its outcome.
    ///
    /// # Errors
    /// Only under [`FetchPolicy::Required`], with the leg's own error.
    pub async fn apply<T, F>(self, leg: &'static str, fetch: F) -> Result<T, GatewayError>
    where
        T: Default,
        F: Future<Output = Result<T, GatewayError>>,
    {
        match (fetch.await, self) {
            (Ok(value), _) => Ok(value),
            (Err(e), Self::Required) => Err(e),
            (Err(e), Self::BestEffort) => {
                warn!(leg, error = %e, "Fetch failed; continuing with empty result");
                Ok(T::default())
            }
        }
    }
}

/// Attach flat resources to the environments of `project`.
///
/// Each resource goes to the first environment whose `id` equals its
/// `environment_id`, in flat-collection order. Resources pointing at no
/// environment of this project are skipped. Resources whose type matches no
/// category are logged and counted in `unclassified_resources`.
#[must_use]
pub fn attach_resources(mut project: Project, resources: &[Resource]) -> Project {
    let mut by_environment: HashMap<i64, Vec<&Resource>> = HashMap::new();
    for resource in resources {
        if let Some(environment_id) = resource.environment_id {
            by_environment.entry(environment_id).or_default().push(resource);
        }
    }

    let mut unclassified = 0;
    for environment in &mut project.environments {
        environment.clear_resources();

        let Some(matched) = by_environment.remove(&environment.id) else {
            continue;
        };

        for resource in matched {
            match resource.category() {
                Some(ResourceCategory::Application) => {
                    environment.applications.push(resource.clone());
                }
                Some(ResourceCategory::Database) => environment.databases.push(resource.clone()),
                Some(ResourceCategory::Service) => environment.services.push(resource.clone()),
                None => {
                    unclassified += 1;
                    warn!(
                        project_uuid = %project.uuid,
                        environment_id = environment.id,
                        resource_uuid = %resource.uuid,
                        resource_type = %resource.resource_type,
                        "Resource type matches no category; not attached"
                    );
                }
            }
        }
    }

    let foreign: usize = by_environment.values().map(Vec::len).sum();
    debug!(
        project_uuid = %project.uuid,
        foreign,
        "Skipped resources belonging to other environments"
    );

    project.unclassified_resources = unclassified;
    project
}

/// Builds joined views from the catalog.
#[derive(Clone)]
pub struct Assembler {
    catalog: Catalog,
}

impl Assembler {
    /// Create an assembler over the given catalog.
    #[must_use]
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    /// Project with every environment's applications, databases and services.
    ///
    /// The project detail and the flat resource list are fetched concurrently.
    /// A failed resource fetch leaves every environment with empty buckets.
    ///
    /// # Errors
    /// Fails when the project detail cannot be fetched.
    pub async fn get_project_with_resources(
        &self,
        project_uuid: &str,
        deadline: Deadline,
    ) -> Result<Project, GatewayError> {
        let (project, resources) = tokio::join!(
            FetchPolicy::Required.apply(
                "project",
                self.catalog.get_project(project_uuid, deadline)
            ),
            FetchPolicy::BestEffort.apply("resources", self.catalog.list_resources(deadline)),
        );
        let project = project?;
        let resources = resources?;

        let project = attach_resources(project, &resources);

        info!(
            project_uuid = %project.uuid,
            environments = project.environments.len(),
            attached = project
                .environments
                .iter()
                .map(crate::models::Environment::resource_count)
                .sum::<usize>(),
            unclassified = project.unclassified_resources,
            "Assembled project resources"
        );

        Ok(project)
    }

    /// Applications, databases and services fetched concurrently.
    ///
    /// Each leg degrades to empty on its own.
    ///
    /// # Errors
    /// Never fails with the current policies; the signature leaves room for
    /// a required leg.
    pub async fn get_all_resources(
        &self,
        deadline: Deadline,
    ) -> Result<AllResources, GatewayError> {
        let (applications, databases, services) = tokio::join!(
            FetchPolicy::BestEffort.apply(
                "applications",
                self.catalog.list_applications(deadline)
            ),
            FetchPolicy::BestEffort.apply("databases", self.catalog.list_databases(deadline)),
            FetchPolicy::BestEffort.apply("services", self.catalog.list_services(deadline)),
        );

        Ok(AllResources {
            applications: applications?,
            databases: databases?,
            services: services?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn project() -> Project {
        serde_json::from_value(json!({
            "uuid": "p1",
            "name": "shop",
            "environments": [
                { "id": 10, "uuid": "e1", "name": "production" },
                { "id": 20, "uuid": "e2", "name": "staging" }
            ]
        }))
        .unwrap()
    }

    fn resource(uuid: &str, environment_id: i64, resource_type: &str) -> Resource {
        serde_json::from_value(json!({
            "uuid": uuid,
            "name": uuid,
            "type": resource_type,
            "environment_id": environment_id,
        }))
        .unwrap()
    }

    fn uuids(resources: &[Resource]) -> Vec<&str> {
        resources.iter().map(|r| r.uuid.as_str()).collect()
    }

    #[test]
    fn test_join_by_environment_id() {
        let resources = vec![
            resource("a1", 10, "application"),
            resource("a2", 20, "application"),
            resource("a3", 99, "application"),
        ];

        let assembled = attach_resources(project(), &resources);
        let e1 = &assembled.environments[0];
        let e2 = &assembled.environments[1];

        assert_eq!(uuids(&e1.applications), vec!["a1"]);
        assert_eq!(uuids(&e2.applications), vec!["a2"]);
        assert_eq!(assembled.unclassified_resources, 0);
        let total: usize = assembled
            .environments
            .iter()
            .map(crate::models::Environment::resource_count)
            .sum();
        assert_eq!(total, 2);
    }

    #[test]
    fn test_categories_are_exclusive() {
        let resources = vec![
            resource("pg", 10, "postgresql"),
            resource("web", 10, "application"),
            resource("s3", 10, "minio"),
            resource("cache", 10, "redis"),
            resource("compose", 10, "service"),
        ];

        let assembled = attach_resources(project(), &resources);
        let e1 = &assembled.environments[0];

        assert_eq!(uuids(&e1.applications), vec!["web"]);
        assert_eq!(uuids(&e1.databases), vec!["pg", "cache"]);
        assert_eq!(uuids(&e1.services), vec!["s3", "compose"]);
    }

    #[test]
    fn test_unknown_type_counted_not_attached() {
        let resources = vec![
            resource("odd", 10, "dragonfly"),
            resource("web", 10, "application"),
        ];

        let assembled = attach_resources(project(), &resources);
        let e1 = &assembled.environments[0];

        assert_eq!(e1.resource_count(), 1);
        assert_eq!(assembled.unclassified_resources, 1);
    }

    #[test]
    fn test_resource_without_environment_is_skipped() {
        let mut orphan = resource("x", 10, "application");
        orphan.environment_id = None;

        let assembled = attach_resources(project(), &[orphan]);
        assert!(assembled.environments.iter().all(|e| e.resource_count() == 0));
    }

    #[test]
    fn test_duplicate_environment_ids_attach_once() {
        let mut project = project();
        project.environments[1].id = 10;

        let assembled = attach_resources(project, &[resource("a1", 10, "application")]);
        assert_eq!(uuids(&assembled.environments[0].applications), vec!["a1"]);
        assert!(assembled.environments[1].applications.is_empty());
    }

    #[test]
    fn test_order_follows_flat_collection() {
        let resources = vec![
            resource("b", 10, "application"),
            resource("a", 10, "application"),
            resource("c", 10, "application"),
        ];

        let assembled = attach_resources(project(), &resources);
        assert_eq!(
            uuids(&assembled.environments[0].applications),
            vec!["b", "a", "c"]
        );
    }

    #[tokio::test]
    async fn test_best_effort_degrades_to_default() {
        let result: Result<Vec<Resource>, GatewayError> = FetchPolicy::BestEffort
            .apply("resources", async {
                Err(GatewayError::UpstreamHttp {
                    status: 500,
                    body: "boom".to_string(),
                })
            })
            .await;
        assert!(result.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_required_propagates() {
        let result: Result<Vec<Resource>, GatewayError> = FetchPolicy::Required
            .apply("project", async {
                Err(GatewayError::UpstreamHttp {
                    status: 404,
                    body: "not found".to_string(),
                })
            })
            .await;
        assert_eq!(result.unwrap_err().status(), Some(404));
    }
}
