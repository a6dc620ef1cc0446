//! Upstream platform models.
//!
//! Payloads are narrowed into these types at the catalog boundary. Fields the
//! gateway does not model are kept in each type's `extra` map and serialized
//! back out unchanged.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// Project types
// ============================================================================

/// Project with its declared environments.
///
/// The project list endpoint omits environments; they default to empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Project {
    /// Project UUID.
    pub uuid: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// Environments in upstream order.
    #[serde(default)]
    pub environments: Vec<Environment>,
    /// Resources in this project's environments whose type matched no category.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub unclassified_resources: usize,
    /// Fields not modelled by the gateway.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Deployment context inside a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Environment {
    /// Numeric ID; resources reference it through `environment_id`.
    pub id: i64,
    /// Environment UUID.
    #[serde(default)]
    pub uuid: String,
    /// Environment name (e.g. "production").
    #[serde(default)]
    pub name: String,
    /// Attached applications.
    #[serde(default)]
    pub applications: Vec<Resource>,
    /// Attached databases.
    #[serde(default)]
    pub databases: Vec<Resource>,
    /// Attached services.
    #[serde(default)]
    pub services: Vec<Resource>,
    /// Fields not modelled by the gateway.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Environment {
    /// Empty the three resource buckets.
    pub fn clear_resources(&mut self) {
        self.applications.clear();
        self.databases.clear();
        self.services.clear();
    }

    /// Total resources attached across all buckets.
    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.applications.len() + self.databases.len() + self.services.len()
    }
}

// ============================================================================
// Flat resource types
// ============================================================================

/// Entry of the flat resource collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Resource UUID.
    pub uuid: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Colon-delimited status, e.g. `running:healthy`.
    #[serde(default)]
    pub status: Option<String>,
    /// Upstream type tag. Empty when upstream sent none.
    #[serde(rename = "type", default, deserialize_with = "string_or_null")]
    pub resource_type: String,
    /// Owning environment's numeric ID.
    #[serde(default)]
    pub environment_id: Option<i64>,
    /// Public domain(s), applications only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fqdn: Option<String>,
    /// Fields not modelled by the gateway.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource {
    /// Category derived from the type tag.
    #[must_use]
    pub fn category(&self) -> Option<ResourceCategory> {
        ResourceCategory::classify(&self.resource_type)
    }

    /// Parsed status, if present.
    #[must_use]
    pub fn parsed_status(&self) -> Option<ResourceStatus> {
        self.status.as_deref().map(ResourceStatus::parse)
    }
}

/// Type tags classified as databases.
pub const DATABASE_TYPES: &[&str] = &[
    "database",
    "postgresql",
    "mysql",
    "mariadb",
    "mongodb",
    "redis",
    "clickhouse",
];

/// Type tags classified as services.
pub const SERVICE_TYPES: &[&str] = &["service", "minio"];

/// Gateway-side category of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceCategory {
    /// Application.
    Application,
    /// Database.
    Database,
    /// Service.
    Service,
}

impl ResourceCategory {
    /// Classify an upstream type tag. Exact, case-sensitive match.
    ///
    /// Returns `None` for tags outside the known vocabulary.
    #[must_use]
    pub fn classify(type_tag: &str) -> Option<Self> {
        if type_tag == "application" {
            Some(Self::Application)
        } else if DATABASE_TYPES.contains(&type_tag) {
            Some(Self::Database)
        } else if SERVICE_TYPES.contains(&type_tag) {
            Some(Self::Service)
        } else {
            None
        }
    }

    /// Upstream collection path segment.
    #[must_use]
    pub fn collection(self) -> &'static str {
        match self {
            Self::Application => "applications",
            Self::Database => "databases",
            Self::Service => "services",
        }
    }
}

impl std::str::FromStr for ResourceCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "application" | "applications" => Ok(Self::Application),
            "database" | "databases" => Ok(Self::Database),
            "service" | "services" => Ok(Self::Service),
            other => Err(format!(
                "unknown resource kind '{other}' (expected application, database or service)"
            )),
        }
    }
}

impl fmt::Display for ResourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Application => write!(f, "application"),
            Self::Database => write!(f, "database"),
            Self::Service => write!(f, "service"),
        }
    }
}

/// Split view of a colon-delimited status string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceStatus {
    /// Run state, e.g. `running`, `exited`.
    pub state: String,
    /// Health suffix, e.g. `healthy`.
    pub health: Option<String>,
}

impl ResourceStatus {
    /// Parse `state[:health]`. Anything after the first colon is the health.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.split_once(':') {
            Some((state, health)) => Self {
                state: state.trim().to_string(),
                health: Some(health.trim().to_string()).filter(|h| !h.is_empty()),
            },
            None => Self {
                state: raw.trim().to_string(),
                health: None,
            },
        }
    }

    /// Whether the run state is `running`.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state == "running"
    }

    /// Whether the health suffix is `healthy`.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.health.as_deref() == Some("healthy")
    }
}

// ============================================================================
// Per-kind types
// ============================================================================

/// Application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    /// Application UUID.
    pub uuid: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Status, e.g. `running:healthy`.
    #[serde(default)]
    pub status: Option<String>,
    /// Public domain(s).
    #[serde(default)]
    pub fqdn: Option<String>,
    /// Source repository.
    #[serde(default)]
    pub git_repository: Option<String>,
    /// Source branch.
    #[serde(default)]
    pub git_branch: Option<String>,
    /// Build pack (nixpacks, dockerfile, ...).
    #[serde(default)]
    pub build_pack: Option<String>,
    /// Owning environment's numeric ID.
    #[serde(default)]
    pub environment_id: Option<i64>,
    /// Fields not modelled by the gateway.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Database {
    /// Database UUID.
    pub uuid: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Status, e.g. `running:healthy`.
    #[serde(default)]
    pub status: Option<String>,
    /// Engine tag as reported upstream.
    #[serde(default)]
    pub database_type: Option<String>,
    /// Owning environment's numeric ID.
    #[serde(default)]
    pub environment_id: Option<i64>,
    /// Fields not modelled by the gateway.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One-click or compose-based service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    /// Service UUID.
    pub uuid: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Status, e.g. `running:healthy`.
    #[serde(default)]
    pub status: Option<String>,
    /// Owning environment's numeric ID.
    #[serde(default)]
    pub environment_id: Option<i64>,
    /// Fields not modelled by the gateway.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Server managed by the platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    /// Server UUID.
    pub uuid: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// IP address or hostname.
    #[serde(default)]
    pub ip: Option<String>,
    /// SSH user.
    #[serde(default)]
    pub user: Option<String>,
    /// SSH port.
    #[serde(default)]
    pub port: Option<u16>,
    /// Fields not modelled by the gateway.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Deployment record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deployment {
    /// Deployment UUID.
    #[serde(alias = "deployment_uuid")]
    pub uuid: String,
    /// Deployment status: "queued", "in_progress", "finished", "failed".
    #[serde(default)]
    pub status: Option<String>,
    /// Application being deployed.
    #[serde(default)]
    pub application_name: Option<String>,
    /// Commit being deployed.
    #[serde(default)]
    pub commit: Option<String>,
    /// Created at.
    #[serde(default)]
    pub created_at: Option<String>,
    /// Fields not modelled by the gateway.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Deployment {
    /// `created_at` as UTC, when it is RFC 3339.
    #[must_use]
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        self.created_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Applications, databases and services fetched side by side.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AllResources {
    /// Applications.
    pub applications: Vec<Application>,
    /// Databases.
    pub databases: Vec<Database>,
    /// Services.
    pub services: Vec<Service>,
}

fn string_or_null<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_zero(n: &usize) -> bool {
    *n == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_closed_vocabulary() {
        assert_eq!(
            ResourceCategory::classify("application"),
            Some(ResourceCategory::Application)
        );
        for tag in DATABASE_TYPES {
            assert_eq!(
                ResourceCategory::classify(tag),
                Some(ResourceCategory::Database)
            );
        }
        for tag in SERVICE_TYPES {
            assert_eq!(
                ResourceCategory::classify(tag),
                Some(ResourceCategory::Service)
            );
        }
    }

    #[test]
    fn test_classify_unknown_and_case_sensitive() {
        assert_eq!(ResourceCategory::classify("dragonfly"), None);
        assert_eq!(ResourceCategory::classify("PostgreSQL"), None);
        assert_eq!(ResourceCategory::classify(""), None);
    }

    #[test]
    fn test_status_parsing() {
        let status = ResourceStatus::parse("running:healthy");
        assert_eq!(status.state, "running");
        assert_eq!(status.health.as_deref(), Some("healthy"));
        assert!(status.is_running());
        assert!(status.is_healthy());

        let status = ResourceStatus::parse("exited");
        assert_eq!(status.state, "exited");
        assert_eq!(status.health, None);
        assert!(!status.is_running());

        let status = ResourceStatus::parse("running:");
        assert_eq!(status.health, None);
    }

    #[test]
    fn test_resource_keeps_unmodelled_fields() {
        let raw = json!({
            "uuid": "a1",
            "name": "web",
            "type": "application",
            "status": "running:healthy",
            "environment_id": 10,
            "fqdn": "https://web.example.com",
            "destination_id": 3
        });
        let resource: Resource = serde_json::from_value(raw).unwrap();
        assert_eq!(resource.category(), Some(ResourceCategory::Application));
        assert_eq!(resource.extra.get("destination_id"), Some(&json!(3)));

        let back = serde_json::to_value(&resource).unwrap();
        assert_eq!(back["type"], "application");
        assert_eq!(back["destination_id"], 3);
    }

    #[test]
    fn test_missing_or_null_type_is_unclassified() {
        for raw in [
            json!({ "uuid": "x", "type": null, "environment_id": 20 }),
            json!({ "uuid": "y", "environment_id": 20 }),
        ] {
            let resource: Resource = serde_json::from_value(raw).unwrap();
            assert_eq!(resource.resource_type, "");
            assert_eq!(resource.category(), None);
        }
    }

    #[test]
    fn test_environment_buckets_default_to_empty() {
        let env: Environment =
            serde_json::from_value(json!({ "id": 10, "uuid": "e1", "name": "production" }))
                .unwrap();
        assert!(env.applications.is_empty());
        let out = serde_json::to_value(&env).unwrap();
        assert_eq!(out["applications"], json!([]));
        assert_eq!(out["databases"], json!([]));
        assert_eq!(out["services"], json!([]));
    }

    #[test]
    fn test_unclassified_count_hidden_when_zero() {
        let project: Project =
            serde_json::from_value(json!({ "uuid": "p1", "name": "shop" })).unwrap();
        let out = serde_json::to_value(&project).unwrap();
        assert!(out.get("unclassified_resources").is_none());
    }

    #[test]
    fn test_deployment_accepts_deployment_uuid() {
        let deployment: Deployment = serde_json::from_value(json!({
            "deployment_uuid": "d1",
            "status": "finished",
            "created_at": "2024-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(deployment.uuid, "d1");
        assert!(deployment.created_at_utc().is_some());
    }
}
