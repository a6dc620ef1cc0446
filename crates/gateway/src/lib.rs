//! Aggregation gateway for the upstream deployment platform.
//!
//! This crate proxies the platform's REST API, fans reads out across its
//! resource endpoints and reassembles a project → environment → resource
//! view. It also forwards start/stop/restart/deploy commands.
//!
//! Nothing is cached: every read is recomputed from the upstream.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use infra_gateway::{Gateway, GatewayConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = GatewayConfig::new(
//!         "https://deploy.example.com/api/v1",
//!         "api_token",
//!         Duration::from_secs(30),
//!     )?;
//!     let gateway = Gateway::from_config(config)?;
//!
//!     let project = gateway.get_project_with_resources("project-uuid").await?;
//!     for env in &project.environments {
//!         println!("{}: {} apps", env.name, env.applications.len());
//!     }
//!
//!     gateway.restart_application("app-uuid").await?;
//!     Ok(())
//! }
//! ```

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod assembler;
pub mod catalog;
pub mod config;
pub mod error;
pub mod facade;
pub mod lifecycle;
pub mod models;
pub mod server;
pub mod transport;

pub use assembler::{attach_resources, Assembler, FetchPolicy};
pub use catalog::Catalog;
pub use config::GatewayConfig;
pub use error::GatewayError;
pub use facade::{ErrorEnvelope, FacadeError, FacadeResult, Gateway};
pub use lifecycle::{LifecycleCommand, LifecycleController, PowerAction};
pub use models::{
    AllResources, Application, Database, Deployment, Environment, Project, Resource,
    ResourceCategory, ResourceStatus, Server, Service,
};
pub use transport::{Deadline, HttpTransport, Transport, UpstreamCall};
