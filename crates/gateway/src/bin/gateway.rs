//! Infra gateway CLI - serve or query the upstream deployment platform.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use infra_gateway::config::DEFAULT_REQUEST_TIMEOUT_SECS;
use infra_gateway::{
    server, Gateway, GatewayConfig, LifecycleCommand, Project, ResourceCategory,
};

/// Infra gateway - aggregate and control resources on the deployment platform.
#[derive(Parser)]
#[command(name = "infra-gateway")]
#[command(about = "Aggregate and control resources on the deployment platform")]
struct Cli {
    /// Upstream API base URL (or set `INFRA_API_URL` env var).
    #[arg(long, env = "INFRA_API_URL")]
    api_url: String,

    /// Upstream API token (or set `INFRA_API_TOKEN` env var).
    #[arg(long, env = "INFRA_API_TOKEN", hide_env_values = true)]
    api_token: String,

    /// Per-operation deadline in seconds.
    #[arg(long, env = "INFRA_REQUEST_TIMEOUT_SECS", default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Enable verbose logging.
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    /// Emit logs as JSON.
    #[arg(long, default_value = "false")]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP gateway.
    Serve {
        /// Port to listen on.
        #[arg(long, env = "INFRA_GATEWAY_PORT", default_value = "8080")]
        port: u16,
    },

    /// List projects.
    Projects,

    /// Show a project with resources attached to its environments.
    Project {
        /// Project UUID.
        #[arg(long)]
        uuid: String,

        /// Print the assembled project as JSON instead of a table.
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// List deployments.
    Deployments,

    /// List applications, databases and services.
    Resources,

    /// Start, stop, restart or deploy a resource.
    Lifecycle {
        /// Resource kind: application, database or service.
        #[arg(long)]
        kind: ResourceCategory,

        /// Action: start, stop, restart (or deploy for applications).
        #[arg(long)]
        action: String,

        /// Resource UUID.
        #[arg(long)]
        uuid: String,
    },
}

fn init_tracing(verbose: bool, json: bool) -> Result<()> {
    let default = if verbose {
        "infra_gateway=debug,tower_http=debug"
    } else {
        "infra_gateway=info"
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default))
        .context("Invalid log filter")?;

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to render JSON")?
    );
    Ok(())
}

fn print_project(project: &Project) {
    println!("\nProject: {} ({})", project.name, project.uuid);
    for environment in &project.environments {
        println!("\nEnvironment: {} (id {})", environment.name, environment.id);
        println!(
            "{:<12} {:<38} {:<30} {:<10} HEALTH",
            "KIND", "UUID", "NAME", "STATUS"
        );
        println!("{}", "-".repeat(100));
        let rows = [
            (ResourceCategory::Application, &environment.applications),
            (ResourceCategory::Database, &environment.databases),
            (ResourceCategory::Service, &environment.services),
        ];
        for (kind, resources) in rows {
            for resource in resources {
                let status = resource.parsed_status();
                let marker = match &status {
                    Some(s) if s.is_running() && !s.is_healthy() => " !",
                    _ => "",
                };
                println!(
                    "{:<12} {:<38} {:<30} {:<10} {}{}",
                    kind.to_string(),
                    resource.uuid,
                    resource.name,
                    status.as_ref().map_or("-", |s| s.state.as_str()),
                    status
                        .as_ref()
                        .and_then(|s| s.health.as_deref())
                        .unwrap_or("-"),
                    marker
                );
            }
        }
    }
    if project.unclassified_resources > 0 {
        println!(
            "\n{} resource(s) with an unrecognised type were not shown",
            project.unclassified_resources
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.log_json)?;

    let config = GatewayConfig::new(
        &cli.api_url,
        cli.api_token,
        Duration::from_secs(cli.timeout_secs),
    )
    .context("Invalid gateway configuration")?;

    info!(base_url = %config.base_url, "Upstream configured");

    let gateway = Gateway::from_config(config).context("Failed to create gateway")?;

    match cli.command {
        Commands::Serve { port } => {
            let app = server::build_router(gateway);

            let addr = SocketAddr::from(([0, 0, 0, 0], port));
            let listener = TcpListener::bind(addr)
                .await
                .context("Failed to bind to address")?;

            info!(port, "Infra gateway listening");

            axum::serve(listener, app).await.context("Server error")?;
        }

        Commands::Projects => {
            let projects = gateway.list_projects().await?;
            println!("\n{:<38} {:<30} DESCRIPTION", "UUID", "NAME");
            println!("{}", "-".repeat(90));
            for project in projects {
                println!(
                    "{:<38} {:<30} {}",
                    project.uuid,
                    project.name,
                    project.description.unwrap_or_default()
                );
            }
        }

        Commands::Project { uuid, json } => {
            let project = gateway.get_project_with_resources(&uuid).await?;
            if json {
                print_json(&project)?;
            } else {
                print_project(&project);
            }
        }

        Commands::Deployments => {
            let deployments = gateway.list_deployments().await?;
            println!(
                "\n{:<38} {:<14} {:<30} CREATED",
                "UUID", "STATUS", "APPLICATION"
            );
            println!("{}", "-".repeat(110));
            for deployment in deployments {
                let created = deployment
                    .created_at_utc()
                    .map(|at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                    .or(deployment.created_at)
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{:<38} {:<14} {:<30} {}",
                    deployment.uuid,
                    deployment.status.as_deref().unwrap_or("-"),
                    deployment.application_name.as_deref().unwrap_or("-"),
                    created
                );
            }
        }

        Commands::Resources => {
            let resources = gateway.get_all_resources().await?;
            print_json(&resources)?;
        }

        Commands::Lifecycle { kind, action, uuid } => {
            let command = LifecycleCommand::parse(kind, &action)
                .ok_or_else(|| anyhow!("Unsupported action '{action}' for {kind}"))?;
            let ack = gateway.run_lifecycle(command, &uuid).await?;
            print_json(&ack)?;
        }
    }

    Ok(())
}
