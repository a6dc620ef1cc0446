//! Start/stop/restart/deploy commands against single resources.
//!
//! Each command is exactly one upstream call. Nothing is verified afterwards;
//! poll the resource status if confirmation matters.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use crate::catalog::item_path;
use crate::error::GatewayError;
use crate::models::ResourceCategory;
use crate::transport::{Deadline, Transport, UpstreamCall};

/// Power action available on every resource kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerAction {
    /// Start.
    Start,
    /// Stop.
    Stop,
    /// Restart.
    Restart,
}

impl PowerAction {
    fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Restart => "restart",
        }
    }
}

impl fmt::Display for PowerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lifecycle command. Deploy exists for applications only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleCommand {
    /// Power action on any kind.
    Power(ResourceCategory, PowerAction),
    /// Deploy an application.
    DeployApplication,
}

impl LifecycleCommand {
    /// Parse an action name for a kind. `None` if the pair does not exist.
    #[must_use]
    pub fn parse(kind: ResourceCategory, action: &str) -> Option<Self> {
        if action == "deploy" {
            return (kind == ResourceCategory::Application).then_some(Self::DeployApplication);
        }
        action
            .parse::<PowerAction>()
            .ok()
            .map(|power| Self::Power(kind, power))
    }

    /// Kind the command targets.
    #[must_use]
    pub fn kind(self) -> ResourceCategory {
        match self {
            Self::Power(kind, _) => kind,
            Self::DeployApplication => ResourceCategory::Application,
        }
    }

    /// Action name, as used in upstream paths.
    #[must_use]
    pub fn action(self) -> &'static str {
        match self {
            Self::Power(_, action) => action.as_str(),
            Self::DeployApplication => "deploy",
        }
    }
}

impl FromStr for PowerAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(Self::Start),
            "stop" => Ok(Self::Stop),
            "restart" => Ok(Self::Restart),
            other => Err(format!("unknown power action '{other}'")),
        }
    }
}

/// Issues lifecycle commands through the transport.
#[derive(Clone)]
pub struct LifecycleController {
    transport: Arc<dyn Transport>,
}

impl LifecycleController {
    /// Create a controller over the given transport.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Run `command` against the resource `uuid`.
    ///
    /// Power actions are body-less GETs, deploy is a body-less POST. The
    /// upstream acknowledgement is returned untouched.
    ///
    /// # Errors
    /// Propagates any upstream or transport failure.
    pub async fn execute(
        &self,
        command: LifecycleCommand,
        uuid: &str,
        deadline: Deadline,
    ) -> Result<Value, GatewayError> {
        let path = item_path(command.kind().collection(), uuid, Some(command.action()))?;
        let call = match command {
            LifecycleCommand::Power(..) => UpstreamCall::get(path, deadline),
            LifecycleCommand::DeployApplication => UpstreamCall::post(path, deadline),
        };

        info!(
            kind = %command.kind(),
            action = command.action(),
            uuid = %uuid,
            "Issuing lifecycle command"
        );

        self.transport.request(call).await
    }

    /// Start, stop or restart a resource of any kind.
    ///
    /// # Errors
    /// Propagates any upstream or transport failure.
    pub async fn power(
        &self,
        kind: ResourceCategory,
        action: PowerAction,
        uuid: &str,
        deadline: Deadline,
    ) -> Result<Value, GatewayError> {
        self.execute(LifecycleCommand::Power(kind, action), uuid, deadline)
            .await
    }

    /// Trigger a deployment of an application.
    ///
    /// # Errors
    /// Propagates any upstream or transport failure.
    pub async fn deploy_application(
        &self,
        uuid: &str,
        deadline: Deadline,
    ) -> Result<Value, GatewayError> {
        self.execute(LifecycleCommand::DeployApplication, uuid, deadline)
            .await
    }
}
