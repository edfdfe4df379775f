//! Per-room client service management
//!
//! Applies one action to the client instance unit of every room in the
//! model. Failures are collected per unit; one broken room does not stop
//! the others.

use std::fmt;
use std::str::FromStr;

use roomcast_compiler::room_device_name;
use roomcast_config::ConfigModel;

use crate::collaborators::{ArtifactWriter, ServiceManager, ServiceStatus};
use crate::config::DeployConfig;
use crate::error::{DeployError, Result};
use crate::systemd::{render_client_unit, Systemctl};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientAction {
    /// Write the template unit and reload systemd
    Install,
    Enable,
    Start,
    Stop,
    Restart,
    Disable,
    Status,
}

impl ClientAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientAction::Install => "install",
            ClientAction::Enable => "enable",
            ClientAction::Start => "start",
            ClientAction::Stop => "stop",
            ClientAction::Restart => "restart",
            ClientAction::Disable => "disable",
            ClientAction::Status => "status",
        }
    }
}

impl fmt::Display for ClientAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClientAction {
    type Err = DeployError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "install" => Ok(ClientAction::Install),
            "enable" => Ok(ClientAction::Enable),
            "start" => Ok(ClientAction::Start),
            "stop" => Ok(ClientAction::Stop),
            "restart" => Ok(ClientAction::Restart),
            "disable" => Ok(ClientAction::Disable),
            "status" => Ok(ClientAction::Status),
            other => Err(DeployError::Configuration(format!(
                "Unknown client action '{}'",
                other
            ))),
        }
    }
}

/// Result of an action on one room's unit
#[derive(Debug)]
pub struct UnitOutcome {
    pub unit: String,
    pub result: std::result::Result<Option<ServiceStatus>, DeployError>,
}

/// Instance units for every room, in room id order
pub fn client_units(model: &ConfigModel, config: &DeployConfig) -> Result<Vec<String>> {
    model
        .rooms
        .keys()
        .map(|room| {
            let device = room_device_name(room);
            config.client_instance_unit(&device).ok_or_else(|| {
                DeployError::Configuration(format!(
                    "Client unit template {} must be named like name@.service",
                    config.client_unit_template.display()
                ))
            })
        })
        .collect()
}

/// Run `action` against every room's client unit
///
/// `Install` writes the template unit once instead of touching instances;
/// it needs `systemctl` for the reload that follows.
pub async fn manage_clients(
    action: ClientAction,
    model: &ConfigModel,
    config: &DeployConfig,
    services: &dyn ServiceManager,
    writer: &dyn ArtifactWriter,
    systemctl: Option<&Systemctl>,
) -> Result<Vec<UnitOutcome>> {
    config.validate()?;

    if action == ClientAction::Install {
        let path = config.client_unit_path();
        let unit = path.display().to_string();
        let result = match writer.write(&path, &render_client_unit(&config.server)).await {
            Ok(()) => match systemctl {
                Some(systemctl) => systemctl
                    .daemon_reload()
                    .await
                    .map(|()| None)
                    .map_err(|error| DeployError::process("daemon-reload", error)),
                None => Ok(None),
            },
            Err(error) => Err(DeployError::process(unit.clone(), error)),
        };
        return Ok(vec![UnitOutcome { unit, result }]);
    }

    let mut outcomes = Vec::new();
    for unit in client_units(model, config)? {
        tracing::debug!(%unit, %action, "managing client unit");
        let result = match action {
            ClientAction::Enable => services.enable(&unit).await.map(|()| None),
            ClientAction::Start => services.start(&unit).await.map(|()| None),
            ClientAction::Stop => services.stop(&unit).await.map(|()| None),
            ClientAction::Restart => services.restart(&unit).await.map(|()| None),
            ClientAction::Disable => services.disable(&unit).await.map(|()| None),
            ClientAction::Status => services.status(&unit).await.map(Some),
            // Written above
            ClientAction::Install => Ok(None),
        }
        .map_err(|error| DeployError::process(unit.clone(), error));

        if let Err(error) = &result {
            tracing::warn!(%unit, %action, %error, "client unit action failed");
        }
        outcomes.push(UnitOutcome { unit, result });
    }
    Ok(outcomes)
}
