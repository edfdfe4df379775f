//! systemd-backed service management and room client launching

use async_trait::async_trait;
use tokio::process::Command;

use crate::collaborators::{ClientLauncher, ServiceManager, ServiceStatus};
use crate::config::{DeployConfig, ServerTarget};
use crate::error::ServiceError;

/// Drives units through `systemctl`, optionally via `sudo`
#[derive(Debug, Clone, Default)]
pub struct Systemctl {
    use_sudo: bool,
}

impl Systemctl {
    pub fn new(use_sudo: bool) -> Self {
        Self { use_sudo }
    }

    fn command(&self, args: &[&str]) -> (Command, String) {
        let mut line = Vec::with_capacity(args.len() + 2);
        if self.use_sudo {
            line.push("sudo");
        }
        line.push("systemctl");
        line.extend_from_slice(args);

        let mut command = Command::new(line[0]);
        command.args(&line[1..]).kill_on_drop(true);
        (command, line.join(" "))
    }

    /// Run `systemctl` and require a zero exit status
    async fn run(&self, args: &[&str]) -> Result<(), ServiceError> {
        let (mut command, line) = self.command(args);
        tracing::debug!(command = %line, "running");

        let output = command.output().await.map_err(|source| ServiceError::Spawn {
            command: line.clone(),
            source,
        })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(ServiceError::Failed {
                command: line,
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }

    /// Pick up new or changed unit files
    pub async fn daemon_reload(&self) -> Result<(), ServiceError> {
        self.run(&["daemon-reload"]).await
    }
}

#[async_trait]
impl ServiceManager for Systemctl {
    async fn restart(&self, service: &str) -> Result<(), ServiceError> {
        self.run(&["restart", service]).await
    }

    async fn start(&self, service: &str) -> Result<(), ServiceError> {
        self.run(&["start", service]).await
    }

    async fn stop(&self, service: &str) -> Result<(), ServiceError> {
        self.run(&["stop", service]).await
    }

    async fn enable(&self, service: &str) -> Result<(), ServiceError> {
        self.run(&["enable", service]).await
    }

    async fn disable(&self, service: &str) -> Result<(), ServiceError> {
        self.run(&["disable", service]).await
    }

    async fn status(&self, service: &str) -> Result<ServiceStatus, ServiceError> {
        // `is-active` exits non-zero for anything but active; the state
        // is on stdout either way.
        let (mut command, line) = self.command(&["is-active", service]);
        let output = command.output().await.map_err(|source| ServiceError::Spawn {
            command: line,
            source,
        })?;
        Ok(ServiceStatus::from_is_active(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Launches room clients as instances of a systemd template unit
///
/// The server address is baked into the template by
/// [`render_client_unit`] when it is installed; starting an instance only
/// needs the device name.
#[derive(Debug, Clone)]
pub struct SystemdClientLauncher {
    systemctl: Systemctl,
    config: DeployConfig,
}

impl SystemdClientLauncher {
    pub fn new(systemctl: Systemctl, config: DeployConfig) -> Self {
        Self { systemctl, config }
    }

    pub fn unit_for(&self, device: &str) -> Result<String, ServiceError> {
        self.config
            .client_instance_unit(device)
            .ok_or_else(|| ServiceError::Failed {
                command: format!("instantiate {}", self.config.client_unit_template.display()),
                code: None,
                stderr: "template unit must be named like name@.service".to_string(),
            })
    }
}

#[async_trait]
impl ClientLauncher for SystemdClientLauncher {
    async fn ensure_running(&self, device: &str) -> Result<(), ServiceError> {
        let unit = self.unit_for(device)?;
        tracing::debug!(%unit, server = %self.config.server, "ensuring room client is running");
        self.systemctl.start(&unit).await
    }
}

/// Render the client template unit
///
/// The instance name is the room device: it selects the sound card and is
/// the host id the server reports the client under.
pub fn render_client_unit(server: &ServerTarget) -> String {
    format!(
        "\
# Generated by roomcast - one instance per room device
[Unit]
Description=Snapcast client for %i
After=network-online.target sound.target snapserver.service
Wants=network-online.target

[Service]
ExecStart=/usr/bin/snapclient --host {host} --port {port} --soundcard %i --hostID %i
Restart=on-failure
RestartSec=5

[Install]
WantedBy=multi-user.target
",
        host = server.host,
        port = server.port
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line() {
        let (_, line) = Systemctl::new(false).command(&["restart", "snapserver"]);
        assert_eq!(line, "systemctl restart snapserver");

        let (_, line) = Systemctl::new(true).command(&["is-active", "snapserver"]);
        assert_eq!(line, "sudo systemctl is-active snapserver");
    }

    #[test]
    fn test_unit_for_device() {
        let launcher = SystemdClientLauncher::new(Systemctl::default(), DeployConfig::default());
        assert_eq!(launcher.unit_for("room_kitchen").unwrap(), "snapclient@room_kitchen.service");
    }

    #[test]
    fn test_render_client_unit() {
        let unit = render_client_unit(&ServerTarget {
            host: "snapserver.local".to_string(),
            port: 1705,
        });
        assert!(unit.contains(
            "ExecStart=/usr/bin/snapclient --host snapserver.local --port 1705 --soundcard %i --hostID %i\n"
        ));
        assert!(unit.contains("[Install]\nWantedBy=multi-user.target\n"));
    }
}
