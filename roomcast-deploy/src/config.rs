//! Settings for a deployment run
//!
//! Defaults match a single-host installation: artifacts go to `/etc`, the
//! Snapcast server runs locally, and room clients are systemd template
//! instances.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::DeployError;

/// Where the Snapcast control endpoint lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerTarget {
    pub host: String,
    pub port: u16,
}

impl Default for ServerTarget {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1705,
        }
    }
}

impl std::fmt::Display for ServerTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Configuration for the Reconciler
#[derive(Debug, Clone)]
pub struct DeployConfig {
    /// Destination of the routing config
    /// Default: /etc/asound.conf
    pub asound_path: PathBuf,

    /// Destination of the streaming server config
    /// Default: /etc/snapserver.conf
    pub snapserver_path: PathBuf,

    /// Control endpoint of the streaming server
    /// Default: localhost:1705
    pub server: ServerTarget,

    /// Service restarted to pick up the server config
    /// Default: snapserver
    pub streaming_service: String,

    /// Service restarted to pick up the routing config; `None` skips it
    /// Default: alsa-restore
    pub routing_service: Option<String>,

    /// Template unit for room clients; instances are `name@{device}.service`
    /// Default: snapclient@.service
    pub client_unit_template: PathBuf,

    /// Where `clients install` writes the template unit
    /// Default: /etc/systemd/system
    pub unit_dir: PathBuf,

    /// Delay between status polls while waiting for clients
    /// Default: 1 second
    pub poll_interval: Duration,

    /// How long to wait for all room clients to connect
    /// Default: 30 seconds
    pub connect_deadline: Duration,

    /// Timeout for one control call
    /// Default: 5 seconds
    pub control_timeout: Duration,

    /// Run-scoped lock file; `None` disables locking
    /// Default: /tmp/roomcast-deploy.lock
    pub lock_path: Option<PathBuf>,

    /// Prefix `systemctl` with `sudo`
    /// Default: false
    pub use_sudo: bool,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            asound_path: PathBuf::from("/etc/asound.conf"),
            snapserver_path: PathBuf::from("/etc/snapserver.conf"),
            server: ServerTarget::default(),
            streaming_service: "snapserver".to_string(),
            routing_service: Some("alsa-restore".to_string()),
            client_unit_template: PathBuf::from("snapclient@.service"),
            unit_dir: PathBuf::from("/etc/systemd/system"),
            poll_interval: Duration::from_secs(1),
            connect_deadline: Duration::from_secs(30),
            control_timeout: Duration::from_secs(5),
            lock_path: Some(std::env::temp_dir().join("roomcast-deploy.lock")),
            use_sudo: false,
        }
    }
}

impl DeployConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write both artifacts into `dir` instead of `/etc`, e.g. for review
    pub fn staged(dir: impl AsRef<Path>) -> Self {
        Self::default().with_output_dir(dir)
    }

    pub fn validate(&self) -> Result<(), DeployError> {
        if self.asound_path.as_os_str().is_empty() || self.snapserver_path.as_os_str().is_empty() {
            return Err(DeployError::Configuration(
                "Output paths must not be empty".to_string(),
            ));
        }

        if self.asound_path == self.snapserver_path {
            return Err(DeployError::Configuration(
                "Routing and server configs must go to different files".to_string(),
            ));
        }

        if self.server.host.is_empty() || self.server.port == 0 {
            return Err(DeployError::Configuration(format!(
                "Invalid control endpoint {}",
                self.server
            )));
        }

        if self.streaming_service.is_empty() {
            return Err(DeployError::Configuration(
                "Streaming service name must not be empty".to_string(),
            ));
        }

        if self.client_instance_unit("x").is_none() {
            return Err(DeployError::Configuration(format!(
                "Client unit template {} must be named like name@.service",
                self.client_unit_template.display()
            )));
        }

        if self.poll_interval == Duration::ZERO {
            return Err(DeployError::Configuration(
                "Poll interval must be greater than 0".to_string(),
            ));
        }

        if self.connect_deadline < self.poll_interval {
            return Err(DeployError::Configuration(
                "Connect deadline must be at least one poll interval".to_string(),
            ));
        }

        if self.control_timeout == Duration::ZERO {
            return Err(DeployError::Configuration(
                "Control timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Instance unit for one room device, e.g. `snapclient@room_bath.service`
    pub fn client_instance_unit(&self, device: &str) -> Option<String> {
        let template = self.client_unit_template.file_name()?.to_str()?;
        let prefix = template.strip_suffix("@.service")?;
        if prefix.is_empty() {
            return None;
        }
        Some(format!("{}@{}.service", prefix, device))
    }

    /// Full path the template unit is installed to
    pub fn client_unit_path(&self) -> PathBuf {
        self.unit_dir.join(&self.client_unit_template)
    }

    // Builder methods

    pub fn with_output_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.asound_path = dir.as_ref().join("asound.conf");
        self.snapserver_path = dir.as_ref().join("snapserver.conf");
        self
    }

    pub fn with_server(mut self, host: impl Into<String>, port: u16) -> Self {
        self.server = ServerTarget {
            host: host.into(),
            port,
        };
        self
    }

    pub fn with_polling(mut self, interval: Duration, deadline: Duration) -> Self {
        self.poll_interval = interval;
        self.connect_deadline = deadline;
        self
    }

    pub fn with_routing_service(mut self, service: Option<String>) -> Self {
        self.routing_service = service;
        self
    }

    pub fn with_lock_path(mut self, path: Option<PathBuf>) -> Self {
        self.lock_path = path;
        self
    }

    pub fn with_sudo(mut self, enabled: bool) -> Self {
        self.use_sudo = enabled;
        self
    }
}
