use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use roomcast_deploy::{ClientAction, DeployConfig};

use crate::logging::LoggingMode;

/// Multiroom audio configuration for ALSA and Snapcast
///
/// Reads a speaker model (amplifiers, speakers, rooms, zones and streams)
/// and turns it into an asound.conf, a snapserver.conf and a set of
/// Snapcast groups.
#[derive(Parser, Debug)]
#[command(name = "roomcast")]
#[command(version)]
pub struct Cli {
    /// Path to the speaker model
    #[arg(
        short,
        long,
        global = true,
        env = "ROOMCAST_CONFIG",
        default_value = "speaker_config.json"
    )]
    pub config: PathBuf,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    /// Log output style
    #[arg(long, global = true, value_enum, env = "ROOMCAST_LOG_MODE", default_value = "development")]
    pub log_mode: LoggingMode,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the generated asound.conf
    Alsa,
    /// Print the generated snapserver.conf
    Snapserver,
    /// Print which rooms each stream plays in
    Targets,
    /// Validate the model and compile everything without writing files
    Check,
    /// Write configs, restart services and converge the server's groups
    Deploy(DeployArgs),
    /// Manage the per-room client services
    Clients(ClientsArgs),
}

/// Where the Snapcast server and systemd live
#[derive(Args, Debug, Clone)]
pub struct HostArgs {
    /// Snapcast server host
    #[arg(long, env = "ROOMCAST_HOST", default_value = "localhost")]
    pub host: String,

    /// Snapcast control port
    #[arg(long, env = "ROOMCAST_PORT", default_value = "1705")]
    pub port: u16,

    /// Run systemctl through sudo
    #[arg(long)]
    pub sudo: bool,
}

#[derive(Args, Debug, Clone)]
pub struct DeployArgs {
    #[command(flatten)]
    pub host: HostArgs,

    /// Write asound.conf and snapserver.conf here instead of /etc
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Seconds to wait for every room client to connect
    #[arg(long, default_value = "30")]
    pub connect_timeout: u64,

    /// Do not restart the routing service after writing asound.conf
    #[arg(long)]
    pub no_routing_restart: bool,

    /// Skip the run lock
    #[arg(long)]
    pub no_lock: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ClientsArgs {
    /// One of install, enable, start, stop, restart, disable, status
    pub action: ClientAction,

    #[command(flatten)]
    pub host: HostArgs,

    /// Directory the template unit is installed into
    #[arg(long, default_value = "/etc/systemd/system")]
    pub unit_dir: PathBuf,
}

impl Cli {
    /// Validate command line arguments
    pub fn validate(&self) -> Result<()> {
        match self.log_level.to_lowercase().as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => {}
            _ => {
                return Err(anyhow!(
                    "Invalid log level '{}'. Valid levels: error, warn, info, debug, trace",
                    self.log_level
                ));
            }
        }

        if let Command::Deploy(args) = &self.command {
            if args.connect_timeout == 0 {
                return Err(anyhow!("Connect timeout must be positive"));
            }
        }

        Ok(())
    }
}

impl HostArgs {
    fn apply(&self, config: DeployConfig) -> DeployConfig {
        config
            .with_server(self.host.clone(), self.port)
            .with_sudo(self.sudo)
    }
}

impl From<&DeployArgs> for DeployConfig {
    fn from(args: &DeployArgs) -> Self {
        let mut config = args.host.apply(DeployConfig::default());
        if let Some(dir) = &args.output_dir {
            config = config.with_output_dir(dir);
        }
        if args.no_routing_restart {
            config = config.with_routing_service(None);
        }
        if args.no_lock {
            config = config.with_lock_path(None);
        }
        let interval = config.poll_interval;
        config.with_polling(interval, Duration::from_secs(args.connect_timeout))
    }
}

impl From<&ClientsArgs> for DeployConfig {
    fn from(args: &ClientsArgs) -> Self {
        let mut config = args.host.apply(DeployConfig::default());
        config.unit_dir = args.unit_dir.clone();
        config
    }
}
