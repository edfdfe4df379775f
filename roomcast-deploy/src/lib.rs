//! Deployment and reconciliation for roomcast
//!
//! Installs the compiled routing and server configs, restarts the services
//! that read them, makes sure a streaming client runs for every room and
//! finally converges the Snapcast server's groups so each configured stream
//! plays in exactly its target rooms.
//!
//! Everything outside the process goes through the traits in
//! [`collaborators`]. [`Reconciler::system`] wires in the production
//! implementations; tests pass in-memory fakes to [`Reconciler::new`].
//!
//! ```rust,no_run
//! use roomcast_config::ConfigModel;
//! use roomcast_deploy::{DeployConfig, Reconciler};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let model = ConfigModel::load("speaker_config.json")?;
//! let reconciler = Reconciler::system(DeployConfig::default());
//! let report = reconciler.run(&model).await?;
//! println!("{}", report);
//! # Ok(())
//! # }
//! ```

pub mod artifacts;
pub mod clients;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod lock;
pub mod plan;
pub mod reconciler;
pub mod report;
pub mod systemd;

pub use artifacts::FsArtifactWriter;
pub use clients::{client_units, manage_clients, ClientAction, UnitOutcome};
pub use collaborators::{ArtifactWriter, ClientLauncher, GroupControl, ServiceManager, ServiceStatus};
pub use config::{DeployConfig, ServerTarget};
pub use error::{DeployError, Result, ServiceError};
pub use lock::RunLock;
pub use plan::{Assignment, GroupPlan, PlanWarning};
pub use reconciler::Reconciler;
pub use report::{DeployReport, GroupChange};
pub use systemd::{render_client_unit, Systemctl, SystemdClientLauncher};
