//! Converges a host and its streaming server to a configuration model
//!
//! A run has five sequential steps:
//!
//! 1. write the routing and server configs (any failure ends the run)
//! 2. restart the routing layer and the streaming server
//! 3. ensure one client per room, launched concurrently
//! 4. poll the server until every room client is connected, up to a deadline
//! 5. rename room clients and point one group per stream at its rooms
//!
//! The run keeps no state of its own. Everything is recomputed from the model
//! and the server's status, so running it twice leaves the second run with
//! nothing to change.

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;

use roomcast_compiler::{compile_all, room_device_name, Compiled};
use roomcast_config::ConfigModel;
use snapcast_api::{ApiError, ServerStatus, SnapcastClient};
use tokio::task::JoinSet;
use tokio::time::Instant;

use crate::artifacts::FsArtifactWriter;
use crate::collaborators::{ArtifactWriter, ClientLauncher, GroupControl, ServiceManager};
use crate::config::DeployConfig;
use crate::error::{DeployError, Result};
use crate::lock::RunLock;
use crate::plan::{plan_group, resolve_overlaps, Assignment};
use crate::report::{DeployReport, GroupChange};
use crate::systemd::{Systemctl, SystemdClientLauncher};

/// Stream label used when a client rename fails
const NAMING: &str = "(client names)";

pub struct Reconciler {
    config: DeployConfig,
    services: Arc<dyn ServiceManager>,
    launcher: Arc<dyn ClientLauncher>,
    writer: Arc<dyn ArtifactWriter>,
    control: Arc<dyn GroupControl>,
}

impl Reconciler {
    pub fn new(
        config: DeployConfig,
        services: Arc<dyn ServiceManager>,
        launcher: Arc<dyn ClientLauncher>,
        writer: Arc<dyn ArtifactWriter>,
        control: Arc<dyn GroupControl>,
    ) -> Self {
        Self {
            config,
            services,
            launcher,
            writer,
            control,
        }
    }

    /// Production wiring: systemd, the local filesystem and a Snapcast server
    pub fn system(config: DeployConfig) -> Self {
        let systemctl = Systemctl::new(config.use_sudo);
        let writer = FsArtifactWriter::with_sudo(config.use_sudo);
        let rpc = rpc_client::RpcClient::new(&config.server.host, config.server.port)
            .with_timeouts(config.control_timeout, config.control_timeout);
        Self::new(
            config.clone(),
            Arc::new(systemctl.clone()),
            Arc::new(SystemdClientLauncher::new(systemctl, config)),
            Arc::new(writer),
            Arc::new(SnapcastClient::with_rpc_client(rpc)),
        )
    }

    pub fn config(&self) -> &DeployConfig {
        &self.config
    }

    /// Run a full deployment
    ///
    /// Returns `Err` only when nothing was touched: an invalid deploy
    /// configuration, a held lock or a model that does not compile. Every
    /// other failure is recorded in the report.
    pub async fn run(&self, model: &ConfigModel) -> Result<DeployReport> {
        self.config.validate()?;
        let _lock = match &self.config.lock_path {
            Some(path) => Some(RunLock::acquire(path)?),
            None => None,
        };

        let compiled = compile_all(model)?;
        let mut report = DeployReport::default();

        if !self.write_artifacts(&compiled, &mut report).await {
            return Ok(report);
        }
        self.restart_services(&mut report).await;
        self.launch_clients(model, &mut report).await;
        self.await_clients(model, &mut report).await;
        self.name_clients(model, &mut report).await;
        self.converge_groups(model, &compiled, &mut report).await;

        tracing::info!(
            changes = report.group_changes.len(),
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            "deployment finished"
        );
        Ok(report)
    }

    /// Step 1. Returns false if the run must stop.
    async fn write_artifacts(&self, compiled: &Compiled, report: &mut DeployReport) -> bool {
        tracing::info!("writing configuration artifacts");
        let artifacts = [
            (&self.config.asound_path, compiled.asound_conf()),
            (&self.config.snapserver_path, compiled.snapserver_conf()),
        ];

        for (path, contents) in artifacts {
            if let Err(error) = self.writer.write(path, &contents).await {
                report.record(DeployError::process(path.display().to_string(), error));
                return false;
            }
            report.written.push(path.clone());
        }
        true
    }

    /// Step 2
    async fn restart_services(&self, report: &mut DeployReport) {
        let services = self
            .config
            .routing_service
            .iter()
            .chain(std::iter::once(&self.config.streaming_service));

        for service in services {
            tracing::info!(%service, "restarting service");
            match self.services.restart(service).await {
                Ok(()) => report.restarted.push(service.clone()),
                Err(error) => report.record(DeployError::process(service.as_str(), error)),
            }
        }
    }

    /// Step 3
    async fn launch_clients(&self, model: &ConfigModel, report: &mut DeployReport) {
        tracing::info!(rooms = model.rooms.len(), "ensuring room clients");
        let mut join = JoinSet::new();
        for room in model.rooms.keys() {
            let device = room_device_name(room);
            let launcher = Arc::clone(&self.launcher);
            join.spawn(async move {
                let result = launcher.ensure_running(&device).await;
                (device, result)
            });
        }

        let mut launched = Vec::new();
        while let Some(joined) = join.join_next().await {
            match joined {
                Ok((device, Ok(()))) => launched.push(device),
                Ok((device, Err(error))) => report.record(DeployError::process(device, error)),
                Err(error) => report.record(DeployError::process("client launch", error)),
            }
        }
        launched.sort();
        report.launched = launched;
    }

    /// Step 4
    async fn await_clients(&self, model: &ConfigModel, report: &mut DeployReport) {
        let expected: BTreeSet<String> = model.rooms.keys().map(room_device_name).collect();
        if expected.is_empty() {
            return;
        }

        tracing::info!(
            clients = expected.len(),
            deadline = ?self.config.connect_deadline,
            "waiting for room clients to connect"
        );
        let deadline = Instant::now() + self.config.connect_deadline;
        let mut missing = expected.clone();

        loop {
            match self.status().await {
                Ok(status) => {
                    let connected = status.connected_client_ids();
                    missing = expected.difference(&connected).cloned().collect();
                    if missing.is_empty() {
                        tracing::info!("all room clients connected");
                        return;
                    }
                    tracing::debug!(missing = missing.len(), "room clients not yet connected");
                }
                Err(error) => tracing::debug!(%error, "status poll failed"),
            }

            if Instant::now() + self.config.poll_interval > deadline {
                break;
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }

        report.record(DeployError::ReconciliationTimeout {
            missing: missing.into_iter().collect(),
        });
    }

    /// Step 5a: room clients carry their room's display name
    async fn name_clients(&self, model: &ConfigModel, report: &mut DeployReport) {
        let status = match self.status().await {
            Ok(status) => status,
            Err(error) => {
                report.record(DeployError::ControlProtocol {
                    stream: NAMING.to_string(),
                    rooms: model.rooms.keys().map(ToString::to_string).collect(),
                    source: error,
                });
                return;
            }
        };

        for room in model.rooms.keys() {
            let client_id = room_device_name(room);
            let Some(client) = status.find_client(&client_id) else {
                continue;
            };
            let name = model.room_display_name(room);
            if client.config.name == name {
                continue;
            }

            tracing::debug!(client = %client_id, %name, "renaming client");
            let call = self.control.set_client_name(&client_id, &name);
            let result = self.bounded("Client.SetName", &client_id, call).await;
            match result {
                Ok(()) => report.renamed_clients.push(client_id),
                Err(error) => report.record(DeployError::ControlProtocol {
                    stream: NAMING.to_string(),
                    rooms: vec![room.to_string()],
                    source: error,
                }),
            }
        }
    }

    /// Step 5b: one named group per stream, holding exactly its rooms' clients
    async fn converge_groups(
        &self,
        model: &ConfigModel,
        compiled: &Compiled,
        report: &mut DeployReport,
    ) {
        let (assignments, warnings) = resolve_overlaps(&compiled.streams.topology);
        for warning in warnings {
            report.warn(warning);
        }

        let mut claimed = BTreeSet::new();
        for assignment in &assignments {
            let name = group_name(model, assignment);
            if let Err(error) = self.converge_pair(assignment, &name, &mut claimed, report).await {
                report.record(DeployError::ControlProtocol {
                    stream: assignment.stream.to_string(),
                    rooms: assignment.rooms.iter().map(ToString::to_string).collect(),
                    source: error,
                });
            }
        }
    }

    async fn converge_pair(
        &self,
        assignment: &Assignment,
        name: &str,
        claimed: &mut BTreeSet<String>,
        report: &mut DeployReport,
    ) -> std::result::Result<(), ApiError> {
        // Earlier pairs may have moved clients; plan against fresh state.
        let status = self.status().await?;
        let (plan, warnings) = plan_group(&status, assignment, claimed);
        for warning in warnings {
            report.warn(warning);
        }
        let Some(plan) = plan else {
            return Ok(());
        };
        claimed.insert(plan.group_id.clone());

        if plan.is_noop() && plan.current_name == name {
            tracing::debug!(stream = %assignment.stream, group = %plan.group_id, "group up to date");
            return Ok(());
        }

        if plan.set_clients {
            tracing::info!(group = %plan.group_id, clients = ?plan.clients, "setting group clients");
            let call = self.control.set_group_clients(&plan.group_id, &plan.clients);
            self.bounded("Group.SetClients", &plan.group_id, call).await?;
            report.group_changes.push(GroupChange::Clients {
                group: plan.group_id.clone(),
                before: plan.current_clients.clone(),
                after: plan.clients.clone(),
            });
        }

        if plan.set_stream {
            tracing::info!(
                group = %plan.group_id,
                stream = %assignment.server_stream_id,
                "setting group stream"
            );
            let call = self
                .control
                .set_group_stream(&plan.group_id, &assignment.server_stream_id);
            self.bounded("Group.SetStream", &plan.group_id, call).await?;
            report.group_changes.push(GroupChange::Stream {
                group: plan.group_id.clone(),
                before: plan.current_stream.clone(),
                after: assignment.server_stream_id.clone(),
            });
        }

        if plan.current_name != name {
            tracing::info!(group = %plan.group_id, %name, "naming group");
            let call = self.control.set_group_name(&plan.group_id, name);
            self.bounded("Group.SetName", &plan.group_id, call).await?;
            report.group_changes.push(GroupChange::Name {
                group: plan.group_id.clone(),
                before: plan.current_name.clone(),
                after: name.to_string(),
            });
        }

        Ok(())
    }

    async fn status(&self) -> std::result::Result<ServerStatus, ApiError> {
        let target = self.config.server.to_string();
        self.bounded("Server.GetStatus", &target, self.control.status())
            .await
    }

    /// Apply the control timeout to one call
    async fn bounded<T>(
        &self,
        method: &str,
        target: &str,
        call: impl Future<Output = std::result::Result<T, ApiError>>,
    ) -> std::result::Result<T, ApiError> {
        match tokio::time::timeout(self.config.control_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ApiError::NetworkError {
                method: method.to_string(),
                target: target.to_string(),
                message: format!("no reply within {:?}", self.config.control_timeout),
            }),
        }
    }
}

/// Display name for the group hosting an assignment
///
/// A group holding one room takes the room's name; a group spanning
/// several rooms is named after its stream as the server lists it.
fn group_name(model: &ConfigModel, assignment: &Assignment) -> String {
    let mut rooms = assignment.rooms.iter();
    match (rooms.next(), rooms.next()) {
        (Some(room), None) => model.room_display_name(room),
        _ => assignment.server_stream_id.clone(),
    }
}
