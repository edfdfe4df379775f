use rpc_client::RpcClient;

use crate::error::{ApiError, Result};
use crate::operation::SnapcastOperation;
use crate::operations::{
    GetStatusOperation, GetStatusRequest, SetClientNameOperation, SetClientNameRequest,
    SetGroupClientsOperation, SetGroupClientsRequest, SetGroupNameOperation, SetGroupNameRequest,
    SetGroupStreamOperation, SetGroupStreamRequest,
};
use crate::status::ServerStatus;

/// A client for executing Snapcast operations against one server
///
/// Bridges the stateless operation definitions and the JSON-RPC socket in
/// `rpc-client`. Each call is a single attempt; nothing is retried here.
#[derive(Debug, Clone)]
pub struct SnapcastClient {
    rpc: RpcClient,
}

impl SnapcastClient {
    /// Create a client for `host:port` with default timeouts
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            rpc: RpcClient::new(host, port),
        }
    }

    /// Create a client around a preconfigured RPC client
    pub fn with_rpc_client(rpc: RpcClient) -> Self {
        Self { rpc }
    }

    /// The `host:port` of the server
    pub fn address(&self) -> &str {
        self.rpc.address()
    }

    /// Execute any operation against the server
    ///
    /// The request is validated before anything is sent. Errors carry the
    /// method name and the group or client the call was aimed at.
    pub async fn execute<Op: SnapcastOperation>(&self, request: &Op::Request) -> Result<Op::Response> {
        let method = Op::method();
        let target = Op::target(request).unwrap_or_else(|| self.rpc.address().to_string());

        Op::validate(request)?;
        let params = Op::build_params(request)?;

        tracing::debug!(method = %method, target = %target, "executing Snapcast operation");

        let result = self
            .rpc
            .call(&method, params)
            .await
            .map_err(|e| ApiError::from_rpc(&method, &target, e))?;

        Op::parse_response(result).map_err(|e| match e {
            ApiError::ParseError { message, .. } => ApiError::ParseError {
                method: method.clone(),
                target: target.clone(),
                message,
            },
            other => other,
        })
    }

    /// Fetch groups, clients and streams
    pub async fn status(&self) -> Result<ServerStatus> {
        let response = self.execute::<GetStatusOperation>(&GetStatusRequest).await?;
        Ok(response.server)
    }

    /// Replace a group's membership
    pub async fn set_group_clients(&self, group_id: &str, clients: &[String]) -> Result<()> {
        self.execute::<SetGroupClientsOperation>(&SetGroupClientsRequest {
            id: group_id.to_string(),
            clients: clients.to_vec(),
        })
        .await
    }

    /// Assign a stream to a group
    pub async fn set_group_stream(&self, group_id: &str, stream_id: &str) -> Result<()> {
        self.execute::<SetGroupStreamOperation>(&SetGroupStreamRequest {
            id: group_id.to_string(),
            stream_id: stream_id.to_string(),
        })
        .await
    }

    pub async fn set_group_name(&self, group_id: &str, name: &str) -> Result<()> {
        self.execute::<SetGroupNameOperation>(&SetGroupNameRequest {
            id: group_id.to_string(),
            name: name.to_string(),
        })
        .await
    }

    pub async fn set_client_name(&self, client_id: &str, name: &str) -> Result<()> {
        self.execute::<SetClientNameOperation>(&SetClientNameRequest {
            id: client_id.to_string(),
            name: name.to_string(),
        })
        .await
    }
}
