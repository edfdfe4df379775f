//! High-level Snapcast API for server control
//!
//! This crate provides a typed, trait-based API for the Snapcast control
//! protocol. It uses the private `rpc-client` crate for the JSON-RPC socket.
//!
//! ```rust,no_run
//! use snapcast_api::SnapcastClient;
//!
//! # async fn run() -> snapcast_api::Result<()> {
//! let client = SnapcastClient::new("localhost", 1705);
//! let status = client.status().await?;
//! for group in &status.groups {
//!     println!("{} -> {}", group.id, group.stream_id);
//! }
//! client.set_group_stream(&status.groups[0].id, "Spotify Haus").await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod operation;
pub mod operations;
pub mod service;
pub mod status;

pub use client::SnapcastClient;
pub use error::{ApiError, Result};
pub use operation::SnapcastOperation;
pub use service::Service;
pub use status::{Client, ClientConfig, Group, HostInfo, ServerStatus, Stream, Volume};
