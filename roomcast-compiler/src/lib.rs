//! Configuration compiler for roomcast
//!
//! Turns a validated [`ConfigModel`](roomcast_config::ConfigModel) into the
//! two artifacts a multiroom installation needs:
//!
//! - [`routing`] - the ALSA device graph (`asound.conf`), including stereo
//!   rooms whose two speakers sit on different amplifiers
//! - [`streams`] - the Snapcast server sources (`snapserver.conf`) and the
//!   desired stream → room-set topology the reconciler converges to
//!
//! Both compilers are pure and deterministic. Any error means no output.
//!
//! ```rust,no_run
//! use roomcast_config::ConfigModel;
//! use roomcast_compiler::{routing, streams};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let model = ConfigModel::load("speaker_config.json")?;
//! let asound = routing::render_asound(&routing::compile(&model)?);
//! let snapserver = streams::render_snapserver(&streams::compile(&model)?);
//! # let _ = (asound, snapserver);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod routing;
pub mod streams;

pub use error::{CompileError, ConflictKind, Result};
pub use routing::{room_device_name, RoutingConfig};
pub use streams::{StreamConfig, StreamTopology};

/// Both compiled artifacts for one model
#[derive(Debug, Clone, PartialEq)]
pub struct Compiled {
    pub routing: RoutingConfig,
    pub streams: StreamConfig,
}

impl Compiled {
    pub fn asound_conf(&self) -> String {
        routing::render_asound(&self.routing)
    }

    pub fn snapserver_conf(&self) -> String {
        streams::render_snapserver(&self.streams)
    }
}

/// Compile routing and streams together; fails if either fails
pub fn compile_all(model: &roomcast_config::ConfigModel) -> Result<Compiled> {
    Ok(Compiled {
        routing: routing::compile(model)?,
        streams: streams::compile(model)?,
    })
}
