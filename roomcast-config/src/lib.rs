//! Declarative model for a multi-amplifier, multi-room audio system
//!
//! A model names amplifiers and their channels, the speakers wired to them,
//! the rooms those speakers form, the zones rooms belong to, and the audio
//! streams that should play in which zones. It is loaded once per
//! invocation and shared read-only by the compilers and the reconciler.
//!
//! ```rust,no_run
//! use roomcast_config::{ConfigModel, ZoneId};
//!
//! # fn main() -> roomcast_config::Result<()> {
//! let model = ConfigModel::load("speaker_config.json")?;
//! for room in model.rooms_in_zone(&ZoneId::new("alle")) {
//!     println!("{}", room);
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod ids;
pub mod model;
pub mod streams;
mod unique;

pub use error::{ConfigError, Result};
pub use ids::{AmplifierId, InputId, RoomId, SpeakerId, StreamId, ZoneId};
pub use model::{
    Amplifier, ConfigModel, GlobalSettings, Input, Room, SnapcastSection, Speaker, Zone,
    DEFAULT_MAX_VOLUME, SUPPORTED_VERSION,
};
pub use streams::{
    AirplaySource, AlsaSource, LibrespotSource, PipeSource, ProcessSource, StreamKind, StreamSpec,
    StreamTarget, TcpSource,
};
