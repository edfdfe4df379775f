//! Routing compiler: model → ALSA device graph
//!
//! Every room becomes one endpoint device named `room_{id}` that a
//! streaming client can open. Internal plumbing devices carry the
//! `_internal_` prefix so that no client selecting a device by name prefix
//! can land on them.

mod compile;
mod matrix;
mod render;

pub use compile::{alsa_card_names, compile, gain};
pub use matrix::RoutingMatrix;
pub use render::render_asound;

use roomcast_config::{AmplifierId, RoomId};

/// Prefix shared by every device that is not meant to be opened directly
pub const INTERNAL_PREFIX: &str = "_internal_";

/// Name of the aggregate device playing to every room
pub const ALL_ROOMS_DEVICE: &str = "all_rooms";

/// Endpoint device name of a room; also the room's client host id
pub fn room_device_name(room: &RoomId) -> String {
    format!("room_{}", room)
}

/// Endpoint name of one side of a cross-amplifier room
pub fn speaker_device_name(room: &RoomId, side: Side) -> String {
    format!("speaker_{}_{}", room, side.as_str())
}

pub fn mixer_device_name(amp: &AmplifierId) -> String {
    format!("{}_dmix", amp)
}

/// Stereo position of a speaker within its room
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

/// Which part of the config a declaration belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Scope {
    Amplifier,
    Room,
    Aggregate,
}

/// How a device may be used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceRole {
    /// Raw card binding
    Hardware,
    /// Shared-access mixer over a card
    Mixer,
    /// Per-channel identification device
    Diagnostic,
    /// Plumbing behind an endpoint
    Internal,
    /// Opened by streaming clients, subject to the prefix rule
    Endpoint,
}

/// One slave of a multi device
#[derive(Debug, Clone, PartialEq)]
pub struct MultiSlave {
    pub pcm: String,
    pub channels: usize,
}

/// Maps one multi device channel onto a slave channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub slave: usize,
    pub channel: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeviceKind {
    Hardware { card: String, device: u32 },
    Mixer { slave: String, channels: usize, ipc_key: u32 },
    Route { slave: String, matrix: RoutingMatrix },
    Multi { slaves: Vec<MultiSlave>, bindings: Vec<Binding> },
    Plug { slave: String },
}

impl DeviceKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            DeviceKind::Hardware { .. } => "hw",
            DeviceKind::Mixer { .. } => "dmix",
            DeviceKind::Route { .. } => "route",
            DeviceKind::Multi { .. } => "multi",
            DeviceKind::Plug { .. } => "plug",
        }
    }
}

/// One generated device declaration
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceDecl {
    pub name: String,
    pub role: DeviceRole,
    pub scope: Scope,
    /// Rendered above the declaration
    pub comment: Option<String>,
    pub kind: DeviceKind,
}

/// Ordered device graph for one model
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingConfig {
    devices: Vec<DeviceDecl>,
}

impl RoutingConfig {
    pub(crate) fn new(devices: Vec<DeviceDecl>) -> Self {
        Self { devices }
    }

    pub fn devices(&self) -> &[DeviceDecl] {
        &self.devices
    }

    pub fn device(&self, name: &str) -> Option<&DeviceDecl> {
        self.devices.iter().find(|d| d.name == name)
    }

    /// Devices streaming clients may open, in declaration order
    pub fn endpoints(&self) -> impl Iterator<Item = &DeviceDecl> {
        self.devices.iter().filter(|d| d.role == DeviceRole::Endpoint)
    }

    /// The gain matrix behind a device, following plugs down to the route
    pub fn matrix_of(&self, name: &str) -> Option<&RoutingMatrix> {
        let mut current = self.device(name)?;
        loop {
            match &current.kind {
                DeviceKind::Route { matrix, .. } => return Some(matrix),
                DeviceKind::Plug { slave } => current = self.device(slave)?,
                _ => return None,
            }
        }
    }
}
