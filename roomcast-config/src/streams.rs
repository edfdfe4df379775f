//! Stream declarations and their stream → zone/room targets
//!
//! The `type` member selects the source kind. Parameters a kind leaves out
//! are filled with the defaults below; path-like defaults that depend on
//! the stream id are resolved by the stream compiler.

use serde::{Deserialize, Serialize};

use crate::ids::{InputId, RoomId, ZoneId};

/// One audio source as declared in the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamSpec {
    /// Display name; for Spotify and AirPlay also the advertised device name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(flatten)]
    pub kind: StreamKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamKind {
    /// Named pipe fed by a local player
    Pipe(PipeSource),
    /// Spotify Connect receiver
    Librespot(LibrespotSource),
    /// AirPlay receiver
    Airplay(AirplaySource),
    /// Capture from a sound card input
    Alsa(AlsaSource),
    /// Arbitrary process writing PCM to stdout
    Process(ProcessSource),
    /// PCM over a TCP socket
    Tcp(TcpSource),
}

impl StreamKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            StreamKind::Pipe(_) => "pipe",
            StreamKind::Librespot(_) => "librespot",
            StreamKind::Airplay(_) => "airplay",
            StreamKind::Alsa(_) => "alsa",
            StreamKind::Process(_) => "process",
            StreamKind::Tcp(_) => "tcp",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipeSource {
    /// Defaults to `/tmp/snapfifo_{id}`
    pub path: Option<String>,
    pub sampleformat: Option<String>,
    pub codec: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibrespotSource {
    pub bitrate: u32,
    pub initial_volume: u32,
    /// Credential cache; defaults to `/var/cache/snapserver/librespot-{id}`
    pub cache: Option<String>,
}

impl Default for LibrespotSource {
    fn default() -> Self {
        Self {
            bitrate: 320,
            initial_volume: 50,
            cache: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AirplaySource {
    pub port: u16,
    pub shairport_path: String,
    /// When set, shairport-sync runs as a process source with this config
    pub config_file: Option<String>,
}

impl Default for AirplaySource {
    fn default() -> Self {
        Self {
            port: 7000,
            shairport_path: "/usr/local/bin/shairport-sync".to_string(),
            config_file: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlsaSource {
    /// Declared input to capture from
    pub input: Option<InputId>,
    /// Raw device string, used when no input is referenced
    pub device: Option<String>,
    pub sampleformat: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessSource {
    pub path: String,
    pub params: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TcpSource {
    pub host: String,
    pub port: u16,
    pub mode: String,
}

impl Default for TcpSource {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4953,
            mode: "server".to_string(),
        }
    }
}

/// Where a stream should play
///
/// The room set is the union of the zones' members and the explicit rooms.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamTarget {
    pub zones: Vec<ZoneId>,
    pub rooms: Vec<RoomId>,
}
