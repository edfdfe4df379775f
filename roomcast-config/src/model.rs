//! The declarative system model and its validation

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ConfigError, Result};
use crate::ids::{AmplifierId, InputId, RoomId, SpeakerId, StreamId, ZoneId};
use crate::streams::{StreamKind, StreamSpec, StreamTarget};
use crate::unique::reject_duplicate_keys;

/// The only document version this crate understands
pub const SUPPORTED_VERSION: &str = "2.0";

/// Default hard ceiling on output gain
pub const DEFAULT_MAX_VOLUME: f64 = 0.5;

/// Complete model snapshot
///
/// Loaded once per invocation. Compilers take it by shared reference and
/// never mutate it. Maps are ordered by id so every derived artifact is
/// deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigModel {
    pub version: String,
    #[serde(default)]
    pub global: GlobalSettings,
    #[serde(default)]
    pub amplifiers: BTreeMap<AmplifierId, Amplifier>,
    #[serde(default)]
    pub inputs: BTreeMap<InputId, Input>,
    #[serde(default)]
    pub speakers: BTreeMap<SpeakerId, Speaker>,
    #[serde(default)]
    pub rooms: BTreeMap<RoomId, Room>,
    #[serde(default)]
    pub zones: BTreeMap<ZoneId, Zone>,
    #[serde(default)]
    pub snapcast: SnapcastSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalSettings {
    /// Multiplier applied to every speaker gain, in [0, 1]
    pub max_volume: f64,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            max_volume: DEFAULT_MAX_VOLUME,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Amplifier {
    /// Base card identifier as reported by the driver
    #[serde(default = "default_card")]
    pub card: String,
    #[serde(default = "default_amplifier_channels")]
    pub channels: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Input {
    pub card: String,
    #[serde(default = "default_input_channels")]
    pub channels: u32,
    #[serde(default = "default_sampleformat")]
    pub sampleformat: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Speaker {
    pub amplifier: AmplifierId,
    /// 1-based channel on the amplifier
    pub channel: u32,
    #[serde(default = "default_volume")]
    pub volume: u32,
    #[serde(default)]
    pub latency: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    /// Display name; empty in the document means "use the id"
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<SpeakerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<SpeakerId>,
    #[serde(default)]
    pub zones: BTreeSet<ZoneId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    #[serde(default)]
    pub name: String,
    /// Always denotes the full current room set
    #[serde(default)]
    pub include_all: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapcastSection {
    pub streams: BTreeMap<StreamId, StreamSpec>,
    pub stream_targets: BTreeMap<StreamId, StreamTarget>,
}

fn default_card() -> String {
    "GAB8".to_string()
}

fn default_amplifier_channels() -> u32 {
    8
}

fn default_input_channels() -> u32 {
    2
}

fn default_sampleformat() -> String {
    "48000:16:2".to_string()
}

fn default_volume() -> u32 {
    100
}

impl ConfigModel {
    /// Read, parse and validate a model file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let model = Self::from_json_str(&text)?;
        model.validate()?;
        tracing::debug!(
            path = %path.display(),
            amplifiers = model.amplifiers.len(),
            rooms = model.rooms.len(),
            streams = model.snapcast.streams.len(),
            "loaded model"
        );
        Ok(model)
    }

    /// Parse a model without validating references or ranges
    ///
    /// Streams without a `type` are pipes, and rooms without a name are
    /// named after their id. An id repeated within a section is rejected.
    pub fn from_json_str(text: &str) -> Result<Self> {
        reject_duplicate_keys(text)?;
        let mut document: Value = serde_json::from_str(text)?;

        if let Some(streams) = document
            .pointer_mut("/snapcast/streams")
            .and_then(Value::as_object_mut)
        {
            for stream in streams.values_mut() {
                if let Some(stream) = stream.as_object_mut() {
                    stream
                        .entry("type")
                        .or_insert_with(|| Value::String("pipe".to_string()));
                }
            }
        }

        let mut model: ConfigModel = serde_json::from_value(document)?;
        for (id, room) in model.rooms.iter_mut() {
            if room.name.is_empty() {
                room.name = id.to_string();
            }
        }
        Ok(model)
    }

    /// Check every reference and numeric bound
    ///
    /// Entities are checked in id order and the first problem is returned.
    pub fn validate(&self) -> Result<()> {
        if self.version != SUPPORTED_VERSION {
            return Err(ConfigError::UnsupportedVersion {
                found: self.version.clone(),
            });
        }

        let max_volume = self.global.max_volume;
        if !(0.0..=1.0).contains(&max_volume) {
            return Err(ConfigError::OutOfRange {
                owner: "global".to_string(),
                field: "max_volume",
                value: max_volume,
                min: 0.0,
                max: 1.0,
            });
        }

        for (id, amp) in &self.amplifiers {
            if amp.channels == 0 {
                return Err(ConfigError::OutOfRange {
                    owner: format!("amplifier '{}'", id),
                    field: "channels",
                    value: 0.0,
                    min: 1.0,
                    max: f64::from(u32::MAX),
                });
            }
        }

        for (id, input) in &self.inputs {
            if input.channels == 0 {
                return Err(ConfigError::OutOfRange {
                    owner: format!("input '{}'", id),
                    field: "channels",
                    value: 0.0,
                    min: 1.0,
                    max: f64::from(u32::MAX),
                });
            }
        }

        for (id, speaker) in &self.speakers {
            self.validate_speaker(id, speaker)?;
        }

        for (id, room) in &self.rooms {
            self.validate_room(id, room)?;
        }

        for (id, stream) in &self.snapcast.streams {
            if let StreamKind::Alsa(source) = &stream.kind {
                if let Some(input) = &source.input {
                    if !self.inputs.contains_key(input) {
                        return Err(ConfigError::UnresolvedReference {
                            kind: "input",
                            id: input.to_string(),
                            referrer: format!("stream '{}'", id),
                        });
                    }
                }
            }
        }

        for (id, target) in &self.snapcast.stream_targets {
            self.validate_target(id, target)?;
        }

        Ok(())
    }

    fn validate_speaker(&self, id: &SpeakerId, speaker: &Speaker) -> Result<()> {
        let owner = format!("speaker '{}'", id);
        let amp = self
            .amplifiers
            .get(&speaker.amplifier)
            .ok_or_else(|| ConfigError::UnresolvedReference {
                kind: "amplifier",
                id: speaker.amplifier.to_string(),
                referrer: owner.clone(),
            })?;

        if speaker.channel < 1 || speaker.channel > amp.channels {
            return Err(ConfigError::OutOfRange {
                owner,
                field: "channel",
                value: f64::from(speaker.channel),
                min: 1.0,
                max: f64::from(amp.channels),
            });
        }

        if speaker.volume > 100 {
            return Err(ConfigError::OutOfRange {
                owner,
                field: "volume",
                value: f64::from(speaker.volume),
                min: 0.0,
                max: 100.0,
            });
        }

        if speaker.latency < 0 {
            return Err(ConfigError::OutOfRange {
                owner,
                field: "latency",
                value: speaker.latency as f64,
                min: 0.0,
                max: f64::INFINITY,
            });
        }

        Ok(())
    }

    fn validate_room(&self, id: &RoomId, room: &Room) -> Result<()> {
        if room.left.is_none() && room.right.is_none() {
            return Err(ConfigError::EmptyRoom { room: id.to_string() });
        }

        for speaker in room.left.iter().chain(room.right.iter()) {
            if !self.speakers.contains_key(speaker) {
                return Err(ConfigError::UnresolvedReference {
                    kind: "speaker",
                    id: speaker.to_string(),
                    referrer: format!("room '{}'", id),
                });
            }
        }

        for zone in &room.zones {
            if !self.zones.contains_key(zone) {
                return Err(ConfigError::UnresolvedReference {
                    kind: "zone",
                    id: zone.to_string(),
                    referrer: format!("room '{}'", id),
                });
            }
        }

        Ok(())
    }

    fn validate_target(&self, id: &StreamId, target: &StreamTarget) -> Result<()> {
        let referrer = format!("stream target '{}'", id);

        if !self.snapcast.streams.contains_key(id) {
            return Err(ConfigError::UnresolvedReference {
                kind: "stream",
                id: id.to_string(),
                referrer,
            });
        }

        for zone in &target.zones {
            if !self.zones.contains_key(zone) {
                return Err(ConfigError::UnresolvedReference {
                    kind: "zone",
                    id: zone.to_string(),
                    referrer,
                });
            }
        }

        for room in &target.rooms {
            if !self.rooms.contains_key(room) {
                return Err(ConfigError::UnresolvedReference {
                    kind: "room",
                    id: room.to_string(),
                    referrer,
                });
            }
        }

        Ok(())
    }

    pub fn max_volume(&self) -> f64 {
        self.global.max_volume
    }

    pub fn amplifier(&self, id: &AmplifierId) -> Option<&Amplifier> {
        self.amplifiers.get(id)
    }

    pub fn input(&self, id: &InputId) -> Option<&Input> {
        self.inputs.get(id)
    }

    pub fn speaker(&self, id: &SpeakerId) -> Option<&Speaker> {
        self.speakers.get(id)
    }

    pub fn room(&self, id: &RoomId) -> Option<&Room> {
        self.rooms.get(id)
    }

    pub fn zone(&self, id: &ZoneId) -> Option<&Zone> {
        self.zones.get(id)
    }

    pub fn stream(&self, id: &StreamId) -> Option<&StreamSpec> {
        self.snapcast.streams.get(id)
    }

    /// Rooms that belong to a zone, computed from the current room set
    ///
    /// An `include_all` zone yields every room. An unknown zone yields none.
    pub fn rooms_in_zone(&self, zone_id: &ZoneId) -> BTreeSet<RoomId> {
        let Some(zone) = self.zones.get(zone_id) else {
            return BTreeSet::new();
        };

        if zone.include_all {
            return self.rooms.keys().cloned().collect();
        }

        self.rooms
            .iter()
            .filter(|(_, room)| room.zones.contains(zone_id))
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Display name of a room, falling back to its id
    pub fn room_display_name(&self, id: &RoomId) -> String {
        match self.rooms.get(id) {
            Some(room) if !room.name.is_empty() => room.name.clone(),
            _ => id.to_string(),
        }
    }
}
