//! Stream config compiler: model → server sources and stream topology
//!
//! The topology is the desired mapping from each targeted stream to the
//! set of rooms that should play it. It is recomputed from the current
//! model on every call; zones with `include_all` always expand to the full
//! room set as it is now.

mod render;

pub use render::render_snapserver;

use std::collections::{BTreeMap, BTreeSet};

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use roomcast_config::{ConfigModel, RoomId, StreamId, StreamKind, StreamSpec, StreamTarget};

use crate::error::{CompileError, ConflictKind, Result};

/// Everything but unreserved characters is escaped in URI parameters
const URI_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

const DEFAULT_SAMPLEFORMAT: &str = "48000:16:2";
const DEFAULT_CODEC: &str = "flac";
/// Spotify delivers 44.1 kHz
const LIBRESPOT_SAMPLEFORMAT: &str = "44100:16:2";

/// One `source = ...` line of the server config
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDecl {
    pub stream: StreamId,
    /// The server's stream id for this source
    pub server_name: String,
    pub uri: String,
}

/// Desired rooms for one stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamTopology {
    pub stream: StreamId,
    pub server_stream_id: String,
    pub rooms: BTreeSet<RoomId>,
}

/// Result of stream compilation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    pub sources: Vec<SourceDecl>,
    pub topology: Vec<StreamTopology>,
}

impl StreamConfig {
    pub fn topology_for(&self, stream: &StreamId) -> Option<&StreamTopology> {
        self.topology.iter().find(|t| &t.stream == stream)
    }
}

/// Compile sources and the stream → room-set mapping
pub fn compile(model: &ConfigModel) -> Result<StreamConfig> {
    model.validate()?;

    let mut sources = Vec::with_capacity(model.snapcast.streams.len());
    let mut names: BTreeMap<String, &StreamId> = BTreeMap::new();

    for (id, spec) in &model.snapcast.streams {
        let server_name = server_stream_name(model, id, spec);
        if let Some(previous) = names.insert(server_name.clone(), id) {
            return Err(CompileError::NamingConflict {
                name: format!("stream '{}' ({})", id, server_name),
                conflicts_with: format!("stream '{}'", previous),
                kind: ConflictKind::Collision,
            });
        }
        let uri = source_uri(model, id, spec, &server_name);
        sources.push(SourceDecl {
            stream: id.clone(),
            server_name,
            uri,
        });
    }

    let topology = model
        .snapcast
        .stream_targets
        .iter()
        .filter_map(|(id, target)| {
            let spec = model.stream(id)?;
            Some(StreamTopology {
                stream: id.clone(),
                server_stream_id: server_stream_name(model, id, spec),
                rooms: expand_target(model, target),
            })
        })
        .collect();

    tracing::debug!(sources = sources.len(), "compiled stream config");
    Ok(StreamConfig { sources, topology })
}

/// Rooms a target resolves to: its zones' members plus its explicit rooms
pub fn expand_target(model: &ConfigModel, target: &StreamTarget) -> BTreeSet<RoomId> {
    let mut rooms: BTreeSet<RoomId> = target
        .rooms
        .iter()
        .filter(|r| model.rooms.contains_key(*r))
        .cloned()
        .collect();
    for zone in &target.zones {
        rooms.extend(model.rooms_in_zone(zone));
    }
    rooms
}

/// The name the streaming server knows a stream by
///
/// Spotify and AirPlay receivers are prefixed with their kind, the `default`
/// pipe is `Default`, and a capture stream without a name takes its input's
/// name. Everything else uses the display name, or the id.
pub fn server_stream_name(model: &ConfigModel, id: &StreamId, spec: &StreamSpec) -> String {
    let name = spec.name.clone().unwrap_or_else(|| id.to_string());
    match &spec.kind {
        StreamKind::Librespot(_) => format!("Spotify {}", name),
        StreamKind::Airplay(_) => format!("AirPlay {}", name),
        StreamKind::Pipe(_) if id.as_str() == "default" => "Default".to_string(),
        StreamKind::Alsa(source) if spec.name.is_none() => source
            .input
            .as_ref()
            .and_then(|input| model.input(input))
            .and_then(|input| input.name.clone())
            .unwrap_or(name),
        _ => name,
    }
}

fn encode(value: &str) -> String {
    utf8_percent_encode(value, URI_VALUE).to_string()
}

fn source_uri(model: &ConfigModel, id: &StreamId, spec: &StreamSpec, server_name: &str) -> String {
    let name = encode(server_name);
    let device_name = spec.name.clone().unwrap_or_else(|| id.to_string());

    match &spec.kind {
        StreamKind::Pipe(source) => format!(
            "pipe://{}?name={}&sampleformat={}&codec={}",
            source
                .path
                .clone()
                .unwrap_or_else(|| format!("/tmp/snapfifo_{}", id)),
            name,
            source.sampleformat.as_deref().unwrap_or(DEFAULT_SAMPLEFORMAT),
            source.codec.as_deref().unwrap_or(DEFAULT_CODEC),
        ),
        StreamKind::Librespot(source) => format!(
            "librespot:///librespot?name={}&devicename={}&bitrate={}&cache={}&volume={}&sampleformat={}",
            name,
            encode(&device_name),
            source.bitrate,
            source
                .cache
                .clone()
                .unwrap_or_else(|| format!("/var/cache/snapserver/librespot-{}", id)),
            source.initial_volume,
            LIBRESPOT_SAMPLEFORMAT,
        ),
        StreamKind::Airplay(source) => match &source.config_file {
            // One shairport-sync process per receiver, each with its own config
            Some(config_file) => {
                let params = format!(
                    "-c {} -o stdout -a \"{}\" -p {}",
                    config_file, device_name, source.port
                );
                format!(
                    "process://{}?name={}&params={}",
                    source.shairport_path,
                    name,
                    encode(&params)
                )
            }
            None => format!(
                "airplay://{}?name={}&devicename={}&port={}&coverart=false",
                source.shairport_path,
                name,
                encode(&device_name),
                source.port
            ),
        },
        StreamKind::Alsa(source) => {
            let input = source.input.as_ref().and_then(|i| model.input(i));
            let device = match (&source.input, input) {
                (Some(_), Some(input)) => format!("hw:{}", input.card),
                (Some(input_id), None) => format!("hw:{}", input_id),
                (None, _) => source.device.clone().unwrap_or_else(|| "default".to_string()),
            };
            let sampleformat = source
                .sampleformat
                .clone()
                .or_else(|| input.map(|i| i.sampleformat.clone()))
                .unwrap_or_else(|| DEFAULT_SAMPLEFORMAT.to_string());
            format!(
                "alsa://?name={}&device={}&sampleformat={}",
                name, device, sampleformat
            )
        }
        StreamKind::Process(source) => format!(
            "process://{}?name={}&params={}",
            source.path,
            name,
            encode(&source.params)
        ),
        StreamKind::Tcp(source) => format!(
            "tcp://{}:{}?name={}&mode={}",
            source.host, source.port, name, source.mode
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn model_with_streams(streams: serde_json::Value) -> ConfigModel {
        ConfigModel::from_json_str(
            &json!({
                "version": "2.0",
                "inputs": {"line_in": {"card": "Device", "name": "Plattenspieler", "sampleformat": "44100:16:2"}},
                "snapcast": {"streams": streams}
            })
            .to_string(),
        )
        .unwrap()
    }

    #[rstest]
    #[case(json!({"type": "librespot", "name": "Haus"}), "spotify", "Spotify Haus")]
    #[case(json!({"type": "airplay", "name": "Haus"}), "airplay", "AirPlay Haus")]
    #[case(json!({"type": "pipe"}), "default", "Default")]
    #[case(json!({"type": "pipe", "name": "Radio"}), "radio", "Radio")]
    #[case(json!({"type": "tcp"}), "net", "net")]
    #[case(json!({"type": "alsa", "input": "line_in"}), "vinyl", "Plattenspieler")]
    #[case(json!({"type": "alsa", "input": "line_in", "name": "Vinyl"}), "vinyl", "Vinyl")]
    fn test_server_stream_name(#[case] spec: serde_json::Value, #[case] id: &str, #[case] expected: &str) {
        let model = model_with_streams(json!({ id: spec }));
        let id = StreamId::new(id);
        let spec = model.stream(&id).unwrap();
        assert_eq!(server_stream_name(&model, &id, spec), expected);
    }

    #[test]
    fn test_pipe_uri_defaults() {
        let model = model_with_streams(json!({"radio": {"type": "pipe", "name": "Radio Eins"}}));
        let config = compile(&model).unwrap();
        assert_eq!(
            config.sources[0].uri,
            "pipe:///tmp/snapfifo_radio?name=Radio%20Eins&sampleformat=48000:16:2&codec=flac"
        );
    }

    #[test]
    fn test_librespot_uri() {
        let model = model_with_streams(json!({"spotify": {"type": "librespot", "name": "Haus"}}));
        let config = compile(&model).unwrap();
        assert_eq!(
            config.sources[0].uri,
            "librespot:///librespot?name=Spotify%20Haus&devicename=Haus&bitrate=320&cache=/var/cache/snapserver/librespot-spotify&volume=50&sampleformat=44100:16:2"
        );
    }

    #[test]
    fn test_airplay_process_variant() {
        let model = model_with_streams(json!({
            "airplay": {"type": "airplay", "name": "Haus", "config_file": "/etc/shairport-haus.conf"}
        }));
        let config = compile(&model).unwrap();
        let uri = &config.sources[0].uri;
        assert!(uri.starts_with("process:///usr/local/bin/shairport-sync?name=AirPlay%20Haus&params="));
        assert!(uri.contains("-c%20%2Fetc%2Fshairport-haus.conf%20-o%20stdout"));
        assert!(uri.ends_with("-p%207000"));
    }

    #[test]
    fn test_airplay_native_variant() {
        let model = model_with_streams(json!({"airplay": {"type": "airplay", "name": "Haus", "port": 5000}}));
        let config = compile(&model).unwrap();
        assert_eq!(
            config.sources[0].uri,
            "airplay:///usr/local/bin/shairport-sync?name=AirPlay%20Haus&devicename=Haus&port=5000&coverart=false"
        );
    }

    #[test]
    fn test_alsa_uri_resolves_input() {
        let model = model_with_streams(json!({"vinyl": {"type": "alsa", "input": "line_in"}}));
        let config = compile(&model).unwrap();
        assert_eq!(
            config.sources[0].uri,
            "alsa://?name=Plattenspieler&device=hw:Device&sampleformat=44100:16:2"
        );
    }

    #[test]
    fn test_alsa_uri_raw_device() {
        let model = model_with_streams(json!({"mic": {"type": "alsa", "device": "hw:1,0"}}));
        let config = compile(&model).unwrap();
        assert_eq!(
            config.sources[0].uri,
            "alsa://?name=mic&device=hw:1,0&sampleformat=48000:16:2"
        );
    }

    #[test]
    fn test_tcp_and_process_uris() {
        let model = model_with_streams(json!({
            "net": {"type": "tcp", "port": 4954},
            "gen": {"type": "process", "path": "/usr/bin/gen", "params": "--tone 440"}
        }));
        let config = compile(&model).unwrap();
        assert_eq!(config.sources[0].uri, "process:///usr/bin/gen?name=gen&params=--tone%20440");
        assert_eq!(config.sources[1].uri, "tcp://0.0.0.0:4954?name=net&mode=server");
    }

    #[test]
    fn test_duplicate_server_names_rejected() {
        let model = model_with_streams(json!({
            "a": {"type": "librespot", "name": "Haus"},
            "b": {"type": "librespot", "name": "Haus"}
        }));
        assert!(matches!(
            compile(&model),
            Err(CompileError::NamingConflict { kind: ConflictKind::Collision, .. })
        ));
    }
}
