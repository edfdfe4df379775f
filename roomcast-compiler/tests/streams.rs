//! Stream targets and server config output

use std::collections::BTreeSet;

use roomcast_compiler::streams;
use roomcast_compiler::CompileError;
use roomcast_config::{ConfigModel, Room, RoomId, SpeakerId, StreamId};
use rstest::rstest;
use serde_json::{json, Value};

fn model(value: Value) -> ConfigModel {
    ConfigModel::from_json_str(&value.to_string()).unwrap()
}

fn rooms(names: &[&str]) -> BTreeSet<RoomId> {
    names.iter().map(|n| RoomId::new(*n)).collect()
}

fn house() -> Value {
    json!({
        "version": "2.0",
        "amplifiers": {"amp1": {}},
        "speakers": {
            "k": {"amplifier": "amp1", "channel": 1},
            "l": {"amplifier": "amp1", "channel": 2},
            "b": {"amplifier": "amp1", "channel": 3}
        },
        "rooms": {
            "kitchen": {"left": "k", "zones": ["eg"]},
            "living_room": {"left": "l", "zones": ["eg"]},
            "bath": {"left": "b", "zones": ["og"]}
        },
        "zones": {
            "alle": {"name": "Alle", "include_all": true},
            "eg": {"name": "Erdgeschoss"},
            "og": {"name": "Obergeschoss"}
        },
        "snapcast": {
            "streams": {
                "default": {"type": "pipe", "path": "/tmp/snapfifo"},
                "spotify": {"type": "librespot", "name": "Haus"},
                "airplay": {"type": "airplay", "name": "Haus"}
            },
            "stream_targets": {
                "spotify": {"zones": ["alle"]},
                "airplay": {"zones": ["og"], "rooms": ["kitchen"]}
            }
        }
    })
}

#[test]
fn test_include_all_zone_covers_every_room() {
    let doc = json!({
        "version": "2.0",
        "amplifiers": {"amp1": {}},
        "speakers": {"a": {"amplifier": "amp1", "channel": 1}, "b": {"amplifier": "amp1", "channel": 2}},
        "rooms": {"kitchen": {"left": "a"}, "living_room": {"left": "b"}},
        "zones": {"alle": {"include_all": true}},
        "snapcast": {
            "streams": {"spotify": {"type": "librespot"}},
            "stream_targets": {"spotify": {"zones": ["alle"]}}
        }
    });
    let config = streams::compile(&model(doc)).unwrap();
    let topology = config.topology_for(&StreamId::new("spotify")).unwrap();
    assert_eq!(topology.rooms, rooms(&["kitchen", "living_room"]));
    assert_eq!(topology.server_stream_id, "Spotify spotify");
}

#[test]
fn test_include_all_tracks_room_additions() {
    let mut model = model(house());
    let before = streams::compile(&model).unwrap();
    assert_eq!(before.topology_for(&StreamId::new("spotify")).unwrap().rooms.len(), 3);

    model.rooms.insert(
        RoomId::new("attic"),
        Room {
            name: "Dachboden".to_string(),
            left: Some(SpeakerId::new("b")),
            right: None,
            zones: BTreeSet::new(),
        },
    );
    let after = streams::compile(&model).unwrap();
    assert_eq!(
        after.topology_for(&StreamId::new("spotify")).unwrap().rooms,
        rooms(&["attic", "bath", "kitchen", "living_room"])
    );
}

#[test]
fn test_zones_and_explicit_rooms_union() {
    let config = streams::compile(&model(house())).unwrap();
    let airplay = config.topology_for(&StreamId::new("airplay")).unwrap();
    assert_eq!(airplay.rooms, rooms(&["bath", "kitchen"]));
    assert_eq!(airplay.server_stream_id, "AirPlay Haus");
    assert!(config.topology_for(&StreamId::new("default")).is_none());
}

#[rstest]
#[case("/snapcast/stream_targets/spotify/zones", json!(["dg"]))]
#[case("/snapcast/stream_targets/spotify/rooms", json!(["garage"]))]
fn test_undeclared_references(#[case] pointer: &str, #[case] value: Value) {
    let mut doc = house();
    *doc.pointer_mut(pointer).unwrap_or_else(|| panic!("missing {}", pointer)) = value;
    assert!(matches!(streams::compile(&model(doc)), Err(CompileError::Validation(_))));
}

#[test]
fn test_undeclared_stream_in_target() {
    let mut doc = house();
    doc["snapcast"]["stream_targets"]["radio"] = json!({"zones": ["eg"]});
    assert!(matches!(streams::compile(&model(doc)), Err(CompileError::Validation(_))));
}

#[test]
fn test_snapserver_conf_sorted_by_stream_id() {
    let config = streams::compile(&model(house())).unwrap();
    let text = streams::render_snapserver(&config);
    let sources: Vec<&str> = text.lines().filter(|l| l.starts_with("source = ")).collect();
    assert_eq!(sources.len(), 3);
    assert!(sources[0].starts_with("source = airplay://"));
    assert!(sources[1].starts_with("source = pipe:///tmp/snapfifo?name=Default&"));
    assert!(sources[2].starts_with("source = librespot://"));
    assert_eq!(text, streams::render_snapserver(&streams::compile(&model(house())).unwrap()));
}
