//! Loading model documents from disk

use std::io::Write;

use roomcast_config::{ConfigError, ConfigModel, RoomId, StreamId, StreamKind};
use rstest::rstest;

const HOUSE: &str = r#"{
    "version": "2.0",
    "global": {"max_volume": 0.25},
    "amplifiers": {
        "amp1": {"card": "GAB8", "channels": 8},
        "amp2": {"card": "GAB8", "channels": 8}
    },
    "inputs": {"line_in": {"card": "Device", "name": "Plattenspieler"}},
    "speakers": {
        "kitchen_l": {"amplifier": "amp1", "channel": 3, "volume": 80},
        "kitchen_r": {"amplifier": "amp2", "channel": 1},
        "bath": {"amplifier": "amp1", "channel": 5, "latency": 20}
    },
    "rooms": {
        "kitchen": {"name": "Küche", "left": "kitchen_l", "right": "kitchen_r", "zones": ["eg"]},
        "bath": {"right": "bath", "zones": ["og"]}
    },
    "zones": {
        "eg": {"name": "Erdgeschoss"},
        "og": {"name": "Obergeschoss"},
        "alle": {"name": "Alle", "include_all": true}
    },
    "snapcast": {
        "streams": {
            "default": {"type": "pipe", "path": "/tmp/snapfifo"},
            "spotify": {"type": "librespot", "name": "Haus"},
            "vinyl": {"type": "alsa", "input": "line_in"}
        },
        "stream_targets": {
            "spotify": {"zones": ["alle"]},
            "vinyl": {"zones": ["eg"], "rooms": ["bath"]}
        }
    }
}"#;

fn write_temp(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_full_document() {
    let file = write_temp(HOUSE);
    let model = ConfigModel::load(file.path()).unwrap();

    assert_eq!(model.max_volume(), 0.25);
    assert_eq!(model.amplifiers.len(), 2);
    assert_eq!(model.room_display_name(&RoomId::new("kitchen")), "Küche");
    assert_eq!(model.room_display_name(&RoomId::new("bath")), "bath");

    let vinyl = model.stream(&StreamId::new("vinyl")).unwrap();
    assert!(matches!(vinyl.kind, StreamKind::Alsa(_)));
    assert_eq!(model.snapcast.stream_targets.len(), 2);
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");
    match ConfigModel::load(&path) {
        Err(ConfigError::Io { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("Expected Io error, got {:?}", other),
    }
}

#[test]
fn test_load_malformed_json() {
    let file = write_temp("{\"version\": \"2.0\", ");
    assert!(matches!(ConfigModel::load(file.path()), Err(ConfigError::Parse(_))));
}

#[rstest]
#[case("\"channel\": 3", "\"channel\": 12")]
#[case("\"amplifier\": \"amp2\"", "\"amplifier\": \"amp7\"")]
#[case("\"zones\": [\"og\"]", "\"zones\": [\"dg\"]")]
#[case("\"input\": \"line_in\"", "\"input\": \"mic\"")]
#[case("\"max_volume\": 0.25", "\"max_volume\": -0.1")]
fn test_load_rejects_invalid_documents(#[case] from: &str, #[case] to: &str) {
    assert!(HOUSE.contains(from), "fixture lacks {}", from);
    let file = write_temp(&HOUSE.replacen(from, to, 1));
    let result = ConfigModel::load(file.path());
    assert!(
        matches!(
            result,
            Err(ConfigError::OutOfRange { .. }) | Err(ConfigError::UnresolvedReference { .. })
        ),
        "unexpected result {:?}",
        result
    );
}
