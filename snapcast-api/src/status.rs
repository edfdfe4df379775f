//! Server status model as returned by `Server.GetStatus`
//!
//! Only the members the control tooling reads are modelled. Everything is
//! `#[serde(default)]` so older and newer servers parse alike.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Snapshot of groups, clients and streams on one server
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerStatus {
    pub groups: Vec<Group>,
    pub streams: Vec<Stream>,
}

/// A Snapcast group: a set of clients playing one stream
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub stream_id: String,
    pub muted: bool,
    pub clients: Vec<Client>,
}

/// A snapclient as the server sees it
///
/// The id equals the `--hostID` the client was started with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Client {
    pub id: String,
    pub connected: bool,
    pub config: ClientConfig,
    pub host: HostInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub name: String,
    pub volume: Volume,
    pub latency: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Volume {
    pub percent: u8,
    pub muted: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostInfo {
    pub name: String,
    pub ip: String,
    pub mac: String,
}

/// An audio source known to the server
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stream {
    pub id: String,
    pub status: String,
    pub uri: serde_json::Value,
}

impl ServerStatus {
    /// Ids of every client currently connected, across all groups
    pub fn connected_client_ids(&self) -> BTreeSet<String> {
        self.groups
            .iter()
            .flat_map(|g| g.clients.iter())
            .filter(|c| c.connected)
            .map(|c| c.id.clone())
            .collect()
    }

    /// Look up a client by id
    pub fn find_client(&self, client_id: &str) -> Option<&Client> {
        self.groups
            .iter()
            .flat_map(|g| g.clients.iter())
            .find(|c| c.id == client_id)
    }
}

impl Group {
    /// Ids of this group's clients, sorted
    pub fn client_ids(&self) -> BTreeSet<String> {
        self.clients.iter().map(|c| c.id.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> ServerStatus {
        serde_json::from_value(json!({
            "groups": [
                {
                    "id": "g1",
                    "name": "",
                    "stream_id": "default",
                    "muted": false,
                    "clients": [
                        {"id": "room_kitchen", "connected": true,
                         "config": {"name": "", "volume": {"percent": 100, "muted": false}, "latency": 0},
                         "host": {"name": "pi", "ip": "127.0.0.1", "mac": "00:00:00:00:00:00"}},
                        {"id": "room_bath", "connected": false}
                    ]
                },
                {"id": "g2", "stream_id": "Spotify Haus", "clients": [{"id": "room_office", "connected": true}]}
            ],
            "streams": [
                {"id": "default", "status": "idle", "uri": {"raw": "pipe:///tmp/snapfifo"}},
                {"id": "Spotify Haus", "status": "playing"}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_parse_partial_members() {
        let status = sample();
        assert_eq!(status.groups.len(), 2);
        assert_eq!(status.groups[1].name, "");
        assert_eq!(status.groups[0].clients[0].config.volume.percent, 100);
        assert_eq!(status.groups[0].clients[1].host.ip, "");
    }

    #[test]
    fn test_connected_client_ids() {
        let ids: Vec<String> = sample().connected_client_ids().into_iter().collect();
        assert_eq!(ids, vec!["room_kitchen".to_string(), "room_office".to_string()]);
    }

    #[test]
    fn test_find_client() {
        let status = sample();
        assert!(status.find_client("room_bath").is_some());
        assert!(status.find_client("room_garage").is_none());
    }
}
