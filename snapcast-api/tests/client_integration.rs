//! End-to-end tests of `SnapcastClient` against a scripted control server

use std::sync::{Arc, Mutex};

use rstest::rstest;
use serde_json::{json, Value};
use snapcast_api::{ApiError, SnapcastClient};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

/// Serve every connection with `reply(request)` and record what was sent
async fn scripted_server<F>(reply: F) -> (u16, Arc<Mutex<Vec<Value>>>)
where
    F: Fn(&Value) -> Value + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = seen.clone();
    let reply = Arc::new(reply);

    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else { break };
            let log = log.clone();
            let reply = reply.clone();
            tokio::spawn(async move {
                let (reader, mut writer) = stream.into_split();
                let mut reader = BufReader::new(reader);
                let mut line = String::new();
                if reader.read_line(&mut line).await.unwrap_or(0) == 0 {
                    return;
                }
                let request: Value = serde_json::from_str(line.trim()).unwrap();
                let mut response = reply(&request);
                response["id"] = request["id"].clone();
                response["jsonrpc"] = json!("2.0");
                log.lock().unwrap().push(request);
                let _ = writer.write_all(format!("{}\r\n", response).as_bytes()).await;
            });
        }
    });

    (port, seen)
}

fn status_fixture() -> Value {
    json!({
        "server": {
            "groups": [
                {
                    "id": "4dcc4e3b-c699-a04b-7f0c-8260d23c43e1",
                    "name": "",
                    "stream_id": "default",
                    "muted": false,
                    "clients": [
                        {"id": "room_kitchen", "connected": true,
                         "config": {"name": "", "volume": {"percent": 100, "muted": false}, "latency": 0}},
                        {"id": "room_bath", "connected": true}
                    ]
                }
            ],
            "streams": [
                {"id": "default", "status": "idle", "uri": {"raw": "pipe:///tmp/snapfifo?name=default"}},
                {"id": "Spotify Haus", "status": "idle"}
            ]
        }
    })
}

#[tokio::test]
async fn test_status_round_trip() {
    let (port, seen) = scripted_server(|_| json!({"result": status_fixture()})).await;
    let client = SnapcastClient::new("127.0.0.1", port);

    let status = client.status().await.unwrap();

    assert_eq!(status.groups.len(), 1);
    assert_eq!(status.connected_client_ids().len(), 2);
    assert!(status.streams.iter().any(|s| s.id == "Spotify Haus"));

    let requests = seen.lock().unwrap();
    assert_eq!(requests[0]["method"], "Server.GetStatus");
    assert!(requests[0].get("params").is_none());
}

#[rstest]
#[case("Group.SetStream")]
#[case("Group.SetClients")]
#[case("Group.SetName")]
#[case("Client.SetName")]
#[tokio::test]
async fn test_setters_send_expected_method(#[case] method: &str) {
    let (port, seen) = scripted_server(|_| json!({"result": {}})).await;
    let client = SnapcastClient::new("127.0.0.1", port);

    match method {
        "Group.SetStream" => client.set_group_stream("g1", "Spotify Haus").await.unwrap(),
        "Group.SetClients" => client
            .set_group_clients("g1", &["room_kitchen".to_string()])
            .await
            .unwrap(),
        "Group.SetName" => client.set_group_name("g1", "Haus").await.unwrap(),
        "Client.SetName" => client.set_client_name("room_kitchen", "Kitchen").await.unwrap(),
        other => panic!("unexpected case {}", other),
    }

    let requests = seen.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["method"], method);
}

#[tokio::test]
async fn test_fault_carries_method_and_target() {
    let (port, _seen) = scripted_server(|_| {
        json!({"error": {"code": -32603, "message": "Group not found"}})
    })
    .await;
    let client = SnapcastClient::new("127.0.0.1", port);

    let error = client.set_group_stream("missing", "default").await.unwrap_err();

    match error {
        ApiError::Fault { method, target, code, message } => {
            assert_eq!(method, "Group.SetStream");
            assert_eq!(target, "missing");
            assert_eq!(code, -32603);
            assert_eq!(message, "Group not found");
        }
        other => panic!("Expected ApiError::Fault, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_status_is_parse_error() {
    let (port, _seen) = scripted_server(|_| json!({"result": {"server": {"groups": "nope"}}})).await;
    let client = SnapcastClient::new("127.0.0.1", port);

    let error = client.status().await.unwrap_err();

    assert!(matches!(error, ApiError::ParseError { .. }));
    assert_eq!(error.method(), Some("Server.GetStatus"));
    assert_eq!(error.target(), Some(client.address()));
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let client = SnapcastClient::new("127.0.0.1", port);
    let error = client.status().await.unwrap_err();

    assert!(matches!(error, ApiError::NetworkError { .. }));
}
