use super::StreamConfig;

const HEADER: &str = "\
###############################################################################
#  Snapserver configuration - AUTO-GENERATED by roomcast, do not edit
###############################################################################

[server]
# Number of worker threads (-1 = auto)
threads = -1

[logging]
filter = *:info

# HTTP / websocket / JSON-RPC
[http]
enabled = true
bind_to_address = 0.0.0.0
port = 1780
doc_root = /usr/share/snapserver/snapweb

# TCP JSON-RPC control
[tcp]
enabled = true
bind_to_address = 0.0.0.0
port = 1705

[stream]
sampleformat = 48000:16:2
codec = flac
buffer = 200
chunk_ms = 26
send_to_muted = false

# Stream sources
";

/// Render the complete `snapserver.conf`, one source line per stream
pub fn render_snapserver(config: &StreamConfig) -> String {
    let mut out = String::from(HEADER);
    for source in &config.sources {
        out.push_str("source = ");
        out.push_str(&source.uri);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streams::SourceDecl;
    use roomcast_config::StreamId;

    #[test]
    fn test_render_sources_after_header() {
        let config = StreamConfig {
            sources: vec![
                SourceDecl {
                    stream: StreamId::new("default"),
                    server_name: "Default".to_string(),
                    uri: "pipe:///tmp/snapfifo?name=Default".to_string(),
                },
                SourceDecl {
                    stream: StreamId::new("spotify"),
                    server_name: "Spotify Haus".to_string(),
                    uri: "librespot:///librespot?name=Spotify%20Haus".to_string(),
                },
            ],
            topology: vec![],
        };

        let text = render_snapserver(&config);
        assert!(text.contains("[tcp]\nenabled = true\nbind_to_address = 0.0.0.0\nport = 1705\n"));
        assert!(text.ends_with(
            "# Stream sources\nsource = pipe:///tmp/snapfifo?name=Default\nsource = librespot:///librespot?name=Spotify%20Haus\n"
        ));
    }
}
