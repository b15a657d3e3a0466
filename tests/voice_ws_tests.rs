//! End-to-end tests for the voice WebSocket channel against a spawned server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use futures::{SinkExt, Stream, StreamExt};
use parley_gateway::{ServerConfig, routes, state::AppState};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

async fn spawn_server() -> (SocketAddr, Arc<AppState>) {
    let state = AppState::new(ServerConfig::default()).unwrap();

    let app = Router::new()
        .merge(routes::voice::create_voice_router())
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, state)
}

/// Poll until `predicate` holds or a short deadline passes.
async fn wait_until<F: Fn() -> bool>(predicate: F) -> bool {
    for _ in 0..200 {
        if predicate() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    predicate()
}

async fn connect(
    addr: SocketAddr,
) -> tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
> {
    let (socket, _response) = tokio_tungstenite::connect_async(format!("ws://{addr}/voice"))
        .await
        .expect("websocket handshake");
    socket
}

/// Receive the next text or binary frame, skipping protocol frames.
async fn next_data_frame<S>(socket: &mut S) -> Message
where
    S: Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("timed out waiting for frame")
            .expect("stream ended")
            .expect("transport error");
        match msg {
            Message::Ping(_) | Message::Pong(_) => continue,
            other => return other,
        }
    }
}

#[tokio::test]
async fn connection_creates_session_with_idle_defaults() {
    let (addr, state) = spawn_server().await;
    let _socket = connect(addr).await;

    assert!(wait_until(|| state.voice_sessions.len() == 1).await);
    let session_id = session_id_of_only_session(&state);
    assert_eq!(state.voice_sessions.state(&session_id), Some((false, 16_000)));
}

#[tokio::test]
async fn binary_chunk_round_trips_as_transcript_then_audio() {
    let (addr, _state) = spawn_server().await;
    let mut socket = connect(addr).await;

    socket
        .send(Message::binary(b"hello".to_vec()))
        .await
        .unwrap();

    // Transcript first (JSON text frame), then the synthesized audio echo
    let first = next_data_frame(&mut socket).await;
    match first {
        Message::Text(text) => {
            let parsed: serde_json::Value = serde_json::from_str(text.as_str()).unwrap();
            assert_eq!(parsed["type"], "transcript");
            assert_eq!(parsed["text"], "[transcribed] hello");
        }
        other => panic!("expected transcript text frame, got {other:?}"),
    }

    let second = next_data_frame(&mut socket).await;
    match second {
        Message::Binary(data) => {
            assert_eq!(data.as_ref(), &b"[transcribed] hello"[..]);
        }
        other => panic!("expected binary audio frame, got {other:?}"),
    }
}

#[tokio::test]
async fn transcript_with_control_characters_is_valid_escaped_json() {
    let (addr, _state) = spawn_server().await;
    let mut socket = connect(addr).await;

    socket
        .send(Message::binary(b"say \"hi\"\nnew\tline".to_vec()))
        .await
        .unwrap();

    let frame = next_data_frame(&mut socket).await;
    match frame {
        Message::Text(text) => {
            let raw = text.as_str();
            assert!(raw.contains(r#"\"hi\""#));
            assert!(raw.contains(r"\n"));
            assert!(raw.contains(r"\t"));
            // And it still parses as a single JSON document
            let parsed: serde_json::Value = serde_json::from_str(raw).unwrap();
            assert_eq!(parsed["text"], "[transcribed] say \"hi\"\nnew\tline");
        }
        other => panic!("expected transcript text frame, got {other:?}"),
    }
}

#[tokio::test]
async fn control_frames_drive_session_state() {
    let (addr, state) = spawn_server().await;
    let mut socket = connect(addr).await;

    assert!(wait_until(|| state.voice_sessions.len() == 1).await);
    let session_id = session_id_of_only_session(&state);

    assert_eq!(state.voice_sessions.state(&session_id), Some((false, 16_000)));

    socket
        .send(Message::text(r#"{"type":"start"}"#))
        .await
        .unwrap();
    assert!(
        wait_until(|| state.voice_sessions.state(&session_id) == Some((true, 16_000))).await,
        "start directive should flip active without altering sample rate"
    );

    socket
        .send(Message::text(r#"{"type":"sample_rate","sample_rate":24000}"#))
        .await
        .unwrap();
    assert!(
        wait_until(|| state.voice_sessions.state(&session_id) == Some((true, 24_000))).await
    );

    socket
        .send(Message::text(r#"{"type":"end"}"#))
        .await
        .unwrap();
    assert!(
        wait_until(|| state.voice_sessions.state(&session_id) == Some((false, 24_000))).await
    );
}

#[tokio::test]
async fn malformed_control_frame_does_not_kill_the_connection() {
    let (addr, state) = spawn_server().await;
    let mut socket = connect(addr).await;

    assert!(wait_until(|| state.voice_sessions.len() == 1).await);

    socket.send(Message::text("start")).await.unwrap();
    socket
        .send(Message::text(r#"{"type":"sample_rate","sample_rate":"fast"}"#))
        .await
        .unwrap();

    // Connection is still serviceable afterwards
    socket
        .send(Message::binary(b"still here".to_vec()))
        .await
        .unwrap();
    let frame = next_data_frame(&mut socket).await;
    assert!(matches!(frame, Message::Text(_)));
}

#[tokio::test]
async fn close_removes_session_state() {
    let (addr, state) = spawn_server().await;
    let socket = connect(addr).await;

    assert!(wait_until(|| state.voice_sessions.len() == 1).await);

    drop(socket);
    assert!(
        wait_until(|| state.voice_sessions.is_empty()).await,
        "session table entry must be discarded on disconnect"
    );
}

/// With exactly one live session, fish its id out of the table.
fn session_id_of_only_session(state: &Arc<AppState>) -> String {
    state
        .voice_sessions
        .session_ids()
        .into_iter()
        .next()
        .expect("one live session")
}
