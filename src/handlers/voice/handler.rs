//! Voice WebSocket handler.
//!
//! Owns the lifecycle of one audio session: per-connection state, dispatch
//! of binary audio frames to the processing collaborator, dispatch of text
//! control frames to the directive parser, and re-serialization of
//! collaborator callbacks onto the same connection.
//!
//! All outbound writes funnel through a dedicated sender task fed by an
//! mpsc channel, so callbacks firing from collaborator tasks can never
//! interleave the bytes of a single frame.

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::{select, time::Duration};
use tracing::{debug, info, warn};

use crate::core::audio::ChunkCallbacks;
use crate::middleware::connection_limit::{ClientIp, MaybeClientIp};
use crate::state::AppState;

use super::messages::{
    MAX_CONTROL_FRAME_SIZE, VoiceControlMessage, VoiceFrame, VoiceOutgoingMessage,
};
use super::sessions::VoiceSessions;

/// Optimized channel buffer size for audio workloads
const CHANNEL_BUFFER_SIZE: usize = 1024;

/// Maximum WebSocket frame size (10 MB)
const MAX_WS_FRAME_SIZE: usize = 10 * 1024 * 1024;

/// Maximum WebSocket message size (10 MB)
const MAX_WS_MESSAGE_SIZE: usize = 10 * 1024 * 1024;

/// How often the stale-connection check runs
const IDLE_CHECK_INTERVAL: Duration = Duration::from_secs(30);

/// Maximum idle time before closing the connection
const IDLE_TIMEOUT: Duration = Duration::from_secs(300);

/// Voice WebSocket handler
///
/// Upgrades the HTTP connection to WebSocket for real-time audio
/// processing: raw audio chunks in, transcript frames and synthesized
/// audio out.
pub async fn voice_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    MaybeClientIp(client_ip): MaybeClientIp,
) -> Response {
    info!("Voice WebSocket connection upgrade requested");

    ws.max_frame_size(MAX_WS_FRAME_SIZE)
        .max_message_size(MAX_WS_MESSAGE_SIZE)
        .on_upgrade(move |socket| handle_voice_socket(socket, state, client_ip))
}

/// Handle one voice WebSocket connection from upgrade to teardown.
async fn handle_voice_socket(socket: WebSocket, state: Arc<AppState>, client_ip: Option<ClientIp>) {
    let session_id = uuid::Uuid::new_v4().to_string();
    info!(session_id = %session_id, "Voice WebSocket connection established");

    let (mut sender, mut receiver) = socket.split();
    let (frame_tx, mut frame_rx) = mpsc::channel::<VoiceFrame>(CHANNEL_BUFFER_SIZE);

    // Sender task: the single writer for this connection
    let sender_task = tokio::spawn(async move {
        while let Some(frame) = frame_rx.recv().await {
            let should_close = matches!(frame, VoiceFrame::Close);

            let result = match frame {
                VoiceFrame::Outgoing(message) => match serde_json::to_string(&message) {
                    Ok(json_str) => sender.send(Message::Text(json_str.into())).await,
                    Err(e) => {
                        warn!("Failed to serialize outgoing voice message: {}", e);
                        continue;
                    }
                },
                VoiceFrame::Audio(data) => sender.send(Message::Binary(data)).await,
                VoiceFrame::Close => sender.send(Message::Close(None)).await,
            };

            if let Err(e) = result {
                debug!("Failed to send voice WebSocket frame: {}", e);
                break;
            }

            if should_close {
                break;
            }
        }
    });

    // Session record exists for exactly the socket's lifetime
    state.voice_sessions.insert(&session_id, frame_tx);

    let mut last_activity = std::time::Instant::now();

    loop {
        select! {
            msg_result = receiver.next() => {
                last_activity = std::time::Instant::now();

                match msg_result {
                    Some(Ok(msg)) => {
                        let continue_processing =
                            process_voice_message(msg, &session_id, &state).await;
                        if !continue_processing {
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        warn!(session_id = %session_id, "Voice WebSocket transport error: {}", e);
                        break;
                    }
                    None => {
                        info!(session_id = %session_id, "Voice WebSocket closed by client");
                        break;
                    }
                }
            }
            _ = tokio::time::sleep(IDLE_CHECK_INTERVAL) => {
                if last_activity.elapsed() > IDLE_TIMEOUT {
                    warn!(
                        session_id = %session_id,
                        "Voice WebSocket idle for {}s, closing stale connection",
                        last_activity.elapsed().as_secs()
                    );
                    break;
                }
                debug!(session_id = %session_id, "Voice WebSocket idle check - still active");
            }
        }
    }

    // Cleanup. Close and transport-error paths both land here, and the
    // remove() guard makes the collaborator notification fire exactly once.
    if state.voice_sessions.remove(&session_id) {
        state.audio_processor.on_session_closed(&session_id).await;
    }

    sender_task.abort();

    if let Some(ClientIp(ip)) = client_ip {
        state.release_connection(ip);
    }

    info!(session_id = %session_id, "Voice WebSocket connection terminated");
}

/// Process one inbound WebSocket message.
///
/// Returns `false` to terminate the connection.
async fn process_voice_message(msg: Message, session_id: &str, state: &Arc<AppState>) -> bool {
    match msg {
        Message::Binary(data) => {
            debug!(session_id = %session_id, bytes = data.len(), "Received audio chunk");
            dispatch_audio_chunk(session_id, data, state).await;
            true
        }
        Message::Text(text) => {
            handle_control_frame(session_id, &text, &state.voice_sessions);
            true
        }
        Message::Ping(_) | Message::Pong(_) => true,
        Message::Close(_) => {
            info!(session_id = %session_id, "Voice WebSocket close received");
            false
        }
    }
}

/// Forward one audio chunk to the processing collaborator, wiring its
/// callbacks back to this connection's sender task.
async fn dispatch_audio_chunk(session_id: &str, chunk: Bytes, state: &Arc<AppState>) {
    let callbacks = connection_callbacks(session_id, state.voice_sessions.clone());
    state
        .audio_processor
        .process_chunk(session_id, chunk, callbacks)
        .await;
}

/// Build the callback pair that re-serializes collaborator output onto the
/// owning connection. Both callbacks look the session up at fire time, so
/// anything arriving after session removal is dropped.
fn connection_callbacks(session_id: &str, sessions: Arc<VoiceSessions>) -> ChunkCallbacks {
    let transcript_sessions = sessions.clone();
    let transcript_session_id = session_id.to_string();
    let audio_session_id = session_id.to_string();

    ChunkCallbacks {
        on_transcript: Arc::new(move |text: String| {
            let sessions = transcript_sessions.clone();
            let session_id = transcript_session_id.clone();
            Box::pin(async move {
                if let Some(frames) = sessions.frames(&session_id) {
                    let _ = frames
                        .send(VoiceFrame::Outgoing(VoiceOutgoingMessage::Transcript {
                            text,
                        }))
                        .await;
                } else {
                    debug!(session_id = %session_id, "Dropping transcript for closed session");
                }
            })
        }),
        on_audio: Arc::new(move |data: Bytes| {
            let sessions = sessions.clone();
            let session_id = audio_session_id.clone();
            Box::pin(async move {
                if let Some(frames) = sessions.frames(&session_id) {
                    let _ = frames.send(VoiceFrame::Audio(data)).await;
                } else {
                    debug!(session_id = %session_id, "Dropping audio for closed session");
                }
            })
        }),
    }
}

/// Apply one control directive to the session.
///
/// Malformed control frames are logged and ignored; the connection
/// survives them.
fn handle_control_frame(session_id: &str, payload: &str, sessions: &VoiceSessions) {
    if payload.len() > MAX_CONTROL_FRAME_SIZE {
        warn!(
            session_id = %session_id,
            bytes = payload.len(),
            "Ignoring oversized control frame"
        );
        return;
    }

    let directive: VoiceControlMessage = match serde_json::from_str(payload) {
        Ok(directive) => directive,
        Err(e) => {
            debug!(session_id = %session_id, "Ignoring unparseable control frame: {}", e);
            return;
        }
    };

    match directive {
        VoiceControlMessage::Start => {
            debug!(session_id = %session_id, "Session marked active");
            sessions.set_active(session_id, true);
        }
        VoiceControlMessage::End => {
            debug!(session_id = %session_id, "Session marked idle");
            sessions.set_active(session_id, false);
        }
        VoiceControlMessage::SampleRate { sample_rate } => {
            if VoiceControlMessage::sample_rate_in_range(sample_rate) {
                debug!(session_id = %session_id, sample_rate, "Sample rate updated");
                sessions.set_sample_rate(session_id, sample_rate);
            } else {
                warn!(
                    session_id = %session_id,
                    sample_rate,
                    "Ignoring out-of-range sample rate directive"
                );
            }
        }
    }
}
