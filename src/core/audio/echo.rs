//! Deterministic audio-processing stand-in.

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use super::{AudioProcessor, ChunkCallbacks};

/// Maximum characters of a chunk echoed into the fake transcript
const TRANSCRIPT_PREVIEW_LIMIT: usize = 200;

/// Prefix on every fake transcript
pub const TRANSCRIPT_PREFIX: &str = "[transcribed] ";

/// Stand-in collaborator: treats each chunk's bytes as text, emits a fake
/// transcript, then echoes the transcript bytes back as "synthesized" audio.
/// Production deployments replace this with a real STT/TTS pipeline.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoAudioProcessor;

impl EchoAudioProcessor {
    /// Create a new echo processor.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AudioProcessor for EchoAudioProcessor {
    async fn process_chunk(&self, session_id: &str, chunk: Bytes, callbacks: ChunkCallbacks) {
        let session_id = session_id.to_string();
        // Asynchronous by contract: the inbound frame handler must not
        // depend on same-task callback delivery.
        tokio::spawn(async move {
            let mut preview = String::from_utf8_lossy(&chunk).into_owned();
            if preview.chars().count() > TRANSCRIPT_PREVIEW_LIMIT {
                preview = preview.chars().take(TRANSCRIPT_PREVIEW_LIMIT).collect();
            }
            let transcript = format!("{TRANSCRIPT_PREFIX}{preview}");

            debug!(%session_id, bytes = chunk.len(), "echo processor produced transcript");

            (callbacks.on_transcript)(transcript.clone()).await;
            (callbacks.on_audio)(Bytes::from(transcript.into_bytes())).await;
        });
    }

    async fn on_session_closed(&self, session_id: &str) {
        debug!(%session_id, "echo processor released session");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::sync::mpsc;

    use super::*;

    fn collecting_callbacks() -> (
        ChunkCallbacks,
        mpsc::UnboundedReceiver<String>,
        mpsc::UnboundedReceiver<Bytes>,
    ) {
        let (transcript_tx, transcript_rx) = mpsc::unbounded_channel();
        let (audio_tx, audio_rx) = mpsc::unbounded_channel();
        let callbacks = ChunkCallbacks {
            on_transcript: Arc::new(move |text| {
                let tx = transcript_tx.clone();
                Box::pin(async move {
                    let _ = tx.send(text);
                })
            }),
            on_audio: Arc::new(move |bytes| {
                let tx = audio_tx.clone();
                Box::pin(async move {
                    let _ = tx.send(bytes);
                })
            }),
        };
        (callbacks, transcript_rx, audio_rx)
    }

    #[tokio::test]
    async fn test_chunk_produces_transcript_and_echo_audio() {
        let processor = EchoAudioProcessor::new();
        let (callbacks, mut transcripts, mut audio) = collecting_callbacks();

        processor
            .process_chunk("s1", Bytes::from_static(b"hello"), callbacks)
            .await;

        let transcript = transcripts.recv().await.unwrap();
        assert_eq!(transcript, "[transcribed] hello");

        let synthesized = audio.recv().await.unwrap();
        assert_eq!(synthesized, Bytes::from_static(b"[transcribed] hello"));
    }

    #[tokio::test]
    async fn test_long_chunk_is_truncated() {
        let processor = EchoAudioProcessor::new();
        let (callbacks, mut transcripts, _audio) = collecting_callbacks();

        let chunk = Bytes::from(vec![b'a'; 500]);
        processor.process_chunk("s1", chunk, callbacks).await;

        let transcript = transcripts.recv().await.unwrap();
        assert_eq!(
            transcript.len(),
            TRANSCRIPT_PREFIX.len() + TRANSCRIPT_PREVIEW_LIMIT
        );
    }

    #[tokio::test]
    async fn test_non_utf8_chunk_does_not_fail() {
        let processor = EchoAudioProcessor::new();
        let (callbacks, mut transcripts, _audio) = collecting_callbacks();

        processor
            .process_chunk("s1", Bytes::from_static(&[0xff, 0xfe, 0x00]), callbacks)
            .await;

        let transcript = transcripts.recv().await.unwrap();
        assert!(transcript.starts_with(TRANSCRIPT_PREFIX));
    }
}
