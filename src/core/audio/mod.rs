//! Audio chunk processing contract.
//!
//! The gateway treats speech recognition and synthesis as a black box: one
//! inbound audio chunk goes in together with two callbacks, and the
//! collaborator may invoke either of them zero or more times, in any order,
//! asynchronously, until the owning session closes.

pub mod echo;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

pub use echo::EchoAudioProcessor;

/// Callback invoked when the collaborator recognizes a text fragment.
pub type TranscriptCallback =
    Arc<dyn Fn(String) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Callback invoked when the collaborator synthesizes an audio fragment.
pub type SynthesizedAudioCallback =
    Arc<dyn Fn(Bytes) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// The callback pair handed along with every inbound chunk.
#[derive(Clone)]
pub struct ChunkCallbacks {
    /// Fired per recognized text fragment (possibly partial, possibly never)
    pub on_transcript: TranscriptCallback,
    /// Fired per synthesized audio fragment (possibly never)
    pub on_audio: SynthesizedAudioCallback,
}

/// External collaborator that processes audio chunks for live sessions.
///
/// Processing faults are swallowed at this boundary by design: a failed
/// chunk produces no callback invocations, and the connection survives.
#[async_trait]
pub trait AudioProcessor: Send + Sync {
    /// Process one chunk for the given session.
    ///
    /// May return before the callbacks fire; the collaborator is free to
    /// invoke them later from its own tasks.
    async fn process_chunk(&self, session_id: &str, chunk: Bytes, callbacks: ChunkCallbacks);

    /// The session is gone; release any per-session resources. Callback
    /// invocations for this session after this call are dropped by the
    /// session manager.
    async fn on_session_closed(&self, session_id: &str);
}
