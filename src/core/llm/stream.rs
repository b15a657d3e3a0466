//! Typed event channel for streamed replies.
//!
//! Producers (adapters, the orchestrator's background task) push through a
//! [`StreamSink`]; the transport layer drains the paired [`ReplyStream`].
//! Two invariants are enforced here rather than left to convention:
//!
//! - at most one terminal event ([`StreamEvent::Completed`] or
//!   [`StreamEvent::Failed`]) is ever delivered per stream;
//! - no chunk is observed after a terminal event.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;

/// Buffer size for the chunk channel. Generation chunks are small; the
/// consumer is expected to keep up or time out.
const STREAM_BUFFER_SIZE: usize = 256;

/// One event on a reply stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// One generated text fragment, in generation order
    Chunk(String),
    /// The stream finished normally; no further events follow
    Completed,
    /// The stream failed; no further events follow
    Failed(String),
}

/// Create a linked sink/stream pair.
pub fn reply_channel() -> (StreamSink, ReplyStream) {
    let (tx, rx) = mpsc::channel(STREAM_BUFFER_SIZE);
    let sink = StreamSink {
        tx,
        terminal: Arc::new(AtomicBool::new(false)),
        emitted: Arc::new(AtomicBool::new(false)),
    };
    let stream = ReplyStream { rx, done: false };
    (sink, stream)
}

/// Producer half of a reply stream.
///
/// Clones share the terminal latch, so concurrent producers cannot deliver
/// a second terminal event or a chunk behind one.
#[derive(Clone)]
pub struct StreamSink {
    tx: mpsc::Sender<StreamEvent>,
    terminal: Arc<AtomicBool>,
    emitted: Arc<AtomicBool>,
}

impl StreamSink {
    /// Deliver one chunk. Returns `false` if the chunk was dropped because
    /// the stream is already terminal or the consumer is gone.
    pub async fn chunk(&self, text: impl Into<String>) -> bool {
        if self.terminal.load(Ordering::SeqCst) {
            return false;
        }
        let sent = self.tx.send(StreamEvent::Chunk(text.into())).await.is_ok();
        if sent {
            self.emitted.store(true, Ordering::SeqCst);
        }
        sent
    }

    /// Deliver the completion terminal. Returns `false` if another terminal
    /// event already won the latch.
    pub async fn complete(&self) -> bool {
        if self.terminal.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.tx.send(StreamEvent::Completed).await.is_ok()
    }

    /// Deliver the failure terminal. Returns `false` if another terminal
    /// event already won the latch.
    pub async fn fail(&self, error: impl Into<String>) -> bool {
        if self.terminal.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.tx.send(StreamEvent::Failed(error.into())).await.is_ok()
    }

    /// Whether at least one chunk has been delivered.
    ///
    /// The orchestrator uses this to distinguish initiation failures (which
    /// are retryable) from mid-stream failures (which are terminal).
    pub fn has_emitted(&self) -> bool {
        self.emitted.load(Ordering::SeqCst)
    }

    /// Whether a terminal event has been delivered.
    pub fn is_terminal(&self) -> bool {
        self.terminal.load(Ordering::SeqCst)
    }
}

/// Consumer half of a reply stream.
pub struct ReplyStream {
    rx: mpsc::Receiver<StreamEvent>,
    done: bool,
}

impl ReplyStream {
    /// Receive the next event.
    ///
    /// Returns `None` once the stream is exhausted. After a terminal event
    /// has been observed, always returns `None` — even if a racing producer
    /// managed to enqueue a chunk concurrently with the terminal.
    pub async fn recv(&mut self) -> Option<StreamEvent> {
        if self.done {
            return None;
        }
        match self.rx.recv().await {
            Some(event) => {
                if matches!(event, StreamEvent::Completed | StreamEvent::Failed(_)) {
                    self.done = true;
                    self.rx.close();
                }
                Some(event)
            }
            None => {
                self.done = true;
                None
            }
        }
    }
}
