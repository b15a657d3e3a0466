//! Live voice session table.
//!
//! One record per open connection, created on connect and removed exactly
//! once on close or transport error. The table is the only shared mutable
//! state in the gateway: connection handlers mutate it from their own tasks
//! and collaborator callbacks read it from theirs, so every entry is reached
//! through the concurrent map and per-field atomics.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use dashmap::DashMap;
use tokio::sync::mpsc;

use super::messages::VoiceFrame;

/// Default sample rate until a directive says otherwise
pub const DEFAULT_SAMPLE_RATE: u32 = 16_000;

/// Per-connection session record.
pub struct SessionHandle {
    frames: mpsc::Sender<VoiceFrame>,
    active: AtomicBool,
    sample_rate: AtomicU32,
}

impl SessionHandle {
    fn new(frames: mpsc::Sender<VoiceFrame>) -> Self {
        Self {
            frames,
            active: AtomicBool::new(false),
            sample_rate: AtomicU32::new(DEFAULT_SAMPLE_RATE),
        }
    }
}

/// Concurrency-safe arena of live sessions, keyed by connection id.
#[derive(Default)]
pub struct VoiceSessions {
    sessions: DashMap<String, Arc<SessionHandle>>,
}

impl VoiceSessions {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Register a session with default state (idle, 16 kHz).
    pub fn insert(&self, session_id: &str, frames: mpsc::Sender<VoiceFrame>) {
        self.sessions
            .insert(session_id.to_string(), Arc::new(SessionHandle::new(frames)));
    }

    /// Remove a session. Returns `true` only for the call that actually
    /// removed it, which is the exactly-once guard for close-time cleanup
    /// when both a close event and a transport error fire.
    pub fn remove(&self, session_id: &str) -> bool {
        self.sessions.remove(session_id).is_some()
    }

    /// Outbound frame channel for a live session; `None` once it is gone,
    /// so a late collaborator callback simply produces no frame.
    pub fn frames(&self, session_id: &str) -> Option<mpsc::Sender<VoiceFrame>> {
        self.sessions
            .get(session_id)
            .map(|handle| handle.frames.clone())
    }

    /// Flip the activity flag. No-op for a closed session.
    pub fn set_active(&self, session_id: &str, active: bool) {
        if let Some(handle) = self.sessions.get(session_id) {
            handle.active.store(active, Ordering::SeqCst);
        }
    }

    /// Update the sample rate. No-op for a closed session.
    pub fn set_sample_rate(&self, session_id: &str, sample_rate: u32) {
        if let Some(handle) = self.sessions.get(session_id) {
            handle.sample_rate.store(sample_rate, Ordering::SeqCst);
        }
    }

    /// Snapshot of `(active, sample_rate)` for a live session.
    pub fn state(&self, session_id: &str) -> Option<(bool, u32)> {
        self.sessions.get(session_id).map(|handle| {
            (
                handle.active.load(Ordering::SeqCst),
                handle.sample_rate.load(Ordering::SeqCst),
            )
        })
    }

    /// Identifiers of live sessions, in no particular order.
    pub fn session_ids(&self) -> Vec<String> {
        self.sessions
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no session is live.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with_session(id: &str) -> (VoiceSessions, mpsc::Receiver<VoiceFrame>) {
        let sessions = VoiceSessions::new();
        let (tx, rx) = mpsc::channel(8);
        sessions.insert(id, tx);
        (sessions, rx)
    }

    #[test]
    fn test_new_session_defaults() {
        let (sessions, _rx) = table_with_session("s1");
        assert_eq!(sessions.state("s1"), Some((false, 16_000)));
    }

    #[test]
    fn test_start_flips_active_without_touching_sample_rate() {
        let (sessions, _rx) = table_with_session("s1");
        sessions.set_active("s1", true);
        assert_eq!(sessions.state("s1"), Some((true, 16_000)));
        sessions.set_active("s1", false);
        assert_eq!(sessions.state("s1"), Some((false, 16_000)));
    }

    #[test]
    fn test_sample_rate_update() {
        let (sessions, _rx) = table_with_session("s1");
        sessions.set_sample_rate("s1", 24_000);
        assert_eq!(sessions.state("s1"), Some((false, 24_000)));
    }

    #[test]
    fn test_remove_is_exactly_once() {
        let (sessions, _rx) = table_with_session("s1");
        assert!(sessions.remove("s1"));
        assert!(!sessions.remove("s1"));
        assert!(sessions.is_empty());
    }

    #[test]
    fn test_frames_after_removal_is_none() {
        let (sessions, _rx) = table_with_session("s1");
        assert!(sessions.frames("s1").is_some());
        sessions.remove("s1");
        assert!(sessions.frames("s1").is_none());
    }

    #[test]
    fn test_mutations_on_closed_session_are_noops() {
        let sessions = VoiceSessions::new();
        sessions.set_active("ghost", true);
        sessions.set_sample_rate("ghost", 48_000);
        assert_eq!(sessions.state("ghost"), None);
    }
}
