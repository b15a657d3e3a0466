//! Shared application state.

use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;

use crate::config::ServerConfig;
use crate::core::audio::{AudioProcessor, EchoAudioProcessor};
use crate::core::chat::ChatService;
use crate::core::llm::{LlmRegistry, LlmResult};
use crate::handlers::voice::sessions::VoiceSessions;
use crate::store::{ConversationStore, MemoryStore};

/// Reason a WebSocket connection was refused by the limit middleware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionLimitError {
    /// The global connection cap is reached
    GlobalLimitReached,
    /// This IP already holds its maximum number of connections
    PerIpLimitReached,
}

/// Application state shared by every handler.
///
/// The provider registry is read-only after startup and the orchestrator is
/// stateless per call; the voice session table and the connection counters
/// are the only mutable members, both safe under concurrent access.
pub struct AppState {
    /// Server configuration
    pub config: ServerConfig,
    /// Read-only LLM provider registry
    pub registry: Arc<LlmRegistry>,
    /// Reply orchestrator
    pub chat: ChatService,
    /// Persistence collaborator
    pub store: Arc<dyn ConversationStore>,
    /// Audio chunk processing collaborator
    pub audio_processor: Arc<dyn AudioProcessor>,
    /// Live voice session table
    pub voice_sessions: Arc<VoiceSessions>,

    ws_connections: AtomicUsize,
    connections_per_ip: DashMap<IpAddr, u32>,
}

impl AppState {
    /// Build application state from configuration.
    ///
    /// Fails when a configured provider cannot be constructed (e.g. an
    /// empty API key), which is a startup error, not a request error.
    pub fn new(config: ServerConfig) -> LlmResult<Arc<Self>> {
        let registry = Arc::new(LlmRegistry::from_config(&config)?);
        let chat = ChatService::new(registry.clone());
        Ok(Arc::new(Self {
            config,
            registry,
            chat,
            store: Arc::new(MemoryStore::new()),
            audio_processor: Arc::new(EchoAudioProcessor::new()),
            voice_sessions: Arc::new(VoiceSessions::new()),
            ws_connections: AtomicUsize::new(0),
            connections_per_ip: DashMap::new(),
        }))
    }

    /// Try to reserve a WebSocket connection slot for `ip`.
    pub fn try_acquire_connection(&self, ip: IpAddr) -> Result<(), ConnectionLimitError> {
        if let Some(max) = self.config.max_websocket_connections
            && self.ws_connections.load(Ordering::SeqCst) >= max
        {
            return Err(ConnectionLimitError::GlobalLimitReached);
        }

        {
            let mut per_ip = self.connections_per_ip.entry(ip).or_insert(0);
            if *per_ip >= self.config.max_connections_per_ip {
                return Err(ConnectionLimitError::PerIpLimitReached);
            }
            *per_ip += 1;
        }

        self.ws_connections.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    /// Release a previously reserved slot.
    pub fn release_connection(&self, ip: IpAddr) {
        self.ws_connections.fetch_sub(1, Ordering::SeqCst);
        if let Some(mut per_ip) = self.connections_per_ip.get_mut(&ip) {
            *per_ip = per_ip.saturating_sub(1);
            if *per_ip == 0 {
                drop(per_ip);
                self.connections_per_ip.remove_if(&ip, |_, count| *count == 0);
            }
        }
    }

    /// Current number of reserved WebSocket connections.
    pub fn ws_connection_count(&self) -> usize {
        self.ws_connections.load(Ordering::SeqCst)
    }

    /// Current number of reserved connections for one IP.
    pub fn ip_connection_count(&self, ip: &IpAddr) -> u32 {
        self.connections_per_ip
            .get(ip)
            .map(|count| *count)
            .unwrap_or(0)
    }
}
