//! Voice WebSocket session management.

pub mod handler;
pub mod messages;
pub mod sessions;

pub use handler::voice_handler;
pub use messages::{VoiceControlMessage, VoiceFrame, VoiceOutgoingMessage};
pub use sessions::VoiceSessions;
