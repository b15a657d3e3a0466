//! Voice WebSocket message types.
//!
//! Inbound text frames are structured JSON control directives; inbound
//! binary frames are raw audio chunks. Outbound traffic is JSON transcript
//! frames plus raw binary synthesized audio.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Maximum allowed size for a control frame (4 KB)
pub const MAX_CONTROL_FRAME_SIZE: usize = 4 * 1024;

/// Lowest accepted sample-rate directive value
pub const MIN_SAMPLE_RATE: u32 = 8_000;

/// Highest accepted sample-rate directive value
pub const MAX_SAMPLE_RATE: u32 = 192_000;

// =============================================================================
// Incoming Messages (Client -> Server)
// =============================================================================

/// Control directives a client can send on the voice channel.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VoiceControlMessage {
    /// Mark the session active (client started capturing)
    Start,
    /// Mark the session idle (client stopped capturing)
    End,
    /// Declare the sample rate of subsequent audio chunks
    SampleRate {
        /// Samples per second, accepted range 8000..=192000
        sample_rate: u32,
    },
}

impl VoiceControlMessage {
    /// Whether a sample-rate value is inside the accepted range.
    pub fn sample_rate_in_range(sample_rate: u32) -> bool {
        (MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&sample_rate)
    }
}

// =============================================================================
// Outgoing Messages (Server -> Client)
// =============================================================================

/// JSON frames the server sends on the voice channel. Synthesized audio
/// travels separately as raw binary frames.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VoiceOutgoingMessage {
    /// One recognized text fragment
    Transcript {
        /// The transcript text
        text: String,
    },
}

// =============================================================================
// Frame Routing
// =============================================================================

/// Frame routing through the per-connection sender task. Every outbound
/// write for a connection funnels through one of these, which is what keeps
/// concurrent collaborator callbacks from interleaving a frame's bytes.
pub enum VoiceFrame {
    /// JSON text frame
    Outgoing(VoiceOutgoingMessage),
    /// Raw synthesized audio
    Audio(Bytes),
    /// Close the connection
    Close,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_directive_deserialization() {
        let msg: VoiceControlMessage = serde_json::from_str(r#"{"type":"start"}"#).unwrap();
        assert_eq!(msg, VoiceControlMessage::Start);
    }

    #[test]
    fn test_end_directive_deserialization() {
        let msg: VoiceControlMessage = serde_json::from_str(r#"{"type":"end"}"#).unwrap();
        assert_eq!(msg, VoiceControlMessage::End);
    }

    #[test]
    fn test_sample_rate_directive_deserialization() {
        let msg: VoiceControlMessage =
            serde_json::from_str(r#"{"type":"sample_rate","sample_rate":24000}"#).unwrap();
        assert_eq!(msg, VoiceControlMessage::SampleRate { sample_rate: 24000 });
    }

    #[test]
    fn test_malformed_control_is_an_error() {
        assert!(serde_json::from_str::<VoiceControlMessage>("start").is_err());
        assert!(serde_json::from_str::<VoiceControlMessage>(r#"{"type":"reboot"}"#).is_err());
    }

    #[test]
    fn test_sample_rate_range() {
        assert!(VoiceControlMessage::sample_rate_in_range(8_000));
        assert!(VoiceControlMessage::sample_rate_in_range(44_100));
        assert!(VoiceControlMessage::sample_rate_in_range(192_000));
        assert!(!VoiceControlMessage::sample_rate_in_range(0));
        assert!(!VoiceControlMessage::sample_rate_in_range(7_999));
        assert!(!VoiceControlMessage::sample_rate_in_range(400_000));
    }

    #[test]
    fn test_transcript_serialization() {
        let msg = VoiceOutgoingMessage::Transcript {
            text: "hello".to_string(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"type":"transcript","text":"hello"}"#);
    }

    #[test]
    fn test_transcript_escapes_control_characters() {
        let msg = VoiceOutgoingMessage::Transcript {
            text: "a \"quote\"\nline\ttab\rcr".to_string(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#"\"quote\""#));
        assert!(json.contains(r"\n"));
        assert!(json.contains(r"\t"));
        assert!(json.contains(r"\r"));
        // Still one valid JSON document
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["text"], "a \"quote\"\nline\ttab\rcr");
    }
}
