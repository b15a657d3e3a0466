pub mod audio;
pub mod chat;
pub mod llm;

// Re-export commonly used types for convenience
pub use llm::{
    LlmAdapter, LlmConfig, LlmError, LlmProvider, LlmRegistry, LlmResult, ReplyStream, StreamEvent,
    StreamSink, get_supported_llm_providers, reply_channel,
};

pub use chat::{ChatService, RetryPolicy, build_prompt, fallback_reply};

pub use audio::{
    AudioProcessor, ChunkCallbacks, EchoAudioProcessor, SynthesizedAudioCallback,
    TranscriptCallback,
};
