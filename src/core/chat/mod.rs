pub mod prompt;
pub mod retry;
pub mod service;

pub use prompt::build_prompt;
pub use retry::RetryPolicy;
pub use service::{ChatService, fallback_reply};
