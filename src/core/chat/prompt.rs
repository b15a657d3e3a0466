//! Prompt assembly for character replies.

/// Render the prompt handed to an adapter.
///
/// Missing persona/history are normalized to empty strings; the rendered
/// prompt always ends with the `Assistant:` cue the backends complete from.
pub fn build_prompt(persona: Option<&str>, history: Option<&str>, user_message: &str) -> String {
    format!(
        "{}\nHistory:\n{}\nUser: {}\nAssistant:\n",
        persona.unwrap_or(""),
        history.unwrap_or(""),
        user_message
    )
}
