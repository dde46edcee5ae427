use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM client misconfigured: {0}")]
    Misconfiguration(String),

    #[error("LLM transport error: {0}")]
    Transport(String),

    #[error("LLM API returned {status}: {body}")]
    Api { status: u16, body: String },
}
