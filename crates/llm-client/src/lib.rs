//! `llm-client` — async chat-completion client for OpenAI-compatible APIs.
//!
//! The rest of the workspace talks to the model through the [`ChatBackend`]
//! trait; [`HttpChatClient`] is the production implementation and
//! [`StaticBackend`] is a scripted double for tests.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use llm_client::{ChatBackend, ChatOptions, HttpChatClient, Message};
//!
//! let client = HttpChatClient::new("https://api.openai.com/v1", key, "gpt-4o-mini")?;
//! let reply = client
//!     .complete(&[Message::user("Summarize this sprint.")], &ChatOptions::default())
//!     .await?;
//! ```

pub mod client;
pub mod error;
pub mod mock;
pub mod types;

pub use client::HttpChatClient;
pub use error::LlmError;
pub use mock::StaticBackend;
pub use types::{ChatOptions, Message, Role};

/// Capability boundary for the completion service: messages in, text out.
#[async_trait::async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(&self, messages: &[Message], opts: &ChatOptions) -> Result<String, LlmError>;
}
