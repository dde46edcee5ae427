//! Scripted backend for tests: returns canned replies in order and records
//! every request it saw.

use std::sync::Mutex;

use crate::error::LlmError;
use crate::types::{ChatOptions, Message};
use crate::ChatBackend;

#[derive(Default)]
pub struct StaticBackend {
    replies: Mutex<Vec<String>>,
    calls: Mutex<Vec<RecordedCall>>,
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub messages: Vec<Message>,
    pub json_mode: bool,
}

impl StaticBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply; replies are consumed front-to-back, and the last one
    /// repeats once the queue is exhausted.
    pub fn with_reply(self, reply: impl Into<String>) -> Self {
        self.replies.lock().unwrap().push(reply.into());
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl ChatBackend for StaticBackend {
    async fn complete(&self, messages: &[Message], opts: &ChatOptions) -> Result<String, LlmError> {
        self.calls.lock().unwrap().push(RecordedCall {
            messages: messages.to_vec(),
            json_mode: opts.json_mode,
        });

        let mut replies = self.replies.lock().unwrap();
        match replies.len() {
            0 => Err(LlmError::Transport(
                "StaticBackend has no scripted reply".to_string(),
            )),
            1 => Ok(replies[0].clone()),
            _ => Ok(replies.remove(0)),
        }
    }
}
