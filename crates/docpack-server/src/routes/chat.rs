//! POST /api/chat — conversational assistant over the same completion
//! backend.

use axum::extract::State;
use axum::Json;
use llm_client::{ChatOptions, Message};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{llm_error, AppError};
use crate::state::AppState;

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct ChatBody {
    message: String,
    history: Vec<HistoryEntry>,
}

#[derive(Deserialize)]
struct HistoryEntry {
    role: String,
    content: String,
}

pub async fn chat(
    State(app): State<AppState>,
    Json(body): Json<ChatBody>,
) -> Result<Json<Value>, AppError> {
    if body.message.trim().is_empty() {
        return Err(AppError::bad_request("message is required"));
    }

    let mut messages = vec![Message::system(
        "You are a concise, practical project-management assistant.",
    )];
    for entry in body.history {
        messages.push(match entry.role.as_str() {
            "assistant" => Message::assistant(entry.content),
            _ => Message::user(entry.content),
        });
    }
    messages.push(Message::user(body.message));

    let reply = app
        .llm()?
        .complete(&messages, &ChatOptions::default())
        .await
        .map_err(|e| AppError(llm_error(e).into()))?;

    Ok(Json(json!({ "reply": reply })))
}
