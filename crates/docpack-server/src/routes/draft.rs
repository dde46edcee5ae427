//! POST /ai-draft — structure a free-form prompt into JSON, no publication.

use axum::extract::State;
use axum::Json;
use docpack_core::automation::parse_completion;
use llm_client::{ChatOptions, Message};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{llm_error, AppError};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct DraftBody {
    #[serde(default)]
    prompt: String,
}

pub async fn ai_draft(
    State(app): State<AppState>,
    Json(body): Json<DraftBody>,
) -> Result<Json<Value>, AppError> {
    if body.prompt.trim().is_empty() {
        return Err(AppError::bad_request("prompt is required"));
    }

    let messages = [
        Message::system(
            "You structure free-form project notes into clean, well-named JSON. \
             Reply with a single JSON object and nothing else.",
        ),
        Message::user(body.prompt),
    ];
    let text = app
        .llm()?
        .complete(&messages, &ChatOptions::json())
        .await
        .map_err(|e| AppError(llm_error(e).into()))?;

    let (parsed, parse_error) = parse_completion(&text);
    let mut response = json!({ "parsed": parsed });
    if let Some(raw) = parse_error {
        response["error"] = json!(raw);
    }
    Ok(Json(response))
}
