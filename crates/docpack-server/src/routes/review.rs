//! POST /code-review — a single-purpose review pass over a pasted snippet.

use axum::extract::State;
use axum::Json;
use llm_client::{ChatOptions, Message};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{llm_error, AppError};
use crate::state::AppState;

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct ReviewBody {
    code: String,
    language: Option<String>,
}

pub async fn code_review(
    State(app): State<AppState>,
    Json(body): Json<ReviewBody>,
) -> Result<Json<Value>, AppError> {
    if body.code.trim().is_empty() {
        return Err(AppError::bad_request("code is required"));
    }

    let language = body.language.as_deref().unwrap_or("unknown");
    let messages = [
        Message::system(
            "You are a meticulous senior engineer reviewing a change. Point out \
             correctness bugs, security issues, and unclear naming, in that order \
             of importance. Be concrete and brief; skip style nitpicks.",
        ),
        Message::user(format!("Language: {language}\n\n```\n{}\n```", body.code)),
    ];
    let review = app
        .llm()?
        .complete(&messages, &ChatOptions::default())
        .await
        .map_err(|e| AppError(llm_error(e).into()))?;

    Ok(Json(json!({ "review": review })))
}
