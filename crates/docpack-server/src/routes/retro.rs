//! POST /sprint-retro-analyze — summarize sprint notes into wins,
//! improvements, and action items.

use axum::extract::State;
use axum::Json;
use docpack_core::automation::parse_completion;
use llm_client::{ChatOptions, Message};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{llm_error, AppError};
use crate::state::AppState;

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct RetroBody {
    sprint_name: String,
    notes: String,
    metrics: Option<Value>,
}

pub async fn sprint_retro_analyze(
    State(app): State<AppState>,
    Json(body): Json<RetroBody>,
) -> Result<Json<Value>, AppError> {
    if body.notes.trim().is_empty() {
        return Err(AppError::bad_request("notes are required"));
    }

    let mut user = String::new();
    if !body.sprint_name.trim().is_empty() {
        user.push_str(&format!("Sprint: {}\n\n", body.sprint_name.trim()));
    }
    user.push_str(&format!("NOTES:\n{}\n", body.notes));
    if let Some(metrics) = &body.metrics {
        user.push_str(&format!("\nMETRICS:\n{metrics}\n"));
    }

    let messages = [
        Message::system(
            "You are an experienced agile coach analyzing a sprint retrospective. \
             Reply with a single strict JSON object of the shape \
             {\"wins\": [string], \"improvements\": [string], \
              \"actionItems\": [{\"item\": string, \"owner\": string}], \
              \"sentiment\": string} and nothing else.",
        ),
        Message::user(user),
    ];
    let text = app
        .llm()?
        .complete(&messages, &ChatOptions::json())
        .await
        .map_err(|e| AppError(llm_error(e).into()))?;

    let (analysis, parse_error) = parse_completion(&text);
    let mut response = json!({ "analysis": analysis });
    if let Some(raw) = parse_error {
        response["error"] = json!(raw);
    }
    Ok(Json(response))
}
