//! POST /generate-user-stories and /user-stories-xlsx — backlog generation
//! as JSON or as a spreadsheet download.

use axum::extract::State;
use axum::response::Response;
use axum::Json;
use docpack_core::automation::parse_completion;
use docpack_core::backlog::{Backlog, BacklogStory};
use docpack_core::prompt::user_stories_prompt;
use llm_client::{ChatOptions, Message};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{llm_error, AppError};
use crate::state::AppState;
use crate::xlsx;

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct StoriesBody {
    requirements_text: String,
}

pub async fn generate_user_stories(
    State(app): State<AppState>,
    Json(body): Json<StoriesBody>,
) -> Result<Json<Value>, AppError> {
    if body.requirements_text.trim().is_empty() {
        return Err(AppError::bad_request("requirementsText is required"));
    }
    let backlog = backlog_from_requirements(&app, &body.requirements_text).await?;
    Ok(Json(serde_json::to_value(backlog)?))
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct XlsxBody {
    stories: Option<Vec<BacklogStory>>,
    requirements_text: String,
}

pub async fn user_stories_xlsx(
    State(app): State<AppState>,
    Json(body): Json<XlsxBody>,
) -> Result<Response, AppError> {
    let stories = match body.stories {
        Some(stories) => stories,
        None => {
            if body.requirements_text.trim().is_empty() {
                return Err(AppError::bad_request(
                    "provide either a stories array or requirementsText",
                ));
            }
            backlog_from_requirements(&app, &body.requirements_text)
                .await?
                .stories
        }
    };

    let bytes = xlsx::stories_workbook(&stories)
        .map_err(|e| AppError(anyhow::anyhow!("failed to write workbook: {e}")))?;
    Ok(super::attachment_response(
        "user-stories.xlsx",
        super::XLSX_CONTENT_TYPE,
        bytes,
    ))
}

async fn backlog_from_requirements(app: &AppState, requirements: &str) -> Result<Backlog, AppError> {
    let prompt = user_stories_prompt(requirements);
    let messages = [Message::system(prompt.system), Message::user(prompt.user)];
    let text = app
        .llm()?
        .complete(&messages, &ChatOptions::json())
        .await
        .map_err(|e| AppError(llm_error(e).into()))?;
    let (value, _) = parse_completion(&text);
    Ok(Backlog::from_value(Some(&value)))
}
