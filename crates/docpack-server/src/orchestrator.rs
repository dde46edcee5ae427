//! The full-automation pipeline: gather input, call the completion
//! capability, normalize its output, and optionally publish to both
//! downstream systems.

use docpack_core::automation::{AutomationResult, MetaDefaults};
use docpack_core::config::{resolve_publish_targets, PublishOverrides};
use docpack_core::extract;
use docpack_core::prompt::{automation_prompt, AutomationPromptParams};
use llm_client::{ChatOptions, Message};
use serde::Serialize;
use tracing::info;

use crate::error::{llm_error, AppError};
use crate::publish::{publish_result, PublishRequest, PublishedRefs};
use crate::state::AppState;

pub const DEFAULT_PRIORITY_SCHEME: &str = "P0,P1,P2,P3";

// ---------------------------------------------------------------------------
// Request / response
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// A validated, already-defaulted automation request, assembled by the route
/// from either a JSON or a multipart body before any business logic runs.
pub struct AutomationRequest {
    pub requirements_text: String,
    pub file: Option<UploadedFile>,
    pub project_name: String,
    pub jira_project_key: Option<String>,
    pub confluence_space_key: Option<String>,
    pub priority_scheme: String,
    pub labels: Vec<String>,
    pub publish: bool,
    pub overrides: PublishOverrides,
}

impl Default for AutomationRequest {
    fn default() -> Self {
        Self {
            requirements_text: String::new(),
            file: None,
            project_name: String::new(),
            jira_project_key: None,
            confluence_space_key: None,
            priority_scheme: DEFAULT_PRIORITY_SCHEME.to_string(),
            labels: Vec::new(),
            publish: false,
            overrides: PublishOverrides::default(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationResponse {
    pub run_id: String,
    pub output: AutomationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<PublishedRefs>,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

pub async fn run_automation(
    state: &AppState,
    req: AutomationRequest,
) -> Result<AutomationResponse, AppError> {
    let run_id = uuid::Uuid::new_v4().to_string();

    // Fail-fast validation: nothing downstream is attempted past this block.
    let missing_key = req.jira_project_key.as_deref().unwrap_or("").is_empty()
        || req.confluence_space_key.as_deref().unwrap_or("").is_empty();
    if req.publish && missing_key {
        return Err(AppError::bad_request(
            "publish=true requires both jiraProjectKey and confluenceSpaceKey",
        ));
    }

    let requirements = combined_requirements(&req)?;
    if requirements.is_empty() {
        return Err(AppError::bad_request(
            "no requirements provided: supply requirementsText or upload a requirements file",
        ));
    }

    let project_name = if req.project_name.trim().is_empty() {
        "Untitled Project".to_string()
    } else {
        req.project_name.trim().to_string()
    };

    info!(run_id = %run_id, publish = req.publish, "automation run started");

    let prompt = automation_prompt(
        &requirements,
        &AutomationPromptParams {
            project_name: &project_name,
            jira_project_key: req.jira_project_key.as_deref().unwrap_or(""),
            confluence_space_key: req.confluence_space_key.as_deref().unwrap_or(""),
            priority_scheme: &req.priority_scheme,
        },
    );
    let messages = [Message::system(prompt.system), Message::user(prompt.user)];
    let completion = state
        .llm()?
        .complete(&messages, &ChatOptions::json())
        .await
        .map_err(|e| AppError(llm_error(e).into()))?;

    let defaults = MetaDefaults {
        project_name,
        jira_project_key: req.jira_project_key.clone().unwrap_or_default(),
        confluence_space_key: req.confluence_space_key.clone().unwrap_or_default(),
    };
    let output = AutomationResult::from_completion(&completion, &defaults, &requirements);
    if output.error.is_some() {
        info!(run_id = %run_id, "completion was not valid JSON; continuing with normalized fallback");
    }

    if !req.publish {
        return Ok(AutomationResponse {
            run_id,
            output,
            published: None,
        });
    }

    let targets = resolve_publish_targets(&req.overrides, &state.config.env)?;
    let published = publish_result(
        state,
        &targets,
        &output,
        &PublishRequest {
            space_key: req.confluence_space_key.as_deref().unwrap_or(""),
            project_key: req.jira_project_key.as_deref().unwrap_or(""),
            labels: &req.labels,
        },
    )
    .await?;

    info!(run_id = %run_id, "automation run published");
    Ok(AutomationResponse {
        run_id,
        output,
        published: Some(published),
    })
}

/// Pasted text plus decoded file text under a `[FILE_CONTENT]` marker.
fn combined_requirements(req: &AutomationRequest) -> Result<String, AppError> {
    let mut combined = req.requirements_text.trim().to_string();
    if let Some(file) = &req.file {
        let text = extract::file_text(&file.filename, &file.bytes)?;
        let text = text.trim();
        if !text.is_empty() {
            if !combined.is_empty() {
                combined.push_str("\n\n");
            }
            combined.push_str("[FILE_CONTENT]\n");
            combined.push_str(text);
        }
    }
    Ok(combined)
}

/// Split a comma-separated labels parameter into clean label values.
pub fn parse_labels(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}
