//! POST /fully-automate — the full requirements-to-documents pipeline.
//! Accepts either a JSON body or multipart form data with an uploaded
//! requirements file.

use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::Json;
use docpack_core::config::PublishOverrides;
use serde::Deserialize;

use crate::error::AppError;
use crate::orchestrator::{
    parse_labels, run_automation, AutomationRequest, UploadedFile, DEFAULT_PRIORITY_SCHEME,
};
use crate::state::AppState;

pub async fn fully_automate(
    State(app): State<AppState>,
    req: Request,
) -> Result<Json<serde_json::Value>, AppError> {
    let request = parse_request(req).await?;
    let response = run_automation(&app, request).await?;
    Ok(Json(serde_json::to_value(response)?))
}

async fn parse_request(req: Request) -> Result<AutomationRequest, AppError> {
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(req, &())
            .await
            .map_err(|e| AppError::bad_request(format!("invalid multipart body: {e}")))?;
        parse_multipart(multipart).await
    } else {
        let Json(body) = Json::<AutomateBody>::from_request(req, &())
            .await
            .map_err(|e| AppError::bad_request(format!("invalid JSON body: {e}")))?;
        Ok(body.into_request())
    }
}

// ---------------------------------------------------------------------------
// JSON body
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AutomateBody {
    requirements_text: String,
    project_name: String,
    jira_project_key: Option<String>,
    confluence_space_key: Option<String>,
    priority_scheme: Option<String>,
    labels: String,
    publish: bool,
    #[serde(flatten)]
    overrides: PublishOverrides,
}

impl AutomateBody {
    fn into_request(self) -> AutomationRequest {
        AutomationRequest {
            requirements_text: self.requirements_text,
            file: None,
            project_name: self.project_name,
            jira_project_key: self.jira_project_key.filter(|k| !k.trim().is_empty()),
            confluence_space_key: self.confluence_space_key.filter(|k| !k.trim().is_empty()),
            priority_scheme: self
                .priority_scheme
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_PRIORITY_SCHEME.to_string()),
            labels: parse_labels(&self.labels),
            publish: self.publish,
            overrides: self.overrides,
        }
    }
}

// ---------------------------------------------------------------------------
// Multipart body
// ---------------------------------------------------------------------------

async fn parse_multipart(mut multipart: Multipart) -> Result<AutomationRequest, AppError> {
    let mut req = AutomationRequest::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(format!("malformed multipart field: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name == "requirementsFile" {
            let filename = field.file_name().unwrap_or("upload.txt").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::bad_request(format!("unreadable upload: {e}")))?
                .to_vec();
            req.file = Some(UploadedFile { filename, bytes });
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| AppError::bad_request(format!("unreadable field '{name}': {e}")))?;
        match name.as_str() {
            "requirementsText" => req.requirements_text = value,
            "projectName" => req.project_name = value,
            "jiraProjectKey" => req.jira_project_key = non_empty(value),
            "confluenceSpaceKey" => req.confluence_space_key = non_empty(value),
            "priorityScheme" => {
                if let Some(scheme) = non_empty(value) {
                    req.priority_scheme = scheme;
                }
            }
            "labels" => req.labels = parse_labels(&value),
            "publish" => req.publish = parse_bool(&value),
            "confluenceBaseUrl" => req.overrides.confluence_base_url = non_empty(value),
            "jiraBaseUrl" => req.overrides.jira_base_url = non_empty(value),
            "atlassianDomain" => req.overrides.atlassian_domain = non_empty(value),
            "atlassianEmail" => req.overrides.atlassian_email = non_empty(value),
            "atlassianApiToken" => req.overrides.atlassian_api_token = non_empty(value),
            _ => {}
        }
    }

    Ok(req)
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes" | "on")
}
