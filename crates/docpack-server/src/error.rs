use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use docpack_core::DocpackError;
use llm_client::LlmError;

// ---------------------------------------------------------------------------
// Internal sentinel for explicit "not configured" 500 errors
// ---------------------------------------------------------------------------

/// Private sentinel carried through the `anyhow::Error` chain for endpoints
/// whose configuration can only come from the environment (SMTP, LLM key):
/// the caller cannot fix those in the request, so they map to 500, not 400.
#[derive(Debug)]
struct NotConfiguredError(String);

impl std::fmt::Display for NotConfiguredError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for NotConfiguredError {}

// ---------------------------------------------------------------------------
// AppError — unified error type for HTTP responses
// ---------------------------------------------------------------------------

/// Unified error type for HTTP responses.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    /// Construct a 400 Bad Request error with the given message.
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self(DocpackError::Validation(msg.into()).into())
    }

    /// Construct a 500 "not configured" error.
    pub fn not_configured(msg: impl Into<String>) -> Self {
        Self(NotConfiguredError(msg.into()).into())
    }
}

/// Fold an LLM client failure into the downstream-error taxonomy.
pub fn llm_error(err: LlmError) -> DocpackError {
    match err {
        LlmError::Api { status, body } => DocpackError::Downstream {
            system: docpack_core::DownstreamSystem::Llm,
            status,
            body,
        },
        LlmError::Transport(msg) | LlmError::Misconfiguration(msg) => DocpackError::Unreachable {
            system: docpack_core::DownstreamSystem::Llm,
            message: msg,
        },
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Check the explicit sentinel before falling through to DocpackError.
        if let Some(n) = self.0.downcast_ref::<NotConfiguredError>() {
            let body = serde_json::json!({ "error": n.0.clone() });
            return (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(body)).into_response();
        }

        let status = if let Some(e) = self.0.downcast_ref::<DocpackError>() {
            match e {
                DocpackError::Validation(_) | DocpackError::Configuration(_) => {
                    StatusCode::BAD_REQUEST
                }
                DocpackError::Downstream { .. }
                | DocpackError::Unreachable { .. }
                | DocpackError::Io(_)
                | DocpackError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
            }
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
