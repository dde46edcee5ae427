use thiserror::Error;

/// Which external system a downstream failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownstreamSystem {
    Content,
    Issues,
    Llm,
}

impl std::fmt::Display for DownstreamSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DownstreamSystem::Content => write!(f, "content"),
            DownstreamSystem::Issues => write!(f, "issues"),
            DownstreamSystem::Llm => write!(f, "llm"),
        }
    }
}

#[derive(Debug, Error)]
pub enum DocpackError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("missing configuration: {0}")]
    Configuration(String),

    #[error("{system} service returned {status}: {body}")]
    Downstream {
        system: DownstreamSystem,
        status: u16,
        body: String,
    },

    #[error("{system} service unreachable: {message}")]
    Unreachable {
        system: DownstreamSystem,
        message: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl DocpackError {
    /// Build a `Downstream` error, keeping only the first 200 characters of
    /// the remote body for diagnostics.
    pub fn downstream(system: DownstreamSystem, status: u16, body: &str) -> Self {
        DocpackError::Downstream {
            system,
            status,
            body: truncate_body(body),
        }
    }
}

/// First 200 characters of a remote response body, char-boundary safe.
pub fn truncate_body(body: &str) -> String {
    body.chars().take(200).collect()
}

pub type Result<T> = std::result::Result<T, DocpackError>;
