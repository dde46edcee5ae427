use std::collections::HashMap;
use std::sync::Arc;

use llm_client::{ChatBackend, HttpChatClient};
use tokio::sync::OnceCell;

use crate::error::AppError;

// ---------------------------------------------------------------------------
// Environment-sourced settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

#[derive(Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

/// Snapshot of everything the server reads from the environment. Missing
/// values degrade the endpoints that need them; startup never fails on
/// configuration.
#[derive(Clone)]
pub struct ServerConfig {
    pub llm: Option<LlmSettings>,
    pub smtp: Option<SmtpSettings>,
    /// Raw snapshot consulted by the pure publish-target resolver.
    pub env: HashMap<String, String>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_map(std::env::vars().collect())
    }

    /// Pure constructor over a plain map, used directly in tests.
    pub fn from_map(env: HashMap<String, String>) -> Self {
        let get = |key: &str| -> Option<String> {
            env.get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let llm = get("LLM_API_KEY").map(|api_key| LlmSettings {
            base_url: get("LLM_BASE_URL").unwrap_or_else(|| "https://api.openai.com/v1".into()),
            api_key,
            model: get("LLM_MODEL").unwrap_or_else(|| "gpt-4o-mini".into()),
        });

        let smtp = match (get("SMTP_HOST"), get("SMTP_USERNAME"), get("SMTP_PASSWORD")) {
            (Some(host), Some(username), Some(password)) => Some(SmtpSettings {
                from: get("SMTP_FROM").unwrap_or_else(|| username.clone()),
                port: get("SMTP_PORT").and_then(|p| p.parse().ok()).unwrap_or(587),
                host,
                username,
                password,
            }),
            _ => None,
        };

        Self { llm, smtp, env }
    }
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    llm: Option<Arc<dyn ChatBackend>>,
    pub http: reqwest::Client,
    /// Process-wide cache of the tracker's "Epic Link" custom-field id,
    /// populated at most once (§ get-or-populate; concurrent first requests
    /// may both fetch, last write wins with equal values).
    pub epic_link_field: Arc<OnceCell<Option<String>>>,
}

impl AppState {
    /// Build state from configuration, wiring the HTTP chat client when an
    /// LLM API key is present.
    pub fn new(config: ServerConfig) -> Self {
        let llm: Option<Arc<dyn ChatBackend>> = config.llm.as_ref().and_then(|settings| {
            match HttpChatClient::new(&settings.base_url, &settings.api_key, &settings.model) {
                Ok(client) => Some(Arc::new(client) as Arc<dyn ChatBackend>),
                Err(err) => {
                    tracing::warn!(error = %err, "failed to build LLM client; LLM endpoints disabled");
                    None
                }
            }
        });
        Self::assemble(config, llm)
    }

    /// Build state with an explicit completion backend (tests inject a
    /// scripted double here).
    pub fn with_backend(config: ServerConfig, llm: Arc<dyn ChatBackend>) -> Self {
        Self::assemble(config, Some(llm))
    }

    fn assemble(config: ServerConfig, llm: Option<Arc<dyn ChatBackend>>) -> Self {
        Self {
            config: Arc::new(config),
            llm,
            http: reqwest::Client::new(),
            epic_link_field: Arc::new(OnceCell::new()),
        }
    }

    /// The completion backend, or a 500 "not configured" error.
    pub fn llm(&self) -> Result<Arc<dyn ChatBackend>, AppError> {
        self.llm.clone().ok_or_else(|| {
            AppError::not_configured("LLM is not configured: set LLM_API_KEY")
        })
    }
}
