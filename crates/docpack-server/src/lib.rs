pub mod clients;
pub mod docx;
pub mod error;
pub mod mailer;
pub mod orchestrator;
pub mod publish;
pub mod routes;
pub mod state;
pub mod xlsx;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

pub use state::{AppState, ServerConfig};

/// Uploads (templates, requirements documents) can be sizeable.
const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Build the axum Router with all API routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health::health))
        // Core pipeline
        .route("/fully-automate", post(routes::automate::fully_automate))
        .route("/ai-draft", post(routes::draft::ai_draft))
        // Backlog
        .route(
            "/generate-user-stories",
            post(routes::stories::generate_user_stories),
        )
        .route("/user-stories-xlsx", post(routes::stories::user_stories_xlsx))
        // Files
        .route("/generate-docx", post(routes::docgen::generate_docx))
        .route("/email-doc", post(routes::email::email_doc))
        // Auxiliary assistants
        .route(
            "/sprint-retro-analyze",
            post(routes::retro::sprint_retro_analyze),
        )
        .route("/code-review", post(routes::review::code_review))
        .route("/api/chat", post(routes::chat::chat))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .with_state(state)
}

/// Start the docpack API server.
pub async fn serve(state: AppState, port: u16) -> anyhow::Result<()> {
    let app = build_router(state);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let actual_port = listener.local_addr()?.port();

    tracing::info!("docpack API server listening on http://localhost:{actual_port}");

    axum::serve(listener, app).await?;
    Ok(())
}
