use std::collections::HashMap;
use std::sync::Arc;

use axum::http::StatusCode;
use http_body_util::BodyExt;
use llm_client::StaticBackend;
use tower::ServiceExt;

use docpack_server::{build_router, AppState, ServerConfig};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// State with a scripted LLM and publish targets pointed at `base_url`.
fn state_with(llm: StaticBackend, base_url: Option<&str>) -> AppState {
    let mut env = HashMap::new();
    if let Some(base) = base_url {
        env.insert("CONFLUENCE_BASE_URL".to_string(), base.to_string());
        env.insert("JIRA_BASE_URL".to_string(), base.to_string());
        env.insert("ATLASSIAN_EMAIL".to_string(), "pm@acme.com".to_string());
        env.insert("ATLASSIAN_API_TOKEN".to_string(), "tok".to_string());
    }
    AppState::with_backend(ServerConfig::from_map(env), Arc::new(llm))
}

/// Send a GET request via `oneshot` and return (status, raw body).
async fn get(app: axum::Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let req = axum::http::Request::builder()
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}

/// Send a POST request with a JSON body via `oneshot` and return (status, parsed JSON body).
async fn post_json(
    app: axum::Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let req = axum::http::Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(axum::body::Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

/// Send a POST with a hand-built multipart body.
async fn post_multipart(
    app: axum::Router,
    uri: &str,
    parts: &[(&str, Option<&str>, &[u8])],
) -> (StatusCode, Vec<u8>) {
    const BOUNDARY: &str = "docpack-test-boundary";
    let mut body = Vec::new();
    for (name, filename, data) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match filename {
            Some(f) => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"; filename=\"{f}\"\r\n\r\n")
                    .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
            ),
        }
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let req = axum::http::Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(axum::body::Body::from(body))
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}

/// A well-formed completion: four-section documents, two risks, two epics,
/// three stories.
fn full_completion() -> String {
    let section = |h: &str| serde_json::json!({"h": h, "body": format!("{h} details.")});
    serde_json::json!({
        "meta": {"projectName": "Demo", "jiraProjectKey": "PX", "confluenceSpaceKey": "DOCS"},
        "docs": {
            "brd": {"title": "BRD — Demo", "sections": [
                section("Goals"), section("Scope"), section("Stakeholders"), section("Success Metrics"),
            ]},
            "frs": {"title": "FRS — Demo", "sections": [
                section("Login"), section("Sessions"), section("Errors"), section("Audit"),
            ]},
            "sow": {"title": "SOW — Demo", "sections": [
                section("Deliverables"), section("Timeline"), section("Pricing"), section("Acceptance"),
            ]},
            "raid": {"title": "RAID — Demo",
                "risks": [{"item": "SSO dependency"}, {"item": "tight timeline"}],
                "assumptions": [{"item": "one region"}, {"item": "existing IdP"}],
                "issues": [{"item": "no staging env"}, {"item": "unclear owner"}],
                "dependencies": [{"item": "IdP team"}, {"item": "design sign-off"}],
            },
            "backlogSummary": "Two epics covering authentication and session handling.",
        },
        "backlog": {
            "epics": [
                {"name": "Authentication", "description": "Login and credentials"},
                {"name": "Sessions", "description": "Session lifecycle"},
            ],
            "stories": [
                {"epicName": "Authentication", "summary": "Login form", "story": "As a user I can log in",
                 "acceptanceCriteria": ["form renders", "bad password shows error"],
                 "priority": "P0", "storyPoints": 5},
                {"epicName": "Authentication", "summary": "Password reset", "story": "As a user I can reset my password",
                 "acceptanceCriteria": ["email sent"], "priority": "P1", "storyPoints": 3},
                {"epicName": "Sessions", "summary": "Session expiry", "story": "As an admin I can configure expiry",
                 "acceptanceCriteria": ["default 30m"], "priority": "P2", "storyPoints": 2},
            ],
        },
        "notes": {"assumptions": ["fabricated pricing section"], "openQuestions": ["SSO provider?"]},
    })
    .to_string()
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_returns_ok() {
    let app = build_router(state_with(StaticBackend::new(), None));
    let (status, body) = get(app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
}

// ---------------------------------------------------------------------------
// Preview mode
// ---------------------------------------------------------------------------

#[tokio::test]
async fn preview_returns_normalized_documents() {
    let llm = StaticBackend::new().with_reply(full_completion());
    let app = build_router(state_with(llm, None));

    let (status, json) = post_json(
        app,
        "/fully-automate",
        serde_json::json!({
            "requirementsText": "Build a login page",
            "projectName": "Demo",
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["runId"].as_str().is_some());
    assert!(json["output"]["docs"]["brd"]["sections"].as_array().unwrap().len() >= 4);
    assert!(json["output"]["docs"]["raid"]["risks"].as_array().unwrap().len() >= 2);
    assert_eq!(json["output"]["backlog"]["epics"].as_array().unwrap().len(), 2);
    assert!(json.get("published").is_none());
}

#[tokio::test]
async fn preview_makes_no_downstream_calls() {
    let mut server = mockito::Server::new_async().await;
    let space = server
        .mock("GET", mockito::Matcher::Regex("^/rest/api/space/".into()))
        .expect(0)
        .create_async()
        .await;
    let pages = server
        .mock("POST", "/rest/api/content")
        .expect(0)
        .create_async()
        .await;
    let issues = server
        .mock("POST", "/rest/api/3/issue")
        .expect(0)
        .create_async()
        .await;

    let llm = StaticBackend::new().with_reply(full_completion());
    let app = build_router(state_with(llm, Some(&server.url())));

    let (status, _) = post_json(
        app,
        "/fully-automate",
        serde_json::json!({"requirementsText": "Build a login page", "projectName": "Demo"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    space.assert_async().await;
    pages.assert_async().await;
    issues.assert_async().await;
}

#[tokio::test]
async fn malformed_completion_still_returns_200_with_fallback_docs() {
    let llm = StaticBackend::new().with_reply("I am sorry, I cannot produce JSON today.");
    let app = build_router(state_with(llm, None));

    let (status, json) = post_json(
        app,
        "/fully-automate",
        serde_json::json!({"requirementsText": "Build a login page", "projectName": "Demo"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["output"]["error"].as_str().is_some());
    let sections = json["output"]["docs"]["brd"]["sections"].as_array().unwrap();
    assert!(!sections.is_empty());
    assert!(sections[0]["body"]
        .as_str()
        .unwrap()
        .contains("Build a login page"));
    // RAID arrays are present even with nothing to fill them.
    assert!(json["output"]["docs"]["raid"]["dependencies"].is_array());
}

#[tokio::test]
async fn multipart_upload_feeds_the_prompt() {
    let llm = StaticBackend::new().with_reply(full_completion());
    let app = build_router(state_with(llm, None));

    let (status, _) = post_multipart(
        app,
        "/fully-automate",
        &[
            ("projectName", None, b"Demo".as_slice()),
            (
                "requirementsFile",
                Some("reqs.txt"),
                b"Uploaded requirements body".as_slice(),
            ),
        ],
    )
    .await;

    assert_eq!(status, StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_requirements_are_rejected() {
    let app = build_router(state_with(StaticBackend::new(), None));
    let (status, json) = post_json(
        app,
        "/fully-automate",
        serde_json::json!({"projectName": "Demo"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("requirements"));
}

#[tokio::test]
async fn publish_requires_both_project_and_space_keys() {
    let app = build_router(state_with(StaticBackend::new(), None));
    let (status, json) = post_json(
        app,
        "/fully-automate",
        serde_json::json!({
            "requirementsText": "x",
            "projectName": "Demo",
            "publish": true,
            "jiraProjectKey": "PX",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("confluenceSpaceKey"));
}

#[tokio::test]
async fn publish_without_credentials_is_a_400() {
    let llm = StaticBackend::new().with_reply(full_completion());
    // No publish env at all: resolution fails after the LLM step.
    let app = build_router(state_with(llm, None));
    let (status, json) = post_json(
        app,
        "/fully-automate",
        serde_json::json!({
            "requirementsText": "x",
            "projectName": "Demo",
            "publish": true,
            "jiraProjectKey": "PX",
            "confluenceSpaceKey": "DOCS",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("credentials"));
}

#[tokio::test]
async fn llm_unconfigured_is_a_500() {
    let app = build_router(AppState::new(ServerConfig::from_map(HashMap::new())));
    let (status, json) = post_json(
        app,
        "/fully-automate",
        serde_json::json!({"requirementsText": "x", "projectName": "Demo"}),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["error"].as_str().unwrap().contains("LLM"));
}

// ---------------------------------------------------------------------------
// Publication
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_space_aborts_before_any_creation() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/rest/api/space/DOCS")
        .with_status(404)
        .create_async()
        .await;
    let pages = server
        .mock("POST", "/rest/api/content")
        .expect(0)
        .create_async()
        .await;
    let issues = server
        .mock("POST", "/rest/api/3/issue")
        .expect(0)
        .create_async()
        .await;

    let llm = StaticBackend::new().with_reply(full_completion());
    let app = build_router(state_with(llm, Some(&server.url())));

    let (status, json) = post_json(
        app,
        "/fully-automate",
        serde_json::json!({
            "requirementsText": "Build a login page",
            "projectName": "Demo",
            "publish": true,
            "jiraProjectKey": "PX",
            "confluenceSpaceKey": "DOCS",
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("DOCS"));
    pages.assert_async().await;
    issues.assert_async().await;
}

#[tokio::test]
async fn publish_creates_five_pages_and_five_issues() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/rest/api/space/DOCS")
        .with_status(200)
        .with_body(r#"{"key": "DOCS", "name": "Docs"}"#)
        .create_async()
        .await;
    // 1 parent + 4 documents.
    let pages = server
        .mock("POST", "/rest/api/content")
        .with_status(200)
        .with_body(r#"{"id": "100", "_links": {"webui": "/spaces/DOCS/pages/100"}}"#)
        .expect(5)
        .create_async()
        .await;
    // 2 epics + 3 stories, all via the direct-parent tier.
    let issues = server
        .mock("POST", "/rest/api/3/issue")
        .with_status(201)
        .with_body(r#"{"id": "10001", "key": "PX-1"}"#)
        .expect(5)
        .create_async()
        .await;
    let fields = server
        .mock("GET", "/rest/api/3/field")
        .expect(0)
        .create_async()
        .await;

    let llm = StaticBackend::new().with_reply(full_completion());
    let app = build_router(state_with(llm, Some(&server.url())));

    let (status, json) = post_json(
        app,
        "/fully-automate",
        serde_json::json!({
            "requirementsText": "Build a login page",
            "projectName": "Demo",
            "publish": true,
            "jiraProjectKey": "PX",
            "confluenceSpaceKey": "DOCS",
            "labels": "docpack,auto",
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["published"]["jira"]["epics"].as_array().unwrap().len(), 2);
    assert_eq!(
        json["published"]["jira"]["stories"].as_array().unwrap().len(),
        3
    );
    assert!(json["published"]["confluence"]["parent"].as_str().is_some());
    pages.assert_async().await;
    issues.assert_async().await;
    fields.assert_async().await;
}

#[tokio::test]
async fn page_failure_aborts_issue_creation() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/rest/api/space/DOCS")
        .with_status(200)
        .with_body(r#"{"key": "DOCS"}"#)
        .create_async()
        .await;
    server
        .mock("POST", "/rest/api/content")
        .with_status(500)
        .with_body("storage backend unavailable")
        .create_async()
        .await;
    let issues = server
        .mock("POST", "/rest/api/3/issue")
        .expect(0)
        .create_async()
        .await;

    let llm = StaticBackend::new().with_reply(full_completion());
    let app = build_router(state_with(llm, Some(&server.url())));

    let (status, json) = post_json(
        app,
        "/fully-automate",
        serde_json::json!({
            "requirementsText": "x",
            "projectName": "Demo",
            "publish": true,
            "jiraProjectKey": "PX",
            "confluenceSpaceKey": "DOCS",
        }),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["error"].as_str().unwrap().contains("content"));
    issues.assert_async().await;
}

// ---------------------------------------------------------------------------
// Auxiliary endpoints
// ---------------------------------------------------------------------------

#[tokio::test]
async fn ai_draft_returns_parsed_json() {
    let llm = StaticBackend::new().with_reply(r#"{"kind": "draft", "items": [1, 2]}"#);
    let app = build_router(state_with(llm, None));

    let (status, json) = post_json(
        app,
        "/ai-draft",
        serde_json::json!({"prompt": "two items please"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["parsed"]["kind"], "draft");
    assert!(json.get("error").is_none());
}

#[tokio::test]
async fn generate_user_stories_returns_backlog() {
    let llm = StaticBackend::new().with_reply(
        r#"{"epics": [{"name": "Export", "description": "CSV export"}],
            "stories": [{"epicName": "Export", "summary": "Download CSV",
                         "story": "As an analyst I can download a CSV",
                         "acceptanceCriteria": ["UTF-8"], "priority": "P1", "storyPoints": 3}]}"#,
    );
    let app = build_router(state_with(llm, None));

    let (status, json) = post_json(
        app,
        "/generate-user-stories",
        serde_json::json!({"requirementsText": "analysts need exports"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["epics"][0]["name"], "Export");
    assert_eq!(json["stories"][0]["storyPoints"], 3);
}

#[tokio::test]
async fn user_stories_xlsx_returns_attachment_without_llm_call() {
    let llm = StaticBackend::new();
    let state = state_with(llm, None);
    let app = build_router(state);

    let req = axum::http::Request::builder()
        .method("POST")
        .uri("/user-stories-xlsx")
        .header("content-type", "application/json")
        .body(axum::body::Body::from(
            serde_json::json!({
                "stories": [{"epicName": "Export", "summary": "Download CSV",
                             "story": "As an analyst I can download a CSV",
                             "acceptanceCriteria": [], "priority": "P1", "storyPoints": 3}]
            })
            .to_string(),
        ))
        .unwrap();
    let response = app.oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("user-stories.xlsx"));
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..2], b"PK");
}

#[tokio::test]
async fn chat_returns_reply() {
    let llm = StaticBackend::new().with_reply("Use three sprints.");
    let app = build_router(state_with(llm, None));

    let (status, json) = post_json(
        app,
        "/api/chat",
        serde_json::json!({
            "message": "how many sprints?",
            "history": [{"role": "user", "content": "hi"}, {"role": "assistant", "content": "hello"}],
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["reply"], "Use three sprints.");
}

#[tokio::test]
async fn code_review_requires_code() {
    let app = build_router(state_with(StaticBackend::new(), None));
    let (status, _) = post_json(app, "/code-review", serde_json::json!({"code": ""})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn sprint_retro_analyzes_notes() {
    let llm = StaticBackend::new()
        .with_reply(r#"{"wins": ["shipped"], "improvements": [], "actionItems": [], "sentiment": "positive"}"#);
    let app = build_router(state_with(llm, None));

    let (status, json) = post_json(
        app,
        "/sprint-retro-analyze",
        serde_json::json!({"sprintName": "S12", "notes": "we shipped the login page"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["analysis"]["sentiment"], "positive");
}

#[tokio::test]
async fn generate_docx_without_template_is_400() {
    let app = build_router(state_with(StaticBackend::new(), None));
    let (status, body) = post_multipart(
        app,
        "/generate-docx",
        &[("projectName", None, b"Demo".as_slice())],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(json["error"].as_str().unwrap().contains("templateDocx"));
}

#[tokio::test]
async fn email_doc_without_smtp_is_a_500() {
    let app = build_router(state_with(StaticBackend::new(), None));
    let (status, body) = post_multipart(
        app,
        "/email-doc",
        &[
            ("to", None, b"pm@acme.com".as_slice()),
            ("file", Some("doc.docx"), b"PK...".as_slice()),
        ],
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(json["error"].as_str().unwrap().contains("not configured"));
}
