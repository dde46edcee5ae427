//! POST /email-doc — send a generated file as an email attachment.

use axum::extract::{Multipart, State};
use axum::Json;
use lettre::message::Mailbox;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::mailer;
use crate::state::AppState;

pub async fn email_doc(
    State(app): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    let Some(smtp) = app.config.smtp.clone() else {
        return Err(AppError::not_configured(
            "email delivery is not configured: set SMTP_HOST, SMTP_USERNAME and SMTP_PASSWORD",
        ));
    };

    let mut file: Option<(String, Vec<u8>)> = None;
    let mut to = String::new();
    let mut subject = "Generated document".to_string();
    let mut body = "Please find the generated document attached.".to_string();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(format!("malformed multipart field: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("document").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::bad_request(format!("unreadable attachment: {e}")))?;
                file = Some((filename, bytes.to_vec()));
            }
            _ => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::bad_request(format!("unreadable field '{name}': {e}")))?;
                match name.as_str() {
                    "to" => to = value.trim().to_string(),
                    "subject" => subject = value,
                    "body" => body = value,
                    _ => {}
                }
            }
        }
    }

    let Some((filename, bytes)) = file else {
        return Err(AppError::bad_request("a file to send is required"));
    };
    if to.is_empty() {
        return Err(AppError::bad_request("recipient 'to' is required"));
    }
    let mailbox: Mailbox = to
        .parse()
        .map_err(|e| AppError::bad_request(format!("invalid recipient address '{to}': {e}")))?;

    let content_type = content_type_for(&filename);
    mailer::send_with_attachment(&smtp, mailbox, &subject, &body, &filename, bytes, content_type)
        .await?;

    Ok(Json(json!({"sent": true, "to": to})))
}

fn content_type_for(filename: &str) -> &'static str {
    let lower = filename.to_ascii_lowercase();
    if lower.ends_with(".docx") {
        super::DOCX_CONTENT_TYPE
    } else if lower.ends_with(".xlsx") {
        super::XLSX_CONTENT_TYPE
    } else if lower.ends_with(".pdf") {
        "application/pdf"
    } else if lower.ends_with(".txt") || lower.ends_with(".md") {
        "text/plain"
    } else {
        "application/octet-stream"
    }
}
