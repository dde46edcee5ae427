//! POST /generate-docx — fill a DOCX template's `{field}` tokens from flat
//! form fields and return the rendered document.

use std::collections::HashMap;

use axum::extract::Multipart;
use axum::response::Response;
use docpack_core::extract;

use crate::docx::render_docx_template;
use crate::error::AppError;

pub async fn generate_docx(mut multipart: Multipart) -> Result<Response, AppError> {
    let mut template: Option<Vec<u8>> = None;
    let mut fields: HashMap<String, String> = HashMap::new();
    let mut requirements_file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(format!("malformed multipart field: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "templateDocx" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::bad_request(format!("unreadable template: {e}")))?;
                template = Some(bytes.to_vec());
            }
            "requirementsFile" => {
                let filename = field.file_name().unwrap_or("upload.txt").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::bad_request(format!("unreadable upload: {e}")))?;
                requirements_file = Some((filename, bytes.to_vec()));
            }
            _ => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::bad_request(format!("unreadable field '{name}': {e}")))?;
                fields.insert(name, value);
            }
        }
    }

    let Some(template) = template else {
        return Err(AppError::bad_request("templateDocx file is required"));
    };

    // Extracted file text lands under the "requirements" token, appended to
    // any pasted value.
    if let Some((filename, bytes)) = requirements_file {
        let text = extract::file_text(&filename, &bytes)?;
        let entry = fields.entry("requirements".to_string()).or_default();
        if entry.is_empty() {
            *entry = text;
        } else {
            entry.push_str("\n\n");
            entry.push_str(&text);
        }
    }

    let rendered = render_docx_template(&template, &fields)?;
    Ok(super::attachment_response(
        "generated.docx",
        super::DOCX_CONTENT_TYPE,
        rendered,
    ))
}
