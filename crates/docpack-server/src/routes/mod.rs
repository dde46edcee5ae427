pub mod automate;
pub mod chat;
pub mod docgen;
pub mod draft;
pub mod email;
pub mod health;
pub mod retro;
pub mod review;
pub mod stories;

use axum::http::header;
use axum::response::{IntoResponse, Response};

pub(crate) const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub(crate) const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Binary download response with a content-disposition filename.
pub(crate) fn attachment_response(filename: &str, content_type: &str, bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}
