//! Text extraction for uploaded requirements files.
//!
//! `.docx` uploads are unpacked (they are zip archives) and the main document
//! part is reduced to plain text; anything else is decoded as UTF-8, lossily.

use std::io::{Cursor, Read};
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{DocpackError, Result};

static TAG_RE: OnceLock<Regex> = OnceLock::new();

fn tag_re() -> &'static Regex {
    TAG_RE.get_or_init(|| Regex::new(r"<[^>]+>").unwrap())
}

/// Decode an uploaded file to plain text based on its filename.
pub fn file_text(filename: &str, bytes: &[u8]) -> Result<String> {
    if filename.to_ascii_lowercase().ends_with(".docx") {
        docx_text(bytes)
    } else {
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

/// Pull the readable text out of a `.docx` file: paragraphs become lines,
/// markup is stripped, basic XML entities are decoded.
pub fn docx_text(bytes: &[u8]) -> Result<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| {
        DocpackError::Validation(format!("uploaded file is not a readable .docx archive: {e}"))
    })?;
    let mut entry = archive.by_name("word/document.xml").map_err(|_| {
        DocpackError::Validation("uploaded .docx has no word/document.xml part".to_string())
    })?;
    let mut xml = String::new();
    entry.read_to_string(&mut xml)?;

    let with_breaks = xml.replace("</w:p>", "\n");
    let stripped = tag_re().replace_all(&with_breaks, "");

    let decoded = stripped
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&");

    let lines: Vec<&str> = decoded
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    Ok(lines.join("\n"))
}
