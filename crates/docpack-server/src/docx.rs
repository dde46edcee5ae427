//! DOCX template substitution: rewrite `{field}` tokens inside the document
//! parts of an uploaded template. The template format itself stays opaque —
//! everything except the XML text substitution passes through untouched.

use std::collections::HashMap;
use std::io::{Cursor, Read, Write};

use docpack_core::{DocpackError, Result};
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

fn rebuild_err(e: impl std::fmt::Display) -> DocpackError {
    DocpackError::Io(std::io::Error::other(format!("failed to rebuild docx: {e}")))
}

/// Replace `{key}` tokens in the template's document, header, and footer
/// parts with the given field values.
pub fn render_docx_template(template: &[u8], fields: &HashMap<String, String>) -> Result<Vec<u8>> {
    let mut archive = ZipArchive::new(Cursor::new(template)).map_err(|e| {
        DocpackError::Validation(format!("templateDocx is not a valid .docx archive: {e}"))
    })?;

    let mut out = Cursor::new(Vec::new());
    let mut writer = ZipWriter::new(&mut out);

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(|e| {
            DocpackError::Validation(format!("unreadable entry in templateDocx: {e}"))
        })?;
        let name = entry.name().to_string();
        let mut data = Vec::new();
        entry.read_to_end(&mut data)?;

        if is_text_part(&name) {
            let mut xml = String::from_utf8_lossy(&data).into_owned();
            for (key, value) in fields {
                xml = xml.replace(&format!("{{{key}}}"), &xml_escape(value));
            }
            data = xml.into_bytes();
        }

        writer
            .start_file(name, SimpleFileOptions::default())
            .map_err(rebuild_err)?;
        writer.write_all(&data)?;
    }

    writer.finish().map_err(rebuild_err)?;
    Ok(out.into_inner())
}

/// Document parts whose text content is substituted.
fn is_text_part(name: &str) -> bool {
    name == "word/document.xml"
        || ((name.starts_with("word/header") || name.starts_with("word/footer"))
            && name.ends_with(".xml"))
}

fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
