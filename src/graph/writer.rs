//! Document serialization
//!
//! Pretty output uses a four-space indent. With `ascii_only`, every non-ASCII
//! character and DEL is written as a `\uXXXX` escape, UTF-16 surrogate pairs above
//! the BMP, so files match what a Python `json.dump(..., indent=4)` of the
//! same data produces.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::GraphDocument;
use crate::error::Result;

/// Output format for JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Compact,
}

/// Serialize a document to a string
pub fn to_json_string(doc: &GraphDocument, format: OutputFormat, ascii_only: bool) -> Result<String> {
    let text = match format {
        OutputFormat::Pretty => {
            let mut buf = Vec::new();
            let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
            let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
            doc.serialize(&mut ser)?;
            // serde_json only ever writes valid UTF-8
            String::from_utf8_lossy(&buf).into_owned()
        }
        OutputFormat::Compact => serde_json::to_string(doc)?,
    };

    Ok(if ascii_only { escape_non_ascii(&text) } else { text })
}

/// Write a document to any writer
pub fn write_document<W: Write>(
    doc: &GraphDocument,
    format: OutputFormat,
    ascii_only: bool,
    mut writer: W,
) -> Result<()> {
    let text = to_json_string(doc, format, ascii_only)?;
    writer.write_all(text.as_bytes())?;
    writer.flush()?;
    Ok(())
}

/// Write a document to a file, replacing it
pub fn save_document(doc: &GraphDocument, format: OutputFormat, ascii_only: bool, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    write_document(doc, format, ascii_only, BufWriter::new(file))
}

fn needs_escape(c: char) -> bool {
    !c.is_ascii() || c == '\u{7f}'
}

// Structural JSON is pure ASCII, so escaped chars only occur inside strings.
fn escape_non_ascii(text: &str) -> String {
    if !text.chars().any(needs_escape) {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len() + text.len() / 4);
    let mut units = [0u16; 2];
    for c in text.chars() {
        if !needs_escape(c) {
            out.push(c);
            continue;
        }
        for unit in c.encode_utf16(&mut units) {
            out.push_str(&format!("\\u{:04x}", unit));
        }
    }
    out
}
