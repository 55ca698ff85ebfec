//! Loading and persisting the JSON documents themselves.
//!
//! Documents stay as `serde_json::Value` with key order preserved, so a rebuild only
//! touches the literal payloads and leaves every other field where the author put it.

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, error};

use crate::contract::RoundTripError;

/// Indentation used when writing page documents back.
pub const PAGE_INDENT: &[u8] = b"   ";
/// Indentation used when writing virtual domain documents back.
pub const VIRTUAL_DOMAIN_INDENT: &[u8] = b"  ";

/// Reads and parses a document, mapping a missing file to `SourceNotFound`.
pub fn load_document(path: &Path) -> Result<Value, RoundTripError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            error!(path = %path.display(), "Source document not found");
            return Err(RoundTripError::SourceNotFound(path.to_path_buf()));
        }
        Err(e) => {
            error!(path = %path.display(), error = ?e, "Failed to read source document");
            return Err(RoundTripError::io(path, e));
        }
    };
    let document = serde_json::from_str(&raw).map_err(|e| {
        error!(path = %path.display(), error = %e, "Source document is not valid JSON");
        RoundTripError::Malformed {
            path: path.to_path_buf(),
            source: e,
        }
    })?;
    debug!(path = %path.display(), bytes = raw.len(), "Loaded document");
    Ok(document)
}

/// Pretty-prints `value` with the given indentation. Non-ASCII text is written as-is.
pub fn to_pretty_string<T: Serialize>(
    value: &T,
    indent: &[u8],
    path: &Path,
) -> Result<String, RoundTripError> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(indent);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value
        .serialize(&mut serializer)
        .map_err(|e| RoundTripError::Encode {
            path: path.to_path_buf(),
            source: e,
        })?;
    // serde_json only ever emits UTF-8.
    String::from_utf8(buf).map_err(|e| {
        RoundTripError::io(path, std::io::Error::new(ErrorKind::InvalidData, e))
    })
}

/// Overwrites the document at `path` in full.
pub fn write_document(path: &Path, document: &Value, indent: &[u8]) -> Result<(), RoundTripError> {
    let rendered = to_pretty_string(document, indent, path)?;
    fs::write(path, rendered).map_err(|e| {
        error!(path = %path.display(), error = ?e, "Failed to write document");
        RoundTripError::io(path, e)
    })
}

/// Reads a text file that may legitimately be absent.
pub(crate) fn read_optional(path: &Path) -> Result<Option<String>, RoundTripError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => {
            error!(path = %path.display(), error = ?e, "Failed to read extracted file");
            Err(RoundTripError::io(path, e))
        }
    }
}

/// Creates the group directory if needed.
pub(crate) fn ensure_dir(path: &Path) -> Result<(), RoundTripError> {
    fs::create_dir_all(path).map_err(|e| {
        error!(path = %path.display(), error = ?e, "Failed to create output directory");
        RoundTripError::io(path, e)
    })
}

pub(crate) fn write_text(path: &Path, content: &str) -> Result<(), RoundTripError> {
    fs::write(path, content).map_err(|e| {
        error!(path = %path.display(), error = ?e, "Failed to write extracted file");
        RoundTripError::io(path, e)
    })
}

/// File stem as a string, used when a document has no grouping key of its own.
pub(crate) fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}
