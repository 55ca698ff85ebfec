//! Helpers shared by both document kinds: hashing, blank detection, line endings and
//! file-name safety.

use crate::contract::RoundTripError;

/// Hex MD5 digest of the content as it is written to disk.
pub fn content_hash(content: &str) -> String {
    format!("{:x}", md5::compute(content.as_bytes()))
}

/// True when there is nothing left after trimming whitespace.
pub fn is_blank(content: &str) -> bool {
    content.trim().is_empty()
}

/// Collapses CRLF and lone CR into `\n`.
pub fn normalize_line_endings(content: &str) -> String {
    content.replace("\r\n", "\n").replace('\r', "\n")
}

/// Rejects anything that would not stay a single entry inside the group directory.
pub fn ensure_path_segment(name: &str) -> Result<&str, RoundTripError> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0');
    if invalid {
        tracing::error!(name = %name, "Refusing unsafe path segment");
        return Err(RoundTripError::InvalidName(name.to_string()));
    }
    Ok(name)
}
