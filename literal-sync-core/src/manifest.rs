//! The `_extraction_map.json` sidecar that joins extracted files back to their position
//! in the source document.
//!
//! Two shapes exist, one per document kind, and both keep the field names of the
//! historical sidecar files so existing extraction directories stay readable.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use crate::contract::RoundTripError;
use crate::document::to_pretty_string;
use crate::page::ComponentPath;
use crate::virtual_domain::CodeField;

pub const MANIFEST_FILE: &str = "_extraction_map.json";

const MANIFEST_INDENT: &[u8] = b"  ";

/// Manifest of a page extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageManifest {
    pub source_file: PathBuf,
    pub page_name: String,
    pub literals: Vec<LiteralRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiteralRecord {
    pub component_path: ComponentPath,
    pub name: String,
    pub filename: String,
    pub content_hash: String,
}

/// Manifest of a virtual domain extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualDomainManifest {
    pub source_file: PathBuf,
    pub service_name: String,
    pub sql_blocks: Vec<SqlBlockRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlBlockRecord {
    pub field: CodeField,
    pub filename: String,
    pub content_hash: String,
}

/// The part every manifest shape has in common.
#[derive(Deserialize)]
struct ManifestHeader {
    source_file: PathBuf,
}

pub fn manifest_path(group_dir: &Path) -> PathBuf {
    group_dir.join(MANIFEST_FILE)
}

pub fn has_manifest(group_dir: &Path) -> bool {
    manifest_path(group_dir).is_file()
}

pub fn load_manifest<M: DeserializeOwned>(group_dir: &Path) -> Result<M, RoundTripError> {
    let path = manifest_path(group_dir);
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            error!(path = %path.display(), "Extraction map not found");
            return Err(RoundTripError::ManifestNotFound(path));
        }
        Err(e) => return Err(RoundTripError::io(&path, e)),
    };
    serde_json::from_str(&raw).map_err(|e| {
        error!(path = %path.display(), error = %e, "Extraction map is not valid");
        RoundTripError::Malformed { path, source: e }
    })
}

pub fn store_manifest<M: Serialize>(group_dir: &Path, manifest: &M) -> Result<PathBuf, RoundTripError> {
    let path = manifest_path(group_dir);
    let rendered = to_pretty_string(manifest, MANIFEST_INDENT, &path)?;
    fs::write(&path, rendered).map_err(|e| {
        error!(path = %path.display(), error = ?e, "Failed to write extraction map");
        RoundTripError::io(&path, e)
    })?;
    info!(path = %path.display(), "Extraction map saved");
    Ok(path)
}

/// Fails when `group_dir` already holds the extraction of a different document.
///
/// A manifest that cannot be read is treated as absent: it is about to be replaced and
/// carries no source to protect.
pub fn ensure_group_available(
    group: &str,
    group_dir: &Path,
    incoming: &Path,
) -> Result<(), RoundTripError> {
    let path = manifest_path(group_dir);
    let Ok(raw) = fs::read_to_string(&path) else {
        return Ok(());
    };
    let Ok(header) = serde_json::from_str::<ManifestHeader>(&raw) else {
        debug!(path = %path.display(), "Ignoring unreadable extraction map");
        return Ok(());
    };
    if same_document(&header.source_file, incoming) {
        return Ok(());
    }
    error!(
        group = %group,
        existing = %header.source_file.display(),
        incoming = %incoming.display(),
        "Group directory already belongs to another document"
    );
    Err(RoundTripError::GroupCollision {
        group: group.to_string(),
        existing: header.source_file,
        incoming: incoming.to_path_buf(),
    })
}

/// Path equality that sees through `./` prefixes and symlinks when both sides exist.
pub fn same_document(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
