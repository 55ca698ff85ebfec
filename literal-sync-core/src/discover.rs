//! Finding candidate documents on disk and the group directories left by earlier
//! extractions.

use regex::Regex;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use crate::contract::{DocumentKind, RoundTripError};
use crate::manifest::{has_manifest, MANIFEST_FILE};
use crate::page::looks_like_page;
use crate::virtual_domain::looks_like_virtual_domain;

/// Matches every JSON file.
pub const DEFAULT_PATTERN: &str = r"\.json$";

const SKIPPED_DIRS: [&str; 3] = [".git", "target", "node_modules"];

/// Which kind of document `document` is, judged by its top-level fields.
pub fn detect_kind(document: &Value) -> Option<DocumentKind> {
    if looks_like_page(document) {
        Some(DocumentKind::Page)
    } else if looks_like_virtual_domain(document) {
        Some(DocumentKind::VirtualDomain)
    } else {
        None
    }
}

/// Recursively collects the JSON files under `root` whose root-relative path matches
/// `pattern` and whose content is a document of `kind`. Sorted by path.
pub fn discover_documents(
    root: &Path,
    pattern: &Regex,
    kind: DocumentKind,
) -> Result<Vec<PathBuf>, RoundTripError> {
    info!(root = %root.display(), pattern = %pattern, %kind, "Discovering documents");

    fn visit_dir(
        dir: &Path,
        root: &Path,
        pattern: &Regex,
        kind: DocumentKind,
        results: &mut Vec<PathBuf>,
    ) -> Result<(), RoundTripError> {
        let entries = fs::read_dir(dir).map_err(|e| RoundTripError::io(dir, e))?;
        for entry_res in entries {
            let entry = entry_res.map_err(|e| RoundTripError::io(dir, e))?;
            let path = entry.path();
            let file_name = entry.file_name().to_string_lossy().into_owned();
            if path.is_dir() {
                if SKIPPED_DIRS.contains(&file_name.as_str()) {
                    debug!(path = %path.display(), "Skipping directory");
                    continue;
                }
                visit_dir(&path, root, pattern, kind, results)?;
                continue;
            }
            if !file_name.ends_with(".json") || file_name == MANIFEST_FILE {
                continue;
            }
            let relative = path
                .strip_prefix(root)
                .unwrap_or(&path)
                .to_string_lossy()
                .replace('\\', "/");
            if !pattern.is_match(&relative) {
                continue;
            }
            let document = fs::read_to_string(&path)
                .ok()
                .and_then(|raw| serde_json::from_str::<Value>(&raw).ok());
            match document {
                Some(document) if detect_kind(&document) == Some(kind) => {
                    debug!(path = %path.display(), "Found document");
                    results.push(path);
                }
                Some(_) => debug!(path = %path.display(), "Not a matching document"),
                None => debug!(path = %path.display(), "Skipping unreadable JSON file"),
            }
        }
        Ok(())
    }

    let mut results = Vec::new();
    if let Err(e) = visit_dir(root, root, pattern, kind, &mut results) {
        error!(error = %e, root = %root.display(), "Discovery failed");
        return Err(e);
    }
    results.sort();
    info!(count = results.len(), %kind, "Discovery complete");
    Ok(results)
}

/// Subdirectories of `output_root` that hold a manifest, sorted. A missing output root
/// simply has no groups.
pub fn group_dirs(output_root: &Path) -> Result<Vec<PathBuf>, RoundTripError> {
    if !output_root.is_dir() {
        debug!(path = %output_root.display(), "Output root does not exist");
        return Ok(Vec::new());
    }
    let entries = fs::read_dir(output_root).map_err(|e| RoundTripError::io(output_root, e))?;
    let mut groups = Vec::new();
    for entry_res in entries {
        let entry = entry_res.map_err(|e| RoundTripError::io(output_root, e))?;
        let path = entry.path();
        if path.is_dir() && has_manifest(&path) {
            groups.push(path);
        }
    }
    groups.sort();
    Ok(groups)
}
