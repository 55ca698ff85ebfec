//! # contract: the round-tripper interface and the types that cross it
//!
//! One [`RoundTripper`] exists per [`DocumentKind`]. The batch [`crate::pipeline`] drives
//! any implementor, so the CLI and the tests never care whether they are moving markup or
//! SQL around.
//!
//! ## Mocking & Testing
//! - The trait is annotated for `mockall`, exported under the `test-export-mocks` feature
//!   so downstream crates can drive the pipeline without touching the filesystem.
//!
//! ## Errors
//! - Every fallible operation returns [`RoundTripError`]. Drift between a manifest and the
//!   live document is not an error: it surfaces as [`SyncStatus::Stale`] or as the
//!   `stale` counter of a [`RebuildOutcome`].

use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

/// The two document shapes the tool understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    /// Component-tree page documents carrying HTML/CSS/JS literals.
    Page,
    /// Flat virtual domain documents carrying SQL code blocks.
    VirtualDomain,
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::Page => f.write_str("page"),
            DocumentKind::VirtualDomain => f.write_str("virtual domain"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RoundTripError {
    #[error("source document not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("extraction map not found: {}", .0.display())]
    ManifestNotFound(PathBuf),

    #[error("failed to parse {}: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid file or group name: {0:?}")]
    InvalidName(String),

    #[error(
        "group '{group}' already holds the extraction of {}, refusing to overwrite it with {}",
        .existing.display(),
        .incoming.display()
    )]
    GroupCollision {
        group: String,
        existing: PathBuf,
        incoming: PathBuf,
    },

    #[error(
        "page '{group}' has several literals that would share the file '{filename}': {}",
        .locations.join(", ")
    )]
    DuplicateFilename {
        group: String,
        filename: String,
        locations: Vec<String>,
    },

    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode {}: {source}", .path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl RoundTripError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        RoundTripError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// One file written by an extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedEntry {
    /// Component path (pages) or JSON field name (virtual domains).
    pub location: String,
    pub filename: String,
    pub content_hash: String,
}

/// Summary of a single document extraction.
#[derive(Debug, Clone)]
pub struct ExtractOutcome {
    pub kind: DocumentKind,
    pub group: String,
    pub group_dir: PathBuf,
    pub source_file: PathBuf,
    pub entries: Vec<ExtractedEntry>,
    /// Virtual domains without any SQL do not get a manifest.
    pub manifest_written: bool,
}

/// Summary of a single document rebuild.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebuildOutcome {
    pub source_file: PathBuf,
    /// Records written back into the document.
    pub restored: usize,
    /// Records whose extracted file no longer exists.
    pub missing_files: usize,
    /// Records whose position no longer addresses a literal.
    pub stale: usize,
}

/// Per-record result of a sync check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    InSync,
    Modified {
        file_hash: String,
        document_hash: String,
    },
    MissingFile,
    /// The recorded position no longer resolves to a literal in the document.
    Stale { file_hash: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncEntry {
    pub location: String,
    pub file: PathBuf,
    pub status: SyncStatus,
}

/// Result of checking one group directory against its source document.
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub group: String,
    pub source_file: PathBuf,
    pub entries: Vec<SyncEntry>,
}

impl SyncReport {
    pub fn is_in_sync(&self) -> bool {
        self.entries
            .iter()
            .all(|entry| entry.status == SyncStatus::InSync)
    }

    pub fn out_of_sync(&self) -> impl Iterator<Item = &SyncEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.status != SyncStatus::InSync)
    }
}

pub(crate) fn log_status(file: &Path, status: &SyncStatus) {
    match status {
        SyncStatus::InSync => info!(path = %file.display(), "In sync"),
        SyncStatus::MissingFile => warn!(path = %file.display(), "Missing extracted file"),
        SyncStatus::Modified {
            file_hash,
            document_hash,
        } => warn!(
            path = %file.display(),
            file_hash = %file_hash,
            document_hash = %document_hash,
            "Out of sync"
        ),
        SyncStatus::Stale { file_hash } => warn!(
            path = %file.display(),
            file_hash = %file_hash,
            "Recorded position no longer holds a literal"
        ),
    }
}

/// Extract / rebuild / check for one document kind.
///
/// Implementors own the output root they write group directories into, and must use the
/// same addressing scheme for all three operations so that manifests stay joinable.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait RoundTripper {
    fn kind(&self) -> DocumentKind;

    /// Directory holding one group directory per extracted document.
    fn output_root(&self) -> PathBuf;

    /// Extract every non-blank literal of the document at `source` into its group directory.
    fn extract(&self, source: &Path) -> Result<ExtractOutcome, RoundTripError>;

    /// Write the group's extracted files back into the source document recorded in its manifest.
    fn rebuild(&self, group_dir: &Path) -> Result<RebuildOutcome, RoundTripError>;

    /// Compare the group's extracted files with the live source document, read-only.
    fn check(&self, group_dir: &Path) -> Result<SyncReport, RoundTripError>;
}
