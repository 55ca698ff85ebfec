//! Batch driver: runs one command over many documents or group directories.
//!
//! # Responsibilities
//! - Sequential, one document at a time; a failing document is recorded and the run moves
//!   on to the next one
//! - Aggregates outcomes into a [`RunReport`] whose [`RunReport::is_success`] decides the
//!   process exit status
//!
//! # Callable From
//! - The CLI crate and integration tests, with any [`RoundTripper`] (real or mocked)

use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::contract::{
    DocumentKind, ExtractOutcome, RebuildOutcome, RoundTripError, RoundTripper, SyncReport,
};
use crate::discover::group_dirs;

/// A document or group directory whose operation aborted.
#[derive(Debug)]
pub struct DocumentFailure {
    pub target: PathBuf,
    pub error: RoundTripError,
}

#[derive(Debug)]
pub struct RunReport {
    pub kind: DocumentKind,
    pub extracted: Vec<ExtractOutcome>,
    pub rebuilt: Vec<RebuildOutcome>,
    pub checked: Vec<SyncReport>,
    pub failures: Vec<DocumentFailure>,
}

impl RunReport {
    pub fn new(kind: DocumentKind) -> Self {
        Self {
            kind,
            extracted: Vec::new(),
            rebuilt: Vec::new(),
            checked: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// No failures and every checked group in sync.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.checked.iter().all(SyncReport::is_in_sync)
    }

    fn fail(&mut self, target: &Path, error: RoundTripError) {
        error!(target = %target.display(), error = %error, kind = %self.kind, "Operation failed");
        self.failures.push(DocumentFailure {
            target: target.to_path_buf(),
            error,
        });
    }
}

/// Extracts every document in `sources`, in order.
pub fn extract_all<R>(tripper: &R, sources: &[PathBuf]) -> RunReport
where
    R: RoundTripper + ?Sized,
{
    let mut report = RunReport::new(tripper.kind());
    info!(count = sources.len(), kind = %report.kind, "[EXTRACT] Starting");
    for source in sources {
        match tripper.extract(source) {
            Ok(outcome) => {
                info!(
                    source = %source.display(),
                    group = %outcome.group,
                    files = outcome.entries.len(),
                    "[EXTRACT] Document extracted"
                );
                report.extracted.push(outcome);
            }
            Err(e) => report.fail(source, e),
        }
    }
    report
}

/// Rebuilds the source document of every group under the tripper's output root.
pub fn rebuild_all<R>(tripper: &R) -> RunReport
where
    R: RoundTripper + ?Sized,
{
    let mut report = RunReport::new(tripper.kind());
    let output_root = tripper.output_root();
    let groups = match group_dirs(&output_root) {
        Ok(groups) => groups,
        Err(e) => {
            report.fail(&output_root, e);
            return report;
        }
    };
    info!(count = groups.len(), kind = %report.kind, "[REBUILD] Starting");
    for group in &groups {
        match tripper.rebuild(group) {
            Ok(outcome) => report.rebuilt.push(outcome),
            Err(e) => report.fail(group, e),
        }
    }
    report
}

/// Checks every group under the tripper's output root.
pub fn check_all<R>(tripper: &R) -> RunReport
where
    R: RoundTripper + ?Sized,
{
    let mut report = RunReport::new(tripper.kind());
    let output_root = tripper.output_root();
    let groups = match group_dirs(&output_root) {
        Ok(groups) => groups,
        Err(e) => {
            report.fail(&output_root, e);
            return report;
        }
    };
    info!(count = groups.len(), kind = %report.kind, "[CHECK] Starting");
    for group in &groups {
        match tripper.check(group) {
            Ok(sync) => {
                info!(group = %sync.group, in_sync = sync.is_in_sync(), "[CHECK] Group checked");
                report.checked.push(sync);
            }
            Err(e) => report.fail(group, e),
        }
    }
    report
}
