//! Virtual domain documents: a flat object whose `codeGet`, `codePost`, `codePut` and
//! `codeDelete` fields hold SQL.
//!
//! SQL is written with normalised line endings and compared with normalised line endings,
//! so exports that carry CRLF still check as in sync after extraction.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::content::{content_hash, ensure_path_segment, is_blank, normalize_line_endings};
use crate::contract::{
    DocumentKind, ExtractOutcome, ExtractedEntry, RebuildOutcome, RoundTripError, RoundTripper,
    log_status, SyncEntry, SyncReport, SyncStatus,
};
use crate::document::{
    ensure_dir, file_stem, load_document, read_optional, write_document, write_text,
    VIRTUAL_DOMAIN_INDENT,
};
use crate::manifest::{
    ensure_group_available, load_manifest, store_manifest, SqlBlockRecord, VirtualDomainManifest,
};

const GROUP_FIELD: &str = "serviceName";
const EXPORT_PREFIX: &str = "virtualDomains.";

/// The SQL-bearing fields of a virtual domain, in extraction order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CodeField {
    #[serde(rename = "codeGet")]
    Get,
    #[serde(rename = "codePost")]
    Post,
    #[serde(rename = "codePut")]
    Put,
    #[serde(rename = "codeDelete")]
    Delete,
}

impl CodeField {
    pub const ALL: [CodeField; 4] = [
        CodeField::Get,
        CodeField::Post,
        CodeField::Put,
        CodeField::Delete,
    ];

    pub fn json_key(self) -> &'static str {
        match self {
            CodeField::Get => "codeGet",
            CodeField::Post => "codePost",
            CodeField::Put => "codePut",
            CodeField::Delete => "codeDelete",
        }
    }

    /// `codeget.sql`, `codepost.sql`, ...
    pub fn file_name(self) -> String {
        format!("{}.sql", self.json_key().to_lowercase())
    }
}

/// SQL currently held by `field`. `None` when the field is absent or not text.
pub fn sql_value(document: &Value, field: CodeField) -> Option<String> {
    match document.get(field.json_key())? {
        Value::String(sql) => Some(sql.clone()),
        Value::Null => Some(String::new()),
        _ => None,
    }
}

/// Replaces the SQL of `field`. Returns false when the field no longer holds SQL.
pub fn set_sql_value(document: &mut Value, field: CodeField, sql: String) -> bool {
    if sql_value(document, field).is_none() {
        return false;
    }
    match document.as_object_mut() {
        Some(fields) => {
            fields.insert(field.json_key().to_string(), Value::String(sql));
            true
        }
        None => false,
    }
}

/// True when the document has a `serviceName` and at least one code field.
pub fn looks_like_virtual_domain(document: &Value) -> bool {
    document.get(GROUP_FIELD).is_some()
        && CodeField::ALL
            .iter()
            .any(|field| document.get(field.json_key()).is_some())
}

/// Grouping key: `serviceName`, falling back to the file stem without its export prefix.
pub fn resolve_service_name(document: &Value, source: &Path) -> String {
    document
        .get(GROUP_FIELD)
        .and_then(Value::as_str)
        .map(str::to_owned)
        .unwrap_or_else(|| file_stem(source).replace(EXPORT_PREFIX, ""))
}

/// Extracts the non-blank SQL blocks of the virtual domain at `source`.
///
/// The manifest is only written when at least one block was extracted.
pub fn extract_virtual_domain(
    source: &Path,
    output_root: &Path,
) -> Result<VirtualDomainManifest, RoundTripError> {
    let document = load_document(source)?;
    let service_name = resolve_service_name(&document, source);
    ensure_path_segment(&service_name)?;
    let domain_dir = output_root.join(&service_name);
    ensure_group_available(&service_name, &domain_dir, source)?;
    ensure_dir(&domain_dir)?;

    info!(source = %source.display(), service = %service_name, "Extracting virtual domain SQL");

    let mut manifest = VirtualDomainManifest {
        source_file: source.to_path_buf(),
        service_name,
        sql_blocks: Vec::new(),
    };

    for field in CodeField::ALL {
        let Some(sql) = document.get(field.json_key()).and_then(Value::as_str) else {
            continue;
        };
        if is_blank(sql) {
            debug!(field = field.json_key(), "Skipping blank SQL block");
            continue;
        }
        let cleaned = normalize_line_endings(sql);
        let filename = field.file_name();
        let file_path = domain_dir.join(&filename);
        write_text(&file_path, &cleaned)?;
        info!(path = %file_path.display(), "Extracted SQL");

        manifest.sql_blocks.push(SqlBlockRecord {
            field,
            content_hash: content_hash(&cleaned),
            filename,
        });
    }

    if manifest.sql_blocks.is_empty() {
        info!(source = %source.display(), "No SQL content found");
    } else {
        store_manifest(&domain_dir, &manifest)?;
    }
    Ok(manifest)
}

/// Writes every extracted SQL file of `domain_dir` back into its virtual domain.
pub fn rebuild_virtual_domain(domain_dir: &Path) -> Result<RebuildOutcome, RoundTripError> {
    let manifest: VirtualDomainManifest = load_manifest(domain_dir)?;
    let mut document = load_document(&manifest.source_file)?;
    let mut outcome = RebuildOutcome {
        source_file: manifest.source_file.clone(),
        ..RebuildOutcome::default()
    };

    for block in &manifest.sql_blocks {
        let file_path = domain_dir.join(ensure_path_segment(&block.filename)?);
        let Some(sql) = read_optional(&file_path)? else {
            debug!(path = %file_path.display(), "Extracted file missing, leaving field untouched");
            outcome.missing_files += 1;
            continue;
        };
        if set_sql_value(&mut document, block.field, sql) {
            outcome.restored += 1;
        } else {
            warn!(
                field = block.field.json_key(),
                source = %manifest.source_file.display(),
                "Recorded field no longer holds SQL, skipping"
            );
            outcome.stale += 1;
        }
    }

    write_document(&manifest.source_file, &document, VIRTUAL_DOMAIN_INDENT)?;
    info!(
        source = %manifest.source_file.display(),
        restored = outcome.restored,
        missing_files = outcome.missing_files,
        stale = outcome.stale,
        "Rebuilt virtual domain"
    );
    Ok(outcome)
}

/// Compares every extracted SQL file with the live document, ignoring line-ending style.
pub fn check_virtual_domain(domain_dir: &Path) -> Result<SyncReport, RoundTripError> {
    let manifest: VirtualDomainManifest = load_manifest(domain_dir)?;
    let document = load_document(&manifest.source_file)?;

    let mut entries = Vec::with_capacity(manifest.sql_blocks.len());
    for block in &manifest.sql_blocks {
        let file_path = domain_dir.join(ensure_path_segment(&block.filename)?);
        let status = match read_optional(&file_path)? {
            None => SyncStatus::MissingFile,
            Some(file_sql) => {
                let file_sql = normalize_line_endings(&file_sql);
                match sql_value(&document, block.field).map(|sql| normalize_line_endings(&sql)) {
                    None => SyncStatus::Stale {
                        file_hash: content_hash(&file_sql),
                    },
                    Some(current) if current == file_sql => SyncStatus::InSync,
                    Some(current) => SyncStatus::Modified {
                        file_hash: content_hash(&file_sql),
                        document_hash: content_hash(&current),
                    },
                }
            }
        };
        log_status(&file_path, &status);
        entries.push(SyncEntry {
            location: block.field.json_key().to_string(),
            file: file_path,
            status,
        });
    }

    Ok(SyncReport {
        group: manifest.service_name,
        source_file: manifest.source_file,
        entries,
    })
}

/// [`RoundTripper`] for virtual domain documents.
#[derive(Debug, Clone)]
pub struct VirtualDomainRoundTripper {
    output_root: PathBuf,
}

impl VirtualDomainRoundTripper {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
        }
    }
}

impl RoundTripper for VirtualDomainRoundTripper {
    fn kind(&self) -> DocumentKind {
        DocumentKind::VirtualDomain
    }

    fn output_root(&self) -> PathBuf {
        self.output_root.clone()
    }

    fn extract(&self, source: &Path) -> Result<ExtractOutcome, RoundTripError> {
        let manifest = extract_virtual_domain(source, &self.output_root)?;
        Ok(ExtractOutcome {
            kind: DocumentKind::VirtualDomain,
            group_dir: self.output_root.join(&manifest.service_name),
            group: manifest.service_name,
            source_file: manifest.source_file,
            manifest_written: !manifest.sql_blocks.is_empty(),
            entries: manifest
                .sql_blocks
                .into_iter()
                .map(|block| ExtractedEntry {
                    location: block.field.json_key().to_string(),
                    filename: block.filename,
                    content_hash: block.content_hash,
                })
                .collect(),
        })
    }

    fn rebuild(&self, group_dir: &Path) -> Result<RebuildOutcome, RoundTripError> {
        rebuild_virtual_domain(group_dir)
    }

    fn check(&self, group_dir: &Path) -> Result<SyncReport, RoundTripError> {
        check_virtual_domain(group_dir)
    }
}
