//! Page documents: a component tree under `modelView.components` whose `literal`
//! components carry HTML, CSS or JavaScript in their `value`.
//!
//! Literals are addressed by [`ComponentPath`], the chain of sibling indices from the
//! top-level component list down to the literal. Names are only used to pick a file name;
//! they may repeat across nesting levels and are never used to join files back.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, error, info, warn};

use crate::content::{content_hash, ensure_path_segment, is_blank};
use crate::contract::{
    DocumentKind, ExtractOutcome, ExtractedEntry, RebuildOutcome, RoundTripError, RoundTripper,
    log_status, SyncEntry, SyncReport, SyncStatus,
};
use crate::document::{
    ensure_dir, file_stem, load_document, read_optional, write_document, write_text, PAGE_INDENT,
};
use crate::manifest::{
    ensure_group_available, load_manifest, store_manifest, LiteralRecord, PageManifest,
};

const GROUP_FIELD: &str = "constantName";
const MODEL_VIEW: &str = "modelView";
const COMPONENTS: &str = "components";

/// The component `type` vocabulary the tool knows about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentKind {
    Literal,
    Block,
    Resource,
    Data,
    Select,
    Input,
    Button,
    /// A `type` outside the known vocabulary.
    Unrecognized(String),
    /// No `type` field at all.
    Untyped,
}

impl From<Option<&str>> for ComponentKind {
    fn from(tag: Option<&str>) -> Self {
        match tag {
            Some("literal") => ComponentKind::Literal,
            Some("block") => ComponentKind::Block,
            Some("resource") => ComponentKind::Resource,
            Some("data") => ComponentKind::Data,
            Some("select") => ComponentKind::Select,
            Some("input") => ComponentKind::Input,
            Some("button") => ComponentKind::Button,
            Some(other) => ComponentKind::Unrecognized(other.to_string()),
            None => ComponentKind::Untyped,
        }
    }
}

/// Positional address of a component: `"2"`, `"0.components.1"`, ...
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ComponentPath(Vec<usize>);

impl ComponentPath {
    pub fn root(index: usize) -> Self {
        ComponentPath(vec![index])
    }

    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        ComponentPath(indices)
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    /// Index of the component within its own sibling list.
    pub fn last(&self) -> usize {
        self.0.last().copied().unwrap_or_default()
    }

    /// JSON pointer to the component inside the page document.
    pub fn pointer(&self) -> String {
        let mut pointer = format!("/{MODEL_VIEW}");
        for index in &self.0 {
            pointer.push('/');
            pointer.push_str(COMPONENTS);
            pointer.push('/');
            pointer.push_str(&index.to_string());
        }
        pointer
    }
}

impl fmt::Display for ComponentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (depth, index) in self.0.iter().enumerate() {
            if depth > 0 {
                write!(f, ".{COMPONENTS}.")?;
            }
            write!(f, "{index}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid component path: {0:?}")]
pub struct ComponentPathError(String);

impl FromStr for ComponentPath {
    type Err = ComponentPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ComponentPathError(s.to_string());
        let mut parts = s.split('.');
        let first = parts.next().ok_or_else(invalid)?;
        let mut indices = vec![first.parse().map_err(|_| invalid())?];
        while let Some(marker) = parts.next() {
            if marker != COMPONENTS {
                return Err(invalid());
            }
            let index = parts.next().ok_or_else(invalid)?;
            indices.push(index.parse().map_err(|_| invalid())?);
        }
        Ok(ComponentPath(indices))
    }
}

impl TryFrom<String> for ComponentPath {
    type Error = ComponentPathError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ComponentPath> for String {
    fn from(path: ComponentPath) -> Self {
        path.to_string()
    }
}

/// What a literal's text looks like, which decides its file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralFlavor {
    Script,
    Stylesheet,
    Markup,
}

impl LiteralFlavor {
    pub fn extension(self) -> &'static str {
        match self {
            LiteralFlavor::Script => ".js",
            LiteralFlavor::Stylesheet => ".css",
            LiteralFlavor::Markup => ".html",
        }
    }
}

const SCRIPT_NAME_HINTS: [&str; 3] = ["js", "script", "function"];
const STYLE_NAME_HINTS: [&str; 2] = ["css", "style"];

/// Script wins over stylesheet, stylesheet over markup.
pub fn classify(content: &str, name: &str) -> LiteralFlavor {
    let content = content.to_lowercase();
    let name = name.to_lowercase();

    if content.contains("<script")
        || content.contains("javascript")
        || SCRIPT_NAME_HINTS.iter().any(|hint| name.contains(hint))
    {
        return LiteralFlavor::Script;
    }
    if content.contains("<style") || STYLE_NAME_HINTS.iter().any(|hint| name.contains(hint)) {
        return LiteralFlavor::Stylesheet;
    }
    LiteralFlavor::Markup
}

/// One component found while walking the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedComponent {
    pub path: ComponentPath,
    pub kind: ComponentKind,
    pub name: Option<String>,
    /// The `value` field when it is a string.
    pub value: Option<String>,
}

/// Depth-first, pre-order walk of every component in the page.
pub fn scan(document: &Value) -> Vec<ScannedComponent> {
    let mut found = Vec::new();
    if let Some(components) = document
        .get(MODEL_VIEW)
        .and_then(|view| view.get(COMPONENTS))
        .and_then(Value::as_array)
    {
        scan_components(components, None, &mut found);
    }
    found
}

fn scan_components(
    components: &[Value],
    parent: Option<&ComponentPath>,
    found: &mut Vec<ScannedComponent>,
) {
    for (index, component) in components.iter().enumerate() {
        let path = match parent {
            Some(parent) => parent.child(index),
            None => ComponentPath::root(index),
        };
        let Some(fields) = component.as_object() else {
            debug!(path = %path, "Skipping non-object component");
            continue;
        };
        found.push(ScannedComponent {
            path: path.clone(),
            kind: ComponentKind::from(fields.get("type").and_then(Value::as_str)),
            name: fields.get("name").and_then(Value::as_str).map(str::to_owned),
            value: fields.get("value").and_then(Value::as_str).map(str::to_owned),
        });
        if let Some(children) = fields.get(COMPONENTS).and_then(Value::as_array) {
            scan_components(children, Some(&path), found);
        }
    }
}

fn literal_fields<'a>(document: &'a Value, path: &ComponentPath) -> Option<&'a Map<String, Value>> {
    let fields = document.pointer(&path.pointer())?.as_object()?;
    let kind = ComponentKind::from(fields.get("type").and_then(Value::as_str));
    (kind == ComponentKind::Literal).then_some(fields)
}

/// Current payload of the literal at `path`, or `None` when the path no longer
/// addresses a literal. A literal without a `value` reads as empty.
pub fn literal_value(document: &Value, path: &ComponentPath) -> Option<String> {
    let fields = literal_fields(document, path)?;
    match fields.get("value") {
        None | Some(Value::Null) => Some(String::new()),
        Some(Value::String(value)) => Some(value.clone()),
        Some(_) => None,
    }
}

/// Replaces the payload of the literal at `path`. Returns false, leaving the document
/// untouched, whenever [`literal_value`] would report the position as stale.
pub fn set_literal_value(document: &mut Value, path: &ComponentPath, content: String) -> bool {
    if literal_value(document, path).is_none() {
        return false;
    }
    match document
        .pointer_mut(&path.pointer())
        .and_then(Value::as_object_mut)
    {
        Some(fields) => {
            fields.insert("value".to_string(), Value::String(content));
            true
        }
        None => false,
    }
}

/// True when the document has a `constantName` and a `modelView`.
pub fn looks_like_page(document: &Value) -> bool {
    document.get(GROUP_FIELD).is_some() && document.get(MODEL_VIEW).is_some()
}

/// Grouping key: `constantName`, falling back to the file stem.
pub fn resolve_page_name(document: &Value, source: &Path) -> String {
    document
        .get(GROUP_FIELD)
        .and_then(Value::as_str)
        .map(str::to_owned)
        .unwrap_or_else(|| file_stem(source))
}

/// A literal that will be written by an extraction.
struct PlannedLiteral {
    path: ComponentPath,
    name: String,
    filename: String,
    content: String,
}

/// Picks the literals of `document` worth extracting, with their file names.
///
/// Fails before anything touches the disk when a file name is unsafe or two literals
/// would end up in the same file.
fn plan_literals(document: &Value, page_name: &str) -> Result<Vec<PlannedLiteral>, RoundTripError> {
    let mut planned = Vec::new();
    let mut unrecognized = 0usize;

    for component in scan(document) {
        match &component.kind {
            ComponentKind::Literal => {}
            ComponentKind::Unrecognized(tag) => {
                debug!(path = %component.path, tag = %tag, "Unrecognized component type");
                unrecognized += 1;
                continue;
            }
            ComponentKind::Block
            | ComponentKind::Resource
            | ComponentKind::Data
            | ComponentKind::Select
            | ComponentKind::Input
            | ComponentKind::Button
            | ComponentKind::Untyped => continue,
        }

        let name = component
            .name
            .clone()
            .unwrap_or_else(|| format!("unnamed_{}", component.path.last()));
        let content = component.value.unwrap_or_default();
        if is_blank(&content) {
            debug!(path = %component.path, name = %name, "Skipping blank literal");
            continue;
        }

        let filename = format!("{name}{}", classify(&content, &name).extension());
        ensure_path_segment(&filename)?;
        planned.push(PlannedLiteral {
            path: component.path,
            name,
            filename,
            content,
        });
    }

    if unrecognized > 0 {
        info!(page = %page_name, count = unrecognized, "Page contains unrecognized component types");
    }

    let mut by_filename: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for literal in &planned {
        by_filename
            .entry(literal.filename.as_str())
            .or_default()
            .push(literal.path.to_string());
    }
    if let Some((filename, locations)) = by_filename.into_iter().find(|(_, l)| l.len() > 1) {
        error!(
            page = %page_name,
            filename = %filename,
            locations = ?locations,
            "Several literals resolve to the same file name"
        );
        return Err(RoundTripError::DuplicateFilename {
            group: page_name.to_string(),
            filename: filename.to_string(),
            locations,
        });
    }
    Ok(planned)
}

/// Extracts every non-blank literal of the page at `source` into `<output_root>/<page_name>/`.
pub fn extract_page(source: &Path, output_root: &Path) -> Result<PageManifest, RoundTripError> {
    let document = load_document(source)?;
    let page_name = resolve_page_name(&document, source);
    ensure_path_segment(&page_name)?;
    let page_dir = output_root.join(&page_name);
    ensure_group_available(&page_name, &page_dir, source)?;
    let planned = plan_literals(&document, &page_name)?;
    ensure_dir(&page_dir)?;

    info!(source = %source.display(), page = %page_name, "Extracting page literals");

    let mut manifest = PageManifest {
        source_file: source.to_path_buf(),
        page_name: page_name.clone(),
        literals: Vec::with_capacity(planned.len()),
    };
    for literal in planned {
        let file_path = page_dir.join(&literal.filename);
        write_text(&file_path, &literal.content)?;
        info!(path = %file_path.display(), "Extracted literal");

        manifest.literals.push(LiteralRecord {
            component_path: literal.path,
            name: literal.name,
            filename: literal.filename,
            content_hash: content_hash(&literal.content),
        });
    }

    store_manifest(&page_dir, &manifest)?;
    Ok(manifest)
}

/// Writes the current content of every extracted file back into the page recorded in
/// `page_dir`'s manifest, then rewrites that page in full.
pub fn rebuild_page(page_dir: &Path) -> Result<RebuildOutcome, RoundTripError> {
    let manifest: PageManifest = load_manifest(page_dir)?;
    let mut document = load_document(&manifest.source_file)?;
    let mut outcome = RebuildOutcome {
        source_file: manifest.source_file.clone(),
        ..RebuildOutcome::default()
    };

    for record in &manifest.literals {
        let file_path = page_dir.join(ensure_path_segment(&record.filename)?);
        let Some(content) = read_optional(&file_path)? else {
            debug!(path = %file_path.display(), "Extracted file missing, leaving literal untouched");
            outcome.missing_files += 1;
            continue;
        };
        if set_literal_value(&mut document, &record.component_path, content) {
            outcome.restored += 1;
        } else {
            warn!(
                path = %record.component_path,
                source = %manifest.source_file.display(),
                "Recorded component is no longer a literal, skipping"
            );
            outcome.stale += 1;
        }
    }

    write_document(&manifest.source_file, &document, PAGE_INDENT)?;
    info!(
        source = %manifest.source_file.display(),
        restored = outcome.restored,
        missing_files = outcome.missing_files,
        stale = outcome.stale,
        "Rebuilt page"
    );
    Ok(outcome)
}

/// Compares every extracted file of `page_dir` with the live page, verbatim.
pub fn check_page(page_dir: &Path) -> Result<SyncReport, RoundTripError> {
    let manifest: PageManifest = load_manifest(page_dir)?;
    let document = load_document(&manifest.source_file)?;

    let mut entries = Vec::with_capacity(manifest.literals.len());
    for record in &manifest.literals {
        let file_path = page_dir.join(ensure_path_segment(&record.filename)?);
        let status = match read_optional(&file_path)? {
            None => SyncStatus::MissingFile,
            Some(file_content) => match literal_value(&document, &record.component_path) {
                None => SyncStatus::Stale {
                    file_hash: content_hash(&file_content),
                },
                Some(current) if current == file_content => SyncStatus::InSync,
                Some(current) => SyncStatus::Modified {
                    file_hash: content_hash(&file_content),
                    document_hash: content_hash(&current),
                },
            },
        };
        log_status(&file_path, &status);
        entries.push(SyncEntry {
            location: record.component_path.to_string(),
            file: file_path,
            status,
        });
    }

    Ok(SyncReport {
        group: manifest.page_name,
        source_file: manifest.source_file,
        entries,
    })
}

/// [`RoundTripper`] for page documents.
#[derive(Debug, Clone)]
pub struct PageRoundTripper {
    output_root: PathBuf,
}

impl PageRoundTripper {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
        }
    }
}

impl RoundTripper for PageRoundTripper {
    fn kind(&self) -> DocumentKind {
        DocumentKind::Page
    }

    fn output_root(&self) -> PathBuf {
        self.output_root.clone()
    }

    fn extract(&self, source: &Path) -> Result<ExtractOutcome, RoundTripError> {
        let manifest = extract_page(source, &self.output_root)?;
        Ok(ExtractOutcome {
            kind: DocumentKind::Page,
            group_dir: self.output_root.join(&manifest.page_name),
            group: manifest.page_name,
            source_file: manifest.source_file,
            entries: manifest
                .literals
                .into_iter()
                .map(|record| ExtractedEntry {
                    location: record.component_path.to_string(),
                    filename: record.filename,
                    content_hash: record.content_hash,
                })
                .collect(),
            manifest_written: true,
        })
    }

    fn rebuild(&self, group_dir: &Path) -> Result<RebuildOutcome, RoundTripError> {
        rebuild_page(group_dir)
    }

    fn check(&self, group_dir: &Path) -> Result<SyncReport, RoundTripError> {
        check_page(group_dir)
    }
}
