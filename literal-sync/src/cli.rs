/// # literal-sync CLI Interface (Module)
///
/// Command parsing and orchestration for the `literal-sync` binary. Everything that reads
/// or writes documents lives in [`literal_sync_core`]; this module only resolves settings
/// (flags over env over YAML over defaults), picks the round-trippers to run and prints a
/// summary.
///
/// ## How To Use
/// - For command-line users: `literal-sync --help`.
/// - For programmatic/integration use: call [`run`] with a constructed [`Cli`].
use crate::load_config::{load_config, CliConfig};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use literal_sync_core::config::RoundTripConfig;
use literal_sync_core::contract::{DocumentKind, RoundTripper, SyncStatus};
use literal_sync_core::discover::{detect_kind, discover_documents};
use literal_sync_core::document::load_document;
use literal_sync_core::page::PageRoundTripper;
use literal_sync_core::pipeline::{check_all, extract_all, rebuild_all, RunReport};
use literal_sync_core::virtual_domain::VirtualDomainRoundTripper;
use regex::Regex;
use std::path::PathBuf;
use tracing::{info, warn};

/// CLI for literal-sync: extract, rebuild and check embedded literals.
#[derive(Parser, Debug)]
#[clap(
    name = "literal-sync",
    version,
    about = "Round-trip HTML/CSS/JS literals and SQL blocks between extensibility JSON documents and plain files"
)]
pub struct Cli {
    /// Optional YAML config file
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Pull literals out of source documents into per-document directories
    Extract(ExtractArgs),
    /// Write edited files back into their source documents
    Rebuild(TargetArgs),
    /// Report files that no longer match their source documents
    Check(TargetArgs),
}

/// Flags shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Which document kinds to process
    #[clap(long, value_enum, default_value_t = KindSelection::All)]
    pub kind: KindSelection,

    /// Output directory for the selected kind; requires a single --kind
    #[clap(long)]
    pub output_root: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ExtractArgs {
    #[clap(flatten)]
    pub target: TargetArgs,

    /// Directory to search for documents when no paths are given
    #[clap(long)]
    pub root: Option<PathBuf>,

    /// Regex matched against root-relative paths during discovery
    #[clap(long)]
    pub pattern: Option<String>,

    /// Explicit documents to extract
    pub paths: Vec<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KindSelection {
    Pages,
    VirtualDomains,
    #[default]
    All,
}

impl KindSelection {
    pub fn kinds(self) -> Vec<DocumentKind> {
        match self {
            KindSelection::Pages => vec![DocumentKind::Page],
            KindSelection::VirtualDomains => vec![DocumentKind::VirtualDomain],
            KindSelection::All => vec![DocumentKind::Page, DocumentKind::VirtualDomain],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Extract,
    Rebuild,
    Check,
}

impl Action {
    fn label(self) -> &'static str {
        match self {
            Action::Extract => "extract",
            Action::Rebuild => "rebuild",
            Action::Check => "check",
        }
    }
}

/// Runs one command. Returns `Ok(false)` when any document failed or any check found
/// drift; `Err` is reserved for unusable settings.
pub fn run(cli: Cli) -> Result<bool> {
    tracing::info!("trace_initialised");

    let (action, target, extract) = match cli.command {
        Commands::Extract(args) => (Action::Extract, args.target.clone(), Some(args)),
        Commands::Rebuild(target) => (Action::Rebuild, target, None),
        Commands::Check(target) => (Action::Check, target, None),
    };
    info!(command = action.label(), kind = ?target.kind, "Starting");

    let config = load_config(cli.config.as_deref())?;
    let round_trip = resolve_outputs(&config, &target)?;
    round_trip.trace_loaded();

    let mut success = true;
    let mut sources_by_kind = match &extract {
        Some(args) => extract_sources(&config, args, &mut success)?,
        None => Vec::new(),
    };

    for kind in target.kind.kinds() {
        let tripper = tripper(&round_trip, kind);
        let report = match action {
            Action::Extract => {
                let sources = take_sources(&mut sources_by_kind, kind);
                extract_all(tripper.as_ref(), &sources)
            }
            Action::Rebuild => rebuild_all(tripper.as_ref()),
            Action::Check => check_all(tripper.as_ref()),
        };
        print_summary(action, &report);
        success &= report.is_success();
    }

    if success {
        info!(command = action.label(), "Completed successfully");
    } else {
        warn!(command = action.label(), "Completed with problems");
    }
    Ok(success)
}

/// Output roots from the config, with `--output-root` applied to the selected kind.
fn resolve_outputs(config: &CliConfig, target: &TargetArgs) -> Result<RoundTripConfig> {
    let mut round_trip = config.round_trip_config();
    if let Some(output_root) = &target.output_root {
        match target.kind {
            KindSelection::Pages => round_trip.pages_output_dir = output_root.clone(),
            KindSelection::VirtualDomains => {
                round_trip.virtual_domains_output_dir = output_root.clone()
            }
            KindSelection::All => {
                anyhow::bail!("--output-root needs --kind pages or --kind virtual-domains")
            }
        }
    }
    Ok(round_trip)
}

fn tripper(round_trip: &RoundTripConfig, kind: DocumentKind) -> Box<dyn RoundTripper> {
    let output_root = round_trip.output_root(kind).to_path_buf();
    match kind {
        DocumentKind::Page => Box::new(PageRoundTripper::new(output_root)),
        DocumentKind::VirtualDomain => Box::new(VirtualDomainRoundTripper::new(output_root)),
    }
}

/// Documents to extract, per kind. Explicit paths win over discovery.
fn extract_sources(
    config: &CliConfig,
    args: &ExtractArgs,
    success: &mut bool,
) -> Result<Vec<(DocumentKind, Vec<PathBuf>)>> {
    let kinds = args.target.kind.kinds();
    if args.paths.is_empty() {
        let root = args
            .root
            .clone()
            .unwrap_or_else(|| config.discovery.root.clone());
        let pattern_text = args
            .pattern
            .as_deref()
            .unwrap_or(config.discovery.pattern.as_str());
        let pattern = Regex::new(pattern_text)
            .with_context(|| format!("Invalid discovery pattern {pattern_text:?}"))?;

        return kinds
            .into_iter()
            .map(|kind| -> Result<(DocumentKind, Vec<PathBuf>)> {
                let found = discover_documents(&root, &pattern, kind)
                    .with_context(|| format!("Discovery under {root:?} failed"))?;
                info!(kind = %kind, count = found.len(), "Discovered documents");
                Ok((kind, found))
            })
            .collect();
    }

    if args.root.is_some() || args.pattern.is_some() {
        anyhow::bail!("--root and --pattern only apply when no document paths are given");
    }

    if let [kind] = kinds.as_slice() {
        return Ok(vec![(*kind, args.paths.clone())]);
    }

    // Mixed kinds: sort explicit paths by what they contain.
    let mut pages = Vec::new();
    let mut domains = Vec::new();
    for path in &args.paths {
        match load_document(path).map(|doc| detect_kind(&doc)) {
            Ok(Some(DocumentKind::Page)) => pages.push(path.clone()),
            Ok(Some(DocumentKind::VirtualDomain)) => domains.push(path.clone()),
            Ok(None) => {
                warn!(path = %path.display(), "Not a page or virtual domain document");
                println!("❌ {}: not a page or virtual domain document", path.display());
                *success = false;
            }
            // Unreadable documents go through the page pipeline so the failure is
            // reported like any other.
            Err(_) => pages.push(path.clone()),
        }
    }
    Ok(vec![
        (DocumentKind::Page, pages),
        (DocumentKind::VirtualDomain, domains),
    ])
}

fn take_sources(
    sources_by_kind: &mut Vec<(DocumentKind, Vec<PathBuf>)>,
    kind: DocumentKind,
) -> Vec<PathBuf> {
    sources_by_kind
        .iter_mut()
        .find(|(k, _)| *k == kind)
        .map(|(_, sources)| std::mem::take(sources))
        .unwrap_or_default()
}

fn print_summary(action: Action, report: &RunReport) {
    for outcome in &report.extracted {
        if !outcome.manifest_written {
            println!(
                "✅ {}: no {} content found, nothing extracted",
                outcome.source_file.display(),
                match outcome.kind {
                    DocumentKind::Page => "literal",
                    DocumentKind::VirtualDomain => "SQL",
                }
            );
            continue;
        }
        println!(
            "✅ Extracted {} file(s) from {} into {}",
            outcome.entries.len(),
            outcome.source_file.display(),
            outcome.group_dir.display()
        );
    }
    for outcome in &report.rebuilt {
        println!(
            "✅ Rebuilt {} ({} restored, {} missing, {} stale)",
            outcome.source_file.display(),
            outcome.restored,
            outcome.missing_files,
            outcome.stale
        );
    }
    for sync in &report.checked {
        if sync.is_in_sync() {
            println!("✅ {}: in sync", sync.group);
            continue;
        }
        for entry in sync.out_of_sync() {
            let reason = match &entry.status {
                SyncStatus::Modified { .. } => "modified",
                SyncStatus::MissingFile => "missing file",
                SyncStatus::Stale { .. } => "no longer in document",
                SyncStatus::InSync => "in sync",
            };
            println!(
                "❌ {} [{}] {}: {}",
                sync.group,
                entry.location,
                entry.file.display(),
                reason
            );
        }
    }
    for failure in &report.failures {
        println!("❌ {}: {}", failure.target.display(), failure.error);
    }

    let total = report.extracted.len() + report.rebuilt.len() + report.checked.len();
    println!(
        "{} {} {} {}(s): {} ok, {} failed",
        if report.is_success() { "✅" } else { "❌" },
        action.label(),
        report.kind,
        if action == Action::Extract { "document" } else { "group" },
        total,
        report.failures.len()
    );
}
