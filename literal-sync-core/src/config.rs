use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::contract::DocumentKind;

pub const DEFAULT_PAGES_DIR: &str = "extracted_literals";
pub const DEFAULT_VIRTUAL_DOMAINS_DIR: &str = "extracted_virtual_domains";

/// Where each document kind keeps its group directories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundTripConfig {
    pub pages_output_dir: PathBuf,
    pub virtual_domains_output_dir: PathBuf,
}

impl Default for RoundTripConfig {
    fn default() -> Self {
        Self {
            pages_output_dir: PathBuf::from(DEFAULT_PAGES_DIR),
            virtual_domains_output_dir: PathBuf::from(DEFAULT_VIRTUAL_DOMAINS_DIR),
        }
    }
}

impl RoundTripConfig {
    pub fn output_root(&self, kind: DocumentKind) -> &Path {
        match kind {
            DocumentKind::Page => &self.pages_output_dir,
            DocumentKind::VirtualDomain => &self.virtual_domains_output_dir,
        }
    }

    pub fn trace_loaded(&self) {
        info!(
            pages_output_dir = %self.pages_output_dir.display(),
            virtual_domains_output_dir = %self.virtual_domains_output_dir.display(),
            "Loaded RoundTripConfig"
        );
        debug!(?self, "RoundTripConfig loaded (full debug)");
    }
}
