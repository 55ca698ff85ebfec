/// `load_config` module: reads the optional YAML config file and layers environment
/// overrides on top of it.
///
/// # Responsibilities
/// - Parse the user-supplied YAML into [`CliConfig`]; every section is optional and falls
///   back to the core defaults
/// - Apply `LITERAL_SYNC_PAGES_DIR` / `LITERAL_SYNC_VIRTUAL_DOMAINS_DIR` over the file
/// - Hand the core a plain [`RoundTripConfig`]
///
/// # Errors
/// All errors use `anyhow::Error` and are surfaced at the CLI boundary. CLI flags are
/// applied afterwards by [`crate::cli`].
use anyhow::Result;
use literal_sync_core::config::{RoundTripConfig, DEFAULT_PAGES_DIR, DEFAULT_VIRTUAL_DOMAINS_DIR};
use literal_sync_core::discover::DEFAULT_PATTERN;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

pub const PAGES_DIR_ENV: &str = "LITERAL_SYNC_PAGES_DIR";
pub const VIRTUAL_DOMAINS_DIR_ENV: &str = "LITERAL_SYNC_VIRTUAL_DOMAINS_DIR";

#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
pub struct CliConfig {
    #[serde(default)]
    pub output: OutputSection,
    #[serde(default)]
    pub discovery: DiscoverySection,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OutputSection {
    pub pages_dir: PathBuf,
    pub virtual_domains_dir: PathBuf,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            pages_dir: PathBuf::from(DEFAULT_PAGES_DIR),
            virtual_domains_dir: PathBuf::from(DEFAULT_VIRTUAL_DOMAINS_DIR),
        }
    }
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DiscoverySection {
    pub root: PathBuf,
    pub pattern: String,
}

impl Default for DiscoverySection {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            pattern: DEFAULT_PATTERN.to_string(),
        }
    }
}

impl CliConfig {
    pub fn round_trip_config(&self) -> RoundTripConfig {
        RoundTripConfig {
            pages_output_dir: self.output.pages_dir.clone(),
            virtual_domains_output_dir: self.output.virtual_domains_dir.clone(),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Some(dir) = env_path(PAGES_DIR_ENV) {
            info!(env = PAGES_DIR_ENV, dir = %dir.display(), "Overriding pages output dir from env");
            self.output.pages_dir = dir;
        }
        if let Some(dir) = env_path(VIRTUAL_DOMAINS_DIR_ENV) {
            info!(
                env = VIRTUAL_DOMAINS_DIR_ENV,
                dir = %dir.display(),
                "Overriding virtual domains output dir from env"
            );
            self.output.virtual_domains_dir = dir;
        }
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
}

/// Loads the config file when one is given, otherwise starts from defaults, then applies
/// environment overrides.
pub fn load_config(path: Option<&Path>) -> Result<CliConfig> {
    let mut config = match path {
        Some(path) => read_config_file(path)?,
        None => {
            info!("No config file given, using defaults");
            CliConfig::default()
        }
    };
    config.apply_env_overrides();
    Ok(config)
}

fn read_config_file(path: &Path) -> Result<CliConfig> {
    info!(config_path = ?path, "Loading configuration from file");

    let config_content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path,
                e
            ));
        }
    };

    // An empty file is a valid "all defaults" config.
    if config_content.trim().is_empty() {
        return Ok(CliConfig::default());
    }

    match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path, "Parsed config YAML successfully");
            Ok(conf)
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path, "Failed to parse config YAML");
            Err(anyhow::anyhow!("Failed to parse config YAML: {e}"))
        }
    }
}
