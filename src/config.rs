use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::providers::azure_devops::DEFAULT_API_VERSION;
use crate::state::DEFAULT_STATE_FILE;

/// Configuration file structure for ado-ad.
///
/// Holds defaults that would otherwise have to be passed on every run.
/// Command line flags and environment variables take precedence.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Azure DevOps connection
    #[serde(default)]
    pub azure_devops: AzureDevOpsConfig,

    /// State file handling
    #[serde(default)]
    pub state: StateConfig,

    /// Where artifacts go and what gets printed
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AzureDevOpsConfig {
    /// Organization URL (e.g., 'https://dev.azure.com/org')
    pub organization_url: Option<String>,

    /// Project name
    pub project: Option<String>,

    /// Personal access token
    pub token: Option<String>,

    /// REST API version sent with every request
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StateConfig {
    /// Path of the state file
    #[serde(default = "default_state_file")]
    pub file: PathBuf,

    /// Keep a `.bak` copy of the previous state file
    #[serde(default = "default_true")]
    pub backup: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Directory the per-resource folders are created in
    #[serde(default = "default_output_directory")]
    pub directory: PathBuf,

    /// Print the results table after a run
    #[serde(default = "default_true")]
    pub summary: bool,
}

impl Default for AzureDevOpsConfig {
    fn default() -> Self {
        Self {
            organization_url: None,
            project: None,
            token: None,
            api_version: default_api_version(),
        }
    }
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            file: default_state_file(),
            backup: true,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            summary: true,
        }
    }
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

fn default_state_file() -> PathBuf {
    PathBuf::from(DEFAULT_STATE_FILE)
}

fn default_output_directory() -> PathBuf {
    PathBuf::from(".")
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path (must exist)
    /// 2. ./ado-ad.toml
    /// 3. ./ado-ad.json
    /// 4. ./ado-ad.yaml
    /// 5. ./ado-ad.yml
    ///
    /// Returns default configuration if no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        Self::discover(Path::new("."))
    }

    /// Looks for one of the well-known config file names in `dir`.
    fn discover(dir: &Path) -> Result<Self> {
        let candidates = ["ado-ad.toml", "ado-ad.json", "ado-ad.yaml", "ado-ad.yml"];

        for candidate in &candidates {
            let path = dir.join(candidate);
            if path.exists() {
                return Self::load_from_path(&path);
            }
        }

        // No config file found, return defaults
        Ok(Self::default())
    }

    /// Parses `path` according to its extension.
    ///
    /// Only `.toml`, `.json`, `.yaml` and `.yml` are accepted, so a mistyped
    /// `--config` path fails instead of being guessed at.
    fn load_from_path(path: &Path) -> Result<Self> {
        let format = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => "TOML",
            Some("json") => "JSON",
            Some("yaml" | "yml") => "YAML",
            _ => bail!(
                "Unsupported config file {}: expected a .toml, .json, .yaml or .yml file",
                path.display()
            ),
        };

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Result<Self> = match format {
            "TOML" => toml::from_str(&contents).map_err(anyhow::Error::from),
            "JSON" => serde_json::from_str(&contents).map_err(anyhow::Error::from),
            _ => serde_yaml::from_str(&contents).map_err(anyhow::Error::from),
        };

        config.with_context(|| format!("Failed to parse {format} config: {}", path.display()))
    }
}
