use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CANDIDATES: [&str; 4] = ["circle.toml", "circle.json", "circle.yaml", "circle.yml"];

/// Settings file structure for the `circle` tool.
///
/// Everything is optional; a repository without a settings file behaves
/// exactly like one with an empty file. Tokens are deliberately not part of
/// this file, they live in the repository's git config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Remote build service settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Watch loop settings
    #[serde(default)]
    pub watch: WatchConfig,

    /// Overview table settings
    #[serde(default)]
    pub overview: OverviewConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ApiConfig {
    /// CircleCI REST API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// VCS segment used in project paths
    #[serde(default = "default_vcs_type")]
    pub vcs_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WatchConfig {
    /// Seconds between refreshes
    #[serde(default = "default_poll")]
    pub poll: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OverviewConfig {
    /// Number of recent builds listed
    #[serde(default = "default_overview_limit")]
    pub limit: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            vcs_type: default_vcs_type(),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll: default_poll(),
        }
    }
}

impl Default for OverviewConfig {
    fn default() -> Self {
        Self {
            limit: default_overview_limit(),
        }
    }
}

fn default_base_url() -> String {
    "https://circleci.com/api/v1.1/".to_string()
}

fn default_vcs_type() -> String {
    "github".to_string()
}

fn default_poll() -> u64 {
    5
}

fn default_overview_limit() -> usize {
    30
}

impl Config {
    /// Load settings.
    ///
    /// Searches in this order:
    /// 1. Specified path (must exist)
    /// 2. `circle.{toml,json,yaml,yml}` in the repository directory
    /// 3. `circle/config.toml` in the user's config directory
    ///
    /// Returns default settings if no file is found.
    pub fn load(path: Option<&Path>, repo_dir: &Path) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        for path in Self::candidate_paths(repo_dir) {
            if path.exists() {
                return Self::load_from_path(&path);
            }
        }

        debug!("No settings file found, using defaults");
        Ok(Self::default())
    }

    fn candidate_paths(repo_dir: &Path) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = CANDIDATES.iter().map(|c| repo_dir.join(c)).collect();
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("circle").join("config.toml"));
        }
        paths
    }

    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        debug!("Loading settings from {}", path.display());

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display())),
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            _ => toml::from_str(&contents)
                .or_else(|_| serde_json::from_str(&contents))
                .or_else(|_| serde_yaml::from_str(&contents))
                .with_context(|| format!("Failed to parse config file: {}", path.display())),
        }
    }
}
