use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{AkvError, Result};

/// User-level configuration, loaded from `~/.akv.toml`.
///
/// Every field has a default so akv works out-of-the-box without any
/// config file at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Cache file location. Relative paths are resolved against the home
    /// directory. Defaults to `~/.akv_cache.json`.
    #[serde(default)]
    pub cache_file: Option<PathBuf>,

    /// Azure CLI executable to invoke (default: `az`).
    #[serde(default = "default_az_binary")]
    pub az_binary: String,

    /// Azure subscription passed to every `az` call, if set.
    #[serde(default)]
    pub subscription: Option<String>,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_az_binary() -> String {
    "az".to_string()
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            cache_file: None,
            az_binary: default_az_binary(),
            subscription: None,
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the home directory.
    const FILE_NAME: &'static str = ".akv.toml";

    /// Name of the cache file when `cache_file` is not configured.
    pub const DEFAULT_CACHE_FILE: &'static str = ".akv_cache.json";

    /// Load settings from `<home_dir>/.akv.toml`.
    ///
    /// If the file does not exist, defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(home_dir: &Path) -> Result<Self> {
        let config_path = home_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            AkvError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        Ok(settings)
    }

    /// Build the full path to the cache file.
    ///
    /// Example: `/home/user/.akv_cache.json`
    pub fn cache_path(&self, home_dir: &Path) -> PathBuf {
        match &self.cache_file {
            Some(p) if p.is_absolute() => p.clone(),
            Some(p) => home_dir.join(p),
            None => home_dir.join(Self::DEFAULT_CACHE_FILE),
        }
    }
}

/// Resolve the user's home directory from `HOME` (or `USERPROFILE`).
pub fn home_dir() -> Result<PathBuf> {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map(PathBuf::from)
        .map_err(|_| AkvError::ConfigError("cannot determine home directory".into()))
}

// ── Tests ────────────────────────────────────────────────────────────
