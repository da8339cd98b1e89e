use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur in akv.
#[derive(Debug, Error)]
pub enum AkvError {
    // --- Directory service errors ---
    #[error("Could not reach the vault directory service: {0}")]
    Connectivity(String),

    #[error("Vault directory service rejected the request: {0}")]
    Service(String),

    #[error("Vault '{0}' not found in the directory service")]
    VaultNotFound(String),

    // --- Cache errors ---
    #[error("Invalid cache file {path}: {reason}")]
    InvalidCacheFormat { path: PathBuf, reason: String },

    #[error("No vaults returned by the directory service — cache left untouched")]
    NoVaults,

    // --- Lookup errors ---
    #[error("No cached path matches '{0}'")]
    NoMatch(String),

    #[error("Vault '{0}' is not in the cache (run `akv update` to refresh)")]
    VaultNotCached(String),

    #[error("Secret '{secret}' is not cached for vault '{vault}' (run `akv kv {vault} update`)")]
    SecretNotCached { vault: String, secret: String },

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),
}

impl AkvError {
    /// `true` for the "nothing found" family: informational outcomes that
    /// still exit non-zero, as opposed to operational failures.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NoMatch(_) | Self::VaultNotCached(_) | Self::SecretNotCached { .. }
        )
    }
}

/// Convenience type alias for akv results.
pub type Result<T> = std::result::Result<T, AkvError>;
