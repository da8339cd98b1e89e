//! CLI module — Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use crate::cache::CacheStore;
use crate::client::{AzCliClient, DirectoryClient};
use crate::config::{home_dir, Settings};
use crate::errors::Result;
use crate::sync::SyncEngine;

/// Every top-level command, as printed by `--list_commands`.
pub const COMMAND_INVENTORY: &[&str] = &[
    "update",
    "sync",
    "update_all",
    "kv",
    "search",
    "ls",
    "completions",
];

/// akv CLI: Azure Key Vault with a local name cache.
#[derive(Parser)]
#[command(
    name = "akv",
    about = "Azure Key Vault CLI with a local cache of vault and secret names",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Print cached vault names, one per line (for shell completion)
    #[arg(long)]
    pub complete: bool,

    /// Print every available command, one per line
    #[arg(long = "list_commands")]
    pub list_commands: bool,

    /// Cache file (default: ~/.akv_cache.json, or `cache_file` in ~/.akv.toml)
    #[arg(long, env = "AKV_CACHE_FILE", global = true)]
    pub cache_file: Option<PathBuf>,

    /// Log directory calls and sync steps to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Refresh the cached vault names (secrets are left unfetched)
    #[command(visible_alias = "sync")]
    Update,

    /// Refresh vault names and every vault's secret names
    #[command(name = "update_all")]
    UpdateAll,

    /// Work with one vault (default action: ls)
    Kv {
        /// Vault name
        vault: String,

        #[command(subcommand)]
        action: Option<KvAction>,
    },

    /// Search cached `vault/secret` paths by prefix or `*` wildcard
    Search {
        /// Prefix (e.g. `kv-prod/db`) or wildcard pattern (e.g. `kv-*/api-*`)
        pattern: String,

        /// `show` also fetches each matched secret's live value
        #[arg(value_enum)]
        mode: Option<SearchMode>,
    },

    /// List cached vaults
    Ls,

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell)
        shell: String,
    },
}

/// Actions on a single vault.
#[derive(clap::Subcommand)]
pub enum KvAction {
    /// List the vault's cached secret names
    Ls,

    /// Print live secret values (one secret, or every cached secret)
    Show {
        /// Secret name
        secret: Option<String>,
    },

    /// Refresh this vault's secret names in the cache
    Update,

    /// Create a new secret, then refresh the vault's cache entry
    Add {
        /// Secret name
        secret: String,
        /// Secret value
        value: String,
    },

    /// Overwrite an existing secret, then refresh the vault's cache entry
    Edit {
        /// Secret name
        secret: String,
        /// Secret value
        value: String,
    },
}

/// Optional search modes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum SearchMode {
    /// Fetch and print the live value of every matched secret
    Show,
}

// ---------------------------------------------------------------------------
// Shared state used by every command
// ---------------------------------------------------------------------------

/// What a command needs: where the cache lives and how to reach the
/// directory service.
pub struct Context {
    pub store: CacheStore,
    pub client: Arc<dyn DirectoryClient>,
}

impl Context {
    pub fn new(store: CacheStore, client: Arc<dyn DirectoryClient>) -> Self {
        Self { store, client }
    }

    /// Build the context from CLI flags and `~/.akv.toml`.
    ///
    /// `--cache-file` / `AKV_CACHE_FILE` wins over the settings file.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let home = home_dir()?;
        let settings = Settings::load(&home)?;
        let cache_path = match &cli.cache_file {
            Some(path) => path.clone(),
            None => settings.cache_path(&home),
        };

        Ok(Self::new(
            CacheStore::new(cache_path),
            Arc::new(AzCliClient::from_settings(&settings)),
        ))
    }

    pub fn client(&self) -> &dyn DirectoryClient {
        self.client.as_ref()
    }

    /// A sync engine over this context's client and cache.
    pub fn engine(&self) -> SyncEngine<'_> {
        SyncEngine::new(Arc::clone(&self.client), &self.store)
    }
}
