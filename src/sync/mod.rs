//! Sync engine — refreshes the cache from the directory service.
//!
//! Three strategies:
//! - **names-only**: one vault listing, every vault recorded with unknown
//!   secrets
//! - **full**: vault listing, then every vault's secret names fetched on a
//!   bounded worker pool; per-vault failures degrade to "unknown"
//! - **single-vault**: one vault's secret names merged into the latest
//!   persisted snapshot
//!
//! Only the full sync is concurrent. Nothing here retries, times out or
//! cancels a directory call.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::cache::{CacheSnapshot, CacheStore};
use crate::client::DirectoryClient;
use crate::errors::{AkvError, Result};

/// Maximum number of `list_secrets` calls in flight during a full sync.
pub const FULL_SYNC_WORKERS: usize = 10;

/// Progress of a full sync, reported once per vault as it finishes.
#[derive(Debug, Clone, Copy)]
pub struct SyncProgress<'a> {
    pub vault: &'a str,
    /// Vaults finished so far, including this one.
    pub completed: usize,
    pub total: usize,
    /// `false` if this vault's fetch failed.
    pub ok: bool,
}

/// A vault whose secrets could not be fetched during a full sync.
#[derive(Debug)]
pub struct VaultFailure {
    pub vault: String,
    pub error: AkvError,
}

/// Outcome of a successful full sync.
#[derive(Debug)]
pub struct FullSyncReport {
    /// The snapshot that was persisted.
    pub snapshot: CacheSnapshot,
    /// Vaults recorded as unknown because their fetch failed.
    pub failures: Vec<VaultFailure>,
    /// Vaults present now but not in the previous cache.
    pub added: Vec<String>,
    /// Vaults in the previous cache that no longer exist.
    pub removed: Vec<String>,
}

/// Orchestrates refreshes between a `DirectoryClient` and a `CacheStore`.
pub struct SyncEngine<'a> {
    client: Arc<dyn DirectoryClient>,
    store: &'a CacheStore,
}

impl<'a> SyncEngine<'a> {
    pub fn new(client: Arc<dyn DirectoryClient>, store: &'a CacheStore) -> Self {
        Self { client, store }
    }

    /// Load the persisted snapshot, running a names-only sync first if no
    /// cache file exists yet.
    pub fn load(&self) -> Result<CacheSnapshot> {
        match self.store.read()? {
            Some(snapshot) => Ok(snapshot),
            None => {
                info!(path = %self.store.path().display(), "cache file not found, updating");
                self.names_only()
            }
        }
    }

    /// Record every vault name with unknown secrets and persist it.
    ///
    /// Fails without writing if the listing fails or comes back empty.
    pub fn names_only(&self) -> Result<CacheSnapshot> {
        let vaults = self.list_vaults()?;
        let snapshot = CacheSnapshot::from_vault_names(vaults);
        self.store.save(&snapshot)?;
        info!(vaults = snapshot.len(), "names-only sync complete");
        Ok(snapshot)
    }

    /// Fetch every vault's secret names and persist the result.
    ///
    /// `on_progress` is called on this thread once per vault, in the order
    /// the fetches complete. Only a failed (or empty) vault listing fails
    /// the whole sync.
    pub fn full(&self, mut on_progress: impl FnMut(SyncProgress<'_>)) -> Result<FullSyncReport> {
        let vaults = self.list_vaults()?;
        let previous = self.store.load_or_empty();
        let total = vaults.len();

        let rt = tokio::runtime::Runtime::new()?;
        let mut snapshot = CacheSnapshot::new();
        let mut failures = Vec::new();

        rt.block_on(async {
            let mut tasks = self.spawn_secret_listings(vaults);
            let mut completed = 0;

            while let Some(joined) = tasks.join_next().await {
                let (vault, result) = joined.map_err(|e| {
                    AkvError::CommandFailed(format!("secret listing task failed: {e}"))
                })?;
                completed += 1;
                on_progress(SyncProgress {
                    vault: &vault,
                    completed,
                    total,
                    ok: result.is_ok(),
                });

                match result {
                    Ok(secrets) => snapshot.insert(vault, Some(secrets)),
                    Err(error) => {
                        warn!(%vault, %error, "could not list secrets, recording as unknown");
                        snapshot.insert(vault.clone(), None);
                        failures.push(VaultFailure { vault, error });
                    }
                }
            }
            Ok::<_, AkvError>(())
        })?;
        failures.sort_by(|a, b| a.vault.cmp(&b.vault));

        let snapshot = snapshot.normalized();
        self.store.save(&snapshot)?;

        let added = snapshot
            .vault_names()
            .filter(|v| !previous.contains_vault(v))
            .map(String::from)
            .collect();
        let removed = previous
            .vault_names()
            .filter(|v| !snapshot.contains_vault(v))
            .map(String::from)
            .collect();

        info!(
            vaults = snapshot.len(),
            failed = failures.len(),
            "full sync complete"
        );
        Ok(FullSyncReport {
            snapshot,
            failures,
            added,
            removed,
        })
    }

    /// Refresh one vault and merge it into the latest persisted snapshot.
    ///
    /// The snapshot is re-read after the fetch so updates saved by other
    /// invocations in the meantime are kept.
    pub fn single_vault(&self, vault: &str) -> Result<CacheSnapshot> {
        let secrets = self.client.list_secrets(vault)?;
        debug!(%vault, secrets = secrets.len(), "fetched secret names");

        let current = self.load()?;
        let merged = current.merge_one(vault, secrets).normalized();
        self.store.save(&merged)?;
        Ok(merged)
    }

    /// One blocking `list_secrets` task per vault. The semaphore keeps at
    /// most `FULL_SYNC_WORKERS` of them running; the rest wait for a permit.
    fn spawn_secret_listings(
        &self,
        vaults: Vec<String>,
    ) -> JoinSet<(String, Result<Vec<String>>)> {
        let permits = Arc::new(Semaphore::new(FULL_SYNC_WORKERS));
        let mut tasks = JoinSet::new();

        for vault in vaults {
            let client = Arc::clone(&self.client);
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                let result = match permits.acquire_owned().await {
                    Ok(permit) => {
                        let name = vault.clone();
                        tokio::task::spawn_blocking(move || {
                            let _permit = permit;
                            client.list_secrets(&name)
                        })
                        .await
                        .unwrap_or_else(|e| {
                            Err(AkvError::Service(format!("secret listing panicked: {e}")))
                        })
                    }
                    Err(e) => Err(AkvError::Service(format!("worker pool closed: {e}"))),
                };
                (vault, result)
            });
        }
        tasks
    }

    /// Sorted, de-duplicated vault names; an empty listing is an error.
    fn list_vaults(&self) -> Result<Vec<String>> {
        debug!(client = self.client.name(), "listing vaults");
        let mut vaults = self.client.list_vaults()?;
        vaults.retain(|v| !v.is_empty());
        vaults.sort();
        vaults.dedup();
        if vaults.is_empty() {
            return Err(AkvError::NoVaults);
        }
        Ok(vaults)
    }
}
