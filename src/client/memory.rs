//! In-memory directory client for testing.
//!
//! Holds vaults and secret values in memory and can inject failures per
//! vault, or on the vault listing itself. It also records how many
//! `list_secrets` calls were in flight at once so the worker-pool bound can
//! be observed.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};
use std::thread;
use std::time::Duration;

use super::DirectoryClient;
use crate::errors::{AkvError, Result};

/// Failure to inject for a vault (or for the vault listing).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    Connectivity,
    Service,
    VaultNotFound,
}

impl FailureMode {
    fn to_error(self, vault: &str) -> AkvError {
        match self {
            Self::Connectivity => AkvError::Connectivity(format!("{vault}: network unreachable")),
            Self::Service => AkvError::Service(format!("{vault}: forbidden")),
            Self::VaultNotFound => AkvError::VaultNotFound(vault.to_string()),
        }
    }
}

type Vaults = BTreeMap<String, BTreeMap<String, String>>;

/// In-memory `DirectoryClient`.
#[derive(Default)]
pub struct MemoryClient {
    vaults: RwLock<Vaults>,
    failures: RwLock<HashMap<String, FailureMode>>,
    listing_failure: RwLock<Option<FailureMode>>,
    latency: Option<Duration>,
    vault_latency: HashMap<String, Duration>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    list_secrets_calls: AtomicUsize,
}

impl MemoryClient {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a vault with the given `(secret, value)` pairs.
    pub fn with_vault(self, vault: &str, secrets: &[(&str, &str)]) -> Self {
        self.put_vault(vault, secrets);
        self
    }

    /// Sleep this long inside every `list_secrets` call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Sleep this long inside `list_secrets` for `vault` only, overriding
    /// `with_latency`.
    pub fn with_vault_latency(mut self, vault: &str, latency: Duration) -> Self {
        self.vault_latency.insert(vault.to_string(), latency);
        self
    }

    /// Add or replace a vault.
    pub fn put_vault(&self, vault: &str, secrets: &[(&str, &str)]) {
        let entries = secrets
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        self.vaults
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(vault.to_string(), entries);
    }

    /// Remove a vault entirely.
    pub fn remove_vault(&self, vault: &str) {
        self.vaults
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(vault);
    }

    /// Make every call touching `vault` fail with `mode`.
    pub fn fail_vault(&self, vault: &str, mode: FailureMode) {
        self.failures
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(vault.to_string(), mode);
    }

    /// Clear an injected failure.
    pub fn heal_vault(&self, vault: &str) {
        self.failures
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(vault);
    }

    /// Make `list_vaults` fail with `mode` (`None` clears it).
    pub fn fail_listing(&self, mode: Option<FailureMode>) {
        *self
            .listing_failure
            .write()
            .unwrap_or_else(PoisonError::into_inner) = mode;
    }

    /// Highest number of concurrent `list_secrets` calls observed.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Total number of `list_secrets` calls made.
    pub fn list_secrets_calls(&self) -> usize {
        self.list_secrets_calls.load(Ordering::SeqCst)
    }

    fn check(&self, vault: &str) -> Result<()> {
        let failures = self.failures.read().unwrap_or_else(PoisonError::into_inner);
        match failures.get(vault) {
            Some(mode) => Err(mode.to_error(vault)),
            None => Ok(()),
        }
    }

    fn with_vault_entries<T>(
        &self,
        vault: &str,
        f: impl FnOnce(&mut BTreeMap<String, String>) -> Result<T>,
    ) -> Result<T> {
        self.check(vault)?;
        let mut vaults = self.vaults.write().unwrap_or_else(PoisonError::into_inner);
        let entries = vaults
            .get_mut(vault)
            .ok_or_else(|| AkvError::VaultNotFound(vault.to_string()))?;
        f(entries)
    }
}

impl DirectoryClient for MemoryClient {
    fn name(&self) -> &str {
        "memory"
    }

    fn list_vaults(&self) -> Result<Vec<String>> {
        if let Some(mode) = *self
            .listing_failure
            .read()
            .unwrap_or_else(PoisonError::into_inner)
        {
            return Err(mode.to_error("vault listing"));
        }
        let vaults = self.vaults.read().unwrap_or_else(PoisonError::into_inner);
        Ok(vaults.keys().cloned().collect())
    }

    fn list_secrets(&self, vault: &str) -> Result<Vec<String>> {
        self.list_secrets_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(latency) = self.vault_latency.get(vault).copied().or(self.latency) {
            thread::sleep(latency);
        }
        let result = self.with_vault_entries(vault, |entries| Ok(entries.keys().cloned().collect()));

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn get_secret_value(&self, vault: &str, secret: &str) -> Result<String> {
        self.with_vault_entries(vault, |entries| {
            entries
                .get(secret)
                .cloned()
                .ok_or_else(|| AkvError::Service(format!("SecretNotFound: {vault}/{secret}")))
        })
    }

    fn set_secret_value(&self, vault: &str, secret: &str, value: &str) -> Result<()> {
        self.with_vault_entries(vault, |entries| {
            entries.insert(secret.to_string(), value.to_string());
            Ok(())
        })
    }
}
