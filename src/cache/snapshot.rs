//! `CacheSnapshot` — the vault -> secret-name mirror and its JSON form.
//!
//! On disk the cache is one JSON object:
//!
//! ```text
//! {
//!   "kv-prod": ["db-password", "api-key"],
//!   "kv-empty": [],
//!   "kv-unfetched": null
//! }
//! ```
//!
//! `null` means the vault is known but its secrets were never fetched; `[]`
//! means it was fetched and holds nothing. Early versions of the cache were
//! a bare array of vault names; those are upgraded on read.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Secrets recorded for one vault. `None` = not fetched yet.
pub type VaultEntry = Option<Vec<String>>;

/// The local mirror of vault and secret names at one point in time.
///
/// Vault keys iterate in lexicographic order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CacheSnapshot {
    vaults: BTreeMap<String, VaultEntry>,
}

/// Every shape the cache file has ever had.
#[derive(Deserialize)]
#[serde(untagged)]
enum CacheDocument {
    Mapping(BTreeMap<String, VaultEntry>),
    Legacy(Vec<String>),
}

impl CacheSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot with every vault known and no secrets fetched.
    pub fn from_vault_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let vaults = names.into_iter().map(|n| (n.into(), None)).collect();
        Self { vaults }.normalized()
    }

    /// Set (or add) one vault's entry.
    pub fn insert(&mut self, vault: impl Into<String>, entry: VaultEntry) {
        self.vaults.insert(vault.into(), entry);
    }

    /// A copy of this snapshot where only `vault`'s entry is replaced by
    /// `secrets`. Every other entry is carried over untouched.
    pub fn merge_one(&self, vault: &str, secrets: Vec<String>) -> Self {
        let mut merged = self.clone();
        merged.vaults.insert(vault.to_string(), Some(secrets));
        merged
    }

    /// The entry for `vault`, or `None` if the vault is not cached.
    pub fn entry(&self, vault: &str) -> Option<&VaultEntry> {
        self.vaults.get(vault)
    }

    pub fn contains_vault(&self, vault: &str) -> bool {
        self.vaults.contains_key(vault)
    }

    /// Iterate `(vault, entry)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &VaultEntry)> {
        self.vaults.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn vault_names(&self) -> impl Iterator<Item = &str> {
        self.vaults.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.vaults.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vaults.is_empty()
    }

    /// Canonical form: no empty names, each secret list sorted and
    /// de-duplicated.
    pub fn normalized(mut self) -> Self {
        self.vaults.retain(|name, _| !name.is_empty());
        for secrets in self.vaults.values_mut().flatten() {
            secrets.retain(|s| !s.is_empty());
            secrets.sort();
            secrets.dedup();
        }
        self
    }

    /// Parse a cache document, upgrading the legacy bare-list form.
    ///
    /// Returns a one-line reason on failure.
    pub fn from_json(bytes: &[u8]) -> std::result::Result<Self, String> {
        let value: serde_json::Value = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
        let doc = CacheDocument::deserialize(value).map_err(|_| {
            "expected an object mapping vault names to null or a list of secret names".to_string()
        })?;

        let snapshot = match doc {
            CacheDocument::Mapping(vaults) => Self { vaults },
            CacheDocument::Legacy(names) => Self::from_vault_names(names),
        };
        Ok(snapshot.normalized())
    }

    /// Pretty-printed JSON with a trailing newline. Stable for equal input.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        let mut out = serde_json::to_string_pretty(self)?;
        out.push('\n');
        Ok(out)
    }
}
