//! Directory client — the boundary to the remote vault directory service.
//!
//! This module provides:
//! - The `DirectoryClient` capability trait (four round-trip operations)
//! - `AzCliClient`, which shells out to the Azure CLI (`az`)
//! - `MemoryClient`, an in-memory directory for tests and local demos

pub mod az;
pub mod memory;

pub use az::AzCliClient;
pub use memory::{FailureMode, MemoryClient};

use crate::errors::Result;

/// Operations the sync and search engines need from the directory service.
///
/// Every call is a single blocking round trip that may fail with
/// `AkvError::Connectivity`, `AkvError::Service` or `AkvError::VaultNotFound`.
/// Implementations handle their own authentication; callers never retry.
pub trait DirectoryClient: Send + Sync {
    /// Short name used in log lines (e.g. "az", "memory").
    fn name(&self) -> &str;

    /// List the names of every vault visible to the caller.
    fn list_vaults(&self) -> Result<Vec<String>>;

    /// List the secret names stored in `vault`.
    fn list_secrets(&self, vault: &str) -> Result<Vec<String>>;

    /// Fetch the current value of a secret. Never cached.
    fn get_secret_value(&self, vault: &str, secret: &str) -> Result<String>;

    /// Create or overwrite a secret value.
    fn set_secret_value(&self, vault: &str, secret: &str, value: &str) -> Result<()>;
}
