//! Search engine — matches queries against the cached vault/secret paths.
//!
//! A snapshot is flattened into one path per secret (`"<vault>/<secret>"`)
//! and one path per vault with no known secrets (`"<vault>/"`). The view is
//! rebuilt for every query and never cached. Searching never calls the
//! directory service; only `fetch_values` does, and its results are never
//! written back.

pub mod pattern;

use std::fmt;

use tracing::debug;

use crate::cache::CacheSnapshot;
use crate::client::DirectoryClient;
use crate::errors::{AkvError, Result};

pub use pattern::Pattern;

/// One flattened path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub vault: String,
    /// `None` for a vault with no known secrets.
    pub secret: Option<String>,
}

impl SearchHit {
    /// The path string patterns are matched against.
    pub fn path(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SearchHit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.vault, self.secret.as_deref().unwrap_or(""))
    }
}

/// A hit plus its live value, for "show" mode.
#[derive(Debug)]
pub struct ValuedHit {
    pub hit: SearchHit,
    /// `None` for vault-only hits; otherwise the fetch outcome for this
    /// one secret.
    pub value: Option<Result<String>>,
}

/// Flatten a snapshot in key order, each vault's secrets in list order.
pub fn flatten(snapshot: &CacheSnapshot) -> Vec<SearchHit> {
    let mut paths = Vec::new();
    for (vault, entry) in snapshot.iter() {
        match entry.as_deref() {
            Some(secrets) if !secrets.is_empty() => {
                paths.extend(secrets.iter().map(|s| SearchHit {
                    vault: vault.to_string(),
                    secret: Some(s.clone()),
                }));
            }
            _ => paths.push(SearchHit {
                vault: vault.to_string(),
                secret: None,
            }),
        }
    }
    paths
}

/// All flattened paths matching `raw_pattern`, in flatten order.
///
/// Zero matches is `AkvError::NoMatch`; the caller decides how loud that is.
pub fn search(snapshot: &CacheSnapshot, raw_pattern: &str) -> Result<Vec<SearchHit>> {
    let pattern = Pattern::parse(raw_pattern)?;
    let hits: Vec<SearchHit> = flatten(snapshot)
        .into_iter()
        .filter(|hit| pattern.matches(&hit.path()))
        .collect();

    debug!(pattern = raw_pattern, hits = hits.len(), "search");
    if hits.is_empty() {
        return Err(AkvError::NoMatch(raw_pattern.to_string()));
    }
    Ok(hits)
}

/// Fetch the live value of every hit that names a secret.
///
/// Calls are sequential. A failure is attached to its own hit and the
/// remaining hits are still fetched.
pub fn fetch_values(client: &dyn DirectoryClient, hits: Vec<SearchHit>) -> Vec<ValuedHit> {
    hits.into_iter()
        .map(|hit| {
            let value = hit
                .secret
                .as_deref()
                .map(|secret| client.get_secret_value(&hit.vault, secret));
            ValuedHit { hit, value }
        })
        .collect()
}
