//! On-disk persistence of the cache snapshot.
//!
//! The cache file is the only shared mutable resource. Writes replace the
//! whole file via temp-file + rename, so a concurrent reader sees either the
//! old or the new snapshot, never a partial one. There is no locking: two
//! invocations that load, modify and save at the same time race, and the
//! last writer's snapshot wins.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::snapshot::CacheSnapshot;
use crate::errors::{AkvError, Result};

/// Handle to the cache file.
#[derive(Debug, Clone)]
pub struct CacheStore {
    path: PathBuf,
}

impl CacheStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the path to the cache file on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read the persisted snapshot.
    ///
    /// `Ok(None)` if the file does not exist. Corrupt contents are an
    /// `InvalidCacheFormat` error, never an empty cache.
    pub fn read(&self) -> Result<Option<CacheSnapshot>> {
        let bytes = match fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let snapshot =
            CacheSnapshot::from_json(&bytes).map_err(|reason| AkvError::InvalidCacheFormat {
                path: self.path.clone(),
                reason,
            })?;

        debug!(path = %self.path.display(), vaults = snapshot.len(), "cache loaded");
        Ok(Some(snapshot))
    }

    /// Read the snapshot, degrading to an empty one on any failure.
    ///
    /// Only for callers that are about to overwrite the whole cache.
    pub fn load_or_empty(&self) -> CacheSnapshot {
        match self.read() {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => CacheSnapshot::new(),
            Err(e) => {
                warn!(error = %e, "ignoring unreadable cache before full rewrite");
                CacheSnapshot::new()
            }
        }
    }

    /// Normalize and write `snapshot` to disk atomically.
    pub fn save(&self, snapshot: &CacheSnapshot) -> Result<()> {
        let json = snapshot
            .clone()
            .normalized()
            .to_json_pretty()
            .map_err(|e| AkvError::SerializationError(format!("cache: {e}")))?;

        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        // The temp file lives next to the target so the rename stays on one
        // filesystem. The pid keeps two concurrent writers off the same file.
        let tmp_path = parent.join(format!(
            ".{}.{}.tmp",
            self.path.file_name().unwrap_or_default().to_string_lossy(),
            std::process::id()
        ));

        fs::write(&tmp_path, json.as_bytes())?;
        if let Err(e) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        debug!(path = %self.path.display(), vaults = snapshot.len(), "cache saved");
        Ok(())
    }
}
