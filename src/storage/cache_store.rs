//! Fingerprint cache of the change detector.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, error, info};
use tempfile::NamedTempFile;

use crate::error_handling::types::StorageError;
use crate::storage::types::CacheEntry;

/// Store of per-endpoint cache entries.
///
/// Mutations only touch memory; [`CacheStore::persist`] writes the whole
/// document at once.
pub trait CacheStore: Send + Sync {
    fn get(&self, endpoint_name: &str) -> Option<&CacheEntry>;

    /// Inserts or replaces the entry keyed by `entry.endpoint_name`.
    fn upsert(&mut self, entry: CacheEntry);

    fn entries(&self) -> Vec<&CacheEntry>;

    fn persist(&self) -> Result<(), StorageError>;
}

/// JSON document on disk, replaced atomically on every persist.
pub struct FileCacheStore {
    path: PathBuf,
    entries: BTreeMap<String, CacheEntry>,
}

impl FileCacheStore {
    /// Opens the cache at `path`. A missing file is an empty cache; an
    /// unreadable or malformed one is an error.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            info!("No cache at {}, starting empty", path.display());
            return Ok(Self {
                path,
                entries: BTreeMap::new(),
            });
        }

        let raw = std::fs::read_to_string(&path).map_err(|e| {
            error!("Failed to read cache {}: {}", path.display(), e);
            StorageError::ReadFailed(format!("{}: {}", path.display(), e))
        })?;
        let mut entries: BTreeMap<String, CacheEntry> =
            serde_json::from_str(&raw).map_err(|e| {
                error!("Malformed cache {}: {}", path.display(), e);
                StorageError::Corrupted(format!("{}: {}", path.display(), e))
            })?;
        for (name, entry) in entries.iter_mut() {
            entry.endpoint_name = name.clone();
        }
        info!(
            "Loaded {} cache entr{} from {}",
            entries.len(),
            if entries.len() == 1 { "y" } else { "ies" },
            path.display()
        );
        Ok(Self { path, entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CacheStore for FileCacheStore {
    fn get(&self, endpoint_name: &str) -> Option<&CacheEntry> {
        self.entries.get(endpoint_name)
    }

    fn upsert(&mut self, entry: CacheEntry) {
        self.entries.insert(entry.endpoint_name.clone(), entry);
    }

    fn entries(&self) -> Vec<&CacheEntry> {
        self.entries.values().collect()
    }

    fn persist(&self) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| StorageError::WriteFailed(e.to_string()))?;
        write_atomically(&self.path, json.as_bytes())?;
        debug!(
            "Persisted {} cache entries to {}",
            self.entries.len(),
            self.path.display()
        );
        Ok(())
    }
}

/// Writes `bytes` next to `path` and renames over it, so readers see either
/// the previous document or the new one.
pub(crate) fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(|e| {
        error!("Failed to create directory {}: {}", dir.display(), e);
        StorageError::WriteFailed(format!("{}: {}", dir.display(), e))
    })?;

    let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| {
        error!("Failed to create temporary file in {}: {}", dir.display(), e);
        StorageError::WriteFailed(format!("{}: {}", dir.display(), e))
    })?;
    tmp.write_all(bytes)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| {
            error!("Failed to write {}: {}", tmp.path().display(), e);
            StorageError::WriteFailed(format!("{}: {}", tmp.path().display(), e))
        })?;
    tmp.persist(path).map_err(|e| {
        error!("Failed to replace {}: {}", path.display(), e.error);
        StorageError::WriteFailed(format!("{}: {}", path.display(), e.error))
    })?;
    Ok(())
}
