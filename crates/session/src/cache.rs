//! Best-effort local JSON cache.
//!
//! One file per key under the cache directory. The cache is a fallback for
//! offline starts, never the source of truth: reads and writes never fail
//! to the caller. Problems are logged at `warn` and a failed read looks
//! like a miss.

use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use pdfmate_core::files::FileDescriptor;

use crate::config::CacheConfig;

/// Most recent files remembered by [`LocalCache::push_recent_file`].
pub const MAX_RECENT_FILES: usize = 20;

/// Cache keys. Each maps to `<dir>/<key>.json`.
pub mod keys {
    pub const PROFILE: &str = "profile";
    pub const STATS: &str = "stats";
    pub const RECENT_FILES: &str = "recent_files";
    pub const SETTINGS: &str = "settings";
}

#[derive(Debug, thiserror::Error)]
enum CacheError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// JSON files under one directory.
#[derive(Debug, Clone)]
pub struct LocalCache {
    dir: PathBuf,
}

impl LocalCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.dir.clone())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Value stored under `key`, or `None` if missing or unreadable.
    pub async fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.path(key);
        match read_json(&path).await {
            Ok(value) => Some(value),
            Err(CacheError::Io(e)) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable cache entry");
                None
            }
        }
    }

    /// Replace the value under `key`.
    ///
    /// Written to a temporary file and renamed into place, so a crash
    /// never leaves a half-written entry.
    pub async fn write<T: Serialize>(&self, key: &str, value: &T) {
        let path = self.path(key);
        if let Err(e) = write_json(&self.dir, &path, value).await {
            tracing::warn!(path = %path.display(), error = %e, "Failed to write cache entry");
        }
    }

    pub async fn remove(&self, key: &str) {
        let path = self.path(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to remove cache entry");
            }
        }
    }

    /// Remove every entry, including `*.json.tmp` leftovers of interrupted
    /// writes. Other files in the directory are left alone. An entry that
    /// cannot be removed is logged and skipped; the rest are still removed.
    pub async fn clear(&self) {
        if let Err(e) = clear_dir(&self.dir).await {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!(dir = %self.dir.display(), error = %e, "Failed to clear cache");
            }
        }
    }

    pub async fn recent_files(&self) -> Vec<FileDescriptor> {
        self.read(keys::RECENT_FILES).await.unwrap_or_default()
    }

    /// Put `file` first in the recent list, dropping any older entry with
    /// the same id and anything past [`MAX_RECENT_FILES`].
    pub async fn push_recent_file(&self, file: FileDescriptor) {
        let mut recent = self.recent_files().await;
        recent.retain(|f| f.id != file.id);
        recent.insert(0, file);
        recent.truncate(MAX_RECENT_FILES);
        self.write(keys::RECENT_FILES, &recent).await;
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CacheError> {
    let bytes = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

async fn write_json<T: Serialize>(dir: &Path, path: &Path, value: &T) -> Result<(), CacheError> {
    let bytes = serde_json::to_vec_pretty(value)?;
    tokio::fs::create_dir_all(dir).await?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, &bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

async fn clear_dir(dir: &Path) -> io::Result<()> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !is_cache_file(&path) {
            continue;
        }
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to remove cache entry");
            }
        }
    }
    Ok(())
}

fn is_cache_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(".json") || name.ends_with(".json.tmp"))
}
