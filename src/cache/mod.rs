// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Persistent description cache keyed by file path
//!
//! The whole cache lives in memory and is mirrored to a single JSON array on
//! disk. Every mutation, including a hit, rewrites the file as a full snapshot
//! via temp file + rename. All access goes through one mutex, so concurrent
//! tasks on a multi-threaded runtime never interleave a load-mutate-save cycle.

use chrono::Utc;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

use crate::content::{write_atomic, ContentDescription};
use crate::{ArgusError, Result};

/// Description cache (thread-safe wrapper)
#[derive(Clone)]
pub struct CacheStore {
    inner: Arc<Mutex<CacheInner>>,
}

struct CacheInner {
    path: PathBuf,
    entries: BTreeMap<String, ContentDescription>,
}

/// Aggregate numbers for the `cache stats` command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub images: usize,
    pub audio: usize,
    pub text: usize,
    pub total_uses: u64,
}

impl CacheStore {
    /// Open the cache file, or start empty if it does not exist yet
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let entries = if path.exists() {
            let data = std::fs::read(&path)?;
            let records: Vec<ContentDescription> = serde_json::from_slice(&data).map_err(|e| {
                ArgusError::Cache(format!("Failed to parse cache file {:?}: {}", path, e))
            })?;
            records
                .into_iter()
                .map(|record| (record.file_path.clone(), record))
                .collect()
        } else {
            BTreeMap::new()
        };

        info!("Description cache loaded: {} entries from {:?}", entries.len(), path);

        Ok(Self {
            inner: Arc::new(Mutex::new(CacheInner { path, entries })),
        })
    }

    fn lock_inner(&self) -> Result<MutexGuard<'_, CacheInner>> {
        self.inner
            .lock()
            .map_err(|_| ArgusError::Cache("Cache lock poisoned".to_string()))
    }

    /// Look up a path. A hit bumps `use_count` and `last_used` and persists.
    pub fn get(&self, file_path: &str) -> Result<Option<ContentDescription>> {
        let mut inner = self.lock_inner()?;

        let previous = match inner.entries.get(file_path) {
            Some(record) => record.clone(),
            None => return Ok(None),
        };

        let mut updated = previous.clone();
        updated.use_count += 1;
        updated.last_used = Utc::now();
        inner.entries.insert(file_path.to_string(), updated.clone());

        if let Err(e) = inner.persist() {
            inner.entries.insert(file_path.to_string(), previous);
            return Err(e);
        }

        debug!("Cache hit for {} (used {} times)", file_path, updated.use_count);
        Ok(Some(updated))
    }

    /// Read a record without counting it as a use
    pub fn peek(&self, file_path: &str) -> Result<Option<ContentDescription>> {
        Ok(self.lock_inner()?.entries.get(file_path).cloned())
    }

    /// Insert or replace the record for `description.file_path`
    pub fn put(&self, description: ContentDescription) -> Result<()> {
        let mut inner = self.lock_inner()?;
        let key = description.file_path.clone();
        let previous = inner.entries.insert(key.clone(), description);

        if let Err(e) = inner.persist() {
            match previous {
                Some(record) => inner.entries.insert(key, record),
                None => inner.entries.remove(&key),
            };
            return Err(e);
        }

        debug!("Cached description for {}", key);
        Ok(())
    }

    /// Remove one record; returns whether it existed
    pub fn remove(&self, file_path: &str) -> Result<bool> {
        let mut inner = self.lock_inner()?;
        let removed = match inner.entries.remove(file_path) {
            Some(record) => record,
            None => return Ok(false),
        };

        if let Err(e) = inner.persist() {
            inner.entries.insert(file_path.to_string(), removed);
            return Err(e);
        }
        Ok(true)
    }

    /// Drop every record
    pub fn clear(&self) -> Result<()> {
        let mut inner = self.lock_inner()?;
        let previous = std::mem::take(&mut inner.entries);

        if let Err(e) = inner.persist() {
            inner.entries = previous;
            return Err(e);
        }
        Ok(())
    }

    /// All records, ordered by path
    pub fn list_all(&self) -> Result<Vec<ContentDescription>> {
        Ok(self.lock_inner()?.entries.values().cloned().collect())
    }

    pub fn stats(&self) -> Result<CacheStats> {
        use crate::content::ContentType;

        let inner = self.lock_inner()?;
        let mut stats = CacheStats {
            entries: inner.entries.len(),
            ..Default::default()
        };
        for record in inner.entries.values() {
            match record.content_type {
                ContentType::Image => stats.images += 1,
                ContentType::Audio => stats.audio += 1,
                ContentType::Text => stats.text += 1,
            }
            stats.total_uses += record.use_count;
        }
        Ok(stats)
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.lock_inner()?.entries.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock_inner()?.entries.is_empty())
    }

    /// Cache file path
    pub fn path(&self) -> Result<PathBuf> {
        Ok(self.lock_inner()?.path.clone())
    }
}

impl CacheInner {
    fn persist(&self) -> Result<()> {
        let records: Vec<&ContentDescription> = self.entries.values().collect();
        let data = serde_json::to_vec_pretty(&records)?;
        write_atomic(&self.path, &data)
            .map_err(|e| ArgusError::Cache(format!("Failed to write {:?}: {}", self.path, e)))
    }
}
