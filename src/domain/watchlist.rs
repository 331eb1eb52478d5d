//! Durable token address -> candidate mapping.
//!
//! One mutex owns the map. Every mutation persists the full map while still holding
//! the lock, so concurrent writers (one evaluator per exchange stream plus the survival
//! watcher) can never interleave an upsert with another writer's save.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::shared::errors::PersistenceError;
use crate::shared::types::{CandidateEntry, CandidateStatus};

pub type WatchlistMap = BTreeMap<String, CandidateEntry>;

pub struct Watchlist {
    path: PathBuf,
    entries: Mutex<WatchlistMap>,
}

impl Watchlist {
    /// Empty watchlist backed by `path`. Nothing is read until [`Watchlist::load`].
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the in-memory map with the persisted one. A missing file is an empty watchlist.
    pub async fn load(&self) -> Result<usize, PersistenceError> {
        let loaded = read_map(&self.path).await?;
        let mut entries = self.entries.lock().await;
        *entries = loaded;
        match entries.len() {
            0 => info!("📂 Watchlist empty, starting from scratch ({})", self.path.display()),
            n => info!("📂 Watchlist loaded with {} candidates", n),
        }
        Ok(entries.len())
    }

    /// Overwrite storage with the full current map
    pub async fn save(&self) -> Result<(), PersistenceError> {
        let entries = self.entries.lock().await;
        self.persist(&entries).await
    }

    pub async fn contains(&self, token_address: &str) -> bool {
        self.entries.lock().await.contains_key(token_address)
    }

    /// Insert or replace an entry, then persist
    pub async fn upsert(&self, entry: CandidateEntry) -> Result<(), PersistenceError> {
        let mut entries = self.entries.lock().await;
        entries.insert(entry.token_address.clone(), entry);
        self.persist(&entries).await
    }

    /// Insert `entry` only if its address is not tracked yet, then persist. Returns whether
    /// it was inserted. On a failed write the new entry stays in memory.
    pub async fn insert_new(&self, entry: CandidateEntry) -> Result<bool, PersistenceError> {
        let mut entries = self.entries.lock().await;
        if entries.contains_key(&entry.token_address) {
            return Ok(false);
        }
        entries.insert(entry.token_address.clone(), entry);
        self.persist(&entries).await?;
        Ok(true)
    }

    /// Apply status transitions, then persist once. Transitions that are not strictly
    /// forward, or that name unknown addresses, are ignored. Returns how many applied.
    pub async fn advance(&self, updates: &[(String, CandidateStatus)]) -> Result<usize, PersistenceError> {
        let mut entries = self.entries.lock().await;
        let mut applied = 0;
        for (address, status) in updates {
            match entries.get_mut(address) {
                Some(entry) if *status > entry.status => {
                    entry.status = *status;
                    applied += 1;
                }
                Some(entry) => warn!(
                    "Ignoring non-forward transition for {}: {} -> {}",
                    address,
                    entry.status.as_str(),
                    status.as_str()
                ),
                None => warn!("Ignoring transition for unknown candidate {}", address),
            }
        }
        self.persist(&entries).await?;
        Ok(applied)
    }

    /// Snapshot of all entries
    pub async fn list(&self) -> Vec<CandidateEntry> {
        self.entries.lock().await.values().cloned().collect()
    }

    pub async fn get(&self, token_address: &str) -> Option<CandidateEntry> {
        self.entries.lock().await.get(token_address).cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    async fn persist(&self, entries: &WatchlistMap) -> Result<(), PersistenceError> {
        write_map(&self.path, entries).await.map_err(|e| {
            error!("💥 Failed to persist watchlist to {}: {}", self.path.display(), e);
            e
        })
    }
}

/// Read a persisted watchlist file. Missing file -> empty map.
pub async fn read_map(path: &Path) -> Result<WatchlistMap, PersistenceError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
        Err(e) => Err(e.into()),
    }
}

/// Write to a sibling temp file and rename it over the target
async fn write_map(path: &Path, entries: &WatchlistMap) -> Result<(), PersistenceError> {
    let json = serde_json::to_vec_pretty(entries)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, json).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
