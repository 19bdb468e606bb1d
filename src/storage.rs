//! Flat-file item store.
//!
//! The whole collection lives in a directory as numbered chunk files
//! (`essays_1.json`, `essays_2.json`, ...), each a JSON array of at most
//! `chunk_size` items. Every mutation rewrites the full collection and
//! re-chunks it; mutations are serialized by an async write lock so two
//! writers never interleave their rewrites.
//!
//! Loading is fail-soft: a chunk that cannot be read or parsed is logged,
//! reported in [`Loaded::skipped`], and the remaining chunks still load.

use std::path::{Path, PathBuf};

use opentelemetry::KeyValue;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::model::{Item, ItemId};
use crate::telemetry::metrics;

const CHUNK_PREFIX: &str = "essays_";
const CHUNK_SUFFIX: &str = ".json";

/// Default number of items per chunk file.
pub const DEFAULT_CHUNK_SIZE: usize = 20;

/// Chunk-file storage for the item collection.
#[derive(Debug)]
pub struct ItemStore {
    dir: PathBuf,
    chunk_size: usize,
    write_lock: Mutex<()>,
}

/// Result of a full-collection load.
#[derive(Debug, Default)]
pub struct Loaded {
    /// Items from every readable chunk, in ascending chunk order.
    pub items: Vec<Item>,
    /// Chunks that were present but could not be used.
    pub skipped: Vec<SkippedChunk>,
}

#[derive(Debug, Clone)]
pub struct SkippedChunk {
    pub path: PathBuf,
    pub reason: String,
}

impl ItemStore {
    /// Create a store rooted at `dir`. The directory is created on demand.
    pub fn new(dir: impl Into<PathBuf>, chunk_size: usize) -> Self {
        Self {
            dir: dir.into(),
            chunk_size: chunk_size.max(1),
            write_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Load every item, skipping unreadable chunks.
    pub async fn load(&self) -> Result<Vec<Item>> {
        Ok(self.load_report().await?.items)
    }

    /// Load every item and report which chunks were skipped.
    pub async fn load_report(&self) -> Result<Loaded> {
        let loaded = self.read_all().await?;
        record_operation("load");
        Ok(loaded)
    }

    /// Stored items matching `search`, newest first.
    ///
    /// The query is trimmed; a blank query matches everything.
    pub async fn list(&self, search: Option<&str>) -> Result<Vec<Item>> {
        let mut items = self.load().await?;

        if let Some(search) = search.map(str::trim).filter(|s| !s.is_empty()) {
            items.retain(|item| item.matches(search));
            debug!(search, matched = items.len(), "search applied");
        }

        items.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(items)
    }

    async fn read_all(&self) -> Result<Loaded> {
        self.ensure_dir().await?;

        let mut loaded = Loaded::default();
        for (index, path) in self.chunk_files().await? {
            match read_chunk(&path).await {
                Ok(items) => {
                    debug!(chunk = index, count = items.len(), "chunk loaded");
                    loaded.items.extend(items);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable chunk");
                    loaded.skipped.push(SkippedChunk {
                        path,
                        reason: e.to_string(),
                    });
                }
            }
        }
        Ok(loaded)
    }

    /// Replace the stored collection with `items`, re-chunked.
    ///
    /// Returns the number of chunk files written.
    pub async fn persist(&self, items: &[Item]) -> Result<usize> {
        let _guard = self.write_lock.lock().await;
        let written = self.rewrite(items).await?;
        record_operation("persist");
        Ok(written)
    }

    /// Merge `items` into the stored collection and rewrite it.
    ///
    /// An incoming item replaces a stored one with the same id; everything
    /// else is appended in the given order.
    pub async fn append(&self, items: &[Item]) -> Result<usize> {
        let _guard = self.write_lock.lock().await;
        let mut all = self.load_for_rewrite().await?;
        for item in items {
            match all.iter_mut().find(|existing| existing.id == item.id) {
                Some(existing) => *existing = item.clone(),
                None => all.push(item.clone()),
            }
        }
        let written = self.rewrite(&all).await?;
        record_operation("append");
        Ok(written)
    }

    /// Remove the item with `id`. Deleting an unknown id is not an error.
    ///
    /// Returns whether an item was removed.
    pub async fn delete(&self, id: ItemId) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut all = self.load_for_rewrite().await?;
        let before = all.len();
        all.retain(|item| item.id != id);
        if all.len() == before {
            record_operation("delete");
            debug!(%id, "delete of unknown id");
            return Ok(false);
        }
        self.rewrite(&all).await?;
        record_operation("delete");
        info!(%id, remaining = all.len(), "item deleted");
        Ok(true)
    }

    /// Load ahead of a rewrite. Chunks that failed to load are moved aside
    /// so the rewrite cannot overwrite whatever is left in them.
    async fn load_for_rewrite(&self) -> Result<Vec<Item>> {
        let loaded = self.read_all().await?;
        for skipped in &loaded.skipped {
            let aside = quarantine_path(&skipped.path).await?;
            tokio::fs::rename(&skipped.path, &aside)
                .await
                .map_err(|e| Error::storage(&skipped.path, e))?;
            warn!(
                from = %skipped.path.display(),
                to = %aside.display(),
                "moved unreadable chunk aside"
            );
        }
        Ok(loaded.items)
    }

    /// Write `items` as chunks and drop chunk files past the new end.
    /// Caller must hold the write lock.
    async fn rewrite(&self, items: &[Item]) -> Result<usize> {
        self.ensure_dir().await?;

        let mut written = 0;
        for (i, chunk) in items.chunks(self.chunk_size).enumerate() {
            let path = self.dir.join(chunk_file_name(i + 1));
            write_chunk(&path, chunk).await?;
            written += 1;
        }

        for (index, path) in self.chunk_files().await? {
            if index > written {
                tokio::fs::remove_file(&path)
                    .await
                    .map_err(|e| Error::storage(&path, e))?;
                debug!(chunk = index, "stale chunk removed");
            }
        }

        debug!(items = items.len(), chunks = written, "collection persisted");
        Ok(written)
    }

    async fn ensure_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| Error::storage(&self.dir, e))
    }

    /// Chunk files present on disk, sorted by their 1-based index.
    async fn chunk_files(&self) -> Result<Vec<(usize, PathBuf)>> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| Error::storage(&self.dir, e))?;

        let mut chunks = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Error::storage(&self.dir, e))?
        {
            let name = entry.file_name();
            if let Some(index) = name.to_str().and_then(chunk_index) {
                chunks.push((index, entry.path()));
            }
        }
        chunks.sort_by_key(|(index, _)| *index);
        Ok(chunks)
    }
}

fn chunk_file_name(index: usize) -> String {
    format!("{CHUNK_PREFIX}{index}{CHUNK_SUFFIX}")
}

/// Parse the 1-based index out of a chunk file name.
fn chunk_index(name: &str) -> Option<usize> {
    let digits = name.strip_prefix(CHUNK_PREFIX)?.strip_suffix(CHUNK_SUFFIX)?;
    // Leading zeros would give one index two file names.
    if digits.starts_with('0') || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// First free `<chunk>.corrupt`, `<chunk>.1.corrupt`, ... next to `path`.
async fn quarantine_path(path: &Path) -> Result<PathBuf> {
    let mut n = 0usize;
    loop {
        let mut name = path.as_os_str().to_owned();
        if n > 0 {
            name.push(format!(".{n}"));
        }
        name.push(".corrupt");
        let candidate = PathBuf::from(name);
        let taken = tokio::fs::try_exists(&candidate)
            .await
            .map_err(|e| Error::storage(&candidate, e))?;
        if !taken {
            return Ok(candidate);
        }
        n += 1;
    }
}

async fn read_chunk(path: &Path) -> Result<Vec<Item>> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| Error::storage(path, e))?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Write through a sibling temp file so a crash never leaves half a chunk.
async fn write_chunk(path: &Path, items: &[Item]) -> Result<()> {
    let json = serde_json::to_vec_pretty(items)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, json)
        .await
        .map_err(|e| Error::storage(&tmp, e))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| Error::storage(path, e))
}

fn record_operation(operation: &'static str) {
    metrics::store_operations().add(1, &[KeyValue::new("operation", operation)]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_names_round_trip_through_index() {
        assert_eq!(chunk_file_name(7), "essays_7.json");
        assert_eq!(chunk_index("essays_7.json"), Some(7));
        assert_eq!(chunk_index("essays_12.json"), Some(12));
    }

    #[test]
    fn foreign_files_are_not_chunks() {
        assert_eq!(chunk_index("essays_0.json"), None);
        assert_eq!(chunk_index("essays_01.json"), None);
        assert_eq!(chunk_index("essays_1.json.1.corrupt"), None);
        assert_eq!(chunk_index("essays_.json"), None);
        assert_eq!(chunk_index("essays_3.json.tmp"), None);
        assert_eq!(chunk_index("essays_3.json.corrupt"), None);
        assert_eq!(chunk_index("essay_1712345678901.json"), None);
        assert_eq!(chunk_index("essays_-1.json"), None);
        assert_eq!(chunk_index("notes.txt"), None);
    }
}
