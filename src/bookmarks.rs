//! Saved tweets for the current profile.
//!
//! The store keeps the ordered list of bookmarked tweet ids in memory and
//! writes the whole list through a [`BookmarkSlot`] after every mutation.
//! The persisted value uses the `{"state": {"bookmarks": [...]}, "version": 0}`
//! envelope the web client writes to local storage, so an exported slot
//! can be dropped in as-is.

use crate::records::TweetRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Namespace key of the persisted bookmark list.
pub const BOOKMARKS_KEY: &str = "searchx-bookmarks";

#[derive(Debug, Error)]
pub enum SlotError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode bookmarks: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Durable string slots addressed by key.
pub trait BookmarkSlot {
    /// `Ok(None)` when nothing was ever written under `key`.
    fn read(&self, key: &str) -> Result<Option<String>, SlotError>;

    fn write(&mut self, key: &str, value: &str) -> Result<(), SlotError>;
}

/// Slots stored as `{dir}/{key}.json`.
#[derive(Debug, Clone)]
pub struct FileSlot {
    dir: PathBuf,
}

impl FileSlot {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl BookmarkSlot for FileSlot {
    fn read(&self, key: &str) -> Result<Option<String>, SlotError> {
        let path = self.path(key);
        match std::fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(SlotError::Io { path, source }),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), SlotError> {
        let path = self.path(key);
        std::fs::create_dir_all(&self.dir).map_err(|source| SlotError::Io {
            path: self.dir.clone(),
            source,
        })?;

        // Write then rename so a crash never leaves a truncated slot behind.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value).map_err(|source| SlotError::Io {
            path: tmp.clone(),
            source,
        })?;
        std::fs::rename(&tmp, &path).map_err(|source| SlotError::Io { path, source })
    }
}

/// In-process slots, lost when dropped.
#[derive(Debug, Clone, Default)]
pub struct MemorySlot {
    entries: HashMap<String, String>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BookmarkSlot for MemorySlot {
    fn read(&self, key: &str) -> Result<Option<String>, SlotError> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), SlotError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedState {
    bookmarks: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Persisted {
    state: PersistedState,
    #[serde(default)]
    version: u32,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredBookmarks {
    Envelope(Persisted),
    List(Vec<String>),
}

fn decode(raw: &str) -> Option<Vec<String>> {
    match serde_json::from_str::<StoredBookmarks>(raw).ok()? {
        StoredBookmarks::Envelope(persisted) => Some(persisted.state.bookmarks),
        StoredBookmarks::List(bookmarks) => Some(bookmarks),
    }
}

fn encode(bookmarks: &[String]) -> Result<String, SlotError> {
    let persisted = Persisted {
        state: PersistedState {
            bookmarks: bookmarks.to_vec(),
        },
        version: 0,
    };
    Ok(serde_json::to_string(&persisted)?)
}

/// Bookmarked tweet ids, persisted on every change.
///
/// `add` keeps the list free of repeats. A persisted list that already
/// contains repeats is loaded verbatim and `remove` strips every copy.
#[derive(Debug)]
pub struct BookmarkStore<S: BookmarkSlot> {
    slot: S,
    bookmarks: Vec<String>,
}

impl<S: BookmarkSlot> BookmarkStore<S> {
    /// Load the persisted list. Missing or unreadable data yields an empty store.
    pub fn open(slot: S) -> Self {
        let bookmarks = match slot.read(BOOKMARKS_KEY) {
            Ok(Some(raw)) => decode(&raw).unwrap_or_else(|| {
                tracing::warn!(key = BOOKMARKS_KEY, "discarding corrupt bookmark data");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(key = BOOKMARKS_KEY, error = %e, "failed to read bookmarks");
                Vec::new()
            }
        };
        tracing::debug!(count = bookmarks.len(), "bookmarks loaded");

        Self { slot, bookmarks }
    }

    /// Returns `false` when `id` was already saved.
    pub fn add(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        if self.contains(&id) {
            return false;
        }
        self.bookmarks.push(id);
        self.persist();
        true
    }

    /// Remove every copy of `id`. Returns whether anything was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.bookmarks.len();
        self.bookmarks.retain(|saved| saved != id);
        self.persist();
        self.bookmarks.len() != before
    }

    pub fn clear(&mut self) {
        self.bookmarks.clear();
        self.persist();
    }

    pub fn contains(&self, id: &str) -> bool {
        self.bookmarks.iter().any(|saved| saved == id)
    }

    /// Flip the saved state of `id`, returning the new state.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.contains(id) {
            self.remove(id);
            false
        } else {
            self.add(id);
            true
        }
    }

    pub fn ids(&self) -> &[String] {
        &self.bookmarks
    }

    pub fn len(&self) -> usize {
        self.bookmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bookmarks.is_empty()
    }

    /// Saved tweets in collection order.
    pub fn saved_records<'a>(&self, records: &'a [TweetRecord]) -> Vec<&'a TweetRecord> {
        records
            .iter()
            .filter(|tweet| self.contains(&tweet.id))
            .collect()
    }

    pub fn into_slot(self) -> S {
        self.slot
    }

    fn persist(&mut self) {
        let result = encode(&self.bookmarks)
            .and_then(|raw| self.slot.write(BOOKMARKS_KEY, &raw));
        if let Err(e) = result {
            tracing::error!(
                key = BOOKMARKS_KEY,
                count = self.bookmarks.len(),
                error = %e,
                "failed to persist bookmarks"
            );
        }
    }
}
