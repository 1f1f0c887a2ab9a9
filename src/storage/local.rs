//! Local filesystem storage implementation.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! ├── {topic_key}.json       # Recorded listings for one topic
//! └── {topic_key}.json.tmp   # Only exists while a save is in flight
//! ```
//!
//! `topic_key` is the topic name with whitespace replaced by `_`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::{ListingItem, storage_key};
use crate::storage::StateStore;
use crate::utils::fs::write_atomic_async;

/// Local filesystem state backend, one file per topic.
#[derive(Debug, Clone)]
pub struct LocalStateStore {
    root_dir: PathBuf,
}

impl LocalStateStore {
    /// Create a new store rooted at the given directory.
    ///
    /// The directory is created on the first save.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// State file path for a topic.
    pub fn path_for(&self, topic: &str) -> PathBuf {
        self.root_dir.join(format!("{}.json", storage_key(topic)))
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

#[async_trait]
impl StateStore for LocalStateStore {
    async fn load(&self, topic: &str) -> Vec<ListingItem> {
        let path = self.path_for(topic);

        let bytes = match self.read_bytes(&path).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                log::debug!("No state file for '{}' at {}", topic, path.display());
                return Vec::new();
            }
            Err(e) => {
                log::warn!("Failed to read {}: {}. Treating as empty.", path.display(), e);
                return Vec::new();
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(items) => items,
            Err(e) => {
                log::warn!(
                    "Failed to parse {}: {}. Treating as empty.",
                    path.display(),
                    e
                );
                Vec::new()
            }
        }
    }

    async fn save(&self, topic: &str, items: &[ListingItem]) -> Result<()> {
        let path = self.path_for(topic);
        let bytes = serde_json::to_vec_pretty(items)?;
        write_atomic_async(&path, &bytes).await?;
        log::debug!("Saved {} listings to {}", items.len(), path.display());
        Ok(())
    }
}
