//! Storage abstractions for per-topic listing state.
//!
//! Each topic owns one JSON array of every listing recorded for it so far.
//!
//! ## Directory Structure
//!
//! ```text
//! data/
//! ├── Tel_Aviv_for_sale.json
//! └── Haifa_rent.json
//! ```

pub mod local;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::ListingItem;

// Re-export for convenience
pub use local::LocalStateStore;

/// Trait for topic state backends.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the listings recorded for a topic.
    ///
    /// Missing or unreadable state is an empty history, never an error.
    async fn load(&self, topic: &str) -> Vec<ListingItem>;

    /// Replace the recorded listings for a topic.
    ///
    /// A concurrent or later `load` sees either the old or the new content,
    /// never a partial write.
    async fn save(&self, topic: &str, items: &[ListingItem]) -> Result<()>;
}
