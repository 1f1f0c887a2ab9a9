//! New-listing detection against recorded topic state.
//!
//! Recorded state is append-only: new listings are appended to what was
//! already stored, so listings that dropped off the live page are kept.
//! Listings without an id never match anything and are always new.

use std::collections::HashSet;

use crate::error::Result;
use crate::models::ListingItem;
use crate::storage::StateStore;

/// Listings in `extracted` whose id is not among `known`, in extraction order.
///
/// An id repeated inside `extracted` is only taken the first time, unlike a
/// plain "not in state" filter, so a page showing one ad twice records and
/// notifies it once.
pub fn new_listings(known: &[ListingItem], extracted: &[ListingItem]) -> Vec<ListingItem> {
    let mut seen: HashSet<&str> = known.iter().filter_map(|item| item.id.as_deref()).collect();

    extracted
        .iter()
        .filter(|item| match item.id.as_deref() {
            Some(id) => seen.insert(id),
            None => true,
        })
        .cloned()
        .collect()
}

/// Computes a topic's new listings and records them.
pub struct DiffEngine<'a> {
    store: &'a dyn StateStore,
}

impl<'a> DiffEngine<'a> {
    pub fn new(store: &'a dyn StateStore) -> Self {
        Self { store }
    }

    /// Return the listings not seen before and append them to the topic state.
    ///
    /// Nothing is written when there is nothing new.
    pub async fn diff_and_persist(
        &self,
        topic: &str,
        extracted: &[ListingItem],
    ) -> Result<Vec<ListingItem>> {
        let mut known = self.store.load(topic).await;
        let added = new_listings(&known, extracted);

        if added.is_empty() {
            log::info!("No new listings for '{topic}'");
            return Ok(added);
        }

        known.extend(added.iter().cloned());
        self.store.save(topic, &known).await?;
        log::info!(
            "Found {} new listings for '{topic}' ({} recorded)",
            added.len(),
            known.len()
        );

        Ok(added)
    }
}
