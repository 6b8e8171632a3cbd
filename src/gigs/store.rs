//! The ordered gig collection and its durable mirror
//!
//! Newest gigs sit at the front. Every insert or delete writes the full
//! collection back to storage before returning.

use super::storage::DurableStorage;
use super::types::Gig;
use crate::Result;
use tracing::{debug, warn};

/// Storage key used when none is configured
pub const DEFAULT_STORAGE_KEY: &str = "gigs";

pub struct ListingStore {
    gigs: Vec<Gig>,
    storage: Box<dyn DurableStorage>,
    key: String,
}

impl ListingStore {
    /// Load the collection from storage
    ///
    /// A missing key or unreadable document yields an empty collection.
    pub fn load(storage: Box<dyn DurableStorage>, key: impl Into<String>) -> Self {
        let key = key.into();
        let gigs = match storage.get(&key) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<Gig>>(&raw) {
                Ok(gigs) => gigs,
                Err(e) => {
                    warn!("Stored gigs under '{}' are invalid, starting empty: {}", key, e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Failed to read stored gigs, starting empty: {}", e);
                Vec::new()
            }
        };

        debug!("Loaded {} gigs from '{}'", gigs.len(), key);

        Self { gigs, storage, key }
    }

    pub fn gigs(&self) -> &[Gig] {
        &self.gigs
    }

    pub fn iter(&self) -> impl Iterator<Item = &Gig> {
        self.gigs.iter()
    }

    pub fn len(&self) -> usize {
        self.gigs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gigs.is_empty()
    }

    pub fn get(&self, id: u64) -> Option<&Gig> {
        self.gigs.iter().find(|g| g.id == id)
    }

    pub fn max_id(&self) -> Option<u64> {
        self.gigs.iter().map(|g| g.id).max()
    }

    /// Pick an id for a new gig from the current clock reading
    ///
    /// Falls back to `max_id + 1` when the clock has not moved past the
    /// newest id. If the newest id is `u64::MAX`, the first unused id at or
    /// after the clock reading is taken instead.
    pub fn next_id(&self, now_ms: u64) -> u64 {
        match self.max_id() {
            Some(max) if now_ms <= max => max.checked_add(1).unwrap_or_else(|| {
                warn!("Stored gig ids reach u64::MAX, searching for a free id");
                self.unused_id(now_ms)
            }),
            _ => now_ms,
        }
    }

    fn unused_id(&self, from: u64) -> u64 {
        // At most len() candidates are taken, so the scan ends quickly
        (from..=u64::MAX)
            .chain(0..from)
            .find(|id| self.get(*id).is_none())
            .unwrap_or(from)
    }

    /// Distinct work titles in order of first appearance
    pub fn distinct_titles(&self, limit: usize) -> Vec<String> {
        let mut titles: Vec<String> = Vec::new();
        for gig in &self.gigs {
            if titles.len() >= limit {
                break;
            }
            if !titles.contains(&gig.work_title) {
                titles.push(gig.work_title.clone());
            }
        }
        titles
    }

    /// First gig whose title mentions the service, case-insensitively
    pub fn find_by_service(&self, service: &str) -> Option<&Gig> {
        let needle = service.to_lowercase();
        self.gigs
            .iter()
            .find(|g| g.work_title.to_lowercase().contains(&needle))
    }

    /// Prepend a gig and persist
    pub fn insert(&mut self, gig: Gig) {
        debug!("Inserting gig {} ({})", gig.id, gig.work_title);
        self.gigs.insert(0, gig);
        self.persist_or_warn();
    }

    /// Remove the gig with `id`, if present
    pub fn delete_by_id(&mut self, id: u64) -> Option<Gig> {
        let pos = self.gigs.iter().position(|g| g.id == id)?;
        let removed = self.gigs.remove(pos);
        self.persist_or_warn();
        Some(removed)
    }

    /// Remove the tail of the collection, which is the oldest gig
    pub fn delete_last(&mut self) -> Option<Gig> {
        let removed = self.gigs.pop()?;
        self.persist_or_warn();
        Some(removed)
    }

    /// Serialize the whole collection to storage
    pub fn persist(&mut self) -> Result<()> {
        let json = serde_json::to_string(&self.gigs)?;
        self.storage.set(&self.key, &json)
    }

    fn persist_or_warn(&mut self) {
        if let Err(e) = self.persist() {
            warn!("Failed to persist gigs: {}", e);
        }
    }
}
