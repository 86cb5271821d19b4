//! The single currently-served index and its atomic replacement.

use crate::InvertedIndex;
use parking_lot::RwLock;
use std::sync::Arc;

/// An index generation as handed to readers.
#[derive(Debug)]
pub struct PublishedIndex {
    pub index: InvertedIndex,
    pub generation: u64,
}

/// Holds the published index pointer. Readers take an `Arc` snapshot and
/// keep using it even if a newer generation is published meanwhile.
#[derive(Debug)]
pub struct IndexHandle {
    current: RwLock<Arc<PublishedIndex>>,
}

impl IndexHandle {
    pub fn new(index: InvertedIndex) -> Self {
        Self { current: RwLock::new(Arc::new(PublishedIndex { index, generation: 1 })) }
    }

    pub fn current(&self) -> Arc<PublishedIndex> {
        self.current.read().clone()
    }

    /// Swap in a fully built index. Returns the new generation.
    pub fn publish(&self, index: InvertedIndex) -> u64 {
        let mut slot = self.current.write();
        let generation = slot.generation + 1;
        *slot = Arc::new(PublishedIndex { index, generation });
        tracing::info!(generation, fragments = slot.index.fragment_count(), "published index");
        generation
    }
}
