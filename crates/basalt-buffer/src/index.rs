//! Page index mapping resident pages to buffer pool frames.

use crate::frame::FrameId;
use basalt_common::{BasaltError, PageId, Result};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Associative index from (file, page) keys to frame IDs.
///
/// Keys are strictly unique: inserting a present key or removing an absent
/// one is an integrity error, not a silent update. The index must mirror
/// the descriptor array exactly; a key is present if and only if its frame
/// is valid.
pub struct PageIndex {
    map: HashMap<PageId, FrameId>,
}

impl PageIndex {
    /// Creates an index sized for the given number of frames.
    ///
    /// The map is pre-allocated at ~1.2x the frame count to keep lookups
    /// near O(1) without rehashing; the pool never holds more entries than
    /// it has frames.
    pub fn new(num_frames: usize) -> Self {
        Self {
            map: HashMap::with_capacity(num_frames + num_frames / 5),
        }
    }

    /// Establishes a key -> frame mapping.
    ///
    /// Fails with `KeyAlreadyPresent` if the key is already mapped.
    pub fn insert(&mut self, page_id: PageId, frame_id: FrameId) -> Result<()> {
        match self.map.entry(page_id) {
            Entry::Occupied(_) => Err(BasaltError::KeyAlreadyPresent { page_id }),
            Entry::Vacant(slot) => {
                slot.insert(frame_id);
                Ok(())
            }
        }
    }

    /// Returns the mapped frame, if the key is present.
    ///
    /// Absence is a normal outcome here; call sites that require the key to
    /// exist use [`PageIndex::frame_of`] instead.
    pub fn lookup(&self, page_id: PageId) -> Option<FrameId> {
        self.map.get(&page_id).copied()
    }

    /// Returns the mapped frame for a key the caller relies on being present.
    ///
    /// Fails with `IndexCorruption` when the key is absent, since that means
    /// the index and the descriptor array have diverged.
    pub fn frame_of(&self, page_id: PageId) -> Result<FrameId> {
        self.lookup(page_id)
            .ok_or_else(|| BasaltError::IndexCorruption(format!("no entry for page {page_id}")))
    }

    /// Deletes a key -> frame mapping, returning the frame it mapped to.
    ///
    /// Fails with `KeyNotFound` if the key is absent.
    pub fn remove(&mut self, page_id: PageId) -> Result<FrameId> {
        self.map
            .remove(&page_id)
            .ok_or(BasaltError::KeyNotFound { page_id })
    }

    /// Returns true if the key is present.
    pub fn contains(&self, page_id: PageId) -> bool {
        self.map.contains_key(&page_id)
    }

    /// Returns the number of resident pages.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns true if no pages are resident.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
