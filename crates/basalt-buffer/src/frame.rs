//! Frame identity and per-frame bookkeeping.

use crate::file::PageFile;
use basalt_common::page::PageId;
use std::sync::Arc;

/// Unique identifier for a frame in the buffer pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId(pub u32);

impl FrameId {
    /// Invalid frame ID.
    pub const INVALID: FrameId = FrameId(u32::MAX);

    /// Returns true if this is a valid frame ID.
    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }

    /// Returns the frame's position in the pool's arrays.
    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for FrameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "frame:{}", self.0)
    }
}

/// The (file, page) association of a valid frame.
pub struct FrameOwner {
    /// Handle to the file whose page this frame caches.
    pub(crate) file: Arc<dyn PageFile>,
    /// Page number within the owning file.
    pub(crate) page_no: u32,
}

impl FrameOwner {
    /// Returns the composite key of the cached page.
    pub fn page_id(&self) -> PageId {
        PageId::new(self.file.file_id(), self.page_no)
    }
}

/// Per-frame metadata, co-indexed with the pool's frame array.
///
/// A frame with `owner == None` holds no meaningful page; `clear()` resets
/// the pin count and dirty bit in the same step, so an invalid frame is
/// always unpinned and clean.
///
/// Only `install` and `clear` are exposed as transitions. Pinning,
/// unpinning, dirty marking, and the reference bit are mutated by the pool
/// directly, since those updates must stay coordinated with the page index.
pub struct FrameDescriptor {
    /// Frame identity, fixed at pool construction.
    frame_id: FrameId,
    /// The page cached in this frame, or None when the frame is free.
    pub(crate) owner: Option<FrameOwner>,
    /// Number of outstanding holders of the cached page.
    pub(crate) pin_count: u32,
    /// Whether the frame's bytes differ from the on-disk page.
    pub(crate) dirty: bool,
    /// Second-chance marker for the clock scan.
    pub(crate) referenced: bool,
}

impl FrameDescriptor {
    /// Creates a descriptor for an empty frame.
    pub fn new(frame_id: FrameId) -> Self {
        Self {
            frame_id,
            owner: None,
            pin_count: 0,
            dirty: false,
            referenced: false,
        }
    }

    /// Associates the frame with a freshly loaded page.
    ///
    /// The page starts pinned once, clean, and referenced, both for a
    /// miss-fill and for a newly allocated page.
    pub fn install(&mut self, file: Arc<dyn PageFile>, page_no: u32) {
        self.owner = Some(FrameOwner { file, page_no });
        self.pin_count = 1;
        self.dirty = false;
        self.referenced = true;
    }

    /// Returns the frame to the empty state.
    pub fn clear(&mut self) {
        self.owner = None;
        self.pin_count = 0;
        self.dirty = false;
        self.referenced = false;
    }

    /// Returns the frame ID.
    #[inline]
    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    /// Returns the cached page's key, if the frame is valid.
    #[inline]
    pub fn page_id(&self) -> Option<PageId> {
        self.owner.as_ref().map(FrameOwner::page_id)
    }

    /// Returns true if the frame holds a page.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.owner.is_some()
    }

    /// Returns the current pin count.
    #[inline]
    pub fn pin_count(&self) -> u32 {
        self.pin_count
    }

    /// Returns true if the cached page has outstanding holders.
    #[inline]
    pub fn is_pinned(&self) -> bool {
        self.pin_count > 0
    }

    /// Returns true if the frame's bytes need write-back.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns the reference bit value.
    #[inline]
    pub fn referenced(&self) -> bool {
        self.referenced
    }
}

impl std::fmt::Debug for FrameDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameDescriptor")
            .field("frame_id", &self.frame_id)
            .field("page_id", &self.page_id())
            .field("pin_count", &self.pin_count)
            .field("dirty", &self.dirty)
            .field("referenced", &self.referenced)
            .finish()
    }
}
