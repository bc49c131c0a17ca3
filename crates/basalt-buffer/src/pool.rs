//! Buffer pool manager.

use crate::file::PageFile;
use crate::frame::{FrameDescriptor, FrameId};
use crate::index::PageIndex;
use basalt_common::page::{PageData, PageId, PAGE_SIZE};
use basalt_common::{BasaltError, Result, StorageConfig};
use std::fmt::Write as _;
use std::sync::Arc;
use sysinfo::System;
use tracing::{debug, error};

/// Configuration for the buffer pool.
#[derive(Debug, Clone)]
pub struct BufferPoolConfig {
    /// Number of frames in the pool.
    pub num_frames: usize,
}

impl Default for BufferPoolConfig {
    fn default() -> Self {
        Self { num_frames: 1024 }
    }
}

impl From<&StorageConfig> for BufferPoolConfig {
    fn from(config: &StorageConfig) -> Self {
        Self {
            num_frames: config.buffer_pool_frames,
        }
    }
}

/// Buffer pool manager.
///
/// Maintains a fixed array of page frames backed by on-disk files, with:
/// - A (file, page) to frame mapping kept in exact agreement with the
///   descriptor array
/// - Clock (second-chance) replacement for eviction
/// - Pin counting to protect pages in active use
/// - Dirty tracking with write-back on eviction, flush, and teardown
///
/// Every mutating operation takes `&mut self` and runs to completion; the
/// pool carries no internal locks. Callers that share a pool across threads
/// wrap the whole pool in a single mutex, never individual frames.
///
/// Page contents are reached through [`FrameId`] handles returned by
/// [`BufferPool::fetch_page`] and [`BufferPool::allocate_page`]. A handle is
/// valid only while its pin is held; after the matching unpin the frame may
/// be recycled for an unrelated page.
pub struct BufferPool {
    /// Page frames, one page each.
    frames: Vec<Box<PageData>>,
    /// Per-frame bookkeeping, co-indexed with `frames`.
    descriptors: Vec<FrameDescriptor>,
    /// Mapping from resident page keys to frames.
    index: PageIndex,
    /// Clock hand position, persistent across allocations.
    clock_hand: usize,
}

impl BufferPool {
    /// Creates a new buffer pool with all frames empty.
    ///
    /// The frame array, descriptor array, and index are allocated here at
    /// fixed capacity and never resized.
    pub fn new(config: BufferPoolConfig) -> Self {
        let num_frames = config.num_frames;
        assert!(num_frames > 0, "buffer pool requires at least one frame");

        let frames = (0..num_frames)
            .map(|_| Box::new([0u8; PAGE_SIZE]))
            .collect();
        let descriptors = (0..num_frames)
            .map(|i| FrameDescriptor::new(FrameId(i as u32)))
            .collect();

        Self {
            frames,
            descriptors,
            index: PageIndex::new(num_frames),
            // Start at the last frame so the first advance examines frame 0.
            clock_hand: num_frames - 1,
        }
    }

    /// Creates a buffer pool sized to 25% of available system RAM.
    ///
    /// Queries the system for available memory and allocates a quarter of
    /// it, with a floor of 1,000 frames so caching stays useful on
    /// low-memory systems.
    pub fn auto_sized() -> Self {
        let mut sys = System::new_all();
        sys.refresh_memory();

        let available_bytes = sys.available_memory() as usize;
        let target_bytes = available_bytes / 4;
        let num_frames = (target_bytes / PAGE_SIZE).max(1_000);

        Self::new(BufferPoolConfig { num_frames })
    }

    /// Returns the number of frames in the pool.
    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    /// Returns the number of pages currently resident in the pool.
    pub fn page_count(&self) -> usize {
        self.index.len()
    }

    /// Checks if a page is resident in the pool.
    pub fn contains(&self, file: &Arc<dyn PageFile>, page_no: u32) -> bool {
        self.index.contains(PageId::new(file.file_id(), page_no))
    }

    /// Returns the bytes of a pinned page.
    pub fn page(&self, frame_id: FrameId) -> &PageData {
        &self.frames[frame_id.index()]
    }

    /// Returns mutable access to the bytes of a pinned page.
    ///
    /// Modifications must be reported by unpinning with `mark_dirty = true`,
    /// or they are lost when the frame is recycled.
    pub fn page_mut(&mut self, frame_id: FrameId) -> &mut PageData {
        &mut self.frames[frame_id.index()]
    }

    /// Returns the descriptor of a frame, for inspection.
    pub fn descriptor(&self, frame_id: FrameId) -> &FrameDescriptor {
        &self.descriptors[frame_id.index()]
    }

    /// Obtains a free frame using the clock algorithm.
    ///
    /// The hand advances exactly one frame per iteration and keeps its
    /// position across calls. An invalid frame is taken immediately; a
    /// referenced frame loses its reference bit and gets a second chance; a
    /// pinned frame is skipped. Once a full sweep observes nothing but
    /// pinned frames the pool is exhausted and the call fails rather than
    /// waiting for an unpin.
    ///
    /// A chosen victim is written back first when dirty, then unmapped from
    /// the index and cleared.
    fn allocate_frame(&mut self) -> Result<FrameId> {
        let num_frames = self.frames.len();
        let mut busy_frames = 0;

        loop {
            self.clock_hand = (self.clock_hand + 1) % num_frames;
            let hand = self.clock_hand;

            let (file, page_no) = match &self.descriptors[hand].owner {
                None => return Ok(FrameId(hand as u32)),
                Some(owner) => (Arc::clone(&owner.file), owner.page_no),
            };

            let desc = &mut self.descriptors[hand];
            if desc.referenced {
                // Second chance; the frame was not observed busy, so the
                // consecutive-busy count starts over.
                desc.referenced = false;
                busy_frames = 0;
                continue;
            }
            if desc.pin_count > 0 {
                busy_frames += 1;
                if busy_frames == num_frames {
                    return Err(BasaltError::PoolExhausted);
                }
                continue;
            }

            // Victim found: valid, unreferenced, unpinned.
            if desc.dirty {
                file.write_page(page_no, &self.frames[hand])?;
                self.descriptors[hand].dirty = false;
            }

            let page_id = PageId::new(file.file_id(), page_no);
            self.index.remove(page_id)?;
            self.descriptors[hand].clear();

            debug!(page = %page_id, frame = hand, "evicted page");
            return Ok(FrameId(hand as u32));
        }
    }

    /// Fetches a page and pins it.
    ///
    /// On a hit the pin count is incremented and the reference bit set. On a
    /// miss a frame is obtained from the clock scan, the page is read from
    /// its file, and the frame is installed pinned once.
    ///
    /// The returned handle stays valid until the matching
    /// [`BufferPool::unpin_page`]; callers must eventually unpin every page
    /// they fetch.
    pub fn fetch_page(&mut self, file: &Arc<dyn PageFile>, page_no: u32) -> Result<FrameId> {
        let page_id = PageId::new(file.file_id(), page_no);

        if let Some(frame_id) = self.index.lookup(page_id) {
            let desc = &mut self.descriptors[frame_id.index()];
            desc.referenced = true;
            desc.pin_count += 1;
            return Ok(frame_id);
        }

        let frame_id = self.allocate_frame()?;
        file.read_page(page_no, &mut self.frames[frame_id.index()])?;
        self.index.insert(page_id, frame_id)?;
        self.descriptors[frame_id.index()].install(Arc::clone(file), page_no);

        Ok(frame_id)
    }

    /// Releases one pin on a page, optionally marking it dirty.
    ///
    /// Unpinning a page that is not resident is a deliberate no-op; the
    /// frame may already have been recycled. Unpinning a resident page whose
    /// pin count is zero fails with `PageNotPinned`. The dirty bit is
    /// sticky: passing `mark_dirty = false` never clears it.
    pub fn unpin_page(
        &mut self,
        file: &Arc<dyn PageFile>,
        page_no: u32,
        mark_dirty: bool,
    ) -> Result<()> {
        let page_id = PageId::new(file.file_id(), page_no);
        let Some(frame_id) = self.index.lookup(page_id) else {
            return Ok(());
        };

        let desc = &mut self.descriptors[frame_id.index()];
        if desc.pin_count == 0 {
            return Err(BasaltError::PageNotPinned { page_id });
        }
        desc.pin_count -= 1;
        if mark_dirty {
            desc.dirty = true;
        }
        Ok(())
    }

    /// Allocates a new page in the file and pins it in the pool.
    ///
    /// The file assigns the page number; the frame starts zero-filled and
    /// pinned once. The caller populates it through
    /// [`BufferPool::page_mut`] and must eventually unpin it.
    pub fn allocate_page(&mut self, file: &Arc<dyn PageFile>) -> Result<(u32, FrameId)> {
        let page_no = file.allocate_page()?;
        let frame_id = self.allocate_frame()?;

        self.frames[frame_id.index()].fill(0);
        self.index
            .insert(PageId::new(file.file_id(), page_no), frame_id)?;
        self.descriptors[frame_id.index()].install(Arc::clone(file), page_no);

        Ok((page_no, frame_id))
    }

    /// Removes a page from the pool and deletes it from its file.
    ///
    /// If the page is resident its frame is cleared and unmapped without a
    /// pin check; callers must not dispose a page other holders still pin.
    /// The file's delete is invoked whether or not the page was resident.
    pub fn dispose_page(&mut self, file: &Arc<dyn PageFile>, page_no: u32) -> Result<()> {
        let page_id = PageId::new(file.file_id(), page_no);

        if let Some(frame_id) = self.index.lookup(page_id) {
            self.index.remove(page_id)?;
            self.descriptors[frame_id.index()].clear();
        }

        file.delete_page(page_no)
    }

    /// Writes back and evicts every resident page of one file.
    ///
    /// Used before a file is closed or dropped so no dirty residue remains.
    /// A pinned page fails the call with `PagePinned`; frames processed
    /// before it stay flushed and evicted. A frame whose index entry
    /// disagrees with its descriptor fails with `IndexCorruption` or
    /// `InconsistentFrame`. Returns the number of frames released.
    pub fn flush_file(&mut self, file: &Arc<dyn PageFile>) -> Result<usize> {
        let file_id = file.file_id();
        let mut flushed = 0;

        for frame in 0..self.descriptors.len() {
            let (page_no, pinned, dirty) = {
                let desc = &self.descriptors[frame];
                match &desc.owner {
                    Some(owner) if owner.file.file_id() == file_id => {
                        (owner.page_no, desc.pin_count > 0, desc.dirty)
                    }
                    _ => continue,
                }
            };

            let page_id = PageId::new(file_id, page_no);
            if pinned {
                return Err(BasaltError::PagePinned { page_id });
            }

            // The index must map this key back to this exact frame.
            let mapped = self.index.frame_of(page_id)?;
            if mapped.index() != frame {
                return Err(BasaltError::InconsistentFrame { page_id, frame });
            }

            if dirty {
                file.write_page(page_no, &self.frames[frame])?;
                self.descriptors[frame].dirty = false;
            }

            self.index.remove(page_id)?;
            self.descriptors[frame].clear();
            flushed += 1;
        }

        Ok(flushed)
    }

    /// Writes back every dirty frame across all files.
    ///
    /// Pages stay resident and pinned pages are untouched apart from the
    /// write-back; this is the teardown path, not an eviction. Returns the
    /// number of frames written.
    pub fn flush_all(&mut self) -> Result<usize> {
        let mut flushed = 0;

        for frame in 0..self.descriptors.len() {
            let desc = &self.descriptors[frame];
            if !desc.dirty {
                continue;
            }
            let (file, page_no) = match &desc.owner {
                Some(owner) => (Arc::clone(&owner.file), owner.page_no),
                None => continue,
            };

            file.write_page(page_no, &self.frames[frame])?;
            self.descriptors[frame].dirty = false;
            flushed += 1;
        }

        Ok(flushed)
    }

    /// Returns statistics about the buffer pool.
    pub fn stats(&self) -> BufferPoolStats {
        let mut pinned_frames = 0;
        let mut dirty_frames = 0;

        for desc in &self.descriptors {
            if desc.is_pinned() {
                pinned_frames += 1;
            }
            if desc.is_dirty() {
                dirty_frames += 1;
            }
        }

        BufferPoolStats {
            total_frames: self.frames.len(),
            resident_pages: self.index.len(),
            pinned_frames,
            dirty_frames,
        }
    }

    /// Renders a frame-by-frame listing of the pool's state.
    ///
    /// Debug aid only; the output format is not stable.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        let mut valid_frames = 0;

        for desc in &self.descriptors {
            match desc.page_id() {
                Some(page_id) => {
                    valid_frames += 1;
                    let _ = writeln!(
                        out,
                        "{} page={} pin={} dirty={} ref={}",
                        desc.frame_id(),
                        page_id,
                        desc.pin_count(),
                        desc.is_dirty(),
                        desc.referenced(),
                    );
                }
                None => {
                    let _ = writeln!(out, "{} <empty>", desc.frame_id());
                }
            }
        }

        let _ = writeln!(out, "valid frames: {}/{}", valid_frames, self.frames.len());
        out
    }
}

impl Drop for BufferPool {
    fn drop(&mut self) {
        // Destructors cannot propagate; a failed write-back is logged and
        // the remaining frames are still released.
        if let Err(err) = self.flush_all() {
            error!(%err, "failed to write back dirty pages during pool teardown");
        }
    }
}

/// Statistics about the buffer pool.
#[derive(Debug, Clone)]
pub struct BufferPoolStats {
    /// Total number of frames.
    pub total_frames: usize,
    /// Number of frames holding a page.
    pub resident_pages: usize,
    /// Number of pinned frames.
    pub pinned_frames: usize,
    /// Number of dirty frames.
    pub dirty_frames: usize,
}
