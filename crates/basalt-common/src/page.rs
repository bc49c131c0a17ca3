//! Page identity and page-sized buffers for BasaltDB storage.

use serde::{Deserialize, Serialize};

/// Default page size in bytes (8 KB).
pub const PAGE_SIZE: usize = 8 * 1024;

/// One page worth of raw bytes.
pub type PageData = [u8; PAGE_SIZE];

/// Identifier of a data file.
pub type FileId = u32;

/// Unique identifier for a page within a file.
///
/// A PageId is the composite of the owning file's identity and the page
/// number within that file. It is the key of the buffer pool's page index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageId {
    /// File identifier.
    pub file_id: FileId,
    /// Page number within the file (0-indexed).
    pub page_no: u32,
}

impl PageId {
    /// Creates a new PageId.
    pub fn new(file_id: FileId, page_no: u32) -> Self {
        Self { file_id, page_no }
    }

    /// Returns the PageId as a single u64 for compact storage.
    pub fn as_u64(&self) -> u64 {
        ((self.file_id as u64) << 32) | (self.page_no as u64)
    }

    /// Creates a PageId from a u64 representation.
    pub fn from_u64(value: u64) -> Self {
        Self {
            file_id: (value >> 32) as u32,
            page_no: value as u32,
        }
    }
}

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.file_id, self.page_no)
    }
}
