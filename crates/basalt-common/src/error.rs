//! Error types for BasaltDB.

use crate::page::PageId;
use thiserror::Error;

/// Result type alias using BasaltError.
pub type Result<T> = std::result::Result<T, BasaltError>;

/// Errors that can occur in BasaltDB operations.
///
/// The buffer pool variants split into two classes: caller-contract
/// violations (`PoolExhausted`, `PageNotPinned`, `PagePinned`), which a
/// caller is expected to handle, and index-integrity faults
/// (`KeyAlreadyPresent`, `KeyNotFound`, `IndexCorruption`,
/// `InconsistentFrame`), which indicate a broken engine invariant.
#[derive(Debug, Error)]
pub enum BasaltError {
    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // File collaborator errors
    #[error("Page not found: {page_id}")]
    PageNotFound { page_id: PageId },

    // Buffer pool errors
    #[error("Buffer pool exhausted, every frame is pinned")]
    PoolExhausted,

    #[error("Page {page_id} is not pinned")]
    PageNotPinned { page_id: PageId },

    #[error("Page {page_id} is still pinned")]
    PagePinned { page_id: PageId },

    #[error("Frame {frame} disagrees with the page index for page {page_id}")]
    InconsistentFrame { page_id: PageId, frame: usize },

    // Page index errors
    #[error("Page index already contains key {page_id}")]
    KeyAlreadyPresent { page_id: PageId },

    #[error("Page index has no key {page_id}")]
    KeyNotFound { page_id: PageId },

    #[error("Page index corruption: {0}")]
    IndexCorruption(String),
}
