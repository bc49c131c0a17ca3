//! Collaborator contract between the buffer pool and on-disk files.

use basalt_common::{FileId, PageData, Result};

/// A page-granular file the buffer pool caches pages for.
///
/// The pool keeps an `Arc<dyn PageFile>` per resident page so it can write
/// dirty frames back through the owning file during eviction, flush, and
/// teardown. Implementations own all persistence concerns; the pool never
/// interprets page bytes.
///
/// Methods take `&self`: a file may be shared between the pool (which holds
/// handles to it) and the caller that opened it, so implementations guard
/// their interior state themselves.
pub trait PageFile {
    /// Returns the file's identity, unique among files handed to one pool.
    fn file_id(&self) -> FileId;

    /// Returns the file's name for diagnostics and error messages.
    fn filename(&self) -> String;

    /// Reads the page's bytes into `buf`.
    fn read_page(&self, page_no: u32, buf: &mut PageData) -> Result<()>;

    /// Writes a full page back to the file.
    fn write_page(&self, page_no: u32, data: &PageData) -> Result<()>;

    /// Creates a new page and returns its file-assigned page number.
    fn allocate_page(&self) -> Result<u32>;

    /// Deletes a page from the file.
    fn delete_page(&self, page_no: u32) -> Result<()>;
}
