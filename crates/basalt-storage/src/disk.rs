//! Page-granular data files.

use basalt_buffer::PageFile;
use basalt_common::{BasaltError, FileId, PageData, PageId, Result, PAGE_SIZE};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

/// A data file made of fixed-size pages.
///
/// Pages are addressed by a 0-indexed page number; the page count is
/// derived from the file length on open. Deleted pages go onto a free list
/// and are reused by the next allocation. The free list is kept in memory
/// only; a reopened file sees deleted pages as allocated again.
///
/// The handle is shareable: interior state (file handle, page count, free
/// list) sits behind a mutex so the buffer pool and the opener can hold the
/// same file.
pub struct DbFile {
    /// File identity, unique among files handed to one buffer pool.
    file_id: FileId,
    /// Path this file was opened at.
    path: PathBuf,
    /// Whether writes are followed by fsync.
    fsync_enabled: bool,
    /// Mutable file state.
    inner: Mutex<DbFileInner>,
}

struct DbFileInner {
    file: File,
    num_pages: u32,
    free_pages: Vec<u32>,
}

impl DbFile {
    /// Opens a data file, creating it if missing.
    pub fn open<P: AsRef<Path>>(path: P, file_id: FileId, fsync_enabled: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)?;

        let file_size = file.metadata()?.len();
        let num_pages = (file_size / PAGE_SIZE as u64) as u32;

        Ok(Self {
            file_id,
            path,
            fsync_enabled,
            inner: Mutex::new(DbFileInner {
                file,
                num_pages,
                free_pages: Vec::new(),
            }),
        })
    }

    /// Returns the path this file was opened at.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the number of pages in the file, including freed ones.
    pub fn num_pages(&self) -> u32 {
        self.inner.lock().num_pages
    }

    /// Forces all pending writes to stable storage.
    pub fn sync(&self) -> Result<()> {
        self.inner.lock().file.sync_all()?;
        Ok(())
    }

    fn page_offset(page_no: u32) -> u64 {
        page_no as u64 * PAGE_SIZE as u64
    }

    fn missing(&self, page_no: u32) -> BasaltError {
        BasaltError::PageNotFound {
            page_id: PageId::new(self.file_id, page_no),
        }
    }
}

impl PageFile for DbFile {
    fn file_id(&self) -> FileId {
        self.file_id
    }

    fn filename(&self) -> String {
        self.path.display().to_string()
    }

    fn read_page(&self, page_no: u32, buf: &mut PageData) -> Result<()> {
        let mut inner = self.inner.lock();
        if page_no >= inner.num_pages || inner.free_pages.contains(&page_no) {
            return Err(self.missing(page_no));
        }

        inner.file.seek(SeekFrom::Start(Self::page_offset(page_no)))?;
        inner.file.read_exact(buf)?;
        Ok(())
    }

    fn write_page(&self, page_no: u32, data: &PageData) -> Result<()> {
        let mut inner = self.inner.lock();
        if page_no >= inner.num_pages || inner.free_pages.contains(&page_no) {
            return Err(self.missing(page_no));
        }

        inner.file.seek(SeekFrom::Start(Self::page_offset(page_no)))?;
        inner.file.write_all(data)?;

        if self.fsync_enabled {
            inner.file.sync_all()?;
        }
        Ok(())
    }

    fn allocate_page(&self) -> Result<u32> {
        let mut inner = self.inner.lock();

        // Prefer a freed page; otherwise extend the file.
        let page_no = match inner.free_pages.pop() {
            Some(page_no) => page_no,
            None => {
                let page_no = inner.num_pages;
                inner.num_pages = page_no + 1;
                page_no
            }
        };

        // The page starts zeroed on disk either way.
        inner.file.seek(SeekFrom::Start(Self::page_offset(page_no)))?;
        inner.file.write_all(&[0u8; PAGE_SIZE])?;

        if self.fsync_enabled {
            inner.file.sync_all()?;
        }
        Ok(page_no)
    }

    fn delete_page(&self, page_no: u32) -> Result<()> {
        let mut inner = self.inner.lock();
        if page_no >= inner.num_pages || inner.free_pages.contains(&page_no) {
            return Err(self.missing(page_no));
        }

        inner.free_pages.push(page_no);
        Ok(())
    }
}

impl Drop for DbFile {
    fn drop(&mut self) {
        if let Err(err) = self.sync() {
            warn!(file = %self.filename(), %err, "sync on close failed");
        }
    }
}
