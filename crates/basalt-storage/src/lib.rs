//! Storage layer for BasaltDB.
//!
//! This crate provides page-granular data files: fixed-size pages
//! addressed by number, with allocation and deletion tracked per file.
//! All caching sits above in `basalt-buffer`; a [`DbFile`] is the file
//! collaborator the buffer pool reads from and writes back to.

mod disk;

pub use disk::DbFile;
