//! BasaltDB common types, errors, and utilities.
//!
//! This crate provides shared definitions used across all BasaltDB components.

pub mod config;
pub mod error;
pub mod page;

pub use config::StorageConfig;
pub use error::{BasaltError, Result};
pub use page::{FileId, PageData, PageId, PAGE_SIZE};
