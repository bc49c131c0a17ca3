//! Buffer pool management for BasaltDB.
//!
//! This crate provides in-memory page caching with:
//! - Fixed-size buffer pool with configurable frame count
//! - Clock (second-chance) eviction policy
//! - Pin counting to protect pages in active use
//! - Dirty page tracking with write-back through the owning file

mod file;
mod frame;
mod index;
mod pool;

pub use file::PageFile;
pub use frame::{FrameDescriptor, FrameId};
pub use index::PageIndex;
pub use pool::{BufferPool, BufferPoolConfig, BufferPoolStats};
