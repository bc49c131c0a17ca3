//! Buffer pool driving real on-disk files.
//!
//! These tests exercise the full path: pages allocated through the pool,
//! mutated in frames, written back by eviction or flush, and read again
//! from a fresh pool over a reopened file.

use basalt_buffer::{BufferPool, BufferPoolConfig, PageFile};
use basalt_common::PAGE_SIZE;
use basalt_storage::DbFile;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

fn small_pool(num_frames: usize) -> BufferPool {
    BufferPool::new(BufferPoolConfig { num_frames })
}

fn open_file(dir: &Path, name: &str, file_id: u32) -> Arc<dyn PageFile> {
    Arc::new(DbFile::open(dir.join(name), file_id, false).unwrap())
}

#[test]
fn test_flush_file_persists_pages() {
    let dir = tempdir().unwrap();
    let file = open_file(dir.path(), "flush.dat", 0);
    let mut pool = small_pool(8);

    let mut page_nos = Vec::new();
    for i in 0..5u8 {
        let (page_no, frame) = pool.allocate_page(&file).unwrap();
        pool.page_mut(frame)[0] = i;
        pool.page_mut(frame)[PAGE_SIZE - 1] = i;
        pool.unpin_page(&file, page_no, true).unwrap();
        page_nos.push(page_no);
    }

    assert_eq!(pool.flush_file(&file).unwrap(), 5);
    assert_eq!(pool.page_count(), 0);

    // Everything must now be readable from disk, bypassing the pool.
    let mut buf = [0u8; PAGE_SIZE];
    for (i, &page_no) in page_nos.iter().enumerate() {
        file.read_page(page_no, &mut buf).unwrap();
        assert_eq!(buf[0], i as u8);
        assert_eq!(buf[PAGE_SIZE - 1], i as u8);
    }
}

#[test]
fn test_eviction_writes_back_to_disk() {
    let dir = tempdir().unwrap();
    let file = open_file(dir.path(), "evict.dat", 0);

    // Pool much smaller than the working set, so most writes reach disk
    // through eviction rather than an explicit flush.
    let mut pool = small_pool(3);
    let num_pages = 12u8;

    for i in 0..num_pages {
        let (page_no, frame) = pool.allocate_page(&file).unwrap();
        assert_eq!(page_no as u8, i);
        pool.page_mut(frame).fill(i);
        pool.unpin_page(&file, page_no, true).unwrap();
    }

    pool.flush_file(&file).unwrap();

    let mut buf = [0u8; PAGE_SIZE];
    for i in 0..num_pages {
        file.read_page(i as u32, &mut buf).unwrap();
        assert!(buf.iter().all(|&b| b == i), "page {i} lost its contents");
    }
}

#[test]
fn test_fetch_after_reopen_sees_persisted_bytes() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("reopen.dat");
    let page_no;

    {
        let file: Arc<dyn PageFile> = Arc::new(DbFile::open(&path, 0, true).unwrap());
        let mut pool = small_pool(4);
        let (no, frame) = pool.allocate_page(&file).unwrap();
        page_no = no;
        pool.page_mut(frame)[100] = 0xB5;
        pool.unpin_page(&file, page_no, true).unwrap();
        pool.flush_file(&file).unwrap();
    }

    // Fresh pool, fresh file handle: the bytes must come from disk.
    let file: Arc<dyn PageFile> = Arc::new(DbFile::open(&path, 0, true).unwrap());
    let mut pool = small_pool(4);
    let frame = pool.fetch_page(&file, page_no).unwrap();
    assert_eq!(pool.page(frame)[100], 0xB5);
    pool.unpin_page(&file, page_no, false).unwrap();
}

#[test]
fn test_pool_drop_flushes_dirty_pages() {
    let dir = tempdir().unwrap();
    let file = open_file(dir.path(), "drop.dat", 0);

    {
        let mut pool = small_pool(4);
        let (page_no, frame) = pool.allocate_page(&file).unwrap();
        pool.page_mut(frame)[0] = 0x5D;
        pool.unpin_page(&file, page_no, true).unwrap();
        // No explicit flush; teardown must write the dirty frame back.
    }

    let mut buf = [0u8; PAGE_SIZE];
    file.read_page(0, &mut buf).unwrap();
    assert_eq!(buf[0], 0x5D);
}

#[test]
fn test_dispose_removes_page_from_disk() {
    let dir = tempdir().unwrap();
    let file = open_file(dir.path(), "dispose.dat", 0);
    let mut pool = small_pool(4);

    let (page_no, _) = pool.allocate_page(&file).unwrap();
    pool.unpin_page(&file, page_no, false).unwrap();
    pool.dispose_page(&file, page_no).unwrap();

    let mut buf = [0u8; PAGE_SIZE];
    assert!(file.read_page(page_no, &mut buf).is_err());
    assert!(pool.fetch_page(&file, page_no).is_err());
}

#[test]
fn test_two_files_flush_independently() {
    let dir = tempdir().unwrap();
    let first = open_file(dir.path(), "a.dat", 1);
    let second = open_file(dir.path(), "b.dat", 2);
    let mut pool = small_pool(8);

    let (p1, f1) = pool.allocate_page(&first).unwrap();
    pool.page_mut(f1)[0] = 0xA1;
    pool.unpin_page(&first, p1, true).unwrap();

    let (p2, f2) = pool.allocate_page(&second).unwrap();
    pool.page_mut(f2)[0] = 0xB2;
    pool.unpin_page(&second, p2, true).unwrap();

    assert_eq!(pool.flush_file(&first).unwrap(), 1);
    assert!(!pool.contains(&first, p1));
    assert!(pool.contains(&second, p2));

    let mut buf = [0u8; PAGE_SIZE];
    first.read_page(p1, &mut buf).unwrap();
    assert_eq!(buf[0], 0xA1);
}

#[test]
fn test_randomized_workload_matches_shadow_model() {
    let dir = tempdir().unwrap();
    let file = open_file(dir.path(), "random.dat", 0);
    let mut pool = small_pool(4);
    let mut rng = StdRng::seed_from_u64(0xBA5A17);

    let num_pages: u32 = 16;
    let mut shadow: HashMap<u32, u8> = HashMap::new();

    for _ in 0..num_pages {
        let (page_no, _) = pool.allocate_page(&file).unwrap();
        shadow.insert(page_no, 0);
        pool.unpin_page(&file, page_no, true).unwrap();
    }

    for round in 0..500 {
        let page_no = rng.gen_range(0..num_pages);
        let frame = pool.fetch_page(&file, page_no).unwrap();

        if rng.gen_bool(0.6) {
            let value: u8 = rng.gen();
            pool.page_mut(frame)[0] = value;
            shadow.insert(page_no, value);
            pool.unpin_page(&file, page_no, true).unwrap();
        } else {
            let expected = shadow[&page_no];
            assert_eq!(
                pool.page(frame)[0],
                expected,
                "page {page_no} diverged at round {round}"
            );
            pool.unpin_page(&file, page_no, false).unwrap();
        }

        if round % 97 == 0 {
            pool.flush_all().unwrap();
        }
    }

    // Drain the pool and check the on-disk state against the model.
    let resident = pool.page_count();
    assert_eq!(pool.flush_file(&file).unwrap(), resident);

    let mut buf = [0u8; PAGE_SIZE];
    for (&page_no, &value) in &shadow {
        file.read_page(page_no, &mut buf).unwrap();
        assert_eq!(buf[0], value, "page {page_no} wrong after final flush");
    }
}
