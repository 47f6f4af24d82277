//! Integration tests for the disk manager

use std::sync::Arc;
use std::thread;

use slotdb::common::{PageId, SlotDbError, PAGE_SIZE};
use slotdb::storage::disk::DiskManager;
use tempfile::NamedTempFile;

#[test]
fn test_disk_manager_create_file() {
    let temp_file = NamedTempFile::new().unwrap();
    let dm = DiskManager::new(temp_file.path()).unwrap();

    assert_eq!(dm.num_pages(), 0);
    assert_eq!(dm.num_reads(), 0);
    assert_eq!(dm.num_writes(), 0);
}

#[test]
fn test_disk_manager_allocate_pages() {
    let temp_file = NamedTempFile::new().unwrap();
    let dm = DiskManager::new(temp_file.path()).unwrap();

    for i in 0..10 {
        let page_id = dm.allocate_page().unwrap();
        assert_eq!(page_id, PageId::new(i));
    }

    assert_eq!(dm.num_pages(), 10);

    // Fresh pages read back as zeros
    let mut data = [0xAAu8; PAGE_SIZE];
    dm.read_page(PageId::new(9), &mut data).unwrap();
    assert!(data.iter().all(|&b| b == 0));
}

#[test]
fn test_disk_manager_read_write_page() {
    let temp_file = NamedTempFile::new().unwrap();
    let dm = DiskManager::new(temp_file.path()).unwrap();

    let page_id = dm.allocate_page().unwrap();

    // Write pattern
    let mut write_data = [0u8; PAGE_SIZE];
    for (i, byte) in write_data.iter_mut().enumerate() {
        *byte = (i % 256) as u8;
    }
    dm.write_page(page_id, &write_data).unwrap();

    // Read back
    let mut read_data = [0u8; PAGE_SIZE];
    dm.read_page(page_id, &mut read_data).unwrap();

    assert_eq!(write_data, read_data);
}

#[test]
fn test_disk_manager_random_access() {
    let temp_file = NamedTempFile::new().unwrap();
    let dm = DiskManager::new(temp_file.path()).unwrap();

    let page_ids: Vec<_> = (0..10).map(|_| dm.allocate_page().unwrap()).collect();

    // Write to pages out of order
    let write_order = [5, 2, 8, 0, 7, 3, 9, 1, 6, 4];
    for &i in &write_order {
        let mut data = [0u8; PAGE_SIZE];
        data[0] = i as u8;
        dm.write_page(page_ids[i], &data).unwrap();
    }

    for (i, &page_id) in page_ids.iter().enumerate() {
        let mut data = [0u8; PAGE_SIZE];
        dm.read_page(page_id, &mut data).unwrap();
        assert_eq!(data[0], i as u8);
    }
}

#[test]
fn test_disk_manager_page_does_not_exist() {
    let temp_file = NamedTempFile::new().unwrap();
    let dm = DiskManager::new(temp_file.path()).unwrap();
    dm.allocate_page().unwrap();

    let mut data = [0u8; PAGE_SIZE];
    assert!(matches!(
        dm.read_page(PageId::new(1), &mut data),
        Err(SlotDbError::PageDoesNotExist(p)) if p == PageId::new(1)
    ));
    assert_eq!(dm.num_reads(), 0);
}

#[test]
fn test_disk_manager_rejects_wrong_buffer_size() {
    let temp_file = NamedTempFile::new().unwrap();
    let dm = DiskManager::new(temp_file.path()).unwrap();
    let page_id = dm.allocate_page().unwrap();

    let mut small = vec![0u8; PAGE_SIZE - 1];
    assert!(matches!(
        dm.read_page(page_id, &mut small),
        Err(SlotDbError::InvalidPageDataSize { .. })
    ));

    let large = vec![0u8; PAGE_SIZE + 1];
    assert!(matches!(
        dm.write_page(page_id, &large),
        Err(SlotDbError::InvalidPageDataSize { .. })
    ));
}

#[test]
fn test_disk_manager_persistence() {
    let temp_file = NamedTempFile::new().unwrap();
    let path = temp_file.path().to_path_buf();

    let test_data = b"Persistence test";

    {
        let dm = DiskManager::new(&path).unwrap();
        dm.allocate_page().unwrap();
        let page_id = dm.allocate_page().unwrap();

        let mut data = [0u8; PAGE_SIZE];
        data[..test_data.len()].copy_from_slice(test_data);
        dm.write_page(page_id, &data).unwrap();
        dm.sync().unwrap();
    }

    // Read back with a new DiskManager
    {
        let dm = DiskManager::new(&path).unwrap();
        assert_eq!(dm.num_pages(), 2);

        let mut data = [0u8; PAGE_SIZE];
        dm.read_page(PageId::new(1), &mut data).unwrap();
        assert_eq!(&data[..test_data.len()], test_data);

        // Allocation continues after the existing pages
        assert_eq!(dm.allocate_page().unwrap(), PageId::new(2));
    }
}

#[test]
fn test_disk_manager_concurrent_allocation() {
    let temp_file = NamedTempFile::new().unwrap();
    let dm = Arc::new(DiskManager::new(temp_file.path()).unwrap());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let dm = Arc::clone(&dm);
            thread::spawn(move || {
                (0..10)
                    .map(|_| dm.allocate_page().unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut ids: Vec<u32> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .map(|p| p.as_u32())
        .collect();
    ids.sort_unstable();

    assert_eq!(ids, (0..40).collect::<Vec<_>>());
    assert_eq!(dm.num_pages(), 40);
}

#[test]
fn test_disk_manager_concurrent_read_write() {
    let temp_file = NamedTempFile::new().unwrap();
    let dm = Arc::new(DiskManager::new(temp_file.path()).unwrap());

    let page_ids: Vec<_> = (0..8).map(|_| dm.allocate_page().unwrap()).collect();

    let handles: Vec<_> = page_ids
        .iter()
        .map(|&page_id| {
            let dm = Arc::clone(&dm);
            thread::spawn(move || {
                let mut data = [0u8; PAGE_SIZE];
                data[0] = page_id.as_u32() as u8;
                data[PAGE_SIZE - 1] = 0xFF;
                dm.write_page(page_id, &data).unwrap();

                let mut read_back = [0u8; PAGE_SIZE];
                dm.read_page(page_id, &mut read_back).unwrap();
                assert_eq!(read_back, data);
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(dm.num_reads(), 8);
}
