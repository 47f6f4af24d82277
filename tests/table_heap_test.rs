//! Integration tests for the table heap

use std::collections::HashSet;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use slotdb::buffer::BufferPoolManager;
use slotdb::common::{PageId, RecordId, SlotDbError, PAGE_SIZE};
use slotdb::storage::disk::DiskManager;
use slotdb::storage::page::{SlottedPage, SlottedPageRef};
use slotdb::table::TableHeap;
use tempfile::NamedTempFile;

fn create_bpm(pool_size: usize) -> (Arc<BufferPoolManager>, NamedTempFile) {
    let temp_file = NamedTempFile::new().unwrap();
    let disk_manager = Arc::new(DiskManager::new(temp_file.path()).unwrap());
    let bpm = Arc::new(BufferPoolManager::new(pool_size, disk_manager));
    (bpm, temp_file)
}

/// A 200-byte tuple whose first four bytes hold `i`.
fn numbered_tuple(i: u32) -> Vec<u8> {
    let mut tuple = vec![(i % 251) as u8; 200];
    tuple[..4].copy_from_slice(&i.to_le_bytes());
    tuple
}

fn scan_all(heap: &TableHeap) -> Vec<(RecordId, Vec<u8>)> {
    heap.scan().collect::<Result<Vec<_>, _>>().unwrap()
}

#[test]
fn test_table_heap_hundred_rows_with_delete() {
    let (bpm, _temp) = create_bpm(10);
    let mut heap = TableHeap::new(Arc::clone(&bpm)).unwrap();

    let rids: Vec<_> = (0..100)
        .map(|i| heap.insert(&numbered_tuple(i)).unwrap())
        .collect();

    assert_ne!(heap.first_page_id(), heap.last_page_id());
    assert_eq!(scan_all(&heap).len(), 100);

    let victim = rids[42];
    heap.delete(victim).unwrap();

    let rows = scan_all(&heap);
    assert_eq!(rows.len(), 99);
    assert!(rows.iter().all(|(rid, _)| *rid != victim));
    assert!(matches!(heap.get(victim), Err(SlotDbError::TupleDeleted(_))));
}

#[test]
fn test_table_heap_scan_preserves_insertion_order() {
    let (bpm, _temp) = create_bpm(4);
    let mut heap = TableHeap::new(Arc::clone(&bpm)).unwrap();

    let rids: Vec<_> = (0..60)
        .map(|i| heap.insert(&numbered_tuple(i)).unwrap())
        .collect();

    let rows = scan_all(&heap);
    let scanned_rids: Vec<_> = rows.iter().map(|(rid, _)| *rid).collect();
    assert_eq!(scanned_rids, rids);

    for (i, (_, tuple)) in rows.iter().enumerate() {
        assert_eq!(tuple, &numbered_tuple(i as u32));
    }

    let pages: HashSet<PageId> = rids.iter().map(|rid| rid.page_id).collect();
    assert!(pages.len() >= 3);
}

#[test]
fn test_table_heap_chain_survives_reopen() {
    let temp_file = NamedTempFile::new().unwrap();
    let path = temp_file.path().to_path_buf();

    let (first_page_id, last_page_id, rids) = {
        let dm = Arc::new(DiskManager::new(&path).unwrap());
        let bpm = Arc::new(BufferPoolManager::new(3, dm));
        let mut heap = TableHeap::new(Arc::clone(&bpm)).unwrap();

        let rids: Vec<_> = (0..80)
            .map(|i| heap.insert(&numbered_tuple(i)).unwrap())
            .collect();
        heap.delete(rids[0]).unwrap();

        bpm.flush_all_pages().unwrap();
        (heap.first_page_id(), heap.last_page_id(), rids)
    };

    let dm = Arc::new(DiskManager::new(&path).unwrap());
    let bpm = Arc::new(BufferPoolManager::new(3, dm));
    let heap = TableHeap::open(Arc::clone(&bpm), first_page_id).unwrap();

    assert_eq!(heap.last_page_id(), last_page_id);

    let rows = scan_all(&heap);
    assert_eq!(rows.len(), 79);
    for ((rid, tuple), (i, expected_rid)) in rows.iter().zip(rids.iter().enumerate().skip(1)) {
        assert_eq!(rid, expected_rid);
        assert_eq!(tuple, &numbered_tuple(i as u32));
    }
    assert!(matches!(heap.get(rids[0]), Err(SlotDbError::TupleDeleted(_))));
}

#[test]
fn test_table_heap_pages_are_doubly_linked() {
    let (bpm, _temp) = create_bpm(4);
    let mut heap = TableHeap::new(Arc::clone(&bpm)).unwrap();

    for i in 0..50 {
        heap.insert(&numbered_tuple(i)).unwrap();
    }

    let mut prev = None;
    let mut current = Some(heap.first_page_id());
    let mut visited = 0;
    while let Some(page_id) = current {
        let guard = bpm.fetch_page_guard(page_id).unwrap();
        let data = guard.read();
        let page = SlottedPageRef::new(&data[..]);

        assert_eq!(page.prev_page_id(), prev);
        prev = Some(page_id);
        current = page.next_page_id();
        visited += 1;
    }

    assert_eq!(prev, Some(heap.last_page_id()));
    assert_eq!(visited, 3);
}

#[test]
fn test_table_heap_works_with_single_frame() {
    let (bpm, _temp) = create_bpm(1);
    let mut heap = TableHeap::new(Arc::clone(&bpm)).unwrap();

    let rids: Vec<_> = (0..45)
        .map(|i| heap.insert(&numbered_tuple(i)).unwrap())
        .collect();

    assert_eq!(scan_all(&heap).len(), 45);
    for (i, &rid) in rids.iter().enumerate() {
        assert_eq!(heap.get(rid).unwrap(), numbered_tuple(i as u32));
    }
    assert_eq!(bpm.free_frame_count(), 0);
    assert_eq!(bpm.pin_count(heap.last_page_id()), Some(0));
}

#[test]
fn test_table_heap_leaves_nothing_pinned() {
    let (bpm, _temp) = create_bpm(3);
    let mut heap = TableHeap::new(Arc::clone(&bpm)).unwrap();

    let rids: Vec<_> = (0..40)
        .map(|i| heap.insert(&numbered_tuple(i)).unwrap())
        .collect();
    heap.delete(rids[1]).unwrap();
    let _ = heap.delete(rids[1]);
    let _ = heap.get(rids[1]);
    scan_all(&heap);

    for page in 0..bpm.disk_manager().num_pages() {
        assert_eq!(bpm.pin_count(PageId::new(page)).unwrap_or(0), 0);
    }
    // Every frame can still be claimed
    assert!(bpm.new_page().is_ok());
}

#[test]
fn test_table_heap_random_payloads() {
    let (bpm, _temp) = create_bpm(4);
    let mut heap = TableHeap::new(Arc::clone(&bpm)).unwrap();
    let mut rng = StdRng::seed_from_u64(42);

    let mut expected = Vec::new();
    for _ in 0..40 {
        let len = rng.gen_range(1..=1500);
        let mut payload = vec![0u8; len];
        rng.fill(&mut payload[..]);
        let rid = heap.insert(&payload).unwrap();
        expected.push((rid, payload));
    }

    assert_eq!(scan_all(&heap), expected);
}

#[test]
fn test_table_heap_rejects_unlinkable_page() {
    let temp_file = NamedTempFile::new().unwrap();
    // Sparse file whose next allocation would be page 0xFFFF
    temp_file
        .as_file()
        .set_len(0xFFFF * PAGE_SIZE as u64)
        .unwrap();

    let dm = Arc::new(DiskManager::new(temp_file.path()).unwrap());
    let bpm = Arc::new(BufferPoolManager::new(2, dm));

    assert!(matches!(
        TableHeap::new(Arc::clone(&bpm)),
        Err(SlotDbError::PageIdOutOfRange(p)) if p == PageId::new(0xFFFF)
    ));
    assert_eq!(bpm.pin_count(PageId::new(0xFFFF)), Some(0));
}

#[test]
fn test_table_heap_open_rejects_cyclic_chain() {
    let (bpm, _temp) = create_bpm(2);
    // A zero-filled page links to page 0, i.e. itself
    let page_id = bpm.disk_manager().allocate_page().unwrap();
    assert_eq!(page_id, PageId::new(0));

    assert!(matches!(
        TableHeap::open(Arc::clone(&bpm), page_id),
        Err(SlotDbError::PageChainCycle(p)) if p == page_id
    ));
    assert_eq!(bpm.pin_count(page_id), Some(0));
}

#[test]
fn test_table_heap_open_rejects_two_page_loop() {
    let (bpm, _temp) = create_bpm(3);
    let mut heap = TableHeap::new(Arc::clone(&bpm)).unwrap();
    while heap.first_page_id() == heap.last_page_id() {
        heap.insert(&numbered_tuple(0)).unwrap();
    }

    {
        let mut guard = bpm.fetch_page_guard(heap.last_page_id()).unwrap();
        SlottedPage::new(&mut guard.write()[..])
            .set_next_page_id(Some(heap.first_page_id()))
            .unwrap();
        guard.mark_dirty();
    }

    assert!(matches!(
        TableHeap::open(Arc::clone(&bpm), heap.first_page_id()),
        Err(SlotDbError::PageChainCycle(p)) if p == heap.first_page_id()
    ));

    let mut rows = heap.scan();
    let mut scanned = 0;
    let err = loop {
        match rows.next() {
            Ok(Some(_)) => scanned += 1,
            Ok(None) => panic!("scan ended without reporting the loop"),
            Err(e) => break e,
        }
    };
    assert!(matches!(err, SlotDbError::PageChainCycle(p) if p == heap.first_page_id()));
    assert!(scanned > 0);
    assert!(rows.next().unwrap().is_none());
}

#[test]
fn test_table_heap_scan_reports_corrupt_slot() {
    let (bpm, _temp) = create_bpm(2);
    let mut heap = TableHeap::new(Arc::clone(&bpm)).unwrap();
    let rid = heap.insert(b"row").unwrap();

    {
        let mut guard = bpm.fetch_page_guard(rid.page_id).unwrap();
        {
            let mut data = guard.write();
            data[8..10].copy_from_slice(&4000u16.to_le_bytes());
            data[10..12].copy_from_slice(&500u16.to_le_bytes());
        }
        guard.mark_dirty();
    }

    assert!(matches!(heap.get(rid), Err(SlotDbError::CorruptSlot(_))));

    let mut rows = heap.scan();
    assert!(matches!(rows.next(), Err(SlotDbError::CorruptSlot(_))));
    assert!(rows.next().unwrap().is_none());
    assert_eq!(bpm.pin_count(rid.page_id), Some(0));
}
