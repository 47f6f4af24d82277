use std::collections::HashSet;
use std::sync::Arc;

use log::debug;

use crate::buffer::BufferPoolManager;
use crate::common::{PageId, RecordId, Result, SlotDbError};
use crate::storage::page::{SlottedPage, SlottedPageRef, MAX_TUPLE_SIZE};

use super::TableIterator;

/// An unordered collection of tuples stored in a doubly linked chain of
/// slotted pages.
///
/// Tuples are appended to the last page of the chain; when it is full a new
/// page is linked after it. Deleted slots are never reused.
pub struct TableHeap {
    bpm: Arc<BufferPoolManager>,
    first_page_id: PageId,
    last_page_id: PageId,
}

impl TableHeap {
    /// Creates a heap with a single empty page.
    pub fn new(bpm: Arc<BufferPoolManager>) -> Result<Self> {
        let first_page_id = {
            let mut guard = bpm.new_page_guard()?;
            let page_id = guard.page_id();
            check_linkable(page_id)?;

            SlottedPage::new(&mut guard.write()[..]).init();
            guard.mark_dirty();
            page_id
        };

        debug!("created table heap at {}", first_page_id);
        Ok(Self {
            bpm,
            first_page_id,
            last_page_id: first_page_id,
        })
    }

    /// Reattaches to an existing chain starting at `first_page_id`, following
    /// next links to find the last page.
    pub fn open(bpm: Arc<BufferPoolManager>, first_page_id: PageId) -> Result<Self> {
        let mut last_page_id = first_page_id;
        let mut visited = HashSet::from([first_page_id]);
        loop {
            let guard = bpm.fetch_page_guard(last_page_id)?;
            let data = guard.read();
            match SlottedPageRef::new(&data[..]).next_page_id() {
                Some(next) if !visited.insert(next) => {
                    return Err(SlotDbError::PageChainCycle(next));
                }
                Some(next) => last_page_id = next,
                None => break,
            }
        }

        debug!("opened table heap {} .. {}", first_page_id, last_page_id);
        Ok(Self {
            bpm,
            first_page_id,
            last_page_id,
        })
    }

    pub fn first_page_id(&self) -> PageId {
        self.first_page_id
    }

    pub fn last_page_id(&self) -> PageId {
        self.last_page_id
    }

    /// Appends a tuple and returns its record ID.
    ///
    /// Tuples larger than `MAX_TUPLE_SIZE` are rejected before any page is
    /// touched. On failure every page pinned by the call has been unpinned.
    pub fn insert(&mut self, tuple: &[u8]) -> Result<RecordId> {
        if tuple.is_empty() {
            return Err(SlotDbError::EmptyTuple);
        }
        if tuple.len() > MAX_TUPLE_SIZE {
            return Err(SlotDbError::TupleTooLarge {
                size: tuple.len(),
                max: MAX_TUPLE_SIZE,
            });
        }

        {
            let mut guard = self.bpm.fetch_page_guard(self.last_page_id)?;
            let inserted = {
                let mut data = guard.write();
                let mut page = SlottedPage::new(&mut data[..]);
                if page.can_insert(tuple.len()) {
                    Some(page.insert_tuple(tuple)?)
                } else {
                    None
                }
            };

            if let Some(slot_id) = inserted {
                guard.mark_dirty();
                return Ok(RecordId::new(self.last_page_id, slot_id));
            }
        }

        self.insert_into_new_page(tuple)
    }

    /// Returns a copy of the tuple stored at `rid`.
    pub fn get(&self, rid: RecordId) -> Result<Vec<u8>> {
        let guard = self.bpm.fetch_page_guard(rid.page_id)?;
        let data = guard.read();
        let tuple = SlottedPageRef::new(&data[..]).get_tuple(rid.slot_id)?;
        Ok(tuple.to_vec())
    }

    /// Tombstones the tuple at `rid`. Its slot is never reused.
    pub fn delete(&self, rid: RecordId) -> Result<()> {
        let mut guard = self.bpm.fetch_page_guard(rid.page_id)?;
        SlottedPage::new(&mut guard.write()[..]).delete_tuple(rid.slot_id)?;
        guard.mark_dirty();
        Ok(())
    }

    /// Returns a forward cursor over live tuples in chain order.
    pub fn scan(&self) -> TableIterator {
        TableIterator::new(Arc::clone(&self.bpm), self.first_page_id)
    }

    /// Starts a new page holding `tuple`, then links it after the current
    /// last page. The new page is unpinned before the old tail is fetched,
    /// so this needs only one free frame.
    fn insert_into_new_page(&mut self, tuple: &[u8]) -> Result<RecordId> {
        let old_last_page_id = self.last_page_id;

        let (new_page_id, slot_id) = {
            let mut guard = self.bpm.new_page_guard()?;
            let page_id = guard.page_id();
            check_linkable(page_id)?;

            let slot_id = {
                let mut data = guard.write();
                let mut page = SlottedPage::new(&mut data[..]);
                page.init();
                page.set_prev_page_id(Some(old_last_page_id))?;
                page.insert_tuple(tuple)?
            };
            guard.mark_dirty();
            (page_id, slot_id)
        };

        {
            let mut guard = self.bpm.fetch_page_guard(old_last_page_id)?;
            SlottedPage::new(&mut guard.write()[..]).set_next_page_id(Some(new_page_id))?;
            guard.mark_dirty();
        }

        self.last_page_id = new_page_id;
        debug!("table heap grew: linked {} after {}", new_page_id, old_last_page_id);

        Ok(RecordId::new(new_page_id, slot_id))
    }
}

/// Heap pages must be addressable by the 16-bit page links.
fn check_linkable(page_id: PageId) -> Result<()> {
    page_id
        .to_link()
        .map(|_| ())
        .ok_or(SlotDbError::PageIdOutOfRange(page_id))
}
