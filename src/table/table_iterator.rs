use std::collections::HashSet;
use std::sync::Arc;

use log::trace;

use crate::buffer::BufferPoolManager;
use crate::common::{PageId, RecordId, Result, SlotDbError, SlotId};
use crate::storage::page::SlottedPageRef;

/// Forward cursor over the live tuples of a table heap.
///
/// Each step pins the current page only for the duration of the call, so
/// the heap may be modified between steps. A chain that links back to an
/// already scanned page is reported as an error. After an error the cursor
/// is exhausted.
pub struct TableIterator {
    bpm: Arc<BufferPoolManager>,
    current_page_id: Option<PageId>,
    current_slot: u16,
    visited: HashSet<PageId>,
    done: bool,
}

impl TableIterator {
    pub fn new(bpm: Arc<BufferPoolManager>, first_page_id: PageId) -> Self {
        Self {
            bpm,
            current_page_id: Some(first_page_id),
            current_slot: 0,
            visited: HashSet::from([first_page_id]),
            done: false,
        }
    }

    pub fn next(&mut self) -> Result<Option<(RecordId, Vec<u8>)>> {
        if self.done {
            return Ok(None);
        }

        let result = self.advance();
        if !matches!(result, Ok(Some(_))) {
            self.done = true;
        }
        result
    }

    fn advance(&mut self) -> Result<Option<(RecordId, Vec<u8>)>> {
        while let Some(page_id) = self.current_page_id {
            let next_page = {
                let guard = self.bpm.fetch_page_guard(page_id)?;
                let data = guard.read();
                let page = SlottedPageRef::new(&data[..]);

                while self.current_slot < page.num_slots() {
                    let slot_id = SlotId::new(self.current_slot);
                    self.current_slot += 1;

                    let deleted = page.slot(slot_id).map_or(true, |slot| slot.is_deleted());
                    if deleted {
                        trace!("scan skipping deleted slot {} on {}", slot_id, page_id);
                        continue;
                    }

                    let tuple = page.get_tuple(slot_id)?.to_vec();
                    trace!("scan yielding {} on {}", slot_id, page_id);
                    return Ok(Some((RecordId::new(page_id, slot_id), tuple)));
                }

                page.next_page_id()
            };

            if let Some(next) = next_page {
                if !self.visited.insert(next) {
                    return Err(SlotDbError::PageChainCycle(next));
                }
            }
            self.current_page_id = next_page;
            self.current_slot = 0;
        }

        Ok(None)
    }
}

impl Iterator for TableIterator {
    type Item = Result<(RecordId, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        match TableIterator::next(self) {
            Ok(Some(item)) => Some(Ok(item)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}
