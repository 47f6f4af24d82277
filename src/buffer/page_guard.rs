use std::sync::Arc;

use log::warn;
use parking_lot::{RwLockReadGuard, RwLockWriteGuard};

use crate::common::{PageId, PAGE_SIZE};

use super::{BufferPoolManager, FrameHeader};

/// RAII guard over one pin of a page.
///
/// Dropping the guard unpins the page, passing the dirty flag set through
/// `mark_dirty`. Writing through `write` does not mark the page dirty on
/// its own.
pub struct PageGuard<'a> {
    bpm: &'a BufferPoolManager,
    /// The page ID being guarded
    page_id: PageId,
    /// Frame holding the page (kept pinned for the guard's lifetime)
    frame: Arc<FrameHeader>,
    /// Whether the page was marked dirty
    is_dirty: bool,
}

impl<'a> PageGuard<'a> {
    pub(crate) fn new(
        bpm: &'a BufferPoolManager,
        page_id: PageId,
        frame: Arc<FrameHeader>,
    ) -> Self {
        Self {
            bpm,
            page_id,
            frame,
            is_dirty: false,
        }
    }

    /// Returns the page ID.
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// Returns a read lock on the page data.
    pub fn read(&self) -> RwLockReadGuard<'_, Box<[u8; PAGE_SIZE]>> {
        self.frame.read_data()
    }

    /// Returns a write lock on the page data.
    pub fn write(&self) -> RwLockWriteGuard<'_, Box<[u8; PAGE_SIZE]>> {
        self.frame.write_data()
    }

    /// Marks the page dirty so it is written back before eviction.
    pub fn mark_dirty(&mut self) {
        self.is_dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }
}

impl Drop for PageGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.bpm.unpin_page(self.page_id, self.is_dirty) {
            warn!("failed to unpin {} on guard drop: {}", self.page_id, e);
        }
    }
}
