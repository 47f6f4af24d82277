use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::common::{FrameId, PageId, INVALID_PAGE_ID, PAGE_SIZE};

/// FrameHeader manages a single buffer frame in the buffer pool.
/// It stores metadata about the frame and the actual page data.
///
/// A frame is empty while its page ID is `INVALID_PAGE_ID`.
pub struct FrameHeader {
    /// The frame ID (index in the buffer pool)
    frame_id: FrameId,
    /// The page ID stored in this frame
    page_id: RwLock<PageId>,
    /// Number of outstanding pins on this frame
    pin_count: AtomicU32,
    /// Whether the page has been modified since it was last written to disk
    is_dirty: AtomicBool,
    /// The page bytes
    data: RwLock<Box<[u8; PAGE_SIZE]>>,
}

impl FrameHeader {
    /// Creates a new empty FrameHeader for the given frame ID.
    pub fn new(frame_id: FrameId) -> Self {
        Self {
            frame_id,
            page_id: RwLock::new(INVALID_PAGE_ID),
            pin_count: AtomicU32::new(0),
            is_dirty: AtomicBool::new(false),
            data: RwLock::new(Box::new([0u8; PAGE_SIZE])),
        }
    }

    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    /// Returns the page ID stored in this frame.
    pub fn page_id(&self) -> PageId {
        *self.page_id.read()
    }

    /// Returns whether the frame holds no page.
    pub fn is_empty(&self) -> bool {
        self.page_id() == INVALID_PAGE_ID
    }

    pub fn pin_count(&self) -> u32 {
        self.pin_count.load(Ordering::Acquire)
    }

    /// Increments the pin count and returns the new value.
    pub fn pin(&self) -> u32 {
        self.pin_count.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Decrements the pin count and returns the new value.
    /// Returns None if the pin count was already 0.
    pub fn unpin(&self) -> Option<u32> {
        self.pin_count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                current.checked_sub(1)
            })
            .ok()
            .map(|previous| previous - 1)
    }

    pub fn is_dirty(&self) -> bool {
        self.is_dirty.load(Ordering::Acquire)
    }

    pub fn set_dirty(&self, dirty: bool) {
        self.is_dirty.store(dirty, Ordering::Release);
    }

    /// Returns a read guard to the page data.
    pub fn read_data(&self) -> RwLockReadGuard<'_, Box<[u8; PAGE_SIZE]>> {
        self.data.read()
    }

    /// Returns a write guard to the page data.
    pub fn write_data(&self) -> RwLockWriteGuard<'_, Box<[u8; PAGE_SIZE]>> {
        self.data.write()
    }

    /// Installs a page in this frame: pinned once, clean, holding `data`.
    pub(crate) fn install(&self, page_id: PageId, data: &[u8; PAGE_SIZE]) {
        self.data.write().copy_from_slice(data);
        *self.page_id.write() = page_id;
        self.pin_count.store(1, Ordering::Release);
        self.is_dirty.store(false, Ordering::Release);
    }

    /// Resets the frame to its empty state.
    pub(crate) fn reset(&self) {
        *self.page_id.write() = INVALID_PAGE_ID;
        self.pin_count.store(0, Ordering::Release);
        self.is_dirty.store(false, Ordering::Release);
        self.data.write().fill(0);
    }
}
