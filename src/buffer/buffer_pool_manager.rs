use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, trace};
use parking_lot::Mutex;

use crate::common::{FrameId, PageId, Result, SlotDbError, PAGE_SIZE};
use crate::storage::disk::DiskManager;

use super::{FrameHeader, PageGuard};

/// BufferPoolManager caches a fixed number of pages in memory.
///
/// Every successful `fetch_page` or `new_page` pins the returned frame once
/// and must be matched by exactly one `unpin_page`. Only frames with a pin
/// count of zero may be evicted.
///
/// Frames are chosen first-fit: the first empty frame in index order, else
/// the first unpinned frame in index order. This is not a recency policy;
/// callers must not rely on recently used pages staying resident.
pub struct BufferPoolManager {
    /// Number of frames in the buffer pool
    pool_size: usize,
    /// The buffer pool frames, indexed by frame ID
    frames: Vec<Arc<FrameHeader>>,
    /// Page table: maps resident page IDs to frame IDs
    page_table: Mutex<HashMap<PageId, FrameId>>,
    /// Backing page store
    disk_manager: Arc<DiskManager>,
}

impl BufferPoolManager {
    /// Creates a new BufferPoolManager with `pool_size` empty frames.
    pub fn new(pool_size: usize, disk_manager: Arc<DiskManager>) -> Self {
        let frames = (0..pool_size)
            .map(|i| Arc::new(FrameHeader::new(FrameId::new(i as u32))))
            .collect();

        Self {
            pool_size,
            frames,
            page_table: Mutex::new(HashMap::new()),
            disk_manager,
        }
    }

    /// Pins the page and returns its frame, reading it from disk on a miss.
    ///
    /// Fails with `BufferPoolFull` if every frame is pinned and with
    /// `PageDoesNotExist` if the page was never allocated.
    pub fn fetch_page(&self, page_id: PageId) -> Result<Arc<FrameHeader>> {
        let mut page_table = self.page_table.lock();

        if let Some(&frame_id) = page_table.get(&page_id) {
            let frame = &self.frames[frame_id.as_usize()];
            frame.pin();
            trace!("buffer pool hit for {} in {}", page_id, frame_id);
            return Ok(Arc::clone(frame));
        }

        debug!("buffer pool miss for {}, loading from disk", page_id);
        let frame_id = self.select_frame()?;
        self.evict(&mut page_table, frame_id)?;

        // The frame is empty now; it stays empty if the read fails.
        let mut data = [0u8; PAGE_SIZE];
        self.disk_manager.read_page(page_id, &mut data)?;

        let frame = &self.frames[frame_id.as_usize()];
        frame.install(page_id, &data);
        page_table.insert(page_id, frame_id);

        Ok(Arc::clone(frame))
    }

    /// Allocates a new zero-filled page on disk and pins it in a frame.
    ///
    /// The page ID is allocated before a frame is chosen, so a
    /// `BufferPoolFull` failure leaves an unused page in the file.
    pub fn new_page(&self) -> Result<(PageId, Arc<FrameHeader>)> {
        let mut page_table = self.page_table.lock();

        let page_id = self.disk_manager.allocate_page()?;
        let frame_id = self.select_frame()?;
        self.evict(&mut page_table, frame_id)?;

        let frame = &self.frames[frame_id.as_usize()];
        frame.install(page_id, &[0u8; PAGE_SIZE]);
        page_table.insert(page_id, frame_id);

        debug!("new page {} in {}", page_id, frame_id);
        Ok((page_id, Arc::clone(frame)))
    }

    /// Drops one pin on a resident page and ORs `is_dirty` into its dirty
    /// flag. Unpinning a page whose pin count is already zero is a no-op.
    pub fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> Result<()> {
        let page_table = self.page_table.lock();

        let frame_id = page_table
            .get(&page_id)
            .ok_or(SlotDbError::PageNotFound(page_id))?;
        let frame = &self.frames[frame_id.as_usize()];

        frame.unpin();
        if is_dirty {
            frame.set_dirty(true);
        }

        Ok(())
    }

    /// Writes a resident page to disk and clears its dirty flag, whether or
    /// not it is pinned.
    pub fn flush_page(&self, page_id: PageId) -> Result<()> {
        let page_table = self.page_table.lock();

        let frame_id = page_table
            .get(&page_id)
            .ok_or(SlotDbError::PageNotFound(page_id))?;
        self.write_back(&self.frames[frame_id.as_usize()])
    }

    /// Writes every dirty resident page to disk.
    pub fn flush_all_pages(&self) -> Result<()> {
        let page_table = self.page_table.lock();

        for &frame_id in page_table.values() {
            let frame = &self.frames[frame_id.as_usize()];
            if frame.is_dirty() {
                self.write_back(frame)?;
            }
        }

        debug!("flushed all dirty pages");
        Ok(())
    }

    /// Fetches a page wrapped in a guard that unpins it when dropped.
    pub fn fetch_page_guard(&self, page_id: PageId) -> Result<PageGuard<'_>> {
        let frame = self.fetch_page(page_id)?;
        Ok(PageGuard::new(self, page_id, frame))
    }

    /// Creates a new page wrapped in a guard that unpins it when dropped.
    pub fn new_page_guard(&self) -> Result<PageGuard<'_>> {
        let (page_id, frame) = self.new_page()?;
        Ok(PageGuard::new(self, page_id, frame))
    }

    /// Returns the pin count for a resident page.
    pub fn pin_count(&self, page_id: PageId) -> Option<u32> {
        self.resident_frame(page_id).map(|frame| frame.pin_count())
    }

    /// Returns the dirty flag for a resident page.
    pub fn is_dirty(&self, page_id: PageId) -> Option<bool> {
        self.resident_frame(page_id).map(|frame| frame.is_dirty())
    }

    /// Returns the frame currently holding a page.
    pub fn frame_of(&self, page_id: PageId) -> Option<FrameId> {
        self.page_table.lock().get(&page_id).copied()
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Returns the number of frames holding no page.
    pub fn free_frame_count(&self) -> usize {
        self.frames.iter().filter(|frame| frame.is_empty()).count()
    }

    pub fn disk_manager(&self) -> &Arc<DiskManager> {
        &self.disk_manager
    }

    fn resident_frame(&self, page_id: PageId) -> Option<&Arc<FrameHeader>> {
        let page_table = self.page_table.lock();
        page_table
            .get(&page_id)
            .map(|frame_id| &self.frames[frame_id.as_usize()])
    }

    /// Picks the first empty frame, else the first unpinned frame.
    /// Callers must hold the page table lock.
    fn select_frame(&self) -> Result<FrameId> {
        self.frames
            .iter()
            .find(|frame| frame.is_empty())
            .or_else(|| self.frames.iter().find(|frame| frame.pin_count() == 0))
            .map(|frame| frame.frame_id())
            .ok_or(SlotDbError::BufferPoolFull)
    }

    /// Empties a frame chosen by `select_frame`, writing its page back first
    /// if dirty. On a failed write-back the frame is left untouched.
    fn evict(&self, page_table: &mut HashMap<PageId, FrameId>, frame_id: FrameId) -> Result<()> {
        let frame = &self.frames[frame_id.as_usize()];
        if frame.is_empty() {
            return Ok(());
        }

        let old_page_id = frame.page_id();
        if frame.is_dirty() {
            debug!("writing back dirty {} before eviction", old_page_id);
            self.write_back(frame)?;
        }

        page_table.remove(&old_page_id);
        frame.reset();

        debug!("evicted {} from {}", old_page_id, frame_id);
        Ok(())
    }

    fn write_back(&self, frame: &FrameHeader) -> Result<()> {
        {
            let data = frame.read_data();
            self.disk_manager.write_page(frame.page_id(), &data[..])?;
        }
        frame.set_dirty(false);
        Ok(())
    }
}
