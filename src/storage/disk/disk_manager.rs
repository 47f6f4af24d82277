use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};

use log::debug;
use parking_lot::Mutex;

use crate::common::{PageId, Result, SlotDbError, PAGE_SIZE};

/// DiskManager is responsible for reading and writing pages to/from disk.
/// It manages a single database file in which page `i` lives at byte offset
/// `i * PAGE_SIZE`. Page IDs are allocated densely starting at 0 and are
/// never deallocated.
///
/// Every write and allocation is synced to storage before returning.
pub struct DiskManager {
    /// The database file
    db_file: Mutex<File>,
    /// Path to the database file
    db_path: PathBuf,
    /// Number of pages currently allocated
    num_pages: AtomicU32,
    /// Number of page reads performed
    num_reads: AtomicU32,
    /// Number of page writes performed (allocations included)
    num_writes: AtomicU32,
}

impl DiskManager {
    /// Opens the database file at the given path, creating it if it doesn't
    /// exist. The page count is derived from the file length.
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&db_path)?;

        let file_size = file.metadata()?.len();
        let num_pages = (file_size / PAGE_SIZE as u64) as u32;

        debug!("opened {} with {} pages", db_path.display(), num_pages);

        Ok(Self {
            db_file: Mutex::new(file),
            db_path,
            num_pages: AtomicU32::new(num_pages),
            num_reads: AtomicU32::new(0),
            num_writes: AtomicU32::new(0),
        })
    }

    /// Reads a page from disk into the provided buffer.
    /// The buffer must be exactly PAGE_SIZE bytes.
    pub fn read_page(&self, page_id: PageId, data: &mut [u8]) -> Result<()> {
        self.check_allocated(page_id)?;
        check_page_size(data.len())?;

        let mut file = self.db_file.lock();
        file.seek(SeekFrom::Start(page_offset(page_id)))?;

        let mut read = 0;
        while read < PAGE_SIZE {
            match file.read(&mut data[read..]) {
                Ok(0) => break,
                Ok(n) => read += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        if read < PAGE_SIZE {
            return Err(SlotDbError::IncompleteRead { page_id, read });
        }

        self.num_reads.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Writes a page to disk from the provided buffer and syncs the file.
    /// The buffer must be exactly PAGE_SIZE bytes.
    pub fn write_page(&self, page_id: PageId, data: &[u8]) -> Result<()> {
        self.check_allocated(page_id)?;
        check_page_size(data.len())?;

        let mut file = self.db_file.lock();
        write_at(&mut file, page_id, data)?;

        self.num_writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Allocates a new zero-filled page at the end of the file and returns
    /// its page ID.
    pub fn allocate_page(&self) -> Result<PageId> {
        // The file lock serializes allocations, so the counter is only
        // bumped once the page is durably on disk.
        let mut file = self.db_file.lock();
        let page_id = PageId::new(self.num_pages.load(Ordering::SeqCst));

        let zeros = [0u8; PAGE_SIZE];
        write_at(&mut file, page_id, &zeros)?;

        self.num_pages.fetch_add(1, Ordering::SeqCst);
        self.num_writes.fetch_add(1, Ordering::Relaxed);

        debug!("allocated {}", page_id);
        Ok(page_id)
    }

    /// Returns the number of pages currently allocated.
    pub fn num_pages(&self) -> u32 {
        self.num_pages.load(Ordering::SeqCst)
    }

    /// Returns the number of page reads performed.
    pub fn num_reads(&self) -> u32 {
        self.num_reads.load(Ordering::Relaxed)
    }

    /// Returns the number of page writes performed.
    pub fn num_writes(&self) -> u32 {
        self.num_writes.load(Ordering::Relaxed)
    }

    /// Returns the path to the database file.
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Flushes any buffered writes to disk.
    pub fn sync(&self) -> Result<()> {
        self.db_file.lock().sync_all()?;
        Ok(())
    }

    fn check_allocated(&self, page_id: PageId) -> Result<()> {
        if page_id.as_u32() >= self.num_pages() {
            return Err(SlotDbError::PageDoesNotExist(page_id));
        }
        Ok(())
    }
}

impl Drop for DiskManager {
    fn drop(&mut self) {
        let file = self.db_file.get_mut();
        let _ = file.sync_all();
    }
}

fn page_offset(page_id: PageId) -> u64 {
    (page_id.as_u32() as u64) * (PAGE_SIZE as u64)
}

fn check_page_size(len: usize) -> Result<()> {
    if len != PAGE_SIZE {
        return Err(SlotDbError::InvalidPageDataSize {
            expected: PAGE_SIZE,
            actual: len,
        });
    }
    Ok(())
}

fn write_at(file: &mut File, page_id: PageId, data: &[u8]) -> Result<()> {
    file.seek(SeekFrom::Start(page_offset(page_id)))?;
    file.write_all(data)?;
    file.sync_data()?;
    Ok(())
}
