//! slotdb - a disk-oriented storage engine built on slotted pages
//!
//! This crate stores variable-length tuples in fixed-size pages on disk and
//! caches those pages in a fixed pool of in-memory frames.
//!
//! # Architecture
//!
//! The system is organized into several layers:
//!
//! - **Storage Layer** (`storage`): Handles disk I/O and page organization
//!   - `DiskManager`: Reads, writes and allocates 4 KiB pages in one file
//!   - `SlottedPage`: Variable-length tuple storage within a page
//!
//! - **Buffer Pool** (`buffer`): Memory management for database pages
//!   - `BufferPoolManager`: Pins pages into frames, with first-fit eviction
//!   - `FrameHeader`: Per-frame metadata and data storage
//!   - `PageGuard`: RAII handle that unpins its page on drop
//!
//! - **Table** (`table`): Tuple storage across many pages
//!   - `TableHeap`: Doubly linked chain of slotted pages
//!   - `TableIterator`: Forward cursor over live tuples
//!   - `Table`: Schema-aware wrapper that encodes and decodes rows
//!
//! - **Tuple** (`tuple`): Schemas, typed values and the row codec
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use slotdb::buffer::BufferPoolManager;
//! use slotdb::storage::disk::DiskManager;
//! use slotdb::table::TableHeap;
//!
//! let disk_manager = Arc::new(DiskManager::new("test.db").unwrap());
//! let bpm = Arc::new(BufferPoolManager::new(16, disk_manager));
//!
//! let mut heap = TableHeap::new(Arc::clone(&bpm)).unwrap();
//! let rid = heap.insert(b"Hello, World!").unwrap();
//! assert_eq!(heap.get(rid).unwrap(), b"Hello, World!");
//!
//! bpm.flush_all_pages().unwrap();
//! ```

pub mod buffer;
pub mod common;
pub mod storage;
pub mod table;
pub mod tuple;

// Re-export commonly used types at the crate root
pub use common::{PageId, RecordId, Result, SlotDbError, SlotId};
