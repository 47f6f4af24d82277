/// Size of a page in bytes (4 KB)
pub const PAGE_SIZE: usize = 4096;

/// Invalid page ID constant, marks an empty frame
pub const INVALID_PAGE_ID: PageId = PageId(u32::MAX);

/// Default buffer pool size (number of frames)
pub const DEFAULT_BUFFER_POOL_SIZE: usize = 10;

/// On-page encoding of a missing next/prev link in a table page chain.
///
/// Page links are stored as `u16`, so a table can only chain pages whose
/// IDs are strictly below this value.
pub const NULL_PAGE_LINK: u16 = 0xFFFF;

use super::types::PageId;
