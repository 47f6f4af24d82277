use std::fmt;

use super::config::NULL_PAGE_LINK;

/// Page identifier type - uniquely identifies a page on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(pub u32);

impl PageId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }

    /// Returns the 16-bit on-page link for this page, or None if the ID is
    /// too large to be stored in a page header.
    pub fn to_link(&self) -> Option<u16> {
        if self.0 < NULL_PAGE_LINK as u32 {
            Some(self.0 as u16)
        } else {
            None
        }
    }

    /// Decodes a 16-bit on-page link. `NULL_PAGE_LINK` decodes to None.
    pub fn from_link(link: u16) -> Option<Self> {
        if link == NULL_PAGE_LINK {
            None
        } else {
            Some(Self(link as u32))
        }
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PageId({})", self.0)
    }
}

/// Frame identifier type - identifies a buffer frame in the buffer pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(pub u32);

impl FrameId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn as_usize(&self) -> usize {
        self.0 as usize
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FrameId({})", self.0)
    }
}

/// Slot identifier within a slotted page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(pub u16);

impl SlotId {
    pub fn new(id: u16) -> Self {
        Self(id)
    }

    pub fn as_u16(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SlotId({})", self.0)
    }
}

/// Record identifier - combination of page ID and slot ID.
///
/// Record IDs handed out by a table heap always carry a page ID that fits
/// in a 16-bit page link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId {
    pub page_id: PageId,
    pub slot_id: SlotId,
}

impl RecordId {
    pub fn new(page_id: PageId, slot_id: SlotId) -> Self {
        Self { page_id, slot_id }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.page_id.as_u32(), self.slot_id.as_u16())
    }
}
