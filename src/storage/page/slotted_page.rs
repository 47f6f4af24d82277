use crate::common::{PageId, Result, SlotDbError, SlotId, NULL_PAGE_LINK, PAGE_SIZE};

/// Slotted page layout:
///
/// +------------------+  0
/// | Page Header      |  (HEADER_SIZE bytes)
/// +------------------+  8
/// | Slot Array       |  (grows toward the end of the page)
/// | [slot 0]         |
/// | [slot 1]         |
/// | ...              |
/// +------------------+
/// |                  |
/// | Free Space       |
/// |                  |
/// +------------------+  free_space_end
/// | Tuple Data       |  (grows toward the start of the page)
/// | [tuple n]        |
/// | ...              |
/// | [tuple 0]        |
/// +------------------+  PAGE_SIZE
///
/// Header fields, all u16 little-endian:
///
/// | Field          | Offset |
/// |----------------|--------|
/// | num_slots      | 0      |
/// | free_space_end | 2      |
/// | next_page_id   | 4      |
/// | prev_page_id   | 6      |
///
/// Each slot entry contains:
///   - offset: u16 (offset from start of page to tuple data)
///   - length: u16 (length of the tuple)
///   - A length of 0 marks a deleted tuple. Its offset is kept and its
///     bytes are never reclaimed.
pub const HEADER_SIZE: usize = 8;

/// Size of each slot entry in bytes
pub const SLOT_SIZE: usize = 4;

/// Largest tuple that fits in an empty page
pub const MAX_TUPLE_SIZE: usize = PAGE_SIZE - HEADER_SIZE - SLOT_SIZE;

const NUM_SLOTS_OFFSET: usize = 0;
const FREE_SPACE_END_OFFSET: usize = 2;
const NEXT_PAGE_ID_OFFSET: usize = 4;
const PREV_PAGE_ID_OFFSET: usize = 6;

/// Represents a slot entry in the slot array
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotEntry {
    /// Offset from start of page to tuple data
    pub offset: u16,
    /// Length of the tuple (0 = deleted)
    pub length: u16,
}

impl SlotEntry {
    pub fn new(offset: u16, length: u16) -> Self {
        Self { offset, length }
    }

    pub fn is_deleted(&self) -> bool {
        self.length == 0
    }
}

fn read_u16(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

fn write_u16(data: &mut [u8], offset: usize, value: u16) {
    data[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

fn slot_position(slot_id: SlotId) -> usize {
    HEADER_SIZE + slot_id.as_u16() as usize * SLOT_SIZE
}

fn slot_array_end(data: &[u8]) -> usize {
    HEADER_SIZE + read_u16(data, NUM_SLOTS_OFFSET) as usize * SLOT_SIZE
}

/// A free_space_end past the page end reads as a full page.
fn free_space_of(data: &[u8]) -> usize {
    let free_space_end = read_u16(data, FREE_SPACE_END_OFFSET) as usize;
    if free_space_end > PAGE_SIZE {
        return 0;
    }
    free_space_end.saturating_sub(slot_array_end(data))
}

fn slot_of(data: &[u8], slot_id: SlotId) -> Option<SlotEntry> {
    if slot_id.as_u16() >= read_u16(data, NUM_SLOTS_OFFSET) {
        return None;
    }
    let pos = slot_position(slot_id);
    let entry = data.get(pos..pos + SLOT_SIZE)?;
    Some(SlotEntry::new(read_u16(entry, 0), read_u16(entry, 2)))
}

fn tuple_of(data: &[u8], slot_id: SlotId) -> Result<&[u8]> {
    let entry = slot_of(data, slot_id).ok_or(SlotDbError::SlotNotFound(slot_id))?;
    if entry.is_deleted() {
        return Err(SlotDbError::TupleDeleted(slot_id));
    }

    // Tuple bytes must lie between the slot array and the page end.
    let start = entry.offset as usize;
    let end = start + entry.length as usize;
    if start < slot_array_end(data) || end > PAGE_SIZE {
        return Err(SlotDbError::CorruptSlot(slot_id));
    }
    Ok(&data[start..end])
}

fn live_tuple_count(data: &[u8]) -> usize {
    (0..read_u16(data, NUM_SLOTS_OFFSET))
        .filter_map(|i| slot_of(data, SlotId::new(i)))
        .filter(|e| !e.is_deleted())
        .count()
}

/// SlottedPage provides methods to interpret and manipulate a page
/// as a slotted page with variable-length tuples.
pub struct SlottedPage<'a> {
    data: &'a mut [u8],
}

impl<'a> SlottedPage<'a> {
    /// Creates a new SlottedPage view over the given data buffer.
    /// The buffer must be exactly PAGE_SIZE bytes.
    pub fn new(data: &'a mut [u8]) -> Self {
        assert_eq!(data.len(), PAGE_SIZE);
        Self { data }
    }

    /// Writes an empty header: no slots, no tuple data, no chain links.
    /// The rest of the buffer is left as is.
    pub fn init(&mut self) {
        self.set_num_slots(0);
        self.set_free_space_end(PAGE_SIZE as u16);
        write_u16(self.data, NEXT_PAGE_ID_OFFSET, NULL_PAGE_LINK);
        write_u16(self.data, PREV_PAGE_ID_OFFSET, NULL_PAGE_LINK);
    }

    /// Returns the number of slots, deleted ones included.
    pub fn num_slots(&self) -> u16 {
        read_u16(self.data, NUM_SLOTS_OFFSET)
    }

    fn set_num_slots(&mut self, num_slots: u16) {
        write_u16(self.data, NUM_SLOTS_OFFSET, num_slots);
    }

    /// Returns the lowest byte offset occupied by tuple data.
    pub fn free_space_end(&self) -> u16 {
        read_u16(self.data, FREE_SPACE_END_OFFSET)
    }

    fn set_free_space_end(&mut self, offset: u16) {
        write_u16(self.data, FREE_SPACE_END_OFFSET, offset);
    }

    /// Returns the next page in the chain, or None at the tail.
    pub fn next_page_id(&self) -> Option<PageId> {
        PageId::from_link(read_u16(self.data, NEXT_PAGE_ID_OFFSET))
    }

    /// Sets the next page in the chain.
    pub fn set_next_page_id(&mut self, page_id: Option<PageId>) -> Result<()> {
        let link = encode_link(page_id)?;
        write_u16(self.data, NEXT_PAGE_ID_OFFSET, link);
        Ok(())
    }

    /// Returns the previous page in the chain, or None at the head.
    pub fn prev_page_id(&self) -> Option<PageId> {
        PageId::from_link(read_u16(self.data, PREV_PAGE_ID_OFFSET))
    }

    /// Sets the previous page in the chain.
    pub fn set_prev_page_id(&mut self, page_id: Option<PageId>) -> Result<()> {
        let link = encode_link(page_id)?;
        write_u16(self.data, PREV_PAGE_ID_OFFSET, link);
        Ok(())
    }

    /// Returns the number of bytes between the slot array and the tuple data.
    pub fn free_space(&self) -> usize {
        free_space_of(self.data)
    }

    /// Returns whether a tuple of the given size fits along with its new slot.
    pub fn can_insert(&self, tuple_size: usize) -> bool {
        tuple_size + SLOT_SIZE <= self.free_space()
    }

    /// Gets a slot entry by slot ID.
    pub fn slot(&self, slot_id: SlotId) -> Option<SlotEntry> {
        slot_of(self.data, slot_id)
    }

    fn set_slot(&mut self, slot_id: SlotId, entry: SlotEntry) {
        let pos = slot_position(slot_id);
        write_u16(self.data, pos, entry.offset);
        write_u16(self.data, pos + 2, entry.length);
    }

    /// Inserts a tuple and returns its slot ID. Slot IDs are handed out in
    /// increasing order and never reused. On failure the page is unchanged.
    pub fn insert_tuple(&mut self, tuple: &[u8]) -> Result<SlotId> {
        if tuple.is_empty() {
            return Err(SlotDbError::EmptyTuple);
        }
        if !self.can_insert(tuple.len()) {
            return Err(SlotDbError::NotEnoughSpace {
                required: tuple.len() + SLOT_SIZE,
                available: self.free_space(),
            });
        }

        let tuple_offset = self.free_space_end() - tuple.len() as u16;
        let start = tuple_offset as usize;
        self.data[start..start + tuple.len()].copy_from_slice(tuple);

        let slot_id = SlotId::new(self.num_slots());
        self.set_slot(slot_id, SlotEntry::new(tuple_offset, tuple.len() as u16));
        self.set_num_slots(slot_id.as_u16() + 1);
        self.set_free_space_end(tuple_offset);

        Ok(slot_id)
    }

    /// Gets tuple data by slot ID.
    pub fn get_tuple(&self, slot_id: SlotId) -> Result<&[u8]> {
        tuple_of(self.data, slot_id)
    }

    /// Deletes a tuple by slot ID, leaving a tombstone in its slot.
    pub fn delete_tuple(&mut self, slot_id: SlotId) -> Result<()> {
        let entry = self
            .slot(slot_id)
            .ok_or(SlotDbError::SlotNotFound(slot_id))?;
        if entry.is_deleted() {
            return Err(SlotDbError::TupleDeleted(slot_id));
        }

        self.set_slot(slot_id, SlotEntry::new(entry.offset, 0));
        Ok(())
    }

    /// Returns the number of live (non-deleted) tuples.
    pub fn tuple_count(&self) -> usize {
        live_tuple_count(self.data)
    }
}

fn encode_link(page_id: Option<PageId>) -> Result<u16> {
    match page_id {
        None => Ok(NULL_PAGE_LINK),
        Some(id) => id.to_link().ok_or(SlotDbError::PageIdOutOfRange(id)),
    }
}

/// Read-only view of a slotted page.
pub struct SlottedPageRef<'a> {
    data: &'a [u8],
}

impl<'a> SlottedPageRef<'a> {
    /// Creates a new read-only SlottedPage view.
    pub fn new(data: &'a [u8]) -> Self {
        assert_eq!(data.len(), PAGE_SIZE);
        Self { data }
    }

    pub fn num_slots(&self) -> u16 {
        read_u16(self.data, NUM_SLOTS_OFFSET)
    }

    pub fn free_space_end(&self) -> u16 {
        read_u16(self.data, FREE_SPACE_END_OFFSET)
    }

    pub fn next_page_id(&self) -> Option<PageId> {
        PageId::from_link(read_u16(self.data, NEXT_PAGE_ID_OFFSET))
    }

    pub fn prev_page_id(&self) -> Option<PageId> {
        PageId::from_link(read_u16(self.data, PREV_PAGE_ID_OFFSET))
    }

    pub fn free_space(&self) -> usize {
        free_space_of(self.data)
    }

    pub fn can_insert(&self, tuple_size: usize) -> bool {
        tuple_size + SLOT_SIZE <= self.free_space()
    }

    pub fn slot(&self, slot_id: SlotId) -> Option<SlotEntry> {
        slot_of(self.data, slot_id)
    }

    /// Gets tuple data by slot ID.
    pub fn get_tuple(&self, slot_id: SlotId) -> Result<&'a [u8]> {
        tuple_of(self.data, slot_id)
    }

    pub fn tuple_count(&self) -> usize {
        live_tuple_count(self.data)
    }
}
