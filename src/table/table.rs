use std::sync::Arc;

use crate::buffer::BufferPoolManager;
use crate::common::{PageId, RecordId, Result};
use crate::tuple::{encode, Schema, Tuple, Value};

use super::{TableHeap, TableIterator};

/// A named table: a schema plus the heap holding its encoded rows.
pub struct Table {
    name: String,
    schema: Arc<Schema>,
    heap: TableHeap,
}

impl Table {
    /// Creates a table backed by a fresh heap.
    pub fn create(
        name: impl Into<String>,
        schema: Arc<Schema>,
        bpm: Arc<BufferPoolManager>,
    ) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            schema,
            heap: TableHeap::new(bpm)?,
        })
    }

    /// Reattaches to a table whose heap starts at `first_page_id`.
    pub fn open(
        name: impl Into<String>,
        schema: Arc<Schema>,
        bpm: Arc<BufferPoolManager>,
        first_page_id: PageId,
    ) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            schema,
            heap: TableHeap::open(bpm, first_page_id)?,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn first_page_id(&self) -> PageId {
        self.heap.first_page_id()
    }

    pub fn heap(&self) -> &TableHeap {
        &self.heap
    }

    /// Encodes and stores a row.
    pub fn insert(&mut self, values: &[Value]) -> Result<RecordId> {
        let bytes = encode(&self.schema, values)?;
        self.heap.insert(&bytes)
    }

    /// Stores a tuple after checking its values against this table's schema.
    /// A tuple built for another schema is rejected.
    pub fn insert_tuple(&mut self, tuple: &Tuple) -> Result<RecordId> {
        self.insert(tuple.values())
    }

    pub fn get(&self, rid: RecordId) -> Result<Tuple> {
        let bytes = self.heap.get(rid)?;
        Tuple::from_bytes(Arc::clone(&self.schema), &bytes)
    }

    pub fn delete(&self, rid: RecordId) -> Result<()> {
        self.heap.delete(rid)
    }

    pub fn scan(&self) -> TableScanner {
        TableScanner {
            schema: Arc::clone(&self.schema),
            inner: self.heap.scan(),
            done: false,
        }
    }
}

/// Decoding cursor over a table's live rows.
pub struct TableScanner {
    schema: Arc<Schema>,
    inner: TableIterator,
    done: bool,
}

impl Iterator for TableScanner {
    type Item = Result<(RecordId, Tuple)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let item = self.inner.next().and_then(|row| match row {
            Some((rid, bytes)) => {
                Tuple::from_bytes(Arc::clone(&self.schema), &bytes).map(|t| Some((rid, t)))
            }
            None => Ok(None),
        });

        match item {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
