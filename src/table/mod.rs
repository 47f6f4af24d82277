mod table;
mod table_heap;
mod table_iterator;

pub use table::{Table, TableScanner};
pub use table_heap::TableHeap;
pub use table_iterator::TableIterator;
