use std::collections::HashMap;
use std::sync::Arc;

use super::DataType;

/// Represents a single named, typed column in a table schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    name: String,
    data_type: DataType,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }
}

/// Represents the schema of a table: an ordered list of columns.
/// Column order is the encoding order of tuples.
#[derive(Debug, Clone)]
pub struct Schema {
    /// Ordered list of columns
    columns: Vec<Column>,

    /// Map from column name to column index for fast lookup
    name_to_index: HashMap<String, usize>,
}

impl Schema {
    /// Creates a new schema from a list of columns.
    /// If two columns share a name, lookups by name resolve to the first.
    pub fn new(columns: Vec<Column>) -> Self {
        let mut name_to_index = HashMap::new();
        for (i, col) in columns.iter().enumerate() {
            name_to_index.entry(col.name.clone()).or_insert(i);
        }

        Self {
            columns,
            name_to_index,
        }
    }

    /// Creates a schema builder for fluent construction.
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Returns the column at the given index.
    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    /// Returns the column with the given name.
    pub fn column_by_name(&self, name: &str) -> Option<&Column> {
        self.column_index(name).and_then(|i| self.columns.get(i))
    }

    /// Returns the index of the column with the given name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    /// Returns an iterator over all columns.
    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter()
    }

    /// Returns the size of a tuple with every VarChar at full length.
    pub fn max_tuple_size(&self) -> usize {
        self.columns.iter().map(|c| c.data_type.max_size()).sum()
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.columns == other.columns
    }
}

impl Eq for Schema {}

/// Builder for constructing schemas fluently.
#[derive(Default)]
pub struct SchemaBuilder {
    columns: Vec<Column>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a column.
    pub fn column(mut self, name: impl Into<String>, data_type: DataType) -> Self {
        self.columns.push(Column::new(name, data_type));
        self
    }

    pub fn build(self) -> Schema {
        Schema::new(self.columns)
    }

    /// Builds the schema wrapped in an Arc, ready to share with tuples.
    pub fn build_arc(self) -> Arc<Schema> {
        Arc::new(self.build())
    }
}
