use std::sync::Arc;

use crate::common::{Result, SlotDbError};

use super::{Schema, Value};

/// Represents a single row in a table.
///
/// A tuple holds one value per schema column, already checked against the
/// column types, so encoding it cannot fail.
///
/// ## Tuple Binary Format
///
/// Columns are written back to back in schema order with no header:
///
/// ```text
/// BOOLEAN      1 byte (0 or 1)
/// TINYINT      1 byte
/// SMALLINT     2 bytes, little-endian
/// INTEGER      4 bytes, little-endian
/// BIGINT       8 bytes, little-endian
/// VARCHAR(n)   length (2 bytes, little-endian) + UTF-8 bytes
/// ```
///
/// There is no null bitmap; every column holds a value.
#[derive(Debug, Clone)]
pub struct Tuple {
    /// The schema defining the structure of this tuple
    schema: Arc<Schema>,

    /// The values for each column (in schema order)
    values: Vec<Value>,
}

impl Tuple {
    /// Creates a tuple, checking the value count and every value's type.
    pub fn new(schema: Arc<Schema>, values: Vec<Value>) -> Result<Self> {
        validate(&schema, &values)?;
        Ok(Self { schema, values })
    }

    /// Decodes a tuple from raw bytes using the given schema.
    pub fn from_bytes(schema: Arc<Schema>, data: &[u8]) -> Result<Self> {
        let values = decode(&schema, data)?;
        Ok(Self { schema, values })
    }

    /// Encodes the tuple for storage.
    pub fn to_bytes(&self) -> Vec<u8> {
        write_values(&self.values)
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Returns the value at the given column index.
    pub fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Returns the value for the given column name.
    pub fn value_by_name(&self, name: &str) -> Option<&Value> {
        self.schema
            .column_index(name)
            .and_then(|i| self.values.get(i))
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl PartialEq for Tuple {
    fn eq(&self, other: &Self) -> bool {
        self.schema == other.schema && self.values == other.values
    }
}

impl Eq for Tuple {}

/// Encodes `values` in schema order after checking them against `schema`.
pub fn encode(schema: &Schema, values: &[Value]) -> Result<Vec<u8>> {
    validate(schema, values)?;
    Ok(write_values(values))
}

/// Decodes one value per schema column from `data`.
/// Fails if the bytes run out early or if bytes remain after the last column.
pub fn decode(schema: &Schema, data: &[u8]) -> Result<Vec<Value>> {
    let mut values = Vec::with_capacity(schema.column_count());
    let mut offset = 0;

    for col in schema.columns() {
        let (value, size) = Value::read_from(&data[offset..], col)?;
        values.push(value);
        offset += size;
    }

    if offset != data.len() {
        return Err(SlotDbError::TrailingBytes(data.len() - offset));
    }

    Ok(values)
}

fn validate(schema: &Schema, values: &[Value]) -> Result<()> {
    if values.len() != schema.column_count() {
        return Err(SlotDbError::ValueCountMismatch {
            expected: schema.column_count(),
            actual: values.len(),
        });
    }

    for (value, col) in values.iter().zip(schema.columns()) {
        value.check(col)?;
    }
    Ok(())
}

fn write_values(values: &[Value]) -> Vec<u8> {
    let mut bytes = Vec::new();
    for value in values {
        value.write_to(&mut bytes);
    }
    bytes
}

/// Builder for constructing tuples fluently, one column at a time.
pub struct TupleBuilder {
    schema: Arc<Schema>,
    values: Vec<Value>,
}

impl TupleBuilder {
    pub fn new(schema: Arc<Schema>) -> Self {
        let count = schema.column_count();
        Self {
            schema,
            values: Vec::with_capacity(count),
        }
    }

    /// Appends the value for the next column.
    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.values.push(value.into());
        self
    }

    /// Builds the tuple, checking it against the schema.
    pub fn build(self) -> Result<Tuple> {
        Tuple::new(self.schema, self.values)
    }
}
