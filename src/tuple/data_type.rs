use std::fmt;

/// Represents the column types a tuple can hold.
/// Each type has a fixed or variable size and specific serialization rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Boolean type: 1 byte (0 = false, 1 = true)
    Boolean,

    /// 8-bit signed integer: 1 byte
    TinyInt,

    /// 16-bit signed integer: 2 bytes, little-endian
    SmallInt,

    /// 32-bit signed integer: 4 bytes, little-endian
    Integer,

    /// 64-bit signed integer: 8 bytes, little-endian
    BigInt,

    /// Variable-length UTF-8 string of up to n bytes.
    /// Stored as: length (2 bytes, little-endian) + data
    VarChar(u16),
}

impl DataType {
    /// Returns true if this type has a fixed size in bytes.
    pub fn is_fixed_size(&self) -> bool {
        self.fixed_size().is_some()
    }

    /// Returns the fixed size in bytes, or None for variable-length types.
    pub fn fixed_size(&self) -> Option<usize> {
        match self {
            DataType::Boolean | DataType::TinyInt => Some(1),
            DataType::SmallInt => Some(2),
            DataType::Integer => Some(4),
            DataType::BigInt => Some(8),
            DataType::VarChar(_) => None,
        }
    }

    /// Returns the maximum encoded size in bytes.
    /// For VarChar this includes the length prefix.
    pub fn max_size(&self) -> usize {
        match self {
            DataType::VarChar(n) => 2 + *n as usize,
            fixed => fixed.fixed_size().unwrap_or_default(),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Boolean => write!(f, "BOOLEAN"),
            DataType::TinyInt => write!(f, "TINYINT"),
            DataType::SmallInt => write!(f, "SMALLINT"),
            DataType::Integer => write!(f, "INTEGER"),
            DataType::BigInt => write!(f, "BIGINT"),
            DataType::VarChar(n) => write!(f, "VARCHAR({})", n),
        }
    }
}
