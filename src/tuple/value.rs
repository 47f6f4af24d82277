use std::fmt;

use crate::common::{Result, SlotDbError};

use super::{Column, DataType};

/// Represents a typed value that can be stored in a tuple.
/// Each variant corresponds to a DataType and holds the actual data.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Boolean(bool),

    TinyInt(i8),

    SmallInt(i16),

    Integer(i32),

    BigInt(i64),

    /// String value for VarChar columns
    Text(String),
}

impl Value {
    /// Returns the SQL name of this value's type, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Boolean(_) => "BOOLEAN",
            Value::TinyInt(_) => "TINYINT",
            Value::SmallInt(_) => "SMALLINT",
            Value::Integer(_) => "INTEGER",
            Value::BigInt(_) => "BIGINT",
            Value::Text(_) => "VARCHAR",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns any integer variant widened to i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::TinyInt(v) => Some(*v as i64),
            Value::SmallInt(v) => Some(*v as i64),
            Value::Integer(v) => Some(*v as i64),
            Value::BigInt(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Checks that this value can be stored in `column`.
    /// Types must match exactly; there is no implicit widening.
    pub(crate) fn check(&self, column: &Column) -> Result<()> {
        match (self, column.data_type()) {
            (Value::Boolean(_), DataType::Boolean)
            | (Value::TinyInt(_), DataType::TinyInt)
            | (Value::SmallInt(_), DataType::SmallInt)
            | (Value::Integer(_), DataType::Integer)
            | (Value::BigInt(_), DataType::BigInt) => Ok(()),

            (Value::Text(s), DataType::VarChar(max_len)) => {
                if s.len() > *max_len as usize {
                    return Err(SlotDbError::StringTooLong {
                        column: column.name().to_string(),
                        len: s.len(),
                        max: *max_len as usize,
                    });
                }
                Ok(())
            }

            (value, data_type) => Err(SlotDbError::TypeMismatch {
                column: column.name().to_string(),
                expected: data_type.to_string(),
                actual: value.type_name().to_string(),
            }),
        }
    }

    /// Appends the encoded value to `buf`. The value must already have
    /// passed `check` for its column.
    pub(crate) fn write_to(&self, buf: &mut Vec<u8>) {
        match self {
            Value::Boolean(b) => buf.push(u8::from(*b)),
            Value::TinyInt(v) => buf.extend_from_slice(&v.to_le_bytes()),
            Value::SmallInt(v) => buf.extend_from_slice(&v.to_le_bytes()),
            Value::Integer(v) => buf.extend_from_slice(&v.to_le_bytes()),
            Value::BigInt(v) => buf.extend_from_slice(&v.to_le_bytes()),
            Value::Text(s) => {
                buf.extend_from_slice(&(s.len() as u16).to_le_bytes());
                buf.extend_from_slice(s.as_bytes());
            }
        }
    }

    /// Decodes a value of `column`'s type from the front of `data`.
    /// Returns the value and number of bytes consumed.
    pub(crate) fn read_from(data: &[u8], column: &Column) -> Result<(Self, usize)> {
        let truncated = || SlotDbError::TruncatedTuple(column.name().to_string());

        let (value, size) = match column.data_type() {
            DataType::Boolean => (
                Value::Boolean(take::<1>(data).ok_or_else(truncated)?[0] != 0),
                1,
            ),
            DataType::TinyInt => (
                Value::TinyInt(i8::from_le_bytes(take(data).ok_or_else(truncated)?)),
                1,
            ),
            DataType::SmallInt => (
                Value::SmallInt(i16::from_le_bytes(take(data).ok_or_else(truncated)?)),
                2,
            ),
            DataType::Integer => (
                Value::Integer(i32::from_le_bytes(take(data).ok_or_else(truncated)?)),
                4,
            ),
            DataType::BigInt => (
                Value::BigInt(i64::from_le_bytes(take(data).ok_or_else(truncated)?)),
                8,
            ),
            DataType::VarChar(_) => {
                let len = u16::from_le_bytes(take(data).ok_or_else(truncated)?) as usize;
                let bytes = data.get(2..2 + len).ok_or_else(truncated)?;
                let s = std::str::from_utf8(bytes)
                    .map_err(|_| SlotDbError::InvalidUtf8(column.name().to_string()))?;
                (Value::Text(s.to_string()), 2 + len)
            }
        };

        Ok((value, size))
    }
}

/// Copies the first N bytes of `data` into an array.
fn take<const N: usize>(data: &[u8]) -> Option<[u8; N]> {
    data.get(..N)?.try_into().ok()
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(b) => write!(f, "{}", b),
            Value::TinyInt(v) => write!(f, "{}", v),
            Value::SmallInt(v) => write!(f, "{}", v),
            Value::Integer(v) => write!(f, "{}", v),
            Value::BigInt(v) => write!(f, "{}", v),
            Value::Text(s) => write!(f, "'{}'", s),
        }
    }
}

// Convenience conversions
impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i8> for Value {
    fn from(v: i8) -> Self {
        Value::TinyInt(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::SmallInt(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::BigInt(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}
