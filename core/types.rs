use std::fmt;
use std::fmt::Display;

/// A single column value as stored in a row image.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(fl) => write!(f, "{fl:?}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::Blob(b) => {
                write!(f, "x'")?;
                for byte in b {
                    write!(f, "{byte:02x}")?;
                }
                write!(f, "'")
            }
        }
    }
}

/// An owned row image. Columns are addressed by ordinal, matching the owning
/// table's column list.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Read the value at `ordinal`. Panics if the ordinal is out of bounds;
    /// row images are always sized to their table's column count.
    #[inline]
    pub fn get(&self, ordinal: usize) -> &Value {
        &self.values[ordinal]
    }

    #[inline]
    pub fn column_count(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Self::new(values)
    }
}

/// Result of an operation that may need to suspend instead of blocking.
///
/// `Done` carries the finished value; `IO` means the operation could not make
/// progress without waiting (a table lock, a pending row fetch) and must be
/// re-invoked later with the same saved state. Callers propagate `IO` upward
/// instead of spinning on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IOResult<T> {
    Done(T),
    IO,
}

impl<T> IOResult<T> {
    #[inline]
    pub fn is_io(&self) -> bool {
        matches!(self, IOResult::IO)
    }

    #[inline]
    pub fn map<U>(self, func: impl FnOnce(T) -> U) -> IOResult<U> {
        match self {
            IOResult::Done(t) => IOResult::Done(func(t)),
            IOResult::IO => IOResult::IO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_result_map_preserves_io() {
        let io: IOResult<i64> = IOResult::IO;
        assert!(io.map(|v| v + 1).is_io());
        assert_eq!(IOResult::Done(41).map(|v| v + 1), IOResult::Done(42));
    }

    #[test]
    fn value_display_matches_sql_spelling() {
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(Value::Integer(7).to_string(), "7");
        assert_eq!(Value::Blob(vec![0xde, 0xad]).to_string(), "x'dead'");
    }
}
