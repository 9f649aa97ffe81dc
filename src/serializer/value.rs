//! Store result values
//!
//! The shapes a store client can hand back for a command.

/// A value returned by the backing store
#[derive(Debug, Clone, PartialEq)]
pub enum StoreValue {
    /// Absent / nil reply
    Nil,
    /// The store's acknowledgement token
    Ok,
    Int(i64),
    /// Integer wider than 64 bits
    BigInt(i128),
    Double(f64),
    Text(String),
    /// Raw bytes; may or may not be valid UTF-8
    Bytes(Vec<u8>),
    Array(Vec<StoreValue>),
}

impl StoreValue {
    pub fn text(s: impl Into<String>) -> Self {
        StoreValue::Text(s.into())
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, StoreValue::Nil)
    }
}

impl From<&str> for StoreValue {
    fn from(s: &str) -> Self {
        StoreValue::Text(s.to_string())
    }
}

impl From<String> for StoreValue {
    fn from(s: String) -> Self {
        StoreValue::Text(s)
    }
}

impl From<i64> for StoreValue {
    fn from(n: i64) -> Self {
        StoreValue::Int(n)
    }
}

impl From<Vec<u8>> for StoreValue {
    fn from(b: Vec<u8>) -> Self {
        StoreValue::Bytes(b)
    }
}

impl<T: Into<StoreValue>> From<Option<T>> for StoreValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(StoreValue::Nil)
    }
}

impl From<Vec<StoreValue>> for StoreValue {
    fn from(items: Vec<StoreValue>) -> Self {
        StoreValue::Array(items)
    }
}
