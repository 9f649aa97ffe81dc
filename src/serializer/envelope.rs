//! # Result Serializer
//!
//! Converts store values into JSON-safe values and wraps them in the
//! wire envelopes `{"result": ...}` / `{"error": "..."}`.
//!
//! Bytes are decoded as strict UTF-8 first and fall back to standard
//! base64 text when decoding fails. Integers wider than 64 bits are
//! emitted as JSON floats and may lose precision.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;
use serde_json::{Number, Value};

use super::value::StoreValue;

/// Text emitted for the acknowledgement token
pub const ACK_TOKEN: &str = "OK";

/// Per-command response envelope
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Envelope {
    Result { result: Value },
    Error { error: String },
}

impl Envelope {
    /// Wrap a successful value
    pub fn success(value: &StoreValue) -> Self {
        Envelope::Result {
            result: serialize(value),
        }
    }

    /// Wrap a failure message
    pub fn failure(message: impl Into<String>) -> Self {
        Envelope::Error {
            error: message.into(),
        }
    }

    /// Wrap any error, using its display text as the message
    pub fn from_error<E: std::fmt::Display + ?Sized>(err: &E) -> Self {
        Self::failure(err.to_string())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Envelope::Error { .. })
    }

    /// Render as a JSON value
    pub fn to_json(&self) -> Value {
        match self {
            Envelope::Result { result } => serde_json::json!({ "result": result }),
            Envelope::Error { error } => serde_json::json!({ "error": error }),
        }
    }
}

/// Convert a store value into a JSON-safe value
pub fn serialize(value: &StoreValue) -> Value {
    match value {
        StoreValue::Nil => Value::Null,
        StoreValue::Ok => Value::String(ACK_TOKEN.to_string()),
        StoreValue::Int(n) => Value::from(*n),
        StoreValue::BigInt(n) => big_int(*n),
        StoreValue::Double(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
        StoreValue::Text(s) => Value::String(s.clone()),
        StoreValue::Bytes(bytes) => Value::String(decode_bytes(bytes)),
        StoreValue::Array(items) => Value::Array(items.iter().map(serialize).collect()),
    }
}

/// Decode bytes as UTF-8, falling back to base64
pub fn decode_bytes(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => STANDARD.encode(bytes),
    }
}

fn big_int(n: i128) -> Value {
    if let Ok(v) = i64::try_from(n) {
        Value::from(v)
    } else if let Ok(v) = u64::try_from(n) {
        Value::from(v)
    } else {
        Number::from_f64(n as f64)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}
