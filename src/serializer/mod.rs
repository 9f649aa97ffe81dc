//! # Serializer Module
//!
//! Store value model and the JSON response envelope.

pub mod envelope;
pub mod value;

pub use envelope::{decode_bytes, serialize, Envelope, ACK_TOKEN};
pub use value::StoreValue;
