//! # FlexDB Codec
//!
//! Encoding and plain-value semantics for FlexDB.
//!
//! Records are converted to a plain [`Value`] tree (the same type
//! `serde_json` uses) before they touch the disk. This crate provides:
//! - CBOR encoding and decoding of those trees (object files, journals and
//!   snapshot files are all CBOR)
//! - The value operations the query engine builds on: truthiness, loose
//!   numeric comparison, membership, rendering, merge
//!
//! ## Usage
//!
//! ```
//! use flexdb_codec::{from_cbor, to_cbor, Value};
//! use serde_json::json;
//!
//! let doc = json!({"id": 1, "name": "Alice"});
//! let bytes = to_cbor(&doc).unwrap();
//! let decoded: Value = from_cbor(&bytes).unwrap();
//! assert_eq!(doc, decoded);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod decoder;
mod encoder;
mod error;
pub mod value;

pub use decoder::{from_cbor, read_cbor};
pub use encoder::{to_cbor, write_cbor};
pub use error::{CodecError, CodecResult};
pub use serde_json::{Map, Value};

/// Converts a serializable value into its plain [`Value`] form.
///
/// # Errors
///
/// Returns an error if `T`'s `Serialize` implementation fails (for
/// example a map with non-string keys).
pub fn to_value<T: serde::Serialize>(value: &T) -> CodecResult<Value> {
    serde_json::to_value(value).map_err(|e| CodecError::encoding_failed(e.to_string()))
}

/// Builds a `T` from its plain [`Value`] form.
///
/// # Errors
///
/// Returns an error if the value does not have the shape `T` expects.
pub fn from_value<T: serde::de::DeserializeOwned>(value: Value) -> CodecResult<T> {
    serde_json::from_value(value).map_err(|e| CodecError::unexpected_shape(e.to_string()))
}

/// Renders a value as JSON indented by four spaces.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_json_pretty(value: &Value) -> CodecResult<String> {
    use serde::Serialize as _;

    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value
        .serialize(&mut serializer)
        .map_err(|e| CodecError::encoding_failed(e.to_string()))?;
    String::from_utf8(out).map_err(|e| CodecError::encoding_failed(e.to_string()))
}
