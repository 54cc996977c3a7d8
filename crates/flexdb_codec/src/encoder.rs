//! CBOR encoder.

use crate::error::{CodecError, CodecResult};
use serde::Serialize;
use std::io::Write;

/// Encode a value to CBOR bytes.
///
/// # Errors
///
/// Returns an error if the value cannot be serialized.
pub fn to_cbor<T: Serialize + ?Sized>(value: &T) -> CodecResult<Vec<u8>> {
    let mut buffer = Vec::new();
    write_cbor(value, &mut buffer)?;
    Ok(buffer)
}

/// Encode a value as CBOR directly into a writer.
///
/// # Errors
///
/// Returns an error if serialization fails or the writer rejects the bytes.
pub fn write_cbor<T, W>(value: &T, writer: W) -> CodecResult<()>
where
    T: Serialize + ?Sized,
    W: Write,
{
    ciborium::ser::into_writer(value, writer)
        .map_err(|e| CodecError::encoding_failed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn encodes_plain_map() {
        let bytes = to_cbor(&json!({"name": "Alice", "age": 30})).unwrap();
        // CBOR map with two entries
        assert_eq!(bytes[0], 0xa2);
    }

    #[test]
    fn write_into_vec_matches_to_cbor() {
        let value = json!([1, 2, 3]);
        let mut out = Vec::new();
        write_cbor(&value, &mut out).unwrap();
        assert_eq!(out, to_cbor(&value).unwrap());
    }
}
