//! CBOR decoder.

use crate::error::{CodecError, CodecResult};
use serde::de::DeserializeOwned;
use std::io::Read;

/// Decode a value from CBOR bytes.
///
/// # Errors
///
/// Returns an error if the bytes are not valid CBOR or do not match `T`.
pub fn from_cbor<T: DeserializeOwned>(bytes: &[u8]) -> CodecResult<T> {
    read_cbor(bytes)
}

/// Decode a value from a reader producing CBOR bytes.
///
/// # Errors
///
/// Returns an error if reading fails, the input is not valid CBOR, or it
/// does not match `T`.
pub fn read_cbor<T, R>(reader: R) -> CodecResult<T>
where
    T: DeserializeOwned,
    R: Read,
{
    ciborium::de::from_reader(reader).map_err(|e| CodecError::decoding_failed(e.to_string()))
}
