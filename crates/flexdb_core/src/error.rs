//! Error types for FlexDB core.
//!
//! Most outcomes the engine reports are not errors: a full collection, a
//! missing directory or a delete of an absent record come back as
//! `Ok(false)`, and a missing record as `Ok(None)`. `CoreError` is kept for
//! I/O and codec failures and for contract violations by the caller.

use crate::types::{RecordId, Uniqid};
use flexdb_codec::CodecError;
use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in FlexDB core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Encoding or decoding error.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A file was read but its content is not what the engine expects.
    #[error("invalid format: {message}")]
    InvalidFormat {
        /// Description of the format issue.
        message: String,
    },

    /// A collection identity was looked up that no handle was ever opened for.
    #[error("no collection registered for uniqid {uniqid}")]
    CollectionNotRegistered {
        /// The identity that was looked up.
        uniqid: Uniqid,
    },

    /// A record was asked to persist itself but is not attached to a live
    /// collection handle.
    #[error("record {id} is not bound to a live collection")]
    RecordUnbound {
        /// Id of the unbound record.
        id: RecordId,
    },
}

impl CoreError {
    /// Creates an invalid format error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }
}
