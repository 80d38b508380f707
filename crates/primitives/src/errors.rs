//! Errors produced while decoding source-chain data.

use rlp::DecoderError;
use thiserror::Error;

/// Errors that can occur while decoding an RLP-encoded [`Header`](crate::header::Header).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderCodecError {
    /// The underlying RLP structure is malformed.
    #[error("malformed rlp: {0}")]
    Rlp(#[from] DecoderError),

    /// The encoding is not a list.
    #[error("header encoding is not an rlp list")]
    NotAList,

    /// The list has neither the legacy nor the base-fee field count.
    #[error("header has {0} fields, expected 15 or 16")]
    FieldCount(usize),

    /// A fixed-size field has the wrong length.
    #[error("field {field} has length {actual}, expected {expected}")]
    FieldLength {
        /// Name of the offending field.
        field: &'static str,

        /// Length found in the encoding.
        actual: usize,

        /// Length required by the header format.
        expected: usize,
    },

    /// An integer field is not canonically encoded or does not fit its type.
    #[error("field {0} is not a canonical integer")]
    NonCanonicalInteger(&'static str),

    /// There are bytes after the end of the header list.
    #[error("{0} trailing bytes after header")]
    TrailingBytes(usize),
}
