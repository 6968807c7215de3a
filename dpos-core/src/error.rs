//! Error types for the core crate

use crate::{BlockNumber, Hash};
use thiserror::Error;

/// Core blockchain errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Crypto error: {0}")]
    Crypto(String),

    /// Extra-data cannot hold a seal
    #[error("Extra data too short: {len} bytes, need at least {required}")]
    ExtraDataTooShort { len: usize, required: usize },

    #[error("Trie error: {0}")]
    Trie(String),

    /// No snapshot is stored under the given context root
    #[error("Unknown dpos context root: {0}")]
    UnknownContext(Hash),

    /// Header hash does not match the configured fork checkpoint
    #[error("Fork hash mismatch at block {number}: expected {expected}, got {actual}")]
    ForkHashMismatch {
        number: BlockNumber,
        expected: Hash,
        actual: Hash,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Hex decode error: {0}")]
    HexDecode(String),

    #[error("Bincode error: {0}")]
    Bincode(String),
}

impl From<hex::FromHexError> for CoreError {
    fn from(err: hex::FromHexError) -> Self {
        CoreError::HexDecode(err.to_string())
    }
}

impl From<bincode::error::EncodeError> for CoreError {
    fn from(err: bincode::error::EncodeError) -> Self {
        CoreError::Bincode(err.to_string())
    }
}

impl From<bincode::error::DecodeError> for CoreError {
    fn from(err: bincode::error::DecodeError) -> Self {
        CoreError::Bincode(err.to_string())
    }
}

impl From<rlp::DecoderError> for CoreError {
    fn from(err: rlp::DecoderError) -> Self {
        CoreError::Deserialization(err.to_string())
    }
}

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;
