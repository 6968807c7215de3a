//! Consensus error types

use dpos_core::CoreError;
use dpos_db::DbError;
use thiserror::Error;

/// Consensus error type.
///
/// Every protocol violation is terminal for the header under evaluation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DposError {
    /// Header has no number, or sealing was asked for the genesis block
    #[error("unknown block")]
    UnknownBlock,

    #[error("block in the future")]
    FutureBlock,

    #[error("extra-data 32 byte vanity prefix missing")]
    MissingVanity,

    #[error("extra-data 65 byte signature suffix missing")]
    MissingSignature,

    #[error("non-zero mix digest")]
    InvalidMixDigest,

    #[error("invalid difficulty")]
    InvalidDifficulty,

    #[error("non empty uncle hash")]
    InvalidUncleHash,

    #[error("unknown ancestor")]
    UnknownAncestor,

    #[error("invalid timestamp")]
    InvalidTimestamp,

    /// Time is not aligned to a producer slot
    #[error("invalid time to mint the block")]
    InvalidMintTime,

    #[error("invalid block producer")]
    InvalidBlockProducer,

    #[error("invalid token noder")]
    InvalidTokenNoder,

    #[error("mismatch block signer and validator")]
    MismatchSignerAndValidator,

    #[error("uncles not allowed")]
    UnclesNotAllowed,

    /// An ancestor could not be resolved during the finality walk
    #[error("nil block header returned")]
    NilBlockHeader,

    #[error("no block producers scheduled in the epoch")]
    NoProducers,

    /// Sealing or slot checks were attempted before `authorize`
    #[error("no signer authorized")]
    Unauthorized,

    #[error("Fork validation failed: {0}")]
    Fork(CoreError),

    #[error("Context error: {0}")]
    Context(CoreError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Signer error: {0}")]
    Signer(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<CoreError> for DposError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ExtraDataTooShort { .. } => DposError::MissingSignature,
            CoreError::ForkHashMismatch { .. } => DposError::Fork(err),
            CoreError::InvalidSignature | CoreError::Crypto(_) => {
                DposError::Crypto(err.to_string())
            }
            other => DposError::Context(other),
        }
    }
}

impl From<DbError> for DposError {
    fn from(err: DbError) -> Self {
        DposError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for DposError {
    fn from(err: serde_json::Error) -> Self {
        DposError::Config(err.to_string())
    }
}

impl From<anyhow::Error> for DposError {
    fn from(err: anyhow::Error) -> Self {
        DposError::Signer(err.to_string())
    }
}

/// Result type for consensus operations
pub type DposResult<T> = Result<T, DposError>;
