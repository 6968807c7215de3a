//! Database error types

use dpos_core::CoreError;
use thiserror::Error;

/// Database error type
#[derive(Error, Debug)]
pub enum DbError {
    /// RocksDB error
    #[cfg(feature = "rocksdb-backend")]
    #[error("RocksDB error: {0}")]
    RocksDb(#[from] rocksdb::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Key not found
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// Invalid data
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Column family was never opened
    #[error("Unknown column family: {0}")]
    UnknownColumnFamily(String),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}

impl From<bincode::error::EncodeError> for DbError {
    fn from(err: bincode::error::EncodeError) -> Self {
        DbError::Serialization(err.to_string())
    }
}

impl From<bincode::error::DecodeError> for DbError {
    fn from(err: bincode::error::DecodeError) -> Self {
        DbError::Serialization(err.to_string())
    }
}

/// Result type for database operations
pub type DbResult<T> = Result<T, DbError>;
