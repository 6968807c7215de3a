//! Consensus database layer
//!
//! This crate provides persistent storage for the data the DPoS engine
//! reads and writes: headers, the canonical index, context snapshots
//! and the confirmed-head pointer.

pub mod column_families;
pub mod contexts;
pub mod error;
pub mod headers;
pub mod memory;
#[cfg(feature = "rocksdb-backend")]
pub mod rocks;
pub mod traits;

pub use column_families::ColumnFamily;
pub use contexts::KvContextStore;
pub use error::{DbError, DbResult};
pub use headers::{decode_hash, HeaderStore};
pub use memory::MemoryDatabase;
#[cfg(feature = "rocksdb-backend")]
pub use rocks::RocksDatabase;
pub use traits::{KeyValueDB, Operation, SharedDatabase, WriteBatch};

/// Key in [`ColumnFamily::Default`] holding the hash of the last confirmed block
pub const CONFIRMED_BLOCK_HEAD_KEY: &[u8] = b"confirmed-block-head";

/// Key in [`ColumnFamily::Default`] holding the hash of the canonical head
pub const HEAD_HEADER_KEY: &[u8] = b"head-header";
