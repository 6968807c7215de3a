//! Database traits and interfaces

use crate::{ColumnFamily, DbResult};
use std::sync::Arc;

/// Key-value database trait
pub trait KeyValueDB: Send + Sync {
    /// Get value by key from a column family
    fn get(&self, cf: ColumnFamily, key: &[u8]) -> DbResult<Option<Vec<u8>>>;

    /// Put key-value pair into a column family
    fn put(&self, cf: ColumnFamily, key: &[u8], value: &[u8]) -> DbResult<()>;

    /// Delete key from a column family
    fn delete(&self, cf: ColumnFamily, key: &[u8]) -> DbResult<()>;

    /// Check if key exists in a column family
    fn exists(&self, cf: ColumnFamily, key: &[u8]) -> DbResult<bool> {
        Ok(self.get(cf, key)?.is_some())
    }

    /// Apply every operation of the batch atomically
    fn write(&self, batch: WriteBatch) -> DbResult<()>;

    /// Flush WAL to disk
    fn flush(&self) -> DbResult<()>;
}

/// Shared database reference
pub type SharedDatabase = Arc<dyn KeyValueDB>;

/// Database operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Put {
        cf: ColumnFamily,
        key: Vec<u8>,
        value: Vec<u8>,
    },
    Delete {
        cf: ColumnFamily,
        key: Vec<u8>,
    },
}

/// Ordered set of writes applied in one step
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    operations: Vec<Operation>,
}

impl WriteBatch {
    /// Create new write batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Add put operation
    pub fn put(&mut self, cf: ColumnFamily, key: &[u8], value: &[u8]) -> &mut Self {
        self.operations.push(Operation::Put {
            cf,
            key: key.to_vec(),
            value: value.to_vec(),
        });
        self
    }

    /// Add delete operation
    pub fn delete(&mut self, cf: ColumnFamily, key: &[u8]) -> &mut Self {
        self.operations.push(Operation::Delete {
            cf,
            key: key.to_vec(),
        });
        self
    }

    /// Get number of operations
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Check if batch is empty
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn into_operations(self) -> Vec<Operation> {
        self.operations
    }
}
