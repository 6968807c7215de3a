//! In-memory key-value backend

use crate::{ColumnFamily, DbResult, KeyValueDB, Operation, WriteBatch};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

type Table = BTreeMap<Vec<u8>, Vec<u8>>;

/// Volatile [`KeyValueDB`] holding every column family in ordered maps
#[derive(Debug)]
pub struct MemoryDatabase {
    tables: RwLock<HashMap<ColumnFamily, Table>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        let tables = ColumnFamily::all()
            .iter()
            .map(|cf| (*cf, Table::new()))
            .collect();
        Self {
            tables: RwLock::new(tables),
        }
    }

    /// Number of keys stored in a column family
    pub fn len(&self, cf: ColumnFamily) -> usize {
        self.tables.read().get(&cf).map_or(0, |table| table.len())
    }
}

impl Default for MemoryDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueDB for MemoryDatabase {
    fn get(&self, cf: ColumnFamily, key: &[u8]) -> DbResult<Option<Vec<u8>>> {
        Ok(self
            .tables
            .read()
            .get(&cf)
            .and_then(|table| table.get(key).cloned()))
    }

    fn put(&self, cf: ColumnFamily, key: &[u8], value: &[u8]) -> DbResult<()> {
        self.tables
            .write()
            .entry(cf)
            .or_default()
            .insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, cf: ColumnFamily, key: &[u8]) -> DbResult<()> {
        if let Some(table) = self.tables.write().get_mut(&cf) {
            table.remove(key);
        }
        Ok(())
    }

    fn write(&self, batch: WriteBatch) -> DbResult<()> {
        // Single write guard for the whole batch
        let mut tables = self.tables.write();
        for operation in batch.into_operations() {
            match operation {
                Operation::Put { cf, key, value } => {
                    tables.entry(cf).or_default().insert(key, value);
                }
                Operation::Delete { cf, key } => {
                    if let Some(table) = tables.get_mut(&cf) {
                        table.remove(&key);
                    }
                }
            }
        }
        Ok(())
    }

    fn flush(&self) -> DbResult<()> {
        Ok(())
    }
}
