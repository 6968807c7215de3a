//! RocksDB backend with one column family per [`ColumnFamily`]

use crate::{ColumnFamily, DbError, DbResult, KeyValueDB, Operation, WriteBatch};
use rocksdb::{Options, DB};
use std::path::Path;
use tracing::info;

/// Persistent [`KeyValueDB`] on RocksDB
pub struct RocksDatabase {
    inner: DB,
}

impl RocksDatabase {
    /// Open or create a database at the specified path
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let path = path.as_ref();
        info!("Opening database at: {}", path.display());

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let names = ColumnFamily::all().iter().map(|cf| cf.name());
        let inner = DB::open_cf(&opts, path, names)?;

        info!(
            "Database opened with {} column families",
            ColumnFamily::all().len()
        );
        Ok(Self { inner })
    }

    fn handle(&self, cf: ColumnFamily) -> DbResult<&rocksdb::ColumnFamily> {
        self.inner
            .cf_handle(cf.name())
            .ok_or_else(|| DbError::UnknownColumnFamily(cf.name().to_string()))
    }
}

impl KeyValueDB for RocksDatabase {
    fn get(&self, cf: ColumnFamily, key: &[u8]) -> DbResult<Option<Vec<u8>>> {
        Ok(self.inner.get_cf(self.handle(cf)?, key)?)
    }

    fn put(&self, cf: ColumnFamily, key: &[u8], value: &[u8]) -> DbResult<()> {
        Ok(self.inner.put_cf(self.handle(cf)?, key, value)?)
    }

    fn delete(&self, cf: ColumnFamily, key: &[u8]) -> DbResult<()> {
        Ok(self.inner.delete_cf(self.handle(cf)?, key)?)
    }

    fn write(&self, batch: WriteBatch) -> DbResult<()> {
        let mut inner = rocksdb::WriteBatch::default();
        for operation in batch.into_operations() {
            match operation {
                Operation::Put { cf, key, value } => inner.put_cf(self.handle(cf)?, key, value),
                Operation::Delete { cf, key } => inner.delete_cf(self.handle(cf)?, key),
            }
        }
        Ok(self.inner.write(inner)?)
    }

    fn flush(&self) -> DbResult<()> {
        for cf in ColumnFamily::all() {
            self.inner.flush_cf(self.handle(*cf)?)?;
        }
        Ok(())
    }
}
