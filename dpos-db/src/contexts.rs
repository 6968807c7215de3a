//! Context snapshots persisted in the key-value store

use crate::{ColumnFamily, DbError, SharedDatabase};
use dpos_core::{ContextStore, CoreError, CoreResult, DposContext, DposContextProto};
use tracing::trace;

/// [`ContextStore`] writing bincode snapshots keyed by their proto root
pub struct KvContextStore {
    db: SharedDatabase,
}

impl KvContextStore {
    pub fn new(db: SharedDatabase) -> Self {
        Self { db }
    }
}

fn storage_error(err: DbError) -> CoreError {
    match err {
        DbError::Core(inner) => inner,
        other => CoreError::Trie(other.to_string()),
    }
}

impl ContextStore for KvContextStore {
    fn load(&self, proto: &DposContextProto) -> CoreResult<DposContext> {
        let root = proto.root();
        let bytes = self
            .db
            .get(ColumnFamily::Contexts, root.as_bytes())
            .map_err(storage_error)?
            .ok_or(CoreError::UnknownContext(root))?;
        let (context, _) = bincode::decode_from_slice(&bytes, bincode::config::standard())?;
        Ok(context)
    }

    fn commit(&self, context: &DposContext) -> CoreResult<DposContextProto> {
        let proto = context.to_proto();
        let encoded = bincode::encode_to_vec(context, bincode::config::standard())?;
        self.db
            .put(ColumnFamily::Contexts, proto.root().as_bytes(), &encoded)
            .map_err(storage_error)?;
        trace!("Committed dpos context {}", proto.root());
        Ok(proto)
    }
}
