//! Header chain persisted in the key-value store

use crate::{ColumnFamily, DbError, DbResult, SharedDatabase, WriteBatch, HEAD_HEADER_KEY};
use dpos_core::{BlockHeader, BlockNumber, ChainConfig, ChainReader, Hash};
use parking_lot::RwLock;
use tracing::{debug, warn};

/// Header storage tracking the canonical head.
///
/// A header becomes the head when its number is at least the current head's.
pub struct HeaderStore {
    db: SharedDatabase,
    config: ChainConfig,
    head: RwLock<Option<BlockHeader>>,
}

impl HeaderStore {
    /// Open the store, restoring the head pointer if one was persisted
    pub fn new(db: SharedDatabase, config: ChainConfig) -> DbResult<Self> {
        let head = match db.get(ColumnFamily::Default, HEAD_HEADER_KEY)? {
            Some(bytes) => {
                let hash = decode_hash(&bytes)?;
                let header = read_header(db.as_ref(), &hash)?
                    .ok_or_else(|| DbError::KeyNotFound(format!("head header {}", hash)))?;
                Some(header)
            }
            None => None,
        };

        Ok(Self {
            db,
            config,
            head: RwLock::new(head),
        })
    }

    /// Persist a header and advance the head if it extends the chain
    pub fn insert(&self, header: &BlockHeader) -> DbResult<Hash> {
        let hash = header.hash();
        let encoded = bincode::encode_to_vec(header, bincode::config::standard())?;

        let mut head = self.head.write();
        let becomes_head = head
            .as_ref()
            .map_or(true, |current| header.height() >= current.height());

        let mut batch = WriteBatch::new();
        batch.put(ColumnFamily::Headers, hash.as_bytes(), &encoded);
        if becomes_head {
            batch
                .put(
                    ColumnFamily::Indices,
                    &header.height().to_be_bytes(),
                    hash.as_bytes(),
                )
                .put(ColumnFamily::Default, HEAD_HEADER_KEY, hash.as_bytes());
        }
        self.db.write(batch)?;

        if becomes_head {
            *head = Some(header.clone());
        }
        debug!(
            "Stored header #{} {} (head: {})",
            header.height(),
            hash,
            becomes_head
        );
        Ok(hash)
    }

    /// Make an already stored header the canonical head
    pub fn set_head(&self, hash: &Hash) -> DbResult<()> {
        let header = read_header(self.db.as_ref(), hash)?
            .ok_or_else(|| DbError::KeyNotFound(format!("header {}", hash)))?;

        let mut head = self.head.write();
        let mut batch = WriteBatch::new();
        batch
            .put(
                ColumnFamily::Indices,
                &header.height().to_be_bytes(),
                hash.as_bytes(),
            )
            .put(ColumnFamily::Default, HEAD_HEADER_KEY, hash.as_bytes());
        self.db.write(batch)?;
        *head = Some(header);
        Ok(())
    }

    pub fn header(&self, hash: &Hash) -> DbResult<Option<BlockHeader>> {
        read_header(self.db.as_ref(), hash)
    }

    /// Canonical header at `number`
    pub fn header_by_number(&self, number: BlockNumber) -> DbResult<Option<BlockHeader>> {
        match self.db.get(ColumnFamily::Indices, &number.to_be_bytes())? {
            Some(bytes) => self.header(&decode_hash(&bytes)?),
            None => Ok(None),
        }
    }

    fn logged<T>(result: DbResult<Option<T>>) -> Option<T> {
        result.unwrap_or_else(|err| {
            warn!("Header read failed: {}", err);
            None
        })
    }
}

impl ChainReader for HeaderStore {
    fn config(&self) -> &ChainConfig {
        &self.config
    }

    fn current_header(&self) -> Option<BlockHeader> {
        self.head.read().clone()
    }

    fn get_header(&self, hash: &Hash, number: BlockNumber) -> Option<BlockHeader> {
        Self::logged(self.header(hash)).filter(|header| header.number == Some(number))
    }

    fn get_header_by_hash(&self, hash: &Hash) -> Option<BlockHeader> {
        Self::logged(self.header(hash))
    }

    fn get_header_by_number(&self, number: BlockNumber) -> Option<BlockHeader> {
        Self::logged(self.header_by_number(number))
    }
}

/// Decode a stored 32-byte hash
pub fn decode_hash(bytes: &[u8]) -> DbResult<Hash> {
    let raw: [u8; 32] = bytes
        .try_into()
        .map_err(|_| DbError::InvalidData(format!("hash must be 32 bytes, got {}", bytes.len())))?;
    Ok(Hash::new(raw))
}

fn read_header(db: &dyn crate::KeyValueDB, hash: &Hash) -> DbResult<Option<BlockHeader>> {
    match db.get(ColumnFamily::Headers, hash.as_bytes())? {
        Some(bytes) => {
            let (header, _) = bincode::decode_from_slice(&bytes, bincode::config::standard())?;
            Ok(Some(header))
        }
        None => Ok(None),
    }
}
