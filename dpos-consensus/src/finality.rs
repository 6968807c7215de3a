//! Confirmation of irreversible blocks
//!
//! A block is confirmed once enough distinct producers have sealed blocks on
//! top of it within one epoch. The walk starts at the chain tip and moves
//! backward toward the last confirmed header.

use crate::slot::epoch_of;
use crate::{DposConfig, DposError, DposResult};
use dpos_core::{Address, BlockHeader, ChainReader};
use dpos_db::{decode_hash, ColumnFamily, SharedDatabase, CONFIRMED_BLOCK_HEAD_KEY};
use parking_lot::Mutex;
use std::collections::HashSet;
use tracing::{debug, info};

pub struct FinalityTracker {
    db: SharedDatabase,
    consensus_size: usize,
    epoch_interval: u64,
    confirmed: Mutex<Option<BlockHeader>>,
}

impl FinalityTracker {
    pub fn new(db: SharedDatabase, config: &DposConfig) -> DposResult<Self> {
        config.validate()?;
        Ok(Self {
            db,
            consensus_size: config.consensus_size,
            epoch_interval: config.epoch_interval,
            confirmed: Mutex::new(None),
        })
    }

    /// Confirmed header if it has been loaded or promoted in this process
    pub fn confirmed_header(&self) -> Option<BlockHeader> {
        self.confirmed.lock().clone()
    }

    /// Confirmed header, loading it from storage or genesis on first use
    pub fn load_confirmed(&self, chain: &dyn ChainReader) -> DposResult<BlockHeader> {
        let mut confirmed = self.confirmed.lock();
        self.ensure_loaded(&mut confirmed, chain)
    }

    /// Walk back from the tip and promote the confirmed header on quorum
    pub fn update(&self, chain: &dyn ChainReader) -> DposResult<()> {
        let mut confirmed = self.confirmed.lock();
        let base = self.ensure_loaded(&mut confirmed, chain)?;
        let base_hash = base.hash();
        let base_number = base.height();

        let Some(mut current) = chain.current_header() else {
            return Ok(());
        };
        let mut epoch: Option<u64> = None;
        let mut witnesses: HashSet<Address> = HashSet::new();

        while base_hash != current.hash() && base_number < current.height() {
            let current_epoch = epoch_of(current.timestamp, self.epoch_interval)?;
            if epoch != Some(current_epoch) {
                epoch = Some(current_epoch);
                witnesses.clear();
            }

            let unexplored = (current.height() - base_number) as i64;
            if unexplored < self.consensus_size as i64 - witnesses.len() as i64 {
                debug!(
                    "Dpos fast return: current #{}, confirmed #{}, witnesses {}",
                    current.height(),
                    base_number,
                    witnesses.len()
                );
                return Ok(());
            }

            witnesses.insert(current.validator);
            if witnesses.len() >= self.consensus_size {
                let hash = current.hash();
                let number = current.height();
                *confirmed = Some(current);
                self.db.put(
                    ColumnFamily::Default,
                    CONFIRMED_BLOCK_HEAD_KEY,
                    hash.as_bytes(),
                )?;
                info!("Confirmed block #{} {}", number, hash);
                return Ok(());
            }

            current = chain
                .get_header_by_hash(&current.parent_hash)
                .ok_or(DposError::NilBlockHeader)?;
        }
        Ok(())
    }

    fn ensure_loaded(
        &self,
        confirmed: &mut Option<BlockHeader>,
        chain: &dyn ChainReader,
    ) -> DposResult<BlockHeader> {
        if let Some(header) = confirmed.as_ref() {
            return Ok(header.clone());
        }

        let header = match self.load_stored(chain) {
            Ok(header) => header,
            Err(err) => chain.get_header_by_number(0).ok_or(err)?,
        };
        *confirmed = Some(header.clone());
        Ok(header)
    }

    fn load_stored(&self, chain: &dyn ChainReader) -> DposResult<BlockHeader> {
        let bytes = self
            .db
            .get(ColumnFamily::Default, CONFIRMED_BLOCK_HEAD_KEY)?
            .ok_or_else(|| DposError::Storage("confirmed block head not stored".to_string()))?;
        let hash = decode_hash(&bytes)?;
        chain
            .get_header_by_hash(&hash)
            .ok_or(DposError::NilBlockHeader)
    }
}
