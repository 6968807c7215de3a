//! Chain access seen by the consensus engine

use crate::{BlockHeader, BlockNumber, CoreError, CoreResult, Hash};
use serde::{Deserialize, Serialize};

/// Fork rules active on a chain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Chain identifier
    pub chain_id: u64,
    /// Block at which the fork checkpoint applies
    pub eip150_block: Option<BlockNumber>,
    /// Expected hash of the checkpoint block; zero disables the check
    pub eip150_hash: Hash,
}

impl ChainConfig {
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            ..Default::default()
        }
    }

    /// Pin the header hash expected at `block`
    pub fn with_fork_checkpoint(mut self, block: BlockNumber, hash: Hash) -> Self {
        self.eip150_block = Some(block);
        self.eip150_hash = hash;
        self
    }
}

/// Check the fork-specific header fields required by `config`
pub fn verify_fork_hashes(config: &ChainConfig, header: &BlockHeader) -> CoreResult<()> {
    let (Some(fork_block), Some(number)) = (config.eip150_block, header.number) else {
        return Ok(());
    };
    if fork_block != number || config.eip150_hash.is_zero() {
        return Ok(());
    }

    let actual = header.hash();
    if actual != config.eip150_hash {
        return Err(CoreError::ForkHashMismatch {
            number,
            expected: config.eip150_hash,
            actual,
        });
    }
    Ok(())
}

/// Read access to the local header chain
pub trait ChainReader: Send + Sync {
    /// Fork rules of the chain
    fn config(&self) -> &ChainConfig;

    /// Current canonical tip
    fn current_header(&self) -> Option<BlockHeader>;

    /// Header by hash and number
    fn get_header(&self, hash: &Hash, number: BlockNumber) -> Option<BlockHeader>;

    fn get_header_by_hash(&self, hash: &Hash) -> Option<BlockHeader>;

    /// Canonical header at `number`
    fn get_header_by_number(&self, number: BlockNumber) -> Option<BlockHeader>;
}
