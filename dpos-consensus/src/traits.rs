//! Consensus engine traits

use crate::DposResult;
use dpos_core::{Address, Block, BlockHeader, ChainReader, DposContext, StateWriter, Timestamp};

/// Main consensus engine trait
pub trait Engine: Send + Sync {
    /// Account that sealed the block
    fn author(&self, header: &BlockHeader) -> DposResult<Address>;

    /// Verify a header against the chain, ignoring who signed it
    fn verify_header(&self, chain: &dyn ChainReader, header: &BlockHeader) -> DposResult<()>;

    /// Verify the uncle list of a block
    fn verify_uncles(&self, block: &Block) -> DposResult<()>;

    /// Verify the signer of a header against the producer schedule
    fn verify_seal(&self, chain: &dyn ChainReader, header: &BlockHeader) -> DposResult<()>;

    /// Fill the consensus fields of a header about to be built
    fn prepare(&self, chain: &dyn ChainReader, header: &mut BlockHeader) -> DposResult<()>;

    /// Apply rewards and accounting, then assemble the block
    fn finalize(
        &self,
        chain: &dyn ChainReader,
        header: BlockHeader,
        state: &mut dyn StateWriter,
        transactions: Vec<Vec<u8>>,
        uncles: Vec<BlockHeader>,
        context: DposContext,
    ) -> DposResult<Block>;

    /// Difficulty of a block built on `parent` at `time`
    fn calc_difficulty(
        &self,
        chain: &dyn ChainReader,
        time: Timestamp,
        parent: &BlockHeader,
    ) -> u64;
}
