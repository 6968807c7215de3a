//! Read-only introspection of the engine and its view of the chain

use crate::{Dpos, DposError, DposResult};
use dpos_core::{Address, BlockHeader, BlockNumber, ChainReader};
use std::sync::Arc;

pub struct DposApi {
    chain: Arc<dyn ChainReader>,
    dpos: Arc<Dpos>,
}

impl DposApi {
    pub fn new(chain: Arc<dyn ChainReader>, dpos: Arc<Dpos>) -> Self {
        Self { chain, dpos }
    }

    /// Number of the last confirmed block
    pub fn confirmed_block_number(&self) -> DposResult<BlockNumber> {
        Ok(self.dpos.confirmed_header(self.chain.as_ref())?.height())
    }

    /// Producer roster in effect at `number`, or at the tip
    pub fn validators(&self, number: Option<BlockNumber>) -> DposResult<Vec<Address>> {
        let header = self.header_at(number)?;
        Ok(self.dpos.context(&header)?.validators().to_vec())
    }

    /// Blocks `validator` minted during `epoch`, as recorded at `number` or the tip
    pub fn mint_count(
        &self,
        epoch: u64,
        validator: &Address,
        number: Option<BlockNumber>,
    ) -> DposResult<u64> {
        let header = self.header_at(number)?;
        let context = self.dpos.context(&header)?;
        Ok(context.mint_count(epoch, validator)?.unwrap_or(0))
    }

    /// Account that sealed block `number`
    pub fn signer(&self, number: BlockNumber) -> DposResult<Address> {
        let header = self.header_at(Some(number))?;
        self.dpos.recover_signer(&header)
    }

    fn header_at(&self, number: Option<BlockNumber>) -> DposResult<BlockHeader> {
        let header = match number {
            Some(number) => self.chain.get_header_by_number(number),
            None => self.chain.current_header(),
        };
        header.ok_or(DposError::UnknownBlock)
    }
}
