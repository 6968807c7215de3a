//! DPoS consensus engine implementation

use crate::finality::FinalityTracker;
use crate::rewards::{accumulate_rewards, update_mint_count};
use crate::sigcache::{ecrecover, SignatureCache};
use crate::signer::{Authority, SignerFn};
use crate::slot::{self, next_slot, slot_in_epoch, unix_now};
use crate::traits::Engine;
use crate::verifier;
use crate::{DposConfig, DposError, DposResult};
use dpos_core::{
    Address, Block, BlockHeader, ChainReader, ContextStore, DposContext, StateWriter, Timestamp,
    EXTRA_SEAL, EXTRA_VANITY,
};
use dpos_db::SharedDatabase;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// DPoS consensus engine
pub struct Dpos {
    /// Configuration
    config: DposConfig,
    /// Context snapshots referenced by headers
    contexts: Arc<dyn ContextStore>,
    /// Local signer, swapped as a whole on reauthorization
    authority: RwLock<Option<Arc<Authority>>>,
    /// Recovered signers by header hash
    signatures: SignatureCache,
    /// Confirmed block pointer
    finality: FinalityTracker,
}

impl Dpos {
    /// Create a new DPoS engine
    pub fn new(
        config: DposConfig,
        db: SharedDatabase,
        contexts: Arc<dyn ContextStore>,
    ) -> DposResult<Self> {
        config.validate()?;

        Ok(Self {
            signatures: SignatureCache::new(config.signature_cache_size),
            finality: FinalityTracker::new(db, &config)?,
            config,
            contexts,
            authority: RwLock::new(None),
        })
    }

    pub fn config(&self) -> &DposConfig {
        &self.config
    }

    /// Install the account this node seals with
    pub fn authorize(&self, signer: Address, sign_fn: SignerFn) {
        *self.authority.write() = Some(Arc::new(Authority::new(signer, sign_fn)));
        info!("Authorized signer {}", signer);
    }

    /// Currently authorized signer
    pub fn signer(&self) -> Option<Address> {
        self.authority
            .read()
            .as_ref()
            .map(|authority| authority.address())
    }

    fn authority(&self) -> DposResult<Arc<Authority>> {
        self.authority.read().clone().ok_or(DposError::Unauthorized)
    }

    /// Validate a header segment in the background, see [`verifier::verify_headers`]
    pub fn verify_headers(
        &self,
        chain: Arc<dyn ChainReader>,
        headers: Vec<BlockHeader>,
    ) -> (CancellationToken, mpsc::Receiver<DposResult<()>>) {
        verifier::verify_headers(self.config.clone(), chain, headers)
    }

    /// Verify the seal of `header`, taking its parent from `parents` when given,
    /// then advance the confirmed block
    pub fn verify_seal_with_parents(
        &self,
        chain: &dyn ChainReader,
        header: &BlockHeader,
        parents: &[BlockHeader],
    ) -> DposResult<()> {
        let number = match header.number {
            Some(0) | None => return Err(DposError::UnknownBlock),
            Some(number) => number,
        };

        let parent = match parents.last() {
            Some(parent) => parent.clone(),
            None => chain
                .get_header(&header.parent_hash, number - 1)
                .ok_or(DposError::UnknownAncestor)?,
        };

        let context = self.contexts.load(&parent.dpos_context)?;
        let producer = self.scheduled_producer(&context, header.timestamp)?;
        self.verify_block_signer(producer, header)?;

        self.finality.update(chain)
    }

    fn verify_block_signer(&self, producer: Address, header: &BlockHeader) -> DposResult<()> {
        let signer = ecrecover(header, &self.signatures)?;
        if signer != producer {
            return Err(DposError::InvalidBlockProducer);
        }
        if signer != header.validator {
            return Err(DposError::MismatchSignerAndValidator);
        }
        Ok(())
    }

    /// Producer owning the slot at `timestamp`
    pub fn scheduled_producer(
        &self,
        context: &DposContext,
        timestamp: Timestamp,
    ) -> DposResult<Address> {
        let slot = slot_in_epoch(timestamp, &self.config)?;
        context.producer_at(slot).ok_or(DposError::NoProducers)
    }

    /// Token noder owning the slot at `timestamp`
    pub fn scheduled_token_noder(
        &self,
        context: &DposContext,
        timestamp: Timestamp,
    ) -> DposResult<Address> {
        let slot = slot_in_epoch(timestamp, &self.config)?;
        context.token_noder_at(slot).ok_or(DposError::NoProducers)
    }

    /// Check whether it is time to mint on top of `last_block`
    pub fn check_deadline(&self, last_block: &Block, now: Timestamp) -> DposResult<()> {
        slot::check_deadline(last_block.timestamp(), now, &self.config)
    }

    /// Check that the local signer owns the slot at `now`
    pub fn check_producer(&self, last_block: &Block, now: Timestamp) -> DposResult<()> {
        let context = self.contexts.load(&last_block.header.dpos_context)?;
        let producer = self.scheduled_producer(&context, now)?;
        if producer.is_zero() || Some(producer) != self.signer() {
            return Err(DposError::InvalidBlockProducer);
        }
        Ok(())
    }

    /// Check the deadline, then that the local signer is the token noder at `now`
    pub fn check_token_noder(&self, last_block: &Block, now: Timestamp) -> DposResult<()> {
        self.check_deadline(last_block, now)?;
        let context = self.contexts.load(&last_block.header.dpos_context)?;
        let noder = self.scheduled_token_noder(&context, now)?;
        if noder.is_zero() || Some(noder) != self.signer() {
            return Err(DposError::InvalidTokenNoder);
        }
        Ok(())
    }

    /// Wait for the next slot and sign the block.
    ///
    /// Returns `Ok(None)` when `stop` fires before the slot starts.
    pub async fn seal(&self, block: Block, stop: CancellationToken) -> DposResult<Option<Block>> {
        let number = match block.number() {
            Some(0) | None => return Err(DposError::UnknownBlock),
            Some(number) => number,
        };
        let authority = self.authority()?;

        if stop.is_cancelled() {
            return Ok(None);
        }

        let now = unix_now();
        let delay = next_slot(now, self.config.producer_interval)? - now;
        if delay > 0 {
            tokio::select! {
                _ = stop.cancelled() => {
                    debug!("Sealing of block #{} aborted", number);
                    return Ok(None);
                }
                _ = tokio::time::sleep(Duration::from_secs(delay)) => {}
            }
        }

        let mut header = block.header.clone();
        header.timestamp = unix_now();
        let signature = authority.sign(header.seal_hash()?.as_bytes())?;
        header.set_seal(&signature)?;

        info!("Sealed block #{} {}", number, header.hash());
        Ok(Some(block.with_seal(header)))
    }

    /// Confirmed header, loading it on first use
    pub fn confirmed_header(&self, chain: &dyn ChainReader) -> DposResult<BlockHeader> {
        self.finality.load_confirmed(chain)
    }

    /// Re-run confirmation against the current tip
    pub fn update_confirmed(&self, chain: &dyn ChainReader) -> DposResult<()> {
        self.finality.update(chain)
    }

    pub fn context(&self, header: &BlockHeader) -> DposResult<DposContext> {
        Ok(self.contexts.load(&header.dpos_context)?)
    }

    /// Signer that sealed `header`
    pub fn recover_signer(&self, header: &BlockHeader) -> DposResult<Address> {
        ecrecover(header, &self.signatures)
    }
}

impl Engine for Dpos {
    fn author(&self, header: &BlockHeader) -> DposResult<Address> {
        Ok(header.validator)
    }

    fn verify_header(&self, chain: &dyn ChainReader, header: &BlockHeader) -> DposResult<()> {
        verifier::verify_header(&self.config, chain, header, &[])
    }

    fn verify_uncles(&self, block: &Block) -> DposResult<()> {
        if !block.uncles.is_empty() {
            return Err(DposError::UnclesNotAllowed);
        }
        Ok(())
    }

    fn verify_seal(&self, chain: &dyn ChainReader, header: &BlockHeader) -> DposResult<()> {
        self.verify_seal_with_parents(chain, header, &[])
    }

    fn prepare(&self, chain: &dyn ChainReader, header: &mut BlockHeader) -> DposResult<()> {
        header.nonce = 0;
        let number = header.number.ok_or(DposError::UnknownBlock)?;

        header.extra_data.resize(EXTRA_VANITY, 0);
        header.extra_data.extend_from_slice(&[0u8; EXTRA_SEAL]);

        let parent = number
            .checked_sub(1)
            .and_then(|parent_number| chain.get_header(&header.parent_hash, parent_number))
            .ok_or(DposError::UnknownAncestor)?;

        header.difficulty = self.calc_difficulty(chain, header.timestamp, &parent);
        header.validator = self.authority()?.address();
        Ok(())
    }

    fn finalize(
        &self,
        chain: &dyn ChainReader,
        mut header: BlockHeader,
        state: &mut dyn StateWriter,
        transactions: Vec<Vec<u8>>,
        uncles: Vec<BlockHeader>,
        mut context: DposContext,
    ) -> DposResult<Block> {
        accumulate_rewards(&self.config, state, &header)?;
        header.state_root = state.intermediate_root();

        let parent = chain
            .get_header_by_hash(&header.parent_hash)
            .ok_or(DposError::UnknownAncestor)?;

        update_mint_count(
            parent.timestamp,
            header.timestamp,
            &header.validator,
            &mut context,
            self.config.epoch_interval,
        )?;
        header.dpos_context = self.contexts.commit(&context)?;

        Ok(Block::new(header, transactions, uncles))
    }

    fn calc_difficulty(
        &self,
        _chain: &dyn ChainReader,
        _time: Timestamp,
        _parent: &BlockHeader,
    ) -> u64 {
        1
    }
}
