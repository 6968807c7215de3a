//! DPoS context snapshots
//!
//! A [`DposContext`] is the per-block view of the producer schedule and the
//! mint-count ledger. Headers do not carry the context itself, only its
//! [`DposContextProto`]: the set of component roots. Snapshots are immutable
//! once committed; changing one means committing a new snapshot and writing
//! the new proto into the child header.

use crate::{keccak256, Address, CoreError, CoreResult, Hash, MemoryTrie, Trie};
use parking_lot::RwLock;
use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Roots of every component of a [`DposContext`], as carried in a header
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    bincode::Encode,
    bincode::Decode,
)]
pub struct DposContextProto {
    pub epoch_hash: Hash,
    pub delegate_hash: Hash,
    pub candidate_hash: Hash,
    pub vote_hash: Hash,
    pub mint_cnt_hash: Hash,
}

impl DposContextProto {
    /// Single root committing to all component roots
    pub fn root(&self) -> Hash {
        keccak256(&rlp::encode(self))
    }
}

impl Encodable for DposContextProto {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(5);
        s.append(&self.epoch_hash);
        s.append(&self.delegate_hash);
        s.append(&self.candidate_hash);
        s.append(&self.vote_hash);
        s.append(&self.mint_cnt_hash);
    }
}

impl Decodable for DposContextProto {
    fn decode(rlp: &Rlp<'_>) -> Result<Self, DecoderError> {
        if rlp.item_count()? != 5 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        Ok(Self {
            epoch_hash: rlp.val_at(0)?,
            delegate_hash: rlp.val_at(1)?,
            candidate_hash: rlp.val_at(2)?,
            vote_hash: rlp.val_at(3)?,
            mint_cnt_hash: rlp.val_at(4)?,
        })
    }
}

/// Key of a mint-count entry: big-endian epoch followed by the producer address
pub fn mint_count_key(epoch: u64, validator: &Address) -> Vec<u8> {
    let mut key = Vec::with_capacity(8 + 20);
    key.extend_from_slice(&epoch.to_be_bytes());
    key.extend_from_slice(validator.as_bytes());
    key
}

/// Snapshot of the producer schedule and mint-count ledger for one block.
///
/// The candidate, delegate and vote tries belong to the election subsystem;
/// only their roots are carried here so the proto stays complete.
#[derive(Debug, Clone, Default, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct DposContext {
    validators: Vec<Address>,
    token_noders: Vec<Address>,
    delegate_hash: Hash,
    candidate_hash: Hash,
    vote_hash: Hash,
    mint_cnt: MemoryTrie,
}

impl DposContext {
    /// Context with the given ordered producer roster
    pub fn new(validators: Vec<Address>) -> Self {
        Self {
            validators,
            ..Default::default()
        }
    }

    /// Set the ordered token-noder roster
    pub fn with_token_noders(mut self, token_noders: Vec<Address>) -> Self {
        self.token_noders = token_noders;
        self
    }

    /// Ordered producer roster of the epoch
    pub fn validators(&self) -> &[Address] {
        &self.validators
    }

    pub fn token_noders(&self) -> &[Address] {
        &self.token_noders
    }

    /// Producer owning the `slot`-th slot of the epoch
    pub fn producer_at(&self, slot: u64) -> Option<Address> {
        pick(&self.validators, slot)
    }

    /// Token noder owning the `slot`-th slot of the epoch
    pub fn token_noder_at(&self, slot: u64) -> Option<Address> {
        pick(&self.token_noders, slot)
    }

    pub fn mint_cnt_trie(&self) -> &MemoryTrie {
        &self.mint_cnt
    }

    pub fn mint_cnt_trie_mut(&mut self) -> &mut MemoryTrie {
        &mut self.mint_cnt
    }

    /// Blocks minted by `validator` during `epoch`, if any were recorded
    pub fn mint_count(&self, epoch: u64, validator: &Address) -> CoreResult<Option<u64>> {
        match self.mint_cnt.get(&mint_count_key(epoch, validator))? {
            Some(bytes) => {
                let raw: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
                    CoreError::Trie(format!("mint count must be 8 bytes, got {}", bytes.len()))
                })?;
                Ok(Some(u64::from_be_bytes(raw)))
            }
            None => Ok(None),
        }
    }

    pub fn set_mint_count(
        &mut self,
        epoch: u64,
        validator: &Address,
        count: u64,
    ) -> CoreResult<()> {
        self.mint_cnt.insert(
            &mint_count_key(epoch, validator),
            count.to_be_bytes().to_vec(),
        )
    }

    /// Root of the epoch component (both rosters)
    pub fn epoch_hash(&self) -> Hash {
        let mut stream = RlpStream::new_list(2);
        stream.begin_list(self.validators.len());
        for validator in &self.validators {
            stream.append(validator);
        }
        stream.begin_list(self.token_noders.len());
        for noder in &self.token_noders {
            stream.append(noder);
        }
        keccak256(&stream.out())
    }

    pub fn to_proto(&self) -> DposContextProto {
        DposContextProto {
            epoch_hash: self.epoch_hash(),
            delegate_hash: self.delegate_hash,
            candidate_hash: self.candidate_hash,
            vote_hash: self.vote_hash,
            mint_cnt_hash: self.mint_cnt.root_hash(),
        }
    }
}

fn pick(roster: &[Address], slot: u64) -> Option<Address> {
    if roster.is_empty() {
        return None;
    }
    let index = (slot % roster.len() as u64) as usize;
    roster.get(index).copied()
}

/// Content-addressed persistence for context snapshots
pub trait ContextStore: Send + Sync {
    /// Reconstruct the snapshot a header's proto refers to
    fn load(&self, proto: &DposContextProto) -> CoreResult<DposContext>;

    /// Persist a snapshot and return the proto to write into a header
    fn commit(&self, context: &DposContext) -> CoreResult<DposContextProto>;
}

/// In-memory [`ContextStore`]
#[derive(Debug, Default)]
pub struct MemoryContextStore {
    snapshots: RwLock<HashMap<Hash, DposContext>>,
}

impl MemoryContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.snapshots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.read().is_empty()
    }
}

impl ContextStore for MemoryContextStore {
    fn load(&self, proto: &DposContextProto) -> CoreResult<DposContext> {
        let root = proto.root();
        self.snapshots
            .read()
            .get(&root)
            .cloned()
            .ok_or(CoreError::UnknownContext(root))
    }

    fn commit(&self, context: &DposContext) -> CoreResult<DposContextProto> {
        let proto = context.to_proto();
        self.snapshots.write().insert(proto.root(), context.clone());
        Ok(proto)
    }
}
