//! Block data structures and operations

use crate::{
    keccak256, Address, BlockNumber, CoreError, CoreResult, DposContextProto, Gas, Hash, Timestamp,
    SIGNATURE_LENGTH,
};
use rlp::{Encodable, RlpStream};
use serde::{Deserialize, Serialize};

/// Fixed number of extra-data prefix bytes reserved for signer vanity
pub const EXTRA_VANITY: usize = 32;

/// Fixed number of extra-data suffix bytes reserved for the signer seal
pub const EXTRA_SEAL: usize = SIGNATURE_LENGTH;

/// Keccak256 of the RLP encoding of an empty list, the only uncle hash a DPoS
/// header may carry
pub fn empty_uncle_hash() -> Hash {
    keccak256(&rlp::EMPTY_LIST_RLP)
}

/// Block header containing metadata
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
pub struct BlockHeader {
    /// Hash of the parent block
    pub parent_hash: Hash,
    /// Hash of the uncle list; always [`empty_uncle_hash`]
    pub uncle_hash: Hash,
    /// Producer that sealed this block
    pub validator: Address,
    /// Beneficiary of the block rewards
    pub coinbase: Address,
    /// Root hash of the state trie
    pub state_root: Hash,
    /// Root hash of the transaction trie
    pub transactions_root: Hash,
    /// Root hash of the receipts trie
    pub receipts_root: Hash,
    /// Protocol-fixed to 1
    pub difficulty: u64,
    /// Block number (height); `None` for a malformed header
    pub number: Option<BlockNumber>,
    /// Gas limit for all transactions in this block
    pub gas_limit: Gas,
    /// Gas used by all transactions in this block
    pub gas_used: Gas,
    /// Block timestamp in seconds
    pub timestamp: Timestamp,
    /// `vanity (32 bytes) ‖ payload ‖ seal (65 bytes)`
    pub extra_data: Vec<u8>,
    /// Must be the zero hash
    pub mix_digest: Hash,
    pub nonce: u64,
    /// Roots of the DPoS context this block was built on
    pub dpos_context: DposContextProto,
}

impl Default for BlockHeader {
    fn default() -> Self {
        Self {
            parent_hash: Hash::zero(),
            uncle_hash: empty_uncle_hash(),
            validator: Address::zero(),
            coinbase: Address::zero(),
            state_root: Hash::zero(),
            transactions_root: Hash::zero(),
            receipts_root: Hash::zero(),
            difficulty: 1,
            number: None,
            gas_limit: 0,
            gas_used: 0,
            timestamp: 0,
            extra_data: vec![0u8; EXTRA_VANITY + EXTRA_SEAL],
            mix_digest: Hash::zero(),
            nonce: 0,
            dpos_context: DposContextProto::default(),
        }
    }
}

impl BlockHeader {
    /// Get the genesis block header built on the given context
    pub fn genesis(timestamp: Timestamp, dpos_context: DposContextProto) -> Self {
        Self {
            number: Some(0),
            gas_limit: 8_000_000,
            timestamp,
            dpos_context,
            ..Default::default()
        }
    }

    /// Block number, treating a missing number as genesis
    pub fn height(&self) -> BlockNumber {
        self.number.unwrap_or_default()
    }

    /// Keccak256 of the RLP encoding of every header field
    pub fn hash(&self) -> Hash {
        keccak256(&rlp::encode(self))
    }

    /// Hash signed by the producer.
    ///
    /// Covers every field except the trailing seal bytes of the extra-data,
    /// with the context proto replaced by its single root.
    pub fn seal_hash(&self) -> CoreResult<Hash> {
        let unsealed = self.unsealed_extra()?;
        let mut stream = RlpStream::new_list(16);
        self.append_fields(&mut stream, unsealed);
        stream.append(&self.dpos_context.root());
        Ok(keccak256(&stream.out()))
    }

    /// Trailing seal bytes of the extra-data
    pub fn seal(&self) -> CoreResult<&[u8]> {
        let split = self.seal_offset()?;
        Ok(&self.extra_data[split..])
    }

    /// Overwrite the trailing seal bytes of the extra-data
    pub fn set_seal(&mut self, signature: &[u8]) -> CoreResult<()> {
        if signature.len() != EXTRA_SEAL {
            return Err(CoreError::InvalidSignature);
        }
        let split = self.seal_offset()?;
        self.extra_data[split..].copy_from_slice(signature);
        Ok(())
    }

    fn unsealed_extra(&self) -> CoreResult<&[u8]> {
        let split = self.seal_offset()?;
        Ok(&self.extra_data[..split])
    }

    fn seal_offset(&self) -> CoreResult<usize> {
        self.extra_data
            .len()
            .checked_sub(EXTRA_SEAL)
            .ok_or(CoreError::ExtraDataTooShort {
                len: self.extra_data.len(),
                required: EXTRA_SEAL,
            })
    }

    fn append_fields(&self, s: &mut RlpStream, extra: &[u8]) {
        s.append(&self.parent_hash);
        s.append(&self.uncle_hash);
        s.append(&self.validator);
        s.append(&self.coinbase);
        s.append(&self.state_root);
        s.append(&self.transactions_root);
        s.append(&self.receipts_root);
        s.append(&self.difficulty);
        match self.number {
            Some(number) => {
                s.append(&number);
            }
            None => {
                s.begin_list(0);
            }
        }
        s.append(&self.gas_limit);
        s.append(&self.gas_used);
        s.append(&self.timestamp);
        s.append(&extra);
        s.append(&self.mix_digest);
        s.append(&self.nonce);
    }
}

impl Encodable for BlockHeader {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(16);
        self.append_fields(s, &self.extra_data);
        s.append(&self.dpos_context);
    }
}

/// Complete block with header, uncles and opaque encoded transactions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Block header
    pub header: BlockHeader,
    /// Uncle headers; always empty under DPoS
    pub uncles: Vec<BlockHeader>,
    /// Encoded transactions, applied outside the consensus engine
    pub transactions: Vec<Vec<u8>>,
}

impl Block {
    /// Create a new block
    pub fn new(header: BlockHeader, transactions: Vec<Vec<u8>>, uncles: Vec<BlockHeader>) -> Self {
        Self {
            header,
            uncles,
            transactions,
        }
    }

    /// Replace the header with its sealed version, keeping the body
    pub fn with_seal(self, header: BlockHeader) -> Self {
        Self { header, ..self }
    }

    /// Get the block hash (same as header hash)
    pub fn hash(&self) -> Hash {
        self.header.hash()
    }

    pub fn number(&self) -> Option<BlockNumber> {
        self.header.number
    }

    pub fn timestamp(&self) -> Timestamp {
        self.header.timestamp
    }

    /// Check if block is genesis
    pub fn is_genesis(&self) -> bool {
        self.header.number == Some(0) && self.header.parent_hash == Hash::zero()
    }
}
