//! Trie interface for state management

use crate::{keccak256, CoreError, CoreResult, Hash};
use rlp::RlpStream;
use std::collections::BTreeMap;

/// Generic trie interface for blockchain state storage
pub trait Trie {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Get value by key
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Insert key-value pair
    fn insert(&mut self, key: &[u8], value: Vec<u8>) -> Result<(), Self::Error>;

    /// Remove key-value pair
    fn remove(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Get the current root hash
    fn root_hash(&self) -> Hash;

    /// Check if key exists
    fn contains_key(&self, key: &[u8]) -> Result<bool, Self::Error> {
        Ok(self.get(key)?.is_some())
    }
}

/// Ordered in-memory trie whose root commits to every entry.
///
/// The root is Keccak256 over the RLP list of `[key, value]` pairs in key
/// order, so two tries holding the same entries always share a root no matter
/// the order of insertion. The empty trie has the zero root.
#[derive(Debug, Clone, Default, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct MemoryTrie {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemoryTrie {
    /// Create a new empty trie
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry whose key does not start with `prefix`
    pub fn retain_prefix(&mut self, prefix: &[u8]) {
        self.entries.retain(|key, _| key.starts_with(prefix));
    }
}

impl Trie for MemoryTrie {
    type Error = CoreError;

    fn get(&self, key: &[u8]) -> CoreResult<Option<Vec<u8>>> {
        Ok(self.entries.get(key).cloned())
    }

    fn insert(&mut self, key: &[u8], value: Vec<u8>) -> CoreResult<()> {
        if key.is_empty() {
            return Err(CoreError::Trie("empty key".to_string()));
        }
        self.entries.insert(key.to_vec(), value);
        Ok(())
    }

    fn remove(&mut self, key: &[u8]) -> CoreResult<Option<Vec<u8>>> {
        Ok(self.entries.remove(key))
    }

    fn root_hash(&self) -> Hash {
        if self.entries.is_empty() {
            return Hash::zero();
        }

        let mut stream = RlpStream::new_list(self.entries.len());
        for (key, value) in &self.entries {
            stream.begin_list(2);
            stream.append(&key.as_slice());
            stream.append(&value.as_slice());
        }
        keccak256(&stream.out())
    }
}
