//! Signer recovery with a bounded recency cache

use crate::{DposError, DposResult};
use dpos_core::{recover_address, Address, BlockHeader, Hash, EXTRA_SEAL};
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;

/// Recovered signers keyed by header hash.
///
/// Entries are recomputable at any time; a miss only costs a recovery.
pub struct SignatureCache {
    inner: Mutex<LruCache<Hash, Address>>,
}

impl SignatureCache {
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(cap)),
        }
    }

    pub fn get(&self, hash: &Hash) -> Option<Address> {
        self.inner.lock().get(hash).copied()
    }

    pub fn insert(&self, hash: Hash, signer: Address) {
        self.inner.lock().put(hash, signer);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

/// Recover the address that sealed `header`, bypassing any cache
pub fn recover_signer(header: &BlockHeader) -> DposResult<Address> {
    if header.extra_data.len() < EXTRA_SEAL {
        return Err(DposError::MissingSignature);
    }
    let seal_hash = header.seal_hash()?;
    let signer = recover_address(&seal_hash, header.seal()?)?;
    Ok(signer)
}

/// Recover the address that sealed `header`, memoized by header hash
pub fn ecrecover(header: &BlockHeader, cache: &SignatureCache) -> DposResult<Address> {
    let hash = header.hash();
    if let Some(signer) = cache.get(&hash) {
        return Ok(signer);
    }

    let signer = recover_signer(header)?;
    cache.insert(hash, signer);
    Ok(signer)
}
