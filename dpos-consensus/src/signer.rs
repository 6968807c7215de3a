//! Local signing authority

use crate::DposResult;
use dpos_core::{secret_key_to_address, sign_hash, Address, Hash};
use std::fmt;
use std::sync::Arc;

/// Signs a digest on behalf of an account
pub type SignerFn = Arc<dyn Fn(&Address, &[u8]) -> anyhow::Result<Vec<u8>> + Send + Sync>;

/// Account the engine seals with, and how to sign for it
#[derive(Clone)]
pub struct Authority {
    address: Address,
    sign_fn: SignerFn,
}

impl Authority {
    pub fn new(address: Address, sign_fn: SignerFn) -> Self {
        Self { address, sign_fn }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Sign `digest` as this authority
    pub fn sign(&self, digest: &[u8]) -> DposResult<Vec<u8>> {
        Ok((self.sign_fn)(&self.address, digest)?)
    }
}

impl fmt::Debug for Authority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authority")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Signer backed by an in-process secp256k1 secret key
pub fn local_signer(secret_key: [u8; 32]) -> DposResult<(Address, SignerFn)> {
    let address = secret_key_to_address(&secret_key)?;
    let sign_fn: SignerFn = Arc::new(
        move |account: &Address, digest: &[u8]| -> anyhow::Result<Vec<u8>> {
            if *account != address {
                anyhow::bail!("unknown account {}", account);
            }
            let digest: [u8; 32] = digest.try_into()?;
            let signature = sign_hash(&secret_key, &Hash::new(digest))?;
            Ok(signature.to_bytes().to_vec())
        },
    );
    Ok((address, sign_fn))
}
