//! secp256k1 signing and signer recovery

use crate::{keccak256, Address, CoreError, CoreResult, Hash};

/// Length of a serialized recoverable signature (`r ‖ s ‖ v`)
pub const SIGNATURE_LENGTH: usize = 65;

/// Recoverable ECDSA signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub r: [u8; 32],
    pub s: [u8; 32],
    pub v: u8,
}

impl Signature {
    /// Create new signature
    pub fn new(r: [u8; 32], s: [u8; 32], v: u8) -> Self {
        Self { r, s, v }
    }

    /// Convert to bytes (65 bytes total)
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LENGTH] {
        let mut bytes = [0u8; SIGNATURE_LENGTH];
        bytes[0..32].copy_from_slice(&self.r);
        bytes[32..64].copy_from_slice(&self.s);
        bytes[64] = self.v;
        bytes
    }

    /// Create from bytes
    pub fn from_bytes(bytes: &[u8]) -> CoreResult<Self> {
        if bytes.len() != SIGNATURE_LENGTH {
            return Err(CoreError::InvalidSignature);
        }

        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[0..32]);
        s.copy_from_slice(&bytes[32..64]);
        Ok(Self { r, s, v: bytes[64] })
    }
}

/// Sign a 32-byte digest with a raw secret key
pub fn sign_hash(secret_key: &[u8], hash: &Hash) -> CoreResult<Signature> {
    let secp = secp256k1::Secp256k1::new();
    let secret_key = secp256k1::SecretKey::from_slice(secret_key)
        .map_err(|e| CoreError::Crypto(e.to_string()))?;
    let message = secp256k1::Message::from_digest_slice(hash.as_bytes())
        .map_err(|e| CoreError::Crypto(e.to_string()))?;

    let sig = secp.sign_ecdsa_recoverable(message, &secret_key);
    let (recovery_id, sig_bytes) = sig.serialize_compact();

    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&sig_bytes[0..32]);
    s.copy_from_slice(&sig_bytes[32..64]);
    Ok(Signature::new(r, s, recovery_id as u8))
}

/// Recover the address that produced `signature` over `hash`
pub fn recover_address(hash: &Hash, signature: &[u8]) -> CoreResult<Address> {
    let signature = Signature::from_bytes(signature)?;
    let secp = secp256k1::Secp256k1::new();

    let recovery_id = secp256k1::ecdsa::RecoveryId::from_u8_masked(signature.v);
    let mut sig_bytes = [0u8; 64];
    sig_bytes[0..32].copy_from_slice(&signature.r);
    sig_bytes[32..64].copy_from_slice(&signature.s);

    let recoverable_sig =
        secp256k1::ecdsa::RecoverableSignature::from_compact(&sig_bytes, recovery_id)
            .map_err(|e| CoreError::Crypto(e.to_string()))?;
    let message = secp256k1::Message::from_digest_slice(hash.as_bytes())
        .map_err(|e| CoreError::Crypto(e.to_string()))?;

    let public_key = secp
        .recover_ecdsa(message, &recoverable_sig)
        .map_err(|e| CoreError::Crypto(e.to_string()))?;
    Ok(public_key_to_address(&public_key))
}

/// Address of a public key: last 20 bytes of Keccak256 over the uncompressed key
/// without its 0x04 prefix
pub fn public_key_to_address(public_key: &secp256k1::PublicKey) -> Address {
    let pubkey_bytes = public_key.serialize_uncompressed();
    let pubkey_hash = keccak256(&pubkey_bytes[1..]);
    Address::from_slice(&pubkey_hash.as_bytes()[12..32])
}

/// Address controlled by a raw secret key
pub fn secret_key_to_address(secret_key: &[u8]) -> CoreResult<Address> {
    let secp = secp256k1::Secp256k1::new();
    let secret_key = secp256k1::SecretKey::from_slice(secret_key)
        .map_err(|e| CoreError::Crypto(e.to_string()))?;
    let public_key = secp256k1::PublicKey::from_secret_key(&secp, &secret_key);
    Ok(public_key_to_address(&public_key))
}
