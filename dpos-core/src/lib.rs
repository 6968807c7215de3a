//! Core data structures for the DPoS chain
//!
//! This crate provides the building blocks shared by storage and consensus:
//! - Basic types (Hash, Address, BlockNumber, etc.)
//! - Block headers with their RLP encoding and seal pre-image
//! - secp256k1 signing and signer recovery
//! - The ordered trie and the per-block DPoS context snapshot
//! - Collaborator traits for chain reads and state mutation

pub mod block;
pub mod chain;
pub mod context;
pub mod crypto;
pub mod error;
pub mod state;
pub mod trie;
pub mod types;

// Re-export commonly used types
pub use block::*;
pub use chain::*;
pub use context::*;
pub use crypto::*;
pub use error::*;
pub use state::*;
pub use trie::*;
pub use types::*;
