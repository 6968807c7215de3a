//! DPoS consensus engine
//!
//! This crate schedules block producers by time slot, verifies and seals
//! headers, and tracks which blocks have been confirmed by a quorum of
//! distinct producers.

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod finality;
pub mod rewards;
pub mod sigcache;
pub mod signer;
pub mod slot;
pub mod traits;
pub mod verifier;

pub use api::DposApi;
pub use config::DposConfig;
pub use engine::Dpos;
pub use error::{DposError, DposResult};
pub use finality::FinalityTracker;
pub use sigcache::{ecrecover, recover_signer, SignatureCache};
pub use signer::{local_signer, Authority, SignerFn};
pub use traits::Engine;
