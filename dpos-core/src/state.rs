//! Account balance mutation seen by the consensus engine

use crate::{Address, CoreError, CoreResult, Hash, Wei};
use std::collections::HashMap;

/// State mutations the engine performs while finalizing a block
pub trait StateWriter {
    /// Credit `amount` to `address`
    fn add_balance(&mut self, address: &Address, amount: Wei) -> CoreResult<()>;

    /// Current balance of `address`
    fn balance(&self, address: &Address) -> Wei;

    /// State root after all mutations so far
    fn intermediate_root(&self) -> Hash;
}

/// In-memory balance ledger
#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    balances: HashMap<Address, Wei>,
}

impl MemoryState {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateWriter for MemoryState {
    fn add_balance(&mut self, address: &Address, amount: Wei) -> CoreResult<()> {
        let balance = self.balances.entry(*address).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| CoreError::Serialization(format!("balance overflow for {}", address)))?;
        Ok(())
    }

    fn balance(&self, address: &Address) -> Wei {
        self.balances.get(address).copied().unwrap_or(0)
    }

    fn intermediate_root(&self) -> Hash {
        // Sort accounts for deterministic hashing
        let mut sorted: Vec<_> = self.balances.iter().collect();
        sorted.sort_by_key(|(address, _)| **address);

        let mut hasher = blake3::Hasher::new();
        for (address, balance) in sorted {
            hasher.update(address.as_bytes());
            hasher.update(&balance.to_le_bytes());
        }
        Hash::new(*hasher.finalize().as_bytes())
    }
}
