//! DPoS consensus configuration

use crate::{DposError, DposResult};
use dpos_core::{Wei, WEI_PER_TOKEN};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Reward credited to the block beneficiary (11 tokens)
pub const DEFAULT_BLOCK_REWARD: Wei = 11 * WEI_PER_TOKEN;

/// Transfer subsidy credited to the block beneficiary (16.5 tokens)
pub const DEFAULT_TRANSFER_REWARD: Wei = 33 * WEI_PER_TOKEN / 2;

/// DPoS consensus configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DposConfig {
    /// Slot width in seconds
    pub producer_interval: u64,
    /// Epoch width in seconds
    pub epoch_interval: u64,
    /// Distinct producers needed to confirm a block
    pub consensus_size: usize,
    /// Capacity of the recovered-signer cache
    pub signature_cache_size: usize,
    /// Block reward in wei
    pub block_reward: Wei,
    /// Transfer subsidy in wei
    pub transfer_reward: Wei,
}

impl Default for DposConfig {
    fn default() -> Self {
        Self {
            producer_interval: 10,
            epoch_interval: 86400,
            consensus_size: 15,
            signature_cache_size: 4096,
            block_reward: DEFAULT_BLOCK_REWARD,
            transfer_reward: DEFAULT_TRANSFER_REWARD,
        }
    }
}

impl DposConfig {
    /// Load configuration from file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> DposResult<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| DposError::Config(format!("Failed to read config file: {}", e)))?;

        let config: DposConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> DposResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), content)
            .map_err(|e| DposError::Config(format!("Failed to write config file: {}", e)))?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> DposResult<()> {
        if self.producer_interval == 0 {
            return Err(DposError::Config(
                "Producer interval must be greater than 0".to_string(),
            ));
        }

        if self.epoch_interval == 0 {
            return Err(DposError::Config(
                "Epoch interval must be greater than 0".to_string(),
            ));
        }

        if self.epoch_interval % self.producer_interval != 0 {
            return Err(DposError::Config(format!(
                "Epoch interval {} is not a multiple of producer interval {}",
                self.epoch_interval, self.producer_interval
            )));
        }

        if self.consensus_size == 0 {
            return Err(DposError::Config(
                "Consensus size must be greater than 0".to_string(),
            ));
        }

        if self.signature_cache_size == 0 {
            return Err(DposError::Config(
                "Signature cache size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Set producer interval
    pub fn with_producer_interval(mut self, interval: u64) -> Self {
        self.producer_interval = interval;
        self
    }

    /// Set epoch interval
    pub fn with_epoch_interval(mut self, interval: u64) -> Self {
        self.epoch_interval = interval;
        self
    }

    /// Set consensus size
    pub fn with_consensus_size(mut self, size: usize) -> Self {
        self.consensus_size = size;
        self
    }
}
