//! Block rewards and per-epoch mint counting

use crate::slot::epoch_of;
use crate::{DposConfig, DposResult};
use dpos_core::{Address, BlockHeader, DposContext, StateWriter, Timestamp};
use tracing::trace;

/// Credit the block reward and transfer subsidy to the beneficiary
pub fn accumulate_rewards(
    config: &DposConfig,
    state: &mut dyn StateWriter,
    header: &BlockHeader,
) -> DposResult<()> {
    state.add_balance(&header.coinbase, config.block_reward)?;
    state.add_balance(&header.coinbase, config.transfer_reward)?;
    Ok(())
}

/// Count a block minted by `validator` and return its new count for the epoch.
///
/// The first block of an epoch resets the count to 1 and drops the entries
/// of earlier epochs.
pub fn update_mint_count(
    parent_time: Timestamp,
    current_time: Timestamp,
    validator: &Address,
    context: &mut DposContext,
    epoch_interval: u64,
) -> DposResult<u64> {
    let parent_epoch = epoch_of(parent_time, epoch_interval)?;
    let new_epoch = epoch_of(current_time, epoch_interval)?;

    let count = if parent_epoch == new_epoch {
        context
            .mint_count(parent_epoch, validator)?
            .map_or(1, |existing| existing + 1)
    } else {
        context
            .mint_cnt_trie_mut()
            .retain_prefix(&new_epoch.to_be_bytes());
        1
    };

    context.set_mint_count(new_epoch, validator, count)?;
    trace!(
        "Mint count of {} in epoch {} is {}",
        validator,
        new_epoch,
        count
    );
    Ok(count)
}
