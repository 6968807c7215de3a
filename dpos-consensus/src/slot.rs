//! Slot and epoch arithmetic
//!
//! All times are unix seconds. A zero interval is rejected with
//! [`DposError::Config`].

use crate::{DposConfig, DposError, DposResult};
use dpos_core::Timestamp;
use std::time::{SystemTime, UNIX_EPOCH};

fn zero_interval(name: &str) -> DposError {
    DposError::Config(format!("{} must be greater than 0", name))
}

/// Start of the slot strictly before `now`
pub fn prev_slot(now: Timestamp, interval: u64) -> DposResult<Timestamp> {
    let slots = now
        .saturating_sub(1)
        .checked_div(interval)
        .ok_or_else(|| zero_interval("producer_interval"))?;
    Ok(slots * interval)
}

/// First slot boundary at or after `now`
pub fn next_slot(now: Timestamp, interval: u64) -> DposResult<Timestamp> {
    if interval == 0 {
        return Err(zero_interval("producer_interval"));
    }
    Ok(now.div_ceil(interval) * interval)
}

/// Epoch index containing `timestamp`
pub fn epoch_of(timestamp: Timestamp, epoch_interval: u64) -> DposResult<u64> {
    timestamp
        .checked_div(epoch_interval)
        .ok_or_else(|| zero_interval("epoch_interval"))
}

/// Current wall-clock time in seconds
pub fn unix_now() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}

/// Index of the slot `timestamp` falls on within its epoch
pub fn slot_in_epoch(timestamp: Timestamp, config: &DposConfig) -> DposResult<u64> {
    let offset = timestamp
        .checked_rem(config.epoch_interval)
        .ok_or_else(|| zero_interval("epoch_interval"))?;
    let misaligned = offset
        .checked_rem(config.producer_interval)
        .ok_or_else(|| zero_interval("producer_interval"))?;
    if misaligned != 0 {
        return Err(DposError::InvalidMintTime);
    }
    Ok(offset / config.producer_interval)
}

/// Decide whether a producer may mint on top of a block stamped `last_block_time` at `now`
pub fn check_deadline(
    last_block_time: Timestamp,
    now: Timestamp,
    config: &DposConfig,
) -> DposResult<()> {
    let prev = prev_slot(now, config.producer_interval)?;
    let next = next_slot(now, config.producer_interval)?;
    if last_block_time >= next {
        return Err(DposError::FutureBlock);
    }
    slot_in_epoch(now, config)?;
    if last_block_time == prev || next - now <= 1 {
        return Ok(());
    }
    Err(DposError::InvalidTimestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_slot_boundaries() {
        assert_eq!(prev_slot(100, 10), Ok(90));
        assert_eq!(prev_slot(101, 10), Ok(100));
        assert_eq!(prev_slot(0, 10), Ok(0));
        assert_eq!(next_slot(100, 10), Ok(100));
        assert_eq!(next_slot(101, 10), Ok(110));
        assert_eq!(next_slot(0, 10), Ok(0));
        assert_eq!(epoch_of(86399, 86400), Ok(0));
        assert_eq!(epoch_of(86400, 86400), Ok(1));
    }

    #[test]
    fn test_zero_intervals_are_rejected() {
        assert!(matches!(prev_slot(100, 0), Err(DposError::Config(_))));
        assert!(matches!(next_slot(100, 0), Err(DposError::Config(_))));
        assert!(matches!(epoch_of(100, 0), Err(DposError::Config(_))));

        let no_epoch = DposConfig {
            epoch_interval: 0,
            ..Default::default()
        };
        assert!(matches!(
            slot_in_epoch(100, &no_epoch),
            Err(DposError::Config(_))
        ));

        let no_slot = DposConfig {
            producer_interval: 0,
            ..Default::default()
        };
        assert!(matches!(
            slot_in_epoch(100, &no_slot),
            Err(DposError::Config(_))
        ));
        assert!(matches!(
            check_deadline(90, 100, &no_slot),
            Err(DposError::Config(_))
        ));
    }

    #[test]
    fn test_slot_in_epoch() {
        let config = DposConfig::default();
        assert_eq!(slot_in_epoch(86400 + 30, &config), Ok(3));
        assert_eq!(slot_in_epoch(35, &config), Err(DposError::InvalidMintTime));
    }

    #[test]
    fn test_check_deadline() {
        let config = DposConfig::default();

        // Last block sits on the previous slot
        assert_eq!(check_deadline(90, 100, &config), Ok(()));
        // Last block already at the current boundary
        assert_eq!(
            check_deadline(100, 100, &config),
            Err(DposError::FutureBlock)
        );
        // Stale parent, but the slot boundary is now
        assert_eq!(check_deadline(50, 100, &config), Ok(()));
        // Between slots
        assert_eq!(
            check_deadline(50, 105, &config),
            Err(DposError::InvalidMintTime)
        );
        assert_eq!(
            check_deadline(110, 105, &config),
            Err(DposError::FutureBlock)
        );
    }

    proptest! {
        #[test]
        fn prop_slots_are_aligned(t in 0u64..10_000_000, interval in 1u64..3600) {
            let prev = prev_slot(t, interval).unwrap();
            let next = next_slot(prev, interval).unwrap();
            prop_assert_eq!(prev % interval, 0);
            prop_assert_eq!(next % interval, 0);
            prop_assert!(next >= prev);
            prop_assert!(prev <= t);
            prop_assert!(next_slot(t, interval).unwrap() >= t);
        }
    }
}
