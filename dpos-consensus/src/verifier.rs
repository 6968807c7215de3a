//! Header validation independent of the signer identity

use crate::slot::unix_now;
use crate::{DposConfig, DposError, DposResult};
use dpos_core::{
    empty_uncle_hash, verify_fork_hashes, BlockHeader, ChainReader, Hash, Timestamp, EXTRA_SEAL,
    EXTRA_VANITY,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Validate `header` against the wall clock.
///
/// `parents` is an in-flight segment ending with this header's parent; when
/// empty the parent is read from `chain`.
pub fn verify_header(
    config: &DposConfig,
    chain: &dyn ChainReader,
    header: &BlockHeader,
    parents: &[BlockHeader],
) -> DposResult<()> {
    verify_header_at(config, chain, header, parents, unix_now())
}

/// Validate `header` as if the wall clock read `now`
pub fn verify_header_at(
    config: &DposConfig,
    chain: &dyn ChainReader,
    header: &BlockHeader,
    parents: &[BlockHeader],
    now: Timestamp,
) -> DposResult<()> {
    let number = header.number.ok_or(DposError::UnknownBlock)?;

    if header.timestamp > now {
        return Err(DposError::FutureBlock);
    }

    if header.extra_data.len() < EXTRA_VANITY {
        return Err(DposError::MissingVanity);
    }
    if header.extra_data.len() < EXTRA_VANITY + EXTRA_SEAL {
        return Err(DposError::MissingSignature);
    }

    if header.mix_digest != Hash::zero() {
        return Err(DposError::InvalidMixDigest);
    }

    if header.difficulty != 1 {
        return Err(DposError::InvalidDifficulty);
    }

    if header.uncle_hash != empty_uncle_hash() {
        return Err(DposError::InvalidUncleHash);
    }

    verify_fork_hashes(chain.config(), header).map_err(DposError::Fork)?;

    let parent_number = number.checked_sub(1).ok_or(DposError::UnknownAncestor)?;
    let parent = match parents.last() {
        Some(parent) => parent.clone(),
        None => chain
            .get_header(&header.parent_hash, parent_number)
            .ok_or(DposError::UnknownAncestor)?,
    };
    if parent.number != Some(parent_number) || parent.hash() != header.parent_hash {
        return Err(DposError::UnknownAncestor);
    }

    if parent.timestamp.saturating_add(config.producer_interval) > header.timestamp {
        return Err(DposError::InvalidTimestamp);
    }

    trace!("Header #{} passed validation", number);
    Ok(())
}

/// Validate an ordered header segment on a blocking worker.
///
/// Results arrive in input order, one per header. Header `i` may use headers
/// before it as provisional parents. Cancelling the returned token stops
/// further results from being sent.
pub fn verify_headers(
    config: DposConfig,
    chain: Arc<dyn ChainReader>,
    headers: Vec<BlockHeader>,
) -> (CancellationToken, mpsc::Receiver<DposResult<()>>) {
    let abort = CancellationToken::new();
    let (results, receiver) = mpsc::channel(headers.len().max(1));

    let token = abort.clone();
    tokio::task::spawn_blocking(move || {
        for (i, header) in headers.iter().enumerate() {
            let result = verify_header(&config, chain.as_ref(), header, &headers[..i]);
            if token.is_cancelled() || results.blocking_send(result).is_err() {
                return;
            }
        }
    });

    (abort, receiver)
}
