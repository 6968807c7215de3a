mod common;

use common::{signed_child, TestChain};
use dpos_consensus::{DposConfig, DposError, FinalityTracker};
use dpos_core::{BlockHeader, ChainReader};
use dpos_db::{decode_hash, ColumnFamily, CONFIRMED_BLOCK_HEAD_KEY};
use std::thread;

const A: u8 = 1;
const B: u8 = 2;
const C: u8 = 3;
const D: u8 = 4;

fn new_tracker(chain: &TestChain, quorum: usize) -> FinalityTracker {
    let config = DposConfig::default().with_consensus_size(quorum);
    FinalityTracker::new(chain.db.clone(), &config).unwrap()
}

fn confirmed_number(tracker: &FinalityTracker) -> Option<u64> {
    tracker.confirmed_header().map(|header| header.height())
}

#[test]
fn confirms_first_block_with_three_witnesses() {
    let chain = TestChain::new(&[A, B, C]);
    let blocks = chain.extend(&[(70, A), (80, C), (90, B), (100, A)]);
    let tracker = new_tracker(&chain, 3);

    tracker.update(chain.store.as_ref()).unwrap();

    let confirmed = tracker.confirmed_header().unwrap();
    assert_eq!(confirmed, blocks[1]);
    assert_eq!(confirmed.timestamp, 80);

    let stored = chain
        .db
        .get(ColumnFamily::Default, CONFIRMED_BLOCK_HEAD_KEY)
        .unwrap()
        .unwrap();
    assert_eq!(stored, blocks[1].hash().as_bytes().to_vec());
}

#[test]
fn promotes_exactly_at_the_quorum_witness() {
    let chain = TestChain::new(&[A, B, C, D]);
    let blocks = chain.extend(&[(10, D), (20, A), (30, B), (40, C)]);
    let tracker = new_tracker(&chain, 4);

    tracker.update(chain.store.as_ref()).unwrap();
    assert_eq!(tracker.confirmed_header(), Some(blocks[0].clone()));
}

#[test]
fn repeated_signer_does_not_count_twice() {
    let chain = TestChain::new(&[A, B, C, D]);
    chain.extend(&[(10, A), (20, A), (30, B), (40, C)]);
    let tracker = new_tracker(&chain, 4);

    tracker.update(chain.store.as_ref()).unwrap();
    assert_eq!(confirmed_number(&tracker), Some(0));
    assert!(chain
        .db
        .get(ColumnFamily::Default, CONFIRMED_BLOCK_HEAD_KEY)
        .unwrap()
        .is_none());
}

#[test]
fn second_update_without_new_tip_is_a_no_op() {
    let chain = TestChain::new(&[A, B, C]);
    chain.extend(&[(70, A), (80, C), (90, B), (100, A)]);
    let tracker = new_tracker(&chain, 3);

    tracker.update(chain.store.as_ref()).unwrap();
    let first = tracker.confirmed_header();
    tracker.update(chain.store.as_ref()).unwrap();
    assert_eq!(tracker.confirmed_header(), first);
}

#[test]
fn confirmed_number_never_decreases() {
    let chain = TestChain::new(&[A, B, C]);
    let tracker = new_tracker(&chain, 3);
    let signers = [A, B, C, A, C, B, B, A, C, A];

    let mut last = 0;
    for (i, signer) in signers.iter().enumerate() {
        chain.extend(&[((i as u64 + 1) * 10, *signer)]);
        tracker.update(chain.store.as_ref()).unwrap();
        let number = confirmed_number(&tracker).unwrap();
        assert!(number >= last, "confirmed went from {} to {}", last, number);
        last = number;
    }
    assert!(last > 0);
}

#[test]
fn witnesses_reset_at_epoch_boundary() {
    let chain = TestChain::new(&[A, B]);
    chain.extend(&[(30, A), (40, B)]);
    let config = DposConfig::default()
        .with_epoch_interval(40)
        .with_consensus_size(2);
    let tracker = FinalityTracker::new(chain.db.clone(), &config).unwrap();

    tracker.update(chain.store.as_ref()).unwrap();
    assert_eq!(confirmed_number(&tracker), Some(0));

    // Same blocks inside one epoch confirm the first of them
    let chain = TestChain::new(&[A, B]);
    let blocks = chain.extend(&[(30, A), (40, B)]);
    let tracker = new_tracker(&chain, 2);
    tracker.update(chain.store.as_ref()).unwrap();
    assert_eq!(tracker.confirmed_header(), Some(blocks[0].clone()));
}

#[test]
fn missing_ancestor_is_reported() {
    let chain = TestChain::new(&[A, B, C]);
    let orphan_parent = BlockHeader {
        number: Some(4),
        timestamp: 40,
        ..chain.genesis.clone()
    };
    let orphan = signed_child(&orphan_parent, 50, A);
    chain.store.insert(&orphan).unwrap();

    let tracker = new_tracker(&chain, 3);
    assert_eq!(
        tracker.update(chain.store.as_ref()),
        Err(DposError::NilBlockHeader)
    );
}

#[test]
fn confirmed_header_is_restored_from_storage() {
    let chain = TestChain::new(&[A, B, C]);
    let blocks = chain.extend(&[(70, A), (80, C), (90, B), (100, A)]);
    new_tracker(&chain, 3).update(chain.store.as_ref()).unwrap();

    let restarted = new_tracker(&chain, 3);
    assert_eq!(restarted.confirmed_header(), None);
    assert_eq!(
        restarted.load_confirmed(chain.store.as_ref()).unwrap(),
        blocks[1]
    );
}

#[test]
fn falls_back_to_genesis_without_stored_pointer() {
    let chain = TestChain::new(&[A]);
    let tracker = new_tracker(&chain, 3);
    assert_eq!(
        tracker.load_confirmed(chain.store.as_ref()).unwrap(),
        chain.genesis
    );
    assert_eq!(chain.store.current_header(), Some(chain.genesis.clone()));
}

#[test]
fn concurrent_updates_agree_on_the_confirmed_pointer() {
    let chain = TestChain::new(&[A, B, C]);
    let tracker = new_tracker(&chain, 3);
    let rotation = [A, B, C];

    thread::scope(|scope| {
        scope.spawn(|| {
            for i in 0..30u64 {
                chain.extend(&[((i + 1) * 10, rotation[i as usize % 3])]);
                thread::yield_now();
            }
        });

        for _ in 0..4 {
            scope.spawn(|| {
                let mut last = 0;
                for _ in 0..50 {
                    tracker.update(chain.store.as_ref()).unwrap();
                    let number = confirmed_number(&tracker).unwrap();
                    assert!(number >= last, "confirmed went from {} to {}", last, number);
                    last = number;
                }
            });
        }
    });

    tracker.update(chain.store.as_ref()).unwrap();
    let confirmed = tracker.confirmed_header().unwrap();
    assert!(confirmed.height() > 0);

    let stored = chain
        .db
        .get(ColumnFamily::Default, CONFIRMED_BLOCK_HEAD_KEY)
        .unwrap()
        .unwrap();
    assert_eq!(decode_hash(&stored).unwrap(), confirmed.hash());
}

#[test]
fn rejects_invalid_config() {
    let chain = TestChain::new(&[A]);
    let config = DposConfig {
        epoch_interval: 0,
        ..Default::default()
    };
    assert!(matches!(
        FinalityTracker::new(chain.db.clone(), &config),
        Err(DposError::Config(_))
    ));
}
