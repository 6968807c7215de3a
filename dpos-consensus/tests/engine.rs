mod common;

use common::{address, key, TestChain};
use dpos_consensus::slot::{epoch_of, unix_now};
use dpos_consensus::{local_signer, DposApi, DposConfig, DposError, Engine};
use dpos_core::{
    Address, Block, BlockHeader, ChainConfig, ChainReader, DposContext, MemoryState, StateWriter,
    EXTRA_SEAL, EXTRA_VANITY,
};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const A: u8 = 1;
const B: u8 = 2;

fn fast_config() -> DposConfig {
    DposConfig::default()
        .with_producer_interval(1)
        .with_consensus_size(1)
}

fn draft(parent: &BlockHeader) -> BlockHeader {
    BlockHeader {
        parent_hash: parent.hash(),
        number: Some(parent.height() + 1),
        timestamp: unix_now(),
        coinbase: address(A),
        extra_data: b"vanity".to_vec(),
        nonce: 42,
        difficulty: 0,
        ..Default::default()
    }
}

#[tokio::test]
async fn produces_and_verifies_a_block() {
    let chain = TestChain::new(&[A]);
    let engine = chain.engine_for(fast_config(), A);

    let mut header = draft(&chain.genesis);
    engine.prepare(chain.store.as_ref(), &mut header).unwrap();
    assert_eq!(header.nonce, 0);
    assert_eq!(header.difficulty, 1);
    assert_eq!(header.validator, address(A));
    assert_eq!(header.extra_data.len(), EXTRA_VANITY + EXTRA_SEAL);
    assert_eq!(&header.extra_data[..6], b"vanity");

    let context = engine.context(&chain.genesis).unwrap();
    let mut state = MemoryState::new();
    let block = engine
        .finalize(
            chain.store.as_ref(),
            header,
            &mut state,
            vec![vec![1, 2]],
            vec![],
            context,
        )
        .unwrap();
    assert_eq!(state.balance(&address(A)), 27_500_000_000_000_000_000);
    assert_eq!(block.header.state_root, state.intermediate_root());
    assert_ne!(block.header.dpos_context, chain.genesis.dpos_context);

    let sealed = engine
        .seal(block, CancellationToken::new())
        .await
        .unwrap()
        .expect("seal was not cancelled");
    assert_eq!(sealed.transactions, vec![vec![1, 2]]);
    assert_eq!(engine.recover_signer(&sealed.header).unwrap(), address(A));
    assert_eq!(engine.author(&sealed.header).unwrap(), address(A));

    chain.store.insert(&sealed.header).unwrap();
    engine
        .verify_header(chain.store.as_ref(), &sealed.header)
        .unwrap();
    engine.verify_seal(chain.store.as_ref(), &sealed.header).unwrap();

    // A single producer is its own quorum
    let confirmed = engine.confirmed_header(chain.store.as_ref()).unwrap();
    assert_eq!(confirmed, sealed.header);

    let context = engine.context(&sealed.header).unwrap();
    let epoch = epoch_of(sealed.header.timestamp, engine.config().epoch_interval).unwrap();
    assert_eq!(context.mint_count(epoch, &address(A)).unwrap(), Some(1));
}

#[tokio::test]
async fn seal_requires_authorization_and_a_real_block() {
    let chain = TestChain::new(&[A]);
    let engine = chain.engine(fast_config());

    let block = Block::new(draft(&chain.genesis), vec![], vec![]);
    assert_eq!(
        engine.seal(block, CancellationToken::new()).await,
        Err(DposError::Unauthorized)
    );

    let genesis = Block::new(chain.genesis.clone(), vec![], vec![]);
    assert_eq!(
        engine.seal(genesis, CancellationToken::new()).await,
        Err(DposError::UnknownBlock)
    );
}

#[tokio::test]
async fn stopped_seal_returns_nothing() {
    let chain = TestChain::new(&[A]);
    let engine = chain.engine_for(DposConfig::default(), A);
    let block = Block::new(draft(&chain.genesis), vec![], vec![]);

    let stop = CancellationToken::new();
    stop.cancel();
    assert_eq!(engine.seal(block.clone(), stop).await, Ok(None));

    // Long slots leave the sealer waiting until stopped
    let engine = Arc::new(chain.engine_for(
        DposConfig::default().with_producer_interval(3600).with_epoch_interval(86400),
        A,
    ));
    let stop = CancellationToken::new();
    let task = {
        let engine = engine.clone();
        let stop = stop.clone();
        tokio::spawn(async move { engine.seal(block, stop).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    stop.cancel();

    let outcome = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .unwrap()
        .unwrap();
    match outcome {
        Ok(None) => {}
        // Only possible when the test started exactly on a slot boundary
        Ok(Some(sealed)) => assert_eq!(sealed.header.timestamp % 3600, 0),
        Err(err) => panic!("seal failed: {}", err),
    }
}

#[tokio::test]
async fn signer_failure_aborts_the_seal() {
    let chain = TestChain::new(&[A]);
    let engine = chain.engine(fast_config());
    engine.authorize(
        address(A),
        Arc::new(|_: &Address, _: &[u8]| -> anyhow::Result<Vec<u8>> {
            Err(anyhow::anyhow!("keystore locked"))
        }),
    );

    let mut header = draft(&chain.genesis);
    engine.prepare(chain.store.as_ref(), &mut header).unwrap();
    assert!(header.seal_hash().is_ok());

    let block = Block::new(header, vec![], vec![]);
    assert_eq!(
        engine.seal(block, CancellationToken::new()).await,
        Err(DposError::Signer("keystore locked".to_string()))
    );
}

#[test]
fn prepare_needs_parent_and_signer() {
    let chain = TestChain::new(&[A]);
    let engine = chain.engine(fast_config());

    let mut header = draft(&chain.genesis);
    assert_eq!(
        engine.prepare(chain.store.as_ref(), &mut header),
        Err(DposError::Unauthorized)
    );

    let (signer, sign_fn) = local_signer(key(A)).unwrap();
    engine.authorize(signer, sign_fn);
    assert_eq!(engine.signer(), Some(address(A)));

    let mut orphan = draft(&chain.genesis);
    orphan.number = Some(7);
    assert_eq!(
        engine.prepare(chain.store.as_ref(), &mut orphan),
        Err(DposError::UnknownAncestor)
    );
}

#[test]
fn check_producer_follows_schedule() {
    let chain = TestChain::new(&[A, B]);
    let last_block = Block::new(chain.genesis.clone(), vec![], vec![]);

    let engine = chain.engine_for(DposConfig::default(), A);
    assert_eq!(engine.check_producer(&last_block, 0), Ok(()));
    assert_eq!(
        engine.check_producer(&last_block, 10),
        Err(DposError::InvalidBlockProducer)
    );
    assert_eq!(
        engine.check_producer(&last_block, 15),
        Err(DposError::InvalidMintTime)
    );

    let engine = chain.engine_for(DposConfig::default(), B);
    assert_eq!(engine.check_producer(&last_block, 10), Ok(()));

    let unauthorized = chain.engine(DposConfig::default());
    assert_eq!(
        unauthorized.check_producer(&last_block, 10),
        Err(DposError::InvalidBlockProducer)
    );
}

#[test]
fn check_token_noder_checks_deadline_first() {
    let context = DposContext::new(vec![address(A)]).with_token_noders(vec![address(B)]);
    let chain = TestChain::with_context(context, ChainConfig::new(1));
    let last_block = Block::new(chain.genesis.clone(), vec![], vec![]);

    let noder = chain.engine_for(DposConfig::default(), B);
    assert_eq!(noder.check_token_noder(&last_block, 10), Ok(()));
    assert_eq!(
        noder.check_token_noder(&last_block, 15),
        Err(DposError::InvalidMintTime)
    );

    let stale = Block::new(
        BlockHeader {
            timestamp: 20,
            ..chain.genesis.clone()
        },
        vec![],
        vec![],
    );
    assert_eq!(
        noder.check_token_noder(&stale, 10),
        Err(DposError::FutureBlock)
    );

    let producer = chain.engine_for(DposConfig::default(), A);
    assert_eq!(
        producer.check_token_noder(&last_block, 10),
        Err(DposError::InvalidTokenNoder)
    );
    assert_eq!(producer.check_deadline(&last_block, 10), Ok(()));
}

#[test]
fn reauthorization_swaps_signer() {
    let chain = TestChain::new(&[A, B]);
    let engine = chain.engine_for(DposConfig::default(), A);
    let last_block = Block::new(chain.genesis.clone(), vec![], vec![]);
    assert_eq!(engine.check_producer(&last_block, 0), Ok(()));

    let (signer, sign_fn) = local_signer(key(B)).unwrap();
    engine.authorize(signer, sign_fn);
    assert_eq!(
        engine.check_producer(&last_block, 0),
        Err(DposError::InvalidBlockProducer)
    );
    assert_eq!(engine.check_producer(&last_block, 10), Ok(()));
}

#[test]
fn api_reports_engine_view() {
    let chain = TestChain::new(&[A, B]);
    let blocks = chain.extend(&[(10, B), (20, A), (30, B)]);
    let engine = Arc::new(chain.engine(DposConfig::default().with_consensus_size(2)));
    let reader: Arc<dyn ChainReader> = chain.store.clone();
    let api = DposApi::new(reader, engine.clone());

    assert_eq!(api.confirmed_block_number().unwrap(), 0);
    engine.update_confirmed(chain.store.as_ref()).unwrap();
    assert_eq!(api.confirmed_block_number().unwrap(), blocks[1].height());

    assert_eq!(api.validators(None).unwrap(), vec![address(A), address(B)]);
    assert_eq!(
        api.validators(Some(0)).unwrap(),
        vec![address(A), address(B)]
    );
    assert_eq!(api.signer(2).unwrap(), address(A));
    assert_eq!(api.mint_count(0, &address(A), None).unwrap(), 0);
    assert_eq!(api.signer(9), Err(DposError::UnknownBlock));
}
