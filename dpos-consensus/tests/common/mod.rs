//! Shared fixtures: deterministic keys and signed header chains on an
//! in-memory database

#![allow(dead_code)]

use dpos_consensus::{local_signer, Dpos, DposConfig};
use dpos_core::{
    secret_key_to_address, sign_hash, Address, BlockHeader, ChainConfig, ContextStore, DposContext,
    Timestamp,
};
use dpos_db::{HeaderStore, KvContextStore, MemoryDatabase, SharedDatabase};
use std::sync::Arc;

/// Secret key of test account `n` (n > 0)
pub fn key(n: u8) -> [u8; 32] {
    [n; 32]
}

pub fn address(n: u8) -> Address {
    secret_key_to_address(&key(n)).unwrap()
}

/// Sign `header` in place with the key of account `n`
pub fn seal_with(header: &mut BlockHeader, n: u8) {
    let signature = sign_hash(&key(n), &header.seal_hash().unwrap()).unwrap();
    header.set_seal(&signature.to_bytes()).unwrap();
}

/// Unsealed child of `parent`, declared as produced by account `n`
pub fn child(parent: &BlockHeader, timestamp: Timestamp, n: u8) -> BlockHeader {
    BlockHeader {
        parent_hash: parent.hash(),
        number: Some(parent.height() + 1),
        timestamp,
        validator: address(n),
        coinbase: address(n),
        dpos_context: parent.dpos_context,
        ..Default::default()
    }
}

/// Sealed child of `parent`, produced and signed by account `n`
pub fn signed_child(parent: &BlockHeader, timestamp: Timestamp, n: u8) -> BlockHeader {
    let mut header = child(parent, timestamp, n);
    seal_with(&mut header, n);
    header
}

/// Route engine logs to the test harness; repeated calls are no-ops
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub struct TestChain {
    pub db: SharedDatabase,
    pub store: Arc<HeaderStore>,
    pub contexts: Arc<KvContextStore>,
    pub genesis: BlockHeader,
}

impl TestChain {
    /// Chain whose genesis schedules the given accounts in order
    pub fn new(roster: &[u8]) -> Self {
        let validators = roster.iter().map(|n| address(*n)).collect();
        Self::with_context(DposContext::new(validators), ChainConfig::new(1))
    }

    pub fn with_context(context: DposContext, chain_config: ChainConfig) -> Self {
        init_tracing();
        let db: SharedDatabase = Arc::new(MemoryDatabase::new());
        let contexts = Arc::new(KvContextStore::new(db.clone()));
        let proto = contexts.commit(&context).unwrap();
        let genesis = BlockHeader::genesis(0, proto);

        let store = Arc::new(HeaderStore::new(db.clone(), chain_config).unwrap());
        store.insert(&genesis).unwrap();

        Self {
            db,
            store,
            contexts,
            genesis,
        }
    }

    pub fn engine(&self, config: DposConfig) -> Dpos {
        Dpos::new(config, self.db.clone(), self.contexts.clone()).unwrap()
    }

    /// Engine authorized to seal as account `n`
    pub fn engine_for(&self, config: DposConfig, n: u8) -> Dpos {
        let engine = self.engine(config);
        let (signer, sign_fn) = local_signer(key(n)).unwrap();
        engine.authorize(signer, sign_fn);
        engine
    }

    pub fn head(&self) -> BlockHeader {
        use dpos_core::ChainReader;
        self.store.current_header().unwrap()
    }

    /// Append sealed blocks on the current head, one per `(timestamp, account)`
    pub fn extend(&self, blocks: &[(Timestamp, u8)]) -> Vec<BlockHeader> {
        let mut parent = self.head();
        let mut added = Vec::with_capacity(blocks.len());
        for (timestamp, n) in blocks {
            let header = signed_child(&parent, *timestamp, *n);
            self.store.insert(&header).unwrap();
            parent = header.clone();
            added.push(header);
        }
        added
    }
}
