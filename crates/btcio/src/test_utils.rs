//! In-memory [`BlockSource`] with failure injection.

use std::{
    collections::{BTreeMap, HashMap},
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use bitcoin::{hashes::Hash, Block, BlockHash, Transaction, Txid};
use parking_lot::Mutex;

use crate::source::{BlockSource, FetchError};

#[derive(Debug, Clone, Copy)]
enum Fault {
    /// Fail the next `n` hash lookups transiently.
    Transient(u32),
    AlwaysTransient,
    Fatal,
}

/// Serves blocks and transactions from memory.
///
/// Faults and delays are keyed by height and apply to `block_hash_at`.
#[derive(Debug, Default)]
pub struct MockBlockSource {
    blocks: BTreeMap<u64, (BlockHash, Block)>,
    txs: HashMap<Txid, Transaction>,
    faults: Mutex<HashMap<u64, Fault>>,
    delays: HashMap<u64, Duration>,
    hash_requests: AtomicUsize,
}

/// Blocks built by the test helpers share headers, so key them by height instead.
fn synthetic_hash(height: u64) -> BlockHash {
    let mut bytes = [0u8; 32];
    bytes[..8].copy_from_slice(&height.to_le_bytes());
    bytes[31] = 0xbb;
    BlockHash::from_byte_array(bytes)
}

impl MockBlockSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a block at `height` and indexes its transactions.
    pub fn push_block(&mut self, height: u64, block: Block) {
        for tx in &block.txdata {
            self.txs.insert(tx.compute_txid(), tx.clone());
        }
        self.blocks.insert(height, (synthetic_hash(height), block));
    }

    pub fn push_transaction(&mut self, tx: Transaction) {
        self.txs.insert(tx.compute_txid(), tx);
    }

    pub fn fail_transiently(&mut self, height: u64, times: u32) {
        self.faults.get_mut().insert(height, Fault::Transient(times));
    }

    pub fn fail_always(&mut self, height: u64) {
        self.faults.get_mut().insert(height, Fault::AlwaysTransient);
    }

    pub fn fail_fatally(&mut self, height: u64) {
        self.faults.get_mut().insert(height, Fault::Fatal);
    }

    pub fn delay_height(&mut self, height: u64, delay: Duration) {
        self.delays.insert(height, delay);
    }

    /// Number of `block_hash_at` calls served so far, failed ones included.
    pub fn hash_requests(&self) -> usize {
        self.hash_requests.load(Ordering::SeqCst)
    }

    fn take_fault(&self, height: u64) -> Option<FetchError> {
        let mut faults = self.faults.lock();
        match faults.get_mut(&height)? {
            Fault::Transient(0) => None,
            Fault::Transient(n) => {
                *n -= 1;
                Some(FetchError::transient(format!("injected at {height}")))
            }
            Fault::AlwaysTransient => Some(FetchError::transient(format!("injected at {height}"))),
            Fault::Fatal => Some(FetchError::fatal(format!("injected at {height}"))),
        }
    }
}

#[async_trait]
impl BlockSource for MockBlockSource {
    async fn current_height(&self) -> Result<u64, FetchError> {
        Ok(self.blocks.keys().next_back().copied().unwrap_or(0))
    }

    async fn block_hash_at(&self, height: u64) -> Result<BlockHash, FetchError> {
        self.hash_requests.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(&height) {
            tokio::time::sleep(*delay).await;
        }
        if let Some(err) = self.take_fault(height) {
            return Err(err);
        }
        self.blocks
            .get(&height)
            .map(|(hash, _)| *hash)
            .ok_or_else(|| FetchError::fatal(format!("no block at height {height}")))
    }

    async fn block_by_hash(&self, hash: &BlockHash) -> Result<Block, FetchError> {
        self.blocks
            .values()
            .find(|(h, _)| h == hash)
            .map(|(_, block)| block.clone())
            .ok_or_else(|| FetchError::fatal(format!("unknown block {hash}")))
    }

    async fn raw_transaction(&self, txid: &Txid) -> Result<Transaction, FetchError> {
        self.txs
            .get(txid)
            .cloned()
            .ok_or_else(|| FetchError::fatal(format!("unknown transaction {txid}")))
    }
}
