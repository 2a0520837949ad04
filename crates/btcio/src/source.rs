use async_trait::async_trait;
use bitcoin::{Block, BlockHash, Transaction, Txid};
use thiserror::Error;

/// Failure reported by a [`BlockSource`].
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Timeouts, rate limiting, dropped connections. Worth retrying.
    #[error("transient fetch failure: {0}")]
    Transient(String),

    /// The request can never succeed as issued.
    #[error("fatal fetch failure: {0}")]
    Fatal(String),
}

impl FetchError {
    pub fn transient(msg: impl Into<String>) -> Self {
        Self::Transient(msg.into())
    }

    pub fn fatal(msg: impl Into<String>) -> Self {
        Self::Fatal(msg.into())
    }

    /// Check if this error should be retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// Height and txid keyed access to chain data.
#[async_trait]
pub trait BlockSource: Send + Sync + 'static {
    /// Height of the current best block.
    async fn current_height(&self) -> Result<u64, FetchError>;

    async fn block_hash_at(&self, height: u64) -> Result<BlockHash, FetchError>;

    async fn block_by_hash(&self, hash: &BlockHash) -> Result<Block, FetchError>;

    async fn raw_transaction(&self, txid: &Txid) -> Result<Transaction, FetchError>;
}
