use std::sync::Arc;

use async_trait::async_trait;
use bitcoin::{Block, BlockHash, Transaction, Txid};
use bitcoind_async_client::{error::ClientError, traits::Reader};

use crate::source::{BlockSource, FetchError};

/// [`BlockSource`] backed by a bitcoind RPC reader.
///
/// Transport failures and server-side HTTP errors are transient. RPC errors
/// such as an out-of-range height or an unknown txid are fatal, as are
/// responses that do not parse.
#[derive(Debug)]
pub struct BitcoindSource<R> {
    client: Arc<R>,
}

impl<R> BitcoindSource<R> {
    pub fn new(client: Arc<R>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &R {
        &self.client
    }
}

impl<R> Clone for BitcoindSource<R> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
        }
    }
}

fn rpc_err(method: &str, err: ClientError) -> FetchError {
    let msg = format!("{method}: {err}");
    if err.is_retriable() {
        FetchError::transient(msg)
    } else {
        FetchError::fatal(msg)
    }
}

#[async_trait]
impl<R: Reader + Send + Sync + 'static> BlockSource for BitcoindSource<R> {
    async fn current_height(&self) -> Result<u64, FetchError> {
        let info = self
            .client
            .get_blockchain_info()
            .await
            .map_err(|e| rpc_err("getblockchaininfo", e))?;
        Ok(info.blocks.into())
    }

    async fn block_hash_at(&self, height: u64) -> Result<BlockHash, FetchError> {
        self.client
            .get_block_hash(height)
            .await
            .map_err(|e| rpc_err("getblockhash", e))
    }

    async fn block_by_hash(&self, hash: &BlockHash) -> Result<Block, FetchError> {
        self.client
            .get_block(hash)
            .await
            .map_err(|e| rpc_err("getblock", e))
    }

    async fn raw_transaction(&self, txid: &Txid) -> Result<Transaction, FetchError> {
        let raw = self
            .client
            .get_raw_transaction_verbosity_zero(txid)
            .await
            .map_err(|e| rpc_err("getrawtransaction", e))?;
        Ok(raw.0)
    }
}
