//! Bitcoin client, parameter table and scan window initialization.

use std::sync::Arc;

use babylon_btcio::{BitcoindSource, BlockSource, RetryPolicy, ScanWindow};
use babylon_config::{BitcoindConfig, Config, ScanConfig};
use babylon_params::ParamsTable;
use bitcoind_async_client::{Auth, Client};
use tracing::*;

use crate::errors::InitError;

/// Everything a command needs once startup succeeded.
pub(crate) struct IndexerContext {
    pub(crate) config: Config,
    pub(crate) source: Arc<BitcoindSource<Client>>,
    pub(crate) retry: RetryPolicy,
}

pub(crate) fn init_context(config: Config) -> Result<IndexerContext, InitError> {
    let client = create_bitcoin_rpc_client(&config.bitcoind)?;
    let retry = RetryPolicy::from(&config.retry);
    Ok(IndexerContext {
        source: Arc::new(BitcoindSource::new(client)),
        retry,
        config,
    })
}

/// Bitcoin client initialization
fn create_bitcoin_rpc_client(config: &BitcoindConfig) -> Result<Arc<Client>, InitError> {
    let auth = Auth::UserPass(config.rpc_user.clone(), config.rpc_password.clone());
    let btc_rpc = Client::new(
        config.rpc_url.clone(),
        auth,
        config.retry_count.map(u16::from),
        config.retry_interval,
        None,
    )
    .map_err(|e| InitError::BitcoinClientCreation(e.to_string()))?;
    Ok(btc_rpc.into())
}

pub(crate) fn load_params(config: &Config) -> Result<Arc<ParamsTable>, InitError> {
    let table = ParamsTable::load(&config.params.path)?;
    info!(path = %config.params.path.display(), rows = table.rows().len(), "loaded parameter table");
    Ok(Arc::new(table))
}

/// Turns the scan config into a concrete window, asking `source` for the tip
/// when the end height is not given.
pub(crate) async fn resolve_window<S: BlockSource + ?Sized>(
    scan: &ScanConfig,
    source: &S,
    retry: &RetryPolicy,
) -> Result<ScanWindow, InitError> {
    let end = match scan.end_height {
        Some(end) => end,
        None => retry
            .run("getblockchaininfo", || source.current_height())
            .await
            .map_err(InitError::ChainTip)?,
    };
    let start = scan
        .start_height
        .unwrap_or_else(|| end.saturating_sub(scan.scan_range));

    let window = ScanWindow::new(start, end, scan.batch_size);
    if window.is_empty() {
        return Err(InitError::EmptyWindow { start, end });
    }
    Ok(window)
}
