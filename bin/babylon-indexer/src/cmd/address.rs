//! `decode-address` and `recover-pubkey`.

use babylon_btcio::fetch_transactions;
use babylon_l1tx::{decode_address, recover_public_key, DecodedAddress, RecoveredKey};
use serde::Serialize;
use tracing::*;

use crate::{
    args::{SubcDecodeAddress, SubcRecoverPubkey},
    context::IndexerContext,
};

#[derive(Debug, Serialize)]
struct AddressView<'a> {
    address: &'a str,
    kind: &'static str,
    payload: String,
    script_pubkey: String,
}

impl<'a> AddressView<'a> {
    fn new(address: &'a str, decoded: &DecodedAddress) -> Self {
        Self {
            address,
            kind: decoded.kind.description(),
            payload: hex::encode(&decoded.payload),
            script_pubkey: hex::encode(decoded.script_pubkey.as_bytes()),
        }
    }
}

/// Address to recovered key mapping, `null` when the history reveals nothing.
#[derive(Debug, Serialize)]
struct RecoveryView<'a> {
    address: &'a str,
    public_key: Option<RecoveredKey>,
    searched: usize,
    unavailable: usize,
}

pub(super) fn exec_decode(args: SubcDecodeAddress, ctx: &IndexerContext) -> anyhow::Result<()> {
    let decoded = decode_address(&args.address, ctx.config.bitcoind.network)?;
    let view = AddressView::new(&args.address, &decoded);
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}

pub(super) async fn exec_recover(
    args: SubcRecoverPubkey,
    ctx: &IndexerContext,
) -> anyhow::Result<()> {
    // An address that does not decode is reported, not recovered.
    let decoded = decode_address(&args.address, ctx.config.bitcoind.network)?;

    let fetched = fetch_transactions(
        ctx.source.as_ref(),
        &args.txids,
        ctx.config.scan.workers,
        &ctx.retry,
    )
    .await;
    let unavailable = fetched.iter().filter(|(_, res)| res.is_err()).count();
    let history: Vec<_> = fetched.into_iter().filter_map(|(_, res)| res.ok()).collect();

    let public_key = recover_public_key(&decoded, &history);
    match &public_key {
        Some(key) => info!(address = %args.address, %key, "recovered public key"),
        None => warn!(address = %args.address, txs = history.len(), "no public key revealed"),
    }

    let view = RecoveryView {
        address: &args.address,
        public_key,
        searched: history.len(),
        unavailable,
    };
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}
