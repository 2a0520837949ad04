//! `debug-tx`: per-output dump of one transaction.

use babylon_btcio::BlockSource;
use babylon_txfmt::{DecodeError, PayloadDecoder, ProtocolPayload};
use bitcoin::{Address, Amount, Network, Script, Transaction};
use tracing::*;

use super::decoder_for;
use crate::{args::SubcDebugTx, context::IndexerContext};

#[derive(Debug)]
struct OutputInfo {
    index: usize,
    value: Amount,
    kind: &'static str,
    address: Option<String>,
    /// Decode result for null-data outputs.
    payload: Option<Result<ProtocolPayload, DecodeError>>,
}

fn script_kind(script: &Script) -> &'static str {
    if script.is_p2tr() {
        "p2tr"
    } else if script.is_p2wpkh() {
        "p2wpkh"
    } else if script.is_p2wsh() {
        "p2wsh"
    } else if script.is_p2pkh() {
        "p2pkh"
    } else if script.is_p2sh() {
        "p2sh"
    } else if script.is_op_return() {
        "op_return"
    } else {
        "nonstandard"
    }
}

fn describe_outputs(
    tx: &Transaction,
    network: Network,
    decoder: &PayloadDecoder,
) -> Vec<OutputInfo> {
    tx.output
        .iter()
        .enumerate()
        .map(|(index, out)| {
            let script = out.script_pubkey.as_script();
            OutputInfo {
                index,
                value: out.value,
                kind: script_kind(script),
                address: Address::from_script(script, network)
                    .ok()
                    .map(|a| a.to_string()),
                payload: script
                    .is_op_return()
                    .then(|| decoder.decode(script.as_bytes())),
            }
        })
        .collect()
}

pub(super) async fn exec(args: SubcDebugTx, ctx: &IndexerContext) -> anyhow::Result<()> {
    let txid = args.txid;
    let source = ctx.source.as_ref();
    let tx = ctx
        .retry
        .run("getrawtransaction", || source.raw_transaction(&txid))
        .await?;

    info!(%txid, inputs = tx.input.len(), outputs = tx.output.len(), "transaction");
    let decoder = decoder_for(args.fixed_term);
    for out in describe_outputs(&tx, ctx.config.bitcoind.network, &decoder) {
        info!(
            index = out.index,
            value = %out.value,
            kind = out.kind,
            address = out.address.as_deref().unwrap_or("-"),
            "output"
        );
        match out.payload {
            Some(Ok(payload)) => info!(
                index = out.index,
                version = %payload.version,
                staker_key = %payload.staker_key,
                delegate = %payload.delegate_id,
                staking_time = ?payload.staking_duration,
                "stake payload"
            ),
            Some(Err(err)) => {
                let raw = hex::encode(tx.output[out.index].script_pubkey.as_bytes());
                info!(index = out.index, %err, %raw, "null-data output is not a stake payload");
            }
            None => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use babylon_test_utils_btc::{identity_script, tx_with_outputs, StakeTxBuilder};
    use bitcoin::{ScriptBuf, TxOut};

    use super::*;

    #[test]
    fn test_describe_stake_tx() {
        let tx = StakeTxBuilder::new().build();
        let outs = describe_outputs(&tx, Network::Regtest, &PayloadDecoder::default());

        let kinds: Vec<_> = outs.iter().map(|o| o.kind).collect();
        assert_eq!(kinds, vec!["p2tr", "op_return", "p2wpkh"]);
        assert_eq!(outs[0].value, Amount::from_sat(50_000));
        assert!(outs[1].address.is_none());
        assert!(outs[2].address.as_deref().unwrap().starts_with("bcrt1q"));

        let payload = outs[1].payload.clone().unwrap().unwrap();
        assert_eq!(payload.staker_key, StakeTxBuilder::DEFAULT_STAKER);
        assert!(outs[0].payload.is_none());
    }

    #[test]
    fn test_describe_foreign_op_return() {
        let tx = tx_with_outputs(vec![
            TxOut {
                value: Amount::ZERO,
                script_pubkey: ScriptBuf::from_bytes(vec![0x6a, 0x02, 0xbe, 0xef]),
            },
            TxOut {
                value: Amount::from_sat(1),
                script_pubkey: identity_script(),
            },
        ]);
        let outs = describe_outputs(&tx, Network::Regtest, &PayloadDecoder::default());
        assert!(matches!(
            outs[0].payload,
            Some(Err(DecodeError::NotThisProtocol))
        ));
    }
}
