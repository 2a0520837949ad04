//! Classification of candidate transactions into validated stake records.

use std::sync::Arc;

use babylon_params::ParamsTable;
use babylon_primitives::{BlockContext, StakeRecord};
use babylon_txfmt::PayloadDecoder;
use bitcoin::{Address, Network, Transaction, TxOut};

mod rejection;

pub use rejection::Rejection;

/// Number of outputs a stake transaction has: stake, payload, identity.
pub const STAKE_TX_OUTPUTS: usize = 3;

/// Applies the stake transaction rules against a parameter table.
#[derive(Debug, Clone)]
pub struct StakeClassifier {
    params: Arc<ParamsTable>,
    decoder: PayloadDecoder,
    network: Network,
}

impl StakeClassifier {
    pub fn new(params: Arc<ParamsTable>, network: Network) -> Self {
        Self {
            params,
            decoder: PayloadDecoder::default(),
            network,
        }
    }

    pub fn with_decoder(mut self, decoder: PayloadDecoder) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn params(&self) -> &ParamsTable {
        &self.params
    }

    pub fn decoder(&self) -> &PayloadDecoder {
        &self.decoder
    }

    /// Runs the checks in order and stops at the first failure.
    pub fn classify(&self, tx: &Transaction, ctx: BlockContext) -> Result<StakeRecord, Rejection> {
        let [stake_out, payload_out, identity_out] = tx.output.as_slice() else {
            return Err(Rejection::WrongShape(tx.output.len()));
        };

        if !stake_out.script_pubkey.is_p2tr() {
            return Err(Rejection::WrongStakeOutput);
        }
        let amount = stake_out.value;

        let payload = self.decoder.decode(payload_out.script_pubkey.as_bytes())?;
        let version = payload.version.as_u8();

        // A fallback row of another version is not authoritative for this payload.
        let params = match self.params.resolve(ctx.height, version) {
            Some(params) if params.version == version => params,
            other => {
                return Err(Rejection::NoApplicableParameters {
                    height: ctx.height,
                    version,
                    resolved: other.map(|params| params.version),
                })
            }
        };

        if !params.amount_in_range(amount) {
            return Err(Rejection::AmountOutOfRange {
                amount,
                min: params.min_stake_amount,
                max: params.max_stake_amount,
            });
        }

        if let Some(duration) = payload.staking_duration {
            if !params.duration_in_range(duration as u64) {
                return Err(Rejection::DurationOutOfRange {
                    duration,
                    min: params.min_staking_duration,
                    max: params.max_staking_duration,
                });
            }
        }

        Ok(StakeRecord {
            txid: tx.compute_txid(),
            block_height: ctx.height,
            timestamp: ctx.time,
            stake_amount: amount.to_sat(),
            staker_address: self.identity_of(identity_out),
            staker_key: payload.staker_key,
            delegate_id: payload.delegate_id,
            protocol_version: version,
            staking_duration: payload.staking_duration,
        })
    }

    /// Attribution by convention: the identity output's address, or its script
    /// hex when it has no address form.
    fn identity_of(&self, out: &TxOut) -> String {
        Address::from_script(&out.script_pubkey, self.network)
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| out.script_pubkey.to_hex_string())
    }
}

#[cfg(test)]
mod tests {
    use babylon_primitives::Buf32;
    use babylon_test_utils_btc::{
        dummy_output, identity_script, p2wpkh_script, params_row, taproot_script,
        StakeTxBuilder,
    };
    use babylon_txfmt::{
        encode_stake_script, DecodeError, MalformedPayload, PayloadLayout, ProtocolVersion,
        FIXED_TERM_SUFFIX,
    };
    use bitcoin::{Amount, ScriptBuf};

    use super::*;

    const HEIGHT: u64 = 200;

    fn classifier_with(min_stake: u64) -> StakeClassifier {
        let mut row = params_row(0, 100, None);
        row.min_stake_amount = Amount::from_sat(min_stake);
        let table = ParamsTable::new(vec![row]).unwrap();
        StakeClassifier::new(Arc::new(table), Network::Regtest)
    }

    fn fixed_term_classifier(max_duration: u64) -> StakeClassifier {
        let mut row = params_row(0, 100, None);
        row.max_staking_duration = max_duration;
        let table = ParamsTable::new(vec![row]).unwrap();
        StakeClassifier::new(Arc::new(table), Network::Regtest)
            .with_decoder(PayloadDecoder::new(PayloadLayout::FixedTerm))
    }

    fn ctx() -> BlockContext {
        BlockContext::new(HEIGHT, 1_700_000_000)
    }

    #[test]
    fn test_valid_stake() {
        let tx = StakeTxBuilder::new()
            .amount(Amount::from_sat(50_000))
            .staking_duration(1000)
            .build();

        let record = classifier_with(1000).classify(&tx, ctx()).unwrap();
        assert_eq!(record.stake_amount, 50_000);
        assert_eq!(record.block_height, HEIGHT);
        assert_eq!(record.protocol_version, 0);
        assert_eq!(record.staking_duration, Some(1000));
        assert_eq!(record.txid, tx.compute_txid());
        assert_eq!(record.delegate_id, StakeTxBuilder::DEFAULT_DELEGATE);
        assert!(record.staker_address.starts_with("bcrt1q"));
    }

    #[test]
    fn test_record_carries_payload_and_identity() {
        let identity = p2wpkh_script([0x33; 20]);
        let tx = StakeTxBuilder::new()
            .staker(Buf32([0x11; 32]))
            .delegate(Buf32([0x22; 32]))
            .identity(identity.clone())
            .build();

        let record = classifier_with(1000).classify(&tx, ctx()).unwrap();
        let expected = Address::from_script(&identity, Network::Regtest).unwrap();
        assert_eq!(record.staker_key, Buf32([0x11; 32]));
        assert_eq!(record.delegate_id, Buf32([0x22; 32]));
        assert_eq!(record.staker_address, expected.to_string());
    }

    #[test]
    fn test_amount_below_minimum() {
        let tx = StakeTxBuilder::new()
            .amount(Amount::from_sat(50_000))
            .staking_duration(1000)
            .build();

        let err = classifier_with(100_000).classify(&tx, ctx()).unwrap_err();
        assert_eq!(
            err,
            Rejection::AmountOutOfRange {
                amount: Amount::from_sat(50_000),
                min: Amount::from_sat(100_000),
                max: Amount::from_sat(10_000_000),
            }
        );
    }

    #[test]
    fn test_wrong_output_counts() {
        let classifier = classifier_with(1000);
        let full = StakeTxBuilder::new().build();

        for count in [0, 1, 2, 4] {
            let mut tx = full.clone();
            tx.output = (0..count)
                .map(|i| full.output.get(i).cloned().unwrap_or_else(dummy_output))
                .collect();
            assert_eq!(
                classifier.classify(&tx, ctx()),
                Err(Rejection::WrongShape(count))
            );
        }
    }

    #[test]
    fn test_stake_output_must_be_taproot() {
        let mut tx = StakeTxBuilder::new().build();
        tx.output[0].script_pubkey = identity_script();

        assert_eq!(
            classifier_with(1000).classify(&tx, ctx()),
            Err(Rejection::WrongStakeOutput)
        );
    }

    #[test]
    fn test_payload_must_decode() {
        let mut tx = StakeTxBuilder::new().build();
        tx.output[1].script_pubkey = ScriptBuf::from_bytes(vec![0x6a, 0x03, 1, 2, 3]);

        assert_eq!(
            classifier_with(1000).classify(&tx, ctx()),
            Err(Rejection::PayloadDecodeFailed(DecodeError::NotThisProtocol))
        );
    }

    #[test]
    fn test_duration_out_of_range() {
        let tx = StakeTxBuilder::new().staking_duration(50).build();

        assert_eq!(
            classifier_with(1000).classify(&tx, ctx()),
            Err(Rejection::DurationOutOfRange {
                duration: 50,
                min: 100,
                max: 100_000,
            })
        );
    }

    #[test]
    fn test_version_mismatch_is_rejected() {
        // Only a version 0 row exists, so a version 1 payload falls back to it.
        let tx = StakeTxBuilder::new().version(ProtocolVersion::V1).build();

        assert_eq!(
            classifier_with(1000).classify(&tx, ctx()),
            Err(Rejection::NoApplicableParameters {
                height: HEIGHT,
                version: 1,
                resolved: Some(0),
            })
        );
    }

    #[test]
    fn test_height_before_activation() {
        let tx = StakeTxBuilder::new().build();
        let early = BlockContext::new(50, 0);

        assert_eq!(
            classifier_with(1000).classify(&tx, early),
            Err(Rejection::NoApplicableParameters {
                height: 50,
                version: 0,
                resolved: None,
            })
        );
    }

    #[test]
    fn test_nonstandard_identity_output_uses_script_hex() {
        let mut tx = StakeTxBuilder::new().build();
        let script = ScriptBuf::from_bytes(vec![0xde, 0xad]);
        tx.output[2].script_pubkey = script.clone();

        let record = classifier_with(1000).classify(&tx, ctx()).unwrap();
        assert_eq!(record.staker_address, script.to_hex_string());
    }

    #[test]
    fn test_check_order_shape_before_payload() {
        // A valid payload in the wrong position still fails on the stake output first.
        let mut tx = StakeTxBuilder::new().build();
        tx.output[0].script_pubkey =
            encode_stake_script(ProtocolVersion::V0, &Buf32([1; 32]), &Buf32([2; 32]), 1000);
        tx.output[1].script_pubkey = taproot_script([7; 32]);

        assert_eq!(
            classifier_with(1000).classify(&tx, ctx()),
            Err(Rejection::WrongStakeOutput)
        );
    }

    #[test]
    fn test_fixed_term_skips_duration_check() {
        // The trailing 0xfa00 reads as 64000 blocks under the standard layout.
        let tx = StakeTxBuilder::new()
            .staking_duration(u16::from_be_bytes(FIXED_TERM_SUFFIX))
            .build();

        let standard = fixed_term_classifier(1000).with_decoder(PayloadDecoder::default());
        assert_eq!(
            standard.classify(&tx, ctx()),
            Err(Rejection::DurationOutOfRange {
                duration: 64_000,
                min: 100,
                max: 1000,
            })
        );

        let record = fixed_term_classifier(1000).classify(&tx, ctx()).unwrap();
        assert_eq!(record.staking_duration, None);
        assert_eq!(record.delegate_id, StakeTxBuilder::DEFAULT_DELEGATE);
        assert_eq!(record.staker_key, StakeTxBuilder::DEFAULT_STAKER);
        assert_eq!(record.stake_amount, 50_000);
    }

    #[test]
    fn test_fixed_term_bad_suffix() {
        let tx = StakeTxBuilder::new().staking_duration(1000).build();

        assert_eq!(
            fixed_term_classifier(100_000).classify(&tx, ctx()),
            Err(Rejection::PayloadDecodeFailed(DecodeError::Malformed(
                MalformedPayload::Suffix {
                    expected: FIXED_TERM_SUFFIX,
                    got: 1000u16.to_be_bytes(),
                }
            )))
        );
    }
}
