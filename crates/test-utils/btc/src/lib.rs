//! Builders for Bitcoin transactions and blocks used across the test suites.

use babylon_params::ParameterSet;
use babylon_primitives::Buf32;
use babylon_txfmt::{encode_stake_script, ProtocolVersion};
use bitcoin::{
    absolute::LockTime,
    block::{Header, Version as BlockVersion},
    hashes::Hash,
    transaction::Version,
    Amount, Block, BlockHash, CompactTarget, OutPoint, ScriptBuf, Sequence, Transaction,
    TxMerkleNode, TxIn, TxOut, Txid, Witness,
};

/// `OP_1 OP_PUSHBYTES_32 <key>`.
pub fn taproot_script(output_key: [u8; 32]) -> ScriptBuf {
    let mut bytes = vec![0x51, 0x20];
    bytes.extend_from_slice(&output_key);
    ScriptBuf::from_bytes(bytes)
}

/// `OP_0 OP_PUSHBYTES_20 <hash>`.
pub fn p2wpkh_script(hash: [u8; 20]) -> ScriptBuf {
    let mut bytes = vec![0x00, 0x14];
    bytes.extend_from_slice(&hash);
    ScriptBuf::from_bytes(bytes)
}

/// Identity output script used by [`StakeTxBuilder`].
pub fn identity_script() -> ScriptBuf {
    p2wpkh_script([0x5a; 20])
}

/// A small output with no special meaning.
pub fn dummy_output() -> TxOut {
    TxOut {
        value: Amount::from_sat(330),
        script_pubkey: p2wpkh_script([0x01; 20]),
    }
}

fn dummy_input(script_sig: ScriptBuf, witness: Witness) -> TxIn {
    TxIn {
        previous_output: OutPoint::new(Txid::all_zeros(), 0),
        script_sig,
        sequence: Sequence::MAX,
        witness,
    }
}

/// A one-input transaction paying to `outputs`.
pub fn tx_with_outputs(outputs: Vec<TxOut>) -> Transaction {
    Transaction {
        version: Version::TWO,
        lock_time: LockTime::ZERO,
        input: vec![dummy_input(ScriptBuf::new(), Witness::new())],
        output: outputs,
    }
}

/// A transaction whose single input carries the given unlocking data.
pub fn spending_tx(script_sig: ScriptBuf, witness: Witness) -> Transaction {
    Transaction {
        version: Version::TWO,
        lock_time: LockTime::ZERO,
        input: vec![dummy_input(script_sig, witness)],
        output: vec![dummy_output()],
    }
}

/// Builds a three-output stake transaction, valid against [`params_row`] by default.
#[derive(Debug, Clone)]
pub struct StakeTxBuilder {
    amount: Amount,
    version: ProtocolVersion,
    staker: Buf32,
    delegate: Buf32,
    staking_duration: u16,
    identity: ScriptBuf,
    // Distinguishes otherwise identical transactions.
    nonce: u32,
}

impl StakeTxBuilder {
    pub const DEFAULT_STAKER: Buf32 = Buf32([0xaa; 32]);
    pub const DEFAULT_DELEGATE: Buf32 = Buf32([0xbb; 32]);

    pub fn new() -> Self {
        Self {
            amount: Amount::from_sat(50_000),
            version: ProtocolVersion::V0,
            staker: Self::DEFAULT_STAKER,
            delegate: Self::DEFAULT_DELEGATE,
            staking_duration: 1000,
            identity: identity_script(),
            nonce: 0,
        }
    }

    pub fn amount(mut self, amount: Amount) -> Self {
        self.amount = amount;
        self
    }

    pub fn version(mut self, version: ProtocolVersion) -> Self {
        self.version = version;
        self
    }

    pub fn staker(mut self, staker: Buf32) -> Self {
        self.staker = staker;
        self
    }

    pub fn delegate(mut self, delegate: Buf32) -> Self {
        self.delegate = delegate;
        self
    }

    pub fn staking_duration(mut self, duration: u16) -> Self {
        self.staking_duration = duration;
        self
    }

    pub fn identity(mut self, script: ScriptBuf) -> Self {
        self.identity = script;
        self
    }

    pub fn nonce(mut self, nonce: u32) -> Self {
        self.nonce = nonce;
        self
    }

    pub fn build(self) -> Transaction {
        let mut tx = tx_with_outputs(vec![
            TxOut {
                value: self.amount,
                script_pubkey: taproot_script([0x42; 32]),
            },
            TxOut {
                value: Amount::ZERO,
                script_pubkey: encode_stake_script(
                    self.version,
                    &self.staker,
                    &self.delegate,
                    self.staking_duration,
                ),
            },
            TxOut {
                value: Amount::from_sat(10_000),
                script_pubkey: self.identity,
            },
        ]);
        tx.input[0].previous_output.vout = self.nonce;
        tx
    }
}

impl Default for StakeTxBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A parameter row with amounts in `[1_000, 10_000_000]` sats and times in `[100, 100_000]`.
pub fn params_row(version: u8, activation: u64, cap: Option<u64>) -> ParameterSet {
    ParameterSet {
        version,
        activation_height: activation,
        cap_height: cap,
        min_stake_amount: Amount::from_sat(1_000),
        max_stake_amount: Amount::from_sat(10_000_000),
        min_staking_duration: 100,
        max_staking_duration: 100_000,
    }
}

/// A block with a placeholder header holding `txs`.
pub fn block_with_txs(time: u32, txs: Vec<Transaction>) -> Block {
    Block {
        header: Header {
            version: BlockVersion::ONE,
            prev_blockhash: BlockHash::all_zeros(),
            merkle_root: TxMerkleNode::all_zeros(),
            time,
            bits: CompactTarget::from_consensus(0x207fffff),
            nonce: 0,
        },
        txdata: txs,
    }
}
