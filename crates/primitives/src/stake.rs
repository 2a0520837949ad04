//! Validated stake observations.

use bitcoin::Txid;
use serde::{Deserialize, Serialize};

use crate::Buf32;

/// Position of a transaction on chain, as known to whoever fetched it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockContext {
    /// Height of the containing block.
    pub height: u64,

    /// Header timestamp of the containing block.
    pub time: u64,
}

impl BlockContext {
    pub fn new(height: u64, time: u64) -> Self {
        Self { height, time }
    }
}

/// One stake transaction that passed every classifier check.
///
/// Records are only ever built by the classifier and are never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeRecord {
    pub txid: Txid,

    pub block_height: u64,

    pub timestamp: u64,

    /// Value locked in the staking output, in satoshis.
    pub stake_amount: u64,

    /// Address of the identity output, or its script hex when it has no address form.
    pub staker_address: String,

    #[serde(rename = "staker_public_key")]
    pub staker_key: Buf32,

    #[serde(rename = "finality_provider")]
    pub delegate_id: Buf32,

    #[serde(rename = "version")]
    pub protocol_version: u8,

    #[serde(rename = "staking_time")]
    pub staking_duration: Option<u16>,
}
