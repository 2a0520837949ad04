use std::collections::BTreeMap;

use babylon_primitives::Buf32;
use bitcoin::{Amount, Txid};
use serde::{Deserialize, Serialize};

pub(crate) fn sat_to_btc(sat: u64) -> f64 {
    Amount::from_sat(sat).to_btc()
}

/// Observed first and last block timestamps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub first_timestamp: Option<u64>,
    pub last_timestamp: Option<u64>,
    pub duration_seconds: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_stake_sat: u64,
    pub total_stake_btc: f64,
    pub unique_stakers_count: usize,
    pub total_transactions: usize,
    pub finality_provider_count: usize,
    pub unique_blocks: usize,
    pub time_range: TimeRange,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VersionReport {
    pub total_stake_sat: u64,
    pub total_stake_btc: f64,
    pub transaction_count: usize,
    pub unique_stakers: usize,
    pub unique_fps: usize,
    pub unique_blocks: usize,
    pub time_range: TimeRange,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DelegateReport {
    pub total_stake_sat: u64,
    pub total_stake_btc: f64,
    pub unique_stakers_count: usize,
    pub transaction_count: usize,
    pub unique_blocks: usize,
    pub versions_used: Vec<u8>,

    /// Zero when there are no transactions.
    pub average_stake_btc: f64,
    pub time_range: TimeRange,

    /// In emission order.
    pub transactions: Vec<Txid>,
}

/// One record as it appears in the report's transaction list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxEntry {
    pub txid: Txid,
    pub block_height: u64,
    pub timestamp: u64,
    pub stake_amount_sat: u64,
    pub stake_amount_btc: f64,
    pub staker_address: String,
    pub finality_provider: Buf32,
    pub version: u8,
}

/// Final report. Maps are ordered by key so serialization is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateReport {
    pub summary: Summary,
    pub versions: BTreeMap<u8, VersionReport>,
    pub finality_providers: BTreeMap<Buf32, DelegateReport>,
    pub transactions: Vec<TxEntry>,
}
