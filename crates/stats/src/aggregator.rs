use std::collections::{BTreeMap, BTreeSet};

use babylon_primitives::{Buf32, StakeRecord};
use bitcoin::Txid;

use crate::report::{
    sat_to_btc, AggregateReport, DelegateReport, Summary, TimeRange, TxEntry, VersionReport,
};

#[derive(Debug, Clone, Copy, Default)]
struct TimeSpan {
    first: Option<u64>,
    last: Option<u64>,
}

impl TimeSpan {
    fn observe(&mut self, ts: u64) {
        self.first = Some(self.first.map_or(ts, |f| f.min(ts)));
        self.last = Some(self.last.map_or(ts, |l| l.max(ts)));
    }

    fn to_range(self) -> TimeRange {
        let duration_seconds = match (self.first, self.last) {
            (Some(first), Some(last)) => last - first,
            _ => 0,
        };
        TimeRange {
            first_timestamp: self.first,
            last_timestamp: self.last,
            duration_seconds,
        }
    }
}

/// Running totals for one slice of the record stream.
#[derive(Debug, Clone, Default)]
struct Bucket {
    total_sat: u64,
    stakers: BTreeSet<String>,
    delegates: BTreeSet<Buf32>,
    versions: BTreeSet<u8>,
    blocks: BTreeSet<u64>,
    txids: Vec<Txid>,
    span: TimeSpan,
}

impl Bucket {
    fn observe(&mut self, rec: &StakeRecord) {
        self.total_sat = self.total_sat.saturating_add(rec.stake_amount);
        self.stakers.insert(rec.staker_address.clone());
        self.delegates.insert(rec.delegate_id);
        self.versions.insert(rec.protocol_version);
        self.blocks.insert(rec.block_height);
        self.txids.push(rec.txid);
        self.span.observe(rec.timestamp);
    }

    fn average_btc(&self) -> f64 {
        if self.txids.is_empty() {
            return 0.0;
        }
        sat_to_btc(self.total_sat) / self.txids.len() as f64
    }
}

/// Single-writer accumulator over [`StakeRecord`]s.
///
/// Feed it records in emission order, then call [`Aggregator::finalize`].
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    overall: Bucket,
    versions: BTreeMap<u8, Bucket>,
    delegates: BTreeMap<Buf32, Bucket>,
    transactions: Vec<TxEntry>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, rec: &StakeRecord) {
        self.overall.observe(rec);
        self.versions
            .entry(rec.protocol_version)
            .or_default()
            .observe(rec);
        self.delegates
            .entry(rec.delegate_id)
            .or_default()
            .observe(rec);
        self.transactions.push(TxEntry {
            txid: rec.txid,
            block_height: rec.block_height,
            timestamp: rec.timestamp,
            stake_amount_sat: rec.stake_amount,
            stake_amount_btc: sat_to_btc(rec.stake_amount),
            staker_address: rec.staker_address.clone(),
            finality_provider: rec.delegate_id,
            version: rec.protocol_version,
        });
    }

    /// Number of records observed so far.
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn finalize(self) -> AggregateReport {
        let summary = Summary {
            total_stake_sat: self.overall.total_sat,
            total_stake_btc: sat_to_btc(self.overall.total_sat),
            unique_stakers_count: self.overall.stakers.len(),
            total_transactions: self.overall.txids.len(),
            finality_provider_count: self.delegates.len(),
            unique_blocks: self.overall.blocks.len(),
            time_range: self.overall.span.to_range(),
        };

        let versions = self
            .versions
            .into_iter()
            .map(|(v, b)| {
                let report = VersionReport {
                    total_stake_sat: b.total_sat,
                    total_stake_btc: sat_to_btc(b.total_sat),
                    transaction_count: b.txids.len(),
                    unique_stakers: b.stakers.len(),
                    unique_fps: b.delegates.len(),
                    unique_blocks: b.blocks.len(),
                    time_range: b.span.to_range(),
                };
                (v, report)
            })
            .collect();

        let finality_providers = self
            .delegates
            .into_iter()
            .map(|(id, b)| {
                let report = DelegateReport {
                    total_stake_sat: b.total_sat,
                    total_stake_btc: sat_to_btc(b.total_sat),
                    unique_stakers_count: b.stakers.len(),
                    transaction_count: b.txids.len(),
                    unique_blocks: b.blocks.len(),
                    versions_used: b.versions.iter().copied().collect(),
                    average_stake_btc: b.average_btc(),
                    time_range: b.span.to_range(),
                    transactions: b.txids,
                };
                (id, report)
            })
            .collect();

        AggregateReport {
            summary,
            versions,
            finality_providers,
            transactions: self.transactions,
        }
    }
}

impl<'a> Extend<&'a StakeRecord> for Aggregator {
    fn extend<I: IntoIterator<Item = &'a StakeRecord>>(&mut self, iter: I) {
        for rec in iter {
            self.observe(rec);
        }
    }
}
