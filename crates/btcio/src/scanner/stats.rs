use std::collections::BTreeMap;

use serde::Serialize;

/// Running counters for one scan. Observational only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    pub blocks_scanned: u64,

    /// Heights whose fetch failed past the retry ceiling.
    pub skipped_heights: Vec<u64>,

    pub txs_seen: u64,

    /// Transactions that passed the magic prefix pre-filter.
    pub candidates: u64,

    pub validated: u64,

    /// Classifier rejections of candidates, keyed by reason label.
    pub rejections: BTreeMap<&'static str, u64>,

    /// Set when the scan stopped early on cancellation.
    pub cancelled: bool,
}

impl ScanStats {
    pub fn blocks_skipped(&self) -> usize {
        self.skipped_heights.len()
    }

    pub(crate) fn record_skip(&mut self, height: u64) {
        self.skipped_heights.push(height);
    }

    pub(crate) fn absorb(&mut self, block: &BlockTally) {
        self.blocks_scanned += 1;
        self.txs_seen += block.txs_seen;
        self.candidates += block.candidates;
        self.validated += block.validated;
        for reason in &block.rejections {
            *self.rejections.entry(reason).or_default() += 1;
        }
    }
}

/// Per-block counters, produced off the main task and folded in order.
#[derive(Debug, Default)]
pub(crate) struct BlockTally {
    pub(crate) txs_seen: u64,
    pub(crate) candidates: u64,
    pub(crate) validated: u64,
    pub(crate) rejections: Vec<&'static str>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absorb_accumulates() {
        let mut stats = ScanStats::default();
        let tally = BlockTally {
            txs_seen: 10,
            candidates: 3,
            validated: 1,
            rejections: vec!["amount_out_of_range", "wrong_shape"],
        };
        stats.absorb(&tally);
        stats.absorb(&tally);
        stats.record_skip(7);

        assert_eq!(stats.blocks_scanned, 2);
        assert_eq!(stats.txs_seen, 20);
        assert_eq!(stats.candidates, 6);
        assert_eq!(stats.validated, 2);
        assert_eq!(stats.rejections["wrong_shape"], 2);
        assert_eq!(stats.blocks_skipped(), 1);
    }
}
