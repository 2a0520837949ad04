//! Reduction of validated stake records into a summary report.

mod aggregator;
mod report;

pub use aggregator::Aggregator;
pub use report::{AggregateReport, DelegateReport, Summary, TimeRange, TxEntry, VersionReport};

use babylon_primitives::StakeRecord;

/// Aggregates `records` in one pass.
pub fn aggregate<'a>(records: impl IntoIterator<Item = &'a StakeRecord>) -> AggregateReport {
    let mut agg = Aggregator::new();
    agg.extend(records);
    agg.finalize()
}
