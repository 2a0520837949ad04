//! Input from Bitcoin: block sources, retrying fetches and the stake scanner.

pub mod bitcoind;
pub mod history;
pub mod retry;
pub mod scanner;
pub mod source;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

pub use bitcoind::BitcoindSource;
pub use history::fetch_transactions;
pub use retry::{Backoff, RetryPolicy};
pub use scanner::{ScanOutcome, ScanStats, ScanWindow, Scanner};
pub use source::{BlockSource, FetchError};
