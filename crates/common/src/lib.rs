//! Ambient facilities shared by the indexer binaries.

pub mod logging;
