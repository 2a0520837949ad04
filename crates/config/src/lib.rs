//! Configuration types for the stake indexer.

mod config;

pub use config::*;
