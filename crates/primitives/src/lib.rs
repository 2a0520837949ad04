//! Collection of generic data types shared by the indexer crates.

pub mod buf;
pub mod stake;

pub use buf::{Buf32, BufParseError};
pub use stake::{BlockContext, StakeRecord};
