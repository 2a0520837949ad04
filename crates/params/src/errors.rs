use std::{io, path::PathBuf};

use thiserror::Error;

/// Problems with the parameter table. All of them are fatal to a run.
#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unparsable params: {0}")]
    Json(#[from] serde_json::Error),

    #[error("params table has no versions")]
    Empty,

    #[error("version {version}: cap height {cap} below activation height {activation}")]
    InvalidWindow {
        version: u8,
        activation: u64,
        cap: u64,
    },

    #[error("version {version}: min staking amount above max")]
    InvalidAmountRange { version: u8 },

    #[error("version {version}: min staking time above max")]
    InvalidDurationRange { version: u8 },

    #[error("version {version}: windows starting at {first} and {second} overlap")]
    OverlappingWindows { version: u8, first: u64, second: u64 },
}
