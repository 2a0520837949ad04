//! Error types for initialization and configuration.

use std::{io, path::PathBuf};

use babylon_btcio::FetchError;
use babylon_common::logging::TryInitError;
use babylon_params::ParamsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum InitError {
    #[error("io: {0}")]
    Io(#[from] io::Error),

    #[error("reading config {path}: {source}")]
    ReadConfig { path: PathBuf, source: io::Error },

    #[error("unparsable config: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config: {0}")]
    MalformedConfig(#[from] ConfigError),

    #[error("params: {0}")]
    MalformedParams(#[from] ParamsError),

    #[error("could not create bitcoin client: {0}")]
    BitcoinClientCreation(String),

    #[error("could not query chain tip: {0}")]
    ChainTip(#[source] FetchError),

    #[error("empty scan window {start}..={end}")]
    EmptyWindow { start: u64, end: u64 },

    #[error("logging: {0}")]
    Logging(#[from] TryInitError),

    #[error("runtime: {0}")]
    RuntimeBuild(#[source] io::Error),
}

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    /// Tried to traverse into a primitive.
    #[error("can't traverse into non-table key '{key}' of '{path}'")]
    TraverseNonTableAt { key: String, path: String },

    /// Invalid override string.
    #[error("invalid override: '{0}'")]
    InvalidOverride(String),

    #[error("invalid value for {var}: '{value}'")]
    InvalidEnv { var: &'static str, value: String },
}
