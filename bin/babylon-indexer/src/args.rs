//! CLI argument parsing and environment variable handling.

use std::{env, path::PathBuf};

use argh::FromArgs;
use bitcoin::Txid;

use crate::errors::*;

/// Env var overriding `bitcoind.rpc_url`.
const BTC_RPC_URL_VAR: &str = "BTC_RPC_URL";

/// Env var overriding `scan.scan_range`.
const SCAN_RANGE_VAR: &str = "SCAN_RANGE";

/// Configs overridable by environment.
#[derive(Debug, Clone, Default)]
pub(crate) struct EnvArgs {
    rpc_url: Option<String>,
    scan_range: Option<String>,
}

impl EnvArgs {
    /// Loads environment variables that should override the config.
    pub(crate) fn from_env() -> Self {
        Self {
            rpc_url: env::var(BTC_RPC_URL_VAR).ok(),
            scan_range: env::var(SCAN_RANGE_VAR).ok(),
        }
    }

    /// Get strings of overrides gathered from env.
    pub(crate) fn get_overrides(&self) -> Result<Vec<String>, ConfigError> {
        let mut overrides = Vec::new();
        if let Some(url) = &self.rpc_url {
            overrides.push(format!("bitcoind.rpc_url={url}"));
        }
        if let Some(range) = &self.scan_range {
            let range: u64 = range.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                var: SCAN_RANGE_VAR,
                value: range.clone(),
            })?;
            overrides.push(format!("scan.scan_range={range}"));
        }
        Ok(overrides)
    }
}

#[derive(Debug, FromArgs)]
#[argh(description = "Babylon stake indexer")]
pub(crate) struct Args {
    #[argh(option, short = 'c', description = "path to configuration")]
    pub(crate) config: PathBuf,

    /// Params table path that will override the path in the config toml.
    #[argh(option, short = 'p', description = "parameter table path")]
    pub(crate) params: Option<PathBuf>,

    /// Other generic overrides to the config toml.
    /// Will be used, for example, as `-o scan.workers=8 -o retry.max_retries=3`
    #[argh(option, short = 'o', description = "generic config overrides")]
    pub(crate) overrides: Vec<String>,

    #[argh(subcommand)]
    pub(crate) subc: Subcommand,
}

impl Args {
    /// Get strings of overrides gathered from user and internal attributes.
    pub(crate) fn get_all_overrides(&self) -> Result<Vec<String>, InitError> {
        let mut overrides = self.overrides.clone();
        overrides.extend_from_slice(&self.get_internal_overrides()?);
        Ok(overrides)
    }

    /// Overrides passed directly as args attributes.
    fn get_internal_overrides(&self) -> Result<Vec<String>, InitError> {
        let mut overrides = Vec::new();
        if let Some(params) = &self.params {
            let path = params
                .to_str()
                .ok_or_else(|| ConfigError::InvalidOverride(params.display().to_string()))?;
            overrides.push(format!("params.path={path}"));
        }
        if let Subcommand::Scan(scan) = &self.subc {
            if let Some(start) = scan.start_height {
                overrides.push(format!("scan.start_height={start}"));
            }
            if let Some(end) = scan.end_height {
                overrides.push(format!("scan.end_height={end}"));
            }
            if let Some(range) = scan.scan_range {
                overrides.push(format!("scan.scan_range={range}"));
            }
        }
        Ok(overrides)
    }
}

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand)]
pub(crate) enum Subcommand {
    Scan(SubcScan),
    DebugTx(SubcDebugTx),
    DecodeAddress(SubcDecodeAddress),
    RecoverPubkey(SubcRecoverPubkey),
}

#[derive(FromArgs, PartialEq, Debug)]
#[argh(
    subcommand,
    name = "scan",
    description = "scans a block window and writes stake records and the aggregate report"
)]
pub(crate) struct SubcScan {
    #[argh(option, description = "first height to scan")]
    pub(crate) start_height: Option<u64>,

    #[argh(option, description = "last height to scan (default: tip)")]
    pub(crate) end_height: Option<u64>,

    #[argh(option, description = "blocks back from the end height when no start is given")]
    pub(crate) scan_range: Option<u64>,

    #[argh(switch, description = "decode payloads with the fixed-term layout")]
    pub(crate) fixed_term: bool,
}

#[derive(FromArgs, PartialEq, Debug)]
#[argh(
    subcommand,
    name = "debug-tx",
    description = "dumps a transaction's outputs and decodes any stake payload"
)]
pub(crate) struct SubcDebugTx {
    #[argh(positional, description = "transaction id")]
    pub(crate) txid: Txid,

    #[argh(switch, description = "decode payloads with the fixed-term layout")]
    pub(crate) fixed_term: bool,
}

#[derive(FromArgs, PartialEq, Debug)]
#[argh(
    subcommand,
    name = "decode-address",
    description = "prints an address's kind and payload"
)]
pub(crate) struct SubcDecodeAddress {
    #[argh(positional, description = "bitcoin address")]
    pub(crate) address: String,
}

#[derive(FromArgs, PartialEq, Debug)]
#[argh(
    subcommand,
    name = "recover-pubkey",
    description = "looks for an address's public key in its transaction history"
)]
pub(crate) struct SubcRecoverPubkey {
    #[argh(positional, description = "bitcoin address")]
    pub(crate) address: String,

    #[argh(positional, description = "history transaction ids, searched in order")]
    pub(crate) txids: Vec<Txid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_overrides() {
        let env = EnvArgs {
            rpc_url: Some("http://node:8332".to_string()),
            scan_range: Some(" 120 ".to_string()),
        };
        assert_eq!(
            env.get_overrides().unwrap(),
            vec!["bitcoind.rpc_url=http://node:8332", "scan.scan_range=120"]
        );

        let bad = EnvArgs {
            rpc_url: None,
            scan_range: Some("lots".to_string()),
        };
        assert!(matches!(
            bad.get_overrides(),
            Err(ConfigError::InvalidEnv { var: "SCAN_RANGE", .. })
        ));
    }

    #[test]
    fn test_scan_args_become_overrides() {
        let args = Args::from_args(
            &["babylon-indexer"],
            &[
                "-c",
                "indexer.toml",
                "-o",
                "scan.workers=8",
                "scan",
                "--start-height",
                "100",
                "--scan-range",
                "20",
            ],
        )
        .unwrap();

        assert_eq!(
            args.get_all_overrides().unwrap(),
            vec![
                "scan.workers=8",
                "scan.start_height=100",
                "scan.scan_range=20"
            ]
        );
    }

    #[test]
    fn test_recover_pubkey_args() {
        let txid = "a1075db55d416d3ca199f55b6084e2115b9345e16c5cf302fc80e9d5fbf5d48d";
        let args = Args::from_args(
            &["babylon-indexer"],
            &["-c", "x.toml", "recover-pubkey", "bc1qaddr", txid, txid],
        )
        .unwrap();
        match args.subc {
            Subcommand::RecoverPubkey(subc) => {
                assert_eq!(subc.address, "bc1qaddr");
                assert_eq!(subc.txids.len(), 2);
            }
            other => panic!("unexpected subcommand {other:?}"),
        }
    }
}
