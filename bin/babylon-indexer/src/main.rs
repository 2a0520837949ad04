//! Babylon stake indexer binary entrypoint.

use anyhow::{anyhow, Result};
use argh::from_env;
use babylon_common::logging;
use babylon_config::Config;
use tokio::{runtime, signal};
use tokio_util::sync::CancellationToken;
use tracing::*;

use crate::{args::Args, cmd::exec_subc, context::init_context, errors::InitError};

mod args;
mod cmd;
mod config;
mod context;
mod errors;

fn main() -> Result<()> {
    let args: Args = from_env();

    let config = config::get_config(&args)
        .map_err(|e| anyhow!("Failed to load configuration: {e}"))?;

    let rt = runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("babylon-rt")
        .build()
        .map_err(InitError::RuntimeBuild)?;

    init_logging(&config)?;

    let ctx = init_context(config).map_err(|e| anyhow!("Failed to initialize context: {e}"))?;

    let cancel = CancellationToken::new();
    rt.spawn(cancel_on_ctrl_c(cancel.clone()));

    let res = rt.block_on(exec_subc(args.subc, &ctx, cancel));
    if let Err(err) = &res {
        error!(%err, "command failed");
    }
    res
}

fn init_logging(config: &Config) -> Result<(), InitError> {
    logging::init_logging_from_config(logging::LoggingInitConfig {
        service_base_name: "babylon-indexer",
        service_label: None,
        service_version: Some(env!("CARGO_PKG_VERSION")),
        log_dir: config.logging.log_dir.as_deref(),
        log_file_prefix: config.logging.log_file_prefix.as_deref(),
        json_format: config.logging.json_format,
        default_log_prefix: "babylon",
    })?;
    Ok(())
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    match signal::ctrl_c().await {
        Ok(()) => {
            warn!("interrupt received, stopping after the current batch");
            cancel.cancel();
        }
        Err(err) => warn!(%err, "could not listen for interrupts"),
    }
}
