//! Subcommand execution.

use babylon_txfmt::{PayloadDecoder, PayloadLayout};
use tokio_util::sync::CancellationToken;

use crate::{args::Subcommand, context::IndexerContext};

mod address;
mod debug_tx;
mod scan;

pub(crate) async fn exec_subc(
    subc: Subcommand,
    ctx: &IndexerContext,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    match subc {
        Subcommand::Scan(args) => scan::exec(args, ctx, cancel).await,
        Subcommand::DebugTx(args) => debug_tx::exec(args, ctx).await,
        Subcommand::DecodeAddress(args) => address::exec_decode(args, ctx),
        Subcommand::RecoverPubkey(args) => address::exec_recover(args, ctx).await,
    }
}

fn decoder_for(fixed_term: bool) -> PayloadDecoder {
    let layout = if fixed_term {
        PayloadLayout::FixedTerm
    } else {
        PayloadLayout::Standard
    };
    PayloadDecoder::new(layout)
}
