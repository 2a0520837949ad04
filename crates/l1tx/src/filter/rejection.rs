use babylon_txfmt::DecodeError;
use bitcoin::Amount;
use thiserror::Error;

/// Why a transaction was not accepted as a stake.
///
/// These are expected outcomes, kept for diagnostics only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("expected 3 outputs, found {0}")]
    WrongShape(usize),

    #[error("output 0 is not a taproot output")]
    WrongStakeOutput,

    #[error("payload: {0}")]
    PayloadDecodeFailed(#[from] DecodeError),

    #[error("no parameters for version {version} at height {height} (resolved {resolved:?})")]
    NoApplicableParameters {
        height: u64,
        version: u8,
        /// Version of the fallback row, if the resolver found one.
        resolved: Option<u8>,
    },

    #[error("stake amount {amount} outside [{min}, {max}]")]
    AmountOutOfRange {
        amount: Amount,
        min: Amount,
        max: Amount,
    },

    #[error("staking time {duration} outside [{min}, {max}]")]
    DurationOutOfRange { duration: u16, min: u64, max: u64 },
}

impl Rejection {
    /// Stable label used when counting rejections.
    pub fn reason(&self) -> &'static str {
        match self {
            Rejection::WrongShape(_) => "wrong_shape",
            Rejection::WrongStakeOutput => "wrong_stake_output",
            Rejection::PayloadDecodeFailed(_) => "payload_decode_failed",
            Rejection::NoApplicableParameters { .. } => "no_applicable_parameters",
            Rejection::AmountOutOfRange { .. } => "amount_out_of_range",
            Rejection::DurationOutOfRange { .. } => "duration_out_of_range",
        }
    }
}
