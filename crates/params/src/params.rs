use bitcoin::Amount;
use serde::{Deserialize, Serialize};

use crate::serde_helpers::serde_amount_sat;

/// One row of the versioned parameter table.
///
/// Field names follow the `global-params.json` document; fields of that
/// document this crate has no use for are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSet {
    pub version: u8,

    /// First height the row applies to.
    pub activation_height: u64,

    /// Last height the row applies to, open-ended when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cap_height: Option<u64>,

    #[serde(rename = "min_staking_amount", with = "serde_amount_sat")]
    pub min_stake_amount: Amount,

    #[serde(rename = "max_staking_amount", with = "serde_amount_sat")]
    pub max_stake_amount: Amount,

    #[serde(rename = "min_staking_time")]
    pub min_staking_duration: u64,

    #[serde(rename = "max_staking_time")]
    pub max_staking_duration: u64,
}

impl ParameterSet {
    /// Whether `height` falls inside `[activation_height, cap_height]`.
    pub fn contains_height(&self, height: u64) -> bool {
        height >= self.activation_height && self.cap_height.is_none_or(|cap| height <= cap)
    }

    pub fn amount_in_range(&self, amount: Amount) -> bool {
        (self.min_stake_amount..=self.max_stake_amount).contains(&amount)
    }

    pub fn duration_in_range(&self, duration: u64) -> bool {
        (self.min_staking_duration..=self.max_staking_duration).contains(&duration)
    }

    /// Last height covered, `u64::MAX` for open-ended rows.
    pub(crate) fn window_end(&self) -> u64 {
        self.cap_height.unwrap_or(u64::MAX)
    }
}
