//! Wire format of the stake commitment carried in a null-data output.
//!
//! A stake script is `OP_RETURN OP_PUSHBYTES_71 <payload>` where the payload is
//! `"bbn1" || version || staker key || delegate key || staking time`.

mod constants;
mod decode;
mod encode;
mod payload;

pub use constants::*;
pub use decode::{decode_stake_payload, DecodeError, MalformedPayload, PayloadDecoder};
pub use encode::encode_stake_script;
pub use payload::{PayloadLayout, ProtocolPayload, ProtocolVersion};

use bitcoin::Transaction;

/// Returns whether the script starts with the stake magic prefix.
///
/// This is the cheap pre-filter applied before a full decode, so it only looks
/// at the exact leading bytes.
pub fn has_stake_prefix(script: &[u8]) -> bool {
    script.starts_with(&MAGIC_PREFIX)
}

/// Returns whether any output of the transaction carries the stake magic prefix.
pub fn tx_has_stake_output(tx: &Transaction) -> bool {
    tx.output
        .iter()
        .any(|out| has_stake_prefix(out.script_pubkey.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_is_exact() {
        assert!(has_stake_prefix(&hex::decode("6a4762626e3100").unwrap()));
        assert!(!has_stake_prefix(&hex::decode("6a4762626e").unwrap()));
        // Case matters.
        assert!(!has_stake_prefix(&hex::decode("6a4742424e31").unwrap()));
        // Same tag behind a different push length.
        assert!(!has_stake_prefix(&hex::decode("6a4862626e31").unwrap()));
    }
}
