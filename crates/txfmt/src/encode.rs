use babylon_primitives::Buf32;
use bitcoin::ScriptBuf;

use crate::{ProtocolVersion, MAGIC_PREFIX, STAKE_SCRIPT_LEN};

/// Builds a [`PayloadLayout::Standard`](crate::PayloadLayout::Standard) stake script.
pub fn encode_stake_script(
    version: ProtocolVersion,
    staker_key: &Buf32,
    delegate_id: &Buf32,
    staking_duration: u16,
) -> ScriptBuf {
    let mut bytes = Vec::with_capacity(STAKE_SCRIPT_LEN);
    bytes.extend_from_slice(&MAGIC_PREFIX);
    bytes.push(version.as_u8());
    bytes.extend_from_slice(staker_key.as_bytes());
    bytes.extend_from_slice(delegate_id.as_bytes());
    bytes.extend_from_slice(&staking_duration.to_be_bytes());
    debug_assert_eq!(bytes.len(), STAKE_SCRIPT_LEN);
    ScriptBuf::from_bytes(bytes)
}
