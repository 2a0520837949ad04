//! Address decoding into a format family and its payload bytes.

use std::str::FromStr;

use bitcoin::{address, Address, AddressType, Network, ScriptBuf};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum AddressError {
    #[error("invalid address: {0}")]
    Parse(#[from] address::ParseError),

    #[error("unsupported address type {0:?}")]
    Unsupported(Option<AddressType>),
}

/// Address format families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    /// Base58 pay-to-pubkey-hash.
    Legacy,

    /// Base58 pay-to-script-hash, typically wrapping a segwit program.
    ScriptHash,

    /// Bech32 version 0 witness program.
    SegwitV0,

    /// Bech32m version 1 witness program.
    Taproot,
}

impl AddressKind {
    pub fn description(&self) -> &'static str {
        match self {
            AddressKind::Legacy => "Pay to Public Key Hash (Legacy)",
            AddressKind::ScriptHash => "Pay to Script Hash",
            AddressKind::SegwitV0 => "Pay to Witness Program (Native SegWit)",
            AddressKind::Taproot => "Pay to Taproot",
        }
    }
}

/// An address split into its family and the bytes it commits to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedAddress {
    pub kind: AddressKind,

    /// Key hash, script hash, witness program or taproot output key.
    pub payload: Vec<u8>,

    pub script_pubkey: ScriptBuf,
}

/// Decodes an address string checked against `network`.
pub fn decode_address(address: &str, network: Network) -> Result<DecodedAddress, AddressError> {
    let addr = Address::from_str(address)?.require_network(network)?;
    let script_pubkey = addr.script_pubkey();
    let bytes = script_pubkey.as_bytes();

    // Offsets skip the opcodes framing the pushed hash or program.
    let (kind, payload) = match addr.address_type() {
        Some(AddressType::P2pkh) => (AddressKind::Legacy, &bytes[3..23]),
        Some(AddressType::P2sh) => (AddressKind::ScriptHash, &bytes[2..22]),
        Some(AddressType::P2wpkh) | Some(AddressType::P2wsh) => (AddressKind::SegwitV0, &bytes[2..]),
        Some(AddressType::P2tr) => (AddressKind::Taproot, &bytes[2..]),
        other => return Err(AddressError::Unsupported(other)),
    };
    let payload = payload.to_vec();

    Ok(DecodedAddress {
        kind,
        payload,
        script_pubkey,
    })
}
