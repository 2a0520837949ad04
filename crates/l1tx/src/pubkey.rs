//! Best-effort recovery of an address's public key from its transaction history.
//!
//! Most address types only commit to a hash of the key, which is revealed when
//! the address first spends. Until then nothing on chain exposes it, so every
//! function here can come back empty. The scan is a heuristic: it returns the
//! first key-shaped item in the expected location and does not prove ownership.

use std::fmt;

use babylon_primitives::Buf32;
use babylon_txfmt::decode_stake_payload;
use bitcoin::{script::Instruction, Network, Transaction};
use serde::{Serialize, Serializer};
use tracing::*;

use crate::{decode_address, AddressKind, DecodedAddress};

const COMPRESSED_LEN: usize = 33;
const UNCOMPRESSED_LEN: usize = 65;

/// `OP_PUSHBYTES_33`, sometimes left in front of a witness key.
const PUSH_COMPRESSED: u8 = 0x21;

/// `OP_1 OP_PUSHBYTES_32`, the prefix of a taproot output script.
const TAPROOT_SCRIPT_PREFIX: [u8; 2] = [0x51, 0x20];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveredKey {
    Compressed([u8; COMPRESSED_LEN]),
    Uncompressed([u8; UNCOMPRESSED_LEN]),
    XOnly(Buf32),
}

impl RecoveredKey {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            RecoveredKey::Compressed(k) => k,
            RecoveredKey::Uncompressed(k) => k,
            RecoveredKey::XOnly(k) => k.as_bytes(),
        }
    }

    /// Accepts only canonical SEC1 encodings by length and prefix byte.
    fn from_sec1(bytes: &[u8]) -> Option<Self> {
        match (bytes.len(), bytes.first()) {
            (COMPRESSED_LEN, Some(0x02 | 0x03)) => bytes.try_into().ok().map(Self::Compressed),
            (UNCOMPRESSED_LEN, Some(0x04)) => bytes.try_into().ok().map(Self::Uncompressed),
            _ => None,
        }
    }
}

impl fmt::Display for RecoveredKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.as_bytes()))
    }
}

impl Serialize for RecoveredKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// Decodes `address` and looks for its key in `history`.
///
/// An address that does not decode for `network` yields `None`, same as a
/// history that never reveals the key.
pub fn recover_public_key_for(
    address: &str,
    network: Network,
    history: &[Transaction],
) -> Option<RecoveredKey> {
    match decode_address(address, network) {
        Ok(decoded) => recover_public_key(&decoded, history),
        Err(err) => {
            debug!(%address, %err, "cannot recover key for undecodable address");
            None
        }
    }
}

/// Scans `history` in order and returns the first key found for the address family.
pub fn recover_public_key(
    address: &DecodedAddress,
    history: &[Transaction],
) -> Option<RecoveredKey> {
    let found = match address.kind {
        AddressKind::Legacy => history.iter().find_map(find_in_script_sigs),
        AddressKind::ScriptHash => history.iter().find_map(find_in_witnesses),
        AddressKind::SegwitV0 => history.iter().find_map(find_compressed_in_witnesses),
        AddressKind::Taproot => history
            .iter()
            .find_map(find_payload_key)
            .or_else(|| history.iter().find_map(|tx| find_own_taproot_key(tx, address))),
    };

    if found.is_none() {
        debug!(kind = ?address.kind, txs = history.len(), "no key revealed in history");
    }
    found
}

fn find_in_script_sigs(tx: &Transaction) -> Option<RecoveredKey> {
    tx.input.iter().find_map(|txin| {
        txin.script_sig
            .instructions()
            .filter_map(Result::ok)
            .find_map(|ins| match ins {
                Instruction::PushBytes(bytes) => RecoveredKey::from_sec1(bytes.as_bytes()),
                Instruction::Op(_) => None,
            })
    })
}

fn find_in_witnesses(tx: &Transaction) -> Option<RecoveredKey> {
    tx.input
        .iter()
        .flat_map(|txin| txin.witness.iter())
        .find_map(RecoveredKey::from_sec1)
}

fn find_compressed_in_witnesses(tx: &Transaction) -> Option<RecoveredKey> {
    tx.input
        .iter()
        .flat_map(|txin| txin.witness.iter())
        .find_map(|item| {
            let item = match item {
                [PUSH_COMPRESSED, rest @ ..] if rest.len() == COMPRESSED_LEN => rest,
                _ => item,
            };
            match RecoveredKey::from_sec1(item)? {
                key @ RecoveredKey::Compressed(_) => Some(key),
                _ => None,
            }
        })
}

fn find_payload_key(tx: &Transaction) -> Option<RecoveredKey> {
    tx.output
        .iter()
        .find_map(|out| decode_stake_payload(out.script_pubkey.as_bytes()).ok())
        .map(|payload| RecoveredKey::XOnly(payload.staker_key))
}

fn find_own_taproot_key(tx: &Transaction, address: &DecodedAddress) -> Option<RecoveredKey> {
    tx.output
        .iter()
        .filter(|out| out.script_pubkey == address.script_pubkey)
        .find_map(|out| {
            let key = out
                .script_pubkey
                .as_bytes()
                .strip_prefix(TAPROOT_SCRIPT_PREFIX.as_slice())?;
            Buf32::from_slice(key).ok().map(RecoveredKey::XOnly)
        })
}
