//! Decoding of stake commitment scripts.

use babylon_primitives::Buf32;
use thiserror::Error;

use crate::{
    has_stake_prefix, PayloadLayout, ProtocolPayload, ProtocolVersion, FIXED_TERM_SUFFIX,
    MAGIC_PREFIX, STAKE_SCRIPT_LEN, STAKE_TAG,
};

/// Offset of the version byte in the script.
const VERSION_OFFSET: usize = MAGIC_PREFIX.len();

/// Offset of the tag's trailing `'1'`, where the chunked layout starts counting.
const CHUNK_BASE_OFFSET: usize = VERSION_OFFSET - 1;

const CHUNK_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The script does not start with the stake magic prefix.
    #[error("not a stake commitment")]
    NotThisProtocol,

    #[error("malformed stake commitment: {0}")]
    Malformed(#[from] MalformedPayload),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedPayload {
    #[error("missing version byte")]
    MissingVersion,

    #[error("unknown version {0}")]
    UnknownVersion(u8),

    #[error("expected {expected} script bytes, got {got}")]
    Length { expected: usize, got: usize },

    #[error("expected suffix {expected:02x?}, got {got:02x?}")]
    Suffix { expected: [u8; 2], got: [u8; 2] },
}

/// Decodes stake commitment scripts with one fixed [`PayloadLayout`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PayloadDecoder {
    layout: PayloadLayout,
}

impl PayloadDecoder {
    pub fn new(layout: PayloadLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> PayloadLayout {
        self.layout
    }

    /// Decodes the script bytes of a single output.
    pub fn decode(&self, script: &[u8]) -> Result<ProtocolPayload, DecodeError> {
        if !has_stake_prefix(script) {
            return Err(DecodeError::NotThisProtocol);
        }

        let version_byte = *script
            .get(VERSION_OFFSET)
            .ok_or(MalformedPayload::MissingVersion)?;
        let version =
            ProtocolVersion::try_from(version_byte).map_err(MalformedPayload::UnknownVersion)?;

        if script.len() != STAKE_SCRIPT_LEN {
            return Err(MalformedPayload::Length {
                expected: STAKE_SCRIPT_LEN,
                got: script.len(),
            }
            .into());
        }

        match self.layout {
            PayloadLayout::Standard => decode_standard(version, script),
            PayloadLayout::FixedTerm => decode_fixed_term(version, script),
        }
    }
}

/// Decodes a script with the [`PayloadLayout::Standard`] layout.
pub fn decode_stake_payload(script: &[u8]) -> Result<ProtocolPayload, DecodeError> {
    PayloadDecoder::default().decode(script)
}

fn decode_standard(
    version: ProtocolVersion,
    script: &[u8],
) -> Result<ProtocolPayload, DecodeError> {
    let staker_start = VERSION_OFFSET + 1;
    let delegate_start = staker_start + Buf32::LEN;
    let duration_start = delegate_start + Buf32::LEN;

    let staker_key = read_buf32(script, staker_start)?;
    let delegate_id = read_buf32(script, delegate_start)?;
    let duration: [u8; 2] = read_array(script, duration_start)?;

    Ok(ProtocolPayload {
        version,
        tag: STAKE_TAG,
        staker_key,
        delegate_id,
        staking_duration: Some(u16::from_be_bytes(duration)),
        raw: script.to_vec(),
    })
}

fn decode_fixed_term(
    version: ProtocolVersion,
    script: &[u8],
) -> Result<ProtocolPayload, DecodeError> {
    let data = &script[CHUNK_BASE_OFFSET..];
    let chunks: Vec<&[u8]> = data.chunks(CHUNK_LEN).collect();
    let [_, chunk1, chunk2] = chunks.as_slice() else {
        return Err(MalformedPayload::Length {
            expected: STAKE_SCRIPT_LEN,
            got: script.len(),
        }
        .into());
    };

    // Delegate key is the tail of chunk 1 joined with the head of chunk 2.
    let head_len = CHUNK_LEN - 2;
    let mut delegate = [0u8; 32];
    delegate[..head_len].copy_from_slice(slice(chunk1, 2, head_len)?);
    delegate[head_len..].copy_from_slice(slice(chunk2, 0, 2)?);

    let suffix: [u8; 2] = read_array(chunk2, 2)?;
    if suffix != FIXED_TERM_SUFFIX {
        return Err(MalformedPayload::Suffix {
            expected: FIXED_TERM_SUFFIX,
            got: suffix,
        }
        .into());
    }

    Ok(ProtocolPayload {
        version,
        tag: STAKE_TAG,
        staker_key: read_buf32(script, VERSION_OFFSET + 1)?,
        delegate_id: Buf32(delegate),
        staking_duration: None,
        raw: script.to_vec(),
    })
}

fn slice(bytes: &[u8], start: usize, len: usize) -> Result<&[u8], MalformedPayload> {
    bytes
        .get(start..start + len)
        .ok_or(MalformedPayload::Length {
            expected: start + len,
            got: bytes.len(),
        })
}

fn read_array<const N: usize>(bytes: &[u8], start: usize) -> Result<[u8; N], MalformedPayload> {
    let mut out = [0u8; N];
    out.copy_from_slice(slice(bytes, start, N)?);
    Ok(out)
}

fn read_buf32(bytes: &[u8], start: usize) -> Result<Buf32, MalformedPayload> {
    read_array(bytes, start).map(Buf32)
}
