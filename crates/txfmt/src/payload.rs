use std::fmt;

use babylon_primitives::Buf32;

/// Payload versions this decoder understands.
///
/// Adding a version means adding a variant here; unknown version bytes are
/// rejected as malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ProtocolVersion {
    V0 = 0,
    V1 = 1,
    V2 = 2,
}

impl ProtocolVersion {
    pub const ALL: [ProtocolVersion; 3] = [Self::V0, Self::V1, Self::V2];

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for ProtocolVersion {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::V0),
            1 => Ok(Self::V1),
            2 => Ok(Self::V2),
            other => Err(other),
        }
    }
}

impl From<ProtocolVersion> for u8 {
    fn from(value: ProtocolVersion) -> Self {
        value.as_u8()
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.as_u8())
    }
}

/// Field layouts a stake payload may be read with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PayloadLayout {
    /// Staker key, delegate key, then a free big-endian staking time.
    #[default]
    Standard,

    /// Delegate key assembled from two 32-byte chunks of the post-tag data,
    /// followed by the fixed [`FIXED_TERM_SUFFIX`](crate::FIXED_TERM_SUFFIX).
    FixedTerm,
}

/// Fields decoded from a stake commitment script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolPayload {
    pub version: ProtocolVersion,
    pub tag: [u8; 4],
    pub staker_key: Buf32,

    /// Finality provider the stake is delegated to.
    pub delegate_id: Buf32,

    /// Staking time in blocks, absent for layouts without a free duration.
    pub staking_duration: Option<u16>,

    /// Script bytes the fields were read from.
    pub raw: Vec<u8>,
}
