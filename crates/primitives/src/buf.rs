//! Fixed-size byte buffers rendered as hex.

use std::{fmt, str::FromStr};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum BufParseError {
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("expected {expected} bytes, got {got}")]
    Length { expected: usize, got: usize },
}

/// A 32-byte buffer, used for x-only keys and identifiers carried in stake payloads.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Buf32(pub [u8; 32]);

impl Buf32 {
    pub const LEN: usize = 32;

    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Copies a slice of exactly [`Self::LEN`] bytes.
    pub fn from_slice(slice: &[u8]) -> Result<Self, BufParseError> {
        let arr: [u8; 32] = slice.try_into().map_err(|_| BufParseError::Length {
            expected: Self::LEN,
            got: slice.len(),
        })?;
        Ok(Self(arr))
    }
}

impl From<[u8; 32]> for Buf32 {
    fn from(value: [u8; 32]) -> Self {
        Self(value)
    }
}

impl AsRef<[u8]> for Buf32 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Buf32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Buf32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Buf32({self})")
    }
}

impl FromStr for Buf32 {
    type Err = BufParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)?;
        Self::from_slice(&bytes)
    }
}

impl Serialize for Buf32 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Buf32 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_display_and_parse() {
        let buf = Buf32([0xab; 32]);
        let s = buf.to_string();
        assert_eq!(s.len(), 64);
        assert_eq!(s.parse::<Buf32>().unwrap(), buf);
    }

    #[test]
    fn test_wrong_length_rejected() {
        let err = "abcd".parse::<Buf32>().unwrap_err();
        assert_eq!(
            err,
            BufParseError::Length {
                expected: 32,
                got: 2
            }
        );
    }

    #[test]
    fn test_serde_as_hex_string() {
        let buf = Buf32([1; 32]);
        let json = serde_json::to_string(&buf).unwrap();
        assert_eq!(json, format!("\"{}\"", "01".repeat(32)));
        let back: Buf32 = serde_json::from_str(&json).unwrap();
        assert_eq!(back, buf);
    }
}
