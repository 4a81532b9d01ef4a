use crate::error::ParseFingerprintError;
use crate::index::{Index, LinearIndex, RadixIndex};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Width of a fingerprint in bits
pub const FINGERPRINT_BITS: u32 = 64;

/// Largest meaningful search distance; every fingerprint lies within it
pub const MAX_DISTANCE: u32 = FINGERPRINT_BITS;

/// A 64-bit perceptual image hash.
///
/// Two fingerprints are equal only when bit-identical. Similarity is the
/// Hamming distance between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(pub u64);

impl Fingerprint {
    /// Number of differing bits, in `0..=64`
    #[inline]
    pub fn distance(self, other: Fingerprint) -> u32 {
        (self.0 ^ other.0).count_ones()
    }

    #[inline]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl From<u64> for Fingerprint {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Fingerprint> for u64 {
    fn from(fp: Fingerprint) -> Self {
        fp.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016x}", self.0)
    }
}

impl fmt::Binary for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Binary::fmt(&self.0, f)
    }
}

impl FromStr for Fingerprint {
    type Err = ParseFingerprintError;

    /// Parse 1 to 16 hexadecimal digits, with or without a `0x` prefix
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        let invalid = || ParseFingerprintError(s.to_string());
        let hex = digits.bytes().all(|b| b.is_ascii_hexdigit());
        if digits.is_empty() || digits.len() > 16 || !hex {
            return Err(invalid());
        }
        u64::from_str_radix(digits, 16)
            .map(Fingerprint)
            .map_err(|_| invalid())
    }
}

/// Which index strategy a database is built on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    #[default]
    Radix,
    Linear,
}

impl IndexKind {
    /// Construct an empty index of this kind
    pub fn build(self) -> Box<dyn Index + Send + Sync> {
        match self {
            IndexKind::Radix => Box::new(RadixIndex::new()),
            IndexKind::Linear => Box::new(LinearIndex::new()),
        }
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKind::Radix => f.write_str("radix"),
            IndexKind::Linear => f.write_str("linear"),
        }
    }
}

/// Mask selecting the `length` high-order bits
#[inline]
pub(crate) fn high_mask(length: u8) -> u64 {
    if length == 0 {
        0
    } else {
        u64::MAX << (FINGERPRINT_BITS - length as u32)
    }
}

/// Left shift that yields zero once every bit has been shifted out
#[inline]
pub(crate) fn shl(value: u64, bits: u8) -> u64 {
    value.checked_shl(bits as u32).unwrap_or(0)
}

/// Highest bit, used to pick the branch side
pub(crate) const TOP_BIT: u64 = 1 << 63;
