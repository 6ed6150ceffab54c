//! Big-endian compact integer codec (§4.1).
//!
//! "Compact" means the minimal-length big-endian representation with no leading zero byte;
//! zero itself is the empty byte sequence. This is the representation RLP uses for integers
//! `>= 0x80` and for length-of-length fields.

use crate::error::TrieError;
use alloy_primitives::U256;

/// A fixed-width unsigned integer that can be loaded from / stored to big-endian compact bytes.
///
/// Implemented for [`u64`] and [`U256`] so the RLP codec and the node-record mask widths share
/// one code path regardless of target width.
pub trait BigCompact: Sized + Copy + Default + PartialEq {
    /// Number of bytes in the type's full fixed-width representation.
    const WIDTH: usize;

    /// Writes the minimal big-endian representation (no leading zero byte) into `out`,
    /// returning the number of bytes written. `out` must be at least `WIDTH` bytes.
    fn to_big_compact(self, out: &mut [u8]) -> usize;

    /// Parses a big-endian compact byte sequence produced by [`Self::to_big_compact`].
    fn from_big_compact(bytes: &[u8]) -> Result<Self, TrieError>;
}

impl BigCompact for u64 {
    const WIDTH: usize = 8;

    fn to_big_compact(self, out: &mut [u8]) -> usize {
        let be = self.to_be_bytes();
        let skip = be.iter().take_while(|&&b| b == 0).count();
        let len = be.len() - skip;
        out[..len].copy_from_slice(&be[skip..]);
        len
    }

    fn from_big_compact(bytes: &[u8]) -> Result<Self, TrieError> {
        if bytes.is_empty() {
            return Ok(0);
        }
        if bytes[0] == 0 {
            return Err(TrieError::LeadingZero);
        }
        if bytes.len() > Self::WIDTH {
            return Err(TrieError::Overflow);
        }
        let mut buf = [0u8; 8];
        buf[8 - bytes.len()..].copy_from_slice(bytes);
        Ok(u64::from_be_bytes(buf))
    }
}

impl BigCompact for U256 {
    const WIDTH: usize = 32;

    fn to_big_compact(self, out: &mut [u8]) -> usize {
        let be: [u8; 32] = self.to_be_bytes();
        let skip = be.iter().take_while(|&&b| b == 0).count();
        let len = be.len() - skip;
        out[..len].copy_from_slice(&be[skip..]);
        len
    }

    fn from_big_compact(bytes: &[u8]) -> Result<Self, TrieError> {
        if bytes.is_empty() {
            return Ok(Self::ZERO);
        }
        if bytes[0] == 0 {
            return Err(TrieError::LeadingZero);
        }
        if bytes.len() > Self::WIDTH {
            return Err(TrieError::Overflow);
        }
        Ok(Self::from_be_slice(bytes))
    }
}

/// A stack-allocated buffer holding the compact encoding of a [`BigCompact`] value, avoiding a
/// heap allocation (and, crucially, avoiding any thread-local scratch buffer) for the common
/// case of encoding a single integer.
#[derive(Clone, Copy)]
pub struct CompactBuf {
    buf: [u8; 32],
    len: usize,
}

impl CompactBuf {
    /// Encodes `value` into a fresh stack buffer.
    pub fn new<T: BigCompact>(value: T) -> Self {
        let mut buf = [0u8; 32];
        let len = value.to_big_compact(&mut buf);
        Self { buf, len }
    }

    /// Borrows the compact encoding.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

/// `to_big_compact(n)`: the minimal big-endian byte sequence with no leading zero byte.
pub fn to_big_compact<T: BigCompact>(value: T) -> CompactBuf {
    CompactBuf::new(value)
}

/// `from_big_compact(bytes)`: parses a compact big-endian byte sequence into `T`.
pub fn from_big_compact<T: BigCompact>(bytes: &[u8]) -> Result<T, TrieError> {
    T::from_big_compact(bytes)
}

/// Stores `value` as `N`-byte big-endian into `out[..N]`.
pub fn store_big_u64(value: u64, out: &mut [u8; 8]) {
    *out = value.to_be_bytes();
}

/// Loads an 8-byte big-endian integer.
pub fn load_big_u64(bytes: &[u8; 8]) -> u64 {
    u64::from_be_bytes(*bytes)
}

/// Stores `value` as 8-byte little-endian into `out`.
pub fn store_little_u64(value: u64, out: &mut [u8; 8]) {
    *out = value.to_le_bytes();
}

/// Loads an 8-byte little-endian integer.
pub fn load_little_u64(bytes: &[u8; 8]) -> u64 {
    u64::from_le_bytes(*bytes)
}

/// Stores `value` as 32-byte big-endian into `out`.
pub fn store_big_u256(value: U256, out: &mut [u8; 32]) {
    *out = value.to_be_bytes();
}

/// Loads a 32-byte big-endian integer.
pub fn load_big_u256(bytes: &[u8; 32]) -> U256 {
    U256::from_be_bytes(*bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn zero_is_empty() {
        assert_eq!(to_big_compact(0u64).as_slice(), &[] as &[u8]);
        assert_eq!(from_big_compact::<u64>(&[]).unwrap(), 0);
    }

    #[test]
    fn leading_zero_rejected() {
        assert_eq!(from_big_compact::<u64>(&[0x00, 0x01]), Err(TrieError::LeadingZero));
    }

    #[test]
    fn overflow_rejected() {
        assert_eq!(from_big_compact::<u64>(&[1; 9]), Err(TrieError::Overflow));
    }

    #[test]
    fn single_nonzero_byte_roundtrips() {
        let buf = to_big_compact(0x42u64);
        assert_eq!(buf.as_slice(), &[0x42]);
        assert_eq!(from_big_compact::<u64>(buf.as_slice()).unwrap(), 0x42);
    }

    proptest! {
        #[test]
        fn u64_roundtrip(n: u64) {
            let buf = to_big_compact(n);
            prop_assert_eq!(from_big_compact::<u64>(buf.as_slice()).unwrap(), n);
        }

        #[test]
        fn u256_roundtrip(bytes: [u8; 32]) {
            let n = U256::from_be_bytes(bytes);
            let buf = to_big_compact(n);
            prop_assert_eq!(from_big_compact::<U256>(buf.as_slice()).unwrap(), n);
        }
    }
}
