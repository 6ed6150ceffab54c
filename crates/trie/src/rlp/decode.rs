//! RLP value decoding (§4.3.2).

use super::header::Header;
use crate::{
    compact::{from_big_compact, BigCompact},
    error::TrieError,
};
use alloy_primitives::B256;

/// Whether a decoder tolerates bytes remaining in `buf` after the value is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeftoverPolicy {
    /// Any remaining bytes are an error (`InputTooLong`).
    Prohibit,
    /// Remaining bytes are left in the cursor for the caller to continue decoding.
    Allow,
}

fn finish(buf: &[u8], policy: LeftoverPolicy) -> Result<(), TrieError> {
    if policy == LeftoverPolicy::Prohibit && !buf.is_empty() {
        return Err(TrieError::InputTooLong(buf.len()));
    }
    Ok(())
}

/// Decodes a byte string, returning a borrowed slice into `buf` (no allocation).
pub fn decode_bytes<'a>(
    buf: &mut &'a [u8],
    policy: LeftoverPolicy,
) -> Result<&'a [u8], TrieError> {
    let first = *buf.first().ok_or(TrieError::InputTooShort)?;
    if first < 0x80 {
        let (byte, rest) = buf.split_at(1);
        *buf = rest;
        finish(*buf, policy)?;
        return Ok(byte);
    }

    let header = Header::decode(buf)?;
    if header.list {
        return Err(TrieError::UnexpectedList);
    }
    if buf.len() < header.payload_length {
        return Err(TrieError::InputTooShort);
    }
    let (payload, rest) = buf.split_at(header.payload_length);
    *buf = rest;
    finish(*buf, policy)?;
    Ok(payload)
}

/// Decodes an unsigned integer encoded per §4.3.1.
pub fn decode_uint<T: BigCompact>(
    buf: &mut &[u8],
    policy: LeftoverPolicy,
) -> Result<T, TrieError> {
    let bytes = decode_bytes(buf, policy)?;
    from_big_compact(bytes)
}

/// Decodes a boolean: only `0x80` (false) and `0x01` (true) are valid.
pub fn decode_bool(buf: &mut &[u8], policy: LeftoverPolicy) -> Result<bool, TrieError> {
    let value: u64 = decode_uint(buf, policy)?;
    match value {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(TrieError::Overflow),
    }
}

/// Decodes a fixed-width `N`-byte string (used for the 32-byte hash type).
pub fn decode_fixed_bytes<const N: usize>(
    buf: &mut &[u8],
    policy: LeftoverPolicy,
) -> Result<[u8; N], TrieError> {
    let bytes = decode_bytes(buf, policy)?;
    if bytes.len() != N {
        return Err(TrieError::UnexpectedLength { expected: N, actual: bytes.len() });
    }
    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    Ok(out)
}

/// Decodes a 32-byte hash.
pub fn decode_hash(buf: &mut &[u8], policy: LeftoverPolicy) -> Result<B256, TrieError> {
    decode_fixed_bytes::<32>(buf, policy).map(B256::from)
}

/// Decodes a list header, rejecting strings.
pub fn decode_list_header(buf: &mut &[u8]) -> Result<Header, TrieError> {
    let header = Header::decode(buf)?;
    if !header.list {
        return Err(TrieError::UnexpectedString);
    }
    Ok(header)
}
