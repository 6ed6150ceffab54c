//! RLP value encoding (§4.3.1).

use super::header::Header;
use crate::compact::{to_big_compact, BigCompact};
use alloy_primitives::B256;

/// Appends the canonical RLP encoding of a byte string.
pub fn encode_bytes(bytes: &[u8], out: &mut Vec<u8>) {
    if let [b] = bytes {
        if *b < 0x80 {
            out.push(*b);
            return;
        }
    }
    Header { list: false, payload_length: bytes.len() }.encode(out);
    out.extend_from_slice(bytes);
}

/// Exact length of [`encode_bytes`]'s output, without allocating.
pub fn length_of_bytes(bytes: &[u8]) -> usize {
    if let [b] = bytes {
        if *b < 0x80 {
            return 1;
        }
    }
    Header { list: false, payload_length: bytes.len() }.length() + bytes.len()
}

/// Appends the canonical RLP encoding of an unsigned integer.
///
/// `0` encodes as `0x80`; `0 < n < 0x80` encodes as the single byte `n`; larger values encode
/// as a string containing [`crate::compact::to_big_compact`].
pub fn encode_uint<T: BigCompact>(value: T, out: &mut Vec<u8>) {
    let buf = to_big_compact(value);
    encode_bytes(buf.as_slice(), out);
}

/// Exact length of [`encode_uint`]'s output, without allocating.
pub fn length_of_uint<T: BigCompact>(value: T) -> usize {
    let buf = to_big_compact(value);
    length_of_bytes(buf.as_slice())
}

/// Appends the canonical RLP encoding of a boolean: `0x80` for `false`, `0x01` for `true`.
pub fn encode_bool(value: bool, out: &mut Vec<u8>) {
    out.push(if value { 0x01 } else { 0x80 });
}

/// Exact length of [`encode_bool`]'s output: always `1`.
pub fn length_of_bool(_value: bool) -> usize {
    1
}

/// Appends the canonical RLP encoding of a 32-byte hash as a fixed-length string.
pub fn encode_hash(hash: &B256, out: &mut Vec<u8>) {
    encode_bytes(hash.as_slice(), out);
}

/// Exact length of [`encode_hash`]'s output: always `33`.
pub fn length_of_hash() -> usize {
    33
}

/// Appends a list header for a payload of the given length, followed by the caller-supplied
/// payload bytes (already RLP-encoded).
pub fn encode_list_header(payload_length: usize, out: &mut Vec<u8>) {
    Header { list: true, payload_length }.encode(out);
}

/// Exact length of a list header for a payload of the given length.
pub fn length_of_list_header(payload_length: usize) -> usize {
    Header { list: true, payload_length }.length()
}
