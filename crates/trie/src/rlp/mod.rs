//! Recursive Length Prefix (RLP) codec (§4.3).
//!
//! This is a from-scratch implementation rather than a wrapper around the `alloy-rlp` crate:
//! the RLP codec is an in-scope core component of this crate (§1), not an external collaborator.
//! The API shape (a `Header` type with `encode`/`decode`/`length`, cursor-style `&mut &[u8]`
//! decoding) intentionally mirrors `alloy-rlp` so callers already familiar with that crate feel
//! at home here.

mod decode;
mod encode;
mod header;

pub use decode::{
    decode_bool, decode_bytes, decode_fixed_bytes, decode_hash, decode_list_header, decode_uint,
    LeftoverPolicy,
};
pub use encode::{
    encode_bool, encode_bytes, encode_hash, encode_list_header, encode_uint, length_of_bool,
    length_of_bytes, length_of_hash, length_of_list_header, length_of_uint,
};
pub use header::{length_of_length, Header};
