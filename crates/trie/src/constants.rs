//! Stable wire constants shared by the RLP codec and the hash builder.

use alloy_primitives::{b256, B256};

/// Single-byte RLP header marking an empty string (and the RLP of `false`).
pub const EMPTY_STRING_CODE: u8 = 0x80;

/// Single-byte RLP header marking an empty list.
pub const EMPTY_LIST_CODE: u8 = 0xC0;

/// Root hash of a trie containing no entries: `keccak256(rlp(""))`.
pub const EMPTY_ROOT_HASH: B256 =
    b256!("0x56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421");

/// Length in bytes of an Ethereum address.
pub const ADDRESS_LENGTH: usize = 20;

/// Length in bytes of a 32-byte hash.
pub const HASH_LENGTH: usize = 32;

/// Number of children (and nibble values) a branch node can have.
pub const BRANCH_WIDTH: usize = 16;
