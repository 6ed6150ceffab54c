//! The vector-root helper (§4.7): builds an MPT root over an indexed list of values, used for
//! the transactions-root and receipts-root fields of a block header.
//!
//! Generalized from the `triehash`-crate wrapper the teacher's `anvil/core/src/eth/trie.rs`
//! used historically (`ordered_trie_root`) into a from-scratch builder over this crate's own
//! [`HashBuilder`].

use crate::{
    hash_builder::HashBuilder,
    nibbles::Nibbles,
    rlp::{encode_uint, length_of_uint},
};
use alloy_primitives::B256;

/// Computes the root of the MPT whose key *i* is the RLP encoding of an index adjusted per the
/// Yellow Paper's ordering, and whose value is `encoder(&values[adjusted])`.
///
/// `encoder` is invoked once per value, in ascending index order of the *adjusted* key (which
/// is also ascending RLP-nibble order, satisfying the hash builder's ordering contract).
pub fn vector_root<T>(values: &[T], mut encoder: impl FnMut(&T) -> Vec<u8>) -> B256 {
    let n = values.len();
    let mut builder = HashBuilder::new();
    for j in 0..n {
        let adjusted = adjust_index_for_rlp(j, n);
        let mut key_rlp = Vec::with_capacity(length_of_uint(adjusted as u64));
        encode_uint(adjusted as u64, &mut key_rlp);
        let value = encoder(&values[adjusted]);
        builder.add_leaf(Nibbles::unpack(&key_rlp), &value);
    }
    builder.root_hash()
}

/// The Yellow-Paper index permutation used to key the vector-root trie: index `0x7F` and the
/// last index both collapse to key `0`, every other index `<= 0x7F` shifts up by one, and
/// indices `> 0x7F` (whose RLP encoding is already multi-byte and lexicographically ordered)
/// pass through unchanged.
pub fn adjust_index_for_rlp(i: usize, len: usize) -> usize {
    if i > 0x7F {
        i
    } else if i == 0x7F || i == len - 1 {
        0
    } else {
        i + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::EMPTY_ROOT_HASH;

    #[test]
    fn empty_vector_is_the_empty_root() {
        let values: Vec<Vec<u8>> = vec![];
        let root = vector_root(&values, |v: &Vec<u8>| v.clone());
        assert_eq!(root, EMPTY_ROOT_HASH);
    }

    #[test]
    fn single_value_matches_single_leaf_builder() {
        let values = vec![vec![0xAAu8]];
        let root = vector_root(&values, |v| v.clone());

        let mut expected = HashBuilder::new();
        let mut key_rlp = Vec::new();
        encode_uint(0u64, &mut key_rlp);
        expected.add_leaf(Nibbles::unpack(&key_rlp), &[0xAA]);
        assert_eq!(root, expected.root_hash());
    }

    #[test]
    fn adjust_index_permutation_boundaries() {
        assert_eq!(adjust_index_for_rlp(0, 10), 1);
        assert_eq!(adjust_index_for_rlp(0x7E, 200), 0x7F);
        assert_eq!(adjust_index_for_rlp(0x7F, 200), 0);
        assert_eq!(adjust_index_for_rlp(0x80, 200), 0x80);
        assert_eq!(adjust_index_for_rlp(4, 5), 0, "last index always collapses to 0");
    }

    #[test]
    fn deterministic_across_several_values() {
        let values: Vec<Vec<u8>> = (0u8..20).map(|i| vec![i, i.wrapping_mul(3)]).collect();
        let root_a = vector_root(&values, |v| v.clone());
        let root_b = vector_root(&values, |v| v.clone());
        assert_eq!(root_a, root_b);
        assert_ne!(root_a, EMPTY_ROOT_HASH);
    }
}
