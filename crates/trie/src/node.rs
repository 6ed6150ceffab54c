//! The intermediate node record (§3, §4.4): a branch node's compact caching representation.

use crate::error::TrieError;
use alloy_primitives::B256;

/// One branch node's compact, cacheable representation.
///
/// A conforming record always satisfies `tree_mask & state_mask == tree_mask`,
/// `hash_mask & state_mask == hash_mask`, and `hashes.len() == hash_mask.count_ones()`;
/// [`NodeRecord::new`] panics if asked to construct a value that does not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeRecord {
    /// Bit *i* set iff child *i* exists in the hashed state.
    pub state_mask: u16,
    /// Bit *i* set iff child *i* is itself a branch node worth caching.
    pub tree_mask: u16,
    /// Bit *i* set iff child *i* contributes a 32-byte hash stored in `hashes`.
    pub hash_mask: u16,
    /// Hashes of the children flagged in `hash_mask`, in ascending nibble order.
    pub hashes: Vec<B256>,
    /// The subtree's own root hash, present only for the record emitted at trie depth 0.
    pub root_hash: Option<B256>,
}

impl NodeRecord {
    /// Builds a node record, asserting the three mask-subset and hash-count invariants.
    ///
    /// # Panics
    ///
    /// Panics if `tree_mask` or `hash_mask` is not a subset of `state_mask`, or if
    /// `hashes.len() != hash_mask.count_ones()`. These are construction bugs in this crate, not
    /// caller-facing data errors; see [`Self::decode_from_storage`] for the fallible variant
    /// used when parsing untrusted bytes.
    pub fn new(
        state_mask: u16,
        tree_mask: u16,
        hash_mask: u16,
        hashes: Vec<B256>,
        root_hash: Option<B256>,
    ) -> Self {
        assert_eq!(tree_mask & state_mask, tree_mask, "tree_mask not a subset of state_mask");
        assert_eq!(hash_mask & state_mask, hash_mask, "hash_mask not a subset of state_mask");
        assert_eq!(hashes.len(), hash_mask.count_ones() as usize, "hashes/hash_mask mismatch");
        Self { state_mask, tree_mask, hash_mask, hashes, root_hash }
    }

    /// Encodes this record for storage: three big-endian 16-bit masks, then (if present) the
    /// 32-byte root hash, then the child hashes in order.
    pub fn encode_for_storage(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.storage_len());
        out.extend_from_slice(&self.state_mask.to_be_bytes());
        out.extend_from_slice(&self.tree_mask.to_be_bytes());
        out.extend_from_slice(&self.hash_mask.to_be_bytes());
        if let Some(root) = self.root_hash {
            out.extend_from_slice(root.as_slice());
        }
        for hash in &self.hashes {
            out.extend_from_slice(hash.as_slice());
        }
        out
    }

    /// Exact length of [`Self::encode_for_storage`]'s output.
    pub fn storage_len(&self) -> usize {
        6 + 32 * (self.root_hash.is_some() as usize + self.hashes.len())
    }

    /// Parses a record previously produced by [`Self::encode_for_storage`].
    pub fn decode_from_storage(raw: &[u8]) -> Result<Self, TrieError> {
        if raw.len() < 6 {
            return Err(TrieError::InputTooShort);
        }
        let trailer = &raw[6..];
        if trailer.len() % 32 != 0 {
            return Err(TrieError::InvalidHashesLength);
        }

        let state_mask = u16::from_be_bytes([raw[0], raw[1]]);
        let tree_mask = u16::from_be_bytes([raw[2], raw[3]]);
        let hash_mask = u16::from_be_bytes([raw[4], raw[5]]);

        if tree_mask & state_mask != tree_mask || hash_mask & state_mask != hash_mask {
            return Err(TrieError::InvalidMasksSubsets);
        }

        let expected = hash_mask.count_ones() as usize;
        let effective = trailer.len() / 32;
        let has_root = match effective.checked_sub(expected) {
            Some(0) => false,
            Some(1) => true,
            _ => return Err(TrieError::InvalidHashesLength),
        };

        let mut blocks = trailer.chunks_exact(32);
        let root_hash = has_root.then(|| B256::from_slice(blocks.next().unwrap()));
        let hashes = blocks.map(B256::from_slice).collect();

        Ok(Self { state_mask, tree_mask, hash_mask, hashes, root_hash })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn round_trips_the_literal_fixture() {
        let node = NodeRecord::new(0x0005, 0x0001, 0x0004, vec![B256::repeat_byte(0xAB)], None);
        let encoded = node.encode_for_storage();
        assert_eq!(encoded.len(), 38);
        assert_eq!(NodeRecord::decode_from_storage(&encoded).unwrap(), node);
    }

    #[test]
    fn round_trips_with_root_hash() {
        let node = NodeRecord::new(
            0x0003,
            0x0000,
            0x0002,
            vec![B256::repeat_byte(0x11)],
            Some(B256::repeat_byte(0x22)),
        );
        let encoded = node.encode_for_storage();
        assert_eq!(encoded.len(), 6 + 32 * 2);
        assert_eq!(NodeRecord::decode_from_storage(&encoded).unwrap(), node);
    }

    #[test]
    fn rejects_short_input() {
        assert_eq!(NodeRecord::decode_from_storage(&[0; 5]), Err(TrieError::InputTooShort));
    }

    #[test]
    fn rejects_non_multiple_of_32_trailer() {
        let mut raw = vec![0u8; 6];
        raw.extend_from_slice(&[0u8; 10]);
        assert_eq!(NodeRecord::decode_from_storage(&raw), Err(TrieError::InvalidHashesLength));
    }

    #[test]
    fn rejects_mask_subset_violation() {
        // hash_mask has a bit set outside state_mask.
        let mut raw = vec![0u8; 6];
        raw[0..2].copy_from_slice(&0x0001u16.to_be_bytes()); // state_mask
        raw[4..6].copy_from_slice(&0x0002u16.to_be_bytes()); // hash_mask
        assert_eq!(NodeRecord::decode_from_storage(&raw), Err(TrieError::InvalidMasksSubsets));
    }

    #[test]
    fn rejects_hash_count_disagreement() {
        let mut raw = vec![0u8; 6];
        raw[0..2].copy_from_slice(&0x0003u16.to_be_bytes()); // state_mask
        raw[4..6].copy_from_slice(&0x0001u16.to_be_bytes()); // hash_mask: expects 1 hash
        raw.extend_from_slice(&[0u8; 64]); // but trailer carries 2 blocks
        assert_eq!(NodeRecord::decode_from_storage(&raw), Err(TrieError::InvalidHashesLength));
    }

    #[test]
    #[should_panic(expected = "tree_mask not a subset")]
    fn new_panics_on_tree_mask_violation() {
        NodeRecord::new(0x0001, 0x0002, 0x0000, vec![], None);
    }

    proptest! {
        #[test]
        fn storage_roundtrip(
            state_mask: u16,
            hash_bits in 0u16..=0xFFFF,
            has_root: bool,
        ) {
            let hash_mask = hash_bits & state_mask;
            let tree_mask = 0u16;
            let hashes: Vec<B256> = (0..hash_mask.count_ones())
                .map(|i| B256::repeat_byte(i as u8))
                .collect();
            let root_hash = has_root.then_some(B256::repeat_byte(0xFF));
            let node = NodeRecord::new(state_mask, tree_mask, hash_mask, hashes, root_hash);
            let encoded = node.encode_for_storage();
            prop_assert_eq!(encoded.len(), node.storage_len());
            prop_assert_eq!(NodeRecord::decode_from_storage(&encoded).unwrap(), node);
        }
    }
}
