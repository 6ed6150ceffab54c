//! The incremental hash builder (§3, §4.6): assembles an MPT root from a stream of
//! lexicographically-sorted leaf (and pre-hashed branch) insertions without ever materializing
//! the tree.
//!
//! This is a from-scratch Rust port of Erigon's `GenStructStep` / Silkworm's `HashBuilder`
//! algorithm (see `trie/hash_builder.hpp` in the original source), generalized only insofar as
//! the RLP and node-record codecs it calls into are this crate's own rather than Silkworm's.

use crate::{
    constants::{BRANCH_WIDTH, EMPTY_ROOT_HASH, EMPTY_STRING_CODE},
    nibbles::{hex_prefix, Nibbles},
    node::NodeRecord,
    rlp,
};
use alloy_primitives::{keccak256, B256};
use tracing::trace;

/// A child's place-holder in its parent's RLP list: either the child's 32-byte hash, or, when
/// the child's own RLP is shorter than 32 bytes, the RLP itself, embedded inline.
///
/// Node reference rule (§4.6): this is the only place short-circuiting is permitted.
#[derive(Debug, Clone, PartialEq, Eq)]
enum NodeRef {
    Hash(B256),
    Embedded(Vec<u8>),
}

impl NodeRef {
    /// Builds a reference to a subtree from that subtree's own RLP encoding.
    fn from_rlp(rlp: Vec<u8>) -> Self {
        if rlp.len() < 32 {
            Self::Embedded(rlp)
        } else {
            Self::Hash(keccak256(&rlp))
        }
    }

    /// Appends this reference into a parent's RLP payload: a 32-byte string header plus hash
    /// for [`Self::Hash`], or the raw bytes verbatim (already a complete RLP item) for
    /// [`Self::Embedded`].
    fn append_to(&self, out: &mut Vec<u8>) {
        match self {
            Self::Hash(hash) => rlp::encode_hash(hash, out),
            Self::Embedded(raw) => out.extend_from_slice(raw),
        }
    }

    /// Exact length this reference contributes when appended to a parent's payload.
    fn encoded_len(&self) -> usize {
        match self {
            Self::Hash(_) => rlp::length_of_hash(),
            Self::Embedded(raw) => raw.len(),
        }
    }

    /// The 32-byte hash a cache record should store for this child, computing it from the
    /// embedded RLP if the child wasn't already hashed. A caller persisting node records wants
    /// a real hash to key future lookups on even when the live parent embeds the RLP directly.
    fn cache_hash(&self) -> B256 {
        match self {
            Self::Hash(hash) => *hash,
            Self::Embedded(raw) => keccak256(raw),
        }
    }
}

/// The buffered entry the builder is in the middle of folding into the tree: either a leaf's
/// value bytes or a pre-hashed branch's root hash.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Entry {
    Leaf(Vec<u8>),
    Branch(B256),
}

/// Invoked once per intermediate [`NodeRecord`] the builder decides is worth caching, in
/// post-order (a child's record is emitted before its parent's).
pub type NodeCollector<'c> = dyn FnMut(&Nibbles, &NodeRecord) + 'c;

/// Streams an MPT root hash from a strictly-increasing sequence of leaf/branch insertions.
///
/// See the ordering contract on [`Self::add_leaf`] / [`Self::add_branch`]: violating it is not
/// memory-unsafe, but the resulting root is unspecified. The builder is single-use between
/// [`Self::reset`] calls; once [`Self::root_hash`] has been observed, further insertions are
/// undefined.
#[derive(Default)]
pub struct HashBuilder<'c> {
    key: Nibbles,
    entry: Option<Entry>,
    is_in_db_trie: bool,

    groups: Vec<u16>,
    tree_masks: Vec<u16>,
    hash_masks: Vec<u16>,
    stack: Vec<NodeRef>,

    node_collector: Option<Box<NodeCollector<'c>>>,
}

impl<'c> HashBuilder<'c> {
    /// A fresh, empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a callback invoked during [`Self::root_hash`] for each emitted intermediate
    /// [`NodeRecord`], in post-order.
    pub fn with_node_collector(mut self, collector: impl FnMut(&Nibbles, &NodeRecord) + 'c) -> Self {
        self.node_collector = Some(Box::new(collector));
        self
    }

    /// Inserts a leaf.
    ///
    /// # Ordering contract
    ///
    /// `nibble_key` must compare strictly greater than every previously inserted key, and must
    /// not stand in a prefix relationship with any other leaf key in the trie (e.g. leaves
    /// `0a0b` and `0a0b0005` may not coexist). Violating this is undefined behavior: the builder
    /// is not required to detect it, though a debug build will panic via `debug_assert!`.
    pub fn add_leaf(&mut self, nibble_key: Nibbles, value: &[u8]) {
        debug_assert!(
            nibble_key > self.key || self.key.is_empty(),
            "add_leaf: keys must strictly increase (got {nibble_key:?} after {:?})",
            self.key,
        );
        if !self.key.is_empty() {
            self.update(&nibble_key);
        }
        self.key = nibble_key;
        self.entry = Some(Entry::Leaf(value.to_vec()));
    }

    /// Inserts a pre-hashed subtree root standing in for a branch the caller has already
    /// computed (typically recovered from a persisted [`NodeRecord`]).
    ///
    /// Subject to the same ordering contract as [`Self::add_leaf`].
    pub fn add_branch(&mut self, nibble_key: Nibbles, child_hash: B256, is_in_db_trie: bool) {
        debug_assert!(
            nibble_key > self.key || (self.key.is_empty() && nibble_key.is_empty()),
            "add_branch: keys must strictly increase (got {nibble_key:?} after {:?})",
            self.key,
        );
        if !self.key.is_empty() {
            self.update(&nibble_key);
        } else if nibble_key.is_empty() {
            // The entire trie is this one pre-hashed branch; nothing left to fold.
            self.stack.push(NodeRef::Hash(child_hash));
        }
        self.key = nibble_key;
        self.entry = Some(Entry::Branch(child_hash));
        self.is_in_db_trie = is_in_db_trie;
    }

    /// Finalizes the computation and returns the trie root.
    ///
    /// Folds up every level still open by driving one more [`Self::update`] step with an empty
    /// `succeeding` key. Returns [`EMPTY_ROOT_HASH`] if no entries were ever added.
    pub fn root_hash(&mut self) -> B256 {
        if !self.key.is_empty() {
            self.update(&Nibbles::new());
            self.key = Nibbles::new();
            self.entry = None;
        }
        self.current_root()
    }

    /// Resets the builder to its pristine, newly-constructed state. The node collector is
    /// preserved.
    pub fn reset(&mut self) {
        self.key = Nibbles::new();
        self.entry = None;
        self.is_in_db_trie = false;
        self.groups.clear();
        self.tree_masks.clear();
        self.hash_masks.clear();
        self.stack.clear();
    }

    /// The top of the stack, converted to its 32-byte form: hashed once more if it happens to
    /// still be a short embedded RLP (rare, only possible for a trie so small its entire root
    /// node is under 32 bytes), or [`EMPTY_ROOT_HASH`] if the stack is empty.
    fn current_root(&self) -> B256 {
        match self.stack.last() {
            Some(NodeRef::Hash(hash)) => *hash,
            Some(NodeRef::Embedded(raw)) => keccak256(raw),
            None => EMPTY_ROOT_HASH,
        }
    }

    /// Folds the buffered entry (and any branch/extension levels it closes out) into the stack,
    /// given the next key that will be inserted (or empty, at finalization).
    ///
    /// One call to `update` may fold several levels in a single pass: the `build_extensions`
    /// flag tracks whether the loop is still handling the buffered leaf/branch's own reference
    /// (first iteration) or is instead folding a previously-built branch node up through an
    /// extension (every iteration after).
    fn update(&mut self, succeeding: &Nibbles) {
        let mut build_extensions = false;
        let mut current = self.key.clone();
        debug_assert!(!current.is_empty());

        loop {
            let preceding_exists = !self.groups.is_empty();
            let preceding_len = self.groups.len().saturating_sub(1);

            let common_prefix_len = succeeding.common_prefix_len(&current);
            let len = preceding_len.max(common_prefix_len);
            debug_assert!(len < current.len());

            trace!(
                target: "trie::hash_builder",
                len, common_prefix_len, preceding_len, stack_depth = self.stack.len(),
                "folding one trie level",
            );

            let extra_digit = current[len];
            if self.groups.len() <= len {
                self.groups.resize(len + 1, 0);
            }
            self.groups[len] |= 1 << extra_digit;

            if self.tree_masks.len() < current.len() {
                self.tree_masks.resize(current.len(), 0);
                self.hash_masks.resize(current.len(), 0);
            }

            let mut len_from = len;
            if !succeeding.is_empty() || preceding_exists {
                len_from += 1;
            }
            let short_node_key = current.slice(len_from..);

            if !build_extensions {
                match self.entry.as_ref().expect("update: entry buffered") {
                    Entry::Leaf(value) => {
                        let leaf_rlp = leaf_node_rlp(short_node_key.as_slice(), value);
                        self.stack.push(NodeRef::from_rlp(leaf_rlp));
                    }
                    Entry::Branch(hash) => {
                        self.stack.push(NodeRef::Hash(*hash));
                        let bit = 1u16 << current[current.len() - 1];
                        if self.is_in_db_trie {
                            self.tree_masks[current.len() - 1] |= bit;
                        }
                        self.hash_masks[current.len() - 1] |= bit;
                        build_extensions = true;
                    }
                }
            }

            if build_extensions && !short_node_key.is_empty() {
                if len_from > 0 {
                    let flag = 1u16 << current[len_from - 1];
                    self.hash_masks[len_from - 1] &= !flag;
                    if self.tree_masks[current.len() - 1] != 0 {
                        self.tree_masks[len_from - 1] |= flag;
                    }
                }
                let child = self.stack.pop().expect("update: stack has the child reference");
                let ext_rlp = extension_node_rlp(short_node_key.as_slice(), &child);
                self.stack.push(NodeRef::from_rlp(ext_rlp));
                self.tree_masks.truncate(len_from);
                self.hash_masks.truncate(len_from);
            }

            if preceding_len <= common_prefix_len && !succeeding.is_empty() {
                return;
            }

            if !succeeding.is_empty() || preceding_exists {
                self.push_branch_node(&current, len);
            }

            self.groups.truncate(len);
            self.tree_masks.truncate(len);
            self.hash_masks.truncate(len);

            if preceding_len == 0 {
                return;
            }

            current.truncate(preceding_len);
            while self.groups.last() == Some(&0) {
                self.groups.pop();
            }

            build_extensions = true;
        }
    }

    /// Forms the branch-node RLP for depth `len` from the top `popcount(groups[len])` stack
    /// entries, pushes its reference back onto the stack, and, if this depth's mask
    /// disposition marks it cache-worthy, hands a [`NodeRecord`] to the node collector.
    fn push_branch_node(&mut self, current: &Nibbles, len: usize) {
        let state_mask = self.groups[len];
        let hash_mask = self.hash_masks[len];
        let tree_mask = self.tree_masks[len];

        let n_children = state_mask.count_ones() as usize;
        let first_child = self.stack.len() - n_children;
        let children: Vec<NodeRef> = self.stack.split_off(first_child);

        let mut payload = Vec::new();
        let mut child_iter = children.iter();
        for i in 0..BRANCH_WIDTH as u32 {
            if state_mask & (1 << i) != 0 {
                child_iter.next().expect("state_mask bit count matches children").append_to(&mut payload);
            } else {
                payload.push(EMPTY_STRING_CODE);
            }
        }
        payload.push(EMPTY_STRING_CODE); // 17th slot: branch nodes here never carry a value.

        let mut rlp = Vec::with_capacity(rlp::length_of_list_header(payload.len()) + payload.len());
        rlp::encode_list_header(payload.len(), &mut rlp);
        rlp.extend_from_slice(&payload);
        self.stack.push(NodeRef::from_rlp(rlp));

        if len > 0 {
            self.hash_masks[len - 1] |= 1 << current[len - 1];
        }

        let cache_worthy = tree_mask != 0 || hash_mask != 0;
        if cache_worthy {
            if len > 0 {
                self.tree_masks[len - 1] |= 1 << current[len - 1];
            }

            if let Some(collector) = self.node_collector.as_mut() {
                let hashes: Vec<B256> = children
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| hash_mask & (1 << nth_set_bit(state_mask, *i)) != 0)
                    .map(|(_, child)| child.cache_hash())
                    .collect();
                let root_hash = (len == 0).then(|| match self.stack.last() {
                    Some(NodeRef::Hash(hash)) => *hash,
                    Some(NodeRef::Embedded(raw)) => keccak256(raw),
                    None => EMPTY_ROOT_HASH,
                });
                let record = NodeRecord::new(state_mask, tree_mask, hash_mask, hashes, root_hash);
                let prefix = current.slice(..len);
                trace!(target: "trie::hash_builder", ?prefix, state_mask, tree_mask, hash_mask, "emitting node record");
                collector(&prefix, &record);
            }
        }
    }
}

/// The nibble value corresponding to the `rank`-th set bit of `mask` (0-indexed).
fn nth_set_bit(mask: u16, rank: usize) -> u32 {
    let mut remaining = rank;
    for i in 0..16 {
        if mask & (1 << i) != 0 {
            if remaining == 0 {
                return i;
            }
            remaining -= 1;
        }
    }
    unreachable!("rank {rank} out of range for mask {mask:#06x}")
}

/// Builds a leaf node's RLP: a 2-element list of `[hex-prefix(path, leaf=true), value]`.
fn leaf_node_rlp(path: &[u8], value: &[u8]) -> Vec<u8> {
    let hp_path = hex_prefix(path, true);
    let payload_len = rlp::length_of_bytes(&hp_path) + rlp::length_of_bytes(value);
    let mut out = Vec::with_capacity(rlp::length_of_list_header(payload_len) + payload_len);
    rlp::encode_list_header(payload_len, &mut out);
    rlp::encode_bytes(&hp_path, &mut out);
    rlp::encode_bytes(value, &mut out);
    out
}

/// Builds an extension node's RLP: a 2-element list of `[hex-prefix(path, leaf=false), child]`.
fn extension_node_rlp(path: &[u8], child: &NodeRef) -> Vec<u8> {
    let hp_path = hex_prefix(path, false);
    let payload_len = rlp::length_of_bytes(&hp_path) + child.encoded_len();
    let mut out = Vec::with_capacity(rlp::length_of_list_header(payload_len) + payload_len);
    rlp::encode_list_header(payload_len, &mut out);
    rlp::encode_bytes(&hp_path, &mut out);
    child.append_to(&mut out);
    out
}
