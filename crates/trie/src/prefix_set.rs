//! The prefix set (§3, §4.5): the contract a caller uses to say "these subtrees changed" during
//! incremental recomputation.
//!
//! This type does not drive the hash builder itself; it specifies what a caller asks of the
//! builder's incremental-recomputation flow. See §9 for the duplicate-marker policy this
//! implementation settled on.

use crate::nibbles::Nibbles;

/// A sorted, deduplicated collection of `(nibble key, marker)` pairs with two monotonic-friendly
/// queries: [`PrefixSet::contains`] and [`PrefixSet::contains_and_next_marked`].
///
/// `contains` is **not** safe to call concurrently on one instance, and is only efficient when
/// queries arrive in non-decreasing key order: it keeps an internal cursor and rewinds it only
/// when a query goes backwards relative to the previous one.
#[derive(Debug, Default, Clone)]
pub struct PrefixSet {
    keys: Vec<(Nibbles, bool)>,
    sorted: bool,
    cursor: usize,
    last_query: Option<Nibbles>,
}

impl PrefixSet {
    /// An empty prefix set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `(key, marker)`. Does not sort or deduplicate; that happens lazily on first
    /// query.
    ///
    /// If the same key is later inserted again with a different marker, the deduplication pass
    /// keeps whichever of the two pairs sorts first under `(key, marker)` comparison with
    /// `false < true`, not "OR the markers together", and not "last write wins". See §9.
    pub fn insert(&mut self, key: Nibbles, marker: bool) {
        self.keys.push((key, marker));
        self.sorted = false;
    }

    fn finalize(&mut self) {
        if self.sorted {
            return;
        }
        self.keys.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));
        self.keys.dedup_by(|a, b| a.0 == b.0);
        self.sorted = true;
        self.cursor = 0;
        self.last_query = None;
    }

    /// True iff any stored key begins with `prefix`.
    ///
    /// Maintains an internal cursor optimized for queries issued in non-decreasing order; a
    /// query for a prefix less than or equal to the previous one rewinds the cursor, which is
    /// correct but slower than the intended monotonic-query workload.
    pub fn contains(&mut self, prefix: &[u8]) -> bool {
        self.finalize();

        if self.keys.is_empty() {
            self.last_query = Some(Nibbles::from_nibbles_unchecked(prefix.to_vec()));
            return false;
        }
        let max_index = self.keys.len() - 1;

        if let Some(last) = &self.last_query {
            if prefix <= last.as_slice() {
                #[cfg(debug_assertions)]
                if prefix < last.as_slice() {
                    tracing::warn!(
                        target: "trie::prefix_set",
                        "PrefixSet::contains called with a prefix smaller than the previous \
                         query; this still returns the correct answer but defeats the cursor \
                         optimization this type is designed for",
                    );
                }
                if self.cursor > max_index {
                    self.cursor = max_index;
                }
                while self.cursor > 0 && self.keys[self.cursor].0.as_slice() > prefix {
                    self.cursor -= 1;
                }
            }
        }

        let found = loop {
            let (key, _) = &self.keys[self.cursor];
            if key.starts_with(prefix) {
                break true;
            }
            if key.as_slice() > prefix {
                break false;
            }
            if self.cursor == max_index {
                break false;
            }
            self.cursor += 1;
        };

        self.last_query = Some(Nibbles::from_nibbles_unchecked(prefix.to_vec()));
        found
    }

    /// Computes [`Self::contains`] and, in the same forward scan, the first marked key at or
    /// after the cursor whose first `min(invariant_len, prefix.len())` nibbles equal `prefix`'s.
    ///
    /// Returns `(contained, next_marked_key)`, with `next_marked_key` empty if no such key
    /// exists.
    pub fn contains_and_next_marked(
        &mut self,
        prefix: &[u8],
        invariant_len: usize,
    ) -> (bool, Nibbles) {
        let contained = self.contains(prefix);

        let compare_len = invariant_len.min(prefix.len());
        let invariant_prefix = &prefix[..compare_len];

        let mut next_marked = Nibbles::new();
        for (key, marker) in &self.keys[self.cursor..] {
            if key.len() < compare_len || &key.as_slice()[..compare_len] != invariant_prefix {
                break;
            }
            if *marker {
                next_marked = key.clone();
                break;
            }
        }

        (contained, next_marked)
    }

    /// Number of distinct keys currently stored (accurate only after the first query, since
    /// deduplication is lazy).
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// True iff no keys have been inserted.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nibbles_from_hex_bytes(hex_bytes: &[u8]) -> Nibbles {
        Nibbles::unpack(hex_bytes)
    }

    #[test]
    fn contains_matches_prefix_relationship() {
        let mut set = PrefixSet::new();
        set.insert(nibbles_from_hex_bytes(&[0x01, 0x02]), false);
        set.insert(nibbles_from_hex_bytes(&[0x01, 0x02, 0x03]), false);
        set.insert(nibbles_from_hex_bytes(&[0x01]), false);
        set.insert(nibbles_from_hex_bytes(&[0x02]), false);

        let p01 = nibbles_from_hex_bytes(&[0x01]);
        assert!(set.contains(p01.as_slice()));

        let p03 = nibbles_from_hex_bytes(&[0x03]);
        assert!(!set.contains(p03.as_slice()));

        let p0104 = Nibbles::from_nibbles_unchecked(vec![0, 1, 0, 4]);
        assert!(!set.contains(p0104.as_slice()));

        let p010203 = nibbles_from_hex_bytes(&[0x01, 0x02, 0x03]);
        assert!(set.contains(p010203.as_slice()));
    }

    #[test]
    fn contains_finds_exact_match_after_cursor_overshoots_on_a_miss() {
        // A query that misses every key (driving the cursor to the last index) followed by a
        // query for an earlier, exact-match key must still rewind far enough to find it: the
        // cursor has to land on the matching key itself, not one slot past it.
        let mut set = PrefixSet::new();
        set.insert(nibbles_from_hex_bytes(&[0x01, 0x02]), false);
        set.insert(nibbles_from_hex_bytes(&[0x01, 0x02, 0x03]), false);
        set.insert(nibbles_from_hex_bytes(&[0x02]), false);

        assert!(!set.contains(&[0, 3])); // misses everything, drives the cursor to the last key.
        assert!(set.contains(&[0, 1, 0, 2, 0, 3])); // exact match for a key before the miss.
    }

    #[test]
    fn empty_set_never_contains() {
        let mut set = PrefixSet::new();
        assert!(!set.contains(&[0, 1]));
    }

    #[test]
    fn duplicate_key_deduplicates_to_one_entry() {
        let mut set = PrefixSet::new();
        let key = Nibbles::from_nibbles_unchecked(vec![0, 1]);
        set.insert(key.clone(), false);
        set.insert(key.clone(), true);
        assert_eq!(set.len(), 2, "raw inserts are not deduplicated until the first query");
        // Lazily finalized on first query: the (key, false) pair sorts before (key, true) and
        // wins, per the duplicate-marker policy documented on `insert`.
        set.contains(&[0, 1]);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn contains_and_next_marked_finds_marked_key_under_invariant_prefix() {
        let mut set = PrefixSet::new();
        set.insert(Nibbles::from_nibbles_unchecked(vec![0, 1, 0, 2]), false);
        set.insert(Nibbles::from_nibbles_unchecked(vec![0, 1, 0, 3]), true);
        set.insert(Nibbles::from_nibbles_unchecked(vec![0, 1, 0, 4]), true);

        let prefix = [0u8, 1, 0, 2];
        let (contained, next) = set.contains_and_next_marked(&prefix, 2);
        assert!(contained);
        assert_eq!(next.as_slice(), &[0, 1, 0, 3]);
    }

    #[test]
    fn contains_and_next_marked_empty_when_nothing_marked() {
        let mut set = PrefixSet::new();
        set.insert(Nibbles::from_nibbles_unchecked(vec![0, 1]), false);
        let (contained, next) = set.contains_and_next_marked(&[0, 1], 2);
        assert!(contained);
        assert!(next.is_empty());
    }
}
