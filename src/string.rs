//! UTF-8 string keys: the raw bytes of the string, eight bits per byte, so
//! tree order is byte-lexicographic and a prefix of a string is a bit-prefix
//! of its key.

use smallvec::SmallVec;

use crate::arena::NodeRef;
use crate::scan::Iter;
use crate::tree::RadixTree;

/// Bit count of a string key. The 16-bit length type caps keys at 8191 bytes.
fn str_bits(key: &str) -> u16 {
    assert!(
        key.len() * 8 <= usize::from(u16::MAX),
        "string keys are limited to 8191 bytes"
    );
    (key.len() * 8) as u16
}

impl<V> RadixTree<V> {
    /// Insert under a string key. The empty string indexes nothing and is
    /// rejected like a zero-bit key.
    pub fn str_insert(&mut self, key: &str, value: V) -> (Option<NodeRef>, bool) {
        self.insert(key.as_bytes(), str_bits(key), value)
    }

    /// Exact-match lookup of a string key.
    pub fn str_get(&self, key: &str) -> Option<NodeRef> {
        self.get(key.as_bytes(), str_bits(key))
    }

    /// Longest stored key that is a prefix of `key` (or `key` itself).
    pub fn str_lookup_longest(&self, key: &str) -> Option<NodeRef> {
        self.lookup_longest(key.as_bytes(), str_bits(key))
    }

    /// Every stored prefix of `key`, shortest first.
    pub fn str_lookup_longest_path(&self, key: &str) -> SmallVec<[NodeRef; 8]> {
        self.lookup_longest_path(key.as_bytes(), str_bits(key))
    }

    /// Remove a string key by exact match, returning its value.
    pub fn str_remove(&mut self, key: &str) -> Option<V> {
        let node = self.str_get(key)?;
        self.remove(node)
    }

    /// Iterate the entries extending `prefix`, in lexicographic order. The
    /// empty prefix iterates everything.
    pub fn str_iter(&self, prefix: &str) -> Iter<'_, V> {
        self.iter_prefix(prefix.as_bytes(), str_bits(prefix))
    }

    /// The key at `node` as a string; `None` if the stored bytes are not
    /// valid UTF-8 (the entry came in through another adapter).
    pub fn str_key(&self, node: NodeRef) -> Option<&str> {
        std::str::from_utf8(self.key_bytes(node)).ok()
    }
}
