//! `u64` keys: eight big-endian bytes, always 64 significant bits, so tree
//! order is numeric order and the neighbor lookups become floor/ceiling.

use crate::arena::NodeRef;
use crate::scan::Iter;
use crate::tree::RadixTree;

const U64_BITS: u16 = 64;

impl<V> RadixTree<V> {
    /// Insert under a `u64` key.
    pub fn u64_insert(&mut self, key: u64, value: V) -> (Option<NodeRef>, bool) {
        self.insert(&key.to_be_bytes(), U64_BITS, value)
    }

    /// Exact-match lookup of a `u64` key.
    pub fn u64_get(&self, key: u64) -> Option<NodeRef> {
        self.get(&key.to_be_bytes(), U64_BITS)
    }

    /// Remove a `u64` key, returning its value.
    pub fn u64_remove(&mut self, key: u64) -> Option<V> {
        let node = self.u64_get(key)?;
        self.remove(node)
    }

    /// Smallest entry with key ≥ `key` (numeric ceiling).
    pub fn u64_lookup_ge(&self, key: u64) -> Option<NodeRef> {
        self.lookup_ge(&key.to_be_bytes(), U64_BITS)
    }

    /// Largest entry with key ≤ `key` (numeric floor).
    pub fn u64_lookup_le(&self, key: u64) -> Option<NodeRef> {
        self.lookup_le(&key.to_be_bytes(), U64_BITS)
    }

    /// Iterate from the exact `u64` key: at most the one matching entry.
    pub fn u64_iter(&self, key: u64) -> Iter<'_, V> {
        self.iter_prefix(&key.to_be_bytes(), U64_BITS)
    }

    /// Decode the key at `node` back to a `u64`. Entries inserted through
    /// this adapter always carry exactly eight key bytes.
    pub fn u64_key(&self, node: NodeRef) -> u64 {
        let stored = self.key_bytes(node);
        debug_assert_eq!(stored.len(), 8, "not a u64 entry");
        let mut buf = [0u8; 8];
        let take = stored.len().min(8);
        buf[..take].copy_from_slice(&stored[..take]);
        u64::from_be_bytes(buf)
    }
}
