//! The PATRICIA structure: insertion case analysis, deletion with
//! path-compression repair, and prefix lookups.

use smallvec::SmallVec;

use crate::arena::{NodeArena, NodeRef};
use crate::bits::{bit_at, bit_range_eq, first_diff_bit};

/// An ordered index over variable-length bit-string keys.
///
/// A key is a byte buffer plus a significant bit count (1..=65535); bits are
/// compared MSB-first, so big-endian encodings iterate in numeric or
/// lexicographic order, and a shorter prefix sorts before its extensions.
/// Exact keys are unique: inserting a key that is already present leaves the
/// stored value untouched and hands back the existing entry.
///
/// Entries are addressed through [`NodeRef`] handles. A handle stays valid
/// until the entry is removed; using it afterwards is a caller bug (the slot
/// may meanwhile name a different entry).
///
/// The structure is single-threaded by design: no operation blocks, and
/// callers needing shared access must serialize externally.
pub struct RadixTree<V> {
    pub(crate) arena: NodeArena<V>,
    pub(crate) root: NodeRef,
    pub(crate) len: usize,
}

impl<V> RadixTree<V> {
    /// Create an empty tree. No storage is reserved until the first insert.
    pub fn new() -> Self {
        RadixTree {
            arena: NodeArena::new(),
            root: NodeRef::NULL,
            len: 0,
        }
    }

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Key material of `node`, as inserted. Bits past [`key_bits`] are
    /// padding and carry no meaning.
    ///
    /// [`key_bits`]: RadixTree::key_bits
    #[inline]
    pub fn key_bytes(&self, node: NodeRef) -> &[u8] {
        &self.arena.get(node).bytes
    }

    /// Number of significant bits of the key at `node`.
    #[inline]
    pub fn key_bits(&self, node: NodeRef) -> u16 {
        (self.arena.get(node).end + 1) as u16
    }

    /// Value stored at `node`; `None` if the handle no longer names an entry.
    #[inline]
    pub fn value(&self, node: NodeRef) -> Option<&V> {
        self.arena.get(node).data.as_ref()
    }

    /// Mutable access to the value stored at `node`.
    #[inline]
    pub fn value_mut(&mut self, node: NodeRef) -> Option<&mut V> {
        self.arena.get_mut(node).data.as_mut()
    }

    /// Deepest node still compatible with the key: descent stops at the
    /// first node whose span covers the key's last bit, at a bit mismatch,
    /// or at a dead end (absent child).
    pub(crate) fn closest(&self, key: &[u8], last: i32) -> NodeRef {
        let mut node = self.root;
        if node.is_null() {
            return node;
        }
        loop {
            let n = self.arena.get(node);
            if last <= n.end {
                return node;
            }
            if n.end >= 0 && !bit_range_eq(&n.bytes, key, n.start, n.end) {
                return node;
            }
            let next = if bit_at(key, n.end + 1) == 1 { n.right } else { n.left };
            if next.is_null() {
                return node;
            }
            node = next;
        }
    }

    /// Insert `value` under the key (`key`, `bits`). Returns the entry handle
    /// and whether a new entry was created.
    ///
    /// Exact duplicates keep the first value: the second insert returns
    /// `(Some(existing), false)` and drops `value`. A bit count of zero
    /// indexes nothing and is a defined no-op returning `(None, false)`.
    ///
    /// # Panics
    ///
    /// Panics if `key` holds fewer than `bits` bits, or if the arena's
    /// reference space (2^31 slots) is exhausted.
    pub fn insert(&mut self, key: &[u8], bits: u16, value: V) -> (Option<NodeRef>, bool) {
        if bits == 0 {
            return (None, false);
        }
        assert!(
            key.len() * 8 >= usize::from(bits),
            "key buffer shorter than {bits} bits"
        );
        let last = i32::from(bits) - 1;

        // Empty tree: the new leaf is the root.
        if self.root.is_null() {
            let leaf = self.new_leaf(key, last, value);
            self.root = leaf;
            self.len += 1;
            return (Some(leaf), true);
        }

        let node = self.closest(key, last);
        let (n_start, n_end) = {
            let n = self.arena.get(node);
            (n.start, n.end)
        };
        // The descent never stops on the empty-span root: it always has both
        // children and matches trivially.
        debug_assert!(n_start <= n_end);

        // The node's whole span lies inside the key and matches it.
        if n_end <= last && bit_range_eq(key, &self.arena.get(node).bytes, n_start, n_end) {
            if n_end == last {
                // Exact node. First insert wins; a dataless fork becomes the
                // entry, taking the caller's buffer as its key material.
                if self.arena.get(node).data.is_some() {
                    return (Some(node), false);
                }
                let n = self.arena.get_mut(node);
                n.bytes = key.into();
                n.data = Some(value);
                self.len += 1;
                return (Some(node), true);
            }

            // Key runs past the node, and the needed child slot is vacant
            // (the descent would have followed it otherwise).
            let leaf = self.new_leaf(key, last, value);
            {
                let l = self.arena.get_mut(leaf);
                l.start = n_end + 1;
                l.parent = node;
            }
            let n = self.arena.get_mut(node);
            if bit_at(key, n_end + 1) == 1 {
                debug_assert!(n.right.is_null());
                n.right = leaf;
            } else {
                debug_assert!(n.left.is_null());
                n.left = leaf;
            }
            self.len += 1;
            return (Some(leaf), true);
        }

        let overlap = last.min(n_end);
        match first_diff_bit(key, &self.arena.get(node).bytes, n_start, overlap) {
            None => {
                // The key is a strict prefix of the node's span: splice the
                // new leaf in between the node and its former parent. The
                // node slides below, re-scoped past the leaf's span, on the
                // side of its first bit beyond the key.
                debug_assert!(last < n_end);
                let parent = self.arena.get(node).parent;
                let node_bit = bit_at(&self.arena.get(node).bytes, last + 1);
                let leaf = self.new_leaf(key, last, value);
                {
                    let l = self.arena.get_mut(leaf);
                    l.start = n_start;
                    l.parent = parent;
                    if node_bit == 1 {
                        l.right = node;
                    } else {
                        l.left = node;
                    }
                }
                {
                    let n = self.arena.get_mut(node);
                    n.start = last + 1;
                    n.parent = leaf;
                }
                self.replace_child(parent, node, leaf);
                self.len += 1;
                (Some(leaf), true)
            }
            Some(bit) => {
                // Genuine divergence: a fresh dataless fork takes the node's
                // place, spanning the common bits; the node and the new leaf
                // hang below it, re-scoped to start at the diverging bit.
                let parent = self.arena.get(node).parent;
                let leaf = self.new_leaf(key, last, value);
                let fork = self.arena.alloc();
                {
                    let f = self.arena.get_mut(fork);
                    f.bytes = key.into();
                    f.start = n_start;
                    f.end = bit - 1;
                    f.parent = parent;
                    if bit_at(key, bit) == 1 {
                        f.right = leaf;
                        f.left = node;
                    } else {
                        f.right = node;
                        f.left = leaf;
                    }
                }
                {
                    let n = self.arena.get_mut(node);
                    n.start = bit;
                    n.parent = fork;
                }
                {
                    let l = self.arena.get_mut(leaf);
                    l.start = bit;
                    l.parent = fork;
                }
                self.replace_child(parent, node, fork);
                self.len += 1;
                (Some(leaf), true)
            }
        }
    }

    /// Remove the entry at `node`, returning its value.
    ///
    /// The handle must name a live entry of this tree: one obtained from
    /// insert, lookup or traversal, and not removed since. Passing a stale
    /// handle is a caller bug — the slot may have been reused for an
    /// unrelated entry. Structural repair keeps the tree path-compressed:
    /// no branch is ever left with a single child.
    pub fn remove(&mut self, node: NodeRef) -> Option<V> {
        let value = self.arena.get_mut(node).data.take()?;
        self.len -= 1;

        let mut node = node;
        loop {
            let (left, right, parent, start) = {
                let n = self.arena.get(node);
                (n.left, n.right, n.parent, n.start)
            };

            if !left.is_null() && !right.is_null() {
                // Two children: the node stays, as a pure fork.
                return Some(value);
            }

            if left.is_null() != right.is_null() {
                // One child: splice it into our place (path compression).
                let child = if left.is_null() { right } else { left };
                {
                    let c = self.arena.get_mut(child);
                    c.start = start;
                    c.parent = parent;
                }
                self.replace_child(parent, node, child);
                self.arena.free(node);
                return Some(value);
            }

            // Childless: unlink from the parent and free the slot.
            if parent.is_null() {
                self.root = NodeRef::NULL;
                self.arena.free(node);
                return Some(value);
            }
            {
                let p = self.arena.get_mut(parent);
                if p.left == node {
                    p.left = NodeRef::NULL;
                } else {
                    debug_assert!(p.right == node);
                    p.right = NodeRef::NULL;
                }
            }
            self.arena.free(node);
            if self.arena.get(parent).data.is_some() {
                // The parent is an entry with children; still valid with one
                // child fewer.
                return Some(value);
            }
            // The parent fork dropped to a single child: continue there, the
            // next round splices it away.
            node = parent;
        }
    }

    /// Exact-match lookup: the entry whose key equals (`key`, `bits`).
    pub fn get(&self, key: &[u8], bits: u16) -> Option<NodeRef> {
        let node = self.lookup_longest(key, bits)?;
        (self.arena.get(node).end + 1 == i32::from(bits)).then_some(node)
    }

    /// Longest-prefix match: the deepest entry whose key is a bit-prefix of,
    /// or equal to, the query.
    pub fn lookup_longest(&self, key: &[u8], bits: u16) -> Option<NodeRef> {
        if bits == 0 {
            return None;
        }
        assert!(
            key.len() * 8 >= usize::from(bits),
            "key buffer shorter than {bits} bits"
        );
        let last = i32::from(bits) - 1;
        let mut node = self.root;
        let mut best = NodeRef::NULL;
        while !node.is_null() {
            let n = self.arena.get(node);
            if last < n.end {
                break;
            }
            if n.end >= 0 && !bit_range_eq(&n.bytes, key, n.start, n.end) {
                break;
            }
            if n.data.is_some() {
                best = node;
            }
            if last == n.end {
                break;
            }
            node = if bit_at(key, n.end + 1) == 1 { n.right } else { n.left };
        }
        (!best.is_null()).then_some(best)
    }

    /// Every entry on the query's path, shallowest to deepest. The last
    /// element, when any, is what [`lookup_longest`] returns.
    ///
    /// [`lookup_longest`]: RadixTree::lookup_longest
    pub fn lookup_longest_path(&self, key: &[u8], bits: u16) -> SmallVec<[NodeRef; 8]> {
        let mut path = SmallVec::new();
        if bits == 0 {
            return path;
        }
        assert!(
            key.len() * 8 >= usize::from(bits),
            "key buffer shorter than {bits} bits"
        );
        let last = i32::from(bits) - 1;
        let mut node = self.root;
        while !node.is_null() {
            let n = self.arena.get(node);
            if last < n.end {
                break;
            }
            if n.end >= 0 && !bit_range_eq(&n.bytes, key, n.start, n.end) {
                break;
            }
            if n.data.is_some() {
                path.push(node);
            }
            if last == n.end {
                break;
            }
            node = if bit_at(key, n.end + 1) == 1 { n.right } else { n.left };
        }
        path
    }

    fn new_leaf(&mut self, key: &[u8], last: i32, value: V) -> NodeRef {
        let leaf = self.arena.alloc();
        let n = self.arena.get_mut(leaf);
        n.bytes = key.into();
        n.start = 0;
        n.end = last;
        n.data = Some(value);
        leaf
    }

    /// Point `parent`'s child link (or the root) from `old` to `new`.
    fn replace_child(&mut self, parent: NodeRef, old: NodeRef, new: NodeRef) {
        if parent.is_null() {
            self.root = new;
            return;
        }
        let p = self.arena.get_mut(parent);
        if p.left == old {
            p.left = new;
        } else {
            debug_assert!(p.right == old);
            p.right = new;
        }
    }
}

impl<V> Default for RadixTree<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: std::fmt::Debug> std::fmt::Debug for RadixTree<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for node in self.iter() {
            if let Some(value) = self.value(node) {
                map.entry(&(self.key_bytes(node), self.key_bits(node)), value);
            }
        }
        map.finish()
    }
}
